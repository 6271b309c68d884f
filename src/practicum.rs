use serde::Serialize;
use serde_json::Value;
use snafu::{ensure, OptionExt, ResultExt, Snafu};
use std::env;
use url::Url;

const STATUS_ENDPOINT: &str = "https://practicum.yandex.ru/api/user_api/homework_statuses/";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccessToken(pub String);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct UnixTimestamp(pub i64);

/// Review outcomes the API is known to report.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum HomeworkStatus {
    Approved,
    Reviewing,
    Rejected,
}

impl HomeworkStatus {
    fn from_api(raw: &str) -> Option<Self> {
        match raw {
            "approved" => Some(HomeworkStatus::Approved),
            "reviewing" => Some(HomeworkStatus::Reviewing),
            "rejected" => Some(HomeworkStatus::Rejected),
            _ => None,
        }
    }

    pub fn verdict(self) -> &'static str {
        match self {
            HomeworkStatus::Approved => "Работа проверена: ревьюеру всё понравилось. Ура!",
            HomeworkStatus::Reviewing => "Работа взята на проверку ревьюером.",
            HomeworkStatus::Rejected => "Работа проверена: у ревьюера есть замечания.",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    token: AccessToken,
    status_url: Url,
}

impl Config {
    pub fn from_environment() -> Result<Self> {
        let token = env::var("PRACTICUM_TOKEN").context(UnknownPracticumTokenSnafu)?;

        Self::new(token)
    }

    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        ensure!(!token.trim().is_empty(), BlankPracticumTokenSnafu);

        let status_url = Url::parse(STATUS_ENDPOINT).context(UnableToConfigureStatusUrlSnafu)?;

        Ok(Config {
            token: AccessToken(token),
            status_url,
        })
    }

    pub fn into_client(self) -> Client {
        Client {
            client: reqwest::Client::new(),
            config: self,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Client {
    client: reqwest::Client,
    config: Config,
}

impl Client {
    /// Fetches every homework whose status changed since `from_date`.
    ///
    /// The body is returned as a generic JSON value; shape checks happen
    /// in [`homework_entries`] and [`status_change_message`] so each kind
    /// of malformed answer maps to its own error.
    pub async fn homework_statuses(&self, from_date: UnixTimestamp) -> Result<Value> {
        let Self { client, config } = self;

        #[derive(Debug, Serialize)]
        struct StatusParams {
            from_date: UnixTimestamp,
        }

        let params = StatusParams { from_date };

        let response = client
            .get(config.status_url.clone())
            .header(
                reqwest::header::AUTHORIZATION,
                format!("OAuth {}", config.token.0),
            )
            .query(&params)
            .send()
            .await
            .context(TransportSnafu {
                endpoint: config.status_url.clone(),
            })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.context(TransportSnafu {
                endpoint: config.status_url.clone(),
            })?;
            return UnexpectedStatusSnafu {
                endpoint: config.status_url.clone(),
                status: status.as_u16(),
                body,
            }
            .fail();
        }

        response.json().await.context(UnparseableBodySnafu {
            endpoint: config.status_url.clone(),
        })
    }
}

/// Checks the response shape and returns the homework entries in server
/// order.
pub fn homework_entries(response: &Value) -> Result<&[Value]> {
    let members = response.as_object().context(ResponseNotAnObjectSnafu)?;
    let homeworks = members.get("homeworks").context(MissingHomeworksKeySnafu)?;
    let homeworks = homeworks.as_array().context(HomeworksNotAnArraySnafu)?;

    Ok(homeworks)
}

/// Renders the notification text for a single homework entry.
pub fn status_change_message(homework: &Value) -> Result<String> {
    let name = homework
        .get("homework_name")
        .and_then(Value::as_str)
        .context(MissingHomeworkNameSnafu)?;
    let raw_status = homework
        .get("status")
        .and_then(Value::as_str)
        .context(MissingStatusSnafu)?;
    let status = HomeworkStatus::from_api(raw_status).context(UnknownStatusSnafu {
        value: raw_status,
    })?;

    Ok(format!(
        "Изменился статус проверки работы \"{}\". {}",
        name,
        status.verdict()
    ))
}

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("PRACTICUM_TOKEN must be set"))]
    UnknownPracticumToken { source: env::VarError },

    #[snafu(display("PRACTICUM_TOKEN must not be blank"))]
    BlankPracticumToken,

    UnableToConfigureStatusUrl { source: url::ParseError },

    #[snafu(display("Unable to reach {}", endpoint))]
    Transport {
        endpoint: Url,
        source: reqwest::Error,
    },

    #[snafu(display("{} answered HTTP {}: {}", endpoint, status, body))]
    UnexpectedStatus {
        endpoint: Url,
        status: u16,
        body: String,
    },

    #[snafu(display("{} answered with a body that is not JSON", endpoint))]
    UnparseableBody {
        endpoint: Url,
        source: reqwest::Error,
    },

    #[snafu(display("The response is not a JSON object"))]
    ResponseNotAnObject,

    #[snafu(display("The response has no \"homeworks\" key"))]
    MissingHomeworksKey,

    #[snafu(display("The \"homeworks\" value is not an array"))]
    HomeworksNotAnArray,

    #[snafu(display("The homework entry has no \"homework_name\" key"))]
    MissingHomeworkName,

    #[snafu(display("The homework entry has no \"status\" key"))]
    MissingStatus,

    #[snafu(display("Unknown homework status: {}", value))]
    UnknownStatus { value: String },
}

type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_the_status_change_template() {
        let homework = json!({ "homework_name": "hw1", "status": "approved" });

        let message = status_change_message(&homework).expect("a valid entry must render");

        assert_eq!(
            message,
            "Изменился статус проверки работы \"hw1\". \
             Работа проверена: ревьюеру всё понравилось. Ура!",
        );
    }

    #[test]
    fn each_status_maps_to_its_verdict() {
        assert_eq!(
            HomeworkStatus::Approved.verdict(),
            "Работа проверена: ревьюеру всё понравилось. Ура!",
        );
        assert_eq!(
            HomeworkStatus::Reviewing.verdict(),
            "Работа взята на проверку ревьюером.",
        );
        assert_eq!(
            HomeworkStatus::Rejected.verdict(),
            "Работа проверена: у ревьюера есть замечания.",
        );
    }

    #[test]
    fn a_non_object_response_is_rejected() {
        let e = homework_entries(&json!(["not", "an", "object"])).unwrap_err();

        assert!(matches!(e, Error::ResponseNotAnObject));
    }

    #[test]
    fn a_response_without_homeworks_is_rejected() {
        let e = homework_entries(&json!({ "current_date": 0 })).unwrap_err();

        assert!(matches!(e, Error::MissingHomeworksKey));
    }

    #[test]
    fn a_non_array_homeworks_value_is_rejected() {
        let e = homework_entries(&json!({ "homeworks": "hw1" })).unwrap_err();

        assert!(matches!(e, Error::HomeworksNotAnArray));
    }

    #[test]
    fn entries_keep_the_server_order() {
        let response = json!({
            "homeworks": [
                { "homework_name": "hw2", "status": "reviewing" },
                { "homework_name": "hw1", "status": "approved" },
            ],
        });

        let entries = homework_entries(&response).expect("a well-formed response");

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["homework_name"], "hw2");
    }

    #[test]
    fn an_entry_without_a_name_is_rejected() {
        let e = status_change_message(&json!({ "status": "approved" })).unwrap_err();

        assert!(matches!(e, Error::MissingHomeworkName));
    }

    #[test]
    fn an_entry_without_a_status_is_rejected() {
        let e = status_change_message(&json!({ "homework_name": "hw1" })).unwrap_err();

        assert!(matches!(e, Error::MissingStatus));
    }

    #[test]
    fn an_unrecognized_status_is_rejected() {
        let homework = json!({ "homework_name": "hw1", "status": "lost" });

        let e = status_change_message(&homework).unwrap_err();

        match e {
            Error::UnknownStatus { value } => assert_eq!(value, "lost"),
            other => panic!("Expected UnknownStatus, got {:?}", other),
        }
    }

    #[test]
    fn an_unexpected_http_status_names_code_and_body() {
        let e = Error::UnexpectedStatus {
            endpoint: Url::parse(STATUS_ENDPOINT).expect("the endpoint constant must parse"),
            status: 503,
            body: "Service Unavailable".into(),
        };

        let rendered = e.to_string();
        assert!(rendered.contains("503"), "missing code: {}", rendered);
        assert!(
            rendered.contains("Service Unavailable"),
            "missing body: {}",
            rendered,
        );
    }

    #[test]
    fn a_blank_token_is_a_configuration_error() {
        let e = Config::new("   ").unwrap_err();

        assert!(matches!(e, Error::BlankPracticumToken));
    }

    // No other test reads this variable, so removing it cannot race.
    #[test]
    fn a_missing_token_is_a_configuration_error() {
        env::remove_var("PRACTICUM_TOKEN");

        let e = Config::from_environment().unwrap_err();

        assert!(matches!(e, Error::UnknownPracticumToken { .. }));
    }

    #[tokio::test]
    async fn a_transport_failure_names_the_endpoint() {
        // Port 1 on the loopback interface refuses connections.
        let config = Config {
            token: AccessToken("token-value".into()),
            status_url: Url::parse("http://127.0.0.1:1/").expect("a literal URL must parse"),
        };

        let e = config
            .into_client()
            .homework_statuses(UnixTimestamp(0))
            .await
            .unwrap_err();

        assert!(matches!(e, Error::Transport { .. }));
        assert!(e.to_string().contains("127.0.0.1"));
    }
}
