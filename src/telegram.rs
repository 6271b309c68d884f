use serde::Serialize;
use snafu::{ensure, ResultExt, Snafu};
use std::env;
use tracing::{trace, trace_span, Instrument};
use url::Url;

const BOT_API_URI: &str = "https://api.telegram.org";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ChatId(pub String);

#[derive(Debug, Clone)]
pub struct Config {
    chat_id: ChatId,
    send_message_url: Url,
}

impl Config {
    pub fn from_environment() -> Result<Self> {
        let token = env::var("TELEGRAM_TOKEN").context(UnknownBotTokenSnafu)?;
        let chat_id = env::var("TELEGRAM_CHAT_ID").context(UnknownChatIdSnafu)?;

        Self::new(token, chat_id)
    }

    pub fn new(token: impl Into<String>, chat_id: impl Into<String>) -> Result<Self> {
        let token = token.into();
        let chat_id = chat_id.into();
        ensure!(!token.trim().is_empty(), BlankBotTokenSnafu);
        ensure!(!chat_id.trim().is_empty(), BlankChatIdSnafu);

        // The Bot API keys every method on the bot token.
        let send_message_url = Url::parse(BOT_API_URI)
            .and_then(|uri| uri.join(&format!("/bot{}/sendMessage", token)))
            .context(UnableToConfigureSendMessageUrlSnafu)?;

        Ok(Self {
            chat_id: ChatId(chat_id),
            send_message_url,
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
    pub async fn send_message(&self, text: &str) -> Result<()> {
        let Self { client, config } = self;
        let s = trace_span!("send_message");

        #[derive(Debug, Serialize)]
        struct SendMessageParams<'a> {
            chat_id: &'a ChatId,
            text: &'a str,
        }

        async {
            trace!("Delivering notification");

            let params = SendMessageParams {
                chat_id: &config.chat_id,
                text,
            };

            client
                .post(config.send_message_url.clone())
                .query(&params)
                .send()
                .await
                .context(UnableToSendMessageSnafu)?
                .error_for_status()
                .context(MessageRejectedSnafu)?;

            Ok(())
        }
        .instrument(s)
        .await
    }
}

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("TELEGRAM_TOKEN must be set"))]
    UnknownBotToken { source: env::VarError },

    #[snafu(display("TELEGRAM_TOKEN must not be blank"))]
    BlankBotToken,

    #[snafu(display("TELEGRAM_CHAT_ID must be set"))]
    UnknownChatId { source: env::VarError },

    #[snafu(display("TELEGRAM_CHAT_ID must not be blank"))]
    BlankChatId,

    UnableToConfigureSendMessageUrl { source: url::ParseError },

    UnableToSendMessage { source: reqwest::Error },

    MessageRejected { source: reqwest::Error },
}

type Result<T, E = Error> = std::result::Result<T, E>;
