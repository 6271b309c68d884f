use crate::{
    practicum::{self, UnixTimestamp},
    telegram,
};
use async_trait::async_trait;
use serde_json::Value;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, error, info, trace, trace_span, Instrument};

/// Where homework status responses come from.
#[async_trait]
pub trait StatusSource {
    async fn homework_statuses(&self, from_date: UnixTimestamp)
        -> Result<Value, practicum::Error>;
}

#[async_trait]
impl StatusSource for practicum::Client {
    async fn homework_statuses(
        &self,
        from_date: UnixTimestamp,
    ) -> Result<Value, practicum::Error> {
        practicum::Client::homework_statuses(self, from_date).await
    }
}

/// Where rendered notifications go.
#[async_trait]
pub trait Notifier {
    async fn send_message(&self, text: &str) -> Result<(), telegram::Error>;
}

#[async_trait]
impl Notifier for telegram::Client {
    async fn send_message(&self, text: &str) -> Result<(), telegram::Error> {
        telegram::Client::send_message(self, text).await
    }
}

pub trait Clock {
    fn now(&self) -> UnixTimestamp;
}

#[derive(Debug, Copy, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> UnixTimestamp {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();

        UnixTimestamp(since_epoch.as_secs() as i64)
    }
}

/// The polling loop and the little state it carries between cycles.
///
/// The cursor asks the API only for changes since the last successful
/// cycle; the last sent message suppresses duplicate notifications.
/// Neither survives the process.
#[derive(Debug)]
pub struct Poller<S, N, C> {
    source: S,
    notifier: N,
    clock: C,
    interval: Duration,
    cursor: UnixTimestamp,
    last_message: Option<String>,
}

impl<S, N, C> Poller<S, N, C>
where
    S: StatusSource,
    N: Notifier,
    C: Clock,
{
    pub fn new(source: S, notifier: N, clock: C, interval: Duration) -> Self {
        let cursor = clock.now();

        Self {
            source,
            notifier,
            clock,
            interval,
            cursor,
            last_message: None,
        }
    }

    /// Polls forever. Only external process termination stops it.
    pub async fn run(&mut self) {
        let s = trace_span!("poll");

        async {
            trace!("Starting polling");

            loop {
                self.run_cycle().await;
                tokio::time::sleep(self.interval).await;
            }
        }
        .instrument(s)
        .await
    }

    /// One cycle including loop-level recovery; never fails. Any cycle
    /// error is logged and relayed to the chat as a failure report.
    pub async fn run_cycle(&mut self) {
        if let Err(e) = self.run_once().await {
            let message = format!("Сбой в работе программы: {}", e);
            error!("{}", message);
            self.send_best_effort(&message).await;
        }
    }

    /// One polling cycle: fetch, validate, compare, notify.
    ///
    /// The cursor advances only when the whole cycle succeeds, so a
    /// failed window is asked for again on the next cycle.
    pub async fn run_once(&mut self) -> Result<(), practicum::Error> {
        let response = self.source.homework_statuses(self.cursor).await?;

        if response_has_content(&response) {
            let homeworks = practicum::homework_entries(&response)?;
            match homeworks.first() {
                Some(latest) => {
                    let message = practicum::status_change_message(latest)?;
                    if self.last_message.as_deref() != Some(message.as_str()) {
                        self.send_best_effort(&message).await;
                        self.last_message = Some(message);
                    }
                }
                None => debug!("No new homework statuses"),
            }
        }

        self.cursor = self.clock.now();

        Ok(())
    }

    async fn send_best_effort(&self, message: &str) {
        match self.notifier.send_message(message).await {
            Ok(()) => info!("Sent notification: {}", message),
            Err(e) => error!("Unable to send notification: {}", e),
        }
    }
}

fn response_has_content(response: &Value) -> bool {
    match response {
        Value::Null => false,
        Value::Object(members) => !members.is_empty(),
        _ => true,
    }
}
