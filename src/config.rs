use snafu::{ResultExt, Snafu};
use std::{env, time::Duration};

const DEFAULT_POLL_INTERVAL_SECONDS: u64 = 600;

#[derive(Debug, Clone)]
pub struct Config {
    pub poll_interval: Duration,
}

impl Config {
    pub fn from_environment() -> Result<Self> {
        let poll_interval = match env::var("POLL_INTERVAL_SECONDS") {
            Ok(seconds) => {
                let parsed = seconds
                    .parse()
                    .context(InvalidPollIntervalSnafu { seconds })?;
                Duration::from_secs(parsed)
            }
            Err(_) => Duration::from_secs(DEFAULT_POLL_INTERVAL_SECONDS),
        };

        Ok(Self { poll_interval })
    }
}

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("POLL_INTERVAL_SECONDS is invalid: {}", seconds))]
    InvalidPollInterval {
        source: std::num::ParseIntError,
        seconds: String,
    },
}

type Result<T, E = Error> = std::result::Result<T, E>;
