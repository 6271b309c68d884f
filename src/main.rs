#![deny(rust_2018_idioms)]

use practicum_relay::{config, poller, practicum, telegram};
use snafu::{ResultExt, Snafu};
use tracing::info;

fn main() {
    if let Err(e) = core() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[tokio::main]
async fn core() -> Result<()> {
    tracing_subscriber::fmt::init();
    dotenv::dotenv().ok();

    let config = config::Config::from_environment().context(UnableToConfigureSnafu)?;

    let practicum_config =
        practicum::Config::from_environment().context(UnableToConfigurePracticumSnafu)?;

    let telegram_config =
        telegram::Config::from_environment().context(UnableToConfigureTelegramSnafu)?;

    info!("Polling for status changes every {:?}", config.poll_interval);

    let mut poller = poller::Poller::new(
        practicum_config.into_client(),
        telegram_config.into_client(),
        poller::SystemClock,
        config.poll_interval,
    );
    poller.run().await;

    Ok(())
}

#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display("Unable to configure application"))]
    UnableToConfigure { source: config::Error },

    #[snafu(display("Unable to configure Practicum integration"))]
    UnableToConfigurePracticum { source: practicum::Error },

    #[snafu(display("Unable to configure Telegram integration"))]
    UnableToConfigureTelegram { source: telegram::Error },
}

type Result<T, E = Error> = std::result::Result<T, E>;
