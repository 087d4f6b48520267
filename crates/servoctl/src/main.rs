pub mod command;
pub mod config;
pub mod interrupt;

use std::process::ExitCode;

use command::Command;
use config::ServoCtlConfig;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "servoctl=info,servoctl_core=info,servoctl_rpi_gpio=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().collect();

    let Some(cmd) = args.get(1).and_then(|arg| Command::parse(arg)) else {
        warn!("{}", Command::USAGE);
        warn!("got {}", args.join(","));
        return ExitCode::FAILURE;
    };
    if args.len() > 3 {
        warn!("{}", Command::USAGE);
        return ExitCode::FAILURE;
    }

    let config = match ServoCtlConfig::load(args.get(2).map(|o| o.as_str())) {
        Ok(config) => config,
        Err(err) => {
            error!("Failed to parse config: {:?}", err);
            return ExitCode::FAILURE;
        }
    };

    let cancel = interrupt::watch_ctrl_c();
    info!("servoctl {:?} starting on {:?} backend", cmd, config.backend);
    match command::run(cmd, &config, cancel).await {
        Ok(()) => {
            info!("servoctl done!");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("servoctl exited with an error: {:?}", err);
            ExitCode::FAILURE
        }
    }
}
