//!The `servoctl` commands. Each command gets its pins from a `Board` and stops early when the cancellation token
//!fires.

use std::{fmt, time::Duration};

use servoctl_core::{
    error::ServoError,
    esc::Esc,
    servo::AngularServo,
    sim::SimBoard,
    Board, Level,
};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::{Backend, ServoCtlConfig};

pub mod prompt;
pub mod sweep;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Prompt,
    Sweep,
    EscTest,
    RelayTest,
}

impl Command {
    pub const USAGE: &'static str = "usage: servoctl <prompt|sweep|esc-test|relay-test> [config-file]";

    pub fn parse(arg: &str) -> Option<Self> {
        match arg {
            "prompt" => Some(Self::Prompt),
            "sweep" => Some(Self::Sweep),
            "esc-test" => Some(Self::EscTest),
            "relay-test" => Some(Self::RelayTest),
            _ => None,
        }
    }
}

pub enum CommandError {
    Servo(ServoError),
    Io(std::io::Error),
}

impl fmt::Debug for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Servo(err) => write!(f, "CommandError: {}", err),
            Self::Io(err) => write!(f, "CommandError (io): {}", err),
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Servo(err) => write!(f, "{}", err),
            Self::Io(err) => write!(f, "{}", err),
        }
    }
}

impl From<ServoError> for CommandError {
    fn from(err: ServoError) -> Self {
        CommandError::Servo(err)
    }
}

impl From<std::io::Error> for CommandError {
    fn from(err: std::io::Error) -> Self {
        CommandError::Io(err)
    }
}

///Sleeps for `ms` milliseconds. Returns false if cancelled first.
pub(crate) async fn pause(cancel: &CancellationToken, ms: u64) -> bool {
    tokio::select! {
        _ = sleep(Duration::from_millis(ms)) => true,
        _ = cancel.cancelled() => false,
    }
}

///Opens the configured board and runs `cmd` on it.
pub async fn run(cmd: Command, cfg: &ServoCtlConfig, cancel: CancellationToken) -> Result<(), CommandError> {
    match cfg.backend {
        Backend::Sim => {
            info!("using simulated gpio");
            run_on(SimBoard::new(), cmd, cfg, &cancel).await
        }
        #[cfg(feature = "rpi")]
        Backend::Rpi => {
            info!("using raspberry pi gpio");
            let board = servoctl_rpi_gpio::RpiGpio::new()?;
            run_on(board, cmd, cfg, &cancel).await
        }
        #[cfg(not(feature = "rpi"))]
        Backend::Rpi => Err(ServoError::hardware(
            "servoctl was built without the rpi feature".to_string(),
        )
        .into()),
    }
}

async fn run_on<B: Board>(
    mut board: B,
    cmd: Command,
    cfg: &ServoCtlConfig,
    cancel: &CancellationToken,
) -> Result<(), CommandError> {
    match cmd {
        Command::Prompt => {
            let output = board.pulse_output(cfg.servo.pin)?;
            let mut servo = AngularServo::new(output, cfg.servo.range)?;
            let stdin = prompt::spawn_stdin_lines();
            prompt::run(&mut servo, &cfg.sequence, cancel, stdin).await
        }
        Command::Sweep => {
            let output = board.pulse_output(cfg.servo.pin)?;
            let mut servo = AngularServo::new(output, cfg.servo.range)?;
            sweep::run(&mut servo, &cfg.sequence, cancel).await
        }
        Command::EscTest => {
            let on_level = Level::try_from(cfg.esc.throttle.power_on_level)?;
            let output = board.pulse_output(cfg.esc.pwm_pin)?;
            let power = board.power_switch(cfg.esc.power_pin, !on_level)?;
            let mut esc = Esc::new(output, power, &cfg.esc.throttle)?;
            esc_test::run(&mut esc, &cfg.sequence, cancel).await
        }
        Command::RelayTest => {
            let on_level = Level::try_from(cfg.esc.throttle.power_on_level)?;
            let mut power = board.power_switch(cfg.esc.power_pin, !on_level)?;
            relay_test::run(&mut power, on_level, &cfg.sequence, cancel).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        assert_eq!(Command::parse("esc-test"), Some(Command::EscTest));
        assert_eq!(Command::parse("relay-test"), Some(Command::RelayTest));
        assert_eq!(Command::parse("fly"), None);
    }

    #[tokio::test]
    async fn test_rpi_backend_needs_feature() {
        let cfg = ServoCtlConfig { backend: Backend::Rpi, ..ServoCtlConfig::default() };
        if cfg!(not(feature = "rpi")) {
            let res = run(Command::Sweep, &cfg, CancellationToken::new()).await;
            assert!(matches!(res, Err(CommandError::Servo(ServoError::Hardware(_)))));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_on_sim_board() {
        let cfg = ServoCtlConfig::default();
        let res = run(Command::Sweep, &cfg, CancellationToken::new()).await;
        assert!(res.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_bad_power_level() {
        let mut cfg = ServoCtlConfig::default();
        cfg.esc.throttle.power_on_level = 3;
        let res = run(Command::RelayTest, &cfg, CancellationToken::new()).await;
        assert!(matches!(res, Err(CommandError::Servo(ServoError::InvalidLevel(3)))));
    }
}
