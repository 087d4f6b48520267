use std::io::BufRead;

use servoctl_core::{servo::AngularServo, PulseOutput};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{pause, CommandError};
use crate::config::SequenceConfig;

///Reads stdin lines on a plain thread and forwards them. A blocking read can't be cancelled, so the thread is left
///detached; it dies with the process instead of holding up runtime shutdown.
pub fn spawn_stdin_lines() -> mpsc::Receiver<std::io::Result<String>> {
    let (tx, rx) = mpsc::channel(1);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
        debug!("stdin reader shutting down");
    });
    rx
}

///Reads one integer angle per line and moves the servo there, until the sentinel, end of input or an interrupt.
pub async fn run<P: PulseOutput>(
    servo: &mut AngularServo<P>,
    seq: &SequenceConfig,
    cancel: &CancellationToken,
    mut lines: mpsc::Receiver<std::io::Result<String>>,
) -> Result<(), CommandError> {
    let range = *servo.range();
    debug!("resolution: {} degrees per us", range.step());
    loop {
        info!(
            "enter angle ({}-{}, {} to exit):",
            range.min_angle, range.max_angle, seq.prompt_sentinel
        );
        let line = tokio::select! {
            line = lines.recv() => line,
            _ = cancel.cancelled() => break,
        };
        let Some(line) = line.transpose()? else {
            break;
        };
        let angle: i64 = match line.trim().parse() {
            Ok(angle) => angle,
            Err(_) => {
                warn!("not an integer angle: {:?}", line.trim());
                continue;
            }
        };
        if angle == seq.prompt_sentinel {
            break;
        }
        let width = servo.set_angle(angle as f64)?;
        info!("pulse width: {}us", width);
        if !pause(cancel, seq.prompt_settle_ms).await {
            break;
        }
    }
    servo.detach()?;
    Ok(())
}
