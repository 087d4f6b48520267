use servoctl_core::{servo::AngularServo, PulseOutput};
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{pause, CommandError};
use crate::config::SequenceConfig;

///Steps through the sweep angles, then stops the signal.
pub async fn run<P: PulseOutput>(
    servo: &mut AngularServo<P>,
    seq: &SequenceConfig,
    cancel: &CancellationToken,
) -> Result<(), CommandError> {
    'sweep: loop {
        for angle in &seq.sweep_angles {
            let width = servo.set_angle(*angle)?;
            info!("angle {} ({}us)", angle, width);
            if !pause(cancel, seq.sweep_delay_ms).await {
                break 'sweep;
            }
        }
        if !seq.sweep_repeat || seq.sweep_angles.is_empty() {
            break;
        }
    }
    servo.detach()?;
    info!("servo detached");
    Ok(())
}
