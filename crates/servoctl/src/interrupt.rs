use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

///Spawns a task that cancels the returned token on Ctrl+C. Commands watch the token and run their own cleanup, so
///the signal itself never touches hardware.
pub fn watch_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("Ctrl+C pressed, stopping");
                token.cancel();
            }
            Err(err) => error!("unable to listen for Ctrl+C: {}", err),
        }
    });
    cancel
}
