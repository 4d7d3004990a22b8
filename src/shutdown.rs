//! Process lifecycle: termination signals as cancellation
//!
//! Bridges SIGTERM/SIGINT with the scheduler through a cancellation
//! token, so a signal delivered during the sleep phase ends the
//! process promptly instead of waiting out the interval. No cleanup of
//! an in-flight issuance invocation is attempted beyond what the OS
//! does at process exit.

use tokio_util::sync::CancellationToken;
use tracing::info;

/// Install the termination-signal listener.
///
/// Returns a token that fires once on the first SIGTERM or SIGINT
/// (Ctrl-C elsewhere) and never resets. Must be called from within the
/// runtime.
pub fn install() -> std::io::Result<CancellationToken> {
    let token = CancellationToken::new();
    let cancel = token.clone();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::spawn(async move {
            tokio::select! {
                _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
                _ = sigint.recv() => info!("Received SIGINT, shutting down"),
            }
            cancel.cancel();
        });
    }

    #[cfg(not(unix))]
    {
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received Ctrl-C, shutting down");
            }
            cancel.cancel();
        });
    }

    Ok(token)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn signal_cancels_the_token() {
        let token = install().unwrap();
        assert!(!token.is_cancelled());

        // Deliver SIGTERM to ourselves, as a supervisor would. The
        // installed handler absorbs it instead of killing the test.
        std::process::Command::new("kill")
            .args(["-TERM", &std::process::id().to_string()])
            .status()
            .unwrap();

        tokio::time::timeout(Duration::from_secs(5), token.cancelled())
            .await
            .expect("token should cancel after SIGTERM");
    }
}
