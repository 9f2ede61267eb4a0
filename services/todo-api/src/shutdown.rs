//! Graceful shutdown
//!
//! Resolves on SIGINT or SIGTERM so `axum::serve` can stop accepting
//! connections and drain in-flight requests.

use std::future::Future;
use std::time::Duration;

use tokio::signal;
use tracing::{error, info, warn};

/// Waits for SIGTERM or SIGINT.
///
/// A handler that cannot be installed is logged and never fires; the other
/// signal still triggers shutdown.
pub async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            info!("Received SIGTERM, initiating shutdown");
        }
    }
}

/// Runs `server` to completion, allowing it `drain` to finish once `signal`
/// has fired.
///
/// `server` is expected to observe the same signal itself and stop accepting
/// new work; this only bounds how long the drain may take.
pub async fn run_with_drain_timeout<F, S, E>(server: F, signal: S, drain: Duration) -> Result<(), E>
where
    F: Future<Output = Result<(), E>>,
    S: Future<Output = ()>,
{
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => return result,
        () = signal => {}
    }

    if let Ok(result) = tokio::time::timeout(drain, &mut server).await {
        info!("Server drained");
        result
    } else {
        warn!(timeout = ?drain, "Shutdown timeout reached, dropping open connections");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_server_finishing_first_returns_its_result() {
        let result: Result<(), &str> = run_with_drain_timeout(
            async { Err("bind failed") },
            std::future::pending(),
            Duration::from_secs(1),
        )
        .await;
        assert_eq!(result, Err("bind failed"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_is_bounded() {
        let result: Result<(), &str> = run_with_drain_timeout(
            std::future::pending(),
            async {},
            Duration::from_secs(30),
        )
        .await;
        assert_eq!(result, Ok(()));
    }

    #[tokio::test]
    async fn test_drain_completes() {
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let server = async move {
            let _ = rx.await;
            Ok::<(), &str>(())
        };
        let signal = async move {
            let _ = tx.send(());
        };

        let result = run_with_drain_timeout(server, signal, Duration::from_secs(5)).await;
        assert_eq!(result, Ok(()));
    }
}
