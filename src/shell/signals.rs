use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Cancel `cancellation` on Ctrl+C (and SIGTERM on unix).
///
/// Only the menu observes the token; a running backup always completes.
pub fn setup_interrupt_handler(cancellation: CancellationToken) {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use signal::unix::{signal, SignalKind};

            let mut sigterm = match signal(SignalKind::terminate()) {
                Ok(s) => s,
                Err(e) => {
                    warn!("Failed to listen for SIGTERM: {}", e);
                    return;
                }
            };

            tokio::select! {
                _ = sigterm.recv() => info!("Received SIGTERM"),
                result = tokio::signal::ctrl_c() => match result {
                    Ok(()) => info!("Received interrupt (Ctrl+C)"),
                    Err(e) => {
                        warn!("Failed to listen for interrupt signal: {}", e);
                        return;
                    }
                },
            }
        }

        #[cfg(not(unix))]
        {
            match signal::ctrl_c().await {
                Ok(()) => info!("Received interrupt (Ctrl+C)"),
                Err(e) => {
                    warn!("Failed to listen for interrupt signal: {}", e);
                    return;
                }
            }
        }

        cancellation.cancel();
    });
}
