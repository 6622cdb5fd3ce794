//! Signal-driven shutdown
//!
//! The binary hands a root `CancellationToken` to `shutdown_on_signal`; every
//! worker and the admin API hold child tokens of it.

use std::fmt;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Signal that ended the process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Interrupt,
    Terminate,
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interrupt => write!(f, "SIGINT"),
            Self::Terminate => write!(f, "SIGTERM"),
        }
    }
}

/// Wait for Ctrl+C, or SIGTERM on Unix
pub async fn wait_for_signal() -> ShutdownSignal {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut term = match signal(SignalKind::terminate()) {
            Ok(sig) => Some(sig),
            Err(e) => {
                warn!("SIGTERM handler not installed, Ctrl+C only: {}", e);
                None
            },
        };

        tokio::select! {
            _ = ctrl_c() => ShutdownSignal::Interrupt,
            _ = async {
                match term.as_mut() {
                    Some(sig) => {
                        sig.recv().await;
                    },
                    None => std::future::pending::<()>().await,
                }
            } => ShutdownSignal::Terminate,
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c().await;
        ShutdownSignal::Interrupt
    }
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Ctrl+C handler failed: {}", e);
        std::future::pending::<()>().await
    }
}

/// Cancel `token` on the first shutdown signal
///
/// Returns `None` when the token was cancelled elsewhere first.
pub async fn shutdown_on_signal(token: CancellationToken) -> Option<ShutdownSignal> {
    tokio::select! {
        signal = wait_for_signal() => {
            info!("{} received, shutting down", signal);
            token.cancel();
            Some(signal)
        },
        _ = token.cancelled() => None,
    }
}
