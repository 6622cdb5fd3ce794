//! Worker supervisor
//!
//! Reads the registry once at startup and spawns one monitor task per valid
//! display. Registry changes made afterwards take effect on the next restart.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::error::RegistryError;
use crate::monitor::{DisplayMonitor, MonitorContext};

/// Running monitors
pub struct SupervisorHandle {
    started: Vec<String>,
    skipped: Vec<String>,
    token: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl SupervisorHandle {
    /// Displays with a running monitor
    pub fn started(&self) -> &[String] {
        &self.started
    }

    /// Records that failed to load or validate
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    /// Token cancelled on shutdown
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Cancel every monitor and wait for in-flight cycles to finish
    pub async fn shutdown(self) {
        self.token.cancel();
        for task in self.tasks {
            if let Err(e) = task.await {
                error!("Monitor task ended abnormally: {}", e);
            }
        }
        info!("All monitors stopped");
    }
}

pub struct Supervisor;

impl Supervisor {
    /// Load the registry and start one monitor per valid display
    ///
    /// A bad record only costs its own monitor; an unreadable registry
    /// document fails startup.
    pub async fn start(
        ctx: MonitorContext,
        token: CancellationToken,
    ) -> Result<SupervisorHandle, RegistryError> {
        let records = ctx.registry.load_displays().await?;
        info!(
            "Loaded {} display record(s) from {}",
            records.len(),
            ctx.registry.path().display()
        );

        let mut started = Vec::new();
        let mut skipped = Vec::new();
        let mut tasks = Vec::new();

        for (index, record) in records.into_iter().enumerate() {
            let display = match record {
                Ok(display) => display,
                Err(e) => {
                    warn!("Skipping display record #{}: {}", index, e);
                    skipped.push(format!("#{}", index));
                    continue;
                },
            };

            let name = display.name.clone();
            match DisplayMonitor::new(display, ctx.clone()) {
                Ok(monitor) => {
                    tasks.push(tokio::spawn(monitor.run(token.child_token())));
                    started.push(name);
                },
                Err(e) => {
                    warn!("Skipping display '{}': {}", name, e);
                    skipped.push(name);
                },
            }
        }

        if started.is_empty() {
            warn!("No display monitors started");
        } else {
            info!("Started {} display monitor(s): {}", started.len(), started.join(", "));
        }

        Ok(SupervisorHandle {
            started,
            skipped,
            token,
            tasks,
        })
    }
}
