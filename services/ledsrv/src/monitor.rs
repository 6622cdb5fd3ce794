//! Display monitor
//!
//! One monitor per display. Every tick it fetches the display's value and,
//! only when the value differs from what the display last confirmed, encodes
//! and sends it. `last_value` advances only after a successful send, so a
//! failed send is retried with the same value on the next tick.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::config::EmptyValuePolicy;
use crate::datasource::DataSource;
use crate::display::{DisplayConfig, DisplayTarget};
use crate::encoder::{self, EncodeParams};
use crate::error::ConfigError;
use crate::registry::DisplayRegistry;
use crate::transport::DisplayTransport;

/// Result of one poll cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Value equals the last confirmed value; nothing sent
    Unchanged,
    /// New value delivered and committed
    Sent,
    /// Value could not be encoded; nothing sent
    EncodeFailed,
    /// Delivery failed; retried next cycle
    SendFailed,
}

/// Collaborators shared by all monitors
#[derive(Clone)]
pub struct MonitorContext {
    pub source: Arc<dyn DataSource>,
    pub transport: Arc<dyn DisplayTransport>,
    pub registry: Arc<DisplayRegistry>,
    pub empty_value: EmptyValuePolicy,
}

/// Polling worker for one display
pub struct DisplayMonitor {
    display: DisplayConfig,
    params: EncodeParams,
    target: DisplayTarget,
    last_value: Option<String>,
    ctx: MonitorContext,
}

impl DisplayMonitor {
    /// Build a monitor; the display must pass validation
    pub fn new(display: DisplayConfig, ctx: MonitorContext) -> Result<Self, ConfigError> {
        display.validate()?;
        let params = display.encode_params()?;
        let target = display.target();
        let last_value = display.last_value.clone();

        Ok(Self {
            display,
            params,
            target,
            last_value,
            ctx,
        })
    }

    pub fn name(&self) -> &str {
        &self.display.name
    }

    /// Value the display is known to show
    pub fn last_value(&self) -> Option<&str> {
        self.last_value.as_deref()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.display.poll_interval_secs)
    }

    /// Run one Query → compare → Encode → Transmit → Commit cycle
    #[instrument(name = "display", skip_all, fields(name = %self.display.name))]
    pub async fn poll_once(&mut self) -> CycleOutcome {
        let fetched = match self.ctx.source.fetch_scalar(&self.display.query).await {
            Ok(value) => value,
            Err(e) => {
                warn!("Data source error, treating as no value: {}", e);
                None
            },
        };
        let current = self.ctx.empty_value.resolve(fetched);

        if current == self.last_value {
            trace!("Value unchanged: {:?}", current);
            return CycleOutcome::Unchanged;
        }

        let frame = match encoder::encode(current.as_deref(), &self.params) {
            Ok(frame) => frame,
            Err(e) => {
                error!("Cannot encode {:?} for {}: {}", current, self.params.protocol, e);
                return CycleOutcome::EncodeFailed;
            },
        };
        debug!(
            hex_data = %frame.to_hex(),
            length = frame.wire_len(),
            "Encoded {:?} for {}",
            current,
            self.target
        );

        if let Err(e) = self.ctx.transport.send(&self.target, &frame).await {
            warn!("Send to {} failed, will retry next cycle: {}", self.target, e);
            return CycleOutcome::SendFailed;
        }

        info!("Display updated: {:?} -> {:?}", self.last_value, current);
        self.last_value = current;

        // The display already shows the value; keep it in memory even if the
        // registry write fails so the next cycle does not resend it
        if let Err(e) = self
            .ctx
            .registry
            .commit_last_value(&self.display.name, self.last_value.as_deref())
            .await
        {
            error!("Failed to commit last_value: {}", e);
        }

        CycleOutcome::Sent
    }

    /// Poll on the display's interval until `shutdown` fires
    ///
    /// The first tick fires immediately; missed ticks are skipped and a cycle
    /// in flight always completes before shutdown is observed.
    pub async fn run(mut self, shutdown: CancellationToken) {
        let mut interval = tokio::time::interval(self.poll_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            "Monitor started: display={} target={} protocol={} interval={}s",
            self.display.name, self.target, self.params.protocol, self.display.poll_interval_secs
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.poll_once().await;
                }
                () = shutdown.cancelled() => {
                    break;
                }
            }
        }

        info!("Monitor stopped: display={}", self.display.name);
    }
}
