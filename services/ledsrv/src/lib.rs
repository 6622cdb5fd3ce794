//! LED display bridge service (ledsrv)
//!
//! Polls a scalar query per display and pushes the value to the display
//! controller whenever it changes.
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌──────────┐   ┌─────────────┐
//! │ DataSource  │──►│ DisplayMonitor│──►│ encoder  │──►│ transport   │
//! │ (sqlx Any)  │   │ (per display) │   │ (frames) │   │ (TCP/Modbus)│
//! └─────────────┘   └──────┬───────┘   └──────────┘   └─────────────┘
//!                          │ commit last_value
//!                          ▼
//!                   ┌──────────────┐◄── admin API (axum)
//!                   │   registry   │
//!                   └──────────────┘
//! ```
//!
//! - **`display`**: display records and validation
//! - **`encoder`**: value to wire frame, one variant per protocol
//! - **`protocols::modbus`**: MBAP/FC16 framing for register displays
//! - **`transport`**: connection-per-send TCP delivery
//! - **`datasource`**: scalar query execution
//! - **`registry`**: JSON document store shared by monitors and the API
//! - **`monitor`** / **`supervisor`**: per-display polling workers
//! - **`api`**: admin CRUD endpoints

pub mod api;
pub mod bootstrap;
pub mod config;
pub mod datasource;
pub mod display;
pub mod encoder;
pub mod error;
pub mod monitor;
pub mod protocols;
pub mod registry;
pub mod supervisor;
pub mod transport;

pub use config::{EmptyValuePolicy, LedSrvConfig};
pub use display::{DisplayConfig, DisplayProtocol, DisplayUpdate};
pub use encoder::{encode, EncodeParams, Frame};
pub use error::{LedSrvError, Result};
pub use monitor::{CycleOutcome, DisplayMonitor, MonitorContext};
pub use registry::DisplayRegistry;
pub use supervisor::{Supervisor, SupervisorHandle};
pub use transport::{DisplayTransport, TcpDisplayTransport};
