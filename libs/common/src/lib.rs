//! Shared service library for the LED bridge
//!
//! Provides the bootstrap pieces every service binary needs:
//! - command-line arguments shared by all services
//! - layered configuration loading (defaults, file, environment)
//! - logging initialization
//! - graceful shutdown signals
//! - hex helpers for frame dumps and device constants

pub mod bootstrap_args;
pub mod config_loader;
pub mod error;
pub mod hex;
pub mod logging;
pub mod shutdown;

pub use error::{Error, Result};
