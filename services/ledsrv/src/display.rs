//! Display definitions
//!
//! A `DisplayConfig` is one record of the registry. Serialized key names
//! follow the registry document (`ip`, `interval`, `start_reg`, ...).

use serde::{Deserialize, Serialize};

use crate::encoder::{EncodeParams, DEVICE_HEADER, DEVICE_HEADER_LEN};
use crate::error::ConfigError;
use crate::protocols::modbus::constants::DEFAULT_TCP_PORT;

/// Business limit on simultaneously configured displays
pub const MAX_DISPLAYS: usize = 3;
/// Shortest allowed poll interval in seconds
pub const MIN_POLL_INTERVAL_SECS: u64 = 5;
/// Allowed `max_chars` range
pub const MIN_MAX_CHARS: usize = 2;
pub const MAX_MAX_CHARS: usize = 100;
/// Allowed Modbus unit ids
pub const MIN_UNIT_ID: u8 = 1;
pub const MAX_UNIT_ID: u8 = 247;

/// Default port of the custom HEX/UTF-16 controllers
pub const DEFAULT_CUSTOM_PORT: u16 = 5005;

/// Wire protocol spoken by a display controller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayProtocol {
    /// Text packed two ASCII characters per holding register, written with FC16
    #[default]
    HoldingRegisterAscii,
    /// Fixed header, length byte, then UTF-16BE text over a raw TCP stream
    CustomHexUtf16,
}

impl DisplayProtocol {
    pub fn default_port(self) -> u16 {
        match self {
            DisplayProtocol::HoldingRegisterAscii => DEFAULT_TCP_PORT,
            DisplayProtocol::CustomHexUtf16 => DEFAULT_CUSTOM_PORT,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DisplayProtocol::HoldingRegisterAscii => "holding_register_ascii",
            DisplayProtocol::CustomHexUtf16 => "custom_hex_utf16",
        }
    }
}

impl std::fmt::Display for DisplayProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_unit_id() -> u8 {
    1
}

fn default_max_chars() -> usize {
    20
}

/// One physical display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Unique key
    pub name: String,
    /// Controller host name or IP address
    #[serde(rename = "ip")]
    pub host: String,
    /// Controller port; protocol default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default)]
    pub protocol: DisplayProtocol,
    /// Scalar query handed verbatim to the data source
    pub query: String,
    #[serde(rename = "interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_unit_id")]
    pub unit_id: u8,
    #[serde(rename = "start_reg", default)]
    pub start_register: u16,
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
    /// Device header override for the custom protocol, as hex text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    /// Last value confirmed on the display
    #[serde(default)]
    pub last_value: Option<String>,
}

/// Network endpoint of a display controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayTarget {
    pub host: String,
    pub port: u16,
}

impl std::fmt::Display for DisplayTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl DisplayConfig {
    /// Effective port
    pub fn port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.protocol.default_port())
    }

    pub fn target(&self) -> DisplayTarget {
        DisplayTarget {
            host: self.host.clone(),
            port: self.port(),
        }
    }

    /// Check every admin-owned field against its bounds
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::invalid("name", "must not be empty"));
        }
        if self.host.trim().is_empty() {
            return Err(ConfigError::invalid("ip", "must not be empty"));
        }
        if self.port == Some(0) {
            return Err(ConfigError::invalid("port", "must be between 1 and 65535"));
        }
        if self.query.trim().is_empty() {
            return Err(ConfigError::invalid("query", "must not be empty"));
        }
        if self.poll_interval_secs < MIN_POLL_INTERVAL_SECS {
            return Err(ConfigError::invalid(
                "interval",
                format!(
                    "{} is below the minimum of {} seconds",
                    self.poll_interval_secs, MIN_POLL_INTERVAL_SECS
                ),
            ));
        }
        if !(MIN_UNIT_ID..=MAX_UNIT_ID).contains(&self.unit_id) {
            return Err(ConfigError::invalid(
                "unit_id",
                format!(
                    "{} is outside {}..={}",
                    self.unit_id, MIN_UNIT_ID, MAX_UNIT_ID
                ),
            ));
        }
        if !(MIN_MAX_CHARS..=MAX_MAX_CHARS).contains(&self.max_chars) {
            return Err(ConfigError::invalid(
                "max_chars",
                format!(
                    "{} is outside {}..={}",
                    self.max_chars, MIN_MAX_CHARS, MAX_MAX_CHARS
                ),
            ));
        }
        self.device_header()?;
        Ok(())
    }

    /// Parsed device header, default constant when not overridden
    pub fn device_header(&self) -> Result<[u8; DEVICE_HEADER_LEN], ConfigError> {
        let Some(text) = self.header.as_deref().filter(|h| !h.trim().is_empty()) else {
            return Ok(DEVICE_HEADER);
        };

        let bytes = common::hex::decode(text)
            .map_err(|e| ConfigError::invalid("header", e.to_string()))?;
        bytes.try_into().map_err(|bytes: Vec<u8>| {
            ConfigError::invalid(
                "header",
                format!(
                    "expected {} bytes, got {}",
                    DEVICE_HEADER_LEN,
                    bytes.len()
                ),
            )
        })
    }

    /// Encoder parameters for this display
    pub fn encode_params(&self) -> Result<EncodeParams, ConfigError> {
        Ok(EncodeParams {
            protocol: self.protocol,
            max_chars: self.max_chars,
            unit_id: self.unit_id,
            start_register: self.start_register,
            header: self.device_header()?,
        })
    }
}

/// Admin edit of an existing display; absent fields are left unchanged
///
/// `name` and `last_value` are deliberately not editable here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayUpdate {
    #[serde(default, rename = "ip")]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub protocol: Option<DisplayProtocol>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default, rename = "interval")]
    pub poll_interval_secs: Option<u64>,
    #[serde(default)]
    pub unit_id: Option<u8>,
    #[serde(default, rename = "start_reg")]
    pub start_register: Option<u16>,
    #[serde(default)]
    pub max_chars: Option<usize>,
    /// Empty string clears an override
    #[serde(default)]
    pub header: Option<String>,
}

impl DisplayUpdate {
    pub fn apply_to(&self, config: &mut DisplayConfig) {
        if let Some(host) = &self.host {
            config.host = host.trim().to_string();
        }
        if let Some(port) = self.port {
            config.port = Some(port);
        }
        if let Some(protocol) = self.protocol {
            config.protocol = protocol;
        }
        if let Some(query) = &self.query {
            config.query = query.trim().to_string();
        }
        if let Some(interval) = self.poll_interval_secs {
            config.poll_interval_secs = interval;
        }
        if let Some(unit_id) = self.unit_id {
            config.unit_id = unit_id;
        }
        if let Some(start) = self.start_register {
            config.start_register = start;
        }
        if let Some(max_chars) = self.max_chars {
            config.max_chars = max_chars;
        }
        if let Some(header) = &self.header {
            config.header = (!header.trim().is_empty()).then(|| header.clone());
        }
    }
}
