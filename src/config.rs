//! Typed plugin and VM configuration.
//!
//! The host hands configuration to the plugin as opaque bytes. These helpers
//! read those bytes and deserialize them into a plugin-defined type, from
//! either JSON or TOML.
//!
//! ```ignore
//! #[derive(serde::Deserialize)]
//! struct Settings { header: String }
//!
//! fn on_configure(&mut self, size: usize) -> bool {
//!     match config::load_plugin_configuration::<Settings>(size) {
//!         Ok(settings) => { self.settings = settings; true }
//!         Err(_) => false,
//!     }
//! }
//! ```

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::hostcall;

/// Configuration text format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    /// JSON if the first non-whitespace byte opens an object or array,
    /// TOML otherwise.
    pub fn detect(bytes: &[u8]) -> Self {
        match bytes.iter().copied().find(|b| !b.is_ascii_whitespace()) {
            Some(b'{') | Some(b'[') => Self::Json,
            _ => Self::Toml,
        }
    }
}

/// Configuration error.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No configuration provided")]
    Missing,

    #[error("Configuration is not valid UTF-8")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("Failed to parse JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Deserialize configuration bytes in the given format.
pub fn from_bytes<T: DeserializeOwned>(bytes: &[u8], format: ConfigFormat) -> Result<T, ConfigError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(ConfigError::Missing);
    }
    match format {
        ConfigFormat::Json => Ok(serde_json::from_slice(bytes)?),
        ConfigFormat::Toml => Ok(toml::from_str(std::str::from_utf8(bytes)?)?),
    }
}

/// Deserialize configuration bytes, detecting the format.
pub fn from_bytes_auto<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ConfigError> {
    from_bytes(bytes, ConfigFormat::detect(bytes))
}

/// Read and parse the plugin configuration announced by `on_configure`.
pub fn load_plugin_configuration<T: DeserializeOwned>(size: usize) -> crate::Result<T> {
    let bytes = hostcall::get_plugin_configuration(size)?;
    Ok(from_bytes_auto(&bytes)?)
}

/// Read and parse the VM configuration announced by `on_vm_start`.
pub fn load_vm_configuration<T: DeserializeOwned>(size: usize) -> crate::Result<T> {
    let bytes = hostcall::get_vm_configuration(size)?;
    Ok(from_bytes_auto(&bytes)?)
}
