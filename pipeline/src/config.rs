//! # Device Configuration
//!
//! Static settings for the relay. The model uses fixed-capacity strings so
//! the same struct can be stored as a compact `postcard` blob in
//! non-volatile memory or read from a JSON file on a host.
//!
//! ```json
//! {
//!   "endpoint": "http://192.168.99.135:8000/run-model",
//!   "ssid": "A",
//!   "password": "12345678",
//!   "flashEnabled": false
//! }
//! ```

use core::time::Duration;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use heapless::String;
use serde::{Deserialize, Serialize};

/// Longest accepted endpoint URL
pub const MAX_ENDPOINT_LEN: usize = 128;
/// 802.11 SSID limit
pub const MAX_SSID_LEN: usize = 32;
/// WPA2 passphrase limit
pub const MAX_PASSWORD_LEN: usize = 64;
/// Upper bound of an encoded config blob
pub const CONFIG_BLOB_MAX: usize = 512;

/// Errors found while loading or checking a configuration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("endpoint must be an http:// or https:// URL")]
    InvalidEndpoint,
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
    #[error("config blob could not be encoded or decoded")]
    Blob,
}

/// Settings consumed by the pipeline and its collaborators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceConfig {
    /// Inference service URL the frames are posted to
    pub endpoint: String<MAX_ENDPOINT_LEN>,
    /// Network name to join
    pub ssid: String<MAX_SSID_LEN>,
    /// Network passphrase
    pub password: String<MAX_PASSWORD_LEN>,
    /// Light the flash LED for each capture
    pub flash_enabled: bool,
    /// Delay between flash on and capture, in milliseconds
    pub flash_settle_ms: u32,
    /// Acquisition tick, in milliseconds
    pub capture_period_ms: u32,
    /// Transmission tick, in milliseconds
    pub transmit_period_ms: u32,
    /// Bound on sending a frame and receiving the response head
    pub upload_timeout_ms: u32,
    /// Bound on reading the response body
    pub read_timeout_ms: u32,
    /// Largest response body that will be cached
    pub max_response_bytes: u32,
    /// Address the HTTP listener binds to
    pub listen_addr: SocketAddr,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            endpoint: fixed("http://192.168.99.135:8000/run-model"),
            ssid: String::new(),
            password: String::new(),
            flash_enabled: false,
            flash_settle_ms: 100,
            capture_period_ms: 1000,
            transmit_period_ms: 1000,
            upload_timeout_ms: 10_000,
            read_timeout_ms: 10_000,
            max_response_bytes: 4 * 1024 * 1024,
            listen_addr: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 80)),
        }
    }
}

impl DeviceConfig {
    /// Check the settings the pipeline depends on
    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = self.endpoint.as_str();
        let has_host = endpoint
            .strip_prefix("http://")
            .or_else(|| endpoint.strip_prefix("https://"))
            .is_some_and(|rest| !rest.is_empty());
        if !has_host {
            return Err(ConfigError::InvalidEndpoint);
        }

        let nonzero = [
            ("capturePeriodMs", self.capture_period_ms),
            ("transmitPeriodMs", self.transmit_period_ms),
            ("uploadTimeoutMs", self.upload_timeout_ms),
            ("readTimeoutMs", self.read_timeout_ms),
            ("maxResponseBytes", self.max_response_bytes),
        ];
        for (name, value) in nonzero {
            if value == 0 {
                return Err(ConfigError::Zero(name));
            }
        }

        Ok(())
    }

    /// Replace the endpoint, failing if it does not fit
    pub fn set_endpoint(&mut self, endpoint: &str) -> Result<(), ConfigError> {
        let mut value = String::new();
        value
            .push_str(endpoint)
            .map_err(|_| ConfigError::InvalidEndpoint)?;
        self.endpoint = value;
        Ok(())
    }

    /// Encode into `buffer` as a postcard blob
    pub fn to_blob<'a>(&self, buffer: &'a mut [u8]) -> Result<&'a mut [u8], ConfigError> {
        postcard::to_slice(self, buffer).map_err(|_| ConfigError::Blob)
    }

    /// Decode a postcard blob
    pub fn from_blob(data: &[u8]) -> Result<Self, ConfigError> {
        postcard::from_bytes(data).map_err(|_| ConfigError::Blob)
    }

    pub fn capture_period(&self) -> Duration {
        Duration::from_millis(self.capture_period_ms.into())
    }

    pub fn transmit_period(&self) -> Duration {
        Duration::from_millis(self.transmit_period_ms.into())
    }

    pub fn flash_settle(&self) -> Duration {
        Duration::from_millis(self.flash_settle_ms.into())
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_millis(self.upload_timeout_ms.into())
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms.into())
    }
}

// Only used for literals known to fit.
fn fixed<const N: usize>(s: &str) -> String<N> {
    let mut value = String::new();
    let _ = value.push_str(s);
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = DeviceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.capture_period(), Duration::from_secs(1));
        assert_eq!(config.flash_settle(), Duration::from_millis(100));
        assert!(!config.flash_enabled);
    }

    #[test]
    fn test_rejects_bad_endpoint() {
        let mut config = DeviceConfig::default();
        config.set_endpoint("ftp://example.com/model").unwrap();
        assert_eq!(config.validate(), Err(ConfigError::InvalidEndpoint));

        config.set_endpoint("http://").unwrap();
        assert_eq!(config.validate(), Err(ConfigError::InvalidEndpoint));

        let too_long = format!("http://{}", "a".repeat(MAX_ENDPOINT_LEN));
        assert_eq!(config.set_endpoint(&too_long), Err(ConfigError::InvalidEndpoint));
    }

    #[test]
    fn test_rejects_zero_period() {
        let config = DeviceConfig { transmit_period_ms: 0, ..DeviceConfig::default() };
        assert_eq!(config.validate(), Err(ConfigError::Zero("transmitPeriodMs")));
    }

    #[test]
    fn test_json_uses_camel_case_and_defaults() {
        let config: DeviceConfig = serde_json::from_str(
            r#"{"endpoint": "http://10.0.0.5:8000/run-model", "ssid": "A", "flashEnabled": true}"#,
        )
        .unwrap();

        assert_eq!(config.endpoint.as_str(), "http://10.0.0.5:8000/run-model");
        assert_eq!(config.ssid.as_str(), "A");
        assert!(config.flash_enabled);
        assert_eq!(config.capture_period_ms, 1000);
    }

    #[test]
    fn test_json_rejects_oversized_ssid() {
        let long = "x".repeat(MAX_SSID_LEN + 1);
        let json = format!(r#"{{"ssid": "{long}"}}"#);
        assert!(serde_json::from_str::<DeviceConfig>(&json).is_err());
    }

    #[test]
    fn test_blob_fits_and_decodes() {
        let mut config = DeviceConfig::default();
        config.flash_enabled = true;
        config.ssid = fixed("workshop");

        let mut buffer = [0u8; CONFIG_BLOB_MAX];
        let blob = config.to_blob(&mut buffer).unwrap();
        assert!(blob.len() < CONFIG_BLOB_MAX);

        let decoded = DeviceConfig::from_blob(blob).unwrap();
        assert_eq!(decoded, config);
        assert_eq!(DeviceConfig::from_blob(&[0xFF, 0x01]), Err(ConfigError::Blob));
    }
}
