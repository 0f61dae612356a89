//! Loading [`DeviceConfig`] on the host.
//!
//! A `.json` file is parsed as JSON; any other file is treated as the
//! postcard blob written by `cam-relay pack-config`. The endpoint can be
//! overridden through [`ENDPOINT_ENV`] without touching the file.

use std::fs;
use std::path::Path;

use pipeline::config::CONFIG_BLOB_MAX;
use pipeline::DeviceConfig;

use crate::error::RelayError;

/// Environment variable that replaces the configured endpoint
pub const ENDPOINT_ENV: &str = "CAM_RELAY_ENDPOINT";

/// Read the config at `path` (or the defaults), apply the environment
/// override and validate the result.
pub fn load(path: Option<&Path>) -> Result<DeviceConfig, RelayError> {
    let config = match path {
        Some(path) => read_file(path)?,
        None => DeviceConfig::default(),
    };

    let config = apply_overrides(config, std::env::var(ENDPOINT_ENV).ok())?;
    config.validate()?;
    Ok(config)
}

/// Apply an endpoint override, if any
pub fn apply_overrides(
    mut config: DeviceConfig,
    endpoint: Option<String>,
) -> Result<DeviceConfig, RelayError> {
    if let Some(endpoint) = endpoint {
        log::info!("Endpoint overridden by {}", ENDPOINT_ENV);
        config.set_endpoint(&endpoint)?;
    }
    Ok(config)
}

/// Parse a JSON or postcard config file, depending on its extension
pub fn read_file(path: &Path) -> Result<DeviceConfig, RelayError> {
    let data = fs::read(path)?;

    if is_json(path) {
        Ok(serde_json::from_slice(&data)?)
    } else {
        Ok(DeviceConfig::from_blob(&data)?)
    }
}

/// Convert a JSON config into a postcard blob. Returns the blob length.
pub fn pack(input: &Path, output: &Path) -> Result<usize, RelayError> {
    let data = fs::read(input)?;
    let config: DeviceConfig = serde_json::from_slice(&data)?;
    config.validate()?;

    let mut buffer = [0u8; CONFIG_BLOB_MAX];
    let blob = config.to_blob(&mut buffer)?;
    fs::write(output, &*blob)?;
    Ok(blob.len())
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}
