//! Logger set-up for the host binary.

use std::sync::Once;

use log::LevelFilter;

static INIT_LOGGER: Once = Once::new();

/// Install `env_logger` once. `RUST_LOG` overrides the default `info` level.
pub fn init() {
    INIT_LOGGER.call_once(|| {
        let mut builder = env_logger::Builder::new();
        builder
            .filter_level(LevelFilter::Info)
            .format_timestamp_millis()
            .parse_default_env();

        if builder.try_init().is_err() {
            eprintln!("A global logger was already installed");
        }
    });
}
