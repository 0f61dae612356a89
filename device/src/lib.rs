//! # cam-relay
//!
//! Host build of the ESP32-CAM inference relay. Wires the [`pipeline`]
//! tasks to concrete collaborators:
//!
//! ```text
//! ┌──────────────┐   ┌───────────┐   ┌──────────────┐   ┌─────────────┐
//! │ ReplaySensor │──►│ FrameSlot │──►│ HttpUploader │──►│ ResultCache │
//! │  (+LogFlash) │   └───────────┘   │  (reqwest)   │   └──────┬──────┘
//! └──────────────┘                   └──────┬───────┘          │
//!                                    HostLink (route)    axum listener
//!                                                        /  /image  /stats
//! ```

pub mod config;
pub mod error;
pub mod flash;
pub mod http_client;
pub mod logging;
pub mod network;
pub mod sensor;
pub mod server;

pub use error::RelayError;
pub use flash::LogFlash;
pub use http_client::{HttpUploader, ResponseStream};
pub use network::HostLink;
pub use sensor::{PooledFrame, ReplaySensor, MAX_FRAME_BUFFERS};
pub use server::ServerState;

/// Relay version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
