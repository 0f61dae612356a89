//! # Capture/Transmit Pipeline
//!
//! Core of the ESP32-CAM inference relay:
//!
//! - **FrameSlot**: single-slot handoff of one camera frame between tasks
//! - **ResultCache**: latest processed image, read by the HTTP listener
//! - **Acquisition / Transmission**: the two periodic tasks
//! - **Serving**: route handlers as pure functions of the cache
//!
//! ## Architecture
//!
//! ```text
//!  SensorDriver ─► Acquisition ─► FrameSlot ─► Transmission ─► ResultCache ─► Serving
//!       ▲                                          │    │
//!       └──────────────── release ─────────────────┘    └──► inference service (HTTP)
//! ```
//!
//! Data moves one way per cycle. Frames go around a closed loop
//! (driver → slot → transmission → driver) and are owned by exactly one
//! party at a time. At most one frame and one processed image are kept;
//! anything older is dropped, never queued.

pub mod acquisition;
pub mod cache;
pub mod config;
pub mod error;
pub mod serving;
pub mod slot;
pub mod stats;
pub mod traits;
pub mod transmission;

mod task;

#[cfg(test)]
mod mock;

// Re-export main types for convenience
pub use acquisition::{Acquisition, FlashMode};
pub use cache::{ProcessedImage, ResultCache};
pub use config::{ConfigError, DeviceConfig};
pub use error::{CycleError, Stage};
pub use slot::{FrameLease, FrameSlot, PublishOutcome};
pub use stats::{PipelineStats, StatsSnapshot};
pub use traits::{
    Connectivity, Flash, FrameBuffer, NoFlash, SensorDriver, UploadError, UploadResponse,
    Uploader,
};
pub use transmission::{TransmitOutcome, TransmitSettings, Transmission, JPEG_CONTENT_TYPE};

/// Library version reported by the device at start-up
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
