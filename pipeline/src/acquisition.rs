//! # Acquisition Task
//!
//! Periodic producer: grabs a frame from the sensor (with the flash lit when
//! enabled) and publishes it into the [`FrameSlot`].
//!
//! ```text
//!  Idle ──tick──► Capturing ──frame──► Publishing ──► Idle
//!                     │
//!                     └──none──► (log, retry next tick) ──► Idle
//! ```

use core::time::Duration;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::time;

use crate::error::CycleError;
use crate::slot::{FrameSlot, PublishOutcome};
use crate::stats::PipelineStats;
use crate::task::Periodic;
use crate::traits::{Flash, FrameBuffer, SensorDriver};

/// Flash handling around a capture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashMode {
    Off,
    /// Light the flash and wait this long before capturing
    On { settle: Duration },
}

/// Producer side of the frame handoff
pub struct Acquisition<D: SensorDriver, F: Flash> {
    slot: Arc<FrameSlot<D>>,
    flash: F,
    flash_mode: FlashMode,
    stats: Arc<PipelineStats>,
}

impl<D: SensorDriver, F: Flash> Acquisition<D, F> {
    pub fn new(
        slot: Arc<FrameSlot<D>>,
        flash: F,
        flash_mode: FlashMode,
        stats: Arc<PipelineStats>,
    ) -> Self {
        Self {
            slot,
            flash,
            flash_mode,
            stats,
        }
    }

    /// Capture one frame and publish it.
    pub async fn run_cycle(&self) -> Result<PublishOutcome, CycleError> {
        let frame = self.capture().await;

        let Some(frame) = frame else {
            self.stats.record_capture_failure();
            return Err(CycleError::CaptureFailure);
        };

        log::debug!(
            "Image captured: Size = {} bytes, Width = {} px, Height = {} px",
            frame.len(),
            frame.width(),
            frame.height()
        );

        let outcome = self.slot.publish(frame);
        self.stats
            .record_capture(outcome == PublishOutcome::Replaced);
        Ok(outcome)
    }

    async fn capture(&self) -> Option<D::Frame> {
        match self.flash_mode {
            FlashMode::Off => self.slot.driver().capture(),
            FlashMode::On { settle } => {
                self.flash.set(true);
                time::sleep(settle).await;
                let frame = self.slot.driver().capture();
                self.flash.set(false);
                frame
            }
        }
    }

    /// Run cycles every `period` until `shutdown` turns true.
    pub async fn run(self, period: Duration, shutdown: watch::Receiver<bool>) {
        let mut periodic = Periodic::new(period, shutdown);
        log::info!("Acquisition task started, period {:?}", period);

        while periodic.tick().await {
            if let Err(e) = self.run_cycle().await {
                log::warn!("Acquisition cycle failed: {}", e);
            }
        }

        log::info!("Acquisition task stopped");
    }
}
