//! # Transmission Task
//!
//! Periodic consumer: takes the waiting frame out of the [`FrameSlot`],
//! posts it to the inference service, reads the processed image back and
//! installs it in the [`ResultCache`].
//!
//! ```text
//!  Idle ─► Check ─► Uploading ─► Receiving ─► Swapping ─► Returning ─► Idle
//!            │          │            │                        ▲
//!            │          └── failure ─┴────────────────────────┘
//!            └── empty: "nothing to send" ─► Idle
//! ```
//!
//! The frame is held as a [`FrameLease`] for the whole network exchange, so
//! no lock is held while waiting on the network and the frame goes back to
//! the driver on every path. The cache is only touched after the complete
//! body has been read.

use core::time::Duration;
use std::sync::Arc;

use bytes::Bytes;
use embedded_io::Error as _;
use tokio::sync::watch;
use tokio::time;

use crate::cache::ResultCache;
use crate::config::DeviceConfig;
use crate::error::{CycleError, Stage};
use crate::slot::{FrameLease, FrameSlot};
use crate::stats::PipelineStats;
use crate::task::Periodic;
use crate::traits::{Connectivity, FrameBuffer, SensorDriver, Uploader};

/// Content type of an uploaded frame
pub const JPEG_CONTENT_TYPE: &str = "image/jpeg";

/// What a successful transmission cycle did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransmitOutcome {
    /// The slot was empty, no network call was made
    NothingToSend,
    /// The service answered without a body, the cache is unchanged
    NoContent,
    /// A new image was installed
    Cached { sequence: u64, len: usize },
}

/// Network settings of the transmission cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransmitSettings {
    pub endpoint: String,
    pub upload_timeout: Duration,
    pub read_timeout: Duration,
    pub max_response_bytes: usize,
}

impl From<&DeviceConfig> for TransmitSettings {
    fn from(config: &DeviceConfig) -> Self {
        Self {
            endpoint: config.endpoint.as_str().into(),
            upload_timeout: config.upload_timeout(),
            read_timeout: config.read_timeout(),
            max_response_bytes: config.max_response_bytes as usize,
        }
    }
}

/// Consumer side of the frame handoff, producer of cached images
pub struct Transmission<D: SensorDriver, N: Connectivity, U: Uploader> {
    slot: Arc<FrameSlot<D>>,
    cache: Arc<ResultCache>,
    link: Arc<N>,
    uploader: U,
    settings: TransmitSettings,
    stats: Arc<PipelineStats>,
}

impl<D, N, U> Transmission<D, N, U>
where
    D: SensorDriver,
    N: Connectivity,
    U: Uploader,
{
    pub fn new(
        slot: Arc<FrameSlot<D>>,
        cache: Arc<ResultCache>,
        link: Arc<N>,
        uploader: U,
        settings: TransmitSettings,
        stats: Arc<PipelineStats>,
    ) -> Self {
        Self {
            slot,
            cache,
            link,
            uploader,
            settings,
            stats,
        }
    }

    /// Send the waiting frame, if any, and cache the response.
    pub async fn run_cycle(&self) -> Result<TransmitOutcome, CycleError> {
        let Some(lease) = self.slot.take() else {
            log::debug!("Nothing to send");
            self.stats.record_empty_cycle();
            return Ok(TransmitOutcome::NothingToSend);
        };

        let result = self.transmit(&lease).await;
        lease.release();

        match &result {
            Ok(TransmitOutcome::Cached { len, .. }) => {
                self.stats.record_uploaded();
                self.stats.record_cached(*len);
            }
            Ok(_) => self.stats.record_uploaded(),
            Err(e) if e.is_upload_side() => self.stats.record_upload_failure(),
            Err(_) => self.stats.record_connectivity_failure(),
        }
        result
    }

    async fn transmit(&self, frame: &FrameLease<D>) -> Result<TransmitOutcome, CycleError> {
        if !self.link.is_connected() {
            return Err(CycleError::ConnectivityFailure);
        }

        let upload = self
            .uploader
            .post(&self.settings.endpoint, frame.data(), JPEG_CONTENT_TYPE);
        let response = time::timeout(self.settings.upload_timeout, upload)
            .await
            .map_err(|_| CycleError::Timeout {
                stage: Stage::Upload,
                after: self.settings.upload_timeout,
            })??;

        if !response.is_success() {
            return Err(CycleError::UploadFailure(response.status));
        }

        let declared = match response.content_length {
            None | Some(0) => {
                log::debug!("Response carried no body (status {})", response.status);
                return Ok(TransmitOutcome::NoContent);
            }
            Some(len) => usize::try_from(len).unwrap_or(usize::MAX),
        };
        if declared > self.settings.max_response_bytes {
            return Err(CycleError::AllocationFailure(declared));
        }

        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(declared)
            .map_err(|_| CycleError::AllocationFailure(declared))?;
        buffer.resize(declared, 0);

        let mut body = response.body;
        time::timeout(self.settings.read_timeout, read_full(&mut body, &mut buffer))
            .await
            .map_err(|_| CycleError::Timeout {
                stage: Stage::Receive,
                after: self.settings.read_timeout,
            })??;

        let sequence = self.cache.replace(Bytes::from(buffer));
        log::info!(
            "Cached processed image #{} ({} bytes, sent {} bytes)",
            sequence,
            declared,
            frame.len()
        );
        Ok(TransmitOutcome::Cached { sequence, len: declared })
    }

    /// Run cycles every `period` until `shutdown` turns true.
    pub async fn run(self, period: Duration, shutdown: watch::Receiver<bool>) {
        let mut periodic = Periodic::new(period, shutdown);
        log::info!(
            "Transmission task started, period {:?}, endpoint {}",
            period,
            self.settings.endpoint
        );

        while periodic.tick().await {
            if let Err(e) = self.run_cycle().await {
                log::warn!("Transmission cycle failed: {}", e);
            }
        }

        log::info!("Transmission task stopped");
    }
}

/// Fill `buffer` completely from `body`.
///
/// A stream that ends or errors first is a [`CycleError::StreamReadFailure`]
/// carrying how far it got.
async fn read_full<R>(body: &mut R, buffer: &mut [u8]) -> Result<(), CycleError>
where
    R: embedded_io_async::Read,
{
    let expected = buffer.len();
    let mut received = 0;

    while received < expected {
        match body.read(&mut buffer[received..]).await {
            Ok(0) => return Err(CycleError::StreamReadFailure { expected, received }),
            Ok(n) => received += n,
            Err(e) => {
                log::debug!("Response stream error: {:?}", e.kind());
                return Err(CycleError::StreamReadFailure { expected, received });
            }
        }
    }

    Ok(())
}
