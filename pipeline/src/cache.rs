//! # Processed Image Cache
//!
//! Holds the most recent image returned by the inference service. The
//! transmission task is the only writer; the HTTP serving path only reads.
//!
//! A cached image is a [`Bytes`] handle, so the buffer and its length are
//! one value and a reader always gets a complete image. Readers get their
//! own reference; a `replace` never frees memory a reader is still sending.
//! The old buffer is freed when its last reader lets go of it.

use std::sync::RwLock;
use std::time::SystemTime;

use bytes::Bytes;

/// An image received from the inference service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedImage {
    /// Image bytes exactly as received
    pub bytes: Bytes,
    /// Position in the sequence of cached images, starting at 1
    pub sequence: u64,
    /// When the image was installed
    pub received_at: SystemTime,
}

impl ProcessedImage {
    /// Image size in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if the image is empty
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Debug, Default)]
struct CacheState {
    current: Option<ProcessedImage>,
    installed: u64,
}

/// Holder of at most one processed image
#[derive(Debug, Default)]
pub struct ResultCache {
    state: RwLock<CacheState>,
}

impl ResultCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `bytes` as the current image, dropping the previous one.
    ///
    /// Returns the sequence number assigned to the new image.
    pub fn replace(&self, bytes: Bytes) -> u64 {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.installed += 1;
        let sequence = state.installed;

        let previous = state.current.replace(ProcessedImage {
            bytes,
            sequence,
            received_at: SystemTime::now(),
        });
        drop(state);

        if let Some(previous) = previous {
            log::debug!(
                "Replaced cached image #{} ({} bytes)",
                previous.sequence,
                previous.len()
            );
        }
        sequence
    }

    /// Current image, or `None` if nothing was ever installed
    pub fn read(&self) -> Option<ProcessedImage> {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .current
            .clone()
    }

    /// Check if an image is available
    pub fn is_populated(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .current
            .is_some()
    }
}
