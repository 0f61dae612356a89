//! Pipeline counters, updated by the tasks and read by the serving path.

use core::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Live counters shared between tasks
#[derive(Debug, Default)]
pub struct PipelineStats {
    frames_captured: AtomicU64,
    capture_failures: AtomicU64,
    frames_displaced: AtomicU64,
    empty_cycles: AtomicU64,
    frames_uploaded: AtomicU64,
    connectivity_failures: AtomicU64,
    upload_failures: AtomicU64,
    images_cached: AtomicU64,
    bytes_cached: AtomicU64,
}

/// Point-in-time copy of [`PipelineStats`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    /// Frames handed out by the sensor
    pub frames_captured: u64,
    /// Ticks where the sensor had no frame
    pub capture_failures: u64,
    /// Frames replaced in the slot before they were sent
    pub frames_displaced: u64,
    /// Transmission ticks that found the slot empty
    pub empty_cycles: u64,
    /// Frames that got a response from the inference service
    pub frames_uploaded: u64,
    /// Failed cycles where the network was down, also counted in
    /// `upload_failures`
    pub connectivity_failures: u64,
    /// Transmission cycles that took a frame and did not succeed
    pub upload_failures: u64,
    /// Images installed into the result cache
    pub images_cached: u64,
    /// Size of the most recently cached image
    pub bytes_cached: u64,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_capture(&self, displaced: bool) {
        self.frames_captured.fetch_add(1, Ordering::Relaxed);
        if displaced {
            self.frames_displaced.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_capture_failure(&self) {
        self.capture_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_empty_cycle(&self) {
        self.empty_cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_uploaded(&self) {
        self.frames_uploaded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_connectivity_failure(&self) {
        self.connectivity_failures.fetch_add(1, Ordering::Relaxed);
        self.upload_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_upload_failure(&self) {
        self.upload_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cached(&self, len: usize) {
        self.images_cached.fetch_add(1, Ordering::Relaxed);
        self.bytes_cached.store(len as u64, Ordering::Relaxed);
    }

    /// Read all counters
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            frames_captured: self.frames_captured.load(Ordering::Relaxed),
            capture_failures: self.capture_failures.load(Ordering::Relaxed),
            frames_displaced: self.frames_displaced.load(Ordering::Relaxed),
            empty_cycles: self.empty_cycles.load(Ordering::Relaxed),
            frames_uploaded: self.frames_uploaded.load(Ordering::Relaxed),
            connectivity_failures: self.connectivity_failures.load(Ordering::Relaxed),
            upload_failures: self.upload_failures.load(Ordering::Relaxed),
            images_cached: self.images_cached.load(Ordering::Relaxed),
            bytes_cached: self.bytes_cached.load(Ordering::Relaxed),
        }
    }
}
