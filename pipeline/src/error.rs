//! Failure kinds of a single pipeline cycle.
//!
//! Every variant is local to one cycle: the periodic loop logs it and tries
//! again on the next tick. None of them stops the pipeline.

use core::time::Duration;

use crate::traits::UploadError;

/// Where in the transmission cycle a deadline was exceeded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Sending the frame and waiting for the response head
    Upload,
    /// Reading the declared response body
    Receive,
}

impl core::fmt::Display for Stage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Stage::Upload => f.write_str("upload"),
            Stage::Receive => f.write_str("receive"),
        }
    }
}

/// Errors that end a capture or transmission cycle early
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CycleError {
    /// The sensor driver returned no frame
    #[error("failed to capture image")]
    CaptureFailure,
    /// The network is not joined
    #[error("network is not connected")]
    ConnectivityFailure,
    /// The inference service answered with a non-success status
    #[error("upload rejected with status {0}")]
    UploadFailure(u16),
    /// The request never produced a response
    #[error("upload failed: {0}")]
    Transport(String),
    /// No buffer could be set aside for the response
    #[error("cannot allocate {0} bytes for the response")]
    AllocationFailure(usize),
    /// The response stream ended before the declared length
    #[error("response ended after {received} of {expected} bytes")]
    StreamReadFailure { expected: usize, received: usize },
    /// A bounded network step ran out of time
    #[error("{stage} timed out after {after:?}")]
    Timeout { stage: Stage, after: Duration },
}

impl From<UploadError> for CycleError {
    fn from(e: UploadError) -> Self {
        match e {
            UploadError::Transport(msg) => CycleError::Transport(msg),
        }
    }
}

impl CycleError {
    /// Check if the frame reached the network before the cycle failed
    pub fn is_upload_side(&self) -> bool {
        !matches!(
            self,
            CycleError::CaptureFailure | CycleError::ConnectivityFailure
        )
    }
}
