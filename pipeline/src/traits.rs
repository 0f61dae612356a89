//! # Collaborator Traits
//!
//! The pipeline core never talks to hardware or sockets directly. Everything
//! outside the capture/transmit loop is reached through the traits in this
//! module, so the same cycles run against the camera driver on the device,
//! against replayed files on a host, and against counting mocks in tests.
//!
//! ```text
//!   SensorDriver ──capture──► FrameSlot ──take──► Uploader ──► ResultCache
//!        ▲                                            │
//!        └──────────────────release───────────────────┘
//! ```

use core::future::Future;
use std::net::IpAddr;

/// Read access to one captured, compressed camera frame.
///
/// The memory behind a frame belongs to the sensor driver's buffer pool; the
/// holder only borrows it until it is handed back through
/// [`SensorDriver::release`].
pub trait FrameBuffer {
    /// Compressed image bytes (JPEG)
    fn data(&self) -> &[u8];

    /// Frame width in pixels
    fn width(&self) -> u32;

    /// Frame height in pixels
    fn height(&self) -> u32;

    /// Number of compressed bytes
    fn len(&self) -> usize {
        self.data().len()
    }

    /// Check if the frame carries no data
    fn is_empty(&self) -> bool {
        self.data().is_empty()
    }
}

/// Camera sensor driver with a fixed pool of frame buffers.
///
/// Every frame returned by `capture` must come back through `release`
/// exactly once, otherwise the pool shrinks permanently. Taking the frame
/// by value makes a second release of the same frame impossible.
pub trait SensorDriver {
    /// Frame type handed out by this driver
    type Frame: FrameBuffer;

    /// Grab the next frame, or `None` if the sensor has nothing to give
    /// (capture error or exhausted buffer pool).
    fn capture(&self) -> Option<Self::Frame>;

    /// Return a frame buffer to the driver's pool.
    fn release(&self, frame: Self::Frame);
}

/// Network join status as seen by the pipeline.
pub trait Connectivity {
    /// Check if the network link is up
    fn is_connected(&self) -> bool;

    /// Address assigned to this device, if any
    fn local_addr(&self) -> Option<IpAddr>;
}

/// Flash LED next to the sensor.
pub trait Flash {
    /// Switch the LED on or off
    fn set(&self, on: bool);
}

/// A flash that does nothing, for boards without an LED.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFlash;

impl Flash for NoFlash {
    fn set(&self, _on: bool) {}
}

/// Errors raised by an [`Uploader`] before a response status is available
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    /// Connection, DNS, or send failure
    #[error("transport error: {0}")]
    Transport(String),
}

/// Head of an HTTP response plus its unread body stream
#[derive(Debug)]
pub struct UploadResponse<B> {
    /// HTTP status code
    pub status: u16,
    /// Declared `Content-Length`, if the server sent one
    pub content_length: Option<u64>,
    /// Response body, read incrementally
    pub body: B,
}

impl<B> UploadResponse<B> {
    /// Check for a 2xx status
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP client used to post frames to the inference service.
///
/// # Example
///
/// ```ignore
/// let response = uploader.post(endpoint, frame.data(), "image/jpeg").await?;
/// if response.is_success() {
///     let mut body = response.body;
///     body.read_exact(&mut buf).await?;
/// }
/// ```
pub trait Uploader {
    /// Streaming response body
    type Body: embedded_io_async::Read;

    /// POST `body` to `endpoint` with the given content type.
    ///
    /// Resolves once the response head has arrived; the body is left
    /// unread in the returned [`UploadResponse`].
    fn post(
        &self,
        endpoint: &str,
        body: &[u8],
        content_type: &str,
    ) -> impl Future<Output = Result<UploadResponse<Self::Body>, UploadError>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_success_range() {
        let ok = UploadResponse { status: 200, content_length: None, body: () };
        let created = UploadResponse { status: 204, content_length: None, body: () };
        let redirect = UploadResponse { status: 302, content_length: None, body: () };
        let error = UploadResponse { status: 500, content_length: None, body: () };

        assert!(ok.is_success());
        assert!(created.is_success());
        assert!(!redirect.is_success());
        assert!(!error.is_success());
    }
}
