//! [`Uploader`] backed by `reqwest`.
//!
//! The response head is returned as soon as it arrives; the body is
//! exposed as an `embedded_io_async::Read` stream so the pipeline can pull
//! exactly the declared number of bytes.

use core::time::Duration;

use bytes::Bytes;
use embedded_io::{ErrorKind, ErrorType};
use pipeline::{UploadError, UploadResponse, Uploader};
use reqwest::header::CONTENT_TYPE;

use crate::error::RelayError;

/// Posts frames over HTTP
#[derive(Debug, Clone)]
pub struct HttpUploader {
    client: reqwest::Client,
}

impl HttpUploader {
    pub fn new(connect_timeout: Duration) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .user_agent(concat!("cam-relay/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl Uploader for HttpUploader {
    type Body = ResponseStream;

    async fn post(
        &self,
        endpoint: &str,
        body: &[u8],
        content_type: &str,
    ) -> Result<UploadResponse<ResponseStream>, UploadError> {
        let response = self
            .client
            .post(endpoint)
            .header(CONTENT_TYPE, content_type)
            .body(Bytes::copy_from_slice(body))
            .send()
            .await
            .map_err(|e| UploadError::Transport(e.to_string()))?;

        Ok(UploadResponse {
            status: response.status().as_u16(),
            content_length: response.content_length(),
            body: ResponseStream::new(response),
        })
    }
}

/// Error raised while pulling body chunks
#[derive(Debug)]
pub struct StreamError(reqwest::Error);

impl embedded_io::Error for StreamError {
    fn kind(&self) -> ErrorKind {
        if self.0.is_timeout() {
            ErrorKind::TimedOut
        } else {
            ErrorKind::Other
        }
    }
}

impl core::fmt::Display for StreamError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "response body error: {}", self.0)
    }
}

impl std::error::Error for StreamError {}

/// Response body read chunk by chunk
#[derive(Debug)]
pub struct ResponseStream {
    response: reqwest::Response,
    pending: Bytes,
}

impl ResponseStream {
    fn new(response: reqwest::Response) -> Self {
        Self {
            response,
            pending: Bytes::new(),
        }
    }
}

impl ErrorType for ResponseStream {
    type Error = StreamError;
}

impl embedded_io_async::Read for ResponseStream {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        if buf.is_empty() {
            return Ok(0);
        }

        while self.pending.is_empty() {
            match self.response.chunk().await.map_err(StreamError)? {
                Some(chunk) => self.pending = chunk,
                None => return Ok(0),
            }
        }

        let len = buf.len().min(self.pending.len());
        let chunk = self.pending.split_to(len);
        buf[..len].copy_from_slice(&chunk);
        Ok(len)
    }
}
