//! Counting collaborators shared by the unit tests.

use std::collections::VecDeque;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::traits::{
    Connectivity, Flash, FrameBuffer, SensorDriver, UploadError, UploadResponse, Uploader,
};

#[derive(Debug, PartialEq, Eq)]
pub struct MockFrame {
    pub id: u32,
    pub data: Vec<u8>,
}

impl FrameBuffer for MockFrame {
    fn data(&self) -> &[u8] {
        &self.data
    }

    fn width(&self) -> u32 {
        160
    }

    fn height(&self) -> u32 {
        120
    }
}

/// Sensor that hands out numbered frames and records every release
pub struct CountingSensor {
    next_id: AtomicU32,
    frame_len: usize,
    failing: AtomicBool,
    released: Mutex<Vec<u32>>,
}

impl CountingSensor {
    pub fn new(frame_len: usize) -> Self {
        Self {
            next_id: AtomicU32::new(0),
            frame_len,
            failing: AtomicBool::new(false),
            released: Mutex::new(Vec::new()),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Frames handed out so far
    pub fn captured(&self) -> u32 {
        self.next_id.load(Ordering::SeqCst)
    }

    /// Ids of released frames, in release order
    pub fn released(&self) -> Vec<u32> {
        self.released.lock().unwrap().clone()
    }

    /// Check that every captured frame came back exactly once
    pub fn is_balanced(&self) -> bool {
        let mut released = self.released();
        released.sort_unstable();
        released == (0..self.captured()).collect::<Vec<_>>()
    }

    /// Hand out the next numbered frame, ignoring the failure switch
    pub fn frame(&self) -> MockFrame {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        MockFrame { id, data: vec![0xD8; self.frame_len] }
    }
}

impl SensorDriver for CountingSensor {
    type Frame = MockFrame;

    fn capture(&self) -> Option<MockFrame> {
        if self.failing.load(Ordering::SeqCst) {
            return None;
        }
        Some(self.frame())
    }

    fn release(&self, frame: MockFrame) {
        self.released.lock().unwrap().push(frame.id);
    }
}

pub struct MockLink {
    connected: AtomicBool,
}

impl MockLink {
    pub fn up() -> Self {
        Self { connected: AtomicBool::new(true) }
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }
}

impl Connectivity for MockLink {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn local_addr(&self) -> Option<IpAddr> {
        self.is_connected()
            .then_some(IpAddr::V4(Ipv4Addr::new(192, 168, 4, 2)))
    }
}

/// Flash that records every transition
#[derive(Default)]
pub struct RecordingFlash {
    pub transitions: Mutex<Vec<bool>>,
}

impl Flash for RecordingFlash {
    fn set(&self, on: bool) {
        self.transitions.lock().unwrap().push(on);
    }
}

/// Response body that yields its bytes in fixed-size chunks, then EOF.
/// A stalled body never yields anything.
#[derive(Debug)]
pub struct ChunkedBody {
    data: Vec<u8>,
    pos: usize,
    chunk: usize,
    stalled: bool,
}

impl embedded_io_async::ErrorType for ChunkedBody {
    type Error = core::convert::Infallible;
}

impl embedded_io_async::Read for ChunkedBody {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.stalled {
            return std::future::pending().await;
        }
        let remaining = &self.data[self.pos..];
        let len = remaining.len().min(buf.len()).min(self.chunk);
        buf[..len].copy_from_slice(&remaining[..len]);
        self.pos += len;
        Ok(len)
    }
}

/// One scripted reply of the [`ScriptedUploader`]
pub enum Reply {
    /// Status, declared length, actual body bytes
    Respond(u16, Option<u64>, Vec<u8>),
    Fail(&'static str),
    /// Never resolves
    Hang,
    /// 200 with this declared length, then a body that never yields
    Stall(u64),
}

/// Uploader replaying a queue of replies and recording request sizes
#[derive(Default)]
pub struct ScriptedUploader {
    replies: Mutex<VecDeque<Reply>>,
    pub requests: Mutex<Vec<(String, usize, String)>>,
    pub calls: AtomicUsize,
}

impl ScriptedUploader {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn push(&self, reply: Reply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    /// Reply with `body` and a truthful content length
    pub fn ok(body: Vec<u8>) -> Reply {
        Reply::Respond(200, Some(body.len() as u64), body)
    }
}

impl Uploader for ScriptedUploader {
    type Body = ChunkedBody;

    async fn post(
        &self,
        endpoint: &str,
        body: &[u8],
        content_type: &str,
    ) -> Result<UploadResponse<ChunkedBody>, UploadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap()
            .push((endpoint.to_string(), body.len(), content_type.to_string()));

        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Reply::Fail("no scripted reply"));

        match reply {
            Reply::Respond(status, content_length, data) => Ok(UploadResponse {
                status,
                content_length,
                body: ChunkedBody { data, pos: 0, chunk: 64, stalled: false },
            }),
            Reply::Stall(declared) => Ok(UploadResponse {
                status: 200,
                content_length: Some(declared),
                body: ChunkedBody { data: Vec::new(), pos: 0, chunk: 64, stalled: true },
            }),
            Reply::Fail(msg) => Err(UploadError::Transport(msg.to_string())),
            Reply::Hang => std::future::pending().await,
        }
    }
}
