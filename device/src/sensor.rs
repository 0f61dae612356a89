//! # Replay Sensor
//!
//! Host stand-in for the camera driver. JPEG files are loaded once and
//! handed out in rotation, each capture borrowing one buffer of a small
//! fixed pool the same way the camera driver lends its frame buffers.
//!
//! ```text
//!  free: [0, 1]     capture ──► PooledFrame{buffer: 1}  free: [0]
//!                   capture ──► PooledFrame{buffer: 0}  free: []
//!                   capture ──► None (pool exhausted)
//!  release(frame 1) ──► free: [1]
//! ```

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use bytes::Bytes;
use image::{ImageFormat, ImageReader};
use pipeline::{FrameBuffer, SensorDriver};

use crate::error::RelayError;

/// Frame buffers the camera driver can lend out at once
pub const MAX_FRAME_BUFFERS: usize = 4;

/// A replayed frame occupying one pool buffer until released
#[derive(Debug)]
pub struct PooledFrame {
    buffer: usize,
    data: Bytes,
    width: u32,
    height: u32,
}

impl PooledFrame {
    /// Pool buffer backing this frame
    pub fn buffer(&self) -> usize {
        self.buffer
    }
}

impl FrameBuffer for PooledFrame {
    fn data(&self) -> &[u8] {
        &self.data
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }
}

#[derive(Debug)]
struct Clip {
    data: Bytes,
    width: u32,
    height: u32,
}

/// Camera driver that replays JPEG files
#[derive(Debug)]
pub struct ReplaySensor {
    clips: Vec<Clip>,
    next: AtomicUsize,
    free: Mutex<heapless::Vec<usize, MAX_FRAME_BUFFERS>>,
    fb_count: usize,
}

impl ReplaySensor {
    /// Load a single JPEG file, or every `.jpg`/`.jpeg` in a directory
    /// in name order.
    pub fn open(path: &Path, fb_count: usize) -> Result<Self, RelayError> {
        let files = if path.is_dir() {
            let mut files: Vec<PathBuf> = fs::read_dir(path)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| is_jpeg_name(p))
                .collect();
            files.sort();
            files
        } else {
            vec![path.to_path_buf()]
        };

        if files.is_empty() {
            return Err(RelayError::NoFrames(path.to_path_buf()));
        }

        let mut clips = Vec::with_capacity(files.len());
        for file in &files {
            let data = fs::read(file)?;
            clips.push(decode_clip(&file.display().to_string(), data)?);
        }

        log::info!("Loaded {} frame(s) from {}", clips.len(), path.display());
        Ok(Self::with_clips(clips, fb_count))
    }

    /// Build from in-memory JPEG images
    pub fn from_jpegs(images: Vec<Vec<u8>>, fb_count: usize) -> Result<Self, RelayError> {
        if images.is_empty() {
            return Err(RelayError::NoFrames(PathBuf::from("<memory>")));
        }

        let clips = images
            .into_iter()
            .enumerate()
            .map(|(i, data)| decode_clip(&format!("#{i}"), data))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::with_clips(clips, fb_count))
    }

    fn with_clips(clips: Vec<Clip>, fb_count: usize) -> Self {
        let fb_count = fb_count.clamp(1, MAX_FRAME_BUFFERS);
        let mut free = heapless::Vec::new();
        for buffer in (0..fb_count).rev() {
            let _ = free.push(buffer);
        }

        Self {
            clips,
            next: AtomicUsize::new(0),
            free: Mutex::new(free),
            fb_count,
        }
    }

    /// Size of the buffer pool
    pub fn fb_count(&self) -> usize {
        self.fb_count
    }

    /// Buffers not currently lent out
    pub fn available(&self) -> usize {
        self.free.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl SensorDriver for ReplaySensor {
    type Frame = PooledFrame;

    fn capture(&self) -> Option<PooledFrame> {
        let buffer = self.free.lock().unwrap_or_else(|e| e.into_inner()).pop();
        let Some(buffer) = buffer else {
            log::debug!("All {} frame buffers are in use", self.fb_count);
            return None;
        };

        let clip = &self.clips[self.next.fetch_add(1, Ordering::Relaxed) % self.clips.len()];
        Some(PooledFrame {
            buffer,
            data: clip.data.clone(),
            width: clip.width,
            height: clip.height,
        })
    }

    fn release(&self, frame: PooledFrame) {
        let mut free = self.free.lock().unwrap_or_else(|e| e.into_inner());
        if free.contains(&frame.buffer) || free.push(frame.buffer).is_err() {
            log::error!("Frame buffer {} released twice", frame.buffer);
        }
    }
}

fn is_jpeg_name(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg"))
}

fn decode_clip(name: &str, data: Vec<u8>) -> Result<Clip, RelayError> {
    let invalid = |reason: String| RelayError::InvalidFrame {
        path: name.to_string(),
        reason,
    };

    let reader = ImageReader::new(Cursor::new(&data))
        .with_guessed_format()
        .map_err(|e| invalid(e.to_string()))?;
    if reader.format() != Some(ImageFormat::Jpeg) {
        return Err(invalid("not JPEG data".into()));
    }
    let (width, height) = reader.into_dimensions().map_err(|e| invalid(e.to_string()))?;

    Ok(Clip {
        data: Bytes::from(data),
        width,
        height,
    })
}
