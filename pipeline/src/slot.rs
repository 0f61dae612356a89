//! # Single-Frame Handoff Slot
//!
//! [`FrameSlot`] bridges the acquisition task (producer) and the
//! transmission task (consumer). It holds at most one frame; a publish onto
//! an occupied slot returns the older frame to the driver first, so the
//! newest capture always wins and nothing queues up.
//!
//! ```text
//!  capture ──► publish ──► [ slot: Option<Frame> ] ──► take ──► FrameLease
//!                 │                                               │
//!                 └─ displaced frame ──► release      release ◄───┘
//! ```
//!
//! The mutex is held only for the swap itself. Network I/O runs on the
//! [`FrameLease`] outside any lock.

use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, Mutex};

use crate::traits::SensorDriver;

/// What happened to the slot on a publish
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The slot was empty
    Stored,
    /// An untaken frame was returned to the driver and replaced
    Replaced,
}

/// Mutually exclusive holder of at most one captured frame
pub struct FrameSlot<D: SensorDriver> {
    driver: Arc<D>,
    frame: Mutex<Option<D::Frame>>,
}

impl<D: SensorDriver> FrameSlot<D> {
    /// Create an empty slot bound to the driver that owns the frames
    pub fn new(driver: Arc<D>) -> Self {
        Self {
            driver,
            frame: Mutex::new(None),
        }
    }

    /// The driver frames are captured from and released to
    pub fn driver(&self) -> &Arc<D> {
        &self.driver
    }

    /// Store `frame`, releasing any frame that was never taken.
    pub fn publish(&self, frame: D::Frame) -> PublishOutcome {
        let mut slot = self.frame.lock().unwrap_or_else(|e| e.into_inner());

        let outcome = match slot.take() {
            Some(previous) => {
                log::debug!("Slot still occupied, releasing untaken frame");
                self.driver.release(previous);
                PublishOutcome::Replaced
            }
            None => PublishOutcome::Stored,
        };

        *slot = Some(frame);
        outcome
    }

    /// Remove the stored frame, if any. Never waits for a frame to appear.
    pub fn take(&self) -> Option<FrameLease<D>> {
        let frame = self
            .frame
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()?;

        Some(FrameLease {
            frame: Some(frame),
            driver: Arc::clone(&self.driver),
        })
    }

    /// Check if a frame is waiting
    pub fn is_occupied(&self) -> bool {
        self.frame
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }
}

impl<D: SensorDriver> Drop for FrameSlot<D> {
    fn drop(&mut self) {
        let frame = self
            .frame
            .get_mut()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(frame) = frame {
            self.driver.release(frame);
        }
    }
}

impl<D: SensorDriver> fmt::Debug for FrameSlot<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameSlot")
            .field("occupied", &self.is_occupied())
            .finish()
    }
}

/// A frame taken out of the slot.
///
/// The lease owns the frame until it goes back to the driver, either through
/// [`FrameLease::release`] or when the lease is dropped. Either way the
/// driver sees exactly one release.
pub struct FrameLease<D: SensorDriver> {
    frame: Option<D::Frame>,
    driver: Arc<D>,
}

impl<D: SensorDriver> FrameLease<D> {
    /// Hand the frame back to the driver
    pub fn release(mut self) {
        if let Some(frame) = self.frame.take() {
            self.driver.release(frame);
        }
    }
}

impl<D: SensorDriver> Deref for FrameLease<D> {
    type Target = D::Frame;

    fn deref(&self) -> &D::Frame {
        // Only `release` and `drop` empty the option, and both consume the lease.
        match &self.frame {
            Some(frame) => frame,
            None => unreachable!("frame lease used after release"),
        }
    }
}

impl<D: SensorDriver> Drop for FrameLease<D> {
    fn drop(&mut self) {
        if let Some(frame) = self.frame.take() {
            self.driver.release(frame);
        }
    }
}

impl<D: SensorDriver> fmt::Debug for FrameLease<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameLease")
            .field("held", &self.frame.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::CountingSensor;
    use crate::traits::FrameBuffer;

    fn slot() -> (Arc<CountingSensor>, FrameSlot<CountingSensor>) {
        let sensor = Arc::new(CountingSensor::new(16));
        (Arc::clone(&sensor), FrameSlot::new(sensor))
    }

    #[test]
    fn test_take_from_empty_slot() {
        let (sensor, slot) = slot();
        assert!(slot.take().is_none());
        assert!(sensor.released().is_empty());
    }

    #[test]
    fn test_publish_then_take() {
        let (sensor, slot) = slot();
        let frame = sensor.capture().unwrap();

        assert_eq!(slot.publish(frame), PublishOutcome::Stored);
        assert!(slot.is_occupied());

        let lease = slot.take().unwrap();
        assert_eq!(lease.id, 0);
        assert_eq!(lease.len(), 16);
        assert!(!slot.is_occupied());
        assert!(sensor.released().is_empty());

        lease.release();
        assert_eq!(sensor.released(), vec![0]);
    }

    #[test]
    fn test_publish_over_untaken_frame_releases_it() {
        let (sensor, slot) = slot();

        slot.publish(sensor.capture().unwrap());
        assert_eq!(slot.publish(sensor.capture().unwrap()), PublishOutcome::Replaced);

        // The older frame went back, the newer one is what gets taken
        assert_eq!(sensor.released(), vec![0]);
        assert_eq!(slot.take().unwrap().id, 1);
    }

    #[test]
    fn test_dropped_lease_releases_once() {
        let (sensor, slot) = slot();
        slot.publish(sensor.capture().unwrap());

        {
            let _lease = slot.take().unwrap();
        }

        assert_eq!(sensor.released(), vec![0]);
    }

    #[test]
    fn test_dropping_slot_releases_held_frame() {
        let (sensor, slot) = slot();
        slot.publish(sensor.capture().unwrap());
        drop(slot);

        assert!(sensor.is_balanced());
    }

    #[test]
    fn test_slot_never_holds_more_than_one_frame() {
        let (sensor, slot) = slot();
        let mut taken = Vec::new();

        // Mixed publish/take sequence: P = publish, T = take
        for step in "PPTPTTPPPTPT".chars() {
            match step {
                'P' => {
                    slot.publish(sensor.capture().unwrap());
                }
                _ => {
                    if let Some(lease) = slot.take() {
                        taken.push(lease.id);
                        lease.release();
                    }
                    assert!(slot.take().is_none());
                }
            }
        }

        assert_eq!(taken, vec![1, 2, 5, 6]);
        drop(slot);
        assert!(sensor.is_balanced());
    }

    #[test]
    fn test_every_short_sequence_releases_each_frame_once() {
        // All publish/take sequences of length 10, bit set = publish
        for pattern in 0u32..(1 << 10) {
            let (sensor, slot) = slot();
            let mut expected_take = None;

            for bit in 0..10 {
                if pattern & (1 << bit) != 0 {
                    let frame = sensor.capture().unwrap();
                    let id = frame.id;
                    slot.publish(frame);
                    expected_take = Some(id);
                } else {
                    let taken = slot.take().map(|lease| lease.id);
                    assert_eq!(taken, expected_take.take(), "pattern {pattern:#012b}");
                }
            }

            drop(slot);
            assert!(sensor.is_balanced(), "pattern {pattern:#012b}");
        }
    }

    #[test]
    fn test_concurrent_publish_and_take_balance() {
        let sensor = Arc::new(CountingSensor::new(8));
        let slot = Arc::new(FrameSlot::new(Arc::clone(&sensor)));

        let producer = {
            let slot = Arc::clone(&slot);
            let sensor = Arc::clone(&sensor);
            std::thread::spawn(move || {
                for _ in 0..500 {
                    slot.publish(sensor.capture().unwrap());
                }
            })
        };
        let consumer = {
            let slot = Arc::clone(&slot);
            std::thread::spawn(move || {
                for _ in 0..500 {
                    if let Some(lease) = slot.take() {
                        lease.release();
                    }
                }
            })
        };

        producer.join().unwrap();
        consumer.join().unwrap();
        drop(slot);

        assert_eq!(sensor.captured(), 500);
        assert!(sensor.is_balanced());
    }
}
