//! Flash LED stand-in for hosts without a GPIO-driven LED.

use std::sync::atomic::{AtomicBool, Ordering};

use pipeline::Flash;

/// Tracks the requested LED state and logs each transition
#[derive(Debug, Default)]
pub struct LogFlash {
    lit: AtomicBool,
}

impl LogFlash {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the LED is currently on
    pub fn is_lit(&self) -> bool {
        self.lit.load(Ordering::Relaxed)
    }
}

impl Flash for LogFlash {
    fn set(&self, on: bool) {
        if self.lit.swap(on, Ordering::Relaxed) != on {
            log::debug!("Flash turned {}.", if on { "on" } else { "off" });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flash_tracks_state() {
        let flash = LogFlash::new();
        assert!(!flash.is_lit());

        flash.set(true);
        assert!(flash.is_lit());
        flash.set(true);
        assert!(flash.is_lit());

        flash.set(false);
        assert!(!flash.is_lit());
    }
}
