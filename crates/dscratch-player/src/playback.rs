//! Playback parameters shared with the playback engine
//!
//! Written by the timecode control process on the audio thread, read by the
//! playback engine and the UI. Speed and volume are independent relaxed
//! atomics: readers only need the latest value, not a consistent pair.

use std::sync::atomic::{AtomicU64, Ordering};

use atomic_float::AtomicF32;

/// Playback parameters of one deck
#[derive(Debug)]
pub struct PlaybackParameters {
    speed: AtomicF32,
    volume: AtomicF32,
    /// Number of updates pushed by the control process
    updates: AtomicU64,
}

impl PlaybackParameters {
    /// Stopped deck at full volume
    pub fn new() -> Self {
        Self {
            speed: AtomicF32::new(0.0),
            volume: AtomicF32::new(1.0),
            updates: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.speed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn volume(&self) -> f32 {
        self.volume.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn updates(&self) -> u64 {
        self.updates.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn set_speed(&self, speed: f32) {
        self.speed.store(speed, Ordering::Relaxed);
        self.updates.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn set_volume(&self, volume: f32) {
        self.volume.store(volume, Ordering::Relaxed);
    }
}

impl Default for PlaybackParameters {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_updates() {
        let params = PlaybackParameters::new();
        assert_eq!(params.speed(), 0.0);
        assert_eq!(params.volume(), 1.0);
        assert_eq!(params.updates(), 0);

        params.set_speed(-0.5);
        params.set_volume(0.25);
        assert_eq!(params.speed(), -0.5);
        assert_eq!(params.volume(), 0.25);
        assert_eq!(params.updates(), 1);
    }
}
