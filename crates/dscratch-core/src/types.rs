//! Common types and constants shared by the engine and its callers

use serde::{Deserialize, Serialize};

/// Speed reported when no speed could be detected
pub const NO_NEW_SPEED_FOUND: f32 = -99.0;

/// Volume reported when no volume could be detected
pub const NO_NEW_VOLUME_FOUND: f32 = -99.0;

/// Maximum number of simultaneously live turntables
pub const MAX_TURNTABLES: usize = 32;

/// Result of a successful motion detection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayingParameters {
    /// Signed speed, 1.0 = nominal forward speed, negative = backward
    pub speed: f32,
    /// Volume in [0.0, 1.0], derived from the timecode amplitude
    pub volume: f32,
}

impl PlayingParameters {
    pub fn new(speed: f32, volume: f32) -> Self {
        Self { speed, volume }
    }

    /// Pack into one word so readers never see speed and volume from
    /// different analysis calls
    #[inline]
    pub(crate) fn pack(found: Option<Self>) -> u64 {
        let (speed, volume) = match found {
            Some(p) => (p.speed, p.volume),
            None => (NO_NEW_SPEED_FOUND, NO_NEW_VOLUME_FOUND),
        };
        (u64::from(speed.to_bits()) << 32) | u64::from(volume.to_bits())
    }

    #[inline]
    pub(crate) fn unpack(packed: u64) -> Option<Self> {
        let speed = f32::from_bits((packed >> 32) as u32);
        let volume = f32::from_bits(packed as u32);
        if speed == NO_NEW_SPEED_FOUND || volume == NO_NEW_VOLUME_FOUND {
            None
        } else {
            Some(Self { speed, volume })
        }
    }

    /// Speed and volume as the C API reports them (sentinels when not found)
    pub fn or_sentinels(found: Option<Self>) -> (f32, f32) {
        match found {
            Some(p) => (p.speed, p.volume),
            None => (NO_NEW_SPEED_FOUND, NO_NEW_VOLUME_FOUND),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_keeps_sign_and_value() {
        let params = PlayingParameters::new(-1.25, 0.5);
        let unpacked = PlayingParameters::unpack(PlayingParameters::pack(Some(params)));
        assert_eq!(unpacked, Some(params));
    }

    #[test]
    fn test_pack_not_found() {
        assert_eq!(PlayingParameters::unpack(PlayingParameters::pack(None)), None);
        assert_eq!(
            PlayingParameters::or_sentinels(None),
            (NO_NEW_SPEED_FOUND, NO_NEW_VOLUME_FOUND)
        );
    }
}
