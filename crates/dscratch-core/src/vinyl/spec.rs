//! Supported timecoded vinyls and their constants
//!
//! The set of formats is closed. Each format is fully described by a
//! [`VinylSpec`] row: carrier frequency per RPM, default detection thresholds,
//! default input gain, channel convention and amplitude measure. The shared
//! analysis in [`super::CodedVinyl`] is parameterized by that row.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DscratchError, DscratchResult};

/// Nominal disc rotation speed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum Rpm {
    /// 33⅓ RPM
    #[default]
    Rpm33,
    /// 45 RPM
    Rpm45,
}

/// Default turntable speed
pub const DEFAULT_RPM: Rpm = Rpm::Rpm33;

impl Rpm {
    pub const ALL: [Rpm; 2] = [Rpm::Rpm33, Rpm::Rpm45];

    /// Numeric value as exposed by the API (33 or 45)
    pub fn value(self) -> u16 {
        match self {
            Rpm::Rpm33 => 33,
            Rpm::Rpm45 => 45,
        }
    }

    pub fn from_value(value: u16) -> Option<Self> {
        match value {
            33 => Some(Rpm::Rpm33),
            45 => Some(Rpm::Rpm45),
            _ => None,
        }
    }
}

impl TryFrom<u16> for Rpm {
    type Error = DscratchError;

    fn try_from(value: u16) -> DscratchResult<Self> {
        Rpm::from_value(value).ok_or(DscratchError::InvalidRpm(value))
    }
}

impl From<Rpm> for u16 {
    fn from(rpm: Rpm) -> u16 {
        rpm.value()
    }
}

impl fmt::Display for Rpm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// How the two captured channels map onto the (x, y) plane fed to atan2
///
/// For every layout, forward rotation makes the angle `atan2(y, x)` increase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLayout {
    /// x = left, y = right (right lags left by a quarter period)
    Standard,
    /// x = right, y = left
    Swapped,
    /// x = left, y = -right (right leads left by a quarter period)
    Inverted,
}

impl ChannelLayout {
    /// Map captured (left, right) samples to (x, y)
    #[inline]
    pub fn orient(self, left: f64, right: f64) -> (f64, f64) {
        match self {
            ChannelLayout::Standard => (left, right),
            ChannelLayout::Swapped => (right, left),
            ChannelLayout::Inverted => (left, -right),
        }
    }

    /// Inverse of [`orient`](Self::orient): (x, y) back to (left, right)
    #[inline]
    pub fn to_channels(self, x: f64, y: f64) -> (f64, f64) {
        match self {
            ChannelLayout::Standard => (x, y),
            ChannelLayout::Swapped => (y, x),
            ChannelLayout::Inverted => (x, -y),
        }
    }
}

/// Instantaneous amplitude measure of one (x, y) frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmplitudeMeasure {
    /// `sqrt(x² + y²)`, equals the carrier peak amplitude
    VectorMagnitude,
    /// `sqrt((x² + y²) / 2)`, RMS across both channels
    Rms,
}

impl AmplitudeMeasure {
    #[inline]
    pub fn measure(self, x: f64, y: f64) -> f64 {
        match self {
            AmplitudeMeasure::VectorMagnitude => x.hypot(y),
            AmplitudeMeasure::Rms => ((x * x + y * y) * 0.5).sqrt(),
        }
    }
}

/// Constants describing one timecoded vinyl
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VinylSpec {
    /// Human-readable name
    pub name: &'static str,
    /// Carrier frequency (Hz) at 33⅓ RPM
    pub frequency_33: f64,
    /// Carrier frequency (Hz) at 45 RPM
    pub frequency_45: f64,
    /// Amplitude under which no speed is reported
    pub min_amplitude: f32,
    /// Amplitude from which volume is full scale
    pub min_amplitude_for_normal_speed: f32,
    /// Integer gain applied to captured samples
    pub input_amplify_coeff: i32,
    pub layout: ChannelLayout,
    pub amplitude: AmplitudeMeasure,
}

const FINAL_SCRATCH_SPEC: VinylSpec = VinylSpec {
    name: "final scratch standard 2.0",
    frequency_33: 1000.0,
    frequency_45: 1350.0,
    min_amplitude: 0.010,
    min_amplitude_for_normal_speed: 0.120,
    input_amplify_coeff: 1,
    layout: ChannelLayout::Swapped,
    amplitude: AmplitudeMeasure::VectorMagnitude,
};

const SERATO_SPEC: VinylSpec = VinylSpec {
    name: "serato cv02",
    frequency_33: 1000.0,
    frequency_45: 1350.0,
    min_amplitude: 0.008,
    min_amplitude_for_normal_speed: 0.100,
    input_amplify_coeff: 1,
    layout: ChannelLayout::Standard,
    amplitude: AmplitudeMeasure::VectorMagnitude,
};

// Mixvibes pressings are cut quieter, hence the 2x default gain
const MIXVIBES_SPEC: VinylSpec = VinylSpec {
    name: "mixvibes dvs",
    frequency_33: 1300.0,
    frequency_45: 1755.0,
    min_amplitude: 0.006,
    min_amplitude_for_normal_speed: 0.080,
    input_amplify_coeff: 2,
    layout: ChannelLayout::Inverted,
    amplitude: AmplitudeMeasure::Rms,
};

/// Supported timecoded vinyls
///
/// Discriminants are the ordinals used by the C API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum VinylType {
    FinalScratch = 0,
    #[default]
    Serato = 1,
    Mixvibes = 2,
}

/// Number of supported vinyl types
pub const NB_VINYL_TYPES: usize = 3;

impl VinylType {
    /// All vinyl types in ordinal order
    pub const ALL: [VinylType; NB_VINYL_TYPES] =
        [VinylType::FinalScratch, VinylType::Serato, VinylType::Mixvibes];

    /// Vinyl type from its C ordinal
    pub fn from_index(index: i64) -> Option<Self> {
        match index {
            0 => Some(VinylType::FinalScratch),
            1 => Some(VinylType::Serato),
            2 => Some(VinylType::Mixvibes),
            _ => None,
        }
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    /// Constant table row for this vinyl
    pub fn spec(self) -> &'static VinylSpec {
        match self {
            VinylType::FinalScratch => &FINAL_SCRATCH_SPEC,
            VinylType::Serato => &SERATO_SPEC,
            VinylType::Mixvibes => &MIXVIBES_SPEC,
        }
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }

    /// Reference carrier frequency (Hz) at the given RPM
    pub fn sinusoidal_frequency(self, rpm: Rpm) -> f64 {
        let spec = self.spec();
        match rpm {
            Rpm::Rpm33 => spec.frequency_33,
            Rpm::Rpm45 => spec.frequency_45,
        }
    }

    pub fn default_min_amplitude(self) -> f32 {
        self.spec().min_amplitude
    }

    pub fn default_min_amplitude_for_normal_speed(self) -> f32 {
        self.spec().min_amplitude_for_normal_speed
    }

    pub fn default_input_amplify_coeff(self) -> i32 {
        self.spec().input_amplify_coeff
    }
}

impl TryFrom<i32> for VinylType {
    type Error = DscratchError;

    fn try_from(value: i32) -> DscratchResult<Self> {
        VinylType::from_index(i64::from(value)).ok_or(DscratchError::UnknownVinylType(i64::from(value)))
    }
}

impl fmt::Display for VinylType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for VinylType {
    type Err = DscratchError;

    /// Accepts short identifiers ("serato", "final_scratch") or full names
    fn from_str(s: &str) -> DscratchResult<Self> {
        let key = s.trim().to_ascii_lowercase();
        match key.as_str() {
            "final_scratch" | "finalscratch" | "final-scratch" => Ok(VinylType::FinalScratch),
            "serato" => Ok(VinylType::Serato),
            "mixvibes" => Ok(VinylType::Mixvibes),
            _ => VinylType::ALL
                .into_iter()
                .find(|v| v.name() == key)
                .ok_or_else(|| DscratchError::UnknownVinylName(s.to_string())),
        }
    }
}
