//! Timecoded vinyl model
//!
//! - [`VinylType`] / [`VinylSpec`]: the closed set of supported formats and
//!   their constants (carrier frequency per [`Rpm`], default thresholds)
//! - [`CodedVinyl`]: the recording analysis shared by all formats
//! - [`TimecodeGenerator`]: ideal carrier synthesis for calibration and tests

mod coded_vinyl;
mod generator;
mod spec;

pub use coded_vinyl::*;
pub use generator::*;
pub use spec::*;
