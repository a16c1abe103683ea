//! Numeric building blocks for timecode analysis
//!
//! - [`FirFilter`]: sliding-window FIR, used as a phase differentiator
//! - [`PhaseUnwrapper`]: removes ±2π discontinuities from atan2 output
//! - [`IirFilter`]: one-pole smoothing for frequency and amplitude
//!
//! None of these fail or allocate. Rejecting degenerate input (silence,
//! restarts after a dropout) is the job of the vinyl analyzer.

mod fir;
mod iir;
mod unwrap;

pub use fir::*;
pub use iir::*;
pub use unwrap::*;
