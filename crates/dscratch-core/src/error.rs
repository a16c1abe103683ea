//! Engine error types

use thiserror::Error;

use crate::engine::TurntableHandle;

/// Errors returned by the engine API
///
/// There is no "no signal" error: a silent or sub-threshold deck is a
/// normal state reported as `None` playing parameters, not an error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DscratchError {
    /// Handle does not designate a live turntable (unknown or deleted)
    #[error("Invalid turntable handle: {0}")]
    InvalidHandle(TurntableHandle),

    /// Raw handle value cannot be a handle at all (negative, null pointer)
    #[error("Invalid raw handle value: {0}")]
    InvalidRawHandle(i64),

    /// Sample rate must be strictly positive
    #[error("Invalid sample rate: {0}Hz")]
    InvalidSampleRate(u32),

    /// Every slot of the registry is in use
    #[error("Turntable registry is full ({capacity} turntables)")]
    RegistryFull { capacity: usize },

    /// Left and right buffers do not have the same number of frames
    #[error("Mismatched buffer lengths: left={left}, right={right}")]
    MismatchedBuffers { left: usize, right: usize },

    /// Interleaved layout does not describe the provided buffer
    #[error(
        "Invalid interleaved layout: {samples} samples, {channels} channels, left={left}, right={right}"
    )]
    InvalidInterleavedLayout {
        channels: usize,
        left: usize,
        right: usize,
        samples: usize,
    },

    /// Negative or overflowing count passed across the C boundary
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// Unknown vinyl type ordinal
    #[error("Unknown vinyl type: {0}")]
    UnknownVinylType(i64),

    /// Unknown vinyl type name
    #[error("Unknown vinyl name: {0}")]
    UnknownVinylName(String),

    /// RPM not in {33, 45}; the turntable falls back to the default RPM
    #[error("Unsupported RPM: {0}")]
    InvalidRpm(u16),

    /// Amplify coefficient must be >= 1
    #[error("Invalid input amplify coefficient: {0}")]
    InvalidAmplifyCoeff(i32),

    /// Amplitude thresholds must be finite and > 0
    #[error("Invalid amplitude threshold: {0}")]
    InvalidAmplitude(f32),

    /// Analysis already running for this turntable on another thread
    #[error("Turntable {0} is being analyzed by another thread")]
    AnalysisBusy(TurntableHandle),

    /// Null pointer passed across the C boundary
    #[error("Null pointer argument: {0}")]
    NullPointer(&'static str),

    /// Malformed timecode fixture
    #[error("Invalid fixture line {line}: {reason}")]
    InvalidFixture { line: usize, reason: String },
}

/// Result type for engine operations
pub type DscratchResult<T> = Result<T, DscratchError>;
