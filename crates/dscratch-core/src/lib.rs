//! Digital Scratch Core - timecoded vinyl decoding and motion detection
//!
//! Turns the stereo signal of a turntable playing a timecoded vinyl into a
//! playback speed (signed, 1.0 = nominal) and volume, one audio buffer at a
//! time. Rust callers use [`DscratchEngine`]; C hosts use the [`ffi`] table.

pub mod analysis;
pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod ffi;
pub mod fixture;
pub mod types;
pub mod vinyl;

pub use api::DscratchEngine;
pub use engine::{TurntableHandle, TurntableInfo};
pub use error::{DscratchError, DscratchResult};
pub use types::*;
pub use vinyl::{Rpm, VinylType};
