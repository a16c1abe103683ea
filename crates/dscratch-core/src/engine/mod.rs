//! Turntable engine - registry of live turntables and their analyzers
//!
//! - Turntable: atomic settings block, analyzer, published playing parameters
//! - TurntableRegistry: handle → turntable slot table
//! - gc: collector thread for turntables deleted while being analyzed

pub mod gc;
mod registry;
mod turntable;

pub use registry::*;
pub use turntable::*;
