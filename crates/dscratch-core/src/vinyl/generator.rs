//! Synthetic timecode signal
//!
//! Produces the quadrature carrier a vinyl would emit when spinning at a
//! given speed, honoring the channel convention of its format. Phase is kept
//! across calls so speed changes never introduce discontinuities.

use std::f64::consts::TAU;

use super::{Rpm, VinylType};

/// Generator of an ideal (noise-free) timecode carrier
#[derive(Debug, Clone)]
pub struct TimecodeGenerator {
    vinyl: VinylType,
    rpm: Rpm,
    sample_rate: u32,
    phase: f64,
}

impl TimecodeGenerator {
    pub fn new(vinyl: VinylType, rpm: Rpm, sample_rate: u32) -> Self {
        Self {
            vinyl,
            rpm,
            sample_rate,
            phase: 0.0,
        }
    }

    /// Start from an arbitrary carrier phase (radians)
    pub fn with_phase(mut self, phase: f64) -> Self {
        self.phase = phase.rem_euclid(TAU);
        self
    }

    pub fn vinyl_type(&self) -> VinylType {
        self.vinyl
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Fill `left`/`right` with the carrier at `speed` (signed) and peak
    /// `amplitude`. Only the common length of both slices is written.
    pub fn fill(&mut self, speed: f64, amplitude: f32, left: &mut [f32], right: &mut [f32]) {
        let step = TAU * self.vinyl.sinusoidal_frequency(self.rpm) * speed / f64::from(self.sample_rate);
        let layout = self.vinyl.spec().layout;
        let peak = f64::from(amplitude);

        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let (x, y) = (peak * self.phase.cos(), peak * self.phase.sin());
            let (cl, cr) = layout.to_channels(x, y);
            *l = cl as f32;
            *r = cr as f32;
            self.phase = (self.phase + step).rem_euclid(TAU);
        }
    }

    /// Same as [`fill`](Self::fill) into an interleaved buffer
    pub fn fill_interleaved(
        &mut self,
        speed: f64,
        amplitude: f32,
        data: &mut [f32],
        channels: usize,
        left_index: usize,
        right_index: usize,
    ) {
        if channels == 0 || left_index >= channels || right_index >= channels {
            return;
        }
        let mut l = [0.0f32; 1];
        let mut r = [0.0f32; 1];
        for frame in data.chunks_exact_mut(channels) {
            self.fill(speed, amplitude, &mut l, &mut r);
            frame[left_index] = l[0];
            frame[right_index] = r[0];
        }
    }
}
