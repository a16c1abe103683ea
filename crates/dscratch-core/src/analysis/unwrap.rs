//! Phase unwrapping
//!
//! Turns angles bounded to (-π, π] into a continuous phase by accumulating a
//! ±2π correction whenever two successive angles jump by more than π.

use std::f64::consts::{PI, TAU};

/// Stateful phase unwrapper
#[derive(Debug, Clone, Default)]
pub struct PhaseUnwrapper {
    /// Previous raw angle, `None` right after construction or reset
    last_angle: Option<f64>,
    /// Accumulated multiple of 2π added to raw angles
    offset: f64,
}

impl PhaseUnwrapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unwrap one raw angle
    #[inline]
    pub fn unwrap(&mut self, angle: f64) -> f64 {
        if let Some(last) = self.last_angle {
            let jump = angle - last;
            if jump > PI {
                self.offset -= TAU;
            } else if jump < -PI {
                self.offset += TAU;
            }
        }
        self.last_angle = Some(angle);
        angle + self.offset
    }

    /// Current accumulated correction
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Move the unwrapped output down by `delta` (a multiple of 2π)
    pub fn shift(&mut self, delta: f64) {
        self.offset -= delta;
    }

    pub fn reset(&mut self) {
        self.last_angle = None;
        self.offset = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap(angle: f64) -> f64 {
        angle.sin().atan2(angle.cos())
    }

    #[test]
    fn test_forward_rotation_is_continuous() {
        let mut unwrapper = PhaseUnwrapper::new();
        let step = 0.7;
        for n in 0..200 {
            let phase = n as f64 * step;
            let out = unwrapper.unwrap(wrap(phase));
            assert!((out - phase).abs() < 1e-9, "n={} out={} phase={}", n, out, phase);
        }
    }

    #[test]
    fn test_backward_rotation_is_continuous() {
        let mut unwrapper = PhaseUnwrapper::new();
        let step = -0.9;
        for n in 0..200 {
            let phase = n as f64 * step;
            let out = unwrapper.unwrap(wrap(phase));
            assert!((out - phase).abs() < 1e-9);
        }
    }

    #[test]
    fn test_direction_reversal() {
        let mut unwrapper = PhaseUnwrapper::new();
        let mut phase = 0.0;
        let mut out = 0.0;
        for _ in 0..50 {
            phase += 0.8;
            out = unwrapper.unwrap(wrap(phase));
        }
        for _ in 0..100 {
            phase -= 0.8;
            out = unwrapper.unwrap(wrap(phase));
        }
        assert!((out - phase).abs() < 1e-9);
    }

    #[test]
    fn test_shift_and_reset() {
        let mut unwrapper = PhaseUnwrapper::new();
        for n in 0..20 {
            unwrapper.unwrap(wrap(n as f64));
        }
        let before = unwrapper.offset();
        unwrapper.shift(TAU * 2.0);
        assert!((unwrapper.offset() - (before - TAU * 2.0)).abs() < 1e-12);

        unwrapper.reset();
        assert_eq!(unwrapper.offset(), 0.0);
        assert_eq!(unwrapper.unwrap(1.0), 1.0);
    }
}
