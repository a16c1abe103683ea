//! Single-pole IIR smoothing filter
//!
//! `y[n] = α·x[n] + (1 - α)·y[n-1]`, seeded with the first input so the
//! output never ramps up from zero at stream start.

/// Smoothing coefficient for the instantaneous frequency (per sample).
/// Time constant of ~100 samples (~2.3ms @ 44.1kHz) keeps scratches responsive.
pub const FREQUENCY_SMOOTHING: f64 = 0.01;

/// Smoothing coefficient for the instantaneous amplitude (per sample).
/// Slower than the frequency filter so volume does not flutter.
pub const AMPLITUDE_SMOOTHING: f64 = 0.001;

/// One-pole low-pass filter
#[derive(Debug, Clone)]
pub struct IirFilter {
    alpha: f64,
    state: Option<f64>,
}

impl IirFilter {
    /// Create a filter; `alpha` is clamped to (0, 1]
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha: alpha.clamp(f64::EPSILON, 1.0),
            state: None,
        }
    }

    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        let output = match self.state {
            None => input,
            Some(previous) => self.alpha * input + (1.0 - self.alpha) * previous,
        };
        self.state = Some(output);
        output
    }

    /// Last output, `None` before the first input
    pub fn value(&self) -> Option<f64> {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_with_first_input() {
        let mut iir = IirFilter::new(0.01);
        assert_eq!(iir.value(), None);
        assert_eq!(iir.process(42.0), 42.0);
        assert_eq!(iir.process(42.0), 42.0);
    }

    #[test]
    fn test_converges_to_step() {
        let mut iir = IirFilter::new(0.1);
        iir.process(0.0);
        let mut out = 0.0;
        for _ in 0..500 {
            out = iir.process(1.0);
        }
        assert!((out - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_monotonic_for_rising_input() {
        let mut iir = IirFilter::new(AMPLITUDE_SMOOTHING);
        let mut last = f64::MIN;
        for n in 0..10_000 {
            let out = iir.process(n as f64 * 1e-4);
            assert!(out >= last);
            last = out;
        }
    }

    #[test]
    fn test_alpha_clamped() {
        // Clamped to 1: output follows the input
        let mut passthrough = IirFilter::new(3.0);
        passthrough.process(0.0);
        assert_eq!(passthrough.process(5.0), 5.0);

        // Clamped above 0: output still moves toward the input
        let mut slowest = IirFilter::new(-1.0);
        slowest.process(0.0);
        assert!(slowest.process(1.0) > 0.0);
    }

    #[test]
    fn test_reset() {
        let mut iir = IirFilter::new(0.5);
        iir.process(1.0);
        iir.reset();
        assert_eq!(iir.value(), None);
        assert_eq!(iir.process(-3.0), -3.0);
    }
}
