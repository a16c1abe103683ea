//! Finite impulse response filter over a sliding window
//!
//! The filter keeps the last `N` inputs in a ring buffer so it can be fed one
//! sample at a time across audio buffer boundaries without discontinuities.

/// Number of taps of the phase differentiator
pub const DIFFERENTIATOR_TAPS: usize = 5;

/// Savitzky-Golay first-derivative kernel (5 points, quadratic fit).
///
/// Ordered newest sample first. The kernel is exact for polynomial input up
/// to degree two and attenuates sampling noise above the fundamental
/// modulation rate. Output is delayed by two samples (window center).
pub const DIFFERENTIATOR_COEFFS: [f64; DIFFERENTIATOR_TAPS] = [0.2, 0.1, 0.0, -0.1, -0.2];

/// Fixed-length FIR filter with a circular history
#[derive(Debug, Clone)]
pub struct FirFilter<const N: usize> {
    /// Coefficients, index 0 applies to the newest sample
    coeffs: [f64; N],
    /// Ring buffer of past inputs
    history: [f64; N],
    /// Slot the next input will be written to
    head: usize,
    /// Number of inputs seen since the last reset (saturates at N)
    filled: usize,
}

impl FirFilter<DIFFERENTIATOR_TAPS> {
    /// Create the phase differentiator used by the timecode analysis
    pub fn differentiator() -> Self {
        Self::new(DIFFERENTIATOR_COEFFS)
    }
}

impl<const N: usize> FirFilter<N> {
    /// Create a filter from its coefficients (newest sample first)
    pub fn new(coeffs: [f64; N]) -> Self {
        Self {
            coeffs,
            history: [0.0; N],
            head: 0,
            filled: 0,
        }
    }

    /// Push one input sample
    ///
    /// Returns `None` until the window has been filled once, so callers never
    /// see an output computed against the zeroed initial history.
    #[inline]
    pub fn process(&mut self, input: f64) -> Option<f64> {
        self.history[self.head] = input;
        self.head = (self.head + 1) % N;
        if self.filled < N {
            self.filled += 1;
            if self.filled < N {
                return None;
            }
        }

        // Walk backwards from the newest sample
        let mut acc = 0.0;
        let mut idx = self.head;
        for coeff in &self.coeffs {
            idx = if idx == 0 { N - 1 } else { idx - 1 };
            acc += coeff * self.history[idx];
        }
        Some(acc)
    }

    /// Subtract a constant from every stored sample
    ///
    /// Used to rebase an unbounded input (unwrapped phase) without changing
    /// the output of a kernel whose coefficients sum to zero.
    pub fn shift(&mut self, delta: f64) {
        for value in &mut self.history {
            *value -= delta;
        }
    }

    /// Forget all history
    pub fn reset(&mut self) {
        self.history = [0.0; N];
        self.head = 0;
        self.filled = 0;
    }
}
