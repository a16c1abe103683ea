//! Recording analysis shared by every timecoded vinyl
//!
//! Per captured frame:
//!
//! ```text
//! (left, right) ──gain──► layout ──► (x, y) ──atan2──► unwrap ──► FIR d/dn ──► IIR ──► frequency
//!                                       │
//!                                       └──amplitude measure──────────────────► IIR ──► amplitude
//! ```
//!
//! At the end of each buffer:
//! - `speed  = frequency / carrier_frequency(vinyl, rpm)` (sign = direction)
//! - `volume = clamp(amplitude / min_amplitude_for_normal_speed, 0, 1)`
//! - nothing is reported while the smoothed amplitude is under `min_amplitude`,
//!   nor after a buffer whose every frame is under it (needle lifted)
//!
//! Filter state is a continuous time series across calls. It is only reset on
//! construction and on [`CodedVinyl::reset`] (vinyl format change).

use std::f64::consts::TAU;

use crate::analysis::{
    FirFilter, IirFilter, PhaseUnwrapper, AMPLITUDE_SMOOTHING, DIFFERENTIATOR_TAPS,
    FREQUENCY_SMOOTHING,
};
use crate::error::{DscratchError, DscratchResult};
use crate::types::PlayingParameters;

use super::{Rpm, VinylType};

/// Unwrapped phase magnitude (radians) above which the phase is rebased
/// toward zero to keep f64 precision on long sessions
const PHASE_REBASE_LIMIT: f64 = 1.0e6;

/// Parameters snapshot for one analysis call
///
/// Read from the turntable settings once per buffer, so a configuration change
/// takes effect on the next call and never mid-buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisParams {
    pub sample_rate: u32,
    pub rpm: Rpm,
    pub input_amplify_coeff: i32,
    pub min_amplitude: f32,
    pub min_amplitude_for_normal_speed: f32,
}

impl AnalysisParams {
    /// Defaults of a vinyl format at the given sample rate
    pub fn defaults(vinyl: VinylType, sample_rate: u32) -> Self {
        Self {
            sample_rate,
            rpm: Rpm::default(),
            input_amplify_coeff: vinyl.default_input_amplify_coeff(),
            min_amplitude: vinyl.default_min_amplitude(),
            min_amplitude_for_normal_speed: vinyl.default_min_amplitude_for_normal_speed(),
        }
    }
}

/// Timecode analyzer for one turntable
#[derive(Debug, Clone)]
pub struct CodedVinyl {
    vinyl: VinylType,
    diff_fir: FirFilter<DIFFERENTIATOR_TAPS>,
    unwrapper: PhaseUnwrapper,
    speed_iir: IirFilter,
    amplitude_iir: IirFilter,
    /// Set when phase continuity is broken; the next derivative re-seeds
    /// the frequency filter
    restart_speed: bool,
    reverse_direction: bool,
}

impl CodedVinyl {
    pub fn new(vinyl: VinylType) -> Self {
        Self {
            vinyl,
            diff_fir: FirFilter::differentiator(),
            unwrapper: PhaseUnwrapper::new(),
            speed_iir: IirFilter::new(FREQUENCY_SMOOTHING),
            amplitude_iir: IirFilter::new(AMPLITUDE_SMOOTHING),
            restart_speed: false,
            reverse_direction: false,
        }
    }

    pub fn vinyl_type(&self) -> VinylType {
        self.vinyl
    }

    /// Reference carrier frequency of this vinyl at `rpm`
    pub fn sinusoidal_frequency(&self, rpm: Rpm) -> f64 {
        self.vinyl.sinusoidal_frequency(rpm)
    }

    /// Drop all filter history and switch to `vinyl`
    pub fn reset(&mut self, vinyl: VinylType) {
        *self = Self::new(vinyl);
    }

    /// Analyze one buffer of separate left/right samples
    ///
    /// Buffers of different lengths are rejected without touching any state.
    pub fn run_recording_data_analysis(
        &mut self,
        left: &[f32],
        right: &[f32],
        params: &AnalysisParams,
    ) -> DscratchResult<()> {
        if left.len() != right.len() {
            return Err(DscratchError::MismatchedBuffers {
                left: left.len(),
                right: right.len(),
            });
        }
        self.analyze_frames(left.iter().copied().zip(right.iter().copied()), params);
        Ok(())
    }

    /// Analyze a sequence of (left, right) frames
    ///
    /// Allocation-free; interleaved and planar callers both land here.
    pub fn analyze_frames<I>(&mut self, frames: I, params: &AnalysisParams)
    where
        I: IntoIterator<Item = (f32, f32)>,
    {
        let spec = self.vinyl.spec();
        let gain = f64::from(params.input_amplify_coeff.max(1));
        let min_amplitude = f64::from(params.min_amplitude);
        let radians_to_hz = f64::from(params.sample_rate) / TAU;

        let mut buffer_peak: Option<f64> = None;
        for (left, right) in frames {
            let (x, y) = spec.layout.orient(f64::from(left) * gain, f64::from(right) * gain);
            let amplitude = if x.is_finite() && y.is_finite() {
                spec.amplitude.measure(x, y)
            } else {
                0.0
            };
            let amplitude = if amplitude.is_finite() { amplitude } else { 0.0 };
            self.amplitude_iir.process(amplitude);
            buffer_peak = Some(buffer_peak.map_or(amplitude, |peak| peak.max(amplitude)));

            // Phase of a sub-threshold frame is noise: break continuity so the
            // next valid frame starts a fresh derivative instead of a spike.
            if amplitude < min_amplitude {
                self.diff_fir.reset();
                self.unwrapper.reset();
                self.restart_speed = true;
                continue;
            }

            let phase = self.unwrapper.unwrap(y.atan2(x));
            if let Some(radians_per_sample) = self.diff_fir.process(phase) {
                if self.restart_speed {
                    self.speed_iir.reset();
                    self.restart_speed = false;
                }
                self.speed_iir.process(radians_per_sample * radians_to_hz);
            }

            if phase.abs() > PHASE_REBASE_LIMIT {
                let delta = (phase / TAU).trunc() * TAU;
                self.unwrapper.shift(delta);
                self.diff_fir.shift(delta);
            }
        }

        // A whole buffer under the floor: forget the slow amplitude history so
        // the lift is reported on this call, not after it decays
        if let Some(peak) = buffer_peak.filter(|&peak| peak < min_amplitude) {
            self.amplitude_iir.reset();
            self.amplitude_iir.process(peak);
        }

        if let Some(frequency) = self.speed_iir.value() {
            self.reverse_direction = frequency < 0.0;
        }
    }

    /// Smoothed amplitude, if any frame was analyzed
    pub fn amplitude(&self) -> Option<f64> {
        self.amplitude_iir.value().filter(|a| a.is_finite())
    }

    /// Smoothed instantaneous frequency in Hz (signed)
    pub fn frequency(&self) -> Option<f64> {
        self.speed_iir.value().filter(|f| f.is_finite())
    }

    /// Whether the last analyzed signal rotated backward
    pub fn is_reverse_direction(&self) -> bool {
        self.reverse_direction
    }

    /// Signed speed relative to nominal, `None` under the amplitude floor
    pub fn speed(&self, params: &AnalysisParams) -> Option<f32> {
        self.gated_amplitude(params)?;
        let frequency = self.frequency()?;
        let magnitude = frequency.abs() / self.sinusoidal_frequency(params.rpm);
        let speed = if self.reverse_direction { -magnitude } else { magnitude };
        Some(speed as f32).filter(|s| s.is_finite())
    }

    /// Volume in [0, 1], `None` under the amplitude floor
    pub fn volume(&self, params: &AnalysisParams) -> Option<f32> {
        let amplitude = self.gated_amplitude(params)?;
        let normal = f64::from(params.min_amplitude_for_normal_speed);
        if normal.is_nan() || normal <= 0.0 {
            return Some(1.0);
        }
        Some((amplitude / normal).clamp(0.0, 1.0) as f32)
    }

    /// Speed and volume together, `None` if either is unavailable
    pub fn playing_parameters(&self, params: &AnalysisParams) -> Option<PlayingParameters> {
        Some(PlayingParameters::new(self.speed(params)?, self.volume(params)?))
    }

    fn gated_amplitude(&self, params: &AnalysisParams) -> Option<f64> {
        self.amplitude()
            .filter(|&a| a >= f64::from(params.min_amplitude))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vinyl::TimecodeGenerator;

    const SAMPLE_RATE: u32 = 44100;
    const BUFFER: usize = 512;

    fn feed(
        vinyl: &mut CodedVinyl,
        generator: &mut TimecodeGenerator,
        params: &AnalysisParams,
        speed: f64,
        amplitude: f32,
        buffers: usize,
    ) -> Option<PlayingParameters> {
        let mut left = vec![0.0; BUFFER];
        let mut right = vec![0.0; BUFFER];
        let mut found = None;
        for _ in 0..buffers {
            generator.fill(speed, amplitude, &mut left, &mut right);
            vinyl.run_recording_data_analysis(&left, &right, params).unwrap();
            found = vinyl.playing_parameters(params);
        }
        found
    }

    #[test]
    fn test_nominal_speed_every_format_and_rpm() {
        for vinyl_type in VinylType::ALL {
            for rpm in Rpm::ALL {
                let mut vinyl = CodedVinyl::new(vinyl_type);
                let mut generator = TimecodeGenerator::new(vinyl_type, rpm, SAMPLE_RATE);
                let params = AnalysisParams { rpm, ..AnalysisParams::defaults(vinyl_type, SAMPLE_RATE) };

                let found = feed(&mut vinyl, &mut generator, &params, 1.0, 0.5, 20).unwrap();
                assert!(
                    (found.speed - 1.0).abs() < 0.0001,
                    "{:?}@{}: speed={}",
                    vinyl_type,
                    rpm,
                    found.speed
                );
                assert_eq!(found.volume, 1.0);
                assert!(!vinyl.is_reverse_direction());
            }
        }
    }

    #[test]
    fn test_backward_rotation_negative_speed() {
        let mut vinyl = CodedVinyl::new(VinylType::Serato);
        let mut generator = TimecodeGenerator::new(VinylType::Serato, Rpm::Rpm33, SAMPLE_RATE);
        let params = AnalysisParams::defaults(VinylType::Serato, SAMPLE_RATE);

        let found = feed(&mut vinyl, &mut generator, &params, -1.0, 0.5, 20).unwrap();
        assert!((found.speed + 1.0).abs() < 0.0001, "speed={}", found.speed);
        assert!(vinyl.is_reverse_direction());
    }

    #[test]
    fn test_swapped_channels_reverse_sign() {
        let mut forward = CodedVinyl::new(VinylType::Serato);
        let mut swapped = CodedVinyl::new(VinylType::Serato);
        let mut generator = TimecodeGenerator::new(VinylType::Serato, Rpm::Rpm33, SAMPLE_RATE);
        let params = AnalysisParams::defaults(VinylType::Serato, SAMPLE_RATE);

        let mut left = vec![0.0; BUFFER];
        let mut right = vec![0.0; BUFFER];
        for _ in 0..20 {
            generator.fill(0.75, 0.5, &mut left, &mut right);
            forward.run_recording_data_analysis(&left, &right, &params).unwrap();
            swapped.run_recording_data_analysis(&right, &left, &params).unwrap();
        }
        let a = forward.speed(&params).unwrap();
        let b = swapped.speed(&params).unwrap();
        assert!((a - 0.75).abs() < 0.0001);
        assert!((a + b).abs() < 0.0001, "forward={} swapped={}", a, b);
    }

    #[test]
    fn test_silence_reports_nothing() {
        let mut vinyl = CodedVinyl::new(VinylType::Serato);
        let params = AnalysisParams::defaults(VinylType::Serato, SAMPLE_RATE);
        let zeros = vec![0.0; BUFFER];
        for _ in 0..10 {
            vinyl.run_recording_data_analysis(&zeros, &zeros, &params).unwrap();
            assert_eq!(vinyl.speed(&params), None);
            assert_eq!(vinyl.volume(&params), None);
        }
    }

    #[test]
    fn test_signal_then_silence_is_immediate_sentinel() {
        let mut vinyl = CodedVinyl::new(VinylType::Serato);
        let mut generator = TimecodeGenerator::new(VinylType::Serato, Rpm::Rpm33, SAMPLE_RATE);
        let params = AnalysisParams::defaults(VinylType::Serato, SAMPLE_RATE);
        assert!(feed(&mut vinyl, &mut generator, &params, 1.0, 0.5, 10).is_some());

        // Needle lifted: nothing is reported from the first silent buffer on
        let zeros = vec![0.0; BUFFER];
        for call in 0..30 {
            vinyl.run_recording_data_analysis(&zeros, &zeros, &params).unwrap();
            assert_eq!(vinyl.playing_parameters(&params), None, "silent call {}", call);
        }
    }

    #[test]
    fn test_signal_back_after_dropout_settles_fresh() {
        let mut vinyl = CodedVinyl::new(VinylType::Serato);
        let mut generator = TimecodeGenerator::new(VinylType::Serato, Rpm::Rpm33, SAMPLE_RATE);
        let params = AnalysisParams::defaults(VinylType::Serato, SAMPLE_RATE);
        assert!(feed(&mut vinyl, &mut generator, &params, -1.0, 0.5, 20).is_some());

        let zeros = vec![0.0; BUFFER];
        vinyl.run_recording_data_analysis(&zeros, &zeros, &params).unwrap();

        // The first buffer back must not be dragged toward the old backward speed
        let found = feed(&mut vinyl, &mut generator, &params, 1.0, 0.5, 1).unwrap();
        assert!((found.speed - 1.0).abs() < 0.0001, "speed={}", found.speed);
        assert!(!vinyl.is_reverse_direction());
    }

    #[test]
    fn test_speed_independent_of_start_phase() {
        let params = AnalysisParams::defaults(VinylType::FinalScratch, SAMPLE_RATE);
        for phase in [0.0, 1.3, 3.1, -2.4] {
            let mut vinyl = CodedVinyl::new(VinylType::FinalScratch);
            let mut generator =
                TimecodeGenerator::new(VinylType::FinalScratch, Rpm::Rpm33, SAMPLE_RATE).with_phase(phase);
            let found = feed(&mut vinyl, &mut generator, &params, 0.6, 0.5, 20).unwrap();
            assert!((found.speed - 0.6).abs() < 0.0001, "phase={} speed={}", phase, found.speed);
        }
    }

    #[test]
    fn test_mismatched_lengths_are_a_noop() {
        let mut vinyl = CodedVinyl::new(VinylType::Serato);
        let params = AnalysisParams::defaults(VinylType::Serato, SAMPLE_RATE);
        let result = vinyl.run_recording_data_analysis(&[0.5; 10], &[0.5; 9], &params);
        assert_eq!(result, Err(DscratchError::MismatchedBuffers { left: 10, right: 9 }));
        assert_eq!(vinyl.amplitude(), None);
    }

    #[test]
    fn test_non_finite_input_never_propagates() {
        let mut vinyl = CodedVinyl::new(VinylType::Serato);
        let params = AnalysisParams::defaults(VinylType::Serato, SAMPLE_RATE);
        let left = [f32::NAN, f32::INFINITY, 0.5, f32::NEG_INFINITY];
        let right = [0.5, 0.5, f32::NAN, f32::MAX];
        vinyl.run_recording_data_analysis(&left, &right, &params).unwrap();
        assert!(vinyl.amplitude().map_or(true, f64::is_finite));
        assert!(vinyl.speed(&params).map_or(true, f32::is_finite));
    }

    #[test]
    fn test_half_speed_and_volume_ramp() {
        let mut vinyl = CodedVinyl::new(VinylType::Serato);
        let mut generator = TimecodeGenerator::new(VinylType::Serato, Rpm::Rpm33, SAMPLE_RATE);
        let params = AnalysisParams::defaults(VinylType::Serato, SAMPLE_RATE);

        // Amplitude at half the "normal speed" threshold gives half volume
        let amplitude = params.min_amplitude_for_normal_speed * 0.5;
        let found = feed(&mut vinyl, &mut generator, &params, 0.5, amplitude, 20).unwrap();
        assert!((found.speed - 0.5).abs() < 0.0001);
        assert!((found.volume - 0.5).abs() < 0.001, "volume={}", found.volume);
    }

    #[test]
    fn test_amplify_coeff_scales_amplitude() {
        let mut vinyl = CodedVinyl::new(VinylType::Serato);
        let mut generator = TimecodeGenerator::new(VinylType::Serato, Rpm::Rpm33, SAMPLE_RATE);
        let params = AnalysisParams {
            input_amplify_coeff: 4,
            ..AnalysisParams::defaults(VinylType::Serato, SAMPLE_RATE)
        };
        feed(&mut vinyl, &mut generator, &params, 1.0, 0.02, 4);
        assert!((vinyl.amplitude().unwrap() - 0.08).abs() < 1e-4);
    }

    #[test]
    fn test_long_session_rebases_phase() {
        let mut vinyl = CodedVinyl::new(VinylType::Mixvibes);
        let mut generator = TimecodeGenerator::new(VinylType::Mixvibes, Rpm::Rpm45, SAMPLE_RATE);
        let params = AnalysisParams {
            rpm: Rpm::Rpm45,
            ..AnalysisParams::defaults(VinylType::Mixvibes, SAMPLE_RATE)
        };
        // 1755 Hz * 2π ≈ 11027 rad/s: crosses the rebase limit after ~90s
        let found = feed(&mut vinyl, &mut generator, &params, 1.0, 0.3, 8200).unwrap();
        assert!((found.speed - 1.0).abs() < 0.0001, "speed={}", found.speed);
        assert!(vinyl.unwrapper.offset().abs() < PHASE_REBASE_LIMIT + TAU);
    }
}
