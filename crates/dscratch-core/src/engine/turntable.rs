//! One turntable: settings block + timecode analyzer
//!
//! Settings are single-word atomics so the control thread can change them
//! while the audio thread analyzes; a change is picked up by the next
//! analysis call. The analyzer itself is only ever touched by the thread
//! currently analyzing, through a `try_lock` that never waits.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU16, AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::sync::{Mutex, MutexGuard, TryLockError};

use atomic_float::AtomicF32;
use serde::{Deserialize, Serialize};

use crate::error::{DscratchError, DscratchResult};
use crate::types::PlayingParameters;
use crate::vinyl::{AnalysisParams, CodedVinyl, Rpm, VinylType, DEFAULT_RPM};

/// Opaque identifier of a live turntable (its registry slot index)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TurntableHandle(usize);

impl TurntableHandle {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Registry slot index
    pub fn index(self) -> usize {
        self.0
    }

    /// Value handed across the C boundary
    pub fn as_raw(self) -> i32 {
        self.0 as i32
    }
}

impl TryFrom<i32> for TurntableHandle {
    type Error = DscratchError;

    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        usize::try_from(raw)
            .map(Self)
            .map_err(|_| DscratchError::InvalidRawHandle(i64::from(raw)))
    }
}

impl fmt::Display for TurntableHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Analysis state owned by whichever thread analyzes this turntable
#[derive(Debug)]
struct Analyzer {
    coded_vinyl: CodedVinyl,
    /// Reset generation the filters were built for
    generation: u32,
}

/// A turntable playing a timecoded vinyl
#[derive(Debug)]
pub struct Turntable {
    handle: TurntableHandle,
    name: String,

    vinyl: AtomicU8,
    rpm: AtomicU16,
    sample_rate: AtomicU32,
    input_amplify_coeff: AtomicI32,
    min_amplitude: AtomicF32,
    min_amplitude_for_normal_speed: AtomicF32,
    /// Bumped by every change that invalidates the filter history
    reset_generation: AtomicU32,

    /// Last result, packed by `PlayingParameters::pack`
    output: AtomicU64,
    reverse_direction: AtomicBool,

    analyzer: Mutex<Analyzer>,
}

impl Turntable {
    pub fn new(
        handle: TurntableHandle,
        name: impl Into<String>,
        vinyl: VinylType,
        sample_rate: u32,
    ) -> DscratchResult<Self> {
        if sample_rate == 0 {
            return Err(DscratchError::InvalidSampleRate(sample_rate));
        }
        Ok(Self {
            handle,
            name: name.into(),
            vinyl: AtomicU8::new(vinyl.index()),
            rpm: AtomicU16::new(DEFAULT_RPM.value()),
            sample_rate: AtomicU32::new(sample_rate),
            input_amplify_coeff: AtomicI32::new(vinyl.default_input_amplify_coeff()),
            min_amplitude: AtomicF32::new(vinyl.default_min_amplitude()),
            min_amplitude_for_normal_speed: AtomicF32::new(
                vinyl.default_min_amplitude_for_normal_speed(),
            ),
            reset_generation: AtomicU32::new(0),
            output: AtomicU64::new(PlayingParameters::pack(None)),
            reverse_direction: AtomicBool::new(false),
            analyzer: Mutex::new(Analyzer {
                coded_vinyl: CodedVinyl::new(vinyl),
                generation: 0,
            }),
        })
    }

    pub fn handle(&self) -> TurntableHandle {
        self.handle
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // ─────────────────────────────────────────────────────────────────────
    // Analysis (audio thread)
    // ─────────────────────────────────────────────────────────────────────

    /// Analyze one buffer of separate left/right samples
    ///
    /// Returns the playing parameters found for this buffer, which are also
    /// published for [`playing_parameters`](Self::playing_parameters).
    /// Buffers of different lengths are rejected without touching any state.
    pub fn analyze(&self, left: &[f32], right: &[f32]) -> DscratchResult<Option<PlayingParameters>> {
        self.analyze_with(|vinyl, params| vinyl.run_recording_data_analysis(left, right, params))
    }

    /// Analyze one interleaved buffer of `channels` samples per frame, the
    /// timecode being on `left_index` and `right_index`
    pub fn analyze_interleaved(
        &self,
        channels: usize,
        left_index: usize,
        right_index: usize,
        data: &[f32],
    ) -> DscratchResult<Option<PlayingParameters>> {
        if channels == 0
            || left_index >= channels
            || right_index >= channels
            || data.len() % channels != 0
        {
            return Err(DscratchError::InvalidInterleavedLayout {
                channels,
                left: left_index,
                right: right_index,
                samples: data.len(),
            });
        }
        self.analyze_with(|vinyl, params| {
            vinyl.analyze_frames(
                data.chunks_exact(channels)
                    .map(|frame| (frame[left_index], frame[right_index])),
                params,
            );
            Ok(())
        })
    }

    fn analyze_with<F>(&self, run: F) -> DscratchResult<Option<PlayingParameters>>
    where
        F: FnOnce(&mut CodedVinyl, &AnalysisParams) -> DscratchResult<()>,
    {
        let mut analyzer = self.lock_analyzer()?;

        let generation = self.reset_generation.load(Ordering::Acquire);
        let vinyl = self.vinyl_type();
        if analyzer.generation != generation || analyzer.coded_vinyl.vinyl_type() != vinyl {
            analyzer.coded_vinyl.reset(vinyl);
            analyzer.generation = generation;
        }

        let params = self.analysis_params();
        run(&mut analyzer.coded_vinyl, &params)?;

        let found = analyzer.coded_vinyl.playing_parameters(&params);
        // Settings invalidated while this buffer was analyzed: the result
        // belongs to the old format or rate and is dropped
        if self.reset_generation.load(Ordering::Acquire) != generation {
            return Ok(None);
        }
        self.reverse_direction
            .store(analyzer.coded_vinyl.is_reverse_direction(), Ordering::Relaxed);
        self.output.store(PlayingParameters::pack(found), Ordering::Release);
        Ok(found)
    }

    fn lock_analyzer(&self) -> DscratchResult<MutexGuard<'_, Analyzer>> {
        match self.analyzer.try_lock() {
            Ok(guard) => Ok(guard),
            Err(TryLockError::WouldBlock) => Err(DscratchError::AnalysisBusy(self.handle)),
            // A panic mid-analysis leaves filters in a usable (if noisy) state
            Err(TryLockError::Poisoned(poisoned)) => Ok(poisoned.into_inner()),
        }
    }

    fn analysis_params(&self) -> AnalysisParams {
        AnalysisParams {
            sample_rate: self.sample_rate(),
            rpm: self.rpm(),
            input_amplify_coeff: self.input_amplify_coeff(),
            min_amplitude: self.min_amplitude(),
            min_amplitude_for_normal_speed: self.min_amplitude_for_normal_speed(),
        }
    }

    /// Result of the last analysis, `None` if no motion was detected
    pub fn playing_parameters(&self) -> Option<PlayingParameters> {
        PlayingParameters::unpack(self.output.load(Ordering::Acquire))
    }

    pub fn is_reverse_direction(&self) -> bool {
        self.reverse_direction.load(Ordering::Relaxed)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Settings (control thread)
    // ─────────────────────────────────────────────────────────────────────

    pub fn vinyl_type(&self) -> VinylType {
        VinylType::from_index(i64::from(self.vinyl.load(Ordering::Acquire))).unwrap_or_default()
    }

    /// Switch vinyl format without recreating the turntable
    ///
    /// Restores the format's default thresholds and amplify coefficient and
    /// discards the filter history on the next analysis call.
    pub fn change_vinyl(&self, vinyl: VinylType) {
        self.input_amplify_coeff
            .store(vinyl.default_input_amplify_coeff(), Ordering::Relaxed);
        self.min_amplitude
            .store(vinyl.default_min_amplitude(), Ordering::Relaxed);
        self.min_amplitude_for_normal_speed
            .store(vinyl.default_min_amplitude_for_normal_speed(), Ordering::Relaxed);
        self.vinyl.store(vinyl.index(), Ordering::Release);
        self.invalidate();
    }

    pub fn rpm(&self) -> Rpm {
        Rpm::from_value(self.rpm.load(Ordering::Relaxed)).unwrap_or(DEFAULT_RPM)
    }

    /// Set the disc speed; an unsupported value selects the default RPM and
    /// is reported as an error
    pub fn set_rpm(&self, rpm: u16) -> DscratchResult<()> {
        match Rpm::try_from(rpm) {
            Ok(rpm) => {
                self.rpm.store(rpm.value(), Ordering::Relaxed);
                Ok(())
            }
            Err(e) => {
                self.rpm.store(DEFAULT_RPM.value(), Ordering::Relaxed);
                Err(e)
            }
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate.load(Ordering::Relaxed)
    }

    /// Change the capture sample rate; filter history is discarded
    pub fn set_sample_rate(&self, sample_rate: u32) -> DscratchResult<()> {
        if sample_rate == 0 {
            return Err(DscratchError::InvalidSampleRate(sample_rate));
        }
        if self.sample_rate.swap(sample_rate, Ordering::Release) != sample_rate {
            self.invalidate();
        }
        Ok(())
    }

    pub fn input_amplify_coeff(&self) -> i32 {
        self.input_amplify_coeff.load(Ordering::Relaxed)
    }

    pub fn set_input_amplify_coeff(&self, coeff: i32) -> DscratchResult<()> {
        if coeff < 1 {
            return Err(DscratchError::InvalidAmplifyCoeff(coeff));
        }
        self.input_amplify_coeff.store(coeff, Ordering::Relaxed);
        Ok(())
    }

    pub fn min_amplitude(&self) -> f32 {
        self.min_amplitude.load(Ordering::Relaxed)
    }

    pub fn set_min_amplitude(&self, amplitude: f32) -> DscratchResult<()> {
        validate_amplitude(amplitude)?;
        self.min_amplitude.store(amplitude, Ordering::Relaxed);
        Ok(())
    }

    pub fn min_amplitude_for_normal_speed(&self) -> f32 {
        self.min_amplitude_for_normal_speed.load(Ordering::Relaxed)
    }

    pub fn set_min_amplitude_for_normal_speed(&self, amplitude: f32) -> DscratchResult<()> {
        validate_amplitude(amplitude)?;
        self.min_amplitude_for_normal_speed
            .store(amplitude, Ordering::Relaxed);
        Ok(())
    }

    /// Drop the filter history and the published result
    fn invalidate(&self) {
        self.reset_generation.fetch_add(1, Ordering::Release);
        self.output
            .store(PlayingParameters::pack(None), Ordering::Release);
    }

    /// Snapshot of settings and last result, for diagnostics
    pub fn info(&self) -> TurntableInfo {
        let vinyl = self.vinyl_type();
        TurntableInfo {
            handle: self.handle,
            name: self.name.clone(),
            vinyl_type: vinyl,
            vinyl_name: vinyl.name().to_string(),
            rpm: self.rpm().value(),
            sample_rate: self.sample_rate(),
            input_amplify_coeff: self.input_amplify_coeff(),
            min_amplitude: self.min_amplitude(),
            min_amplitude_for_normal_speed: self.min_amplitude_for_normal_speed(),
            reverse_direction: self.is_reverse_direction(),
            playing_parameters: self.playing_parameters(),
        }
    }
}

fn validate_amplitude(amplitude: f32) -> DscratchResult<()> {
    if amplitude.is_finite() && amplitude > 0.0 {
        Ok(())
    } else {
        Err(DscratchError::InvalidAmplitude(amplitude))
    }
}

/// Human-readable turntable state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurntableInfo {
    pub handle: TurntableHandle,
    pub name: String,
    pub vinyl_type: VinylType,
    pub vinyl_name: String,
    pub rpm: u16,
    pub sample_rate: u32,
    pub input_amplify_coeff: i32,
    pub min_amplitude: f32,
    pub min_amplitude_for_normal_speed: f32,
    pub reverse_direction: bool,
    pub playing_parameters: Option<PlayingParameters>,
}

impl fmt::Display for TurntableInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "turntable {} ({})", self.handle, self.name)?;
        writeln!(f, "  vinyl:                          {}", self.vinyl_name)?;
        writeln!(f, "  rpm:                            {}", self.rpm)?;
        writeln!(f, "  sample rate:                    {} Hz", self.sample_rate)?;
        writeln!(f, "  input amplify coeff:            {}", self.input_amplify_coeff)?;
        writeln!(f, "  min amplitude:                  {}", self.min_amplitude)?;
        writeln!(f, "  min amplitude for normal speed: {}", self.min_amplitude_for_normal_speed)?;
        writeln!(f, "  reverse direction:              {}", self.reverse_direction)?;
        match self.playing_parameters {
            Some(p) => write!(f, "  speed: {:.4}  volume: {:.4}", p.speed, p.volume),
            None => write!(f, "  speed: not found  volume: not found"),
        }
    }
}
