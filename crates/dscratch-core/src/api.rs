//! Engine API
//!
//! [`DscratchEngine`] owns the turntable registry and is the single entry
//! point used by the C boundary, the control process and the tools. Every
//! per-turntable call takes the handle first and fails with
//! [`DscratchError::InvalidHandle`] when it does not designate a live
//! turntable.
//!
//! Analysis calls are meant for the audio thread: they do not allocate, log
//! or wait. Configuration calls may come from any other thread at any time;
//! they only touch per-turntable atomics, so changing one deck never stalls
//! the analysis of another.

use crate::config::TurntableConfig;
use crate::engine::{TurntableHandle, TurntableInfo, TurntableRegistry, Turntable};
use crate::error::{DscratchError, DscratchResult};
use crate::types::{PlayingParameters, MAX_TURNTABLES};
use crate::vinyl::{Rpm, VinylType, DEFAULT_RPM};

/// Engine version string
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub fn vinyl_name(vinyl: VinylType) -> &'static str {
    vinyl.name()
}

pub fn default_vinyl_type() -> VinylType {
    VinylType::default()
}

pub fn default_rpm() -> Rpm {
    DEFAULT_RPM
}

/// Amplify coefficient of the default vinyl type
pub fn default_input_amplify_coeff() -> i32 {
    default_vinyl_type().default_input_amplify_coeff()
}

/// Noise floor of the default vinyl type
pub fn default_min_amplitude() -> f32 {
    default_vinyl_type().default_min_amplitude()
}

/// Full-volume threshold of the default vinyl type
pub fn default_min_amplitude_for_normal_speed() -> f32 {
    default_vinyl_type().default_min_amplitude_for_normal_speed()
}

pub fn default_input_amplify_coeff_from_vinyl_type(vinyl: VinylType) -> i32 {
    vinyl.default_input_amplify_coeff()
}

pub fn default_min_amplitude_from_vinyl_type(vinyl: VinylType) -> f32 {
    vinyl.default_min_amplitude()
}

pub fn default_min_amplitude_for_normal_speed_from_vinyl_type(vinyl: VinylType) -> f32 {
    vinyl.default_min_amplitude_for_normal_speed()
}

/// Timecode decoding engine
#[derive(Debug, Default)]
pub struct DscratchEngine {
    registry: TurntableRegistry,
}

impl DscratchEngine {
    pub fn new() -> Self {
        Self::with_capacity(MAX_TURNTABLES)
    }

    /// Engine able to hold up to `capacity` simultaneous turntables
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            registry: TurntableRegistry::new(capacity),
        }
    }

    fn with<R>(&self, handle: TurntableHandle, f: impl FnOnce(&Turntable) -> R) -> DscratchResult<R> {
        self.registry.with(handle, f)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────

    /// Create a turntable named `turntable_<handle>`
    pub fn create_turntable(
        &self,
        vinyl: VinylType,
        sample_rate: u32,
    ) -> DscratchResult<TurntableHandle> {
        self.insert(None, vinyl, sample_rate)
    }

    pub fn create_named_turntable(
        &self,
        name: &str,
        vinyl: VinylType,
        sample_rate: u32,
    ) -> DscratchResult<TurntableHandle> {
        self.insert(Some(name), vinyl, sample_rate)
    }

    fn insert(
        &self,
        name: Option<&str>,
        vinyl: VinylType,
        sample_rate: u32,
    ) -> DscratchResult<TurntableHandle> {
        let handle = self.registry.insert(|handle| {
            let name = match name {
                Some(name) => name.to_string(),
                None => format!("turntable_{}", handle),
            };
            Turntable::new(handle, name, vinyl, sample_rate)
        })?;
        log::info!(
            "Created turntable {} ({}, {}Hz)",
            handle,
            vinyl,
            sample_rate
        );
        Ok(handle)
    }

    /// Delete a turntable; its handle becomes available again
    pub fn delete_turntable(&self, handle: TurntableHandle) -> DscratchResult<()> {
        self.registry.remove(handle)?;
        log::info!("Deleted turntable {}", handle);
        Ok(())
    }

    pub fn number_of_turntables(&self) -> usize {
        self.registry.len()
    }

    pub fn turntable_handles(&self) -> Vec<TurntableHandle> {
        self.registry.handles()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Analysis
    // ─────────────────────────────────────────────────────────────────────

    /// Analyze one buffer captured on the turntable's two timecode channels
    pub fn analyze_recorded_data(
        &self,
        handle: TurntableHandle,
        left: &[f32],
        right: &[f32],
    ) -> DscratchResult<()> {
        self.with(handle, |t| t.analyze(left, right))?.map(|_| ())
    }

    /// Analyze one interleaved capture buffer of `channels` samples per frame
    pub fn analyze_recorded_data_interleaved(
        &self,
        handle: TurntableHandle,
        channels: usize,
        left_index: usize,
        right_index: usize,
        data: &[f32],
    ) -> DscratchResult<()> {
        self.with(handle, |t| {
            t.analyze_interleaved(channels, left_index, right_index, data)
        })?
        .map(|_| ())
    }

    /// Speed and volume from the last analysis, `Ok(None)` when no motion
    /// was detected
    pub fn playing_parameters(
        &self,
        handle: TurntableHandle,
    ) -> DscratchResult<Option<PlayingParameters>> {
        self.with(handle, Turntable::playing_parameters)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Introspection
    // ─────────────────────────────────────────────────────────────────────

    pub fn turntable_name(&self, handle: TurntableHandle) -> DscratchResult<String> {
        self.with(handle, |t| t.name().to_string())
    }

    pub fn turntable_info(&self, handle: TurntableHandle) -> DscratchResult<TurntableInfo> {
        self.with(handle, Turntable::info)
    }

    /// Human-readable dump of a turntable, for diagnostics
    pub fn display_turntable(&self, handle: TurntableHandle) -> DscratchResult<String> {
        self.turntable_info(handle).map(|info| info.to_string())
    }

    pub fn is_reverse_direction(&self, handle: TurntableHandle) -> DscratchResult<bool> {
        self.with(handle, Turntable::is_reverse_direction)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Configuration
    // ─────────────────────────────────────────────────────────────────────

    pub fn vinyl_type(&self, handle: TurntableHandle) -> DscratchResult<VinylType> {
        self.with(handle, Turntable::vinyl_type)
    }

    /// Switch format in place: analysis restarts from scratch and the
    /// format's default thresholds and amplify coefficient are restored
    pub fn change_vinyl_type(&self, handle: TurntableHandle, vinyl: VinylType) -> DscratchResult<()> {
        self.with(handle, |t| t.change_vinyl(vinyl))?;
        log::info!("Turntable {} switched to {}", handle, vinyl);
        Ok(())
    }

    pub fn rpm(&self, handle: TurntableHandle) -> DscratchResult<Rpm> {
        self.with(handle, Turntable::rpm)
    }

    /// Unsupported values select the default RPM and return an error
    pub fn set_rpm(&self, handle: TurntableHandle, rpm: u16) -> DscratchResult<()> {
        self.with(handle, |t| t.set_rpm(rpm))??;
        log::debug!("Turntable {} rpm = {}", handle, rpm);
        Ok(())
    }

    pub fn sample_rate(&self, handle: TurntableHandle) -> DscratchResult<u32> {
        self.with(handle, Turntable::sample_rate)
    }

    pub fn set_sample_rate(&self, handle: TurntableHandle, sample_rate: u32) -> DscratchResult<()> {
        self.with(handle, |t| t.set_sample_rate(sample_rate))??;
        log::debug!("Turntable {} sample rate = {}Hz", handle, sample_rate);
        Ok(())
    }

    pub fn input_amplify_coeff(&self, handle: TurntableHandle) -> DscratchResult<i32> {
        self.with(handle, Turntable::input_amplify_coeff)
    }

    pub fn set_input_amplify_coeff(&self, handle: TurntableHandle, coeff: i32) -> DscratchResult<()> {
        self.with(handle, |t| t.set_input_amplify_coeff(coeff))??;
        log::debug!("Turntable {} input amplify coeff = {}", handle, coeff);
        Ok(())
    }

    pub fn min_amplitude(&self, handle: TurntableHandle) -> DscratchResult<f32> {
        self.with(handle, Turntable::min_amplitude)
    }

    pub fn set_min_amplitude(&self, handle: TurntableHandle, amplitude: f32) -> DscratchResult<()> {
        self.with(handle, |t| t.set_min_amplitude(amplitude))??;
        log::debug!("Turntable {} min amplitude = {}", handle, amplitude);
        Ok(())
    }

    pub fn min_amplitude_for_normal_speed(&self, handle: TurntableHandle) -> DscratchResult<f32> {
        self.with(handle, Turntable::min_amplitude_for_normal_speed)
    }

    pub fn set_min_amplitude_for_normal_speed(
        &self,
        handle: TurntableHandle,
        amplitude: f32,
    ) -> DscratchResult<()> {
        self.with(handle, |t| t.set_min_amplitude_for_normal_speed(amplitude))??;
        log::debug!(
            "Turntable {} min amplitude for normal speed = {}",
            handle,
            amplitude
        );
        Ok(())
    }

    /// Apply stored settings to a live turntable
    ///
    /// The whole config is validated before anything changes. A format change
    /// is applied first so the overrides are not replaced by its defaults.
    pub fn apply_config(&self, handle: TurntableHandle, config: &TurntableConfig) -> DscratchResult<()> {
        config.validate()?;
        self.with(handle, |t| -> DscratchResult<()> {
            if t.vinyl_type() != config.vinyl_type {
                t.change_vinyl(config.vinyl_type);
            }
            t.set_rpm(config.rpm.value())?;
            t.set_input_amplify_coeff(config.input_amplify_coeff())?;
            t.set_min_amplitude(config.min_amplitude())?;
            t.set_min_amplitude_for_normal_speed(config.min_amplitude_for_normal_speed())
        })??;
        log::info!(
            "Turntable {} configured: {} at {} rpm",
            handle,
            config.vinyl_type,
            config.rpm
        );
        Ok(())
    }
}

/// Parse a raw vinyl ordinal as the C API passes it
pub fn vinyl_type_from_raw(raw: i32) -> DscratchResult<VinylType> {
    VinylType::from_index(i64::from(raw)).ok_or(DscratchError::UnknownVinylType(i64::from(raw)))
}
