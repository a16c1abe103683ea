//! C function table
//!
//! Thin `extern "C"` wrappers over [`DscratchEngine`]. The host creates one
//! engine with [`dscratch_engine_new`] and passes it as first argument to
//! every other call. No call unwinds into C: each body runs under
//! `catch_unwind`, errors become [`DscratchStatus::Error`], and pure getters
//! return a sentinel instead:
//!
//! | getter                    | sentinel |
//! |---------------------------|----------|
//! | vinyl type                | `-1`     |
//! | rpm, sample rate          | `0`      |
//! | amplify coefficient       | `-1`     |
//! | amplitude thresholds      | `-1.0`   |
//! | name, vinyl name          | `NULL`   |

use std::ffi::{c_char, c_float, c_int, c_uint, c_ushort, CStr, CString};
use std::panic::{self, AssertUnwindSafe};
use std::ptr;
use std::slice;

use crate::api::{self, DscratchEngine};
use crate::engine::TurntableHandle;
use crate::error::{DscratchError, DscratchResult};
use crate::types::PlayingParameters;
use crate::vinyl::VinylType;

/// Status returned by every mutating call
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DscratchStatus {
    Success = 0,
    Error = 1,
}

impl<T> From<DscratchResult<T>> for DscratchStatus {
    fn from(result: DscratchResult<T>) -> Self {
        match result {
            Ok(_) => DscratchStatus::Success,
            Err(_) => DscratchStatus::Error,
        }
    }
}

const VERSION: &CStr = match CStr::from_bytes_with_nul(
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes(),
) {
    Ok(version) => version,
    Err(_) => c"unknown",
};

fn vinyl_c_name(vinyl: VinylType) -> &'static CStr {
    match vinyl {
        VinylType::FinalScratch => c"final scratch standard 2.0",
        VinylType::Serato => c"serato cv02",
        VinylType::Mixvibes => c"mixvibes dvs",
    }
}

/// Run `f`, turning a panic into `fallback`
fn guard<T>(fallback: T, f: impl FnOnce() -> T) -> T {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(_) => {
            log::error!("Panic caught at the C boundary");
            fallback
        }
    }
}

/// Run `f` on the engine behind `engine`, as a status
///
/// # Safety
/// `engine` must be null or come from [`dscratch_engine_new`] and not be freed.
unsafe fn with_engine<T>(
    engine: *const DscratchEngine,
    f: impl FnOnce(&DscratchEngine) -> DscratchResult<T>,
) -> DscratchResult<T> {
    // SAFETY: guaranteed by the caller
    match unsafe { engine.as_ref() } {
        Some(engine) => f(engine),
        None => Err(DscratchError::NullPointer("engine")),
    }
}

/// Same as [`with_engine`] for a per-turntable call taking a raw handle
///
/// # Safety
/// See [`with_engine`].
unsafe fn with_turntable<T>(
    engine: *const DscratchEngine,
    handle: c_int,
    f: impl FnOnce(&DscratchEngine, TurntableHandle) -> DscratchResult<T>,
) -> DscratchResult<T> {
    let handle = TurntableHandle::try_from(handle)?;
    // SAFETY: guaranteed by the caller
    unsafe { with_engine(engine, |engine| f(engine, handle)) }
}

/// Build a slice from a C buffer; a null pointer is only allowed when empty
///
/// # Safety
/// A non-null `data` must point to `len` readable floats.
unsafe fn samples<'a>(data: *const c_float, len: usize, what: &'static str) -> DscratchResult<&'a [f32]> {
    if len == 0 {
        return Ok(&[]);
    }
    if data.is_null() {
        return Err(DscratchError::NullPointer(what));
    }
    // SAFETY: guaranteed by the caller
    Ok(unsafe { slice::from_raw_parts(data, len) })
}

fn count(value: c_int, what: &'static str) -> DscratchResult<usize> {
    usize::try_from(value).map_err(|_| DscratchError::InvalidArgument(what))
}

// ─────────────────────────────────────────────────────────────────────────────
// Engine lifecycle
// ─────────────────────────────────────────────────────────────────────────────

/// Create an engine; release it with [`dscratch_engine_free`]
#[no_mangle]
pub extern "C" fn dscratch_engine_new() -> *mut DscratchEngine {
    guard(ptr::null_mut(), || Box::into_raw(Box::new(DscratchEngine::new())))
}

/// Free an engine and every turntable it still holds
///
/// # Safety
/// `engine` must be null or come from [`dscratch_engine_new`], and must not be
/// used afterwards.
#[no_mangle]
pub unsafe extern "C" fn dscratch_engine_free(engine: *mut DscratchEngine) {
    if engine.is_null() {
        return;
    }
    guard((), || {
        // SAFETY: guaranteed by the caller
        drop(unsafe { Box::from_raw(engine) });
    })
}

/// Engine version, a static string
#[no_mangle]
pub extern "C" fn dscratch_get_version() -> *const c_char {
    VERSION.as_ptr()
}

// ─────────────────────────────────────────────────────────────────────────────
// Turntables
// ─────────────────────────────────────────────────────────────────────────────

/// Create a turntable and write its handle to `turntable_handle`
///
/// # Safety
/// `engine` as for [`dscratch_engine_free`]; `turntable_handle` must be null
/// or writable.
#[no_mangle]
pub unsafe extern "C" fn dscratch_create_turntable(
    engine: *const DscratchEngine,
    vinyl_type: c_int,
    sample_rate: c_uint,
    turntable_handle: *mut c_int,
) -> DscratchStatus {
    guard(DscratchStatus::Error, || {
        if turntable_handle.is_null() {
            return DscratchStatus::Error;
        }
        let result = unsafe {
            with_engine(engine, |engine| {
                engine.create_turntable(api::vinyl_type_from_raw(vinyl_type)?, sample_rate)
            })
        };
        match result {
            Ok(handle) => {
                // SAFETY: checked non-null above, writable per contract
                unsafe { *turntable_handle = handle.as_raw() };
                DscratchStatus::Success
            }
            Err(_) => DscratchStatus::Error,
        }
    })
}

/// Same as [`dscratch_create_turntable`] with an explicit name
///
/// # Safety
/// As [`dscratch_create_turntable`]; `name` must be a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn dscratch_create_named_turntable(
    engine: *const DscratchEngine,
    name: *const c_char,
    vinyl_type: c_int,
    sample_rate: c_uint,
    turntable_handle: *mut c_int,
) -> DscratchStatus {
    guard(DscratchStatus::Error, || {
        if name.is_null() || turntable_handle.is_null() {
            return DscratchStatus::Error;
        }
        // SAFETY: non-null, NUL-terminated per contract
        let name = unsafe { CStr::from_ptr(name) }.to_string_lossy();
        let result = unsafe {
            with_engine(engine, |engine| {
                engine.create_named_turntable(
                    &name,
                    api::vinyl_type_from_raw(vinyl_type)?,
                    sample_rate,
                )
            })
        };
        match result {
            Ok(handle) => {
                // SAFETY: checked non-null above
                unsafe { *turntable_handle = handle.as_raw() };
                DscratchStatus::Success
            }
            Err(_) => DscratchStatus::Error,
        }
    })
}

/// # Safety
/// `engine` as for [`dscratch_engine_free`].
#[no_mangle]
pub unsafe extern "C" fn dscratch_delete_turntable(
    engine: *const DscratchEngine,
    turntable_handle: c_int,
) -> DscratchStatus {
    guard(DscratchStatus::Error, || {
        let result = unsafe { with_turntable(engine, turntable_handle, |e, h| e.delete_turntable(h)) };
        result.into()
    })
}

/// # Safety
/// `engine` as for [`dscratch_engine_free`].
#[no_mangle]
pub unsafe extern "C" fn dscratch_get_number_of_turntables(engine: *const DscratchEngine) -> c_uint {
    guard(0, || {
        let result = unsafe { with_engine(engine, |e| Ok(e.number_of_turntables() as c_uint)) };
        result.unwrap_or(0)
    })
}

/// Name of a turntable, to release with [`dscratch_free_string`]; NULL on error
///
/// # Safety
/// `engine` as for [`dscratch_engine_free`].
#[no_mangle]
pub unsafe extern "C" fn dscratch_get_turntable_name(
    engine: *const DscratchEngine,
    turntable_handle: c_int,
) -> *mut c_char {
    guard(ptr::null_mut(), || {
        let result = unsafe { with_turntable(engine, turntable_handle, |e, h| e.turntable_name(h)) };
        result.ok()
            .and_then(|name| CString::new(name).ok())
            .map_or(ptr::null_mut(), CString::into_raw)
    })
}

/// Release a string returned by this library
///
/// # Safety
/// `string` must be null or come from a call documented as needing this.
#[no_mangle]
pub unsafe extern "C" fn dscratch_free_string(string: *mut c_char) {
    if string.is_null() {
        return;
    }
    guard((), || {
        // SAFETY: allocated by CString::into_raw per contract
        drop(unsafe { CString::from_raw(string) });
    })
}

/// Print the state of a turntable on stdout
///
/// # Safety
/// `engine` as for [`dscratch_engine_free`].
#[no_mangle]
pub unsafe extern "C" fn dscratch_display_turntable(
    engine: *const DscratchEngine,
    turntable_handle: c_int,
) -> DscratchStatus {
    guard(DscratchStatus::Error, || {
        let result = unsafe {
            with_turntable(engine, turntable_handle, |e, h| e.display_turntable(h))
        };
        match result {
            Ok(text) => {
                println!("{text}");
                DscratchStatus::Success
            }
            Err(_) => DscratchStatus::Error,
        }
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Analysis
// ─────────────────────────────────────────────────────────────────────────────

/// Analyze `nb_frames` frames captured on two separate channels
///
/// # Safety
/// `engine` as for [`dscratch_engine_free`]; `left` and `right` must each
/// point to `nb_frames` floats.
#[no_mangle]
pub unsafe extern "C" fn dscratch_analyze_recorded_datas(
    engine: *const DscratchEngine,
    turntable_handle: c_int,
    left: *const c_float,
    right: *const c_float,
    nb_frames: c_int,
) -> DscratchStatus {
    guard(DscratchStatus::Error, || {
        let result = unsafe {
            with_turntable(engine, turntable_handle, |e, h| {
                let frames = count(nb_frames, "nb_frames")?;
                let left = samples(left, frames, "left")?;
                let right = samples(right, frames, "right")?;
                e.analyze_recorded_data(h, left, right)
            })
        };
        result.into()
    })
}

/// Analyze `nb_frames` interleaved frames of `nb_channels` samples, the
/// timecode being on channels `left_index` and `right_index`
///
/// # Safety
/// `engine` as for [`dscratch_engine_free`]; `data` must point to
/// `nb_frames * nb_channels` floats.
#[no_mangle]
pub unsafe extern "C" fn dscratch_analyze_recorded_datas_interleaved(
    engine: *const DscratchEngine,
    turntable_handle: c_int,
    nb_channels: c_int,
    left_index: c_int,
    right_index: c_int,
    data: *const c_float,
    nb_frames: c_int,
) -> DscratchStatus {
    guard(DscratchStatus::Error, || {
        let result = unsafe {
            with_turntable(engine, turntable_handle, |e, h| {
                let channels = count(nb_channels, "nb_channels")?;
                let total = count(nb_frames, "nb_frames")?
                    .checked_mul(channels)
                    .ok_or(DscratchError::InvalidArgument("nb_frames * nb_channels"))?;
                let data = samples(data, total, "data")?;
                e.analyze_recorded_data_interleaved(
                    h,
                    channels,
                    count(left_index, "left_index")?,
                    count(right_index, "right_index")?,
                    data,
                )
            })
        };
        result.into()
    })
}

/// Write the last detected speed and volume
///
/// Returns `Error` with `-99.0` in both outputs when no motion was detected.
///
/// # Safety
/// `engine` as for [`dscratch_engine_free`]; `speed` and `volume` must be
/// writable.
#[no_mangle]
pub unsafe extern "C" fn dscratch_get_playing_parameters(
    engine: *const DscratchEngine,
    turntable_handle: c_int,
    speed: *mut c_float,
    volume: *mut c_float,
) -> DscratchStatus {
    guard(DscratchStatus::Error, || {
        if speed.is_null() || volume.is_null() {
            return DscratchStatus::Error;
        }
        let found = unsafe {
            with_turntable(engine, turntable_handle, |e, h| e.playing_parameters(h))
        }
        .ok()
        .flatten();
        let (s, v) = PlayingParameters::or_sentinels(found);
        // SAFETY: checked non-null above
        unsafe {
            *speed = s;
            *volume = v;
        }
        if found.is_some() {
            DscratchStatus::Success
        } else {
            DscratchStatus::Error
        }
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Settings
// ─────────────────────────────────────────────────────────────────────────────

/// # Safety
/// `engine` as for [`dscratch_engine_free`].
#[no_mangle]
pub unsafe extern "C" fn dscratch_get_vinyl_type(
    engine: *const DscratchEngine,
    turntable_handle: c_int,
) -> c_int {
    guard(-1, || {
        let result = unsafe { with_turntable(engine, turntable_handle, |e, h| e.vinyl_type(h)) };
        result.map_or(-1, |v| c_int::from(v.index()))
    })
}

/// # Safety
/// `engine` as for [`dscratch_engine_free`].
#[no_mangle]
pub unsafe extern "C" fn dscratch_change_vinyl_type(
    engine: *const DscratchEngine,
    turntable_handle: c_int,
    vinyl_type: c_int,
) -> DscratchStatus {
    guard(DscratchStatus::Error, || {
        let result = unsafe {
            with_turntable(engine, turntable_handle, |e, h| {
                e.change_vinyl_type(h, api::vinyl_type_from_raw(vinyl_type)?)
            })
        };
        result.into()
    })
}

/// # Safety
/// `engine` as for [`dscratch_engine_free`].
#[no_mangle]
pub unsafe extern "C" fn dscratch_get_rpm(
    engine: *const DscratchEngine,
    turntable_handle: c_int,
) -> c_ushort {
    guard(0, || {
        let result = unsafe { with_turntable(engine, turntable_handle, |e, h| e.rpm(h)) };
        result.map_or(0, |rpm| rpm.value())
    })
}

/// Unsupported values select the default RPM and return `Error`
///
/// # Safety
/// `engine` as for [`dscratch_engine_free`].
#[no_mangle]
pub unsafe extern "C" fn dscratch_set_rpm(
    engine: *const DscratchEngine,
    turntable_handle: c_int,
    rpm: c_ushort,
) -> DscratchStatus {
    guard(DscratchStatus::Error, || {
        let result = unsafe { with_turntable(engine, turntable_handle, |e, h| e.set_rpm(h, rpm)) };
        result.into()
    })
}

/// # Safety
/// `engine` as for [`dscratch_engine_free`].
#[no_mangle]
pub unsafe extern "C" fn dscratch_get_sample_rate(
    engine: *const DscratchEngine,
    turntable_handle: c_int,
) -> c_uint {
    guard(0, || {
        let result = unsafe { with_turntable(engine, turntable_handle, |e, h| e.sample_rate(h)) };
        result.unwrap_or(0)
    })
}

/// # Safety
/// `engine` as for [`dscratch_engine_free`].
#[no_mangle]
pub unsafe extern "C" fn dscratch_set_sample_rate(
    engine: *const DscratchEngine,
    turntable_handle: c_int,
    sample_rate: c_uint,
) -> DscratchStatus {
    guard(DscratchStatus::Error, || {
        let result = unsafe {
            with_turntable(engine, turntable_handle, |e, h| e.set_sample_rate(h, sample_rate))
        };
        result.into()
    })
}

/// # Safety
/// `engine` as for [`dscratch_engine_free`].
#[no_mangle]
pub unsafe extern "C" fn dscratch_get_input_amplify_coeff(
    engine: *const DscratchEngine,
    turntable_handle: c_int,
) -> c_int {
    guard(-1, || {
        let result = unsafe { with_turntable(engine, turntable_handle, |e, h| e.input_amplify_coeff(h)) };
        result.unwrap_or(-1)
    })
}

/// # Safety
/// `engine` as for [`dscratch_engine_free`].
#[no_mangle]
pub unsafe extern "C" fn dscratch_set_input_amplify_coeff(
    engine: *const DscratchEngine,
    turntable_handle: c_int,
    coeff: c_int,
) -> DscratchStatus {
    guard(DscratchStatus::Error, || {
        let result = unsafe {
            with_turntable(engine, turntable_handle, |e, h| e.set_input_amplify_coeff(h, coeff))
        };
        result.into()
    })
}

/// # Safety
/// `engine` as for [`dscratch_engine_free`].
#[no_mangle]
pub unsafe extern "C" fn dscratch_get_min_amplitude(
    engine: *const DscratchEngine,
    turntable_handle: c_int,
) -> c_float {
    guard(-1.0, || {
        let result = unsafe { with_turntable(engine, turntable_handle, |e, h| e.min_amplitude(h)) };
        result.unwrap_or(-1.0)
    })
}

/// # Safety
/// `engine` as for [`dscratch_engine_free`].
#[no_mangle]
pub unsafe extern "C" fn dscratch_set_min_amplitude(
    engine: *const DscratchEngine,
    turntable_handle: c_int,
    amplitude: c_float,
) -> DscratchStatus {
    guard(DscratchStatus::Error, || {
        let result = unsafe {
            with_turntable(engine, turntable_handle, |e, h| e.set_min_amplitude(h, amplitude))
        };
        result.into()
    })
}

/// # Safety
/// `engine` as for [`dscratch_engine_free`].
#[no_mangle]
pub unsafe extern "C" fn dscratch_get_min_amplitude_for_normal_speed(
    engine: *const DscratchEngine,
    turntable_handle: c_int,
) -> c_float {
    guard(-1.0, || {
        let result = unsafe {
            with_turntable(engine, turntable_handle, |e, h| e.min_amplitude_for_normal_speed(h))
        };
        result.unwrap_or(-1.0)
    })
}

/// # Safety
/// `engine` as for [`dscratch_engine_free`].
#[no_mangle]
pub unsafe extern "C" fn dscratch_set_min_amplitude_for_normal_speed(
    engine: *const DscratchEngine,
    turntable_handle: c_int,
    amplitude: c_float,
) -> DscratchStatus {
    guard(DscratchStatus::Error, || {
        let result = unsafe {
            with_turntable(engine, turntable_handle, |e, h| {
                e.set_min_amplitude_for_normal_speed(h, amplitude)
            })
        };
        result.into()
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Defaults (no engine needed)
// ─────────────────────────────────────────────────────────────────────────────

/// Static name of a vinyl type, NULL if unknown
#[no_mangle]
pub extern "C" fn dscratch_get_vinyl_name_from_type(vinyl_type: c_int) -> *const c_char {
    api::vinyl_type_from_raw(vinyl_type).map_or(ptr::null(), |v| vinyl_c_name(v).as_ptr())
}

#[no_mangle]
pub extern "C" fn dscratch_get_default_vinyl_type() -> c_int {
    c_int::from(api::default_vinyl_type().index())
}

#[no_mangle]
pub extern "C" fn dscratch_get_default_rpm() -> c_ushort {
    api::default_rpm().value()
}

#[no_mangle]
pub extern "C" fn dscratch_get_default_input_amplify_coeff() -> c_int {
    api::default_input_amplify_coeff()
}

#[no_mangle]
pub extern "C" fn dscratch_get_default_min_amplitude() -> c_float {
    api::default_min_amplitude()
}

#[no_mangle]
pub extern "C" fn dscratch_get_default_min_amplitude_for_normal_speed() -> c_float {
    api::default_min_amplitude_for_normal_speed()
}

#[no_mangle]
pub extern "C" fn dscratch_get_default_input_amplify_coeff_from_vinyl_type(vinyl_type: c_int) -> c_int {
    api::vinyl_type_from_raw(vinyl_type).map_or(-1, api::default_input_amplify_coeff_from_vinyl_type)
}

#[no_mangle]
pub extern "C" fn dscratch_get_default_min_amplitude_from_vinyl_type(vinyl_type: c_int) -> c_float {
    api::vinyl_type_from_raw(vinyl_type).map_or(-1.0, api::default_min_amplitude_from_vinyl_type)
}

#[no_mangle]
pub extern "C" fn dscratch_get_default_min_amplitude_for_normal_speed_from_vinyl_type(
    vinyl_type: c_int,
) -> c_float {
    api::vinyl_type_from_raw(vinyl_type)
        .map_or(-1.0, api::default_min_amplitude_for_normal_speed_from_vinyl_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NO_NEW_SPEED_FOUND, NO_NEW_VOLUME_FOUND};
    use crate::vinyl::{Rpm, TimecodeGenerator};

    struct Engine(*mut DscratchEngine);

    impl Engine {
        fn new() -> Self {
            Self(dscratch_engine_new())
        }

        fn create(&self, vinyl: c_int, sample_rate: c_uint) -> (DscratchStatus, c_int) {
            let mut handle = -1;
            let status = unsafe { dscratch_create_turntable(self.0, vinyl, sample_rate, &mut handle) };
            (status, handle)
        }
    }

    impl Drop for Engine {
        fn drop(&mut self) {
            unsafe { dscratch_engine_free(self.0) }
        }
    }

    #[test]
    fn test_create_delete_statuses() {
        let engine = Engine::new();
        assert_eq!(engine.create(1, 44100), (DscratchStatus::Success, 0));
        assert_eq!(engine.create(1, 44100), (DscratchStatus::Success, 1));
        assert_eq!(engine.create(1, 0).0, DscratchStatus::Error);
        assert_eq!(engine.create(9, 44100).0, DscratchStatus::Error);
        unsafe {
            assert_eq!(dscratch_get_number_of_turntables(engine.0), 2);
            assert_eq!(dscratch_delete_turntable(engine.0, 0), DscratchStatus::Success);
            assert_eq!(dscratch_delete_turntable(engine.0, 0), DscratchStatus::Error);
            assert_eq!(dscratch_delete_turntable(engine.0, -4), DscratchStatus::Error);
        }
        assert_eq!(engine.create(1, 44100), (DscratchStatus::Success, 0));
    }

    #[test]
    fn test_null_engine_is_an_error() {
        let mut handle = 0;
        unsafe {
            assert_eq!(
                dscratch_create_turntable(ptr::null(), 1, 44100, &mut handle),
                DscratchStatus::Error
            );
            assert_eq!(dscratch_get_rpm(ptr::null(), 0), 0);
            assert_eq!(dscratch_get_min_amplitude(ptr::null(), 0), -1.0);
            dscratch_engine_free(ptr::null_mut());
        }
    }

    #[test]
    fn test_playing_parameters_sentinels() {
        let engine = Engine::new();
        let (_, handle) = engine.create(1, 44100);
        let mut speed = 0.0;
        let mut volume = 0.0;
        let zeros = [0.0f32; 256];
        unsafe {
            assert_eq!(
                dscratch_analyze_recorded_datas(engine.0, handle, zeros.as_ptr(), zeros.as_ptr(), 256),
                DscratchStatus::Success
            );
            assert_eq!(
                dscratch_get_playing_parameters(engine.0, handle, &mut speed, &mut volume),
                DscratchStatus::Error
            );
        }
        assert_eq!(speed, NO_NEW_SPEED_FOUND);
        assert_eq!(volume, NO_NEW_VOLUME_FOUND);
    }

    #[test]
    fn test_interleaved_analysis_finds_speed() {
        let engine = Engine::new();
        let (_, handle) = engine.create(2, 44100);
        let mut generator = TimecodeGenerator::new(VinylType::Mixvibes, Rpm::Rpm33, 44100);
        let mut data = vec![0.0f32; 512 * 6];
        for _ in 0..20 {
            generator.fill_interleaved(1.0, 0.5, &mut data, 6, 4, 5);
            let status = unsafe {
                dscratch_analyze_recorded_datas_interleaved(engine.0, handle, 6, 4, 5, data.as_ptr(), 512)
            };
            assert_eq!(status, DscratchStatus::Success);
        }
        let mut speed = 0.0;
        let mut volume = 0.0;
        unsafe {
            assert_eq!(
                dscratch_get_playing_parameters(engine.0, handle, &mut speed, &mut volume),
                DscratchStatus::Success
            );
        }
        assert!((speed - 1.0).abs() < 0.0001);
        assert_eq!(volume, 1.0);
    }

    #[test]
    fn test_null_buffers_rejected() {
        let engine = Engine::new();
        let (_, handle) = engine.create(1, 44100);
        let samples = [0.0f32; 4];
        unsafe {
            assert_eq!(
                dscratch_analyze_recorded_datas(engine.0, handle, ptr::null(), samples.as_ptr(), 4),
                DscratchStatus::Error
            );
            assert_eq!(
                dscratch_analyze_recorded_datas(engine.0, handle, samples.as_ptr(), samples.as_ptr(), -1),
                DscratchStatus::Error
            );
            assert_eq!(
                dscratch_analyze_recorded_datas_interleaved(engine.0, handle, 2, 0, 3, samples.as_ptr(), 2),
                DscratchStatus::Error
            );
        }
    }

    #[test]
    fn test_settings_round_trip() {
        let engine = Engine::new();
        let (_, handle) = engine.create(1, 44100);
        unsafe {
            assert_eq!(dscratch_set_rpm(engine.0, handle, 45), DscratchStatus::Success);
            assert_eq!(dscratch_get_rpm(engine.0, handle), 45);
            assert_eq!(dscratch_set_rpm(engine.0, handle, 78), DscratchStatus::Error);
            assert_eq!(dscratch_get_rpm(engine.0, handle), 33);

            assert_eq!(dscratch_set_input_amplify_coeff(engine.0, handle, 3), DscratchStatus::Success);
            assert_eq!(dscratch_get_input_amplify_coeff(engine.0, handle), 3);

            assert_eq!(dscratch_set_min_amplitude(engine.0, handle, 0.05), DscratchStatus::Success);
            assert_eq!(dscratch_get_min_amplitude(engine.0, handle), 0.05);
            assert_eq!(dscratch_set_min_amplitude_for_normal_speed(engine.0, handle, -1.0), DscratchStatus::Error);

            assert_eq!(dscratch_change_vinyl_type(engine.0, handle, 0), DscratchStatus::Success);
            assert_eq!(dscratch_get_vinyl_type(engine.0, handle), 0);
            assert_eq!(dscratch_change_vinyl_type(engine.0, handle, 3), DscratchStatus::Error);
            assert_eq!(
                dscratch_get_min_amplitude(engine.0, handle),
                dscratch_get_default_min_amplitude_from_vinyl_type(0)
            );

            assert_eq!(dscratch_set_sample_rate(engine.0, handle, 48000), DscratchStatus::Success);
            assert_eq!(dscratch_get_sample_rate(engine.0, handle), 48000);

            assert_eq!(dscratch_get_vinyl_type(engine.0, 17), -1);
            assert_eq!(dscratch_get_sample_rate(engine.0, 17), 0);
        }
    }

    #[test]
    fn test_strings() {
        let engine = Engine::new();
        let (_, handle) = engine.create(1, 44100);
        unsafe {
            let name = dscratch_get_turntable_name(engine.0, handle);
            assert!(!name.is_null());
            assert_eq!(CStr::from_ptr(name).to_str().unwrap(), "turntable_0");
            dscratch_free_string(name);
            assert!(dscratch_get_turntable_name(engine.0, 12).is_null());

            let vinyl = dscratch_get_vinyl_name_from_type(1);
            assert_eq!(CStr::from_ptr(vinyl).to_str().unwrap(), VinylType::Serato.name());
            assert!(dscratch_get_vinyl_name_from_type(-1).is_null());

            let version = CStr::from_ptr(dscratch_get_version());
            assert_eq!(version.to_str().unwrap(), api::version());
        }
    }

    #[test]
    fn test_vinyl_c_names_match() {
        for vinyl in VinylType::ALL {
            assert_eq!(vinyl_c_name(vinyl).to_str().unwrap(), vinyl.name());
        }
    }

    #[test]
    fn test_defaults() {
        assert_eq!(dscratch_get_default_vinyl_type(), 1);
        assert_eq!(dscratch_get_default_rpm(), 33);
        assert_eq!(dscratch_get_default_min_amplitude_from_vinyl_type(42), -1.0);
        assert_eq!(
            dscratch_get_default_input_amplify_coeff_from_vinyl_type(2),
            VinylType::Mixvibes.default_input_amplify_coeff()
        );
    }
}
