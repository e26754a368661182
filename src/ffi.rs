//! C ABI over [`Resampler`].
//!
//! Handles are boxed resamplers passed across the boundary as opaque pointers.
//! Functions returning `c_int` report errors as `-1`; nothing panics across the
//! boundary.
//!
//! Method codes: `0` selects linear interpolation in the conversion direction,
//! `1..=5` select sinc best, sinc medium, sinc fastest, zero-order hold and the
//! backend's linear interpolator. Unknown codes select linear.

use std::os::raw::{c_float, c_int};
use std::panic;

use tracing::{debug, error};

use crate::audio::resampler::{ResampleMethod, Resampler, ResamplerConfig, estimate_output_size, is_high_quality_backend_available};

/// Opaque resampler handle.
pub struct ResamplerHandle {
    resampler: Resampler,
}

/// Run `body`, mapping a panic to `default` so it never unwinds into C.
fn guard<T>(default: T, body: impl FnOnce() -> T) -> T {
    match panic::catch_unwind(panic::AssertUnwindSafe(body)) {
        Ok(result) => result,
        Err(panic_err) => {
            let msg = if let Some(s) = panic_err.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_err.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic".to_string()
            };
            error!("Panic in resampler C API: {}", msg);
            default
        }
    }
}

fn positive(value: c_int) -> Option<u32> {
    u32::try_from(value).ok().filter(|&v| v > 0)
}

fn create(input_rate: c_int, output_rate: c_int, channels: c_int, method: c_int) -> Option<Box<ResamplerHandle>> {
    let input_rate = positive(input_rate)?;
    let output_rate = positive(output_rate)?;
    let channels = positive(channels)? as usize;

    let ratio = output_rate as f64 / input_rate as f64;
    let config = ResamplerConfig::new(input_rate, output_rate, channels).with_method(ResampleMethod::from_code(method, ratio));

    let mut resampler = Resampler::new(config);
    if let Err(e) = resampler.initialize() {
        error!("Failed to create resampler: {}", e);
        return None;
    }
    Some(Box::new(ResamplerHandle { resampler }))
}

/// Run one single-shot conversion into a raw output buffer.
///
/// # Safety
/// `input` must point to `input_samples` readable floats and `output` to
/// `output_capacity` writable floats, unless the corresponding count is zero.
unsafe fn process_raw(resampler: &mut Resampler, input: *const c_float, input_samples: c_int, output: *mut c_float, output_capacity: c_int) -> c_int {
    let (Ok(input_len), Ok(capacity)) = (usize::try_from(input_samples), usize::try_from(output_capacity)) else {
        return -1;
    };
    if input_len == 0 {
        return 0;
    }
    if input.is_null() || output.is_null() {
        return -1;
    }

    // SAFETY: caller guarantees both regions are valid for the given lengths.
    let (input, output) = unsafe { (std::slice::from_raw_parts(input, input_len), std::slice::from_raw_parts_mut(output, capacity)) };

    match resampler.process_into(input, output) {
        Ok(written) => c_int::try_from(written).unwrap_or(-1),
        Err(e) => {
            debug!("Resampler C API process failed: {}", e);
            -1
        }
    }
}

/// Whether the band-limited backend is compiled in. Returns 1 or 0.
#[unsafe(no_mangle)]
pub extern "C" fn resampler_has_high_quality() -> c_int {
    c_int::from(is_high_quality_backend_available())
}

/// Create and initialize a resampler.
///
/// Returns null if a rate or the channel count is not positive, or initialization fails.
/// Release the handle with [`resampler_destroy`].
#[unsafe(no_mangle)]
pub extern "C" fn resampler_create(input_rate: c_int, output_rate: c_int, channels: c_int, method: c_int) -> *mut ResamplerHandle {
    guard(std::ptr::null_mut(), || match create(input_rate, output_rate, channels, method) {
        Some(handle) => Box::into_raw(handle),
        None => std::ptr::null_mut(),
    })
}

/// Destroy a handle. Null is ignored.
///
/// # Safety
/// `handle` must be null or a pointer returned by [`resampler_create`] that has
/// not been destroyed yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn resampler_destroy(handle: *mut ResamplerHandle) {
    if handle.is_null() {
        return;
    }
    // SAFETY: handle came from Box::into_raw in resampler_create.
    drop(unsafe { Box::from_raw(handle) });
}

/// Clear streaming state. Null is ignored.
///
/// # Safety
/// `handle` must be null or a live pointer from [`resampler_create`], not used
/// concurrently from another thread.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn resampler_reset(handle: *mut ResamplerHandle) {
    // SAFETY: see function contract.
    if let Some(handle) = unsafe { handle.as_mut() } {
        guard((), || handle.resampler.reset());
    }
}

/// Resample `input_samples` interleaved samples into `output`.
///
/// Returns the number of samples written, `0` for zero-length input, or `-1` if
/// the handle or a buffer is null, a count is negative, `output` is too small
/// or processing fails.
///
/// # Safety
/// `handle` must be null or a live pointer from [`resampler_create`], not used
/// concurrently. `input` must hold `input_samples` floats and `output`
/// `output_capacity` floats.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn resampler_process(
    handle: *mut ResamplerHandle,
    input: *const c_float,
    input_samples: c_int,
    output: *mut c_float,
    output_capacity: c_int,
) -> c_int {
    // SAFETY: see function contract.
    let Some(handle) = (unsafe { handle.as_mut() }) else {
        return -1;
    };
    // SAFETY: buffer validity is forwarded from the caller.
    guard(-1, || unsafe { process_raw(&mut handle.resampler, input, input_samples, output, output_capacity) })
}

/// Safe output buffer size for `input_samples` samples, or `-1` for invalid arguments.
#[unsafe(no_mangle)]
pub extern "C" fn resampler_estimate_output_size(input_samples: c_int, input_rate: c_int, output_rate: c_int) -> c_int {
    let (Ok(samples), Some(input_rate), Some(output_rate)) = (usize::try_from(input_samples), positive(input_rate), positive(output_rate)) else {
        return -1;
    };
    c_int::try_from(estimate_output_size(samples, input_rate, output_rate)).unwrap_or(c_int::MAX)
}

/// Create a temporary resampler, convert once and destroy it.
///
/// Same return convention as [`resampler_process`].
///
/// # Safety
/// `input` must hold `input_samples` floats and `output` `output_capacity` floats.
#[unsafe(no_mangle)]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn resample_simple(
    input: *const c_float,
    input_samples: c_int,
    input_rate: c_int,
    output_rate: c_int,
    channels: c_int,
    method: c_int,
    output: *mut c_float,
    output_capacity: c_int,
) -> c_int {
    guard(-1, || {
        let Some(mut handle) = create(input_rate, output_rate, channels, method) else {
            return -1;
        };
        // SAFETY: buffer validity is forwarded from the caller.
        unsafe { process_raw(&mut handle.resampler, input, input_samples, output, output_capacity) }
    })
}
