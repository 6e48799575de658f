//! Scalar math utilities for pitch and level handling.
//!
//! Control-rate helpers used when setting up a render; the per-sample
//! paths go through [`fast_math`](crate::fast_math) instead. All functions
//! are allocation-free and suitable for `no_std`.

use libm::{exp2f, expf, log2f, logf};

/// Convert decibels to linear gain.
///
/// # Example
/// ```rust
/// use armonico_core::db_to_linear;
///
/// assert!((db_to_linear(0.0) - 1.0).abs() < 0.001);
/// assert!((db_to_linear(-6.02) - 0.5).abs() < 0.01);
/// ```
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    // 10^(dB/20) = e^(dB * ln(10)/20)
    const FACTOR: f32 = core::f32::consts::LN_10 / 20.0;
    expf(db * FACTOR)
}

/// Convert linear gain to decibels.
///
/// Values ≤ 1e-10 are clamped before the log.
///
/// # Example
/// ```rust
/// use armonico_core::linear_to_db;
///
/// assert!((linear_to_db(1.0) - 0.0).abs() < 0.001);
/// assert!((linear_to_db(0.5) - (-6.02)).abs() < 0.01);
/// ```
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    // 20 * log10(linear) = 20 * ln(linear) / ln(10)
    const FACTOR: f32 = 20.0 / core::f32::consts::LN_10;
    logf(linear.max(1e-10)) * FACTOR
}

/// Linear interpolation between two values.
///
/// # Arguments
/// * `a` - Start value (at t=0)
/// * `b` - End value (at t=1)
/// * `t` - Interpolation factor (0.0 to 1.0)
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Convert a MIDI note number to frequency in Hz.
///
/// Equal temperament with A4 (note 69) at 440 Hz.
///
/// # Example
/// ```rust
/// use armonico_core::midi_to_freq;
///
/// assert!((midi_to_freq(69) - 440.0).abs() < 0.001);
/// assert!((midi_to_freq(57) - 220.0).abs() < 0.001);
/// ```
#[inline]
pub fn midi_to_freq(note: u8) -> f32 {
    440.0 * exp2f((f32::from(note) - 69.0) / 12.0)
}

/// Convert a frequency in Hz to a (fractional) MIDI note number.
///
/// Inverse of [`midi_to_freq`]; frequencies ≤ 0 are clamped to avoid the
/// log singularity.
#[inline]
pub fn freq_to_midi(freq: f32) -> f32 {
    69.0 + 12.0 * log2f(freq.max(1e-6) / 440.0)
}

/// Frequency ratio for a pitch offset in semitones.
///
/// # Example
/// ```rust
/// use armonico_core::semitones_to_ratio;
///
/// assert!((semitones_to_ratio(12.0) - 2.0).abs() < 1e-5);
/// assert!((semitones_to_ratio(-12.0) - 0.5).abs() < 1e-5);
/// ```
#[inline]
pub fn semitones_to_ratio(semitones: f32) -> f32 {
    exp2f(semitones / 12.0)
}
