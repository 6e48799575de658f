//! Four-wide transcendental approximations.
//!
//! Cephes-derived single-precision kernels evaluated on all four lanes of
//! an [`F32x4`] at once, with every per-lane decision expressed through
//! [`F32x4::select`]. These feed the overtone kernel, where sin/pow run per
//! sample per overtone and anything slower dominates the render.
//!
//! | Function | Replaces | Domain | Max error |
//! |----------|----------|--------|-----------|
//! | [`sin4`] | `libm::sinf` | \|x\| ≤ 8192 | < 1e-5 abs |
//! | [`cos4`] | `libm::cosf` | \|x\| ≤ 8192 | < 1e-5 abs |
//! | [`log4`] | `libm::logf` | x > 0 (x ≤ 0 → [`LOG_ZERO`]) | < 1e-5 abs |
//! | [`exp4`] | `libm::expf` | x ∈ \[−103.28, 88.72\] (clamped) | < 1e-5 rel |
//! | [`pow4`] | `libm::powf` | see sign policy below | compounded from exp/log |
//!
//! # Sign policy of `pow4`
//!
//! `pow4` is not IEEE `powf`. A negative base with an exact integer
//! exponent keeps its sign by parity (`pow4(-2, 3) = -8`); a negative base
//! with a fractional exponent yields exactly 0 rather than NaN; a zero
//! base yields 0 except `pow4(0, 0) = 1`. Modulation curves route shape
//! exponents through `pow4` at audio rate, and a NaN there would poison an
//! entire mix buffer; every input produces a finite number instead.
//!
//! # When NOT to use
//!
//! Offline analysis or anything needing the last few mantissa bits should
//! use `libm`. These kernels target audio-rate synthesis where the error floor
//! sits far below quantization noise.

use crate::wide::{F32x4, I32x4};

/// `log4` result for any input ≤ 0: the natural log of the smallest
/// positive normal f32. A finite floor instead of NaN, so downstream
/// `exp4(y·log4(x))` chains collapse to 0 rather than poisoning the lane.
pub const LOG_ZERO: f32 = -87.336_545;

/// 4/π, the octant scale for range reduction.
const FOPI: f32 = 1.273_239_5;

// Extended-precision range reduction: π/4 split into three parts so
// x − j·π/4 stays accurate for arguments in the thousands.
const DP1: f32 = 0.78515625;
const DP2: f32 = 2.418_756_5e-4;
const DP3: f32 = 3.774_895e-8;

// Cephes minimax coefficients for the two polynomial paths.
const SINCOF_P0: f32 = -1.951_529_6e-4;
const SINCOF_P1: f32 = 8.332_161e-3;
const SINCOF_P2: f32 = -1.666_665_5e-1;
const COSCOF_P0: f32 = 2.443_315_7e-5;
const COSCOF_P1: f32 = -1.388_731_6e-3;
const COSCOF_P2: f32 = 4.166_664_6e-2;

const LOG2EF: f32 = core::f32::consts::LOG2_E;
// ln(2) split for exp range reduction.
const EXP_C1: f32 = 0.693359375;
const EXP_C2: f32 = -2.121_944_4e-4;
const SQRTHF: f32 = core::f32::consts::FRAC_1_SQRT_2;

/// 2^n per lane via direct exponent-field construction.
///
/// The biased exponent is clamped to [1, 254], so the result saturates at
/// the finite minimum/maximum magnitudes instead of flushing to zero or
/// overflowing to infinity.
#[inline]
fn pow2i(n: I32x4) -> F32x4 {
    F32x4::from_fn(|i| {
        let e = (n.lane(i) + 127).clamp(1, 254) as u32;
        f32::from_bits(e << 23)
    })
}

/// Four-wide sine, argument in radians.
///
/// Octant range reduction with three-part extended-precision subtraction,
/// then one of two minimax polynomials per lane.
///
/// # Accuracy
///
/// Absolute error < 1e-5 for |x| ≤ 8192 (phase accumulators are wrapped
/// to [0, 2π) once per buffer, so the kernel never leaves that range).
///
/// # Examples
///
/// ```
/// use armonico_core::fast_math::sin4;
/// use armonico_core::wide::F32x4;
///
/// let y = sin4(F32x4::splat(core::f32::consts::FRAC_PI_2));
/// assert!((y.lane(0) - 1.0).abs() < 1e-5);
/// ```
pub fn sin4(x: F32x4) -> F32x4 {
    let sign = x.lt(F32x4::ZERO);
    let x = x.abs();

    // Integer part of x / (π/4).
    let mut y = (F32x4::splat(FOPI) * x).floor();
    let mut j = y.to_i32();

    // Map odd octant indices to the next even one.
    let odd = j.and(1).eq(1);
    y = F32x4::select(odd, y + 1.0, y);
    j = I32x4::select(odd, j.add(1), j);
    j = j.and(7);

    // Extended-precision modular arithmetic.
    let z = ((x - y * DP1) - y * DP2) - y * DP3;
    let zz = z * z;

    let path_cos = 1.0 - 0.5 * zz
        + zz * zz * ((COSCOF_P0 * zz + COSCOF_P1) * zz + COSCOF_P2);
    let path_sin = z + z * zz * ((SINCOF_P0 * zz + SINCOF_P1) * zz + SINCOF_P2);

    // Octants 1,2,5,6 take the cosine polynomial.
    let y = F32x4::select(j.sub(1).and(3).lt(2), path_cos, path_sin);

    // Negative for exactly one of: negative argument, back half-turn.
    F32x4::select(sign.xor(j.gt(3)), -y, y)
}

/// Four-wide cosine, argument in radians.
///
/// Same range reduction and polynomial pair as [`sin4`], shifted by one
/// quarter turn in the octant tables.
///
/// # Examples
///
/// ```
/// use armonico_core::fast_math::cos4;
/// use armonico_core::wide::F32x4;
///
/// let y = cos4(F32x4::splat(core::f32::consts::PI));
/// assert!((y.lane(0) + 1.0).abs() < 1e-5);
/// ```
pub fn cos4(x: F32x4) -> F32x4 {
    let x = x.abs();

    let mut j = (F32x4::splat(FOPI) * x).to_i32();
    let mut y = j.to_f32();

    let odd = j.and(1).ne(0);
    j = I32x4::select(odd, j.add(1), j);
    y = F32x4::select(odd, y + 1.0, y);
    j = j.and(7);

    let x = ((x - y * DP1) - y * DP2) - y * DP3;
    let z = x * x;

    let path_sin = x + x * z * ((SINCOF_P0 * z + SINCOF_P1) * z + SINCOF_P2);
    let path_cos = 1.0 - 0.5 * z
        + z * z * ((COSCOF_P0 * z + COSCOF_P1) * z + COSCOF_P2);

    let y = F32x4::select(j.sub(1).and(3).lt(2), path_sin, path_cos);

    // Octants 2..=5 are the negative half of the cycle; the shifted
    // index wraps so 6 and 7 stay positive.
    F32x4::select(j.add(2).and(7).gt(3), -y, y)
}

/// Four-wide natural logarithm.
///
/// Lanes ≤ 0 yield [`LOG_ZERO`] rather than NaN; subnormal inputs are
/// clamped to the smallest positive normal first.
///
/// # Examples
///
/// ```
/// use armonico_core::fast_math::{log4, LOG_ZERO};
/// use armonico_core::wide::F32x4;
///
/// assert!(log4(F32x4::splat(1.0)).lane(0).abs() < 1e-6);
/// assert_eq!(log4(F32x4::splat(-3.0)).lane(0), LOG_ZERO);
/// ```
pub fn log4(x: F32x4) -> F32x4 {
    let invalid = x.le(F32x4::ZERO);
    let x = x.max(F32x4::splat(f32::MIN_POSITIVE));

    let (mut x, mut e) = frexp_lanes(x);

    // Normalize the mantissa into (√½, √2] around 1.
    let lt = x.lt(F32x4::splat(SQRTHF));
    e = I32x4::select(lt, e.sub(1), e);
    x = F32x4::select(lt, x + x - 1.0, x - 1.0);

    let z = x * x;

    let mut y = ((((((((7.037_683_6e-2 * x - 1.151_461e-1) * x + 1.167_699_9e-1)
        * x
        - 1.242_014_1e-1)
        * x
        + 1.424_932_3e-1)
        * x
        - 1.666_805_8e-1)
        * x
        + 2.000_071_5e-1)
        * x
        - 2.499_999_4e-1)
        * x
        + 3.333_333e-1)
        * x
        * z;

    let fe = e.to_f32();
    y = y + fe * EXP_C2;
    y = y - 0.5 * z;
    let r = x + y + fe * EXP_C1;

    F32x4::select(invalid, F32x4::splat(LOG_ZERO), r)
}

/// Split each lane into mantissa ∈ [0.5, 1) and exponent.
///
/// Valid for positive normal inputs only; callers clamp first.
#[inline]
fn frexp_lanes(x: F32x4) -> (F32x4, I32x4) {
    let arr = x.to_array();
    let mut m = [0.0f32; 4];
    let mut e = [0i32; 4];
    for i in 0..4 {
        let bits = arr[i].to_bits();
        e[i] = ((bits >> 23) & 0xff) as i32 - 126;
        m[i] = f32::from_bits((bits & 0x007f_ffff) | 0x3f00_0000);
    }
    (F32x4::new(m), I32x4::new(e))
}

/// Four-wide natural exponential.
///
/// Input is clamped to [−103.28, 88.72]; the `e^x = e^g·2^n` split keeps
/// the polynomial argument in [−½ln2, ½ln2] and the power-of-two scale
/// saturates at finite magnitudes (see [`pow2i`] clamp).
///
/// # Examples
///
/// ```
/// use armonico_core::fast_math::exp4;
/// use armonico_core::wide::F32x4;
///
/// let y = exp4(F32x4::splat(1.0));
/// assert!((y.lane(0) - core::f32::consts::E).abs() < 1e-5);
/// ```
pub fn exp4(x: F32x4) -> F32x4 {
    let x = x.clamp(-103.28, 88.72);

    let n = (F32x4::splat(LOG2EF) * x + 0.5).floor();
    let x = (x - n * EXP_C1) - n * EXP_C2;
    let n = n.to_i32();

    let z = x * x;
    let p = (((((1.987_569_2e-4 * x + 1.398_2e-3) * x + 8.333_452e-3) * x
        + 4.166_579_6e-2)
        * x
        + 1.666_666_5e-1)
        * x
        + 5.000_000_3e-1)
        * z
        + x
        + 1.0;

    pow2i(n) * p
}

/// Four-wide power function with the sign policy described in the
/// [module docs](self): parity sign for negative base with integer
/// exponent, exact 0 for negative base with fractional exponent, 0 for
/// zero base except `pow4(0, 0) = 1`.
///
/// # Examples
///
/// ```
/// use armonico_core::fast_math::pow4;
/// use armonico_core::wide::F32x4;
///
/// let b = F32x4::new([-2.0, -2.0, 0.0, 2.0]);
/// let e = F32x4::new([3.0, 2.5, 0.0, -1.0]);
/// let r = pow4(b, e);
/// assert!((r.lane(0) + 8.0).abs() < 1e-3);
/// assert_eq!(r.lane(1), 0.0);
/// assert_eq!(r.lane(2), 1.0);
/// assert!((r.lane(3) - 0.5).abs() < 1e-6);
/// ```
pub fn pow4(base: F32x4, exponent: F32x4) -> F32x4 {
    let r = exp4(exponent * log4(base.abs()));

    // Negative bases: parity sign for integer exponents, else 0.
    let efloor = exponent.floor();
    let is_int = efloor.eq_lanes(exponent);
    let odd = efloor.to_i32().and(1).ne(0);
    let signed = F32x4::select(odd, -r, r);
    let neg_case = F32x4::select(is_int, signed, F32x4::ZERO);
    let r = F32x4::select(base.lt(F32x4::ZERO), neg_case, r);

    let zero_base = base.eq_lanes(F32x4::ZERO);
    let zero_exp = exponent.eq_lanes(F32x4::ZERO);
    F32x4::select(
        zero_base,
        F32x4::select(zero_exp, F32x4::ONE, F32x4::ZERO),
        r,
    )
}

/// Sine waveshaper: lift the sine onto [0, 1], raise it to `exponent`,
/// renormalize to [−1, 1].
///
/// Non-odd exponents skew the duty cycle of the wave, which is what the
/// ring modulator and the shaped-sine LFO run on.
pub fn powsin4(x: F32x4, exponent: F32x4) -> F32x4 {
    let sin01 = (sin4(x) + 1.0) * 0.5;
    (pow4(sin01, exponent) - 0.5) * 2.0
}

/// Four-wide decibels → linear gain: `10^(db/20)`.
pub fn db_to_linear4(db: F32x4) -> F32x4 {
    // 10^(db/20) = e^(db · ln10/20)
    const FACTOR: f32 = core::f32::consts::LN_10 / 20.0;
    exp4(db * FACTOR)
}

/// Scalar [`sin4`], for tests and one-off coefficient work.
#[inline]
pub fn sinf_fast(x: f32) -> f32 {
    sin4(F32x4::splat(x)).lane(0)
}

/// Scalar [`cos4`].
#[inline]
pub fn cosf_fast(x: f32) -> f32 {
    cos4(F32x4::splat(x)).lane(0)
}

/// Scalar [`log4`].
#[inline]
pub fn logf_fast(x: f32) -> f32 {
    log4(F32x4::splat(x)).lane(0)
}

/// Scalar [`exp4`].
#[inline]
pub fn expf_fast(x: f32) -> f32 {
    exp4(F32x4::splat(x)).lane(0)
}

/// Scalar [`pow4`].
#[inline]
pub fn powf_fast(base: f32, exponent: f32) -> f32 {
    pow4(F32x4::splat(base), F32x4::splat(exponent)).lane(0)
}
