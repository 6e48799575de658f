//! Portable four-lane vector types.
//!
//! The overtone kernel and the modulation generators are written against a
//! fixed four-wide lane model: every value is an [`F32x4`], every condition
//! is a [`Mask4`], and all control flow is expressed through the single
//! branchless [`F32x4::select`] primitive. No lane ever branches on its own,
//! which keeps the hot loops free of per-lane divergence and lets the
//! compiler lower them to SIMD where available.
//!
//! The lanes are plain arrays behind safe per-lane loops; the workspace
//! denies `unsafe`, so there are no intrinsics here. With optimization on,
//! rustc autovectorizes these loops on every target we care about.

use core::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

/// Number of lanes in the wide types. Buffer sizes handed to the vector
/// evaluation paths must be a multiple of this.
pub const LANES: usize = 4;

/// Four f32 lanes.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct F32x4([f32; LANES]);

/// Four i32 lanes. Used for octant indices and exponents inside the
/// transcendental kernels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct I32x4([i32; LANES]);

/// Per-lane boolean, stored as all-ones/all-zeros bit patterns so selection
/// stays a pure bit operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Mask4([u32; LANES]);

impl F32x4 {
    /// All lanes zero.
    pub const ZERO: Self = Self([0.0; LANES]);
    /// All lanes one.
    pub const ONE: Self = Self([1.0; LANES]);

    /// Build from explicit lane values.
    #[inline]
    pub const fn new(lanes: [f32; LANES]) -> Self {
        Self(lanes)
    }

    /// Broadcast one value to all lanes.
    #[inline]
    pub const fn splat(v: f32) -> Self {
        Self([v; LANES])
    }

    /// Build lane-by-lane from a function of the lane index.
    #[inline]
    pub fn from_fn(f: impl FnMut(usize) -> f32) -> Self {
        Self(core::array::from_fn(f))
    }

    /// The lane values as an array.
    #[inline]
    pub const fn to_array(self) -> [f32; LANES] {
        self.0
    }

    /// One lane value.
    #[inline]
    pub const fn lane(self, i: usize) -> f32 {
        self.0[i]
    }

    /// Load four consecutive values from a slice.
    #[inline]
    pub fn from_slice(s: &[f32]) -> Self {
        Self([s[0], s[1], s[2], s[3]])
    }

    /// Store the lanes into four consecutive slice elements.
    #[inline]
    pub fn write_to(self, s: &mut [f32]) {
        s[..LANES].copy_from_slice(&self.0);
    }

    /// Per-lane floor.
    #[inline]
    pub fn floor(self) -> Self {
        Self(self.0.map(libm::floorf))
    }

    /// Per-lane absolute value.
    #[inline]
    pub fn abs(self) -> Self {
        Self(self.0.map(f32::abs))
    }

    /// Per-lane minimum.
    #[inline]
    pub fn min(self, other: Self) -> Self {
        Self::from_fn(|i| self.0[i].min(other.0[i]))
    }

    /// Per-lane maximum.
    #[inline]
    pub fn max(self, other: Self) -> Self {
        Self::from_fn(|i| self.0[i].max(other.0[i]))
    }

    /// Per-lane clamp to `[lo, hi]`.
    #[inline]
    pub fn clamp(self, lo: f32, hi: f32) -> Self {
        Self(self.0.map(|v| v.clamp(lo, hi)))
    }

    /// Truncating conversion to integer lanes.
    #[inline]
    pub fn to_i32(self) -> I32x4 {
        I32x4(self.0.map(|v| v as i32))
    }

    /// Sum of all lanes.
    #[inline]
    pub fn sum(self) -> f32 {
        self.0[0] + self.0[1] + self.0[2] + self.0[3]
    }

    /// Inclusive prefix sum: lane k becomes the sum of lanes `0..=k`.
    ///
    /// Used to turn per-sample phase increments into per-lane absolute
    /// phases in one step.
    #[inline]
    pub fn prefix_sum(self) -> Self {
        let [a, b, c, d] = self.0;
        Self([a, a + b, a + b + c, a + b + c + d])
    }

    /// `mask ? a : b`, per lane, as a pure bit operation.
    #[inline]
    pub fn select(mask: Mask4, a: Self, b: Self) -> Self {
        Self::from_fn(|i| {
            f32::from_bits((mask.0[i] & a.0[i].to_bits()) | (!mask.0[i] & b.0[i].to_bits()))
        })
    }

    /// Per-lane `self < other`.
    #[inline]
    pub fn lt(self, other: Self) -> Mask4 {
        Mask4::from_fn(|i| self.0[i] < other.0[i])
    }

    /// Per-lane `self <= other`.
    #[inline]
    pub fn le(self, other: Self) -> Mask4 {
        Mask4::from_fn(|i| self.0[i] <= other.0[i])
    }

    /// Per-lane `self > other`.
    #[inline]
    pub fn gt(self, other: Self) -> Mask4 {
        Mask4::from_fn(|i| self.0[i] > other.0[i])
    }

    /// Per-lane `self == other`.
    #[inline]
    pub fn eq_lanes(self, other: Self) -> Mask4 {
        Mask4::from_fn(|i| self.0[i] == other.0[i])
    }

    /// Per-lane `self != other`.
    #[inline]
    pub fn ne_lanes(self, other: Self) -> Mask4 {
        Mask4::from_fn(|i| self.0[i] != other.0[i])
    }

    /// True if every lane is exactly zero.
    #[inline]
    pub fn all_zero(self) -> bool {
        self.0 == [0.0; LANES]
    }
}

impl I32x4 {
    /// Build from explicit lane values.
    #[inline]
    pub const fn new(lanes: [i32; LANES]) -> Self {
        Self(lanes)
    }

    /// Broadcast one value to all lanes.
    #[inline]
    pub const fn splat(v: i32) -> Self {
        Self([v; LANES])
    }

    /// One lane value.
    #[inline]
    pub const fn lane(self, i: usize) -> i32 {
        self.0[i]
    }

    /// Conversion to float lanes.
    #[inline]
    pub fn to_f32(self) -> F32x4 {
        F32x4(self.0.map(|v| v as f32))
    }

    /// Per-lane bitwise AND with a broadcast value.
    #[inline]
    pub fn and(self, v: i32) -> Self {
        Self(self.0.map(|x| x & v))
    }

    /// Per-lane addition of a broadcast value.
    #[inline]
    pub fn add(self, v: i32) -> Self {
        Self(self.0.map(|x| x + v))
    }

    /// Per-lane subtraction of a broadcast value.
    #[inline]
    pub fn sub(self, v: i32) -> Self {
        Self(self.0.map(|x| x - v))
    }

    /// Per-lane `self == v`.
    #[inline]
    pub fn eq(self, v: i32) -> Mask4 {
        Mask4::from_fn(|i| self.0[i] == v)
    }

    /// Per-lane `self != v`.
    #[inline]
    pub fn ne(self, v: i32) -> Mask4 {
        Mask4::from_fn(|i| self.0[i] != v)
    }

    /// Per-lane `self < v`.
    #[inline]
    pub fn lt(self, v: i32) -> Mask4 {
        Mask4::from_fn(|i| self.0[i] < v)
    }

    /// Per-lane `self > v`.
    #[inline]
    pub fn gt(self, v: i32) -> Mask4 {
        Mask4::from_fn(|i| self.0[i] > v)
    }

    /// `mask ? a : b`, per lane.
    #[inline]
    pub fn select(mask: Mask4, a: Self, b: Self) -> Self {
        Self(core::array::from_fn(|i| {
            ((mask.0[i] & a.0[i] as u32) | (!mask.0[i] & b.0[i] as u32)) as i32
        }))
    }
}

impl Mask4 {
    /// All lanes false.
    pub const NONE: Self = Self([0; LANES]);
    /// All lanes true.
    pub const ALL: Self = Self([u32::MAX; LANES]);

    /// Build lane-by-lane from a boolean function of the lane index.
    #[inline]
    pub fn from_fn(mut f: impl FnMut(usize) -> bool) -> Self {
        Self(core::array::from_fn(|i| if f(i) { u32::MAX } else { 0 }))
    }

    /// Per-lane AND.
    #[inline]
    pub fn and(self, other: Self) -> Self {
        Self(core::array::from_fn(|i| self.0[i] & other.0[i]))
    }

    /// Per-lane OR.
    #[inline]
    pub fn or(self, other: Self) -> Self {
        Self(core::array::from_fn(|i| self.0[i] | other.0[i]))
    }

    /// Per-lane XOR.
    #[inline]
    pub fn xor(self, other: Self) -> Self {
        Self(core::array::from_fn(|i| self.0[i] ^ other.0[i]))
    }

    /// Per-lane NOT.
    #[inline]
    pub fn not(self) -> Self {
        Self(self.0.map(|x| !x))
    }

    /// True if any lane is set.
    #[inline]
    pub fn any(self) -> bool {
        self.0 != [0; LANES]
    }

    /// True if every lane is set.
    #[inline]
    pub fn all(self) -> bool {
        self.0 == [u32::MAX; LANES]
    }

    /// One lane as a bool.
    #[inline]
    pub const fn lane(self, i: usize) -> bool {
        self.0[i] != 0
    }
}

macro_rules! impl_f32x4_binop {
    ($trait:ident, $fn:ident, $op:tt) => {
        impl $trait for F32x4 {
            type Output = F32x4;
            #[inline]
            fn $fn(self, rhs: F32x4) -> F32x4 {
                F32x4::from_fn(|i| self.0[i] $op rhs.0[i])
            }
        }

        impl $trait<f32> for F32x4 {
            type Output = F32x4;
            #[inline]
            fn $fn(self, rhs: f32) -> F32x4 {
                F32x4(self.0.map(|v| v $op rhs))
            }
        }

        impl $trait<F32x4> for f32 {
            type Output = F32x4;
            #[inline]
            fn $fn(self, rhs: F32x4) -> F32x4 {
                F32x4(rhs.0.map(|v| self $op v))
            }
        }
    };
}

impl_f32x4_binop!(Add, add, +);
impl_f32x4_binop!(Sub, sub, -);
impl_f32x4_binop!(Mul, mul, *);
impl_f32x4_binop!(Div, div, /);

impl Neg for F32x4 {
    type Output = F32x4;
    #[inline]
    fn neg(self) -> F32x4 {
        F32x4(self.0.map(|v| -v))
    }
}

impl AddAssign for F32x4 {
    #[inline]
    fn add_assign(&mut self, rhs: F32x4) {
        *self = *self + rhs;
    }
}

impl SubAssign for F32x4 {
    #[inline]
    fn sub_assign(&mut self, rhs: F32x4) {
        *self = *self - rhs;
    }
}

impl MulAssign for F32x4 {
    #[inline]
    fn mul_assign(&mut self, rhs: F32x4) {
        *self = *self * rhs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_is_lanewise() {
        let a = F32x4::new([1.0, 2.0, 3.0, 4.0]);
        let b = F32x4::new([-1.0, -2.0, -3.0, -4.0]);
        let m = Mask4::from_fn(|i| i % 2 == 0);
        let r = F32x4::select(m, a, b);
        assert_eq!(r.to_array(), [1.0, -2.0, 3.0, -4.0]);
    }

    #[test]
    fn select_preserves_exact_bits() {
        // Selection must be a bit copy, not an arithmetic blend.
        let a = F32x4::splat(f32::MIN_POSITIVE);
        let b = F32x4::splat(-0.0);
        let r = F32x4::select(Mask4::ALL, a, b);
        assert_eq!(r.lane(0).to_bits(), f32::MIN_POSITIVE.to_bits());
        let r = F32x4::select(Mask4::NONE, a, b);
        assert_eq!(r.lane(0).to_bits(), (-0.0_f32).to_bits());
    }

    #[test]
    fn prefix_sum_accumulates() {
        let v = F32x4::new([1.0, 2.0, 3.0, 4.0]);
        assert_eq!(v.prefix_sum().to_array(), [1.0, 3.0, 6.0, 10.0]);
        assert_eq!(v.sum(), 10.0);
    }

    #[test]
    fn comparisons_produce_full_masks() {
        let a = F32x4::new([0.0, 1.0, 2.0, 3.0]);
        let m = a.gt(F32x4::splat(1.5));
        assert!(!m.lane(0) && !m.lane(1) && m.lane(2) && m.lane(3));
        assert!(m.any());
        assert!(!m.all());
        assert_eq!(m.not().and(m), Mask4::NONE);
    }

    #[test]
    fn floor_matches_libm() {
        let v = F32x4::new([1.9, -1.1, 0.0, 1e6 + 0.5]);
        for (got, x) in v.floor().to_array().iter().zip(v.to_array()) {
            assert_eq!(*got, libm::floorf(x));
        }
    }

    #[test]
    fn int_lane_ops() {
        let j = F32x4::new([0.7, 1.2, 6.9, 8.0]).to_i32();
        assert_eq!(j, I32x4([0, 1, 6, 8]));
        assert_eq!(j.and(7), I32x4([0, 1, 6, 0]));
        let odd = j.and(1).eq(1);
        assert!(!odd.lane(0) && odd.lane(1) && !odd.lane(2));
    }

    #[test]
    fn scalar_operand_broadcasts() {
        let v = F32x4::splat(2.0);
        assert_eq!((v * 3.0).to_array(), [6.0; 4]);
        assert_eq!((1.0 - v).to_array(), [-1.0; 4]);
        assert_eq!((v / 2.0).to_array(), [1.0; 4]);
    }
}
