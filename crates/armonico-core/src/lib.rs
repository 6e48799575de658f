//! Armonico Core - four-lane vector math for additive synthesis
//!
//! Foundation crate for the armonico additive synthesizer: a portable
//! four-wide lane model and the fast transcendental kernels the overtone
//! loop runs on.
//!
//! # Core Abstractions
//!
//! ## Wide lanes
//!
//! - [`F32x4`] / [`I32x4`] / [`Mask4`] - Four-lane value and mask types
//! - [`F32x4::select`] - The single branchless per-lane conditional every
//!   kernel is written against
//!
//! ## Fast math
//!
//! - [`sin4`] / [`cos4`] - Cephes octant-reduced trig, four lanes at once
//! - [`log4`] / [`exp4`] / [`pow4`] - Log-domain kernels with finite
//!   results for every input (no NaN propagation into mix buffers)
//! - [`powsin4`] - Shaped-sine waveshaper for ring modulation and LFOs
//!
//! ## Utilities
//!
//! - [`db_to_linear`] / [`linear_to_db`] - Level conversions
//! - [`midi_to_freq`] / [`freq_to_midi`] / [`semitones_to_ratio`] - Pitch
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible. Disable the default `std` feature:
//!
//! ```toml
//! [dependencies]
//! armonico-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Design Principles
//!
//! - **Real-time safe**: No allocations, no branching in per-sample paths
//! - **No dependencies on std**: Pure `no_std` with `libm` for math
//! - **No `unsafe`**: Lanes are plain arrays the optimizer vectorizes

#![cfg_attr(not(feature = "std"), no_std)]

pub mod fast_math;
pub mod math;
pub mod wide;

// Re-export main types at crate root
pub use fast_math::{LOG_ZERO, cos4, db_to_linear4, exp4, log4, pow4, powsin4, sin4};
pub use math::{db_to_linear, freq_to_midi, lerp, linear_to_db, midi_to_freq, semitones_to_ratio};
pub use wide::{F32x4, I32x4, LANES, Mask4};
