//! Low-frequency oscillator for parameter-curve modulation.
//!
//! The LFO multiplies its output into an existing parameter curve rather
//! than producing a standalone signal, so an inactive LFO (frequency
//! control at 0) simply leaves the curve untouched. Five waveforms share
//! a single phase accumulator in units of turns; the `shape` control is
//! reinterpreted per waveform (waveshaping exponent for sine, duty cycle
//! for square, edge exponent for saw and triangle, ignored for noise).
//!
//! Output runs through a one-pole smoother whose coefficient is
//! `filter^8`, so most of the control range barely smooths and the top
//! of it smooths heavily. The smoother and the phase accumulation are
//! serial recurrences and run lane-by-lane; the waveform evaluation
//! itself is four-wide.

use crate::params::{LfoModTarget, LfoParams, LfoWaveform};
use armonico_core::{F32x4, LANES, exp4, pow4, powsin4};

const TAU: f32 = core::f32::consts::TAU;

// Numerical Recipes LCG.
const LCG_MUL: u32 = 1_664_525;
const LCG_ADD: u32 = 1_013_904_223;

/// Cross-modulatable low-frequency oscillator.
#[derive(Clone, Debug)]
pub struct Lfo {
    params: LfoParams,
    sample_rate: f32,

    /// Phase accumulator in turns, wrapped to [0, 1) once per buffer.
    accum: f32,
    /// Unbounded cycle count in f64; drives the noise redraw so that
    /// wrapping `accum` never re-fires a crossing.
    cycles: f64,
    /// One-pole smoother state.
    integrate: f32,
    noise_state: u32,
    noise_held: f32,
    /// Last whole cycle at which noise was redrawn.
    noise_crossing: i64,
}

impl Lfo {
    /// New LFO. Inactive until the frequency control is raised above 0.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            params: LfoParams::default(),
            sample_rate,
            accum: 0.0,
            cycles: 0.0,
            integrate: 0.0,
            noise_state: 0x2545_f491,
            noise_held: 0.0,
            noise_crossing: i64::MIN,
        }
    }

    /// Replace the parameters.
    pub fn set_params(&mut self, params: LfoParams) {
        self.params = params;
    }

    /// Current parameters.
    pub fn params(&self) -> &LfoParams {
        &self.params
    }

    /// Update the sample rate (changes the frequency map ceiling).
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    /// Whether this LFO contributes to its curve at all.
    pub fn is_active(&self) -> bool {
        self.params.frequency > 0.0
    }

    /// Oscillation frequency in Hz for a control value in (0, 1].
    ///
    /// Exponential map from a one-minute period at the bottom of the
    /// control range up to one cycle per sample at the top.
    pub fn frequency_hz(&self, control: f32) -> f32 {
        libm::powf(60.0 * self.sample_rate, control) / 60.0
    }

    /// Multiply this LFO's smoothed output into `curve`.
    ///
    /// `master`, when present, is another modulation channel's combined
    /// curve of the same length; it scales the one control selected by
    /// [`LfoParams::master_param`] sample-by-sample. Returns whether the
    /// curve was modified (false when inactive).
    ///
    /// `curve.len()` must be a multiple of 4.
    pub fn accumulate(&mut self, dt: f64, curve: &mut [f32], master: Option<&[f32]>) -> bool {
        assert!(curve.len() % LANES == 0);
        if !self.is_active() {
            return false;
        }

        let p = self.params;
        let target = match (master, p.master_param) {
            (Some(_), Some(t)) => Some(t),
            _ => None,
        };
        let dtf = dt as f32;

        for (ci, chunk) in curve.chunks_exact_mut(LANES).enumerate() {
            let m = match (master, target) {
                (Some(mc), Some(_)) => F32x4::from_slice(&mc[ci * LANES..ci * LANES + LANES]),
                _ => F32x4::ONE,
            };
            let ctl = |t: LfoModTarget, v: f32| -> F32x4 {
                if target == Some(t) {
                    F32x4::splat(v) * m
                } else {
                    F32x4::splat(v)
                }
            };

            let amplitude = ctl(LfoModTarget::Amplitude, p.amplitude);
            let freq_ctl = ctl(LfoModTarget::Frequency, p.frequency).clamp(0.0, 1.0);
            let shape = ctl(LfoModTarget::Shape, p.shape).clamp(0.0, 1.0);
            let filter = ctl(LfoModTarget::Filter, p.filter).clamp(0.0, 1.0);
            let offset = ctl(LfoModTarget::Offset, p.offset);
            let phase = ctl(LfoModTarget::Phase, p.phase);

            // Each lane's absolute phase is the running sum of the
            // per-sample increments up to but not including that lane.
            let inc = F32x4::from_fn(|i| self.frequency_hz(freq_ctl.lane(i)) * dtf).to_array();
            let lanes = {
                let a = self.accum;
                F32x4::new([a, a + inc[0], a + inc[0] + inc[1], a + inc[0] + inc[1] + inc[2]])
            };

            let wave = self.sample_wave(p.waveform, lanes + phase, shape, inc);
            let val = (offset + wave) * amplitude;

            self.accum += inc[0] + inc[1] + inc[2] + inc[3];

            // One-pole smoother, serial by nature.
            let c = pow4(filter, F32x4::splat(8.0)).to_array();
            let x = val.to_array();
            let mut y = [0.0f32; LANES];
            let mut prev = self.integrate;
            for i in 0..LANES {
                prev = (1.0 - c[i]) * x[i] + c[i] * prev;
                y[i] = prev;
            }
            self.integrate = prev;

            let out = F32x4::from_slice(chunk) * F32x4::new(y);
            out.write_to(chunk);
        }

        self.accum -= libm::floorf(self.accum);
        true
    }

    /// Evaluate the waveform at four phases in turns.
    fn sample_wave(
        &mut self,
        waveform: LfoWaveform,
        phase: F32x4,
        shape: F32x4,
        inc: [f32; LANES],
    ) -> F32x4 {
        let frac = phase - phase.floor();
        match waveform {
            LfoWaveform::Sine => {
                // Shape skews the sine through a waveshaping exponent
                // centered on 1 at shape = 0.5.
                let e = pow4(shape + 0.5, F32x4::splat(8.0));
                powsin4(frac * TAU, e)
            }
            LfoWaveform::Square => F32x4::select(frac.lt(shape), F32x4::splat(-1.0), F32x4::ONE),
            LfoWaveform::Saw => 1.0 - 2.0 * pow4(frac, edge_exponent(shape)),
            LfoWaveform::Triangle => {
                let tri01 = 1.0 - (2.0 * frac - 1.0).abs();
                2.0 * pow4(tri01, edge_exponent(shape)) - 1.0
            }
            LfoWaveform::Noise => {
                // Sample-and-hold: redraw once per whole-cycle crossing
                // of the unbounded counter.
                let mut out = [0.0f32; LANES];
                for (i, slot) in out.iter_mut().enumerate() {
                    let crossing = libm::floor(self.cycles) as i64;
                    if crossing != self.noise_crossing {
                        self.noise_state =
                            self.noise_state.wrapping_mul(LCG_MUL).wrapping_add(LCG_ADD);
                        // Top 24 bits mapped to [-1, 1).
                        self.noise_held = (self.noise_state >> 8) as f32 / 8_388_608.0 - 1.0;
                        self.noise_crossing = crossing;
                    }
                    *slot = self.noise_held;
                    self.cycles += f64::from(inc[i]);
                }
                F32x4::new(out)
            }
        }
    }
}

/// Edge exponent for saw and triangle: `2^((shape - 0.5) * 12)`, spanning
/// roughly 1/64..64 with the midpoint exactly linear.
fn edge_exponent(shape: F32x4) -> F32x4 {
    exp4((shape - 0.5) * (12.0 * core::f32::consts::LN_2))
}
