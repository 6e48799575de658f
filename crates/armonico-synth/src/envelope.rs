//! Timestamp-based ADSR envelope.
//!
//! Unlike a per-sample state machine, this envelope is a pure function of
//! absolute time once triggered: six ordered timestamps partition the
//! timeline into Zero, Attack, Decay, Sustain and Release segments, and
//! evaluation is a nested branchless select over the segment boundaries.
//! That makes block evaluation embarrassingly parallel (four samples per
//! step with no carried state) and retriggering exact regardless of
//! block size.
//!
//! The Zero segment is the anti-click guard: retriggering an envelope
//! mid-flight first ramps the captured current level down to zero over a
//! time proportional to that level, so a new attack never starts from a
//! discontinuity.

use crate::params::AdsrParams;
use armonico_core::{F32x4, LANES, pow4};

/// ADSR envelope with absolute-time segment boundaries.
///
/// Timekeeping is split: boundaries are stored as `f64` seconds for exact
/// bookkeeping across long renders, and as trigger-relative `f32` copies
/// for the four-wide evaluation path where only the offset into the
/// current note matters.
///
/// # Example
///
/// ```
/// use armonico_synth::{Adsr, AdsrParams};
///
/// let mut env = Adsr::new(AdsrParams::default());
/// env.trigger(0.0, 0.05);
/// assert!(env.value(0.25) > 0.0); // mid-attack
/// env.off(2.0);
/// assert_eq!(env.value(10.0), 0.0); // long after release
/// ```
#[derive(Clone, Debug)]
pub struct Adsr {
    params: AdsrParams,

    on_level: f32,
    off_level: f32,
    triggered: bool,
    released: bool,

    /// Absolute trigger time, seconds.
    ts_trigger: f64,
    // Segment ends, seconds relative to the trigger. Kept ordered:
    // 0 <= zero_end <= attack_end <= decay_end <= release <= off_end.
    rel_zero_end: f32,
    rel_attack_end: f32,
    rel_decay_end: f32,
    rel_release: f32,
    rel_off_end: f32,
}

impl Adsr {
    /// New envelope; silent until the first [`trigger`](Self::trigger).
    pub fn new(params: AdsrParams) -> Self {
        Self {
            params,
            on_level: 0.0,
            off_level: 0.0,
            triggered: false,
            released: false,
            ts_trigger: 0.0,
            rel_zero_end: 0.0,
            rel_attack_end: 0.0,
            rel_decay_end: 0.0,
            rel_release: f32::INFINITY,
            rel_off_end: f32::INFINITY,
        }
    }

    /// Replace the segment parameters. Takes effect on the next trigger.
    pub fn set_params(&mut self, params: AdsrParams) {
        self.params = params;
    }

    /// Current parameters.
    pub fn params(&self) -> &AdsrParams {
        &self.params
    }

    /// Whether the envelope has ever been triggered.
    pub fn is_triggered(&self) -> bool {
        self.triggered
    }

    /// Whether the envelope is past its release point.
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Start (or restart) the envelope at `time`.
    ///
    /// The first trigger starts the attack immediately. A retrigger
    /// samples the current level into the Zero segment, which ramps it to
    /// zero over `level * anticlick_secs` before the new attack begins;
    /// louder interruptions get a longer fade.
    pub fn trigger(&mut self, time: f64, anticlick_secs: f32) {
        let level_now = self.value(time);

        if self.triggered {
            self.on_level = level_now;
            self.rel_zero_end = self.on_level * anticlick_secs;
        } else {
            self.triggered = true;
            self.rel_zero_end = 0.0;
        }
        self.ts_trigger = time;

        self.rel_attack_end = self.rel_zero_end + self.params.attack_secs;
        self.rel_decay_end = self.rel_attack_end + self.params.decay_secs;
        self.rel_release = f32::INFINITY;
        self.rel_off_end = f32::INFINITY;
        self.released = false;

        if self.params.auto_release {
            self.off(time + f64::from(self.rel_decay_end));
        }
    }

    /// Schedule the release at `time`. Idempotent: only the first call
    /// after a trigger takes effect.
    ///
    /// The current level is captured as the release start, and any
    /// earlier segment boundaries still in the future are pulled back so
    /// the release segment owns the timeline from `time` on.
    pub fn off(&mut self, time: f64) {
        if self.released || !self.triggered {
            return;
        }
        self.released = true;

        self.off_level = self.value(time);

        let rel = ((time - self.ts_trigger).max(0.0)) as f32;
        self.rel_zero_end = self.rel_zero_end.min(rel);
        self.rel_attack_end = self.rel_attack_end.min(rel);
        self.rel_decay_end = self.rel_decay_end.min(rel);
        self.rel_release = rel;
        self.rel_off_end = rel + self.params.release_secs;
    }

    /// Envelope level at absolute time `time`.
    pub fn value(&self, time: f64) -> f32 {
        if !self.triggered || time < self.ts_trigger {
            return 0.0;
        }
        let rel = (time - self.ts_trigger) as f32;
        if rel > self.rel_off_end {
            return 0.0;
        }
        self.eval4(F32x4::splat(rel)).lane(0)
    }

    /// Fill `out` with envelope values for a block starting at `t0` with
    /// sample period `dt`. Returns whether any output was nonzero, which
    /// callers use to propagate silence.
    ///
    /// `out.len()` must be a multiple of 4.
    pub fn fill(&self, t0: f64, dt: f64, out: &mut [f32]) -> bool {
        assert!(out.len() % LANES == 0);

        let rel0 = t0 - self.ts_trigger;
        if !self.triggered || rel0 < 0.0 || rel0 > f64::from(self.rel_off_end) {
            out.fill(0.0);
            return false;
        }

        let dtf = dt as f32;
        let offsets = F32x4::new([0.0, dtf, 2.0 * dtf, 3.0 * dtf]);
        let mut any = false;
        for (i, chunk) in out.chunks_exact_mut(LANES).enumerate() {
            let base = (rel0 + (i * LANES) as f64 * dt) as f32;
            let v = self.eval4(offsets + base);
            any |= !v.all_zero();
            v.write_to(chunk);
        }
        any
    }

    /// Nested branchless segment selection at four trigger-relative
    /// times.
    fn eval4(&self, ts: F32x4) -> F32x4 {
        let p = &self.params;

        let seg_zero = plerp4(
            F32x4::splat(self.on_level),
            F32x4::ZERO,
            0.0,
            self.rel_zero_end,
            ts,
            F32x4::ONE,
        );
        let seg_attack = plerp4(
            F32x4::ZERO,
            F32x4::splat(p.attack_level),
            self.rel_zero_end,
            self.rel_attack_end,
            ts,
            F32x4::splat(p.attack_pow),
        );
        let seg_decay = plerp4(
            F32x4::splat(p.attack_level),
            F32x4::splat(p.sustain_level),
            self.rel_attack_end,
            self.rel_decay_end,
            ts,
            F32x4::splat(p.decay_pow),
        );
        let seg_sustain = F32x4::splat(p.sustain_level);
        let seg_release = plerp4(
            F32x4::splat(self.off_level),
            F32x4::ZERO,
            self.rel_release,
            self.rel_off_end,
            ts,
            F32x4::splat(p.release_pow),
        );

        F32x4::select(
            ts.lt(F32x4::splat(self.rel_zero_end)),
            seg_zero,
            F32x4::select(
                ts.lt(F32x4::splat(self.rel_attack_end)),
                seg_attack,
                F32x4::select(
                    ts.lt(F32x4::splat(self.rel_decay_end)),
                    seg_decay,
                    F32x4::select(
                        ts.lt(F32x4::splat(self.rel_release)),
                        seg_sustain,
                        seg_release,
                    ),
                ),
            ),
        )
    }
}

/// Power-shaped interpolation from `a` at `ta` to `b` at `tb`, clamped
/// outside the interval. A zero-length interval yields `a`, which also
/// guards the NaN that `(ts - ta) / (tb - ta)` would produce for the
/// infinite release boundaries of a held note.
fn plerp4(a: F32x4, b: F32x4, ta: f32, tb: f32, ts: F32x4, pw: F32x4) -> F32x4 {
    let alpha = ((ts - ta) / (tb - ta)).clamp(0.0, 1.0);
    let shaped = a + (b - a) * pow4(alpha, pw);
    F32x4::select(F32x4::splat(ta).eq_lanes(F32x4::splat(tb)), a, shaped)
}
