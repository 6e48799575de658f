//! The polyphonic synthesis engine and its overtone kernel.
//!
//! [`SynthesisEngine`] owns a fixed pool of virtual voices, allocates
//! notes round-robin over the first `virtual_voices` slots, and renders
//! interleaved stereo in internal lane-aligned blocks. The kernel sums
//! sine overtones four samples at a time: every quantity that can vary
//! per sample (frequency scale, amplitude law, boost window, ring
//! modulator, bend, volume) is read from the voice's curve matrix, so
//! parameter automation is audio-rate throughout.
//!
//! Overtones whose frequency falls outside `(0, freq_max]` are muted by
//! zeroing their amplitude while their phase keeps advancing, so the
//! anti-aliasing cutoff never causes phase discontinuities when a
//! partial slides back into range.

use crate::note::Note;
use crate::params::{MAX_OVERTONES, SrateParam, SynthParams, align_block};
use crate::voice::VirtualVoice;
use armonico_core::{F32x4, LANES, cos4, db_to_linear4, exp4, midi_to_freq, pow4, powsin4, sin4};

const TAU: f32 = core::f32::consts::TAU;
const LN_2: f32 = core::f32::consts::LN_2;

/// Reference rate for the boost window's frequency-to-position map. A
/// fixed reference keeps presets sounding the same at any output rate.
const WINDOW_RATE: f32 = 44_100.0;

/// Internal render block in frames.
const DEFAULT_BLOCK: usize = 256;

/// Per-block scratch shared by every voice render.
#[derive(Clone, Debug)]
struct KernelScratch {
    /// Bent carrier frequency per sample, Hz.
    freq: Vec<f32>,
    /// Anti-aliasing ceiling per sample, Hz.
    fmax: Vec<f32>,
    /// Voice-local accumulators, mixed into the block after the volume
    /// curve is applied.
    vleft: Vec<f32>,
    vright: Vec<f32>,
}

impl KernelScratch {
    fn new(block: usize) -> Self {
        Self {
            freq: vec![0.0; block],
            fmax: vec![0.0; block],
            vleft: vec![0.0; block],
            vright: vec![0.0; block],
        }
    }
}

/// Additive synthesizer with round-robin polyphony.
///
/// # Example
///
/// ```rust
/// use armonico_synth::{Note, SynthesisEngine};
///
/// let mut engine = SynthesisEngine::new(48_000.0);
/// engine.set_note(Note::Midi(69));
///
/// let mut out = vec![0.0f32; 2 * 480];
/// engine.process(&mut out);
/// ```
#[derive(Clone, Debug)]
pub struct SynthesisEngine {
    params: SynthParams,
    sample_rate: f32,
    block: usize,

    voices: Vec<VirtualVoice>,
    /// Next round-robin slot.
    next_slot: usize,
    /// Most recently triggered slot, the target of [`Note::Off`].
    last_slot: Option<usize>,

    left: Vec<f32>,
    right: Vec<f32>,
    scratch: KernelScratch,
    /// Interleaved rendered frames not yet consumed by `process`.
    remainder: Vec<f32>,
    remainder_pos: usize,

    samples_rendered: u64,
    blocks_rendered: u64,
    overtone_blocks: u64,
}

impl SynthesisEngine {
    /// New engine with the default parameter set.
    pub fn new(sample_rate: f32) -> Self {
        let block = align_block(DEFAULT_BLOCK);
        let params = SynthParams::default();
        let mut voices: Vec<VirtualVoice> = (0..crate::params::MAX_VIRTUAL_VOICES)
            .map(|_| VirtualVoice::new(sample_rate, block))
            .collect();
        for v in &mut voices {
            v.set_params(&params);
        }
        Self {
            params,
            sample_rate,
            block,
            voices,
            next_slot: 0,
            last_slot: None,
            left: vec![0.0; block],
            right: vec![0.0; block],
            scratch: KernelScratch::new(block),
            remainder: Vec::new(),
            remainder_pos: 0,
            samples_rendered: 0,
            blocks_rendered: 0,
            overtone_blocks: 0,
        }
    }

    /// Current parameters.
    pub fn params(&self) -> &SynthParams {
        &self.params
    }

    /// Replace the parameter set. Values are clamped to their documented
    /// ranges first. Changing `ringmod_ot_offset` reseeds every overtone
    /// accumulator in the pool to the new phase.
    pub fn set_params(&mut self, mut params: SynthParams) {
        params.clamp_ranges();
        let reseed = params.ringmod_ot_offset != self.params.ringmod_ot_offset;
        self.params = params;
        for v in &mut self.voices {
            v.set_params(&self.params);
            if reseed {
                v.reseed_phases(self.params.ringmod_ot_offset);
            }
        }
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Change the sample rate. Voice state is kept; only the time base
    /// and the LFO frequency map move.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        for v in &mut self.voices {
            v.set_sample_rate(sample_rate);
        }
    }

    /// Internal render block in frames.
    pub fn block_size(&self) -> usize {
        self.block
    }

    /// Change the internal render block. The requested size is rounded
    /// up to the vector-lane multiple. Buffered output is dropped.
    pub fn set_block_size(&mut self, frames: usize) {
        let block = align_block(frames);
        self.block = block;
        self.left = vec![0.0; block];
        self.right = vec![0.0; block];
        self.scratch = KernelScratch::new(block);
        self.remainder.clear();
        self.remainder_pos = 0;
        for v in &mut self.voices {
            v.set_block_size(block);
        }
    }

    /// Stream position in seconds of the next rendered block.
    fn stream_time(&self) -> f64 {
        self.samples_rendered as f64 / f64::from(self.sample_rate)
    }

    /// Feed one note event. Events take effect at the next internally
    /// rendered block.
    pub fn set_note(&mut self, note: Note) {
        let time = self.stream_time();
        match note {
            Note::None => {}
            Note::Off => {
                if let Some(slot) = self.last_slot {
                    self.voices[slot].release(time);
                }
            }
            Note::Midi(n) => {
                if self.params.release_on_note
                    && let Some(prev) = self.last_slot
                {
                    self.voices[prev].release(time);
                }
                let count = self.params.virtual_voices.max(1);
                let slot = self.next_slot % count;
                self.next_slot = (slot + 1) % count;
                self.voices[slot].trigger(time, midi_to_freq(n), self.params.anticlick_secs);
                self.last_slot = Some(slot);
            }
        }
    }

    /// Release every voice in the pool.
    pub fn all_notes_off(&mut self) {
        let time = self.stream_time();
        for v in &mut self.voices {
            v.release(time);
        }
    }

    /// Total blocks rendered.
    pub fn blocks_rendered(&self) -> u64 {
        self.blocks_rendered
    }

    /// Voice-blocks that ran the overtone kernel. Silent voices are
    /// skipped without touching this counter, so the difference against
    /// `blocks_rendered` measures how often the fast path fires.
    pub fn overtone_blocks(&self) -> u64 {
        self.overtone_blocks
    }

    /// Render interleaved stereo into `out`. Any even length is
    /// accepted; partial blocks are buffered internally.
    pub fn process(&mut self, out: &mut [f32]) {
        assert!(out.len() % 2 == 0, "interleaved stereo needs an even length");
        let mut written = 0;
        while written < out.len() {
            if self.remainder_pos >= self.remainder.len() {
                self.refill_remainder();
            }
            let avail = &self.remainder[self.remainder_pos..];
            let take = avail.len().min(out.len() - written);
            out[written..written + take].copy_from_slice(&avail[..take]);
            self.remainder_pos += take;
            written += take;
        }
    }

    fn refill_remainder(&mut self) {
        self.render_block();
        self.remainder.resize(2 * self.block, 0.0);
        for (i, (&l, &r)) in self.left.iter().zip(&self.right).enumerate() {
            self.remainder[2 * i] = l;
            self.remainder[2 * i + 1] = r;
        }
        self.remainder_pos = 0;
    }

    /// Render one block into `left`/`right`.
    fn render_block(&mut self) {
        let t0 = self.stream_time();
        let dt = 1.0 / f64::from(self.sample_rate);
        self.left.fill(0.0);
        self.right.fill(0.0);
        self.blocks_rendered += 1;

        let Self {
            params,
            voices,
            left,
            right,
            scratch,
            overtone_blocks,
            sample_rate,
            ..
        } = self;
        for voice in voices.iter_mut() {
            // Fast path: untriggered voices and voices whose volume
            // curve is all zero render nothing.
            if !voice.fill_curves(t0, dt, params) {
                continue;
            }
            *overtone_blocks += 1;
            render_voice(voice, params, *sample_rate, scratch, left, right);
        }

        self.samples_rendered += self.block as u64;
    }
}

/// Sum one voice's overtones into the block accumulators.
fn render_voice(
    voice: &mut VirtualVoice,
    params: &SynthParams,
    sample_rate: f32,
    scratch: &mut KernelScratch,
    left: &mut [f32],
    right: &mut [f32],
) {
    let block = left.len();
    let chunks = block / LANES;
    let inv_rate = 1.0 / sample_rate;

    // Carrier frequency and anti-alias ceiling, per sample. The ceiling
    // control maps exponentially over roughly 13.75 Hz..21.3 kHz.
    {
        let bend = voice.curve(SrateParam::Bend);
        let fmax_ctl = voice.curve(SrateParam::FreqMax);
        for ci in 0..chunks {
            let base = ci * LANES;
            let b = F32x4::from_slice(&bend[base..]);
            let f = F32x4::splat(voice.note_freq) * exp4(b * (LN_2 / 12.0));
            f.write_to(&mut scratch.freq[base..]);
            let c = F32x4::from_slice(&fmax_ctl[base..]);
            let m = 440.0 * exp4((c * 10.6 - 5.0) * LN_2);
            m.write_to(&mut scratch.fmax[base..]);
        }
    }

    scratch.vleft.fill(0.0);
    scratch.vright.fill(0.0);

    // Ring modulation engages per block, from the depth curve.
    let ring_on = voice.curve(SrateParam::RingmodDepth).iter().any(|&d| d > 0.0);

    let sum_start = libm::roundf(voice.curve(SrateParam::SumStartIdx)[0]) as i32;
    let idx_mul0 = voice.curve(SrateParam::FreqScaleIdxMul)[0];
    let offset0 = voice.curve(SrateParam::FreqScaleOffset)[0];

    let wanted = (params.overtones as usize).min(MAX_OVERTONES);
    let mut emitted = 0usize;
    let mut j = sum_start;
    let mut iterations = 0usize;
    while emitted < wanted && iterations < MAX_OVERTONES {
        iterations += 1;
        // Indices whose harmonic scale starts nonpositive produce no
        // audible partial; skip them without consuming a slot.
        if idx_mul0 * j as f32 + offset0 <= 0.0 {
            j += 1;
            continue;
        }
        debug_assert!(emitted < MAX_OVERTONES);
        render_overtone(voice, j, emitted, ring_on, inv_rate, scratch);
        emitted += 1;
        j += 1;
    }

    // Volume applies per voice so the pool can share the accumulators.
    let vol = voice.curve(SrateParam::Volume);
    for i in 0..block {
        left[i] += scratch.vleft[i] * vol[i];
        right[i] += scratch.vright[i] * vol[i];
    }
}

/// Render a single overtone into the voice-local accumulators.
fn render_overtone(
    voice: &mut VirtualVoice,
    j: i32,
    slot: usize,
    ring_on: bool,
    inv_rate: f32,
    scratch: &mut KernelScratch,
) {
    let block = scratch.vleft.len();
    let chunks = block / LANES;
    let jf = F32x4::splat(j as f32);

    let mut phase = voice.ot_phase[slot];
    let mut rm_phase = voice.ot_rm_phase[slot];

    let idx_mul = voice.curve(SrateParam::FreqScaleIdxMul);
    let offset = voice.curve(SrateParam::FreqScaleOffset);
    let pow_base = voice.curve(SrateParam::AmpPowBase);
    let exp_idx_mul = voice.curve(SrateParam::AmpExpIdxMul);
    let fs_exp = voice.curve(SrateParam::FreqScaleExp);
    let center = voice.curve(SrateParam::AmpBoostCenter);
    let sharp = voice.curve(SrateParam::AmpBoostSharpness);
    let boost_exp = voice.curve(SrateParam::AmpBoostExp);
    let boost_db = voice.curve(SrateParam::AmpBoostDb);
    let rm_rate = voice.curve(SrateParam::RingmodRate);
    let rm_depth = voice.curve(SrateParam::RingmodDepth);
    let width = voice.curve(SrateParam::StereoWidth);

    for ci in 0..chunks {
        let base = ci * LANES;
        let hs = F32x4::from_slice(&idx_mul[base..]) * jf + F32x4::from_slice(&offset[base..]);
        let of = F32x4::from_slice(&scratch.freq[base..]) * hs;

        let amp_pow = pow4(
            F32x4::from_slice(&pow_base[base..]),
            jf * F32x4::from_slice(&exp_idx_mul[base..]),
        );
        let amp_scale = pow4(hs, F32x4::from_slice(&fs_exp[base..]));
        let win = window_sharp_cosine(
            of,
            F32x4::from_slice(&center[base..]),
            F32x4::from_slice(&sharp[base..]),
        );
        let boost = F32x4::ONE
            + pow4(win, F32x4::from_slice(&boost_exp[base..]))
                * db_to_linear4(F32x4::from_slice(&boost_db[base..]));
        let mut amp = amp_pow * amp_scale * boost;

        // Anti-alias mute: zero the amplitude, keep the phase moving.
        let fmax = F32x4::from_slice(&scratch.fmax[base..]);
        let mute = of.le(F32x4::ZERO).or(of.gt(fmax));
        amp = F32x4::select(mute, F32x4::ZERO, amp);

        let inc = of * (TAU * inv_rate);
        let ph = F32x4::splat(phase) + inc.prefix_sum();
        phase = ph.lane(LANES - 1);

        let sample = sin4(ph) * amp;

        if ring_on {
            let rm_inc = inc * F32x4::from_slice(&rm_depth[base..]);
            let rm_ph = F32x4::splat(rm_phase) + rm_inc.prefix_sum();
            rm_phase = rm_ph.lane(LANES - 1);
            let e = F32x4::from_slice(&rm_rate[base..]);
            let spread = F32x4::from_slice(&width[base..]) * TAU;
            let l = sample * powsin4(rm_ph, e);
            let r = sample * powsin4(rm_ph + spread, e);
            (F32x4::from_slice(&scratch.vleft[base..]) + l).write_to(&mut scratch.vleft[base..]);
            (F32x4::from_slice(&scratch.vright[base..]) + r).write_to(&mut scratch.vright[base..]);
        } else {
            (F32x4::from_slice(&scratch.vleft[base..]) + sample)
                .write_to(&mut scratch.vleft[base..]);
            (F32x4::from_slice(&scratch.vright[base..]) + sample)
                .write_to(&mut scratch.vright[base..]);
        }
    }

    voice.ot_phase[slot] = wrap_phase(phase);
    voice.ot_rm_phase[slot] = wrap_phase(rm_phase);
}

/// Raised-cosine window over frequency, sharpness-scaled around
/// `center`. Zero sharpness disables the window entirely.
fn window_sharp_cosine(x: F32x4, center: F32x4, sharp: F32x4) -> F32x4 {
    let half = F32x4::splat(WINDOW_RATE / 2.0) / sharp;
    let t = (sharp * (x + half - center) * (1.0 / WINDOW_RATE)).clamp(0.0, 1.0);
    let win = 0.5 - 0.5 * cos4(t * TAU);
    F32x4::select(sharp.eq_lanes(F32x4::ZERO), F32x4::ZERO, win)
}

/// Wrap a phase accumulator into `[0, 2π)`.
fn wrap_phase(p: f32) -> f32 {
    p - TAU * libm::floorf(p / TAU)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: f32 = 48_000.0;

    fn engine_with(f: impl FnOnce(&mut SynthParams)) -> SynthesisEngine {
        let mut engine = SynthesisEngine::new(RATE);
        let mut p = engine.params().clone();
        f(&mut p);
        engine.set_params(p);
        engine
    }

    #[test]
    fn untriggered_engine_is_silent_and_skips_kernel() {
        let mut engine = SynthesisEngine::new(RATE);
        let mut out = vec![1.0f32; 2 * 1024];
        engine.process(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
        assert!(engine.blocks_rendered() > 0);
        assert_eq!(engine.overtone_blocks(), 0);
    }

    #[test]
    fn triggered_note_produces_output() {
        let mut engine = SynthesisEngine::new(RATE);
        engine.set_note(Note::Midi(69));
        let mut out = vec![0.0f32; 2 * 4096];
        engine.process(&mut out);
        assert!(out.iter().any(|&s| s.abs() > 1e-3));
        assert!(out.iter().all(|&s| s.is_finite()));
        assert!(engine.overtone_blocks() > 0);
    }

    #[test]
    fn note_none_is_a_strict_noop() {
        let mut a = SynthesisEngine::new(RATE);
        let mut b = SynthesisEngine::new(RATE);
        a.set_note(Note::Midi(60));
        b.set_note(Note::Midi(60));
        b.set_note(Note::None);
        let mut oa = vec![0.0f32; 2 * 2048];
        let mut ob = vec![0.0f32; 2 * 2048];
        a.process(&mut oa);
        b.process(&mut ob);
        assert_eq!(oa, ob);
    }

    #[test]
    fn zero_volume_takes_the_fast_path() {
        let mut engine = engine_with(|p| p.volume = 0.0);
        engine.set_note(Note::Midi(69));
        let mut out = vec![0.0f32; 2 * 4096];
        engine.process(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
        assert_eq!(engine.overtone_blocks(), 0);
    }

    #[test]
    fn round_robin_reuses_slots_in_order() {
        let mut engine = engine_with(|p| {
            p.virtual_voices = 2;
            p.release_on_note = false;
        });
        engine.set_note(Note::Midi(60));
        assert_eq!(engine.last_slot, Some(0));
        engine.set_note(Note::Midi(64));
        assert_eq!(engine.last_slot, Some(1));
        engine.set_note(Note::Midi(67));
        assert_eq!(engine.last_slot, Some(0));
    }

    #[test]
    fn note_off_releases_and_decays_to_silence() {
        let mut engine = engine_with(|p| {
            p.mod_channels[0].target = Some(SrateParam::Volume);
            p.mod_channels[0].adsr.attack_secs = 0.01;
            p.mod_channels[0].adsr.decay_secs = 0.01;
            p.mod_channels[0].adsr.release_secs = 0.05;
        });
        engine.set_note(Note::Midi(69));
        let mut out = vec![0.0f32; 2 * 4800];
        engine.process(&mut out);
        assert!(out.iter().any(|&s| s.abs() > 1e-3));

        engine.set_note(Note::Off);
        // Render well past the release tail.
        let mut tail = vec![0.0f32; 2 * 48_000];
        engine.process(&mut tail);
        let back = &tail[tail.len() - 2 * 4096..];
        assert!(back.iter().all(|&s| s.abs() < 1e-4));
    }

    #[test]
    fn stereo_channels_match_without_ring_spread() {
        let mut engine = SynthesisEngine::new(RATE);
        engine.set_note(Note::Midi(57));
        let mut out = vec![0.0f32; 2 * 2048];
        engine.process(&mut out);
        for fr in out.chunks_exact(2) {
            assert_eq!(fr[0], fr[1]);
        }
    }

    #[test]
    fn ring_spread_decorrelates_channels() {
        let mut engine = engine_with(|p| {
            p.ringmod_depth = 0.25;
            p.stereo_width = 0.25;
        });
        engine.set_note(Note::Midi(57));
        let mut out = vec![0.0f32; 2 * 8192];
        engine.process(&mut out);
        assert!(out.iter().all(|&s| s.is_finite()));
        assert!(out.chunks_exact(2).any(|fr| (fr[0] - fr[1]).abs() > 1e-4));
    }

    #[test]
    fn block_size_is_lane_aligned() {
        let mut engine = SynthesisEngine::new(RATE);
        engine.set_block_size(129);
        assert_eq!(engine.block_size() % LANES, 0);
        assert!(engine.block_size() >= 129);
        engine.set_note(Note::Midi(69));
        let mut out = vec![0.0f32; 2 * 1000];
        engine.process(&mut out);
        assert!(out.iter().any(|&s| s.abs() > 1e-3));
    }

    #[test]
    fn window_disabled_at_zero_sharpness() {
        let x = F32x4::new([100.0, 1000.0, 10_000.0, 20_000.0]);
        let win = window_sharp_cosine(x, F32x4::splat(1000.0), F32x4::ZERO);
        assert!(win.to_array().iter().all(|&w| w == 0.0));
    }

    #[test]
    fn window_peaks_at_center() {
        let sharp = F32x4::splat(50.0);
        let center = F32x4::splat(1000.0);
        let at_center = window_sharp_cosine(F32x4::splat(1000.0), center, sharp);
        let off = window_sharp_cosine(F32x4::splat(3000.0), center, sharp);
        for i in 0..LANES {
            assert!((at_center.lane(i) - 1.0).abs() < 1e-3);
            assert!(off.lane(i) < at_center.lane(i));
        }
    }

    #[test]
    fn wrap_phase_stays_in_range() {
        for p in [-10.0f32, -0.1, 0.0, 3.0, 6.4, 100.0] {
            let w = wrap_phase(p);
            assert!((0.0..TAU).contains(&w), "{p} wrapped to {w}");
            let turns = (p - w) / TAU;
            assert!((turns - libm::roundf(turns)).abs() < 1e-3);
        }
    }
}
