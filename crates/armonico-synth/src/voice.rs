//! Virtual voices: per-note modulation state and parameter curves.
//!
//! A virtual voice owns one envelope+LFO pair per modulation channel and
//! a dense curve matrix with one row per [`SrateParam`]. Every block the
//! voice resolves its channels (cross-modulation masters first), seeds
//! each row with the parameter's broadcast scalar, and multiplies every
//! targeting channel's combined curve into its row. The overtone kernel
//! then reads rows sample-by-sample and never touches scalar parameters
//! directly.

use crate::envelope::Adsr;
use crate::lfo::Lfo;
use crate::params::{MAX_OVERTONES, MOD_CHANNELS, ModVoiceParams, SrateParam, SynthParams};

const TAU: f32 = core::f32::consts::TAU;

/// One envelope+LFO pair feeding a target parameter curve.
#[derive(Clone, Debug)]
pub(crate) struct ModChannel {
    pub(crate) adsr: Adsr,
    pub(crate) lfo: Lfo,
    /// Row this channel multiplies into; `None` leaves it unrouted but
    /// still computed, so it can serve as a cross-modulation master.
    pub(crate) target: Option<SrateParam>,
    /// Combined envelope and LFO output for the current block.
    pub(crate) curve: Vec<f32>,
    /// Whether the current block's curve has any nonzero sample.
    pub(crate) nonzero: bool,
}

impl ModChannel {
    fn new(sample_rate: f32, block: usize) -> Self {
        Self {
            adsr: Adsr::new(Default::default()),
            lfo: Lfo::new(sample_rate),
            target: None,
            curve: vec![0.0; block],
            nonzero: false,
        }
    }

    fn apply_params(&mut self, p: &ModVoiceParams) {
        self.adsr.set_params(p.adsr);
        self.lfo.set_params(p.lfo);
        self.target = p.target;
    }
}

/// Per-block channel resolution state for the cross-modulation graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ChannelState {
    NotStarted,
    /// Currently resolving; seeing this again means a cycle, and the
    /// dependent channel runs unmastered.
    InProgress,
    Done,
}

/// One slot of the polyphony pool.
#[derive(Clone, Debug)]
pub struct VirtualVoice {
    pub(crate) channels: Vec<ModChannel>,
    states: [ChannelState; MOD_CHANNELS],
    /// Copy of a master channel's curve, taken before the dependent
    /// channel borrows itself mutably.
    cross_scratch: Vec<f32>,

    /// Dense curve matrix, `SrateParam::COUNT` rows of `block` samples.
    curves: Vec<f32>,
    block: usize,
    sample_rate: f32,

    /// Base frequency of the triggered note, Hz.
    pub(crate) note_freq: f32,
    triggered: bool,

    /// Per-overtone phase accumulators in radians, wrapped once per
    /// block. The ring modulator keeps its own accumulator per overtone.
    pub(crate) ot_phase: Vec<f32>,
    pub(crate) ot_rm_phase: Vec<f32>,
}

impl VirtualVoice {
    /// New silent voice. `block` must be a multiple of 4.
    pub fn new(sample_rate: f32, block: usize) -> Self {
        Self {
            channels: (0..MOD_CHANNELS)
                .map(|_| ModChannel::new(sample_rate, block))
                .collect(),
            states: [ChannelState::NotStarted; MOD_CHANNELS],
            cross_scratch: vec![0.0; block],
            curves: vec![0.0; SrateParam::COUNT * block],
            block,
            sample_rate,
            note_freq: 0.0,
            triggered: false,
            ot_phase: vec![0.0; MAX_OVERTONES],
            ot_rm_phase: vec![0.0; MAX_OVERTONES],
        }
    }

    /// Push the shared channel parameters down to this voice.
    pub fn set_params(&mut self, params: &SynthParams) {
        for (ch, p) in self.channels.iter_mut().zip(&params.mod_channels) {
            ch.apply_params(p);
        }
    }

    /// Resize the internal block. Clears curve contents, not note state.
    pub fn set_block_size(&mut self, block: usize) {
        self.block = block;
        self.curves = vec![0.0; SrateParam::COUNT * block];
        self.cross_scratch = vec![0.0; block];
        for ch in &mut self.channels {
            ch.curve = vec![0.0; block];
            ch.nonzero = false;
        }
    }

    /// Update the sample rate used by the LFO frequency map.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        for ch in &mut self.channels {
            ch.lfo.set_sample_rate(sample_rate);
        }
    }

    /// Trigger a note at `time` seconds. Retriggering an audible voice
    /// starts with the anti-click fade instead of a hard reset.
    pub fn trigger(&mut self, time: f64, freq: f32, anticlick_secs: f32) {
        self.note_freq = freq;
        self.triggered = true;
        for ch in &mut self.channels {
            ch.adsr.trigger(time, anticlick_secs);
        }
    }

    /// Schedule the release of every channel envelope at `time`.
    pub fn release(&mut self, time: f64) {
        for ch in &mut self.channels {
            ch.adsr.off(time);
        }
    }

    /// Whether this voice has ever been triggered.
    pub fn is_triggered(&self) -> bool {
        self.triggered
    }

    /// Reset every overtone accumulator to the same phase, in turns.
    pub fn reseed_phases(&mut self, offset_turns: f32) {
        let phase = TAU * offset_turns;
        self.ot_phase.fill(phase);
        self.ot_rm_phase.fill(phase);
    }

    /// One row of the curve matrix.
    pub fn curve(&self, param: SrateParam) -> &[f32] {
        &self.curves[param.index() * self.block..][..self.block]
    }

    /// Rebuild the curve matrix for the block starting at `t0` seconds.
    ///
    /// Returns false when the voice is certain to be silent (never
    /// triggered, or the volume row is all zero), in which case the
    /// matrix contents are unspecified and the kernel must be skipped.
    pub fn fill_curves(&mut self, t0: f64, dt: f64, params: &SynthParams) -> bool {
        if !self.triggered {
            return false;
        }

        self.states = [ChannelState::NotStarted; MOD_CHANNELS];
        for idx in 0..MOD_CHANNELS {
            self.resolve_channel(idx, t0, dt);
        }

        for param in SrateParam::ALL {
            let scalar = params.scalar_for(param);
            let row = &mut self.curves[param.index() * self.block..][..self.block];
            row.fill(scalar);
        }
        for ch in &self.channels {
            let Some(target) = ch.target else { continue };
            let row = &mut self.curves[target.index() * self.block..][..self.block];
            if ch.nonzero {
                for (r, c) in row.iter_mut().zip(&ch.curve) {
                    *r *= c;
                }
            } else {
                row.fill(0.0);
            }
        }

        self.curve(SrateParam::Volume).iter().any(|&v| v != 0.0)
    }

    /// Resolve one channel's combined curve, masters first.
    fn resolve_channel(&mut self, idx: usize, t0: f64, dt: f64) {
        match self.states[idx] {
            ChannelState::Done | ChannelState::InProgress => return,
            ChannelState::NotStarted => {}
        }
        self.states[idx] = ChannelState::InProgress;

        let master_idx = self.channels[idx].lfo.params().master_voice;
        let mut use_master = false;
        if let Some(m) = master_idx
            && m != idx
            && m < MOD_CHANNELS
        {
            self.resolve_channel(m, t0, dt);
            // A master still mid-resolution is a cycle; fall back to the
            // unmastered curve rather than chase it.
            if self.states[m] == ChannelState::Done {
                self.cross_scratch.copy_from_slice(&self.channels[m].curve);
                use_master = true;
            }
        }

        let scratch = &self.cross_scratch;
        let ch = &mut self.channels[idx];
        let env_nonzero = ch.adsr.fill(t0, dt, &mut ch.curve);
        // The LFO advances its phase even under a silent envelope so it
        // stays continuous across note boundaries.
        let master = use_master.then_some(scratch.as_slice());
        ch.lfo.accumulate(dt, &mut ch.curve, master);
        ch.nonzero = env_nonzero;

        self.states[idx] = ChannelState::Done;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::LfoModTarget;

    const RATE: f32 = 48_000.0;
    const BLOCK: usize = 64;
    const DT: f64 = 1.0 / 48_000.0;

    fn voice_with(params: &SynthParams) -> VirtualVoice {
        let mut v = VirtualVoice::new(RATE, BLOCK);
        v.set_params(params);
        v
    }

    #[test]
    fn untriggered_voice_reports_silence() {
        let params = SynthParams::default();
        let mut v = voice_with(&params);
        assert!(!v.fill_curves(0.0, DT, &params));
    }

    #[test]
    fn untargeted_rows_hold_broadcast_scalars() {
        let mut params = SynthParams::default();
        params.mod_channels[0].target = Some(SrateParam::Volume);
        let mut v = voice_with(&params);
        v.trigger(0.0, 440.0, params.anticlick_secs);
        assert!(v.fill_curves(0.5, DT, &params));
        // Bend has no channel targeting it.
        for &s in v.curve(SrateParam::Bend) {
            assert_eq!(s, params.bend);
        }
        for &s in v.curve(SrateParam::AmpPowBase) {
            assert_eq!(s, params.amp_pow_base);
        }
    }

    #[test]
    fn targeted_row_is_scalar_times_envelope() {
        let mut params = SynthParams::default();
        params.mod_channels[0].target = Some(SrateParam::Volume);
        let mut v = voice_with(&params);
        v.trigger(0.0, 440.0, params.anticlick_secs);

        let t0 = 0.25;
        assert!(v.fill_curves(t0, DT, &params));
        let mut reference = Adsr::new(params.mod_channels[0].adsr);
        reference.trigger(0.0, params.anticlick_secs);
        for (i, &s) in v.curve(SrateParam::Volume).iter().enumerate() {
            let env = reference.value(t0 + i as f64 * DT);
            assert!(
                (s - params.volume * env).abs() < 1e-5,
                "sample {i}: {s} vs {}",
                params.volume * env
            );
        }
    }

    #[test]
    fn released_voice_eventually_zeroes_volume_row() {
        let mut params = SynthParams::default();
        params.mod_channels[0].target = Some(SrateParam::Volume);
        let mut v = voice_with(&params);
        v.trigger(0.0, 440.0, params.anticlick_secs);
        v.release(1.0);
        // Well past release end (release_secs is 0.5).
        assert!(!v.fill_curves(10.0, DT, &params));
    }

    #[test]
    fn cross_mod_cycle_falls_back_to_unmastered() {
        let mut params = SynthParams::default();
        params.mod_channels[0].target = Some(SrateParam::Volume);
        params.mod_channels[1].target = Some(SrateParam::Bend);
        // Deliberate two-cycle: each channel masters the other.
        params.mod_channels[0].lfo.frequency = 0.2;
        params.mod_channels[0].lfo.master_voice = Some(1);
        params.mod_channels[0].lfo.master_param = Some(LfoModTarget::Amplitude);
        params.mod_channels[1].lfo.frequency = 0.2;
        params.mod_channels[1].lfo.master_voice = Some(0);
        params.mod_channels[1].lfo.master_param = Some(LfoModTarget::Amplitude);

        let mut v = voice_with(&params);
        v.trigger(0.0, 440.0, params.anticlick_secs);
        v.fill_curves(0.5, DT, &params);
        for &s in v.curve(SrateParam::Volume) {
            assert!(s.is_finite());
        }
        for &s in v.curve(SrateParam::Bend) {
            assert!(s.is_finite());
        }
    }

    #[test]
    fn self_mastering_channel_runs_unmastered() {
        let mut params = SynthParams::default();
        params.mod_channels[0].target = Some(SrateParam::Volume);
        params.mod_channels[0].lfo.frequency = 0.2;
        params.mod_channels[0].lfo.master_voice = Some(0);
        params.mod_channels[0].lfo.master_param = Some(LfoModTarget::Amplitude);
        let mut v = voice_with(&params);
        v.trigger(0.0, 440.0, params.anticlick_secs);
        v.fill_curves(0.5, DT, &params);
        for &s in v.curve(SrateParam::Volume) {
            assert!(s.is_finite());
        }
    }

    #[test]
    fn reseed_sets_every_accumulator() {
        let params = SynthParams::default();
        let mut v = voice_with(&params);
        v.ot_phase[3] = 1.0;
        v.ot_rm_phase[7] = 2.0;
        v.reseed_phases(0.25);
        let expect = core::f32::consts::TAU * 0.25;
        assert!(v.ot_phase.iter().all(|&p| (p - expect).abs() < 1e-6));
        assert!(v.ot_rm_phase.iter().all(|&p| (p - expect).abs() < 1e-6));
    }
}
