//! Typed synthesis parameters and the audio-rate automation surface.
//!
//! The engine reads typed fields only; the string-id descriptor table at
//! the bottom exists for hosts and preset files, and clamps every write to
//! its documented range so out-of-range values can never reach the kernel.

use armonico_core::LANES;

/// Maximum overtones a single virtual voice will sum.
pub const MAX_OVERTONES: usize = 600;

/// Modulation channels per virtual voice (envelope + LFO pairs).
pub const MOD_CHANNELS: usize = 4;

/// Size of the virtual-voice pool. All slots are allocated up front;
/// `virtual_voices` selects how many take part in round-robin allocation.
pub const MAX_VIRTUAL_VOICES: usize = 10;

/// Audio-rate-automatable parameters.
///
/// Each variant indexes one row of a virtual voice's per-sample curve
/// matrix. A curve starts as the parameter's broadcast scalar and is
/// multiplied by the combined envelope×LFO output of every modulation
/// channel targeting it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SrateParam {
    /// Anti-aliasing cutoff control, 0..1 (exponential map to Hz).
    FreqMax,
    /// First overtone index of the summation.
    SumStartIdx,
    /// Base of the per-overtone amplitude power law.
    AmpPowBase,
    /// Index multiplier inside the amplitude exponent.
    AmpExpIdxMul,
    /// Index multiplier of the harmonic frequency scale.
    FreqScaleIdxMul,
    /// Offset of the harmonic frequency scale.
    FreqScaleOffset,
    /// Exponent applied to the harmonic scale in the amplitude law.
    FreqScaleExp,
    /// Center frequency of the raised-cosine amplitude boost window, Hz.
    AmpBoostCenter,
    /// Sharpness of the boost window (0 disables it).
    AmpBoostSharpness,
    /// Exponent applied to the boost window.
    AmpBoostExp,
    /// Boost amount in dB at the window peak.
    AmpBoostDb,
    /// Ring modulator waveshaping exponent.
    RingmodRate,
    /// Ring modulator frequency as a fraction of the overtone frequency.
    RingmodDepth,
    /// Phase-reset offset for all overtone accumulators, in turns.
    RingmodOtOffset,
    /// Pitch bend in semitones.
    Bend,
    /// Stereo spread of the ring modulator, in turns.
    StereoWidth,
    /// Output volume.
    Volume,
}

impl SrateParam {
    /// Number of automatable parameters (rows in the curve matrix).
    pub const COUNT: usize = 17;

    /// All parameters, in curve-matrix row order.
    pub const ALL: [SrateParam; Self::COUNT] = [
        SrateParam::FreqMax,
        SrateParam::SumStartIdx,
        SrateParam::AmpPowBase,
        SrateParam::AmpExpIdxMul,
        SrateParam::FreqScaleIdxMul,
        SrateParam::FreqScaleOffset,
        SrateParam::FreqScaleExp,
        SrateParam::AmpBoostCenter,
        SrateParam::AmpBoostSharpness,
        SrateParam::AmpBoostExp,
        SrateParam::AmpBoostDb,
        SrateParam::RingmodRate,
        SrateParam::RingmodDepth,
        SrateParam::RingmodOtOffset,
        SrateParam::Bend,
        SrateParam::StereoWidth,
        SrateParam::Volume,
    ];

    /// Row index in the curve matrix.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// LFO waveform selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LfoWaveform {
    /// Sine with a shape-controlled waveshaping exponent.
    #[default]
    Sine,
    /// Square with shape as the duty-cycle threshold.
    Square,
    /// Falling sawtooth with a shape-controlled edge exponent.
    Saw,
    /// Triangle with a shape-controlled edge exponent.
    Triangle,
    /// Stepped noise, redrawn once per LFO period.
    Noise,
}

/// Which LFO parameter a cross-modulation master drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LfoModTarget {
    /// Output amplitude.
    Amplitude,
    /// Frequency control.
    Frequency,
    /// Waveform shape.
    Shape,
    /// Smoothing filter amount.
    Filter,
    /// DC offset added before the amplitude multiply.
    Offset,
    /// Phase offset in turns.
    Phase,
}

/// Envelope parameters for one modulation channel.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AdsrParams {
    /// Level at the end of the attack segment, 0..1.
    pub attack_level: f32,
    /// Attack length in seconds, 0..20.
    pub attack_secs: f32,
    /// Attack curve exponent, 0..10 (1 = linear).
    pub attack_pow: f32,
    /// Sustain level, 0..1.
    pub sustain_level: f32,
    /// Decay length in seconds, 0..20.
    pub decay_secs: f32,
    /// Decay curve exponent, 0..10.
    pub decay_pow: f32,
    /// Release length in seconds, 0..20.
    pub release_secs: f32,
    /// Release curve exponent, 0..10.
    pub release_pow: f32,
    /// Schedule the release at the end of decay automatically.
    pub auto_release: bool,
}

impl Default for AdsrParams {
    fn default() -> Self {
        Self {
            attack_level: 1.0,
            attack_secs: 0.5,
            attack_pow: 1.0,
            sustain_level: 0.75,
            decay_secs: 1.0,
            decay_pow: 1.0,
            release_secs: 0.5,
            release_pow: 1.0,
            auto_release: false,
        }
    }
}

impl AdsrParams {
    /// Clamp every field to its documented range.
    pub fn clamp_ranges(&mut self) {
        self.attack_level = self.attack_level.clamp(0.0, 1.0);
        self.attack_secs = self.attack_secs.clamp(0.0, 20.0);
        self.attack_pow = self.attack_pow.clamp(0.0, 10.0);
        self.sustain_level = self.sustain_level.clamp(0.0, 1.0);
        self.decay_secs = self.decay_secs.clamp(0.0, 20.0);
        self.decay_pow = self.decay_pow.clamp(0.0, 10.0);
        self.release_secs = self.release_secs.clamp(0.0, 20.0);
        self.release_pow = self.release_pow.clamp(0.0, 10.0);
    }
}

/// LFO parameters for one modulation channel.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LfoParams {
    /// Output amplitude, 0..10.
    pub amplitude: f32,
    /// Frequency control, 0..1. 0 disables the LFO; otherwise the control
    /// maps exponentially from a one-minute period up to a one-sample
    /// period at the current sample rate.
    pub frequency: f32,
    /// Waveform shape, 0..1. Meaning depends on the waveform.
    pub shape: f32,
    /// Output smoothing, 0..1. 0 is none; the top end is heavy.
    pub filter: f32,
    /// DC offset added to the waveform before the amplitude multiply, -1..1.
    pub offset: f32,
    /// Phase offset in turns, -1..1.
    pub phase: f32,
    /// Waveform.
    pub waveform: LfoWaveform,
    /// Modulation channel whose combined curve drives [`Self::master_param`].
    pub master_voice: Option<usize>,
    /// Which of this LFO's parameters the master curve multiplies.
    pub master_param: Option<LfoModTarget>,
}

impl Default for LfoParams {
    fn default() -> Self {
        Self {
            amplitude: 1.0,
            frequency: 0.0,
            shape: 0.5,
            filter: 0.0,
            offset: 0.0,
            phase: 0.0,
            waveform: LfoWaveform::Sine,
            master_voice: None,
            master_param: None,
        }
    }
}

impl LfoParams {
    /// Clamp every field to its documented range.
    pub fn clamp_ranges(&mut self) {
        self.amplitude = self.amplitude.clamp(0.0, 10.0);
        self.frequency = self.frequency.clamp(0.0, 1.0);
        self.shape = self.shape.clamp(0.0, 1.0);
        self.filter = self.filter.clamp(0.0, 1.0);
        self.offset = self.offset.clamp(-1.0, 1.0);
        self.phase = self.phase.clamp(-1.0, 1.0);
        if let Some(v) = self.master_voice
            && v >= MOD_CHANNELS
        {
            self.master_voice = None;
        }
    }
}

/// One modulation channel: an envelope and an LFO feeding a target
/// parameter curve.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModVoiceParams {
    /// Curve this channel multiplies into; `None` leaves the channel
    /// computed but unrouted (still usable as a cross-mod master).
    pub target: Option<SrateParam>,
    /// Envelope settings.
    pub adsr: AdsrParams,
    /// LFO settings.
    pub lfo: LfoParams,
}

/// The full parameter set of the engine.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SynthParams {
    /// Number of overtones to sum per voice, 0..=600.
    pub overtones: u32,
    /// First overtone index, -10..=25. Negative indices let the harmonic
    /// scale run through zero for inharmonic spectra.
    pub sum_start_idx: i32,
    /// Base of the amplitude power law, -10..10.
    pub amp_pow_base: f32,
    /// Index multiplier in the amplitude exponent, -10..10.
    pub amp_exp_idx_mul: f32,
    /// Harmonic scale index multiplier, -10..10.
    pub freq_scale_idx_mul: f32,
    /// Harmonic scale offset, -10..10.
    pub freq_scale_offset: f32,
    /// Harmonic scale exponent in the amplitude law, -10..1.
    pub freq_scale_exp: f32,
    /// Anti-aliasing cutoff control, 0..1.
    pub freq_max: f32,
    /// Boost window center, 0..22050 Hz.
    pub amp_boost_center: f32,
    /// Boost window sharpness, 0..200. 0 disables the window.
    pub amp_boost_sharpness: f32,
    /// Boost window exponent, 0..1024.
    pub amp_boost_exp: f32,
    /// Boost amount, 0..100 dB.
    pub amp_boost_db: f32,
    /// Ring modulator waveshaping exponent, 0..5.
    pub ringmod_rate: f32,
    /// Ring modulator frequency fraction, 0..0.5. 0 disables it.
    pub ringmod_depth: f32,
    /// Overtone phase-reset offset in turns, 0..1.
    pub ringmod_ot_offset: f32,
    /// Pitch bend in semitones, -64..64.
    pub bend: f32,
    /// Ring modulator stereo spread in turns, 0..1.
    pub stereo_width: f32,
    /// Output volume, 0..1.
    pub volume: f32,
    /// Voices taking part in round-robin allocation, 1..=10.
    pub virtual_voices: usize,
    /// Release the previously triggered voice when a new note arrives.
    pub release_on_note: bool,
    /// Anti-click fade-to-zero ceiling on retrigger, 0..0.25 seconds.
    pub anticlick_secs: f32,
    /// Modulation channels, shared by every virtual voice.
    pub mod_channels: [ModVoiceParams; MOD_CHANNELS],
}

impl Default for SynthParams {
    fn default() -> Self {
        Self {
            overtones: 10,
            sum_start_idx: 1,
            amp_pow_base: 1.0,
            amp_exp_idx_mul: 1.0,
            freq_scale_idx_mul: 1.0,
            freq_scale_offset: 0.0,
            freq_scale_exp: -1.0,
            freq_max: 1.0,
            amp_boost_center: 0.0,
            amp_boost_sharpness: 0.0,
            amp_boost_exp: 2.0,
            amp_boost_db: 2.0,
            ringmod_rate: 1.0,
            ringmod_depth: 0.0,
            ringmod_ot_offset: 0.0,
            bend: 0.0,
            stereo_width: 0.0,
            volume: 0.5,
            virtual_voices: 1,
            release_on_note: true,
            anticlick_secs: 0.05,
            mod_channels: [ModVoiceParams::default(); MOD_CHANNELS],
        }
    }
}

impl SynthParams {
    /// The broadcast scalar seeding the curve of `param`.
    pub fn scalar_for(&self, param: SrateParam) -> f32 {
        match param {
            SrateParam::FreqMax => self.freq_max,
            SrateParam::SumStartIdx => self.sum_start_idx as f32,
            SrateParam::AmpPowBase => self.amp_pow_base,
            SrateParam::AmpExpIdxMul => self.amp_exp_idx_mul,
            SrateParam::FreqScaleIdxMul => self.freq_scale_idx_mul,
            SrateParam::FreqScaleOffset => self.freq_scale_offset,
            SrateParam::FreqScaleExp => self.freq_scale_exp,
            SrateParam::AmpBoostCenter => self.amp_boost_center,
            SrateParam::AmpBoostSharpness => self.amp_boost_sharpness,
            SrateParam::AmpBoostExp => self.amp_boost_exp,
            SrateParam::AmpBoostDb => self.amp_boost_db,
            SrateParam::RingmodRate => self.ringmod_rate,
            SrateParam::RingmodDepth => self.ringmod_depth,
            SrateParam::RingmodOtOffset => self.ringmod_ot_offset,
            SrateParam::Bend => self.bend,
            SrateParam::StereoWidth => self.stereo_width,
            SrateParam::Volume => self.volume,
        }
    }

    /// Clamp every field, including the modulation channels, to its
    /// documented range. Preset loaders call this after deserializing.
    pub fn clamp_ranges(&mut self) {
        self.overtones = self.overtones.min(MAX_OVERTONES as u32);
        self.sum_start_idx = self.sum_start_idx.clamp(-10, 25);
        self.amp_pow_base = self.amp_pow_base.clamp(-10.0, 10.0);
        self.amp_exp_idx_mul = self.amp_exp_idx_mul.clamp(-10.0, 10.0);
        self.freq_scale_idx_mul = self.freq_scale_idx_mul.clamp(-10.0, 10.0);
        self.freq_scale_offset = self.freq_scale_offset.clamp(-10.0, 10.0);
        self.freq_scale_exp = self.freq_scale_exp.clamp(-10.0, 1.0);
        self.freq_max = self.freq_max.clamp(0.0, 1.0);
        self.amp_boost_center = self.amp_boost_center.clamp(0.0, 22050.0);
        self.amp_boost_sharpness = self.amp_boost_sharpness.clamp(0.0, 200.0);
        self.amp_boost_exp = self.amp_boost_exp.clamp(0.0, 1024.0);
        self.amp_boost_db = self.amp_boost_db.clamp(0.0, 100.0);
        self.ringmod_rate = self.ringmod_rate.clamp(0.0, 5.0);
        self.ringmod_depth = self.ringmod_depth.clamp(0.0, 0.5);
        self.ringmod_ot_offset = self.ringmod_ot_offset.clamp(0.0, 1.0);
        self.bend = self.bend.clamp(-64.0, 64.0);
        self.stereo_width = self.stereo_width.clamp(0.0, 1.0);
        self.volume = self.volume.clamp(0.0, 1.0);
        self.virtual_voices = self.virtual_voices.clamp(1, MAX_VIRTUAL_VOICES);
        self.anticlick_secs = self.anticlick_secs.clamp(0.0, 0.25);
        for ch in &mut self.mod_channels {
            ch.adsr.clamp_ranges();
            ch.lfo.clamp_ranges();
        }
    }

    /// Set a global parameter by descriptor id. The value is clamped to
    /// the descriptor range. Returns false for an unknown id.
    pub fn set_by_id(&mut self, id: &str, value: f32) -> bool {
        let Some(desc) = descriptor(id) else {
            return false;
        };
        let v = value.clamp(desc.min, desc.max);
        match id {
            "overtones" => self.overtones = v as u32,
            "sum-start-idx" => self.sum_start_idx = v as i32,
            "amp-pow-base" => self.amp_pow_base = v,
            "amp-exp-idx-mul" => self.amp_exp_idx_mul = v,
            "freq-scale-idx-mul" => self.freq_scale_idx_mul = v,
            "freq-scale-offset" => self.freq_scale_offset = v,
            "freq-scale-exp" => self.freq_scale_exp = v,
            "freq-max" => self.freq_max = v,
            "amp-boost-center" => self.amp_boost_center = v,
            "amp-boost-sharpness" => self.amp_boost_sharpness = v,
            "amp-boost-exp" => self.amp_boost_exp = v,
            "amp-boost-db" => self.amp_boost_db = v,
            "ringmod-rate" => self.ringmod_rate = v,
            "ringmod-depth" => self.ringmod_depth = v,
            "ringmod-ot-offset" => self.ringmod_ot_offset = v,
            "bend" => self.bend = v,
            "stereo-width" => self.stereo_width = v,
            "volume" => self.volume = v,
            "virtual-voices" => self.virtual_voices = v as usize,
            "release-on-note" => self.release_on_note = v != 0.0,
            "anticlick-secs" => self.anticlick_secs = v,
            _ => return false,
        }
        true
    }

    /// Read a global parameter by descriptor id.
    pub fn get_by_id(&self, id: &str) -> Option<f32> {
        let v = match id {
            "overtones" => self.overtones as f32,
            "sum-start-idx" => self.sum_start_idx as f32,
            "amp-pow-base" => self.amp_pow_base,
            "amp-exp-idx-mul" => self.amp_exp_idx_mul,
            "freq-scale-idx-mul" => self.freq_scale_idx_mul,
            "freq-scale-offset" => self.freq_scale_offset,
            "freq-scale-exp" => self.freq_scale_exp,
            "freq-max" => self.freq_max,
            "amp-boost-center" => self.amp_boost_center,
            "amp-boost-sharpness" => self.amp_boost_sharpness,
            "amp-boost-exp" => self.amp_boost_exp,
            "amp-boost-db" => self.amp_boost_db,
            "ringmod-rate" => self.ringmod_rate,
            "ringmod-depth" => self.ringmod_depth,
            "ringmod-ot-offset" => self.ringmod_ot_offset,
            "bend" => self.bend,
            "stereo-width" => self.stereo_width,
            "volume" => self.volume,
            "virtual-voices" => self.virtual_voices as f32,
            "release-on-note" => {
                if self.release_on_note {
                    1.0
                } else {
                    0.0
                }
            }
            "anticlick-secs" => self.anticlick_secs,
            _ => return None,
        };
        Some(v)
    }
}

/// Range and default of one host-facing parameter.
#[derive(Clone, Copy, Debug)]
pub struct ParamDescriptor {
    /// Stable string id used by presets and hosts.
    pub id: &'static str,
    /// Lower bound (inclusive).
    pub min: f32,
    /// Upper bound (inclusive).
    pub max: f32,
    /// Default value.
    pub default: f32,
}

/// Descriptor table for the global parameters, in listing order.
pub const PARAM_DESCRIPTORS: &[ParamDescriptor] = &[
    ParamDescriptor { id: "overtones", min: 0.0, max: 600.0, default: 10.0 },
    ParamDescriptor { id: "sum-start-idx", min: -10.0, max: 25.0, default: 1.0 },
    ParamDescriptor { id: "amp-pow-base", min: -10.0, max: 10.0, default: 1.0 },
    ParamDescriptor { id: "amp-exp-idx-mul", min: -10.0, max: 10.0, default: 1.0 },
    ParamDescriptor { id: "freq-scale-idx-mul", min: -10.0, max: 10.0, default: 1.0 },
    ParamDescriptor { id: "freq-scale-offset", min: -10.0, max: 10.0, default: 0.0 },
    ParamDescriptor { id: "freq-scale-exp", min: -10.0, max: 1.0, default: -1.0 },
    ParamDescriptor { id: "freq-max", min: 0.0, max: 1.0, default: 1.0 },
    ParamDescriptor { id: "amp-boost-center", min: 0.0, max: 22050.0, default: 0.0 },
    ParamDescriptor { id: "amp-boost-sharpness", min: 0.0, max: 200.0, default: 0.0 },
    ParamDescriptor { id: "amp-boost-exp", min: 0.0, max: 1024.0, default: 2.0 },
    ParamDescriptor { id: "amp-boost-db", min: 0.0, max: 100.0, default: 2.0 },
    ParamDescriptor { id: "ringmod-rate", min: 0.0, max: 5.0, default: 1.0 },
    ParamDescriptor { id: "ringmod-depth", min: 0.0, max: 0.5, default: 0.0 },
    ParamDescriptor { id: "ringmod-ot-offset", min: 0.0, max: 1.0, default: 0.0 },
    ParamDescriptor { id: "bend", min: -64.0, max: 64.0, default: 0.0 },
    ParamDescriptor { id: "stereo-width", min: 0.0, max: 1.0, default: 0.0 },
    ParamDescriptor { id: "volume", min: 0.0, max: 1.0, default: 0.5 },
    ParamDescriptor { id: "virtual-voices", min: 1.0, max: 10.0, default: 1.0 },
    ParamDescriptor { id: "release-on-note", min: 0.0, max: 1.0, default: 1.0 },
    ParamDescriptor { id: "anticlick-secs", min: 0.0, max: 0.25, default: 0.05 },
];

/// Look up a descriptor by id.
pub fn descriptor(id: &str) -> Option<&'static ParamDescriptor> {
    PARAM_DESCRIPTORS.iter().find(|d| d.id == id)
}

/// Round a block size up to the lane-aligned minimum the vector paths
/// require.
pub(crate) fn align_block(frames: usize) -> usize {
    frames.max(LANES).next_multiple_of(LANES)
}
