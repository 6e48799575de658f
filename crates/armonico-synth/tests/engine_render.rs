//! End-to-end render checks on the engine: spectral content, chunked
//! streaming, anti-alias muting, and voice allocation behavior.

use armonico_synth::{Note, SrateParam, SynthParams, SynthesisEngine};

const RATE: f32 = 48_000.0;

/// Amplitude of the `freq` component over `samples`, assuming `freq`
/// completes a whole number of cycles in the window.
fn tone_amplitude(samples: &[f32], freq: f32) -> f32 {
    let n = samples.len() as f32;
    let mut re = 0.0f64;
    let mut im = 0.0f64;
    for (i, &s) in samples.iter().enumerate() {
        let theta = f64::from(core::f32::consts::TAU * freq * i as f32 / RATE);
        re += f64::from(s) * theta.cos();
        im += f64::from(s) * theta.sin();
    }
    (2.0 / f64::from(n) * (re * re + im * im).sqrt()) as f32
}

fn left_channel(interleaved: &[f32]) -> Vec<f32> {
    interleaved.iter().step_by(2).copied().collect()
}

fn single_overtone_params() -> SynthParams {
    let mut p = SynthParams::default();
    p.overtones = 1;
    p
}

#[test]
fn single_overtone_renders_a_pure_tone() {
    let mut engine = SynthesisEngine::new(RATE);
    engine.set_params(single_overtone_params());
    engine.set_note(Note::Midi(69)); // 440 Hz

    // 0.1 s = 44 whole cycles of 440 Hz.
    let mut out = vec![0.0f32; 2 * 4800];
    engine.process(&mut out);
    let left = left_channel(&out);

    let fundamental = tone_amplitude(&left, 440.0);
    assert!(
        (fundamental - 0.5).abs() < 0.02,
        "fundamental amplitude {fundamental}, expected ~0.5"
    );
    // Nothing at the second harmonic.
    assert!(tone_amplitude(&left, 880.0) < 0.01);
}

#[test]
fn bend_shifts_the_fundamental() {
    let mut p = single_overtone_params();
    p.bend = 12.0;
    let mut engine = SynthesisEngine::new(RATE);
    engine.set_params(p);
    engine.set_note(Note::Midi(69));

    let mut out = vec![0.0f32; 2 * 4800];
    engine.process(&mut out);
    let left = left_channel(&out);

    // One octave up: energy at 880, none left at 440.
    assert!(tone_amplitude(&left, 880.0) > 0.4);
    assert!(tone_amplitude(&left, 440.0) < 0.01);
}

#[test]
fn harmonic_amplitudes_follow_the_power_law() {
    // Defaults: amplitude of harmonic j is 1/j.
    let mut p = SynthParams::default();
    p.overtones = 4;
    let mut engine = SynthesisEngine::new(RATE);
    engine.set_params(p);
    engine.set_note(Note::Midi(69));

    let mut out = vec![0.0f32; 2 * 4800];
    engine.process(&mut out);
    let left = left_channel(&out);

    for j in 1..=4u32 {
        let expect = 0.5 / j as f32;
        let got = tone_amplitude(&left, 440.0 * j as f32);
        assert!(
            (got - expect).abs() < 0.02,
            "harmonic {j}: amplitude {got}, expected ~{expect}"
        );
    }
    assert!(tone_amplitude(&left, 440.0 * 5.0) < 0.01);
}

#[test]
fn anti_alias_ceiling_mutes_high_partials() {
    // A ceiling of control 0 is ~13.75 Hz, below every partial; the
    // kernel still runs (phases keep advancing) but emits silence.
    let mut p = SynthParams::default();
    p.freq_max = 0.0;
    let mut engine = SynthesisEngine::new(RATE);
    engine.set_params(p);
    engine.set_note(Note::Midi(69));

    let mut out = vec![0.0f32; 2 * 4096];
    engine.process(&mut out);
    assert!(out.iter().all(|&s| s == 0.0));
    assert!(engine.overtone_blocks() > 0, "mute is not the silence fast path");
}

#[test]
fn muted_partials_keep_advancing_phase() {
    // Engine A spends its first second fully muted, engine B never is.
    // If muted overtones keep advancing their accumulators, the two are
    // bit-identical once A is unmuted.
    let mut muted_params = SynthParams::default();
    muted_params.freq_max = 0.0;

    let mut a = SynthesisEngine::new(RATE);
    a.set_params(muted_params);
    let mut b = SynthesisEngine::new(RATE);
    a.set_note(Note::Midi(69));
    b.set_note(Note::Midi(69));

    // A whole number of internal blocks, so the switch lands on a
    // block boundary for both engines.
    let lead = 16 * a.block_size();
    let mut head_a = vec![0.0f32; 2 * lead];
    let mut head_b = vec![0.0f32; 2 * lead];
    a.process(&mut head_a);
    b.process(&mut head_b);
    assert!(head_a.iter().all(|&s| s == 0.0));
    assert!(head_b.iter().any(|&s| s.abs() > 1e-3));

    a.set_params(SynthParams::default());
    let mut tail_a = vec![0.0f32; 2 * 4096];
    let mut tail_b = vec![0.0f32; 2 * 4096];
    a.process(&mut tail_a);
    b.process(&mut tail_b);
    assert_eq!(tail_a, tail_b);
}

#[test]
fn partial_ceiling_keeps_low_harmonics_only() {
    let mut p = SynthParams::default();
    p.overtones = 8;
    // Ceiling between the 2nd and 3rd harmonic of 440 Hz:
    // 440 * 2^(ctl * 10.6 - 5) = 1000  =>  ctl ≈ 0.5836.
    p.freq_max = 0.5836;
    let mut engine = SynthesisEngine::new(RATE);
    engine.set_params(p);
    engine.set_note(Note::Midi(69));

    let mut out = vec![0.0f32; 2 * 4800];
    engine.process(&mut out);
    let left = left_channel(&out);

    assert!(tone_amplitude(&left, 440.0) > 0.4);
    assert!(tone_amplitude(&left, 880.0) > 0.2);
    assert!(tone_amplitude(&left, 1320.0) < 0.01);
}

#[test]
fn chunked_processing_matches_one_shot() {
    let mut whole = SynthesisEngine::new(RATE);
    let mut chunked = SynthesisEngine::new(RATE);
    whole.set_note(Note::Midi(60));
    chunked.set_note(Note::Midi(60));

    let mut a = vec![0.0f32; 2 * 3000];
    whole.process(&mut a);

    let mut b = vec![0.0f32; 2 * 3000];
    let mut pos = 0;
    // Deliberately awkward chunk sizes, none block-aligned.
    for take in [2, 30, 146, 1000, 700, 2122, 2000] {
        let take = take.min(b.len() - pos);
        chunked.process(&mut b[pos..pos + take]);
        pos += take;
        if pos == b.len() {
            break;
        }
    }
    assert_eq!(pos, b.len());
    assert_eq!(a, b);
}

#[test]
fn release_on_note_thins_the_mix() {
    fn rms_after_two_notes(release_on_note: bool) -> f32 {
        let mut p = SynthParams::default();
        p.virtual_voices = 2;
        p.release_on_note = release_on_note;
        p.mod_channels[0].target = Some(SrateParam::Volume);
        p.mod_channels[0].adsr.attack_secs = 0.005;
        p.mod_channels[0].adsr.attack_level = 1.0;
        p.mod_channels[0].adsr.decay_secs = 0.005;
        p.mod_channels[0].adsr.sustain_level = 1.0;
        p.mod_channels[0].adsr.release_secs = 0.02;

        let mut engine = SynthesisEngine::new(RATE);
        engine.set_params(p);
        engine.set_note(Note::Midi(60));
        let mut gap = vec![0.0f32; 2 * 4800];
        engine.process(&mut gap);
        engine.set_note(Note::Midi(72));
        // Let the release (if any) finish, then measure.
        let mut settle = vec![0.0f32; 2 * 9600];
        engine.process(&mut settle);
        let tail = &settle[settle.len() / 2..];
        let sum: f64 = tail.iter().map(|&s| f64::from(s) * f64::from(s)).sum();
        (sum / tail.len() as f64).sqrt() as f32
    }

    let kept = rms_after_two_notes(false);
    let released = rms_after_two_notes(true);
    assert!(kept > released * 1.2, "kept {kept}, released {released}");
}

#[test]
fn ring_modulation_splits_the_spectrum() {
    let mut p = single_overtone_params();
    p.ringmod_depth = 0.25;
    let mut engine = SynthesisEngine::new(RATE);
    engine.set_params(p);
    engine.set_note(Note::Midi(69));

    // Ring modulating a 440 Hz carrier with a 110 Hz sine moves the
    // energy to 330 and 550 Hz sidebands.
    let mut out = vec![0.0f32; 2 * 9600];
    engine.process(&mut out);
    let left = left_channel(&out);
    assert!(tone_amplitude(&left, 330.0) > 0.15);
    assert!(tone_amplitude(&left, 550.0) > 0.15);
    assert!(tone_amplitude(&left, 440.0) < 0.05);
}
