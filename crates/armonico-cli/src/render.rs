//! Offline note rendering to WAV.

use anyhow::Context;
use armonico_synth::{Note, SynthParams, SynthesisEngine};
use clap::Args;
use std::path::{Path, PathBuf};

/// Arguments for the `render` subcommand.
#[derive(Args)]
pub struct RenderArgs {
    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Preset file (JSON), see `armonico params --json`
    #[arg(long)]
    preset: Option<PathBuf>,

    /// Parameter override, id=value (repeatable)
    #[arg(long = "set", value_name = "ID=VALUE")]
    set: Vec<String>,

    /// MIDI note to play (69 = A4)
    #[arg(long, default_value = "69")]
    note: u8,

    /// Total render length in seconds
    #[arg(long, default_value = "2.0")]
    duration: f32,

    /// Seconds before the note is released
    #[arg(long, default_value = "1.0")]
    gate: f32,

    /// Sample rate in Hz
    #[arg(long, default_value = "48000")]
    sample_rate: u32,
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    let mut params = match &args.preset {
        Some(path) => crate::preset::load(path)
            .with_context(|| format!("loading preset {}", path.display()))?,
        None => SynthParams::default(),
    };
    crate::preset::apply_overrides(&mut params, &args.set)?;

    let samples = render_note(
        &params,
        args.note,
        args.duration,
        args.gate,
        args.sample_rate,
    );

    write_wav(&args.output, &samples, args.sample_rate)
        .with_context(|| format!("writing {}", args.output.display()))?;
    tracing::info!(
        path = %args.output.display(),
        frames = samples.len() / 2,
        "wrote output"
    );
    Ok(())
}

/// Render one gated note as interleaved stereo.
fn render_note(params: &SynthParams, note: u8, duration: f32, gate: f32, sample_rate: u32) -> Vec<f32> {
    let rate = sample_rate as f32;
    let total_frames = (duration.max(0.0) * rate) as usize;
    let gate_frames = ((gate.max(0.0) * rate) as usize).min(total_frames);

    tracing::info!(note, duration, gate, sample_rate, "rendering");

    let mut engine = SynthesisEngine::new(rate);
    engine.set_params(params.clone());
    engine.set_note(Note::Midi(note));

    let mut samples = vec![0.0f32; 2 * total_frames];
    let split = 2 * gate_frames;
    engine.process(&mut samples[..split]);
    engine.set_note(Note::Off);
    engine.process(&mut samples[split..]);
    samples
}

/// Write interleaved stereo as a 16-bit WAV.
fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<(), hound::Error> {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in samples {
        let int_sample = (sample * 32768.0).clamp(-32768.0, 32767.0) as i16;
        writer.write_sample(int_sample)?;
    }
    writer.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_produces_audio_then_decays() {
        let mut params = SynthParams::default();
        params.mod_channels[0].target = Some(armonico_synth::SrateParam::Volume);
        params.mod_channels[0].adsr.attack_secs = 0.01;
        params.mod_channels[0].adsr.release_secs = 0.05;
        let samples = render_note(&params, 69, 0.5, 0.2, 48_000);
        assert_eq!(samples.len(), 2 * 24_000);
        // Loud while gated, silent well after the release.
        assert!(samples[..2 * 9600].iter().any(|&s| s.abs() > 0.01));
        assert!(samples[2 * 20_000..].iter().all(|&s| s.abs() < 1e-3));
    }

    #[test]
    fn written_wav_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let samples = render_note(&SynthParams::default(), 60, 0.1, 0.1, 44_100);
        write_wav(&path, &samples, 44_100).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 44_100);
        assert_eq!(reader.len() as usize, samples.len());
    }
}
