//! Armonico CLI - offline rendering for the armonico additive synthesizer.

mod preset;
mod render;

use armonico_synth::{PARAM_DESCRIPTORS, SynthParams};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "armonico")]
#[command(author, version, about = "Armonico additive synthesizer CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a note to a WAV file
    Render(render::RenderArgs),

    /// List parameters with their ranges and defaults
    Params(ParamsArgs),
}

#[derive(clap::Args)]
struct ParamsArgs {
    /// Print the default parameter set as a JSON preset instead
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Render(args) => render::run(args),
        Commands::Params(args) => run_params(&args),
    }
}

fn run_params(args: &ParamsArgs) -> anyhow::Result<()> {
    if args.json {
        // A full default preset, ready to edit and pass to `render --preset`.
        println!("{}", serde_json::to_string_pretty(&SynthParams::default())?);
        return Ok(());
    }
    println!("{:<22} {:>10} {:>10} {:>10}", "id", "min", "max", "default");
    for d in PARAM_DESCRIPTORS {
        println!("{:<22} {:>10} {:>10} {:>10}", d.id, d.min, d.max, d.default);
    }
    Ok(())
}
