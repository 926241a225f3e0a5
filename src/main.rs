//! narrator-rs: batch text-to-speech narration via Google Cloud TTS.

mod audio;
mod chunker;
mod config;
mod error;
mod generator;
mod ledger;
mod pipeline;
mod synth;

use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "narrator-rs", about = "Batch text-to-speech narration")]
struct Args {
    /// Path to narrator.yaml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory with source .txt files (overrides config)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// List pending files without synthesizing anything
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("debug,reqwest=info,hyper=info")
    } else {
        EnvFilter::new("info,reqwest=warn,hyper=warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("narrator-rs starting");

    let mut config = config::Config::load(args.config.as_deref());
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }

    let audio_extension = config.audio.encoding.extension();

    if args.dry_run {
        let pending = pipeline::pending_sources(&config.data_dir, audio_extension)?;
        info!("{} file(s) pending", pending.len());
        for path in pending {
            println!("{}", path.display());
        }
        return Ok(());
    }

    let Some(api_key) = config.load_api_key() else {
        return Err(format!(
            "No API key: set GOOGLE_TTS_API_KEY or create {}",
            config.api_key_file.display()
        )
        .into());
    };

    let synthesizer = synth::GoogleSynthesizer::new(api_key);
    let store = ledger::JsonFileStore::new(config.quota.ledger_file.clone());
    let usage = ledger::UsageLedger::new(store);
    let generator = generator::SpeechGenerator::new(synthesizer, usage, &config);

    let batch = pipeline::BatchPipeline::new(generator, &config);
    let summary = batch.run().await?;

    info!(
        "Batch complete: {} narrated, {} skipped on quota, {} failed, {} empty",
        summary.narrated, summary.skipped, summary.failed, summary.empty
    );

    Ok(())
}
