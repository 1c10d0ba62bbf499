use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "jet-tagger", version, about = "Particle transformer jet tagging over JSON-lines events")]
pub struct Cli {
    /// Input events (JSON lines)
    #[arg(long)]
    pub input: PathBuf,

    /// Output records (JSON lines)
    #[arg(long)]
    pub output: PathBuf,

    /// Configuration file
    #[arg(long, default_value = "config/config.toml")]
    pub config: PathBuf,

    /// Path to ONNX model file (overrides config)
    #[arg(long)]
    pub model: Option<PathBuf>,

    /// Stop after this many events (overrides config)
    #[arg(long)]
    pub max_events: Option<u64>,

    /// Intra-op threads for inference (overrides config)
    #[arg(long)]
    pub threads: Option<usize>,

    /// Dump packed tensors and raw outputs
    #[arg(long)]
    pub debug: bool,
}
