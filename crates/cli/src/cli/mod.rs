pub mod compress;
pub mod config_cmd;
pub mod inspect;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::AppConfig;

#[derive(Parser)]
#[command(
    name = "gguf-compress",
    version,
    about = "Inspect GGUF model metadata and quantize models with external engines"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, clap::Args, Clone)]
pub struct GlobalArgs {
    /// Configuration file (default: platform config dir).
    #[arg(long, global = true, env = "GGUF_COMPRESS_CONFIG")]
    pub config: Option<PathBuf>,
}

impl GlobalArgs {
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(AppConfig::default_path)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Display model metadata and runtime hints.
    Inspect(InspectArgs),

    /// Quantize a model with the first available engine.
    Compress(CompressArgs),

    /// View / edit configuration.
    Config(ConfigArgs),
}

//  Subcommand argument structs

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ByteOrderArg {
    Little,
    Big,
    /// Detect from the version field.
    Auto,
}

#[derive(Debug, clap::Args, Clone)]
pub struct InspectArgs {
    /// Path to a GGUF model file.
    pub path: PathBuf,

    /// Print the summary as JSON.
    #[arg(long)]
    pub json: bool,

    /// Also list every metadata field and tensor.
    #[arg(short, long)]
    pub verbose: bool,

    /// Byte order of the file.
    #[arg(long, value_enum, default_value_t = ByteOrderArg::Auto)]
    pub byte_order: ByteOrderArg,

    /// Runtime-hint namespace (`<NS>.runtime.max_threads`); overrides config.
    #[arg(long)]
    pub hints: Option<String>,
}

#[derive(Debug, clap::Args, Clone)]
pub struct CompressArgs {
    /// Path to the source GGUF model.
    pub input: PathBuf,

    /// Output path (default: `<input>_<method>.gguf`).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Quantization method, passed to the engine verbatim (default from config: q4_k_m).
    #[arg(short, long, env = "GGUF_COMPRESS_METHOD")]
    pub method: Option<String>,

    /// Runtime thread count hint.
    #[arg(short = 't', long)]
    pub max_threads: Option<u32>,

    /// Runtime RAM limit hint in GB.
    #[arg(short = 'r', long)]
    pub max_ram: Option<f64>,
}

#[derive(Debug, clap::Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Display the current configuration.
    Show,
    /// Set a configuration value (`method` or `hints`).
    Set { key: String, value: String },
}

/// Both subcommands refuse to start on a missing input.
pub fn ensure_input_exists(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        anyhow::bail!("Input file not found: {}", path.display());
    }
    Ok(())
}
