mod cli;
mod config;

use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    //  Logging (stderr, so stdout carries only the report)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,gguf_compress=info,quantize_core=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = cli::Cli::parse();

    match args.command {
        cli::Commands::Inspect(a) => cli::inspect::execute(&args.global, a),
        cli::Commands::Compress(a) => cli::compress::execute(&args.global, a),
        cli::Commands::Config(c) => cli::config_cmd::execute(&args.global, c),
    }
}
