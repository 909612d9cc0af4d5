use anyhow::Context;
use gguf_parser::{ByteOrder, GGUFReader};

use crate::cli::{ByteOrderArg, GlobalArgs, InspectArgs, ensure_input_exists};
use crate::config::AppConfig;

const RULE_WIDTH: usize = 50;

pub fn execute(global: &GlobalArgs, args: InspectArgs) -> anyhow::Result<()> {
    ensure_input_exists(&args.path)?;
    let cfg = AppConfig::load_or_default(&global.config_path())?;
    let hints = args.hints.unwrap_or(cfg.hint_namespace);

    let reader = match args.byte_order {
        ByteOrderArg::Little => GGUFReader::new().byte_order(ByteOrder::Little),
        ByteOrderArg::Big => GGUFReader::new().byte_order(ByteOrder::Big),
        ByteOrderArg::Auto => GGUFReader::new().detect_byte_order(),
    };
    let file = reader
        .open(&args.path)
        .with_context(|| format!("Error reading GGUF metadata from {}", args.path.display()))?;

    if args.json {
        let summary = gguf_parser::summarize(&file, &hints);
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let name = args
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.path.display().to_string());

    println!("{}", "=".repeat(RULE_WIDTH));
    println!("METADATA FOR: {name}");
    println!("{}", "=".repeat(RULE_WIDTH));
    for line in gguf_parser::describe(&file, &hints) {
        println!("  {line}");
    }
    if args.verbose {
        println!("{}", "-".repeat(RULE_WIDTH));
        for line in gguf_parser::dump_lines(&file) {
            println!("{line}");
        }
    }
    println!("{}", "=".repeat(RULE_WIDTH));
    Ok(())
}
