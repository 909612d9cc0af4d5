use std::path::Path;

use quantize_core::{Quantizer, default_output_path};
use tracing::info;

use crate::cli::{CompressArgs, GlobalArgs, ensure_input_exists};
use crate::config::AppConfig;

pub fn execute(global: &GlobalArgs, args: CompressArgs) -> anyhow::Result<()> {
    ensure_input_exists(&args.input)?;
    let cfg = AppConfig::load_or_default(&global.config_path())?;

    let method = args.method.unwrap_or(cfg.default_method);
    let output = args
        .output
        .unwrap_or_else(|| default_output_path(&args.input, &method));

    println!("Initiating quantization...");
    println!("  Input:   {}", args.input.display());
    println!("  Output:  {}", output.display());
    println!("  Method:  {method}");

    let quantizer = Quantizer::new(cfg.engines);
    info!(engines = quantizer.engines().len(), "Trying quantization engines");
    let outcome = quantizer.quantize(&args.input, &output, &method)?;
    println!("Quantization complete (engine: {}).", outcome.engine);

    let summary = resource_summary(
        &outcome.output,
        args.max_threads,
        args.max_ram,
        &cfg.hint_namespace,
    );
    for line in summary {
        println!("{line}");
    }
    Ok(())
}

/// Resource hints echoed after a successful run. Empty when no hint was
/// given; a zero hint counts as given.
fn resource_summary(
    output: &Path,
    max_threads: Option<u32>,
    max_ram: Option<f64>,
    hint_namespace: &str,
) -> Vec<String> {
    if max_threads.is_none() && max_ram.is_none() {
        return Vec::new();
    }
    let mut lines = vec![format!(
        "Resource optimization summary for {}:",
        output.display()
    )];
    if let Some(threads) = max_threads {
        lines.push(format!("  - Target execution threads: {threads}"));
    }
    if let Some(ram) = max_ram {
        lines.push(format!("  - Memory ceiling: {ram} GB"));
    }
    lines.push(format!(
        "Note: these hints are advisory for the {hint_namespace} runtime and are not enforced."
    ));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_hints_no_summary() {
        assert!(resource_summary(Path::new("out.gguf"), None, None, "wllama").is_empty());
    }

    #[test]
    fn zero_hints_are_reported() {
        let lines = resource_summary(Path::new("out.gguf"), Some(0), Some(0.0), "wllama");
        assert_eq!(
            lines,
            vec![
                "Resource optimization summary for out.gguf:",
                "  - Target execution threads: 0",
                "  - Memory ceiling: 0 GB",
                "Note: these hints are advisory for the wllama runtime and are not enforced.",
            ]
        );
    }

    #[test]
    fn single_hint_only_lists_itself() {
        let lines = resource_summary(Path::new("out.gguf"), None, Some(3.5), "edge");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "  - Memory ceiling: 3.5 GB");
        assert!(lines[2].contains("edge runtime"));
    }
}
