use crate::cli::{ConfigArgs, GlobalArgs};
use crate::config::AppConfig;

pub fn execute(global: &GlobalArgs, args: ConfigArgs) -> anyhow::Result<()> {
    let path = global.config_path();
    match args.action {
        crate::cli::ConfigAction::Show => {
            let cfg = AppConfig::load_or_default(&path)?;
            println!("{}", serde_json::to_string_pretty(&cfg)?);
        }
        crate::cli::ConfigAction::Set { key, value } => {
            let mut cfg = AppConfig::load_or_default(&path)?;
            apply(&mut cfg, &key, value)?;
            cfg.save(&path)?;
            println!("Configuration updated ({}).", path.display());
        }
    }
    Ok(())
}

fn apply(cfg: &mut AppConfig, key: &str, value: String) -> anyhow::Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("Value for {key} must not be empty");
    }
    match key {
        "method" => cfg.default_method = value,
        "hints" => cfg.hint_namespace = value,
        _ => anyhow::bail!("Unknown config key: {key}"),
    }
    Ok(())
}
