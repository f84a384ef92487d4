//! Show or save the effective configuration.

use std::path::PathBuf;

use steadyhand_common::config::AppConfig;

pub fn run(config: &AppConfig, explicit_path: Option<PathBuf>, write: bool) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);

    if let Err(e) = config.filter.validate() {
        eprintln!("[WARN] Filter config is invalid: {e}");
    }

    if write {
        let path = match explicit_path {
            Some(path) => {
                config.save_to(&path)?;
                path
            }
            None => config.save()?,
        };
        eprintln!("Saved to: {}", path.display());
    }

    Ok(())
}
