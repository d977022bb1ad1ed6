use std::fs;

use anyhow::{Result, bail};
use shared::config::Config;

/// Writes the default configuration to `config.<format>` in the current directory.
///
/// # Errors
/// Returns an error if the format is unsupported or if writing the file fails.
pub fn generate_config(format: &str) -> Result<()> {
    let config = Config::with_defaults();
    let (file_name, serialized) = match format {
        "yaml" | "yml" => ("config.yaml", serde_yml::to_string(&config)?),
        "json" => ("config.json", serde_json::to_string_pretty(&config)?),
        "toml" => ("config.toml", toml::to_string_pretty(&config)?),
        _ => bail!("unsupported format '{format}'. Use 'yaml', 'json' or 'toml'."),
    };

    fs::write(file_name, serialized)?;
    println!("Configuration file '{file_name}' generated successfully.");
    Ok(())
}
