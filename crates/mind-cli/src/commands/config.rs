//! Config command implementation.
//!
//! Manages CLI configuration.

use anyhow::Result;
use mind_ops::Config;

/// Accept `compression-level` as well as `compression_level`.
fn normalize_key(key: &str) -> String {
    key.trim().replace('-', "_")
}

/// Show current configuration.
pub fn show(config: &Config) -> Result<()> {
    println!("Mind CLI Configuration");
    println!("{:-<40}", "");

    println!(
        "Owner:             {}",
        config.owner.as_deref().unwrap_or("(not set)")
    );
    println!("Compression Level: {}", config.compression_level);
    println!(
        "Scratch Directory: {}",
        config
            .scratch_dir
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(system temp)".to_string())
    );

    if let Some(config_path) = Config::config_file_path() {
        println!("\nConfig file: {}", config_path.display());
    }

    Ok(())
}

/// Set a configuration value.
pub fn set(config: &mut Config, key: &str, value: &str) -> Result<()> {
    let key = normalize_key(key);
    config.set(&key, value)?;
    config.save()?;

    println!("✅ Set {} to: {}", key, value);
    Ok(())
}

/// Get a configuration value.
pub fn get(config: &Config, key: &str) -> Result<()> {
    let key = normalize_key(key);
    let value = match key.as_str() {
        "owner" | "compression_level" | "scratch_dir" => config
            .get(&key)
            .unwrap_or_else(|| "(not set)".to_string()),
        _ => {
            anyhow::bail!(
                "Unknown config key: {}. Valid keys: owner, compression_level, scratch_dir",
                key
            );
        }
    };

    println!("{}", value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn reset() -> Result<()> {
    let config = Config::default();
    config.save()?;
    println!("Configuration reset to defaults");
    Ok(())
}
