//! `aiportal init` — write a default config file.
//!
//! - Creates `~/.aiportal/config.json` (or `--config PATH`) if missing
//! - Creates the REPL history directory

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;

use aiportal_core::config::loader::{conventional_env_key, CONVENTIONAL_SETTINGS_VARS};
use aiportal_core::config::{get_config_path, save_config, Config};
use aiportal_core::ProviderTag;

/// Run the init command.
pub fn run(config_path: Option<PathBuf>) -> Result<()> {
    println!();
    println!("{}", "AI Portal — Setup".cyan().bold());
    println!();

    let config_path = config_path.unwrap_or_else(get_config_path);
    if write_default_config(&config_path)? {
        println!("  {} created config at {}", "✓".green(), config_path.display());
    } else {
        println!("  {} config already exists at {}", "✓".green(), config_path.display());
    }

    if let Some(history_dir) = crate::repl::history_path().parent() {
        std::fs::create_dir_all(history_dir)
            .with_context(|| format!("failed to create {}", history_dir.display()))?;
    }

    println!();
    println!("  Add API keys under \"providers\" in the config, or export them:");
    for tag in ProviderTag::ALL {
        println!("    {}", conventional_env_key(tag).dimmed());
    }
    println!("  Azure OpenAI and the default model/provider can come from:");
    for var in CONVENTIONAL_SETTINGS_VARS {
        println!("    {}", var.dimmed());
    }
    println!();
    println!("{}", "  Setup complete! Run `aiportal status` to check providers.".green());
    println!();

    Ok(())
}

/// Write a default config to `path` unless one exists. Returns whether a file was written.
fn write_default_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    save_config(&Config::default(), Some(path))
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(true)
}
