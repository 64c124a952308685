//! `aiportal status` — show configuration and provider status.
//!
//! - Shows config path, default model and where it routes
//! - Shows the credential status for each provider

use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;

use aiportal_core::config::{get_config_path, load_config};
use aiportal_core::utils::truncate_string;
use aiportal_core::ProviderTag;
use aiportal_providers::registry::CredentialKind;
use aiportal_providers::{CredentialRegistry, ModelRoutingTable, PROVIDERS};

use crate::helpers::mask_secret;

/// Run the status command.
pub fn run(config_path: Option<PathBuf>) -> Result<()> {
    let config_path = config_path.unwrap_or_else(get_config_path);
    let config = load_config(Some(&config_path));

    println!();
    println!("{}", "AI Portal Status".cyan().bold());
    println!();

    println!(
        "  {:<18} {} {}",
        "Config:".bold(),
        config_path.display(),
        if config_path.exists() {
            "✓".green().to_string()
        } else {
            "(not found)".red().to_string()
        }
    );

    let routed = ModelRoutingTable::standard().resolve_provider(&config.defaults.model);
    println!(
        "  {:<18} {} {}",
        "Model:".bold(),
        config.defaults.model,
        format!("→ {}", routed.display_name()).dimmed()
    );
    if routed != config.defaults.provider {
        println!(
            "  {:<18} {}",
            "",
            format!("(configured provider is {})", config.defaults.provider.display_name()).yellow()
        );
    }

    println!(
        "  {:<18} {} | max_tokens: {} | timeout: {}s",
        "Parameters:".bold(),
        format!("temp: {}", config.defaults.temperature).dimmed(),
        format!("{}", config.defaults.max_tokens).dimmed(),
        config.defaults.request_timeout_secs,
    );

    println!();
    println!("  {}", "Providers:".bold());
    let registry = CredentialRegistry::new(&config.providers);
    for spec in PROVIDERS {
        println!("    {:<20} {}", spec.display_name, provider_status(&registry, spec.tag, spec.credential));
    }
    println!();

    Ok(())
}

fn provider_status(registry: &CredentialRegistry, tag: ProviderTag, credential: CredentialKind) -> String {
    if tag == ProviderTag::OpenAi {
        if let Some(azure) = registry.azure() {
            return format!(
                "{} (Azure deployment {} @ {})",
                "✓".green(),
                azure.deployment,
                truncate_string(&azure.endpoint, 40)
            );
        }
    }

    if !registry.is_configured(tag) {
        return format!("{}", "· not configured".dimmed());
    }

    let config = registry.get(tag);
    match credential {
        CredentialKind::ApiKey => format!("{} (key {})", "✓".green(), mask_secret(&config.api_key)),
        CredentialKind::BaseUrl => format!(
            "{} ({})",
            "✓".green(),
            truncate_string(config.api_base.as_deref().unwrap_or_default().trim(), 40)
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aiportal_core::config::Config;

    #[test]
    fn status_line_for_each_credential_kind() {
        colored::control::set_override(false);

        let mut config = Config::default();
        config.providers.groq.api_key = "gsk_0123456789".into();
        config.providers.ollama.api_base = Some("http://localhost:11434".into());
        let registry = CredentialRegistry::new(&config.providers);

        assert_eq!(
            provider_status(&registry, ProviderTag::Groq, CredentialKind::ApiKey),
            "✓ (key gsk_****)"
        );
        assert_eq!(
            provider_status(&registry, ProviderTag::Ollama, CredentialKind::BaseUrl),
            "✓ (http://localhost:11434)"
        );
        assert_eq!(
            provider_status(&registry, ProviderTag::Google, CredentialKind::ApiKey),
            "· not configured"
        );
    }
}
