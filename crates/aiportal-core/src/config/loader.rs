//! Config loader — reads `~/.aiportal/config.json`, merges env vars, and
//! applies legacy migrations.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.aiportal/config.json`
//! 3. Environment variables `AIPORTAL_<SECTION>__<FIELD>` (override JSON)
//! 4. Conventional variables (`OPENAI_API_KEY`, `AZURE_OPENAI_*`, `OPENAI_MODEL`,
//!    `LLM_PROVIDER`, …) fill values still unset
//! 5. Unusable sampling defaults are reset with a warning

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::{ChatDefaults, Config, DEFAULT_AZURE_API_VERSION};
use crate::types::ProviderTag;

/// Conventional env var consulted when a provider's key is still empty.
///
/// For Ollama this is a base URL rather than a key.
pub fn conventional_env_key(tag: ProviderTag) -> &'static str {
    match tag {
        ProviderTag::OpenAi => "OPENAI_API_KEY",
        ProviderTag::Anthropic => "ANTHROPIC_API_KEY",
        ProviderTag::Google => "GOOGLE_API_KEY",
        ProviderTag::Groq => "GROQ_API_KEY",
        ProviderTag::OpenRouter => "OPENROUTER_API_KEY",
        ProviderTag::Ollama => "OLLAMA_BASE_URL",
    }
}

/// Conventional variables beyond the per-provider keys, filled the same way.
pub const CONVENTIONAL_SETTINGS_VARS: &[&str] = &[
    "AZURE_OPENAI_API_KEY",
    "AZURE_OPENAI_ENDPOINT",
    "AZURE_OPENAI_DEPLOYMENT",
    "AZURE_OPENAI_API_VERSION",
    "OPENAI_MODEL",
    "LLM_PROVIDER",
];

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the default path + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    apply_env_overrides(load_config_from_path(&config_path))
}

/// Load config from a specific file path, without env overrides.
fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return Config::default();
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return Config::default();
        }
    };

    let mut raw: serde_json::Value = match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            warn!("Failed to parse config JSON: {}", e);
            return Config::default();
        }
    };

    migrate_config(&mut raw);

    match serde_json::from_value(raw) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to deserialize config: {}", e);
            Config::default()
        }
    }
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply legacy config migrations.
///
/// Older files were flat: `openaiModel` → `defaults.model`,
/// `openaiApiKey` → `providers.openai.apiKey`. Nested values win.
fn migrate_config(raw: &mut serde_json::Value) {
    let Some(root) = raw.as_object_mut() else {
        return;
    };

    if let Some(model) = root.remove("openaiModel") {
        if let Some(defaults) = root
            .entry("defaults")
            .or_insert_with(|| serde_json::json!({}))
            .as_object_mut()
        {
            defaults.entry("model").or_insert(model);
            debug!("Migrated openaiModel → defaults.model");
        }
    }

    if let Some(key) = root.remove("openaiApiKey") {
        if let Some(openai) = root
            .entry("providers")
            .or_insert_with(|| serde_json::json!({}))
            .as_object_mut()
            .and_then(|providers| {
                providers
                    .entry("openai")
                    .or_insert_with(|| serde_json::json!({}))
                    .as_object_mut()
            })
        {
            openai.entry("apiKey").or_insert(key);
            debug!("Migrated openaiApiKey → providers.openai.apiKey");
        }
    }
}

/// Apply environment variable overrides from the process environment.
fn apply_env_overrides(config: Config) -> Config {
    apply_overrides_from(config, |name| std::env::var(name).ok())
}

/// Apply overrides using `lookup` as the variable source.
///
/// Supported overrides:
/// - `AIPORTAL_DEFAULTS__MODEL` → `defaults.model`
/// - `AIPORTAL_DEFAULTS__PROVIDER` → `defaults.provider`
/// - `AIPORTAL_DEFAULTS__MAX_TOKENS` → `defaults.max_tokens`
/// - `AIPORTAL_DEFAULTS__TEMPERATURE` → `defaults.temperature`
/// - `AIPORTAL_DEFAULTS__REQUEST_TIMEOUT_SECS` → `defaults.request_timeout_secs`
/// - `AIPORTAL_PROVIDERS__<NAME>__API_KEY` / `__API_BASE`
/// - `AIPORTAL_PROVIDERS__AZURE_OPENAI__{API_KEY,ENDPOINT,DEPLOYMENT,API_VERSION}`
fn apply_overrides_from<F>(mut config: Config, lookup: F) -> Config
where
    F: Fn(&str) -> Option<String>,
{
    let explicit_model = lookup("AIPORTAL_DEFAULTS__MODEL");
    if let Some(val) = explicit_model.clone() {
        config.defaults.model = val;
    }
    let explicit_provider = lookup("AIPORTAL_DEFAULTS__PROVIDER");
    if let Some(ref val) = explicit_provider {
        match val.parse::<ProviderTag>() {
            Ok(tag) => config.defaults.provider = tag,
            Err(e) => warn!("Ignoring AIPORTAL_DEFAULTS__PROVIDER: {}", e),
        }
    }
    if let Some(val) = lookup("AIPORTAL_DEFAULTS__MAX_TOKENS") {
        match val.parse::<u32>() {
            Ok(n) if n > 0 => config.defaults.max_tokens = n,
            _ => warn!("Ignoring AIPORTAL_DEFAULTS__MAX_TOKENS={}: expected a positive integer", val),
        }
    }
    if let Some(val) = lookup("AIPORTAL_DEFAULTS__TEMPERATURE") {
        match val.parse::<f64>() {
            Ok(t) if (0.0..=2.0).contains(&t) => config.defaults.temperature = t,
            _ => warn!("Ignoring AIPORTAL_DEFAULTS__TEMPERATURE={}: expected 0.0..=2.0", val),
        }
    }
    if let Some(val) = lookup("AIPORTAL_DEFAULTS__REQUEST_TIMEOUT_SECS") {
        if let Ok(n) = val.parse::<u64>() {
            config.defaults.request_timeout_secs = n;
        }
    }

    for tag in ProviderTag::ALL {
        let name = tag.as_str().to_uppercase();
        let provider = config.providers.get_mut(tag);
        if let Some(val) = lookup(&format!("AIPORTAL_PROVIDERS__{name}__API_KEY")) {
            provider.api_key = val;
        }
        if let Some(val) = lookup(&format!("AIPORTAL_PROVIDERS__{name}__API_BASE")) {
            provider.api_base = Some(val);
        }
    }

    let azure = &mut config.providers.azure_openai;
    if let Some(val) = lookup("AIPORTAL_PROVIDERS__AZURE_OPENAI__API_KEY") {
        azure.api_key = val;
    }
    if let Some(val) = lookup("AIPORTAL_PROVIDERS__AZURE_OPENAI__ENDPOINT") {
        azure.endpoint = val;
    }
    if let Some(val) = lookup("AIPORTAL_PROVIDERS__AZURE_OPENAI__DEPLOYMENT") {
        azure.deployment = val;
    }
    if let Some(val) = lookup("AIPORTAL_PROVIDERS__AZURE_OPENAI__API_VERSION") {
        azure.api_version = val;
    }

    // Conventional variables only fill gaps.
    for tag in ProviderTag::ALL {
        let Some(val) = lookup(conventional_env_key(tag)).filter(|v| !v.is_empty()) else {
            continue;
        };
        let provider = config.providers.get_mut(tag);
        if tag == ProviderTag::Ollama {
            if !provider.has_api_base() {
                provider.api_base = Some(val);
            }
        } else if !provider.is_configured() {
            provider.api_key = val;
        }
    }

    let azure = &mut config.providers.azure_openai;
    for (name, field) in [
        ("AZURE_OPENAI_API_KEY", &mut azure.api_key),
        ("AZURE_OPENAI_ENDPOINT", &mut azure.endpoint),
        ("AZURE_OPENAI_DEPLOYMENT", &mut azure.deployment),
    ] {
        if field.is_empty() {
            if let Some(val) = lookup(name).filter(|v| !v.is_empty()) {
                *field = val;
            }
        }
    }
    if azure.api_version.is_empty() || azure.api_version == DEFAULT_AZURE_API_VERSION {
        if let Some(val) = lookup("AZURE_OPENAI_API_VERSION").filter(|v| !v.is_empty()) {
            azure.api_version = val;
        }
    }

    let builtin = ChatDefaults::default();
    if explicit_model.is_none() && config.defaults.model == builtin.model {
        if let Some(val) = lookup("OPENAI_MODEL").filter(|v| !v.trim().is_empty()) {
            config.defaults.model = val;
        }
    }
    if explicit_provider.is_none() && config.defaults.provider == builtin.provider {
        if let Some(val) = lookup("LLM_PROVIDER").filter(|v| !v.trim().is_empty()) {
            match parse_legacy_provider(&val) {
                Ok(tag) => config.defaults.provider = tag,
                Err(e) => warn!("Ignoring LLM_PROVIDER: {}", e),
            }
        }
    }

    sanitize_defaults(config)
}

/// `LLM_PROVIDER` also accepts `azure_openai`, which is served by the openai slot.
fn parse_legacy_provider(value: &str) -> Result<ProviderTag, String> {
    match value.trim().to_lowercase().as_str() {
        "azure_openai" | "azure" => Ok(ProviderTag::OpenAi),
        other => other.parse(),
    }
}

/// Reset sampling defaults that no request could satisfy.
fn sanitize_defaults(mut config: Config) -> Config {
    let builtin = ChatDefaults::default();
    if config.defaults.max_tokens == 0 {
        warn!(
            "defaults.maxTokens must be positive, using {}",
            builtin.max_tokens
        );
        config.defaults.max_tokens = builtin.max_tokens;
    }
    if !(0.0..=2.0).contains(&config.defaults.temperature) {
        warn!(
            "defaults.temperature {} is outside 0.0..=2.0, using {}",
            config.defaults.temperature, builtin.temperature
        );
        config.defaults.temperature = builtin.temperature;
    }
    config
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
