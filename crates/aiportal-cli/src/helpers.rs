//! Shared CLI helpers — path expansion, response printing, version banner.

use std::path::PathBuf;

use colored::Colorize;

use aiportal_core::{ChatResponse, UsageRecord};

/// Expand `~` at the start of a path to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_next::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs_next::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// Print a model answer to stdout.
pub fn print_response(response: &ChatResponse) {
    println!();
    println!("{}", response.model.cyan().bold());
    if response.response.is_empty() {
        println!("{}", "(no response)".dimmed());
    } else {
        println!("{}", response.response);
    }
    println!();
}

/// One dimmed line of token and latency accounting.
pub fn print_usage(record: &UsageRecord) {
    println!("{}", usage_line(record).dimmed());
}

fn usage_line(record: &UsageRecord) -> String {
    format!(
        "{} · {} prompt + {} completion = {} tokens · {} ms · {}",
        record.provider.display_name(),
        record.prompt_tokens,
        record.completion_tokens,
        record.total_tokens,
        record.latency_ms,
        record.created_at.format("%H:%M:%S"),
    )
}

/// Print the banner shown at REPL start.
pub fn print_banner(model: &str) {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!("{}  v{}", "AI Portal".cyan().bold(), version.dimmed());
    println!("{} {}", "Model:".dimmed(), model);
    println!(
        "{}",
        "Type a prompt, \"/model NAME\" to switch, \"/models\" to list, or \"exit\" to quit.".dimmed()
    );
    println!();
}

/// Print a "thinking" placeholder while waiting on the provider.
pub fn print_thinking() {
    eprint!("{}", "⠿ thinking...".dimmed());
}

/// Clear the "thinking" placeholder.
pub fn clear_thinking() {
    eprint!("\r{}\r", " ".repeat(40));
}

/// Mask a secret for display, keeping a short recognizable prefix.
pub fn mask_secret(secret: &str) -> String {
    let prefix: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 8 {
        "****".to_string()
    } else {
        format!("{prefix}****")
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use aiportal_core::{CanonicalChatResult, ProviderTag};

    #[test]
    fn expand_tilde_home() {
        let result = expand_tilde("~/foo/bar");
        assert!(result.ends_with("foo/bar"));
        assert!(!result.starts_with("~"));
    }

    #[test]
    fn expand_tilde_no_tilde() {
        let result = expand_tilde("/absolute/path");
        assert_eq!(result, PathBuf::from("/absolute/path"));
    }

    #[test]
    fn mask_secret_hides_tail() {
        assert_eq!(mask_secret("sk-proj-abcdefgh"), "sk-p****");
        assert_eq!(mask_secret("short"), "****");
    }

    #[test]
    fn usage_line_reports_totals() {
        let result = CanonicalChatResult {
            text: "hi".into(),
            prompt_tokens: 7,
            completion_tokens: 2,
        };
        let record = UsageRecord::new("llama-3.1-8b-instant", ProviderTag::Groq, &result, 120);
        let line = usage_line(&record);
        assert!(line.starts_with("Groq · 7 prompt + 2 completion = 9 tokens · 120 ms"));
    }
}
