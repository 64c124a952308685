//! Interactive REPL.
//!
//! Uses `rustyline` for readline-style editing with persistent history.
//! Every line is an independent single-turn request; no conversation state
//! is carried between prompts.

use anyhow::Result;
use rustyline::config::Configurer;
use rustyline::history::DefaultHistory;
use rustyline::{DefaultEditor, Editor};
use tracing::debug;

use aiportal_providers::Dispatcher;

use crate::helpers;
use crate::ChatOpts;

/// Exit commands (case-insensitive match).
const EXIT_COMMANDS: &[&str] = &["exit", "quit", "/exit", "/quit", ":q"];

#[derive(Debug, PartialEq)]
enum ReplCommand<'a> {
    Exit,
    SwitchModel(&'a str),
    ListModels,
    Prompt(&'a str),
}

fn parse_line(input: &str) -> Option<ReplCommand<'_>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    if is_exit_command(trimmed) {
        return Some(ReplCommand::Exit);
    }
    if trimmed == "/models" {
        return Some(ReplCommand::ListModels);
    }
    if let Some(model) = trimmed.strip_prefix("/model ") {
        let model = model.trim();
        if !model.is_empty() {
            return Some(ReplCommand::SwitchModel(model));
        }
    }
    Some(ReplCommand::Prompt(trimmed))
}

/// Run the interactive REPL loop.
pub async fn run(dispatcher: Dispatcher, mut opts: ChatOpts) -> Result<()> {
    helpers::print_banner(opts.model.as_deref().unwrap_or(dispatcher.default_model()));

    let mut editor = create_editor()?;

    loop {
        let input = match editor.readline("You: ") {
            Ok(line) => line,
            Err(rustyline::error::ReadlineError::Interrupted) => break,
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {e}");
                break;
            }
        };

        let Some(command) = parse_line(&input) else {
            continue;
        };
        let _ = editor.add_history_entry(&input);

        match command {
            ReplCommand::Exit => {
                println!("\nGoodbye!");
                break;
            }
            ReplCommand::SwitchModel(model) => {
                let provider = dispatcher.resolve_provider(model);
                println!("Model set to {model} ({})\n", provider.display_name());
                opts.model = Some(model.to_string());
            }
            ReplCommand::ListModels => {
                for model in dispatcher.catalog().discover_available_models().await {
                    println!("  {model}");
                }
                println!();
            }
            ReplCommand::Prompt(prompt) => {
                debug!(model = ?opts.model, "processing input");
                helpers::print_thinking();

                let request = opts.apply(dispatcher.new_request(prompt));
                let outcome = dispatcher.complete(&request).await;
                helpers::clear_thinking();
                match outcome {
                    Ok(outcome) => {
                        helpers::print_response(&outcome.response);
                        helpers::print_usage(&outcome.record);
                        println!();
                    }
                    Err(e) => eprintln!("\nError: {e}\n"),
                }
            }
        }
    }

    save_history(&mut editor);

    Ok(())
}

/// Create a rustyline editor with history.
fn create_editor() -> Result<Editor<(), DefaultHistory>> {
    let mut editor = DefaultEditor::new()?;
    editor.set_max_history_size(1000)?;

    let history_path = history_path();
    if history_path.exists() {
        let _ = editor.load_history(&history_path);
        debug!("loaded REPL history from {}", history_path.display());
    }

    Ok(editor)
}

/// Save history to disk.
fn save_history(editor: &mut Editor<(), DefaultHistory>) {
    let path = history_path();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(e) = editor.save_history(&path) {
        debug!("failed to save history: {e}");
    }
}

/// Path to the history file.
pub(crate) fn history_path() -> std::path::PathBuf {
    aiportal_core::utils::get_data_path()
        .join("history")
        .join("repl_history")
}

/// Check if input is an exit command.
fn is_exit_command(input: &str) -> bool {
    let lower = input.to_lowercase();
    EXIT_COMMANDS.contains(&lower.as_str())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
