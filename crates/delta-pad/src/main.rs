//! Headless driver for the delta-pad engine.
//!
//! Reads a small edit-script language from a file or stdin, applies it
//! through an editing session, and prints the requested state. One command
//! per line; `#` starts a comment.
use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use delta_pad_core::Editor;
use delta_pad_mod_history::{ChangeSource, HistoryConfig};
use delta_pad_ot::Delta;

/// Run an edit script against a rich-text document with undo/redo.
#[derive(Parser, Debug)]
#[command(name = "delta-pad", version, about)]
struct Cli {
    /// Script file to execute (reads stdin when omitted).
    script: Option<PathBuf>,

    /// Coalescing window for undo steps, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    delay_ms: u64,

    /// Maximum number of undo steps kept.
    #[arg(long, default_value_t = 100)]
    max_stack: usize,

    /// Record only user edits; `api` changes are rebased, never recorded.
    #[arg(long)]
    user_only: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let script = match &cli.script {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read script {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read script from stdin")?;
            buffer
        }
    };

    let config = HistoryConfig {
        delay_ms: cli.delay_ms,
        max_stack: cli.max_stack,
        user_only: cli.user_only,
    };
    let mut editor = Editor::with_config(config);

    for (number, line) in script.lines().enumerate() {
        run_command(&mut editor, line)
            .with_context(|| format!("script line {}: {}", number + 1, line.trim()))?;
    }
    Ok(())
}

/// Executes a single script line against the session.
fn run_command(editor: &mut Editor, line: &str) -> Result<()> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(());
    }
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };
    match command {
        "insert" => {
            let (index, text) = rest
                .split_once(char::is_whitespace)
                .context("usage: insert <index> <text>")?;
            let index = parse_index(index)?;
            // \n in scripts stands for a literal newline
            editor.insert_text(index, &text.replace("\\n", "\n"))?;
        }
        "embed" => {
            let (index, json) = rest
                .split_once(char::is_whitespace)
                .context("usage: embed <index> <json>")?;
            let index = parse_index(index)?;
            let value = serde_json::from_str(json).context("embed payload is not valid JSON")?;
            editor.insert_embed(index, value, None)?;
        }
        "delete" => {
            let (index, len) = rest
                .split_once(char::is_whitespace)
                .context("usage: delete <index> <len>")?;
            editor.delete_range(parse_index(index)?, parse_index(len)?)?;
        }
        "format" => {
            let mut parts = rest.splitn(4, char::is_whitespace);
            let (index, len, name, value) = (
                parts.next().context("usage: format <index> <len> <name> <json>")?,
                parts.next().context("format: missing <len>")?,
                parts.next().context("format: missing <name>")?,
                parts.next().context("format: missing <json>")?,
            );
            let value = serde_json::from_str(value).context("format value is not valid JSON")?;
            editor.format(parse_index(index)?, parse_index(len)?, name, value)?;
        }
        "api" => {
            let change: Delta =
                serde_json::from_str(rest).context("api payload is not a valid delta")?;
            editor.apply_delta(change, ChangeSource::Api)?;
        }
        "undo" => {
            if !editor.undo()? {
                tracing::info!("nothing to undo");
            }
        }
        "redo" => {
            if !editor.redo()? {
                tracing::info!("nothing to redo");
            }
        }
        "cutoff" => editor.cutoff(),
        "clear" => editor.clear_history(),
        "caret" => println!("{}", editor.caret()),
        "text" => println!("{}", editor.text()),
        "print" => println!(
            "{}",
            serde_json::to_string_pretty(editor.contents()).context("serialize contents")?
        ),
        other => anyhow::bail!("unknown command: {other}"),
    }
    Ok(())
}

fn parse_index(raw: &str) -> Result<usize> {
    raw.parse()
        .with_context(|| format!("expected a number, got {raw:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_script(script: &str) -> Editor {
        let mut editor = Editor::new();
        for line in script.lines() {
            run_command(&mut editor, line).expect("command");
        }
        editor
    }

    #[test]
    fn test_script_insert_delete_undo() {
        let editor = run_script(
            "insert 0 hello world\n\
             cutoff\n\
             delete 0 6\n\
             undo\n",
        );
        assert_eq!(editor.text(), "hello world");
    }

    #[test]
    fn test_script_newline_escape() {
        let editor = run_script("insert 0 line1\\n");
        assert_eq!(editor.text(), "line1\n");
    }

    #[test]
    fn test_script_api_delta() {
        let editor = run_script(r#"api {"ops":[{"insert":"remote"}]}"#);
        assert_eq!(editor.text(), "remote");
    }

    #[test]
    fn test_unknown_command_errors() {
        let mut editor = Editor::new();
        assert!(run_command(&mut editor, "frobnicate 1").is_err());
    }

    #[test]
    fn test_comments_and_blank_lines_ignored() {
        let editor = run_script("# a comment\n\ninsert 0 ok");
        assert_eq!(editor.text(), "ok");
    }
}
