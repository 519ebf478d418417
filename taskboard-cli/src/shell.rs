//! Interactive line-based session
//!
//! Keeps one store alive across commands so that column removals can be
//! undone and the activity log accumulates.

use crate::cli::{ShellCommand, ShellLine};
use crate::commands::{self, render_activity, Output};
use crate::error::Result;
use clap::Parser;
use std::io::Write;
use taskboard_sync::{BoardStore, OwnerId};
use tokio::io::{AsyncBufReadExt, BufReader};

const PROMPT: &str = "taskboard> ";

/// Whether the loop keeps reading
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Read commands from stdin until `quit` or end of input
pub async fn run(store: &BoardStore, owner: OwnerId, out: &Output) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    prompt()?;
    while let Some(line) = lines.next_line().await? {
        match split_words(&line) {
            Ok(words) if words.is_empty() => {}
            Ok(words) => match ShellLine::try_parse_from(words) {
                Ok(parsed) => match execute(store, &owner, parsed.command, out).await {
                    Ok(Flow::Quit) => return Ok(()),
                    Ok(Flow::Continue) => {}
                    Err(e) => eprintln!("Error: {e}"),
                },
                Err(e) => {
                    // Help and usage errors print themselves
                    let _ = e.print();
                }
            },
            Err(message) => eprintln!("Error: {message}"),
        }
        prompt()?;
    }
    Ok(())
}

async fn execute(
    store: &BoardStore,
    owner: &OwnerId,
    command: ShellCommand,
    out: &Output,
) -> Result<Flow> {
    match command {
        ShellCommand::Board(command) => commands::run(store, command, out).await?,
        ShellCommand::Undo => {
            store.undo().await?;
            let columns = store.columns().await;
            out.emit(&columns, || "Undone".to_string())?;
        }
        ShellCommand::Refresh => {
            let count = store.refresh(owner.clone()).await?;
            out.emit(&count, || format!("Loaded {count} tasks"))?;
        }
        ShellCommand::Activity { limit } => {
            let entries: Vec<_> = store.activity().await.into_iter().take(limit).collect();
            out.emit(&entries, || render_activity(&entries))?;
        }
        ShellCommand::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

fn prompt() -> Result<()> {
    let mut stdout = std::io::stdout();
    stdout.write_all(PROMPT.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

/// Split a line into words, honoring single quotes, double quotes and backslash escapes
pub fn split_words(line: &str) -> std::result::Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some('"'), '\\') | (None, '\\') => match chars.next() {
                Some(escaped) => {
                    current.push(escaped);
                    in_word = true;
                }
                None => return Err("trailing backslash".to_string()),
            },
            (Some(_), c) => current.push(c),
            (None, '"') | (None, '\'') => {
                quote = Some(c);
                in_word = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if let Some(q) = quote {
        return Err(format!("unterminated {q} quote"));
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}
