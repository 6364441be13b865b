//! Console front end
//!
//! Stands in for the popup window and the history view: the display loop is
//! the only place that writes to the terminal, and every other task reaches
//! it through `ChannelNotifier`.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::api::commands::{history, monitor, translate};
use crate::core::coordinator::{CoordinatorHandle, TranslationServices};
use crate::shared::emit::DisplayCommand;
use crate::shared::types::TranslationRecord;

pub const HELP: &str = "\
Commands:
  history [n]              show the last n translations (default 200)
  translate <text>         translate typed text
  edit <no> <translation>  replace the translation of entry <no>
  delete <no>              delete entry <no>
  clear                    delete all history
  toggle                   turn auto translation on/off
  quit                     exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    History(Option<usize>),
    Translate(String),
    Edit { index: usize, translated: String },
    Delete(usize),
    Clear,
    Toggle,
    Help,
    Quit,
}

/// Entry numbers are shown 1-based; commands take them back to 0-based.
fn parse_entry_number(raw: &str) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n - 1),
        _ => Err(format!("'{}' is not an entry number", raw)),
    }
}

pub fn parse_command(line: &str) -> Result<ConsoleCommand, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match word.to_lowercase().as_str() {
        "history" | "h" => {
            if rest.is_empty() {
                Ok(ConsoleCommand::History(None))
            } else {
                rest.parse()
                    .map(|n| ConsoleCommand::History(Some(n)))
                    .map_err(|_| format!("'{}' is not a number", rest))
            }
        }
        "translate" | "t" => {
            if rest.is_empty() {
                Err("usage: translate <text>".to_string())
            } else {
                Ok(ConsoleCommand::Translate(rest.to_string()))
            }
        }
        "edit" | "e" => {
            let (number, translated) = rest
                .split_once(char::is_whitespace)
                .ok_or_else(|| "usage: edit <no> <translation>".to_string())?;
            Ok(ConsoleCommand::Edit {
                index: parse_entry_number(number)?,
                translated: translated.trim().to_string(),
            })
        }
        "delete" | "d" => Ok(ConsoleCommand::Delete(parse_entry_number(rest)?)),
        "clear" => Ok(ConsoleCommand::Clear),
        "toggle" => Ok(ConsoleCommand::Toggle),
        "help" | "?" => Ok(ConsoleCommand::Help),
        "quit" | "q" | "exit" => Ok(ConsoleCommand::Quit),
        "" => Err(String::new()),
        other => Err(format!("Unknown command '{}'. Type 'help'.", other)),
    }
}

pub fn render_transient(text: &str) -> String {
    format!("\n  ┌─ தமிழ் ─────────\n  │ {}\n  └─────────────────", text.replace('\n', "\n  │ "))
}

pub fn render_history(records: &[TranslationRecord], first_number: usize) -> String {
    if records.is_empty() {
        return "No history available.".to_string();
    }
    let separator = "-".repeat(50);
    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            format!(
                "#{}\nEN: {}\nTA: {}\n{}",
                first_number + i,
                record.original,
                record.translated,
                separator
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Terminal text for one display command. History entries are numbered
/// from the position carried in the command, so `edit`/`delete` numbers
/// stay valid even if a translation was appended after the request.
pub fn render(command: &DisplayCommand) -> String {
    match command {
        DisplayCommand::Transient { text, .. } => render_transient(text),
        DisplayCommand::History { first, records } => render_history(records, first + 1),
        DisplayCommand::Status(message) => format!("ℹ️  {}", message),
    }
}

/// Drain display commands until every notifier is gone.
pub async fn run_display_loop(mut rx: mpsc::UnboundedReceiver<DisplayCommand>) {
    while let Some(command) = rx.recv().await {
        println!("{}", render(&command));
        if let DisplayCommand::Transient { duration, .. } = command {
            log::debug!("[Display] Popup shown for {:?}", duration);
        }
    }
}

/// Execute one command. Returns false when the app should exit.
pub async fn execute(
    command: ConsoleCommand,
    services: &TranslationServices,
    coordinator: &CoordinatorHandle,
) -> bool {
    let outcome = match command {
        ConsoleCommand::History(limit) => history::show_history(services, limit).map(|_| ()),
        ConsoleCommand::Translate(text) => translate::translate_manual(services, &text).await.map(|_| ()),
        ConsoleCommand::Edit { index, translated } => {
            history::edit_translation(services, index, &translated)
                .map(|record| println!("✅ Updated #{}: {}", index + 1, record.translated))
        }
        ConsoleCommand::Delete(index) => history::delete_entry(services, index)
            .map(|record| println!("🗑  Deleted #{}: {}", index + 1, record.original)),
        ConsoleCommand::Clear => {
            history::clear_history(services).map(|_| println!("All history deleted successfully."))
        }
        ConsoleCommand::Toggle => {
            monitor::toggle_auto_translate(coordinator);
            Ok(())
        }
        ConsoleCommand::Help => {
            println!("{}", HELP);
            Ok(())
        }
        ConsoleCommand::Quit => return false,
    };

    if let Err(e) = outcome {
        eprintln!("❌ {}", e);
    }
    true
}

/// Read commands from stdin until `quit` or end of input.
pub async fn run_command_loop(services: &TranslationServices, coordinator: &CoordinatorHandle) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                log::error!("[Console] Failed to read input: {}", e);
                break;
            }
        };
        match parse_command(&line) {
            Ok(command) => {
                if !execute(command, services, coordinator).await {
                    break;
                }
            }
            Err(message) if message.is_empty() => {}
            Err(message) => eprintln!("{}", message),
        }
    }
}
