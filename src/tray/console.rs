//! Terminal presentation adapter.
//!
//! Prints the menu to stdout and reads single-line commands from stdin. It has
//! no dialogs, so prompts print their options and report "cancelled"; the
//! console commands carry every argument inline instead.

use super::menu::{MenuIssue, MenuView};
use super::presenter::Presenter;
use super::Message;
use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::process::Command;
use tokio::sync::mpsc;

pub const HELP: &str = "\
Commands:
  r | refresh          poll now
  reload               re-read the config file
  s [term]             search cached issues
  o KEY                open issue in the browser
  board                open the configured board
  t KEY [ID]           list transitions / apply transition ID
  p KEY | u KEY        pin / unpin
  cl KEY | ct KEY      copy link / copy \"KEY summary\"
  q | quit             exit";

#[derive(Debug, Default)]
pub struct ConsolePresenter;

impl ConsolePresenter {
    pub fn new() -> Self {
        Self
    }
}

impl Presenter for ConsolePresenter {
    fn render_menu(&mut self, view: &MenuView) {
        let mut out = String::new();
        out.push_str(&format!("\n{}\n", view.tooltip));
        if let Some(status) = &view.status {
            out.push_str(&format!("⚠ {}\n", status));
        }
        if !view.pinned.is_empty() {
            out.push_str("── Current ticket ──\n");
            for item in &view.pinned {
                push_item(&mut out, item);
            }
        }
        for section in &view.sections {
            out.push_str(&format!("{}\n", section.title));
            if let Some(error) = &section.error {
                out.push_str(&format!("  {}\n", error));
            }
            if let Some(empty) = &section.empty_label {
                out.push_str(&format!("  {}\n", empty));
            }
            for item in &section.items {
                push_item(&mut out, item);
            }
        }
        let actions: Vec<&str> = view.actions.iter().map(|a| a.label()).collect();
        out.push_str(&format!("[{}]\n", actions.join(" | ")));
        print!("{}", out);
        let _ = std::io::stdout().flush();
    }

    fn prompt_choice(&mut self, title: &str, options: &[String]) -> Option<usize> {
        println!("{}", title);
        for option in options {
            println!("  {}", option);
        }
        None
    }

    fn prompt_text(&mut self, label: &str) -> Option<String> {
        println!("{}: pass the value inline (see `help`)", label);
        None
    }

    fn notify(&mut self, title: &str, body: &str) {
        println!("🔔 {}: {}", title, body);
    }

    fn copy_to_clipboard(&mut self, text: &str) -> Result<()> {
        copy_to_clipboard(text)
    }

    fn open_url(&mut self, url: &str) -> Result<()> {
        open_url(url)
    }
}

fn push_item(out: &mut String, item: &MenuIssue) {
    let pin = if item.pinned { " 📌" } else { "" };
    out.push_str(&format!("  {}{}\n", item.label, pin));
    for transition in &item.transitions {
        out.push_str(&format!("      ↳ [{}] {}\n", transition.id, transition.label));
    }
}

/// Open a URL in the default browser
pub fn open_url(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    let opener = "open";
    #[cfg(not(target_os = "macos"))]
    let opener = "xdg-open";

    Command::new(opener)
        .arg(url)
        .spawn()
        .or_else(|_| {
            // Fallback to wslview for WSL
            Command::new("wslview").arg(url).spawn()
        })
        .with_context(|| format!("Failed to open {}", url))?;
    Ok(())
}

/// Put `text` on the system clipboard
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut clipboard = arboard::Clipboard::new().context("Clipboard unavailable")?;
    clipboard
        .set_text(text.to_string())
        .context("Failed to copy to clipboard")?;
    tracing::debug!("Copied {} bytes to clipboard", text.len());
    Ok(())
}

/// Translate one console line into a message
pub fn parse_command(line: &str) -> Message {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Message::None;
    };
    let key = words.next().map(|k| k.to_uppercase());
    let rest = words.next().map(str::to_string);

    match (command, key) {
        ("q" | "quit", _) => Message::Quit,
        ("r" | "refresh", _) => Message::Refresh,
        ("reload", _) => Message::ReloadConfig,
        ("board", _) => Message::OpenBoard,
        ("s" | "search", _) => {
            let term = line.trim().splitn(2, char::is_whitespace).nth(1);
            Message::Search {
                term: term.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()),
            }
        }
        ("o" | "open", Some(key)) => Message::Open { key },
        ("t" | "transition", Some(key)) => match rest {
            Some(id) => Message::Transition {
                key,
                transition_id: Some(id),
            },
            None => Message::ShowTransitions { key },
        },
        ("p" | "pin", Some(key)) => Message::Pin { key },
        ("u" | "unpin", Some(key)) => Message::Unpin { key },
        ("cl" | "copy-link", Some(key)) => Message::CopyLink { key },
        ("ct" | "copy-title", Some(key)) => Message::CopyTitle { key },
        ("h" | "help" | "?", _) => {
            println!("{}", HELP);
            Message::None
        }
        _ => {
            println!("Unknown command: {}", line.trim());
            Message::None
        }
    }
}

/// Read stdin on a dedicated thread and forward parsed commands.
/// The channel closes when stdin does.
pub fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<Message> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let msg = parse_command(&line);
            if msg != Message::None && tx.send(msg).is_err() {
                break;
            }
        }
    });
    rx
}
