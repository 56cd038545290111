//! Capabilities the core needs from the platform.
//!
//! A tray toolkit, a dialog library or the terminal all plug in here; the
//! core never depends on a specific one.

use super::menu::MenuView;
use anyhow::Result;

pub trait Presenter {
    /// Replace the tray menu
    fn render_menu(&mut self, view: &MenuView);

    /// Ask the user to pick one option. `None` means cancelled.
    fn prompt_choice(&mut self, title: &str, options: &[String]) -> Option<usize>;

    /// Ask the user for a line of text. `None` means cancelled.
    fn prompt_text(&mut self, label: &str) -> Option<String>;

    /// Desktop notification
    fn notify(&mut self, title: &str, body: &str);

    fn copy_to_clipboard(&mut self, text: &str) -> Result<()>;

    fn open_url(&mut self, url: &str) -> Result<()>;
}
