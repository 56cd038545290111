mod app;
pub mod console;
pub mod menu;
mod message;
pub mod presenter;
pub mod search;
pub mod watcher;

use crate::integrations::Tracker;
use anyhow::Result;
use tokio::sync::mpsc;
use watcher::ConfigWatcher;

pub use app::{App, PollJob, PollOutcome, PollStatus};
pub use message::Message;
pub use presenter::Presenter;

/// Drive the app until Quit, end of input or Ctrl-C.
///
/// One loop owns the app: user messages, poll results, the poll timer and
/// config file changes are handled one at a time.
pub async fn run<T, P>(mut app: App<T, P>, mut messages: mpsc::UnboundedReceiver<Message>) -> Result<()>
where
    T: Tracker + Clone + 'static,
    P: Presenter,
{
    let mut watcher = start_watcher(&app);
    let mut input_open = true;

    // Menu shows immediately with a loading state
    app.render();
    app.start_background_poll();

    loop {
        let auto_refresh = app.config().auto_refresh;
        let next_poll_at = app.next_poll_at();

        tokio::select! {
            msg = messages.recv(), if input_open => match msg {
                Some(msg) => {
                    if app.update(msg).await? {
                        break; // Quit requested
                    }
                }
                None => {
                    tracing::debug!("Input closed; running until interrupted");
                    input_open = false;
                }
            },
            Some(outcome) = app.next_poll_result() => {
                if let Err(e) = app.apply_poll(outcome) {
                    tracing::warn!("Poll failed: {}", e);
                }
            }
            _ = tokio::time::sleep_until(next_poll_at), if auto_refresh => {
                app.start_background_poll();
            }
            Some(()) = config_changed(&mut watcher) => {
                tracing::info!("Config file changed, reloading");
                app.update(Message::ReloadConfig).await?;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
        }
    }

    Ok(())
}

fn start_watcher<T, P>(app: &App<T, P>) -> Option<ConfigWatcher>
where
    T: Tracker + Clone + 'static,
    P: Presenter,
{
    if !app.config().watch_config {
        return None;
    }
    match ConfigWatcher::new(app.config_path()) {
        Ok(watcher) => Some(watcher),
        Err(e) => {
            tracing::warn!("Not watching config file: {:#}", e);
            None
        }
    }
}

async fn config_changed(watcher: &mut Option<ConfigWatcher>) -> Option<()> {
    match watcher {
        Some(watcher) => watcher.changed().await,
        None => std::future::pending().await,
    }
}
