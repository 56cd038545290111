use anyhow::{Context, Result};
use clap::Parser;
use jira_tray::config::{self, ConfigStore};
use jira_tray::integrations::jira::JiraClient;
use jira_tray::integrations::pinned::PinnedSet;
use jira_tray::tray::{self, console, App};

#[derive(Parser, Debug)]
#[command(name = "jira-tray")]
#[command(about = "System tray poller for Jira issues")]
#[command(version)]
struct Args {
    /// Write a default configuration file and exit
    #[arg(long)]
    init: bool,

    /// Path to config file
    #[arg(long, short)]
    config: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("jira_tray=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_path = match args.config {
        Some(path) => path,
        None => config::default_config_path()?,
    };

    if args.init {
        if config::init(&config_path)? {
            println!("Created {}", config_path.display());
            println!("Edit it, export your API token, then run jira-tray.");
        } else {
            println!("Config already exists at {}", config_path.display());
        }
        return Ok(());
    }

    let store = ConfigStore::open(&config_path)?;
    let pins = PinnedSet::load(config::pinned_state_path().context("Cannot store pinned tickets")?);
    tracing::info!(
        "Polling {} every {}s",
        store.current().jira_url,
        store.current().poll_interval
    );

    let app = App::new(store, JiraClient, console::ConsolePresenter::new(), pins);
    let messages = console::spawn_stdin_reader();
    println!("{}", console::HELP);

    tray::run(app, messages).await
}
