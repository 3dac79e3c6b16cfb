//! stagerev: LLM review of staged Rust changes in a terminal UI.
//!
//! Entry point for the `stagerev` binary. Wires together the command line
//! (`cli`), terminal lifecycle (`tui`), unified event bus (`event`), session
//! state (`app`), rendering (`ui`), theme (`theme`) and the review engine in
//! `stagerev-core`.
//!
//! # Startup sequence
//!
//! 1. `logging::init()`: file logging, only when `STAGEREV_LOG` is set.
//! 2. Parse the command line; `config` subcommands run and exit here.
//! 3. Load the config, resolve the provider and build the chat client. Any
//!    failure is reported on stderr before the terminal is touched.
//! 4. `install_panic_hook()`, then `register_sigterm()`, then `init_tui()`.
//! 5. Spawn the input/timer task and the single review task.
//!
//! # Safety
//!
//! `restore_tui()` is called after the event loop exits (quit key, SIGTERM,
//! closed channel or a draw error). Nothing inside the loop returns early with
//! `?`; the panic hook covers unexpected panics.

mod app;
mod cli;
mod event;
mod logging;
mod theme;
mod tui;
mod ui;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use stagerev_core::{config, provider, GitCli, OpenAiCompatibleClient};
use tracing::{info, warn};

use crate::cli::{Cli, Command};
use crate::event::AppEvent;
use crate::ui::keybindings::{handle_key, KeyAction};

/// Upper bound on how long a SIGTERM goes unnoticed while the channel is quiet.
const HEARTBEAT: Duration = Duration::from_millis(50);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Some(path) = logging::init()? {
        info!(path = %path.display(), "logging enabled");
    }

    let cli = Cli::parse();
    if let Some(Command::Config { command }) = &cli.command {
        return cli::run_config_command(command);
    }

    let config = config::load().context("Failed to load configuration")?;
    let resolved = provider::resolve(&config).context("Failed to resolve provider")?;
    let client = OpenAiCompatibleClient::new(&resolved).context("Failed to create LLM client")?;
    info!(
        provider = %resolved.name,
        model = %client.model(),
        base_url = %client.base_url(),
        "starting review session"
    );
    let theme = theme::Theme::from_config(config.theme.as_deref());

    tui::install_panic_hook();
    let term_flag = tui::register_sigterm().context("Failed to register SIGTERM handler")?;
    let mut terminal = tui::init_tui()?;

    let mut state = app::AppState::new();
    match terminal.size() {
        Ok(size) => state.resize(size.width, size.height),
        Err(err) => warn!(%err, "terminal size unknown until first resize"),
    }

    let handler = event::EventHandler::new();
    event::spawn_event_task(handler.tx.clone());
    event::spawn_review_task(
        handler.tx.clone(),
        Arc::new(GitCli::new()),
        Arc::new(client),
    );
    let mut rx = handler.rx;

    // Exits only via `break`, so `restore_tui()` below is always reached.
    let mut draw_result = Ok(());
    'event_loop: loop {
        tokio::select! {
            _ = tokio::time::sleep(HEARTBEAT) => {
                if term_flag.load(Ordering::Relaxed) {
                    info!("SIGTERM received");
                    break 'event_loop;
                }
            }
            maybe_event = rx.recv() => {
                match maybe_event {
                    Some(AppEvent::Render) => {
                        if let Err(err) = terminal.draw(|frame| ui::render(frame, &mut state, &theme)) {
                            draw_result = Err(err);
                            break 'event_loop;
                        }
                    }
                    Some(AppEvent::Key(key)) => {
                        if handle_key(key, &mut state) == KeyAction::Quit {
                            break 'event_loop;
                        }
                    }
                    Some(AppEvent::Resize(width, height)) => state.resize(width, height),
                    Some(AppEvent::Tick) => state.on_tick(),
                    Some(AppEvent::ReviewLoaded(result)) => state.apply_review(*result),
                    Some(AppEvent::Quit) | None => break 'event_loop,
                }
                if term_flag.load(Ordering::Relaxed) {
                    break 'event_loop;
                }
            }
        }
    }

    tui::restore_tui()?;
    draw_result.context("Failed to draw frame")?;
    Ok(())
}
