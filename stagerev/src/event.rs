//! Event bus for stagerev.
//!
//! All user input, timer ticks, and the review run's result are normalised into
//! a single `AppEvent` enum and sent over a tokio unbounded MPSC channel. The
//! main loop receives from this channel and dispatches accordingly.
//!
//! Two independent intervals drive the UI:
//! - **Render interval** (33 ms, about 30 FPS) triggers a `terminal.draw()` call.
//! - **Spinner interval** (100 ms) advances the loading spinner.

use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{Event, EventStream, KeyEvent, KeyEventKind};
use futures::{FutureExt, StreamExt};
use stagerev_core::{run_review, ChatProvider, DiffSource, ReviewError, ReviewOutcome};
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{error, info};

/// Spinner tick period.
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);
/// Render tick period.
pub const RENDER_INTERVAL: Duration = Duration::from_millis(33);

/// All events the application can receive from any source.
#[derive(Debug)]
pub enum AppEvent {
    /// A key press from the terminal (`KeyEventKind::Press` only).
    ///
    /// Release and repeat events are filtered in [`spawn_event_task`] to avoid
    /// double-firing on Windows, which synthesises both press and release for
    /// every keystroke.
    Key(KeyEvent),
    /// Terminal was resized to (columns, rows).
    Resize(u16, u16),
    /// Spinner tick.
    Tick,
    /// Render tick; triggers a `terminal.draw()` call.
    Render,
    /// The one and only result of the background review run.
    ReviewLoaded(Box<Result<ReviewOutcome, ReviewError>>),
    /// Quit signal (SIGTERM or a closed input stream).
    Quit,
}

/// Holds the sender and receiver ends of the unified event channel.
///
/// The sender (`tx`) is cloned and handed to background tasks; the receiver
/// (`rx`) is owned by the main event loop.
pub struct EventHandler {
    pub tx: mpsc::UnboundedSender<AppEvent>,
    pub rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl EventHandler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawns the background task that feeds terminal input and timer ticks into
/// the event channel.
///
/// - `reader.next().fuse()` keeps `tokio::select!` from polling a completed
///   future if the crossterm stream ends.
/// - Only `KeyEventKind::Press` is forwarded.
/// - The task ends once the receiver is dropped.
pub fn spawn_event_task(tx: mpsc::UnboundedSender<AppEvent>) {
    tokio::spawn(async move {
        let mut tick_interval = interval(TICK_INTERVAL);
        let mut render_interval = interval(RENDER_INTERVAL);
        let mut reader = EventStream::new();

        loop {
            let tick_tick = tick_interval.tick();
            let render_tick = render_interval.tick();
            let crossterm_event = reader.next().fuse();

            let sent = tokio::select! {
                _ = tick_tick => tx.send(AppEvent::Tick),
                _ = render_tick => tx.send(AppEvent::Render),
                maybe_event = crossterm_event => match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        tx.send(AppEvent::Key(key))
                    }
                    Some(Ok(Event::Resize(w, h))) => tx.send(AppEvent::Resize(w, h)),
                    Some(Ok(_)) => Ok(()),
                    Some(Err(err)) => {
                        error!(%err, "terminal input failed");
                        let _ = tx.send(AppEvent::Quit);
                        break;
                    }
                    None => {
                        let _ = tx.send(AppEvent::Quit);
                        break;
                    }
                },
            };
            if sent.is_err() {
                break;
            }
        }
    });
}

/// Spawns the single review run for this session.
///
/// Sends exactly one [`AppEvent::ReviewLoaded`] and ends. A dropped receiver
/// means the session already quit, so the result is discarded.
pub fn spawn_review_task(
    tx: mpsc::UnboundedSender<AppEvent>,
    source: Arc<dyn DiffSource>,
    chat: Arc<dyn ChatProvider>,
) {
    tokio::spawn(async move {
        let result = run_review(source.as_ref(), chat.as_ref()).await;
        match &result {
            Ok(outcome) if outcome.is_empty() => info!("review run found no staged changes"),
            Ok(outcome) => info!(files = outcome.files.len(), "review run finished"),
            Err(err) => error!(%err, "review run failed"),
        }
        let _ = tx.send(AppEvent::ReviewLoaded(Box::new(result)));
    });
}
