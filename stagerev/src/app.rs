//! Central application state for stagerev.
//!
//! This module owns all mutable session state: the current phase, the spinner,
//! the review results, the file-list cursor, and the review pane's scroll
//! offset. No ratatui rendering logic lives here. `app.rs` is pure state read
//! by the render module and mutated by the key dispatcher and the event loop.

use std::collections::HashMap;

use ratatui::layout::Size;
use ratatui::text::Text;
use ratatui::widgets::ListState;
use stagerev_core::{ReviewError, ReviewOutcome};

/// Braille dot spinner, one frame per tick.
const SPINNER_FRAMES: [&str; 8] = ["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];

/// Which of the three views the session is in.
///
/// `Loading` is left exactly once, when the review run reports back. `Error` is
/// permanent; the only way out is to quit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Loading,
    /// The review run failed; holds the display message of the first failure.
    Error(String),
    Content,
}

/// Visual spinner counter advanced by ticks while loading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Spinner {
    frame: usize,
}

impl Spinner {
    pub fn advance(&mut self) {
        self.frame = (self.frame + 1) % SPINNER_FRAMES.len();
    }

    pub fn glyph(&self) -> &'static str {
        SPINNER_FRAMES[self.frame]
    }
}

/// Markdown of one review, rendered for one pane width.
#[derive(Debug, Clone)]
pub struct RenderedReview {
    pub index: usize,
    pub width: u16,
    pub text: Text<'static>,
}

/// All mutable session state passed through every render cycle.
#[derive(Debug, Default)]
pub struct AppState {
    pub phase: Phase,
    pub spinner: Spinner,

    /// Staged files in listing order.
    pub files: Vec<String>,
    /// Markdown review per file path.
    pub reviews: HashMap<String, String>,
    /// Cursor into `files`. Always `< files.len()` when the list is non-empty.
    pub selected: usize,
    /// Stateful list widget backing the file list; mirrors `selected`.
    pub file_list_state: ListState,

    /// Vertical scroll offset of the review pane. Reset on selection change.
    pub review_scroll: u16,
    /// Inner height of the review pane, cached after each render.
    pub review_viewport_height: u16,
    /// Last rendered review, reused while selection and width are unchanged.
    pub review_cache: Option<RenderedReview>,

    /// Last known terminal size; `None` until the first resize report.
    pub size: Option<Size>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spinner tick. Only advances the spinner while loading.
    pub fn on_tick(&mut self) {
        if self.phase == Phase::Loading {
            self.spinner.advance();
        }
    }

    /// Applies the single completion message of the review run.
    ///
    /// An error moves the session to `Error` for good. Success stores the files
    /// and reviews, pulls the cursor back into range, and moves to `Content`.
    pub fn apply_review(&mut self, result: Result<ReviewOutcome, ReviewError>) {
        match result {
            Err(err) => {
                self.phase = Phase::Error(err.to_string());
            }
            Ok(outcome) => {
                self.files = outcome.files;
                self.reviews = outcome.reviews;
                if self.selected >= self.files.len() {
                    self.selected = 0;
                }
                self.review_scroll = 0;
                self.review_cache = None;
                self.sync_list_state();
                self.phase = Phase::Content;
            }
        }
    }

    /// Records the terminal size. No phase change.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.size = Some(Size::new(width, height));
    }

    /// Moves the cursor to the previous file, stopping at the first.
    pub fn select_prev(&mut self) {
        if self.phase != Phase::Content || self.selected == 0 {
            return;
        }
        self.selected -= 1;
        self.on_selection_changed();
    }

    /// Moves the cursor to the next file, stopping at the last.
    pub fn select_next(&mut self) {
        if self.phase != Phase::Content || self.selected + 1 >= self.files.len() {
            return;
        }
        self.selected += 1;
        self.on_selection_changed();
    }

    pub fn scroll_review_down(&mut self, lines: u16) {
        if self.phase == Phase::Content {
            self.review_scroll = self.review_scroll.saturating_add(lines);
        }
    }

    pub fn scroll_review_up(&mut self, lines: u16) {
        if self.phase == Phase::Content {
            self.review_scroll = self.review_scroll.saturating_sub(lines);
        }
    }

    /// Scrolls the review pane down by half its visible height.
    ///
    /// Uses the viewport height cached from the previous render. If the cached
    /// height is zero (first frame), scrolls by 1 to avoid a no-op.
    pub fn half_page_down(&mut self) {
        self.scroll_review_down((self.review_viewport_height / 2).max(1));
    }

    pub fn half_page_up(&mut self) {
        self.scroll_review_up((self.review_viewport_height / 2).max(1));
    }

    /// Path under the cursor, if any file is listed.
    pub fn selected_file(&self) -> Option<&str> {
        self.files.get(self.selected).map(String::as_str)
    }

    /// Review text for the selected file; `None` when missing or blank.
    pub fn selected_review(&self) -> Option<&str> {
        self.selected_file()
            .and_then(|path| self.reviews.get(path))
            .map(String::as_str)
            .filter(|text| !text.trim().is_empty())
    }

    fn on_selection_changed(&mut self) {
        self.review_scroll = 0;
        self.sync_list_state();
    }

    fn sync_list_state(&mut self) {
        let selection = (!self.files.is_empty()).then_some(self.selected);
        self.file_list_state.select(selection);
    }
}
