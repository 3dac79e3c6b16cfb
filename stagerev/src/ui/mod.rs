//! UI rendering module for stagerev.
//!
//! `render()` is the single entry point called by the event loop's
//! `terminal.draw()` closure. It picks one of three views from the session
//! phase. Layout arithmetic lives in `layout.rs`, the two content columns in
//! `file_list.rs` and `review_view.rs`, and markdown conversion in `markdown.rs`.

pub mod file_list;
pub mod keybindings;
pub mod layout;
pub mod markdown;
pub mod review_view;

use ratatui::{
    layout::{Rect, Size},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Paragraph, Wrap},
    Frame,
};

use crate::app::{AppState, Phase};
use crate::theme::Theme;
use layout::{centered, compute_layout, render_hint_bar};

/// Shown while the review run is in flight.
pub const LOADING_TEXT: &str = "Reviewing staged Rust changes with the LLM, please wait...";
/// Shown when the staged area holds no matching files.
pub const NO_CHANGES_TEXT: &str = "No staged changes to .rs files.";

/// Renders one complete frame for the current phase.
///
/// Called exactly once per `AppEvent::Render` inside `terminal.draw()`.
pub fn render(frame: &mut Frame, state: &mut AppState, theme: &Theme) {
    let area = frame.area();
    match state.phase.clone() {
        Phase::Loading => render_loading(frame, area, state, theme),
        Phase::Error(message) => render_error(frame, area, state, &message, theme),
        Phase::Content if state.files.is_empty() => render_no_changes(frame, area, state, theme),
        Phase::Content => render_content(frame, area, state, theme),
    }
}

fn render_loading(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let info = Style::default().fg(theme.info_text);
    let text = Text::from(vec![
        Line::from(Span::styled(
            state.spinner.glyph(),
            Style::default().fg(theme.spinner),
        )),
        Line::from(Span::styled(LOADING_TEXT, info)),
        Line::from(Span::styled("(press q to quit)", info)),
    ]);
    render_centered(frame, area, state, text);
}

fn render_error(frame: &mut Frame, area: Rect, state: &AppState, message: &str, theme: &Theme) {
    let mut lines = vec![
        Line::from(Span::styled(
            "Error",
            Style::default()
                .fg(theme.error_heading)
                .add_modifier(Modifier::BOLD),
        )),
        Line::default(),
    ];
    let error_style = Style::default().fg(theme.error_text);
    lines.extend(
        message
            .lines()
            .map(|l| Line::from(Span::styled(l.to_owned(), error_style))),
    );
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "Press q to quit.",
        Style::default().fg(theme.info_text),
    )));
    render_centered(frame, area, state, Text::from(lines));
}

fn render_no_changes(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let info = Style::default().fg(theme.info_text);
    let text = Text::from(vec![
        Line::from(Span::styled(NO_CHANGES_TEXT, info)),
        Line::default(),
        Line::from(Span::styled(
            "Stage some Rust changes with `git add` and run again.",
            info,
        )),
        Line::default(),
        Line::from(Span::styled("Press q to quit.", info)),
    ]);
    render_centered(frame, area, state, text);
}

fn render_content(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let [file_list, review, hint_bar] = compute_layout(area, state);
    file_list::render_file_list(frame, file_list, state, theme);
    review_view::render_review(frame, review, state, theme);
    render_hint_bar(frame, hint_bar, state, theme);
}

/// Draws `text` as a block centred in `area`, or at its top-left corner while
/// the terminal size is unknown. Lines wider than `area` wrap.
fn render_centered(frame: &mut Frame, area: Rect, state: &AppState, text: Text<'static>) {
    let width = u16::try_from(text.width()).unwrap_or(u16::MAX).min(area.width).max(1);
    let height: usize = text
        .lines
        .iter()
        .map(|l| l.width().max(1).div_ceil(usize::from(width)))
        .sum();
    let content = Size::new(width, u16::try_from(height).unwrap_or(u16::MAX));
    let target = centered(area, content, state.size.is_some());
    frame.render_widget(Paragraph::new(text).wrap(Wrap { trim: false }), target);
}
