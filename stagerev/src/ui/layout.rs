//! Two-column layout engine for stagerev.
//!
//! Pure layout arithmetic plus the shared block and hint-bar widgets. Called
//! inside `terminal.draw()` on every render, so every frame gets a fresh layout
//! that reflects the current terminal size.
//!
//! # Column geometry
//!
//! | Column | Width |
//! |--------|-------|
//! | file list | `max(total / 4, 20)` |
//! | review    | `max(total - left - 4, 20)` |
//!
//! The remaining four columns form the gutter between the two panes. When the
//! terminal size has not been reported yet the total width counts as 100.

use ratatui::{
    layout::{Constraint, Layout, Margin, Rect, Size},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Paragraph},
    Frame,
};

use crate::app::{AppState, Phase};
use crate::theme::Theme;

/// Total width assumed before the first resize report.
pub const UNKNOWN_WIDTH: u16 = 100;
/// Narrowest either column may get.
pub const MIN_COLUMN_WIDTH: u16 = 20;
/// Columns between the file list and the review pane.
pub const COLUMN_GAP: u16 = 4;

/// Returns `(left, right)` column widths for a terminal `total` columns wide.
pub fn column_widths(total: Option<u16>) -> (u16, u16) {
    let total = total.filter(|w| *w > 0).unwrap_or(UNKNOWN_WIDTH);
    let left = (total / 4).max(MIN_COLUMN_WIDTH);
    let right = total
        .saturating_sub(left)
        .saturating_sub(COLUMN_GAP)
        .max(MIN_COLUMN_WIDTH);
    (left, right)
}

/// Returns `[file_list, review, hint_bar]` rects for the content view.
///
/// The returned rects are valid only for the current draw closure.
pub fn compute_layout(area: Rect, state: &AppState) -> [Rect; 3] {
    let [main_area, hint_bar] =
        area.layout(&Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]));

    let (left, right) = column_widths(state.size.map(|s| s.width));
    let [file_list, review] = main_area.layout(
        &Layout::horizontal([Constraint::Length(left), Constraint::Length(right)])
            .spacing(COLUMN_GAP),
    );

    [file_list, review, hint_bar]
}

/// Returns the inner `Rect` of a panel after removing the 1-cell border.
pub fn inner_rect(area: Rect) -> Rect {
    area.inner(Margin { vertical: 1, horizontal: 1 })
}

/// Places a `content` sized box in the middle of `area`.
///
/// With an unknown terminal size the box stays at the top-left corner of
/// `area`. The box never exceeds `area`.
pub fn centered(area: Rect, content: Size, known: bool) -> Rect {
    let width = content.width.min(area.width);
    let height = content.height.min(area.height);
    if !known {
        return Rect { width, height, ..area };
    }
    area.centered(Constraint::Length(width), Constraint::Length(height))
}

/// Builds a bordered `Block` for a panel.
///
/// The pane that reacts to scroll keys gets a thick border in the active colour.
pub fn panel_block<'a>(title: Line<'a>, is_active: bool, theme: &Theme) -> Block<'a> {
    let border_style = if is_active {
        Style::default().fg(theme.border_active)
    } else {
        Style::default().fg(theme.border_inactive)
    };
    let border_type = if is_active { BorderType::Thick } else { BorderType::Plain };

    Block::bordered()
        .title(title)
        .border_type(border_type)
        .border_style(border_style)
}

/// Renders the 1-row key-hint bar under the columns.
pub fn render_hint_bar(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let hints: &[(&str, &str)] = match state.phase {
        Phase::Content if !state.files.is_empty() => &[
            ("↑/k", "prev file"),
            ("↓/j", "next file"),
            ("^d/^u", "scroll review"),
            ("q", "quit"),
        ],
        _ => &[("q", "quit")],
    };

    let key_style = Style::default()
        .fg(theme.hint_key)
        .add_modifier(Modifier::BOLD);
    let mut spans = Vec::with_capacity(hints.len() * 2);
    for (key, label) in hints {
        spans.push(Span::styled(format!(" {key} "), key_style));
        spans.push(Span::raw(format!("{label} ")));
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans))
            .style(Style::default().bg(theme.hint_bar_bg).fg(theme.hint_bar_fg)),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_width_counts_as_one_hundred() {
        assert_eq!(column_widths(None), (25, 71));
        assert_eq!(column_widths(Some(0)), (25, 71));
    }

    #[test]
    fn wide_terminal_splits_a_quarter() {
        assert_eq!(column_widths(Some(200)), (50, 146));
    }

    #[test]
    fn narrow_terminal_hits_the_minimums() {
        assert_eq!(column_widths(Some(60)), (20, 36));
        assert_eq!(column_widths(Some(30)), (20, 20));
    }

    #[test]
    fn layout_fills_width_with_gutter() {
        let mut state = AppState::new();
        state.resize(120, 30);
        let [list, review, hint] = compute_layout(Rect::new(0, 0, 120, 30), &state);
        assert_eq!(list.width, 30);
        assert_eq!(review.x, 34);
        assert_eq!(review.width, 86);
        assert_eq!(hint, Rect::new(0, 29, 120, 1));
    }

    #[test]
    fn centered_box_respects_unknown_size() {
        let area = Rect::new(0, 0, 80, 24);
        let content = Size::new(20, 4);
        assert_eq!(centered(area, content, false), Rect::new(0, 0, 20, 4));
        assert_eq!(centered(area, content, true), Rect::new(30, 10, 20, 4));
    }
}
