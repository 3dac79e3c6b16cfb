//! File list panel renderer.
//!
//! Renders the left column from `AppState.files`: one row per staged file, the
//! selected row highlighted, and the file count in the title.

use ratatui::{
    layout::Rect,
    style::Style,
    text::Line,
    widgets::{List, ListItem},
    Frame,
};

use crate::app::AppState;
use crate::theme::Theme;
use crate::ui::layout::panel_block;

/// Renders the file list with `render_stateful_widget` so the `ListState`
/// keeps the selected row in view on long lists.
pub fn render_file_list(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let title = Line::from(format!(" Files ({}) ", state.files.len()));
    let block = panel_block(title, false, theme);

    let items: Vec<ListItem> = state
        .files
        .iter()
        .map(|path| ListItem::new(Line::raw(path.clone())))
        .collect();

    let list = List::new(items)
        .block(block)
        .style(Style::default().fg(theme.file_normal))
        .highlight_symbol("> ")
        .highlight_spacing(ratatui::widgets::HighlightSpacing::Always)
        .highlight_style(
            Style::default()
                .fg(theme.file_selected_fg)
                .bg(theme.file_selected_bg),
        );

    frame.render_stateful_widget(list, area, &mut state.file_list_state);
}
