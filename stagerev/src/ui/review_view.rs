//! Review pane renderer.
//!
//! Shows the selected file's review as rendered markdown. The rendered text is
//! cached in `AppState.review_cache` and rebuilt only when the selection or the
//! pane width changes, so syntect runs once per review rather than once per frame.

use ratatui::{
    layout::Rect,
    text::Line,
    widgets::Paragraph,
    Frame,
};

use crate::app::{AppState, RenderedReview};
use crate::theme::Theme;
use crate::ui::layout::{inner_rect, panel_block};
use crate::ui::markdown::render_markdown;

/// Shown when the selected file has no or only blank review text.
pub const NO_REVIEW_PLACEHOLDER: &str = "_No review for this file._";

/// Renders the review pane and clamps `review_scroll` to the rendered text.
///
/// The viewport height is written back into `state` so the next half-page
/// scroll knows how far to move.
pub fn render_review(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let title = Line::from(format!(" {} ", state.selected_file().unwrap_or("Review")));
    let block = panel_block(title, true, theme);
    let inner = inner_rect(area);
    state.review_viewport_height = inner.height;

    refresh_cache(state, inner.width, theme);
    let text = state
        .review_cache
        .as_ref()
        .map(|cache| cache.text.clone())
        .unwrap_or_default();
    let max_scroll = u16::try_from(text.lines.len())
        .unwrap_or(u16::MAX)
        .saturating_sub(inner.height);
    state.review_scroll = state.review_scroll.min(max_scroll);

    frame.render_widget(block, area);
    frame.render_widget(
        Paragraph::new(text).scroll((state.review_scroll, 0)),
        inner,
    );
}

/// Re-renders the selected review if the selection or width changed.
fn refresh_cache(state: &mut AppState, width: u16, theme: &Theme) {
    let index = state.selected;
    let fresh = state
        .review_cache
        .as_ref()
        .is_some_and(|c| c.index == index && c.width == width);
    if fresh {
        return;
    }
    let src = state.selected_review().unwrap_or(NO_REVIEW_PLACEHOLDER);
    let text = render_markdown(src, width, theme);
    state.review_cache = Some(RenderedReview { index, width, text });
}
