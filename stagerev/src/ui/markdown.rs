//! Markdown to ratatui text.
//!
//! Reviews come back from the model as markdown. [`render_markdown`] turns
//! them into a word-wrapped `Text<'static>` for the review pane: headings,
//! emphasis, inline code, links, block quotes, nested lists, rules, simple
//! tables, and fenced code blocks highlighted with syntect.
//!
//! Rendering is event-driven over pulldown-cmark. Inline content collects into
//! the current logical line, which is wrapped to the target width when its
//! block ends. Code block lines are hard-wrapped at the width, character by
//! character, so nothing past the pane edge is lost.

use std::sync::LazyLock;

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use syntect::easy::HighlightLines;
use syntect::highlighting::{FontStyle, ThemeSet};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;
use thiserror::Error;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::theme::Theme;

static SYNTAXES: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static CODE_THEMES: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

const BULLET: &str = "• ";
const QUOTE_BAR: &str = "│ ";
const CODE_INDENT: &str = "  ";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MarkdownError {
    #[error("cannot render markdown into a zero-width area")]
    ZeroWidth,
    #[error("markdown produced no output")]
    NoOutput,
}

/// Renders `src` for a pane `width` columns wide.
///
/// Falls back to the raw text, unstyled but still word-wrapped, when
/// rendering fails.
pub fn render_markdown(src: &str, width: u16, theme: &Theme) -> Text<'static> {
    match try_render_markdown(src, width, theme) {
        Ok(text) => text,
        Err(err) => {
            tracing::debug!(%err, "markdown fallback to raw text");
            wrap_raw(src, width)
        }
    }
}

/// Word-wraps plain text line by line. A zero width leaves it untouched.
fn wrap_raw(src: &str, width: u16) -> Text<'static> {
    if width == 0 {
        return Text::raw(src.to_owned());
    }
    let lines = src
        .lines()
        .flat_map(|line| {
            wrap_spans(
                vec![Span::raw(line.to_owned())],
                Vec::new(),
                Vec::new(),
                usize::from(width),
            )
        })
        .collect::<Vec<_>>();
    Text::from(lines)
}

/// Renders `src` for a pane `width` columns wide.
///
/// # Errors
///
/// [`MarkdownError::ZeroWidth`] for a zero width, [`MarkdownError::NoOutput`]
/// when non-blank input yields no lines.
pub fn try_render_markdown(
    src: &str,
    width: u16,
    theme: &Theme,
) -> Result<Text<'static>, MarkdownError> {
    if width == 0 {
        return Err(MarkdownError::ZeroWidth);
    }
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    let mut renderer = Renderer::new(theme, usize::from(width));
    for event in Parser::new_ext(src, options) {
        renderer.handle(event);
    }
    let lines = renderer.finish();
    if lines.is_empty() && !src.trim().is_empty() {
        return Err(MarkdownError::NoOutput);
    }
    Ok(Text::from(lines))
}

/// One open list. `next` is `None` for bullet lists.
struct ListLevel {
    next: Option<u64>,
    /// Column where this level's markers start.
    base: usize,
    /// Column where item text starts.
    indent: usize,
}

struct CodeBlock {
    lang: Option<String>,
    buf: String,
}

struct Renderer<'t> {
    theme: &'t Theme,
    width: usize,
    lines: Vec<Line<'static>>,
    /// Inline spans of the logical line being built.
    current: Vec<Span<'static>>,
    styles: Vec<Style>,
    lists: Vec<ListLevel>,
    /// Marker for the first line of the current list item.
    pending_marker: Option<Span<'static>>,
    quote_depth: usize,
    code: Option<CodeBlock>,
    link: Option<(String, String)>,
    needs_blank: bool,
}

impl<'t> Renderer<'t> {
    fn new(theme: &'t Theme, width: usize) -> Self {
        Self {
            theme,
            width,
            lines: Vec::new(),
            current: Vec::new(),
            styles: Vec::new(),
            lists: Vec::new(),
            pending_marker: None,
            quote_depth: 0,
            code: None,
            link: None,
            needs_blank: false,
        }
    }

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => {
                let style = self.style().patch(Style::default().fg(self.theme.md_code_inline));
                self.current.push(Span::styled(code.into_string(), style));
            }
            Event::Html(html) | Event::InlineHtml(html) => self.text(&html),
            Event::SoftBreak => self.text(" "),
            Event::HardBreak => self.flush(),
            Event::Rule => {
                self.flush();
                self.blank_if_needed();
                let rule = "─".repeat(self.width.saturating_sub(self.quote_depth * 2));
                let mut spans = self.quote_prefix();
                spans.push(Span::styled(rule, Style::default().fg(self.theme.md_rule)));
                self.lines.push(Line::from(spans));
                self.needs_blank = true;
            }
            Event::TaskListMarker(checked) => {
                let mark = if checked { "[x] " } else { "[ ] " };
                self.current.push(Span::styled(mark, Style::default().fg(self.theme.md_list_marker)));
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                if self.lists.is_empty() {
                    self.blank_if_needed();
                }
            }
            Tag::Heading { level, .. } => {
                self.flush();
                self.blank_if_needed();
                let mut style = Style::default()
                    .fg(self.theme.md_heading)
                    .add_modifier(Modifier::BOLD);
                if level == HeadingLevel::H1 {
                    style = style.add_modifier(Modifier::UNDERLINED);
                }
                self.styles.push(style);
                let hashes = "#".repeat(level as usize);
                self.current.push(Span::styled(format!("{hashes} "), style));
            }
            Tag::BlockQuote { .. } => {
                self.flush();
                if self.quote_depth == 0 {
                    self.blank_if_needed();
                }
                self.quote_depth += 1;
            }
            Tag::CodeBlock(kind) => {
                self.flush();
                self.blank_if_needed();
                let lang = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(str::to_owned),
                    CodeBlockKind::Indented => None,
                };
                self.code = Some(CodeBlock {
                    lang,
                    buf: String::new(),
                });
            }
            Tag::List(start) => {
                self.flush();
                if self.lists.is_empty() {
                    self.blank_if_needed();
                }
                let base = self.lists.last().map_or(0, |l| l.indent);
                self.lists.push(ListLevel {
                    next: start,
                    base,
                    indent: base,
                });
            }
            Tag::Item => {
                self.flush();
                let Some(level) = self.lists.last_mut() else {
                    return;
                };
                let outer = level.base;
                let marker = match level.next.as_mut() {
                    Some(n) => {
                        let m = format!("{n}. ");
                        *n += 1;
                        m
                    }
                    None => BULLET.to_owned(),
                };
                level.indent = outer + UnicodeWidthStr::width(marker.as_str());
                let text = format!("{}{marker}", " ".repeat(outer));
                self.pending_marker =
                    Some(Span::styled(text, Style::default().fg(self.theme.md_list_marker)));
            }
            Tag::Emphasis => self.push_modifier(Modifier::ITALIC),
            Tag::Strong => self.push_modifier(Modifier::BOLD),
            Tag::Strikethrough => self.push_modifier(Modifier::CROSSED_OUT),
            Tag::Link { dest_url, .. } => {
                self.styles.push(
                    Style::default()
                        .fg(self.theme.md_link)
                        .add_modifier(Modifier::UNDERLINED),
                );
                self.link = Some((dest_url.into_string(), String::new()));
            }
            Tag::TableRow | Tag::TableHead => self.flush(),
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                self.flush();
                self.needs_blank = true;
            }
            TagEnd::Heading(_) => {
                self.styles.pop();
                self.flush();
                self.needs_blank = true;
            }
            TagEnd::BlockQuote { .. } => {
                self.flush();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.needs_blank = true;
            }
            TagEnd::CodeBlock => {
                if let Some(block) = self.code.take() {
                    self.emit_code_block(&block);
                }
                self.needs_blank = true;
            }
            TagEnd::List(_) => {
                self.flush();
                self.lists.pop();
                if self.lists.is_empty() {
                    self.needs_blank = true;
                }
            }
            TagEnd::Item => {
                self.flush();
                // Tight lists have no paragraphs; keep items together.
                self.needs_blank = false;
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => {
                self.styles.pop();
            }
            TagEnd::Link => {
                self.styles.pop();
                if let Some((url, label)) = self.link.take() {
                    if !url.is_empty() && url != label {
                        self.current.push(Span::styled(
                            format!(" ({url})"),
                            Style::default().fg(self.theme.md_quote),
                        ));
                    }
                }
            }
            TagEnd::TableCell => {
                self.current
                    .push(Span::styled(" │ ", Style::default().fg(self.theme.md_rule)));
            }
            TagEnd::TableHead | TagEnd::TableRow => self.flush(),
            TagEnd::Table => {
                self.flush();
                self.needs_blank = true;
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if let Some(code) = self.code.as_mut() {
            code.buf.push_str(text);
            return;
        }
        if let Some((_, label)) = self.link.as_mut() {
            label.push_str(text);
        }
        let style = self.style();
        match self.current.last_mut() {
            Some(last) if last.style == style => last.content.to_mut().push_str(text),
            _ => self.current.push(Span::styled(text.to_owned(), style)),
        }
    }

    fn style(&self) -> Style {
        self.styles
            .iter()
            .fold(Style::default(), |acc, s| acc.patch(*s))
    }

    fn push_modifier(&mut self, modifier: Modifier) {
        self.styles.push(Style::default().add_modifier(modifier));
    }

    fn blank_if_needed(&mut self) {
        if self.needs_blank && !self.lines.is_empty() {
            self.lines.push(Line::default());
        }
        self.needs_blank = false;
    }

    fn quote_prefix(&self) -> Vec<Span<'static>> {
        if self.quote_depth == 0 {
            return Vec::new();
        }
        vec![Span::styled(
            QUOTE_BAR.repeat(self.quote_depth),
            Style::default().fg(self.theme.md_quote),
        )]
    }

    /// Wraps the pending logical line into output lines.
    fn flush(&mut self) {
        let marker = self.pending_marker.take();
        if self.current.is_empty() && marker.is_none() {
            return;
        }
        let spans = std::mem::take(&mut self.current);

        let quote = self.quote_prefix();
        let indent = self.lists.last().map_or(0, |l| l.indent);
        let mut first = quote.clone();
        match marker {
            Some(m) => first.push(m),
            None if indent > 0 => first.push(Span::raw(" ".repeat(indent))),
            None => {}
        }
        let mut rest = quote;
        if indent > 0 {
            rest.push(Span::raw(" ".repeat(indent)));
        }

        let quoted = self.quote_depth > 0;
        let mut lines = wrap_spans(spans, first, rest, self.width);
        if quoted {
            for line in &mut lines {
                for span in line.spans.iter_mut().skip(1) {
                    if span.style.fg.is_none() {
                        span.style = span.style.fg(self.theme.md_quote);
                    }
                }
            }
        }
        self.lines.extend(lines);
    }

    fn emit_code_block(&mut self, block: &CodeBlock) {
        let prefix = {
            let mut p = self.quote_prefix();
            let indent = self.lists.last().map_or(0, |l| l.indent);
            p.push(Span::raw(format!("{}{CODE_INDENT}", " ".repeat(indent))));
            p
        };
        for spans in highlight_code(&block.buf, block.lang.as_deref(), self.theme) {
            let mut wrapper = Wrapper::new(prefix.clone(), prefix.clone(), self.width);
            for span in spans {
                wrapper.push_chars(&span.content, span.style);
            }
            self.lines.extend(wrapper.finish());
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        if let Some(block) = self.code.take() {
            self.emit_code_block(&block);
        }
        self.flush();
        self.lines
    }
}

/// Word-wraps `spans` to `width`. The first output line starts with `first`,
/// continuation lines with `rest`. Words wider than a line are split by char.
fn wrap_spans(
    spans: Vec<Span<'static>>,
    first: Vec<Span<'static>>,
    rest: Vec<Span<'static>>,
    width: usize,
) -> Vec<Line<'static>> {
    let mut wrapper = Wrapper::new(first, rest, width);
    for span in spans {
        for word in span.content.split_inclusive(char::is_whitespace) {
            wrapper.push_word(word, span.style);
        }
    }
    wrapper.finish()
}

struct Wrapper {
    width: usize,
    rest: Vec<Span<'static>>,
    rest_width: usize,
    out: Vec<Line<'static>>,
    line: Vec<Span<'static>>,
    /// Number of prefix spans at the start of `line`.
    prefix_len: usize,
    used: usize,
}

impl Wrapper {
    fn new(first: Vec<Span<'static>>, rest: Vec<Span<'static>>, width: usize) -> Self {
        Self {
            width,
            rest_width: spans_width(&rest),
            rest,
            out: Vec::new(),
            prefix_len: first.len(),
            used: spans_width(&first),
            line: first,
        }
    }

    /// No text on `line` yet, only the prefix.
    fn fresh(&self) -> bool {
        self.line.len() == self.prefix_len
    }

    fn push_word(&mut self, word: &str, style: Style) {
        let width = self.width;
        let fits = |used: usize, w: &str| used + UnicodeWidthStr::width(w.trim_end()) <= width;
        if fits(self.used, word) {
            return self.append(word, style);
        }
        if self.fresh() {
            return self.split_word(word, style);
        }
        self.break_line();
        let word = word.trim_start();
        if word.is_empty() {
            return;
        }
        if fits(self.used, word) {
            self.append(word, style);
        } else {
            self.split_word(word, style);
        }
    }

    fn split_word(&mut self, word: &str, style: Style) {
        let mut buf = [0u8; 4];
        for ch in word.chars() {
            let w = UnicodeWidthChar::width(ch).unwrap_or(0);
            if self.used + w > self.width && !self.fresh() {
                if ch.is_whitespace() {
                    continue;
                }
                self.break_line();
            }
            self.append(ch.encode_utf8(&mut buf), style);
        }
    }

    /// Appends `text` breaking at any character, whitespace included.
    fn push_chars(&mut self, text: &str, style: Style) {
        let mut buf = [0u8; 4];
        for ch in text.chars() {
            let w = UnicodeWidthChar::width(ch).unwrap_or(0);
            if self.used + w > self.width && !self.fresh() {
                self.break_line();
            }
            self.append(ch.encode_utf8(&mut buf), style);
        }
    }

    fn append(&mut self, text: &str, style: Style) {
        self.used += UnicodeWidthStr::width(text);
        let mergeable = !self.fresh();
        match self.line.last_mut() {
            Some(last) if mergeable && last.style == style => last.content.to_mut().push_str(text),
            _ => self.line.push(Span::styled(text.to_owned(), style)),
        }
    }

    fn break_line(&mut self) {
        let done = std::mem::replace(&mut self.line, self.rest.clone());
        self.out.push(trim_line_end(done));
        self.prefix_len = self.rest.len();
        self.used = self.rest_width;
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        let line = std::mem::take(&mut self.line);
        self.out.push(trim_line_end(line));
        self.out
    }
}

fn spans_width(spans: &[Span<'_>]) -> usize {
    spans.iter().map(|s| UnicodeWidthStr::width(s.content.as_ref())).sum()
}

fn trim_line_end(mut spans: Vec<Span<'static>>) -> Line<'static> {
    if let Some(last) = spans.last_mut() {
        let trimmed = last.content.trim_end().len();
        last.content.to_mut().truncate(trimmed);
    }
    Line::from(spans)
}

/// Highlights a code block, one span list per source line.
///
/// Unknown languages and themes fall back to a single plain style.
fn highlight_code(code: &str, lang: Option<&str>, theme: &Theme) -> Vec<Vec<Span<'static>>> {
    let plain = Style::default().fg(theme.md_code_inline);
    let syntax = lang
        .and_then(|l| SYNTAXES.find_syntax_by_token(l))
        .unwrap_or_else(|| SYNTAXES.find_syntax_plain_text());
    let Some(code_theme) = CODE_THEMES.themes.get(theme.code_theme) else {
        return code
            .lines()
            .map(|l| vec![Span::styled(l.to_owned(), plain)])
            .collect();
    };

    let mut highlighter = HighlightLines::new(syntax, code_theme);
    LinesWithEndings::from(code)
        .map(|line| match highlighter.highlight_line(line, &SYNTAXES) {
            Ok(ranges) => ranges
                .into_iter()
                .map(|(style, text)| syntect_to_span(style, text.trim_end_matches(['\n', '\r'])))
                .filter(|span| !span.content.is_empty())
                .collect(),
            Err(_) => vec![Span::styled(line.trim_end().to_owned(), plain)],
        })
        .collect()
}

/// Converts a syntect style to an owned ratatui span, foreground only.
fn syntect_to_span(style: syntect::highlighting::Style, content: &str) -> Span<'static> {
    let fg = style.foreground;
    let mut out = Style::default();
    if fg.a > 0 {
        out = out.fg(Color::Rgb(fg.r, fg.g, fg.b));
    }
    if style.font_style.contains(FontStyle::BOLD) {
        out = out.add_modifier(Modifier::BOLD);
    }
    if style.font_style.contains(FontStyle::ITALIC) {
        out = out.add_modifier(Modifier::ITALIC);
    }
    if style.font_style.contains(FontStyle::UNDERLINE) {
        out = out.add_modifier(Modifier::UNDERLINED);
    }
    Span::styled(content.to_owned(), out)
}
