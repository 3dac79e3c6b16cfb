//! Color theme system for stagerev.
//!
//! A `Theme` holds named `ratatui::style::Color` fields covering every surface
//! stagerev draws. Two built-in themes are provided:
//!
//! - `dark` uses ANSI 16 colors so it works on any terminal, including
//!   256-color SSH sessions with no truecolor support.
//! - `catppuccin_mocha` uses the Catppuccin Mocha palette in RGB and needs truecolor.
//!
//! The theme is picked by the optional `theme` key of `~/.stagerev.yaml`.

use ratatui::style::Color;
use tracing::warn;

/// Theme used when the config has no `theme` key.
pub const DEFAULT_THEME: &str = "catppuccin-mocha";

/// All color values used across stagerev's UI surfaces.
#[derive(Debug, Clone)]
pub struct Theme {
    // Panel borders
    /// Border of the review pane (the pane that scrolls).
    pub border_active: Color,
    /// Border of the file list.
    pub border_inactive: Color,

    // Loading / error / empty views
    pub spinner: Color,
    /// Instructional and informational text.
    pub info_text: Color,
    pub error_heading: Color,
    pub error_text: Color,

    // File list
    pub file_normal: Color,
    pub file_selected_fg: Color,
    pub file_selected_bg: Color,

    // Markdown
    pub md_heading: Color,
    pub md_code_inline: Color,
    pub md_quote: Color,
    pub md_link: Color,
    pub md_list_marker: Color,
    pub md_rule: Color,
    /// syntect theme used for fenced code blocks.
    pub code_theme: &'static str,

    // Hint bar
    pub hint_bar_bg: Color,
    pub hint_bar_fg: Color,
    pub hint_key: Color,
}

impl Theme {
    /// Returns the built-in dark theme using ANSI 16 colors.
    pub fn dark() -> Self {
        Self {
            border_active: Color::Cyan,
            border_inactive: Color::DarkGray,

            spinner: Color::Magenta,
            info_text: Color::Gray,
            error_heading: Color::Red,
            error_text: Color::LightRed,

            file_normal: Color::Reset,
            file_selected_fg: Color::Black,
            file_selected_bg: Color::Cyan,

            md_heading: Color::Cyan,
            md_code_inline: Color::Yellow,
            md_quote: Color::DarkGray,
            md_link: Color::Blue,
            md_list_marker: Color::Cyan,
            md_rule: Color::DarkGray,
            code_theme: "base16-ocean.dark",

            hint_bar_bg: Color::DarkGray,
            hint_bar_fg: Color::White,
            hint_key: Color::Cyan,
        }
    }

    /// Returns the Catppuccin Mocha theme using RGB truecolor values.
    ///
    /// Palette source: <https://github.com/catppuccin/catppuccin> Mocha variant.
    pub fn catppuccin_mocha() -> Self {
        let green = Color::Rgb(166, 227, 161); // #a6e3a1
        let red = Color::Rgb(243, 139, 168); // #f38ba8
        let maroon = Color::Rgb(235, 160, 172); // #eba0ac
        let blue = Color::Rgb(137, 180, 250); // #89b4fa
        let mauve = Color::Rgb(203, 166, 247); // #cba6f7
        let peach = Color::Rgb(250, 179, 135); // #fab387
        let lavender = Color::Rgb(180, 190, 254); // #b4befe
        let overlay1 = Color::Rgb(127, 132, 156); // #7f849c
        let subtext0 = Color::Rgb(166, 173, 200); // #a6adc8
        let surface1 = Color::Rgb(69, 71, 90); // #45475a
        let base = Color::Rgb(30, 30, 46); // #1e1e2e
        let text = Color::Rgb(205, 214, 244); // #cdd6f4

        Self {
            border_active: lavender,
            border_inactive: overlay1,

            spinner: mauve,
            info_text: subtext0,
            error_heading: red,
            error_text: maroon,

            file_normal: text,
            file_selected_fg: base,
            file_selected_bg: lavender,

            md_heading: mauve,
            md_code_inline: peach,
            md_quote: overlay1,
            md_link: blue,
            md_list_marker: green,
            md_rule: surface1,
            code_theme: "base16-mocha.dark",

            hint_bar_bg: surface1,
            hint_bar_fg: text,
            hint_key: lavender,
        }
    }

    /// Resolves a theme name to the corresponding built-in theme.
    ///
    /// Unknown names fall back to `dark()` so a typo in config never prevents
    /// startup. The fallback is logged as a warning.
    pub fn from_name(name: &str) -> Self {
        match name.trim() {
            "catppuccin-mocha" | "catppuccin_mocha" => Self::catppuccin_mocha(),
            "dark" => Self::dark(),
            other => {
                warn!(theme = %other, "unknown theme, falling back to 'dark'");
                Self::dark()
            }
        }
    }

    /// Theme for an optional config value; `None` selects [`DEFAULT_THEME`].
    pub fn from_config(name: Option<&str>) -> Self {
        Self::from_name(name.unwrap_or(DEFAULT_THEME))
    }
}
