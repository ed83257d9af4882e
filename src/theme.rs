//! Theme system

use ratatui::style::Color;

/// Complete color palette for TUI rendering
#[derive(Debug, Clone, Copy)]
pub struct ThemeColors {
    // Backgrounds
    pub bg_primary: Color,
    pub bg_tertiary: Color,
    pub bg_highlight: Color,

    // Borders
    pub border_focus: Color,
    pub border_muted: Color,

    // Text
    pub text_primary: Color,
    pub text_secondary: Color,
    pub text_muted: Color,

    // Status
    pub success: Color,
    pub error: Color,
    pub info: Color,

    // Accents
    pub accent_blue: Color,
    pub accent_cyan: Color,
    pub accent_green: Color,
    pub accent_magenta: Color,
    pub accent_orange: Color,
    pub accent_yellow: Color,
}

impl ThemeColors {
    /// Default theme
    pub const DEFAULT: Self = Self {
        // Backgrounds
        bg_primary: Color::Rgb(22, 24, 38),
        bg_tertiary: Color::Rgb(32, 35, 52),
        bg_highlight: Color::Rgb(50, 54, 72),

        // Borders
        border_focus: Color::Rgb(120, 220, 170),
        border_muted: Color::Rgb(90, 95, 115),

        // Text
        text_primary: Color::Rgb(230, 233, 248),
        text_secondary: Color::Rgb(185, 190, 210),
        text_muted: Color::Rgb(140, 145, 168),

        // Status
        success: Color::Rgb(110, 220, 120),
        error: Color::Rgb(250, 120, 130),
        info: Color::Rgb(110, 200, 245),

        // Accents
        accent_blue: Color::Rgb(120, 170, 250),
        accent_cyan: Color::Rgb(100, 215, 235),
        accent_green: Color::Rgb(110, 210, 120),
        accent_magenta: Color::Rgb(210, 150, 235),
        accent_orange: Color::Rgb(245, 175, 100),
        accent_yellow: Color::Rgb(235, 195, 100),
    };

    /// Token input color
    #[inline]
    pub const fn token_input(&self) -> Color {
        Color::Rgb(120, 170, 250)
    }

    /// Token output color
    #[inline]
    pub const fn token_output(&self) -> Color {
        Color::Rgb(210, 150, 235)
    }

    /// Error counts are only highlighted when nonzero
    #[inline]
    pub const fn error_count(&self, count: u64) -> Color {
        if count > 0 {
            self.error
        } else {
            self.text_muted
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_background() {
        let colors = ThemeColors::DEFAULT;
        assert_eq!(colors.bg_primary, Color::Rgb(22, 24, 38));
    }

    #[test]
    fn test_token_colors_differ() {
        let colors = ThemeColors::DEFAULT;
        assert_ne!(colors.token_input(), colors.token_output());
    }

    #[test]
    fn test_error_count_color() {
        let colors = ThemeColors::DEFAULT;
        assert_eq!(colors.error_count(0), colors.text_muted);
        assert_eq!(colors.error_count(3), colors.error);
    }
}
