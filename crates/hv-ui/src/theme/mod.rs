use egui::{Color32, Context, FontFamily, FontId, Rounding, Stroke, Style, TextStyle, Visuals};
use std::collections::BTreeMap;
use hv_core::CellState;

/// Named palette colours
pub mod colors {
    use egui::Color32;

    pub const TURQUOISE_LIGHT: Color32 = Color32::from_rgb(0x6a, 0xc9, 0xcc);
    pub const TURQUOISE: Color32 = Color32::from_rgb(0x00, 0x91, 0x96);
    pub const TURQUOISE_DARK: Color32 = Color32::from_rgb(0x00, 0x63, 0x68);
    pub const WINE_LIGHT: Color32 = Color32::from_rgb(0xb5, 0x4c, 0x72);
    pub const WINE: Color32 = Color32::from_rgb(0x8c, 0x1f, 0x4a);
    pub const WINE_DARK: Color32 = Color32::from_rgb(0x5b, 0x00, 0x23);
    pub const EMERALD: Color32 = Color32::from_rgb(0x00, 0x98, 0x45);
    pub const RUBY: Color32 = Color32::from_rgb(0xcc, 0x33, 0x33);
    pub const AQUAMARINE: Color32 = Color32::from_rgb(0x4c, 0xc3, 0xc7);
    pub const TANZANITE: Color32 = Color32::from_rgb(0x4b, 0x4a, 0xa6);
    pub const SLATE: Color32 = Color32::from_rgb(0x59, 0x67, 0x74);
    pub const AMETHYST: Color32 = Color32::from_rgb(0x7b, 0x4b, 0xa6);
    pub const STONE: Color32 = Color32::from_rgb(0x8a, 0x85, 0x7d);
    pub const SAPPHIRE: Color32 = Color32::from_rgb(0x2d, 0x5f, 0xa6);
    pub const CORAL: Color32 = Color32::from_rgb(0xf0, 0x7d, 0x5a);
    pub const QLIK_GREEN: Color32 = Color32::from_rgb(0x00, 0x98, 0x45);
    pub const GREY_80: Color32 = Color32::from_rgb(0xcc, 0xcc, 0xcc);
    pub const GREY_100: Color32 = Color32::from_rgb(0xff, 0xff, 0xff);
}

/// A primary colour with its light and dark variants
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Swatch {
    pub light: Color32,
    pub main: Color32,
    pub dark: Color32,
}

impl Swatch {
    const fn flat(color: Color32) -> Self {
        Self { light: color, main: color, dark: color }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    pub primary: Swatch,
    pub secondary: Swatch,
    pub success: Swatch,
    pub error: Swatch,
    pub info: Swatch,
    /// Categorical series colours
    pub range: [Color32; 11],
    /// Fill of selected rows and marks
    pub selected: Color32,
    /// Fill of excluded rows and marks
    pub excluded: Color32,
    pub divider: Color32,
}

/// Theme configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub name: String,
    pub dark_mode: bool,
    pub palette: Palette,
}

impl Default for Theme {
    fn default() -> Self {
        Self::light()
    }
}

impl Theme {
    pub fn light() -> Self {
        use colors::*;
        Self {
            name: "Light".to_string(),
            dark_mode: false,
            palette: Palette {
                primary: Swatch { light: TURQUOISE_LIGHT, main: TURQUOISE, dark: TURQUOISE_DARK },
                secondary: Swatch { light: WINE_LIGHT, main: WINE, dark: WINE_DARK },
                success: Swatch::flat(EMERALD),
                error: Swatch::flat(RUBY),
                info: Swatch::flat(AQUAMARINE),
                range: [
                    TANZANITE, SLATE, TURQUOISE, AQUAMARINE, WINE, AMETHYST, STONE, SAPPHIRE,
                    EMERALD, RUBY, CORAL,
                ],
                selected: QLIK_GREEN,
                excluded: GREY_80,
                divider: GREY_80,
            },
        }
    }

    /// Series colour for index `i`, cycling through the range
    pub fn series_color(&self, i: usize) -> Color32 {
        self.palette.range[i % self.palette.range.len()]
    }

    /// Background and text colour of a list row in `state`
    pub fn state_colors(&self, state: CellState) -> Option<(Color32, Color32)> {
        if state.is_selected() {
            Some((self.palette.selected, Color32::WHITE))
        } else if state == CellState::Excluded {
            Some((self.palette.excluded, Color32::BLACK))
        } else {
            None
        }
    }
}

/// Apply the light theme to an egui context
pub fn apply_theme(ctx: &Context, theme: &Theme) {
    let mut style = Style::default();
    let mut visuals = if theme.dark_mode { Visuals::dark() } else { Visuals::light() };
    let palette = &theme.palette;
    let square = Rounding::same(0.0);

    visuals.widgets.noninteractive.bg_stroke = Stroke::new(1.0, palette.divider);
    visuals.widgets.noninteractive.rounding = square;
    visuals.widgets.inactive.rounding = square;
    visuals.widgets.hovered.rounding = Rounding::same(3.0);
    visuals.widgets.hovered.bg_stroke = Stroke::new(1.0, palette.primary.light);
    visuals.widgets.active.rounding = Rounding::same(3.0);
    visuals.widgets.active.bg_fill = palette.primary.main;
    visuals.widgets.active.bg_stroke = Stroke::new(1.0, palette.primary.dark);

    visuals.selection.bg_fill = palette.selected;
    visuals.selection.stroke = Stroke::new(1.0, Color32::WHITE);
    visuals.hyperlink_color = palette.primary.main;
    visuals.error_fg_color = palette.error.main;
    visuals.warn_fg_color = palette.secondary.main;
    visuals.window_rounding = square;
    visuals.menu_rounding = square;

    style.spacing.item_spacing = egui::vec2(8.0, 4.0);
    style.spacing.button_padding = egui::vec2(8.0, 4.0);
    style.spacing.menu_margin = egui::Margin::same(4.0);

    let mut font_sizes = BTreeMap::new();
    font_sizes.insert(TextStyle::Small, FontId::new(10.0, FontFamily::Proportional));
    font_sizes.insert(TextStyle::Body, FontId::new(12.0, FontFamily::Proportional));
    font_sizes.insert(TextStyle::Button, FontId::new(12.0, FontFamily::Proportional));
    font_sizes.insert(TextStyle::Heading, FontId::new(16.0, FontFamily::Proportional));
    font_sizes.insert(TextStyle::Monospace, FontId::new(12.0, FontFamily::Monospace));
    style.text_styles = font_sizes;

    ctx.set_style(style);
    ctx.set_visuals(visuals);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_light_palette() {
        let theme = Theme::default();
        assert_eq!(theme.name, "Light");
        assert!(!theme.dark_mode);
        assert_eq!(theme.palette.primary.main, colors::TURQUOISE);
        assert_eq!(theme.series_color(11), colors::TANZANITE);
    }

    #[test]
    fn test_state_colors() {
        let theme = Theme::light();
        assert_eq!(theme.state_colors(CellState::Selected), Some((colors::QLIK_GREEN, Color32::WHITE)));
        assert_eq!(theme.state_colors(CellState::Excluded), Some((colors::GREY_80, Color32::BLACK)));
        assert_eq!(theme.state_colors(CellState::Alternative), None);
        assert_eq!(theme.state_colors(CellState::Normal), None);
    }
}
