use ratatui::style::{Color, Modifier, Style as RatStyle};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::grid::{Cell, CellKind, Region};
use crate::mode::Mode;

/// Color that can be serialized/deserialized
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ThemeColor {
    /// Named color: "red", "blue", "cyan", etc.
    Named(NamedColor),
    /// RGB color: [255, 128, 0]
    Rgb([u8; 3]),
    /// 256-color index: 42
    Indexed(u8),
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamedColor {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    Gray,
    DarkGray,
    LightRed,
    LightGreen,
    LightYellow,
    LightBlue,
    LightMagenta,
    LightCyan,
    White,
    Reset,
}

impl From<NamedColor> for Color {
    fn from(n: NamedColor) -> Color {
        match n {
            NamedColor::Black => Color::Black,
            NamedColor::Red => Color::Red,
            NamedColor::Green => Color::Green,
            NamedColor::Yellow => Color::Yellow,
            NamedColor::Blue => Color::Blue,
            NamedColor::Magenta => Color::Magenta,
            NamedColor::Cyan => Color::Cyan,
            NamedColor::Gray => Color::Gray,
            NamedColor::DarkGray => Color::DarkGray,
            NamedColor::LightRed => Color::LightRed,
            NamedColor::LightGreen => Color::LightGreen,
            NamedColor::LightYellow => Color::LightYellow,
            NamedColor::LightBlue => Color::LightBlue,
            NamedColor::LightMagenta => Color::LightMagenta,
            NamedColor::LightCyan => Color::LightCyan,
            NamedColor::White => Color::White,
            NamedColor::Reset => Color::Reset,
        }
    }
}

impl From<ThemeColor> for Color {
    fn from(tc: ThemeColor) -> Color {
        match tc {
            ThemeColor::Named(n) => n.into(),
            ThemeColor::Rgb([r, g, b]) => Color::Rgb(r, g, b),
            ThemeColor::Indexed(i) => Color::Indexed(i),
        }
    }
}

/// Style definition for a single element
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fg: Option<ThemeColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bg: Option<ThemeColor>,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
}

impl ElementStyle {
    pub fn fg(color: impl Into<ThemeColor>) -> Self {
        Self { fg: Some(color.into()), ..Default::default() }
    }

    pub fn with_bg(mut self, color: impl Into<ThemeColor>) -> Self {
        self.bg = Some(color.into());
        self
    }

    pub fn with_bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn with_italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn with_underline(mut self) -> Self {
        self.underline = true;
        self
    }

    pub fn to_ratatui(&self) -> RatStyle {
        let mut style = RatStyle::default();
        if let Some(fg) = self.fg {
            style = style.fg(fg.into());
        }
        if let Some(bg) = self.bg {
            style = style.bg(bg.into());
        }
        if self.bold {
            style = style.add_modifier(Modifier::BOLD);
        }
        if self.italic {
            style = style.add_modifier(Modifier::ITALIC);
        }
        if self.underline {
            style = style.add_modifier(Modifier::UNDERLINED);
        }
        style
    }
}

impl From<NamedColor> for ThemeColor {
    fn from(n: NamedColor) -> Self {
        ThemeColor::Named(n)
    }
}

/// Complete theme configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,

    #[serde(default)]
    pub background: Option<ThemeColor>,
    pub title: ElementStyle,

    // Cells by kind
    pub label: ElementStyle,
    pub input: ElementStyle,
    pub computed: ElementStyle,

    // Rows by region, layered under the cell style
    pub header: ElementStyle,
    pub total: ElementStyle,
    pub weekly: ElementStyle,
    pub quarterly: ElementStyle,

    // Interaction flags, layered on top
    pub selected: ElementStyle,
    pub editing: ElementStyle,
    pub copied: ElementStyle,

    // Status bar
    pub status_bar: ElementStyle,
    pub status_mode_browse: ElementStyle,
    pub status_mode_edit: ElementStyle,

    pub message_info: ElementStyle,
    pub message_error: ElementStyle,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    pub fn dark() -> Self {
        use NamedColor::*;
        Self {
            name: "dark".to_string(),
            background: Some(Black.into()),
            title: ElementStyle::fg(LightCyan).with_bold(),
            label: ElementStyle::fg(Gray),
            input: ElementStyle::fg(White),
            computed: ElementStyle::fg(LightGreen),
            header: ElementStyle::fg(LightCyan).with_bg(ThemeColor::Indexed(236)).with_bold(),
            total: ElementStyle::fg(LightYellow).with_bg(ThemeColor::Indexed(235)).with_bold(),
            weekly: ElementStyle::fg(LightBlue).with_bg(ThemeColor::Indexed(234)),
            quarterly: ElementStyle::fg(LightMagenta).with_bg(ThemeColor::Indexed(234)),
            selected: ElementStyle::fg(Black).with_bg(LightCyan),
            editing: ElementStyle::fg(Black).with_bg(LightYellow).with_bold(),
            copied: ElementStyle::fg(White).with_bg(Blue).with_underline(),
            status_bar: ElementStyle::fg(White).with_bg(DarkGray),
            status_mode_browse: ElementStyle::fg(Black).with_bg(LightBlue).with_bold(),
            status_mode_edit: ElementStyle::fg(Black).with_bg(LightGreen).with_bold(),
            message_info: ElementStyle::fg(White),
            message_error: ElementStyle::fg(LightRed).with_bold(),
        }
    }

    pub fn light() -> Self {
        use NamedColor::*;
        Self {
            name: "light".to_string(),
            background: None,
            title: ElementStyle::fg(Blue).with_bold(),
            label: ElementStyle::fg(DarkGray),
            input: ElementStyle::fg(Black),
            computed: ElementStyle::fg(Green),
            header: ElementStyle::fg(White).with_bg(DarkGray).with_bold(),
            total: ElementStyle::fg(Black).with_bg(ThemeColor::Indexed(252)).with_bold(),
            weekly: ElementStyle::fg(Blue).with_bg(ThemeColor::Indexed(254)),
            quarterly: ElementStyle::fg(Magenta).with_bg(ThemeColor::Indexed(254)),
            selected: ElementStyle::fg(Black).with_bg(LightCyan),
            editing: ElementStyle::fg(White).with_bg(Blue).with_bold(),
            copied: ElementStyle::fg(Black).with_bg(LightYellow).with_underline(),
            status_bar: ElementStyle::fg(Black).with_bg(Gray),
            status_mode_browse: ElementStyle::fg(White).with_bg(Blue).with_bold(),
            status_mode_edit: ElementStyle::fg(White).with_bg(Green).with_bold(),
            message_info: ElementStyle::fg(Black),
            message_error: ElementStyle::fg(Red).with_bold(),
        }
    }

    pub fn solarized_dark() -> Self {
        let base03 = ThemeColor::Rgb([0, 43, 54]);
        let base02 = ThemeColor::Rgb([7, 54, 66]);
        let base01 = ThemeColor::Rgb([88, 110, 117]);
        let base0 = ThemeColor::Rgb([131, 148, 150]);
        let base1 = ThemeColor::Rgb([147, 161, 161]);
        let yellow = ThemeColor::Rgb([181, 137, 0]);
        let red = ThemeColor::Rgb([220, 50, 47]);
        let magenta = ThemeColor::Rgb([211, 54, 130]);
        let blue = ThemeColor::Rgb([38, 139, 210]);
        let cyan = ThemeColor::Rgb([42, 161, 152]);
        let green = ThemeColor::Rgb([133, 153, 0]);

        Self {
            name: "solarized-dark".to_string(),
            background: Some(base03),
            title: ElementStyle::fg(cyan).with_bold(),
            label: ElementStyle::fg(base01),
            input: ElementStyle::fg(base1),
            computed: ElementStyle::fg(green),
            header: ElementStyle::fg(cyan).with_bg(base02).with_bold(),
            total: ElementStyle::fg(yellow).with_bg(base02).with_bold(),
            weekly: ElementStyle::fg(blue).with_bg(base02),
            quarterly: ElementStyle::fg(magenta).with_bg(base02),
            selected: ElementStyle::fg(base03).with_bg(cyan),
            editing: ElementStyle::fg(base03).with_bg(yellow).with_bold(),
            copied: ElementStyle::fg(base03).with_bg(blue).with_underline(),
            status_bar: ElementStyle::fg(base1).with_bg(base02),
            status_mode_browse: ElementStyle::fg(base03).with_bg(blue).with_bold(),
            status_mode_edit: ElementStyle::fg(base03).with_bg(green).with_bold(),
            message_info: ElementStyle::fg(base0),
            message_error: ElementStyle::fg(red).with_bold(),
        }
    }

    /// Load theme from TOML file
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read theme file: {}", e))?;
        toml::from_str(&content)
            .map_err(|e| format!("Failed to parse theme file: {}", e))
    }

    /// Built-in theme by name, or a TOML theme file
    pub fn load(name_or_path: &str) -> Result<Self, String> {
        match Self::by_name(name_or_path) {
            Some(theme) => Ok(theme),
            None => Self::from_file(Path::new(name_or_path)),
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "dark" => Some(Self::dark()),
            "light" => Some(Self::light()),
            "solarized" | "solarized-dark" => Some(Self::solarized_dark()),
            _ => None,
        }
    }

    pub fn builtin_names() -> &'static [&'static str] {
        &["dark", "light", "solarized-dark"]
    }
}

/// Runtime style manager
pub struct Style {
    pub theme: Theme,
}

impl Style {
    pub fn with_theme(theme: Theme) -> Self {
        Self { theme }
    }

    pub fn background(&self) -> Option<Color> {
        self.theme.background.map(|c| c.into())
    }

    pub fn title(&self) -> RatStyle {
        self.theme.title.to_ratatui()
    }

    fn region(&self, region: Region) -> RatStyle {
        match region {
            Region::Header => self.theme.header.to_ratatui(),
            Region::Total => self.theme.total.to_ratatui(),
            Region::Weekly => self.theme.weekly.to_ratatui(),
            Region::Quarterly => self.theme.quarterly.to_ratatui(),
            Region::Body | Region::Other => RatStyle::default(),
        }
    }

    /// Cell kind over region background, interaction flags on top
    pub fn cell(&self, cell: &Cell) -> RatStyle {
        let kind = match cell.kind {
            CellKind::Label => &self.theme.label,
            CellKind::Input { .. } => &self.theme.input,
            CellKind::Computed { .. } => &self.theme.computed,
        };
        let mut style = kind.to_ratatui().patch(self.region(cell.region));
        if cell.flags.copied {
            style = style.patch(self.theme.copied.to_ratatui());
        }
        if cell.flags.selected {
            style = style.patch(self.theme.selected.to_ratatui());
        }
        if cell.flags.editing {
            style = style.patch(self.theme.editing.to_ratatui());
        }
        style
    }

    pub fn status_bar(&self) -> RatStyle {
        self.theme.status_bar.to_ratatui()
    }

    pub fn status_mode(&self, mode: Mode) -> RatStyle {
        match mode {
            Mode::Editing => self.theme.status_mode_edit.to_ratatui(),
            Mode::Browsing | Mode::ExitingEdit => self.theme.status_mode_browse.to_ratatui(),
        }
    }

    pub fn message_info(&self) -> RatStyle {
        self.theme.message_info.to_ratatui()
    }

    pub fn message_error(&self) -> RatStyle {
        self.theme.message_error.to_ratatui()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::CellFlags;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_themes_resolve() {
        for name in Theme::builtin_names() {
            assert_eq!(Theme::by_name(name).unwrap().name, *name);
        }
        assert_eq!(Theme::by_name("Solarized").unwrap().name, "solarized-dark");
        assert!(Theme::by_name("neon").is_none());
    }

    #[test]
    fn test_theme_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mine.toml");
        let mut theme = Theme::light();
        theme.name = "mine".to_string();
        std::fs::write(&path, toml::to_string(&theme).unwrap()).unwrap();

        let loaded = Theme::load(path.to_str().unwrap()).unwrap();
        assert_eq!(loaded, theme);
        assert!(Theme::load("/nonexistent/theme.toml").is_err());
    }

    #[test]
    fn test_flags_layer_over_region() {
        let style = Style::with_theme(Theme::dark());
        let mut cell = Cell::computed("CPM");
        cell.region = Region::Total;
        let base = style.cell(&cell);
        assert_eq!(base.bg, Some(Color::Indexed(235)));

        cell.flags = CellFlags { selected: true, ..Default::default() };
        assert_eq!(style.cell(&cell).bg, Some(Color::LightCyan));

        cell.flags.editing = true;
        assert_eq!(style.cell(&cell).bg, Some(Color::LightYellow));
    }
}
