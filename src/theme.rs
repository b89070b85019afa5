//! Colours: the seven piece colours plus board and panel, optionally from a theme file.

use crate::piece::BlockColor;
use ratatui::style::Color;
use std::path::Path;
use thiserror::Error;

/// Piece keys in palette order (see [`BlockColor::index`]).
const PIECE_KEYS: [&str; 7] = ["i", "o", "t", "l", "j", "s", "z"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    /// Indexed by [`BlockColor::index`].
    pub pieces: [Color; 7],
    /// Empty board cells.
    pub background: Color,
    /// Grid dots on empty cells.
    pub grid: Color,
    /// Score panel fill.
    pub panel: Color,
    /// Next-shape preview fill.
    pub preview: Color,
    /// Panel labels.
    pub text: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex colour for {key}: {value}")]
    InvalidHex { key: String, value: String },
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}

impl Theme {
    /// Saturated primaries on black, with the grey/red side panel.
    pub fn classic() -> Self {
        Self {
            pieces: [
                Color::Rgb(0, 255, 255),   // I cyan
                Color::Rgb(255, 255, 0),   // O yellow
                Color::Rgb(255, 0, 255),   // T magenta
                Color::Rgb(255, 165, 0),   // L orange
                Color::Rgb(0, 0, 255),     // J blue
                Color::Rgb(0, 255, 0),     // S green
                Color::Rgb(255, 0, 0),     // Z red
            ],
            background: Color::Rgb(0, 0, 0),
            grid: Color::Rgb(255, 255, 255),
            panel: Color::Rgb(241, 243, 237),
            preview: Color::Rgb(138, 137, 136),
            text: Color::Rgb(220, 46, 41),
        }
    }

    /// Load overrides from `path`; `None` gives the classic theme.
    pub fn load(path: Option<&Path>) -> Result<Self, ThemeError> {
        let mut theme = Self::classic();
        if let Some(path) = path {
            theme.apply(&std::fs::read_to_string(path)?)?;
        }
        Ok(theme)
    }

    /// Apply `theme[key]="#hex"` lines on top of the current colours.
    fn apply(&mut self, source: &str) -> Result<(), ThemeError> {
        for (key, value) in parse_theme_entries(source) {
            let color = parse_hex(value).ok_or_else(|| ThemeError::InvalidHex {
                key: key.to_string(),
                value: value.to_string(),
            })?;
            let slot = match key {
                "background" => &mut self.background,
                "grid" => &mut self.grid,
                "panel" => &mut self.panel,
                "preview" => &mut self.preview,
                "text" => &mut self.text,
                piece => match PIECE_KEYS.iter().position(|k| *k == piece) {
                    Some(i) => &mut self.pieces[i],
                    None => continue,
                },
            };
            *slot = color;
        }
        Ok(())
    }

    #[inline]
    pub fn block(&self, color: BlockColor) -> Color {
        self.pieces[color.index()]
    }
}

/// `(key, value)` pairs from `theme[key]="value"` lines; comments and junk are skipped.
fn parse_theme_entries(source: &str) -> impl Iterator<Item = (&str, &str)> {
    source.lines().filter_map(|line| {
        let line = line.trim();
        if line.starts_with('#') {
            return None;
        }
        let rest = line.strip_prefix("theme[")?;
        let (key, rest) = rest.split_once(']')?;
        let value = rest.trim().strip_prefix('=')?.trim();
        let value = value.trim_matches('"').trim_matches('\'').trim();
        (!value.is_empty()).then(|| (key.trim(), value))
    })
}

/// Parse `#RRGGBB` or `#RGB`.
pub fn parse_hex(s: &str) -> Option<Color> {
    let s = s.trim().trim_start_matches('#');
    if !s.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&s[range], 16).ok();
    match s.len() {
        6 => Some(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
        3 => Some(Color::Rgb(
            channel(0..1)? * 17,
            channel(1..2)? * 17,
            channel(2..3)? * 17,
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_hex_long_and_short() {
        assert_eq!(parse_hex("#DC2E29"), Some(Color::Rgb(0xDC, 0x2E, 0x29)));
        assert_eq!(parse_hex("#FFF"), Some(Color::Rgb(255, 255, 255)));
        assert_eq!(parse_hex("#12"), None);
        assert_eq!(parse_hex("#GG0000"), None);
    }

    #[test]
    fn test_entries_skip_comments_and_junk() {
        let src = "# comment\n\ntheme[o]=\"#FFD500\"\nnot a theme line\ntheme[grid] = '#333'\n";
        let entries: Vec<_> = parse_theme_entries(src).collect();
        assert_eq!(entries, vec![("o", "#FFD500"), ("grid", "#333")]);
    }

    #[test]
    fn test_overrides_apply_by_key() {
        let mut theme = Theme::classic();
        theme
            .apply("theme[z]=\"#800000\"\ntheme[background]=\"#101010\"\ntheme[unknown]=\"#fff\"")
            .unwrap();
        assert_eq!(theme.block(BlockColor::Red), Color::Rgb(0x80, 0, 0));
        assert_eq!(theme.background, Color::Rgb(0x10, 0x10, 0x10));
        assert_eq!(theme.block(BlockColor::Cyan), Color::Rgb(0, 255, 255));
    }

    #[test]
    fn test_bad_hex_is_an_error() {
        let mut theme = Theme::classic();
        let err = theme.apply("theme[i]=\"#nothex\"").unwrap_err();
        assert!(matches!(err, ThemeError::InvalidHex { ref key, .. } if key == "i"));
    }

    #[test]
    fn test_load_from_file() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "theme[text]=\"#00FF00\"\n").unwrap();
        let theme = Theme::load(Some(file.path())).unwrap();
        assert_eq!(theme.text, Color::Rgb(0, 255, 0));
        assert_eq!(Theme::load(None).unwrap(), Theme::classic());
    }
}
