//! Target colors: hex parsing, presets and named targets

use crate::error::{RecolorError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// An opaque RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Self = Self::new(255, 255, 255);
    pub const BLACK: Self = Self::new(0, 0, 0);

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a 6-digit hex color, `rrggbb` or `#rrggbb`, case-insensitive
    ///
    /// # Examples
    /// ```rust
    /// use imgly_bgrecolor::Color;
    ///
    /// assert_eq!(Color::from_hex("#2196F3")?, Color::new(33, 150, 243));
    /// assert_eq!(Color::from_hex("2196f3")?, Color::new(33, 150, 243));
    /// assert!(Color::from_hex("zzzzzz").is_err());
    /// # Ok::<(), imgly_bgrecolor::RecolorError>(())
    /// ```
    pub fn from_hex(hex: &str) -> Result<Self> {
        let trimmed = hex.trim();
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);

        if digits.len() != 6 {
            return Err(RecolorError::invalid_color(format!(
                "'{}' (expected rrggbb or #rrggbb)",
                hex
            )));
        }

        // from_str_radix alone would accept a leading '+'
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(RecolorError::invalid_color(format!(
                "'{}' is not a hex color",
                hex
            )));
        }

        let channel = |range: std::ops::Range<usize>| -> Result<u8> {
            digits
                .get(range)
                .and_then(|group| u8::from_str_radix(group, 16).ok())
                .ok_or_else(|| {
                    RecolorError::invalid_color(format!("'{}' is not a hex color", hex))
                })
        };

        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// Lowercase `#rrggbb` form
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    #[must_use]
    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Color {
    type Err = RecolorError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl From<[u8; 3]> for Color {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::new(r, g, b)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Self::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

/// A target color as supplied by a caller, either already parsed or as hex text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorSpec {
    Color(Color),
    Hex(String),
}

impl ColorSpec {
    /// Resolve to a concrete color, failing on malformed hex
    pub fn resolve(&self) -> Result<Color> {
        match self {
            Self::Color(color) => Ok(*color),
            Self::Hex(hex) => Color::from_hex(hex),
        }
    }
}

impl From<Color> for ColorSpec {
    fn from(color: Color) -> Self {
        Self::Color(color)
    }
}

impl From<&str> for ColorSpec {
    fn from(hex: &str) -> Self {
        Self::Hex(hex.to_string())
    }
}

impl From<String> for ColorSpec {
    fn from(hex: String) -> Self {
        Self::Hex(hex)
    }
}

/// Standard ID photo background colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    White,
    Blue,
    Red,
}

impl Preset {
    pub const ALL: [Self; 3] = [Self::White, Self::Blue, Self::Red];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::White => "white",
            Self::Blue => "blue",
            Self::Red => "red",
        }
    }

    #[must_use]
    pub fn color(self) -> Color {
        match self {
            Self::White => Color::new(0xff, 0xff, 0xff),
            Self::Blue => Color::new(0x21, 0x96, 0xf3),
            Self::Red => Color::new(0xff, 0x00, 0x00),
        }
    }

    /// Look up a preset by name, case-insensitive
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|preset| preset.name().eq_ignore_ascii_case(name.trim()))
    }

    /// Find the preset whose color is exactly `color`
    #[must_use]
    pub fn matching(color: Color) -> Option<Self> {
        Self::ALL.into_iter().find(|preset| preset.color() == color)
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Name used for targets built from a bare hex color
pub const CUSTOM_TARGET_NAME: &str = "custom";

/// A named target color; the name keys results and output file names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorTarget {
    pub name: String,
    pub color: Color,
}

impl ColorTarget {
    /// Create a target, rejecting names that cannot be used in file names
    pub fn new<S: Into<String>>(name: S, color: Color) -> Result<Self> {
        let name = name.into();
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(RecolorError::invalid_color(format!(
                "target name '{}' must be non-empty and contain only [A-Za-z0-9_-]",
                name
            )));
        }
        Ok(Self { name, color })
    }

    #[must_use]
    pub fn preset(preset: Preset) -> Self {
        Self {
            name: preset.name().to_string(),
            color: preset.color(),
        }
    }

    #[must_use]
    pub fn custom(color: Color) -> Self {
        Self {
            name: CUSTOM_TARGET_NAME.to_string(),
            color,
        }
    }

    /// The three presets in display order
    #[must_use]
    pub fn presets() -> Vec<Self> {
        Preset::ALL.into_iter().map(Self::preset).collect()
    }

    /// Parse a user-supplied target: a preset name, a hex color, or `name=#rrggbb`
    ///
    /// # Examples
    /// ```rust
    /// use imgly_bgrecolor::{Color, ColorTarget};
    ///
    /// assert_eq!(ColorTarget::parse("Blue")?.color, Color::new(33, 150, 243));
    /// assert_eq!(ColorTarget::parse("#00ff00")?.name, "custom");
    /// assert_eq!(ColorTarget::parse("mint=#98ff98")?.name, "mint");
    /// # Ok::<(), imgly_bgrecolor::RecolorError>(())
    /// ```
    pub fn parse(spec: &str) -> Result<Self> {
        let spec = spec.trim();

        if let Some((name, hex)) = spec.split_once('=') {
            return Self::new(name.trim(), Color::from_hex(hex)?);
        }

        if let Some(preset) = Preset::from_name(spec) {
            return Ok(Self::preset(preset));
        }

        Color::from_hex(spec).map(Self::custom)
    }
}

impl fmt::Display for ColorTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_parsing() {
        let expected = Color::new(33, 150, 243);
        assert_eq!(Color::from_hex("2196F3").unwrap(), expected);
        assert_eq!(Color::from_hex("#2196f3").unwrap(), expected);
        assert_eq!(Color::from_hex("  #2196F3 ").unwrap(), expected);
        assert_eq!("#ffffff".parse::<Color>().unwrap(), Color::WHITE);
    }

    #[test]
    fn test_hex_parsing_failures() {
        for bad in ["zzzzzz", "#zzzzzz", "", "#", "fff", "#ff00ff00", "12345g", "+12345", "ééé"] {
            let err = Color::from_hex(bad).unwrap_err();
            assert!(
                matches!(err, RecolorError::InvalidColor(_)),
                "expected InvalidColor for {bad:?}"
            );
        }
    }

    #[test]
    fn test_hex_formatting() {
        assert_eq!(Color::new(33, 150, 243).to_hex(), "#2196f3");
        assert_eq!(Color::BLACK.to_string(), "#000000");
    }

    #[test]
    fn test_color_spec_resolution() {
        assert_eq!(
            ColorSpec::from("#ff0000").resolve().unwrap(),
            Color::new(255, 0, 0)
        );
        assert_eq!(
            ColorSpec::from(Color::WHITE).resolve().unwrap(),
            Color::WHITE
        );
        assert!(ColorSpec::from("nothex").resolve().is_err());
    }

    #[test]
    fn test_presets() {
        assert_eq!(Preset::White.color(), Color::WHITE);
        assert_eq!(Preset::Blue.color().to_hex(), "#2196f3");
        assert_eq!(Preset::Red.color().to_hex(), "#ff0000");
        assert_eq!(Preset::from_name("RED"), Some(Preset::Red));
        assert_eq!(Preset::from_name("green"), None);
        assert_eq!(Preset::matching(Color::new(33, 150, 243)), Some(Preset::Blue));

        let names: Vec<_> = ColorTarget::presets().into_iter().map(|t| t.name).collect();
        assert_eq!(names, ["white", "blue", "red"]);
    }

    #[test]
    fn test_target_parsing() {
        let target = ColorTarget::parse("white").unwrap();
        assert_eq!(target, ColorTarget::preset(Preset::White));

        let target = ColorTarget::parse("#123456").unwrap();
        assert_eq!(target.name, CUSTOM_TARGET_NAME);
        assert_eq!(target.color, Color::new(0x12, 0x34, 0x56));

        let target = ColorTarget::parse("navy = #000080").unwrap();
        assert_eq!(target.name, "navy");
        assert_eq!(target.color, Color::new(0, 0, 0x80));

        assert!(ColorTarget::parse("bad name=#000080").is_err());
        assert!(ColorTarget::parse("=#000080").is_err());
        assert!(ColorTarget::parse("navy=#00008").is_err());
        assert!(ColorTarget::parse("green").is_err());
    }

    #[test]
    fn test_color_serde() {
        let target = ColorTarget::preset(Preset::Blue);
        let json = serde_json::to_string(&target).unwrap();
        assert_eq!(json, r##"{"name":"blue","color":"#2196f3"}"##);

        let parsed: ColorTarget = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, target);

        assert!(serde_json::from_str::<Color>(r##""#12345z""##).is_err());
    }
}
