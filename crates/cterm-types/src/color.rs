//! Named display colors and console themes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TermError;

/// Foreground color for printed text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    #[default]
    White,
    Red,
    Green,
    Blue,
    Yellow,
    Orange,
}

impl Color {
    pub const ALL: [Color; 6] = [
        Color::White,
        Color::Red,
        Color::Green,
        Color::Blue,
        Color::Yellow,
        Color::Orange,
    ];

    /// Lowercase name, as accepted by `COLOR`.
    pub fn name(self) -> &'static str {
        match self {
            Self::White => "white",
            Self::Red => "red",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Yellow => "yellow",
            Self::Orange => "orange",
        }
    }

    /// 256-color ANSI foreground index.
    pub fn ansi_index(self) -> u8 {
        match self {
            Self::White => 15,
            Self::Red => 9,
            Self::Green => 10,
            Self::Blue => 12,
            Self::Yellow => 11,
            Self::Orange => 208,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Color {
    type Err = TermError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.name() == lower)
            .ok_or_else(|| TermError::command("Invalid color selection."))
    }
}

/// Console palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Default,
    Blue,
    Green,
    Amber,
}

impl Theme {
    pub const ALL: [Theme; 4] = [Theme::Default, Theme::Blue, Theme::Green, Theme::Amber];

    pub fn name(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Amber => "amber",
        }
    }

    /// Text color the theme forces, if any.
    pub fn text_color(self) -> Option<Color> {
        match self {
            Self::Default => None,
            Self::Blue => Some(Color::Blue),
            Self::Green => Some(Color::Green),
            Self::Amber => Some(Color::Orange),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Theme {
    type Err = TermError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.name() == lower)
            .ok_or_else(|| {
                TermError::command(
                    "Invalid theme selection, available themes are: DEFAULT, BLUE, GREEN, and AMBER",
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_parse_is_case_insensitive() {
        assert_eq!("RED".parse::<Color>().unwrap(), Color::Red);
        assert_eq!("Orange".parse::<Color>().unwrap(), Color::Orange);
    }

    #[test]
    fn unknown_color_rejected() {
        let err = "purple".parse::<Color>().unwrap_err();
        assert_eq!(err.to_string(), "Invalid color selection.");
    }

    #[test]
    fn theme_parse() {
        assert_eq!("amber".parse::<Theme>().unwrap(), Theme::Amber);
        assert!("neon".parse::<Theme>().is_err());
    }

    #[test]
    fn theme_text_color() {
        assert_eq!(Theme::Default.text_color(), None);
        assert_eq!(Theme::Green.text_color(), Some(Color::Green));
    }

    #[test]
    fn serde_names_are_lowercase() {
        let json = serde_json::to_string(&Color::Yellow).unwrap();
        assert_eq!(json, "\"yellow\"");
        let theme: Theme = serde_json::from_str("\"blue\"").unwrap();
        assert_eq!(theme, Theme::Blue);
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn display_then_parse_is_identity(idx in 0usize..6) {
                let c = Color::ALL[idx];
                prop_assert_eq!(c.to_string().to_uppercase().parse::<Color>().unwrap(), c);
            }
        }
    }
}
