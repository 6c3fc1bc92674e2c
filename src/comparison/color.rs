use std::cmp::Ordering;

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Outcome of comparing an entry's size with its counterpart in the other tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    /// Larger than the counterpart
    #[display("red")]
    Red,
    /// Smaller than the counterpart
    #[display("green")]
    Green,
    /// No counterpart
    #[display("blue")]
    Blue,
    /// Same size as the counterpart
    #[display("yellow")]
    Yellow,
}

impl Color {
    pub fn classify(size: u64, counterpart: Option<u64>) -> Self {
        match counterpart.map(|other| size.cmp(&other)) {
            None => Color::Blue,
            Some(Ordering::Greater) => Color::Red,
            Some(Ordering::Less) => Color::Green,
            Some(Ordering::Equal) => Color::Yellow,
        }
    }
}

impl From<Color> for colored::Color {
    fn from(color: Color) -> Self {
        match color {
            Color::Red => colored::Color::Red,
            Color::Green => colored::Color::Green,
            Color::Blue => colored::Color::Blue,
            Color::Yellow => colored::Color::Yellow,
        }
    }
}
