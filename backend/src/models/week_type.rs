use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Rotation letter of a two-week bell timetable.
///
/// "Unknown" is never a variant: code that may fail to infer a rotation
/// works with `Option<WeekType>` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeekType {
    A,
    B,
}

impl WeekType {
    /// Rotation letter as a single character.
    pub fn letter(self) -> char {
        match self {
            WeekType::A => 'A',
            WeekType::B => 'B',
        }
    }

    /// Map a single character (any case) to a rotation letter.
    pub fn from_letter(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'A' => Some(WeekType::A),
            'B' => Some(WeekType::B),
            _ => None,
        }
    }

    /// Whether a period tagged with `tag` belongs to this rotation.
    ///
    /// The comparison ignores case. An empty tag is not a match; callers
    /// treat it as "applies to both weeks" before calling this.
    pub fn matches(self, tag: &str) -> bool {
        let mut chars = tag.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => c.eq_ignore_ascii_case(&self.letter()),
            _ => false,
        }
    }
}

impl fmt::Display for WeekType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl FromStr for WeekType {
    type Err = String;

    /// Parse a rotation letter, ignoring surrounding whitespace and case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A" => Ok(WeekType::A),
            "B" => Ok(WeekType::B),
            _ => Err(format!("Unknown week type: {}", s)),
        }
    }
}
