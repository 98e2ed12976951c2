use std::fmt;

use borsh::BorshSerialize;
use serde::{Deserialize, Serialize};

/// One of the five fixed complexity tiers of a topic.
///
/// Level 1 is a lay explanation, level 5 is expert/research depth.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, BorshSerialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Level(u8);

impl Level {
    /// The simplest tier.
    pub const MIN: Self = Self(1);

    /// The most technical tier.
    pub const MAX: Self = Self(5);

    /// Every level, in increasing order of complexity.
    pub const ALL: [Self; 5] = [Self(1), Self(2), Self(3), Self(4), Self(5)];

    /// Creates a level from its number.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidLevel`] if `n` is outside `1..=5`.
    pub const fn new(n: u8) -> Result<Self, InvalidLevel> {
        if n >= Self::MIN.0 && n <= Self::MAX.0 {
            Ok(Self(n))
        } else {
            Err(InvalidLevel(n))
        }
    }

    /// The level number.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Zero-based position of this level.
    pub(crate) const fn index(self) -> usize {
        (self.0 - 1) as usize
    }
}

impl TryFrom<u8> for Level {
    type Error = InvalidLevel;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        level.0
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned for a level number outside `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid level {0}: expected 1 to 5")]
pub struct InvalidLevel(pub u8);
