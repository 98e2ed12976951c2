use std::{
    borrow::Borrow,
    fmt,
    hash::{Hash, Hasher},
    ops::Deref,
    str::FromStr,
};

use non_empty_string::NonEmptyString;
use serde::{Deserialize, Serialize};

/// The stable identifier of a topic record.
///
/// Format: one or more segments of lowercase ASCII letters and digits,
/// separated by single hyphens (e.g. `ear-otitis-media`,
/// `hpv-vaccine`). Leading, trailing and doubled hyphens are rejected.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TopicId(NonEmptyString);

impl TopicId {
    /// Creates a new `TopicId`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTopicId`] if the string is empty or is not a
    /// well-formed slug.
    pub fn new(s: String) -> Result<Self, InvalidTopicId> {
        if s.is_empty() {
            return Err(InvalidTopicId::Empty);
        }

        if s.starts_with('-')
            || s.ends_with('-')
            || s.contains("--")
            || !s
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(InvalidTopicId::Malformed(s));
        }

        NonEmptyString::new(s)
            .map(Self)
            .map_err(|_| InvalidTopicId::Empty)
    }

    /// Returns the string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// The symbolic (export) name derived from this id.
    ///
    /// Hyphen-separated segments are joined in camelCase, the convention
    /// used for exported constant names:
    ///
    /// ```
    /// use edcat::TopicId;
    ///
    /// let id = TopicId::new("colorectal-cancer-screening".to_string()).unwrap();
    /// assert_eq!(id.symbol(), "colorectalCancerScreening");
    /// ```
    #[must_use]
    pub fn symbol(&self) -> String {
        let mut segments = self.as_str().split('-');
        let mut symbol = segments.next().unwrap_or_default().to_string();
        for segment in segments {
            let mut chars = segment.chars();
            if let Some(first) = chars.next() {
                symbol.push(first.to_ascii_uppercase());
                symbol.push_str(chars.as_str());
            }
        }
        symbol
    }
}

impl Hash for TopicId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl Borrow<str> for TopicId {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl AsRef<str> for TopicId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Deref for TopicId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TopicId {
    type Err = InvalidTopicId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl TryFrom<String> for TopicId {
    type Error = InvalidTopicId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for TopicId {
    type Error = InvalidTopicId;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value.to_string())
    }
}

impl From<TopicId> for String {
    fn from(id: TopicId) -> Self {
        id.as_str().to_string()
    }
}

/// Error returned when a string is not a valid topic id.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum InvalidTopicId {
    /// The id was empty.
    #[error("topic id must not be empty")]
    Empty,

    /// The id contained characters other than `[a-z0-9-]`, or misplaced
    /// hyphens.
    #[error(
        "invalid topic id '{0}': expected lowercase letters and digits separated by single hyphens"
    )]
    Malformed(String),
}
