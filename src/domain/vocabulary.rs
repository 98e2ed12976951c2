//! Closed vocabularies used by topic records.
//!
//! Every enumerated field of a record is one of these closed sets. Authored
//! records carry them as [`Checked`] values so that an unknown string is
//! reported as a field-level validation error instead of aborting the parse.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, de::Visitor};

/// A closed set of string values.
pub trait Vocabulary: Copy + 'static {
    /// The accepted wire spellings, in declaration order.
    const VALUES: &'static [&'static str];
}

macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$variant_meta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl Vocabulary for $name {
            const VALUES: &'static [&'static str] = &[$($text),+];
        }

        impl $name {
            /// The wire spelling of this value.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownValue;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(UnknownValue {
                        value: other.to_string(),
                        allowed: Self::VALUES,
                    }),
                }
            }
        }
    };
}

vocabulary! {
    /// What kind of subject a topic (or cross-reference target) describes.
    ContentType {
        /// An anatomical structure.
        Structure => "structure",
        /// A body system.
        System => "system",
        /// A physiological pathway.
        Pathway => "pathway",
        /// A physiological or clinical process.
        Process => "process",
        /// A disease or condition.
        Condition => "condition",
        /// An abstract concept.
        Concept => "concept",
        /// A general topic.
        Topic => "topic",
    }
}

vocabulary! {
    /// Publication lifecycle of a record.
    Status {
        /// Being authored.
        Draft => "draft",
        /// Awaiting review.
        Review => "review",
        /// Visible to consumers.
        Published => "published",
    }
}

vocabulary! {
    /// How important a topic is in clinical practice.
    ClinicalRelevance {
        /// Critical knowledge.
        Critical => "critical",
        /// High relevance.
        High => "high",
        /// Medium relevance.
        Medium => "medium",
        /// Low relevance.
        Low => "low",
    }
}

vocabulary! {
    /// Kind of an externally hosted media asset.
    MediaType {
        /// A schematic diagram.
        Diagram => "diagram",
        /// A photograph or illustration.
        Image => "image",
        /// A video clip.
        Video => "video",
        /// An animation.
        Animation => "animation",
        /// A histology slide.
        Histology => "histology",
    }
}

vocabulary! {
    /// Kind of a bibliographic source.
    CitationType {
        /// A journal article.
        Article => "article",
        /// A journal as a whole.
        Journal => "journal",
        /// A textbook.
        Textbook => "textbook",
        /// A clinical practice guideline.
        Guideline => "guideline",
        /// A website.
        Website => "website",
    }
}

vocabulary! {
    /// How a cross-reference relates its source to its target.
    Relationship {
        /// Loosely related topics.
        Related => "related",
        /// The target is the parent of the source.
        Parent => "parent",
        /// The target is a child of the source.
        Child => "child",
        /// The topics share a parent.
        Sibling => "sibling",
        /// Further reading.
        SeeAlso => "see-also",
        /// The target should be understood first.
        Prerequisite => "prerequisite",
    }
}

/// Error returned for a string outside a closed vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown value '{value}', expected one of: {}", .allowed.join(", "))]
pub struct UnknownValue {
    /// The rejected string.
    pub value: String,
    /// The accepted spellings.
    pub allowed: &'static [&'static str],
}

/// An enumerated field as authored.
///
/// Deserializes to [`Checked::Known`] when the string belongs to the
/// vocabulary, and to [`Checked::Unknown`] otherwise. Numbers and booleans
/// are kept as their text, and null as an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Checked<T> {
    /// A member of the vocabulary.
    Known(T),
    /// Any other scalar, as text.
    Unknown(#[serde(deserialize_with = "scalar")] String),
}

impl<T> Default for Checked<T> {
    fn default() -> Self {
        Self::Unknown(String::new())
    }
}

impl<T> From<T> for Checked<T> {
    fn from(value: T) -> Self {
        Self::Known(value)
    }
}

/// A scalar of any type, as text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct Scalar(pub(crate) String);

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        scalar(deserializer).map(Self)
    }
}

fn scalar<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    struct ScalarVisitor;

    impl Visitor<'_> for ScalarVisitor {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a string, number or boolean")
        }

        fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_string<E: serde::de::Error>(self, v: String) -> Result<String, E> {
            Ok(v)
        }

        fn visit_bool<E: serde::de::Error>(self, v: bool) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_unit<E: serde::de::Error>(self) -> Result<String, E> {
            Ok(String::new())
        }

        fn visit_none<E: serde::de::Error>(self) -> Result<String, E> {
            Ok(String::new())
        }
    }

    deserializer.deserialize_any(ScalarVisitor)
}
