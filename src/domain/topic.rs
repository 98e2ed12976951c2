use std::num::NonZeroU32;

use borsh::BorshSerialize;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer, ser::SerializeMap};
use sha2::{Digest, Sha256};

use crate::domain::{
    ContentLevel, EducationalContent, Level, TopicId, ValidationErrors,
    validation::check_revision,
    vocabulary::{CitationType, ClinicalRelevance, ContentType, MediaType, Relationship, Status},
};

/// A validated topic record.
///
/// A `Topic` can only be obtained through [`validate`](crate::domain::validate)
/// (or by deserializing, which validates), so every instance upholds the
/// record invariants: all five levels present and self-consistent, required
/// fields non-empty, enumerated fields within their vocabularies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "EducationalContent")]
pub struct Topic {
    pub(crate) id: TopicId,
    #[serde(rename = "type")]
    pub(crate) kind: ContentType,
    pub(crate) name: String,
    pub(crate) alternate_names: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) hpo_id: Option<String>,
    pub(crate) levels: Levels,
    pub(crate) media: Vec<MediaReference>,
    pub(crate) citations: Vec<Citation>,
    pub(crate) cross_references: Vec<CrossReference>,
    pub(crate) tags: TagBlock,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
    pub(crate) version: NonZeroU32,
    pub(crate) status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) contributors: Option<Vec<String>>,
}

impl TryFrom<EducationalContent> for Topic {
    type Error = ValidationErrors;

    fn try_from(record: EducationalContent) -> Result<Self, Self::Error> {
        crate::domain::validate(record)
    }
}

impl Topic {
    /// The topic's stable identifier.
    #[must_use]
    pub const fn id(&self) -> &TopicId {
        &self.id
    }

    /// What kind of subject this topic describes.
    #[must_use]
    pub const fn kind(&self) -> ContentType {
        self.kind
    }

    /// Display title.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Synonyms, in authored order.
    #[must_use]
    pub fn alternate_names(&self) -> &[String] {
        &self.alternate_names
    }

    /// Human Phenotype Ontology term, if this is a condition that has one.
    #[must_use]
    pub fn hpo_id(&self) -> Option<&str> {
        self.hpo_id.as_deref()
    }

    /// The five levels of explanation.
    #[must_use]
    pub const fn levels(&self) -> &Levels {
        &self.levels
    }

    /// The explanation at the given level.
    #[must_use]
    pub const fn level(&self, level: Level) -> &ContentLevel {
        self.levels.get(level)
    }

    /// Media pointers.
    #[must_use]
    pub fn media(&self) -> &[MediaReference] {
        &self.media
    }

    /// Citations.
    #[must_use]
    pub fn citations(&self) -> &[Citation] {
        &self.citations
    }

    /// Outgoing cross-references.
    #[must_use]
    pub fn cross_references(&self) -> &[CrossReference] {
        &self.cross_references
    }

    /// Classification tags.
    #[must_use]
    pub const fn tags(&self) -> &TagBlock {
        &self.tags
    }

    /// When the topic was first authored.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// When the topic was last revised.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Revision counter.
    #[must_use]
    pub const fn version(&self) -> NonZeroU32 {
        self.version
    }

    /// Publication state.
    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }

    /// Author names, if recorded.
    #[must_use]
    pub fn contributors(&self) -> Option<&[String]> {
        self.contributors.as_deref()
    }

    /// Returns a value generated by hashing the prose of the topic.
    ///
    /// The fingerprint covers the name, alternate names and all five levels.
    /// Identity, timestamps, version, status and links do not contribute, so
    /// the fingerprint changes exactly when the explanation a reader sees
    /// changes.
    ///
    /// # Panics
    ///
    /// Panics if borsh serialization fails (which should never happen for this
    /// data structure).
    #[must_use]
    pub fn fingerprint(&self) -> String {
        #[derive(BorshSerialize)]
        struct FingerprintData<'a> {
            name: &'a str,
            alternate_names: &'a [String],
            levels: &'a [ContentLevel; 5],
        }

        let data = FingerprintData {
            name: &self.name,
            alternate_names: &self.alternate_names,
            levels: &self.levels.0,
        };

        // encode using [borsh](https://borsh.io/)
        let encoded = borsh::to_vec(&data).expect("this should never fail");

        let hash = Sha256::digest(encoded);
        format!("{hash:x}")
    }

    /// Starts a revision of this topic.
    ///
    /// The returned record carries the next version number and the given
    /// revision time; the closure edits the prose. The edited levels are
    /// validated again before the revision is returned. Pass the result to
    /// [`Store::replace`](crate::domain::Store::replace), which also rejects a
    /// revision time earlier than the stored record's.
    ///
    /// # Errors
    ///
    /// Returns every problem in the edited levels, and
    /// [`Problem::UpdatedBeforeCreated`](crate::domain::Problem::UpdatedBeforeCreated)
    /// if `at` precedes the topic's creation.
    ///
    /// # Panics
    ///
    /// Panics if the version counter overflows.
    pub fn revise(
        &self,
        at: DateTime<Utc>,
        edit: impl FnOnce(&mut Levels),
    ) -> Result<Self, ValidationErrors> {
        let mut revised = self.clone();
        edit(&mut revised.levels);
        for (level, content) in Level::ALL.into_iter().zip(revised.levels.0.iter_mut()) {
            content.level = level.get();
        }
        revised.version = self
            .version
            .checked_add(1)
            .expect("topic version overflow!");
        revised.updated_at = at;
        check_revision(&revised)?;
        Ok(revised)
    }
}

/// The complete set of five levels.
///
/// Serialized as a map from level number to [`ContentLevel`]; deserialized
/// only as part of a [`Topic`], which validates the whole record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Levels(pub(crate) [ContentLevel; 5]);

impl Levels {
    /// The content at the given level.
    #[must_use]
    pub const fn get(&self, level: Level) -> &ContentLevel {
        &self.0[level.index()]
    }

    /// Mutable access to the prose at the given level.
    ///
    /// Only reachable through [`Topic::revise`], which restores the `level`
    /// field and validates the edits afterwards.
    pub const fn get_mut(&mut self, level: Level) -> &mut ContentLevel {
        &mut self.0[level.index()]
    }

    /// Iterates levels in increasing order of complexity.
    pub fn iter(&self) -> impl Iterator<Item = (Level, &ContentLevel)> {
        Level::ALL.into_iter().zip(self.0.iter())
    }
}

impl Serialize for Levels {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (level, content) in self.iter() {
            map.serialize_entry(&level.get(), content)?;
        }
        map.end()
    }
}

/// A pointer to an externally hosted asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaReference {
    /// Asset id.
    pub id: String,
    /// Asset kind.
    #[serde(rename = "type")]
    pub kind: MediaType,
    /// File name on the asset host.
    pub filename: String,
    /// Caption title.
    pub title: String,
    /// Caption body.
    pub description: String,
}

/// A bibliographic source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    /// Citation id.
    pub id: String,
    /// Source kind.
    #[serde(rename = "type")]
    pub kind: CitationType,
    /// Title of the work.
    pub title: String,
    /// Authors, in order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<String>>,
    /// Publisher, journal or site.
    pub source: String,
    /// Link to the work.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// When an online source was consulted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accessed_date: Option<String>,
}

/// A directed, typed, weak link to another topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossReference {
    /// Id of the referenced topic. Not guaranteed to resolve.
    pub target_id: TopicId,
    /// Kind of the referenced topic.
    pub target_type: ContentType,
    /// How the topics relate.
    pub relationship: Relationship,
    /// Link text.
    pub label: String,
}

/// Classification tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagBlock {
    /// Body systems.
    pub systems: Vec<String>,
    /// Subject areas.
    pub topics: Vec<String>,
    /// Free keywords.
    pub keywords: Vec<String>,
    /// Clinical importance.
    pub clinical_relevance: ClinicalRelevance,
    /// Board-exam relevance.
    pub exam_relevance: crate::domain::ExamRelevance,
}
