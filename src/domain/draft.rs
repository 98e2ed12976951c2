//! Topic records as authored.
//!
//! These types mirror the wire format (camelCase keys, YAML or JSON) and are
//! deliberately permissive: every field has a default and every enumerated
//! field is [`Checked`], so that [`validate`](crate::domain::validate) can
//! report all problems of a record at once. A validated record is a
//! [`Topic`](crate::domain::Topic).

use std::collections::BTreeMap;

use borsh::BorshSerialize;
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::vocabulary::{
    Checked, CitationType, ClinicalRelevance, ContentType, MediaType, Relationship, Scalar,
    Status,
};

/// One educational topic, as authored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationalContent {
    /// Stable slug identifying the topic.
    #[serde(default)]
    pub id: String,

    /// What kind of subject the topic describes.
    #[serde(default, rename = "type")]
    pub kind: Checked<ContentType>,

    /// Display title.
    #[serde(default)]
    pub name: String,

    /// Synonyms, in order.
    #[serde(default)]
    pub alternate_names: Vec<String>,

    /// Human Phenotype Ontology term, for conditions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hpo_id: Option<String>,

    /// Explanations keyed by level number, as authored.
    #[serde(default, deserialize_with = "level_map")]
    pub levels: BTreeMap<String, ContentLevel>,

    /// Pointers to externally hosted assets.
    #[serde(default)]
    pub media: Vec<MediaDraft>,

    /// Bibliographic sources.
    #[serde(default)]
    pub citations: Vec<CitationDraft>,

    /// Links to other topics by id.
    #[serde(default)]
    pub cross_references: Vec<CrossReferenceDraft>,

    /// Classification tags.
    #[serde(default)]
    pub tags: TagsDraft,

    /// Creation timestamp (RFC 3339).
    #[serde(default)]
    pub created_at: String,

    /// Last revision timestamp (RFC 3339).
    #[serde(default)]
    pub updated_at: String,

    /// Revision counter, starting at 1.
    #[serde(default)]
    pub version: u32,

    /// Publication lifecycle state.
    #[serde(default)]
    pub status: Checked<Status>,

    /// Author names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contributors: Option<Vec<String>>,
}

fn level_map<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<String, ContentLevel>, D::Error> {
    let levels = BTreeMap::<Scalar, ContentLevel>::deserialize(deserializer)?;
    Ok(levels.into_iter().map(|(Scalar(key), level)| (key, level)).collect())
}

/// One complexity tier of a topic's explanation.
///
/// The shape is the same for authored and validated records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentLevel {
    /// The level number; must equal the key it is stored under.
    #[serde(default)]
    pub level: u8,

    /// One-sentence synopsis.
    #[serde(default)]
    pub summary: String,

    /// Markdown body.
    #[serde(default)]
    pub explanation: String,

    /// Glossary entries introduced at this level.
    #[serde(default)]
    pub key_terms: Vec<KeyTerm>,

    /// Everyday comparisons.
    #[serde(default)]
    pub analogies: Vec<String>,

    /// Worked examples.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub examples: Option<Vec<String>>,

    /// Notes for clinicians.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinical_notes: Option<String>,

    /// Points to raise when counselling a patient.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_counseling_points: Option<Vec<String>>,
}

/// A glossary entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize)]
pub struct KeyTerm {
    /// The term; unique within its level.
    #[serde(default)]
    pub term: String,

    /// Plain definition.
    #[serde(default)]
    pub definition: String,

    /// Phonetic spelling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pronunciation: Option<String>,
}

/// A media pointer, as authored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaDraft {
    /// Asset id.
    #[serde(default)]
    pub id: String,
    /// Asset kind.
    #[serde(default, rename = "type")]
    pub kind: Checked<MediaType>,
    /// File name on the asset host.
    #[serde(default)]
    pub filename: String,
    /// Caption title.
    #[serde(default)]
    pub title: String,
    /// Caption body.
    #[serde(default)]
    pub description: String,
}

/// A citation, as authored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CitationDraft {
    /// Citation id.
    #[serde(default)]
    pub id: String,
    /// Source kind.
    #[serde(default, rename = "type")]
    pub kind: Checked<CitationType>,
    /// Title of the work.
    #[serde(default)]
    pub title: String,
    /// Authors, in order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<String>>,
    /// Publisher, journal or site.
    #[serde(default)]
    pub source: String,
    /// Link to the work.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// When an online source was consulted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessed_date: Option<String>,
}

/// A cross-reference, as authored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossReferenceDraft {
    /// Id of the referenced topic.
    #[serde(default)]
    pub target_id: String,
    /// Kind of the referenced topic.
    #[serde(default)]
    pub target_type: Checked<ContentType>,
    /// How the topics relate.
    #[serde(default)]
    pub relationship: Checked<Relationship>,
    /// Link text.
    #[serde(default)]
    pub label: String,
}

/// Classification tags, as authored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagsDraft {
    /// Body systems.
    #[serde(default)]
    pub systems: Vec<String>,
    /// Subject areas.
    #[serde(default)]
    pub topics: Vec<String>,
    /// Free keywords.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Clinical importance.
    #[serde(default)]
    pub clinical_relevance: Checked<ClinicalRelevance>,
    /// Board-exam relevance.
    #[serde(default)]
    pub exam_relevance: ExamRelevance,
}

/// Board-exam relevance of a topic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamRelevance {
    /// Relevant to USMLE.
    #[serde(default)]
    pub usmle: bool,
    /// Relevant to NBME.
    #[serde(default)]
    pub nbme: bool,
    /// Relevant shelf exams.
    #[serde(default)]
    pub shelf: Vec<String>,
}
