//! Record validation.
//!
//! [`validate`] turns an authored [`EducationalContent`] into a [`Topic`],
//! or reports every field-level problem found in it.

use std::{
    collections::{BTreeMap, HashSet},
    fmt,
    num::NonZeroU32,
    sync::LazyLock,
};

use chrono::{DateTime, Utc};
use nonempty::NonEmpty;
use regex::Regex;

use crate::domain::{
    ContentLevel, EducationalContent, Level, TopicId,
    draft::{CitationDraft, CrossReferenceDraft, MediaDraft, TagsDraft},
    topic::{Citation, CrossReference, Levels, MediaReference, TagBlock, Topic},
    topic_id::InvalidTopicId,
    vocabulary::{Checked, ContentType, UnknownValue, Vocabulary},
};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(todo|fixme|placeholder)\b").expect("valid regex"));

static HPO_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^HP:\d{7}$").expect("valid regex"));

/// A single field-level problem in a record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {problem}")]
pub struct ValidationError {
    /// Dotted path of the offending field, e.g. `levels.2.keyTerms.0.term`.
    pub field: String,
    /// What is wrong with it.
    pub problem: Problem,
}

impl ValidationError {
    /// Creates an error for the given field.
    pub fn new(field: impl Into<String>, problem: Problem) -> Self {
        Self {
            field: field.into(),
            problem,
        }
    }
}

/// What is wrong with a field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Problem {
    /// A required field is missing or blank.
    #[error("must not be empty")]
    Empty,

    /// One of the five levels is absent.
    #[error("level is missing")]
    MissingLevel,

    /// A level key outside `1..=5`.
    #[error("unexpected level key: levels are numbered 1 to 5")]
    UnexpectedLevel,

    /// A level's `level` field disagrees with its key.
    #[error("declares level {found} but is stored under key {expected}")]
    LevelMismatch {
        /// The map key.
        expected: u8,
        /// The declared level.
        found: u8,
    },

    /// A string outside a closed vocabulary.
    #[error(transparent)]
    UnknownValue(#[from] UnknownValue),

    /// A key term defined twice within one level.
    #[error("duplicate key term '{0}'")]
    DuplicateTerm(String),

    /// A topic id already used by another record.
    #[error("duplicate topic id '{0}'")]
    DuplicateId(String),

    /// A malformed topic id.
    #[error(transparent)]
    InvalidId(#[from] InvalidTopicId),

    /// A timestamp that is not RFC 3339.
    #[error("invalid timestamp '{0}': expected RFC 3339 (e.g. 2026-01-30T00:00:00Z)")]
    InvalidTimestamp(String),

    /// `updatedAt` earlier than `createdAt`.
    #[error("must not precede createdAt")]
    UpdatedBeforeCreated,

    /// A version of zero.
    #[error("must be a positive integer")]
    NonPositiveVersion,

    /// A malformed HPO term id.
    #[error("invalid HPO term id '{0}': expected HP: followed by seven digits")]
    InvalidHpoId(String),

    /// An HPO term id on a record that is not a condition.
    #[error("only condition records carry an HPO term id")]
    HpoIdNotAllowed,

    /// Unfinished authoring markers (TODO, FIXME, placeholder).
    #[error("contains placeholder text")]
    Placeholder,
}

/// All problems found in one record. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(NonEmpty<ValidationError>);

impl ValidationErrors {
    /// Wraps a list of errors, or returns `None` if it is empty.
    #[must_use]
    pub fn from_vec(errors: Vec<ValidationError>) -> Option<Self> {
        NonEmpty::from_vec(errors).map(Self)
    }

    /// Iterates the errors in the order they were found.
    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    /// The number of errors. Always at least one.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; provided for API symmetry.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Returns `true` if any error concerns the given field path.
    #[must_use]
    pub fn mentions(&self, field: &str) -> bool {
        self.iter().any(|error| error.field == field)
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        Self(NonEmpty::new(error))
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = <NonEmpty<ValidationError> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} validation error(s): ", self.len())?;
        for (i, error) in self.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Validates an authored record.
///
/// Checks the complete level set and level/key agreement, non-empty required
/// fields, vocabulary membership of every enumerated field, unique key terms
/// within each level, timestamps, version, id syntax, HPO term rules and
/// placeholder text.
///
/// Corpus-wide rules (unique ids, resolvable cross-references) are checked
/// by the [`Store`](crate::domain::Store).
///
/// # Errors
///
/// Returns every problem found, each naming its field path. A record is
/// never repaired.
pub fn validate(record: EducationalContent) -> Result<Topic, ValidationErrors> {
    let mut v = Validator::default();

    let EducationalContent {
        id,
        kind,
        name,
        alternate_names,
        hpo_id,
        levels,
        media,
        citations,
        cross_references,
        tags,
        created_at,
        updated_at,
        version,
        status,
        contributors,
    } = record;

    let id = v.topic_id("id", id);
    let kind = v.checked("type", kind);

    v.required("name", &name);
    v.prose("name", &name);
    for (i, alternate) in alternate_names.iter().enumerate() {
        v.required(format!("alternateNames.{i}"), alternate);
    }

    if let Some(hpo_id) = &hpo_id {
        if !HPO_ID.is_match(hpo_id) {
            v.push("hpoId", Problem::InvalidHpoId(hpo_id.clone()));
        }
        if kind.is_some_and(|kind| kind != ContentType::Condition) {
            v.push("hpoId", Problem::HpoIdNotAllowed);
        }
    }

    let levels = v.levels(levels);
    let media: Vec<_> = media
        .into_iter()
        .enumerate()
        .filter_map(|(i, media)| v.media(i, media))
        .collect();
    let citations: Vec<_> = citations
        .into_iter()
        .enumerate()
        .filter_map(|(i, citation)| v.citation(i, citation))
        .collect();
    let cross_references: Vec<_> = cross_references
        .into_iter()
        .enumerate()
        .filter_map(|(i, reference)| v.cross_reference(i, reference))
        .collect();
    let tags = v.tags(tags);

    let created_at = v.timestamp("createdAt", &created_at);
    let updated_at = v.timestamp("updatedAt", &updated_at);
    if let (Some(created), Some(updated)) = (created_at, updated_at) {
        if updated < created {
            v.push("updatedAt", Problem::UpdatedBeforeCreated);
        }
    }

    let version = NonZeroU32::new(version);
    if version.is_none() {
        v.push("version", Problem::NonPositiveVersion);
    }
    let status = v.checked("status", status);

    if let Some(errors) = ValidationErrors::from_vec(v.errors) {
        return Err(errors);
    }

    // Every component is present when no error was recorded.
    match (
        id, kind, levels, tags, created_at, updated_at, version, status,
    ) {
        (
            Some(id),
            Some(kind),
            Some(levels),
            Some(tags),
            Some(created_at),
            Some(updated_at),
            Some(version),
            Some(status),
        ) => Ok(Topic {
            id,
            kind,
            name,
            alternate_names,
            hpo_id,
            levels,
            media,
            citations,
            cross_references,
            tags,
            created_at,
            updated_at,
            version,
            status,
            contributors,
        }),
        _ => unreachable!("a missing component always records an error"),
    }
}

/// Re-checks a revised record's prose and revision time.
///
/// Only the levels and the revision time can differ from the validated
/// record the revision started from.
pub(super) fn check_revision(topic: &Topic) -> Result<(), ValidationErrors> {
    let mut v = Validator::default();
    for (level, content) in topic.levels.iter() {
        v.level(level, content);
    }
    if topic.updated_at < topic.created_at {
        v.push("updatedAt", Problem::UpdatedBeforeCreated);
    }
    ValidationErrors::from_vec(v.errors).map_or(Ok(()), Err)
}

#[derive(Debug, Default)]
struct Validator {
    errors: Vec<ValidationError>,
}

impl Validator {
    fn push(&mut self, field: impl Into<String>, problem: Problem) {
        self.errors.push(ValidationError::new(field, problem));
    }

    fn required(&mut self, field: impl Into<String>, value: &str) -> bool {
        if value.trim().is_empty() {
            self.push(field, Problem::Empty);
            false
        } else {
            true
        }
    }

    fn prose(&mut self, field: impl Into<String>, value: &str) {
        if PLACEHOLDER.is_match(value) {
            self.push(field, Problem::Placeholder);
        }
    }

    fn topic_id(&mut self, field: &str, value: String) -> Option<TopicId> {
        TopicId::new(value)
            .map_err(|e| self.push(field, Problem::from(e)))
            .ok()
    }

    fn checked<T: Vocabulary>(&mut self, field: impl Into<String>, value: Checked<T>) -> Option<T> {
        match value {
            Checked::Known(value) => Some(value),
            Checked::Unknown(value) if value.is_empty() => {
                self.push(field, Problem::Empty);
                None
            }
            Checked::Unknown(value) => {
                self.push(
                    field,
                    Problem::UnknownValue(UnknownValue {
                        value,
                        allowed: T::VALUES,
                    }),
                );
                None
            }
        }
    }

    fn timestamp(&mut self, field: &str, value: &str) -> Option<DateTime<Utc>> {
        if !self.required(field, value) {
            return None;
        }
        DateTime::parse_from_rfc3339(value)
            .map(|timestamp| timestamp.with_timezone(&Utc))
            .map_err(|_| self.push(field, Problem::InvalidTimestamp(value.to_string())))
            .ok()
    }

    fn levels(&mut self, mut levels: BTreeMap<String, ContentLevel>) -> Option<Levels> {
        let found = Level::ALL.map(|level| {
            let content = levels.remove(level.to_string().as_str());
            match &content {
                Some(content) => self.level(level, content),
                None => self.push(format!("levels.{level}"), Problem::MissingLevel),
            }
            content
        });

        for key in levels.keys() {
            self.push(format!("levels.{key}"), Problem::UnexpectedLevel);
        }

        if found.iter().all(Option::is_some) {
            Some(Levels(found.map(Option::unwrap_or_default)))
        } else {
            None
        }
    }

    fn level(&mut self, level: Level, content: &ContentLevel) {
        let path = format!("levels.{level}");

        if content.level != level.get() {
            self.push(
                format!("{path}.level"),
                Problem::LevelMismatch {
                    expected: level.get(),
                    found: content.level,
                },
            );
        }

        self.required(format!("{path}.summary"), &content.summary);
        self.prose(format!("{path}.summary"), &content.summary);
        self.required(format!("{path}.explanation"), &content.explanation);
        self.prose(format!("{path}.explanation"), &content.explanation);
        if let Some(notes) = &content.clinical_notes {
            self.prose(format!("{path}.clinicalNotes"), notes);
        }

        let mut seen = HashSet::with_capacity(content.key_terms.len());
        for (i, key_term) in content.key_terms.iter().enumerate() {
            let field = format!("{path}.keyTerms.{i}");
            if self.required(format!("{field}.term"), &key_term.term)
                && !seen.insert(key_term.term.as_str())
            {
                self.push(
                    format!("{field}.term"),
                    Problem::DuplicateTerm(key_term.term.clone()),
                );
            }
            self.required(format!("{field}.definition"), &key_term.definition);
            if PLACEHOLDER.is_match(&key_term.term) || PLACEHOLDER.is_match(&key_term.definition) {
                self.push(field, Problem::Placeholder);
            }
        }
    }

    fn media(&mut self, i: usize, media: MediaDraft) -> Option<MediaReference> {
        let path = format!("media.{i}");
        let id = self.required(format!("{path}.id"), &media.id);
        let filename = self.required(format!("{path}.filename"), &media.filename);
        let kind = self.checked(format!("{path}.type"), media.kind);

        Some(MediaReference {
            id: media.id,
            kind: kind?,
            filename: media.filename,
            title: media.title,
            description: media.description,
        })
        .filter(|_| id && filename)
    }

    fn citation(&mut self, i: usize, citation: CitationDraft) -> Option<Citation> {
        let path = format!("citations.{i}");
        let id = self.required(format!("{path}.id"), &citation.id);
        let title = self.required(format!("{path}.title"), &citation.title);
        let source = self.required(format!("{path}.source"), &citation.source);
        let kind = self.checked(format!("{path}.type"), citation.kind)?;

        (id && title && source).then_some(Citation {
            id: citation.id,
            kind,
            title: citation.title,
            authors: citation.authors,
            source: citation.source,
            url: citation.url,
            accessed_date: citation.accessed_date,
        })
    }

    fn cross_reference(
        &mut self,
        i: usize,
        reference: CrossReferenceDraft,
    ) -> Option<CrossReference> {
        let path = format!("crossReferences.{i}");
        let target_id = self.topic_id(&format!("{path}.targetId"), reference.target_id);
        let target_type = self.checked(format!("{path}.targetType"), reference.target_type);
        let relationship = self.checked(format!("{path}.relationship"), reference.relationship);

        Some(CrossReference {
            target_id: target_id?,
            target_type: target_type?,
            relationship: relationship?,
            label: reference.label,
        })
    }

    fn tags(&mut self, tags: TagsDraft) -> Option<TagBlock> {
        for (field, values) in [
            ("systems", &tags.systems),
            ("topics", &tags.topics),
            ("keywords", &tags.keywords),
            ("examRelevance.shelf", &tags.exam_relevance.shelf),
        ] {
            for (i, value) in values.iter().enumerate() {
                self.required(format!("tags.{field}.{i}"), value);
            }
        }
        let clinical_relevance = self.checked("tags.clinicalRelevance", tags.clinical_relevance);

        Some(TagBlock {
            systems: tags.systems,
            topics: tags.topics,
            keywords: tags.keywords,
            clinical_relevance: clinical_relevance?,
            exam_relevance: tags.exam_relevance,
        })
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::domain::{
        KeyTerm, fixtures,
        vocabulary::{ClinicalRelevance, Relationship},
    };

    fn errors(record: EducationalContent) -> ValidationErrors {
        validate(record).unwrap_err()
    }

    fn bogus<T>() -> Checked<T> {
        Checked::Unknown("bogus".to_string())
    }

    #[test]
    fn complete_record_is_valid() {
        let topic = validate(fixtures::draft("ear-otitis-media")).unwrap();
        assert_eq!(topic.id().as_str(), "ear-otitis-media");
        assert_eq!(topic.kind(), ContentType::Condition);
        assert_eq!(topic.version().get(), 1);
    }

    #[test]
    fn missing_level_names_the_level() {
        let mut draft = fixtures::draft("ear-otitis-media");
        draft.levels.remove("4");

        let errors = errors(draft);
        assert_eq!(errors.len(), 1);
        assert!(errors.mentions("levels.4"));
        assert_eq!(errors.iter().next().unwrap().problem, Problem::MissingLevel);
    }

    #[test]
    fn level_key_out_of_range_is_reported() {
        let mut draft = fixtures::draft("ear-otitis-media");
        let mut extra = draft.levels["5"].clone();
        extra.level = 6;
        draft.levels.insert("6".to_string(), extra);

        assert!(errors(draft).mentions("levels.6"));
    }

    #[test]
    fn level_must_match_its_key() {
        let mut draft = fixtures::draft("ear-otitis-media");
        draft.levels.get_mut("2").unwrap().level = 3;

        let errors = errors(draft);
        assert_eq!(
            errors.iter().next().unwrap(),
            &ValidationError::new(
                "levels.2.level",
                Problem::LevelMismatch {
                    expected: 2,
                    found: 3
                }
            )
        );
    }

    #[test]
    fn duplicate_key_terms_are_case_sensitive() {
        let mut draft = fixtures::draft("ear-otitis-media");
        let terms = &mut draft.levels.get_mut("1").unwrap().key_terms;
        terms.push(KeyTerm {
            term: "Eardrum".to_string(),
            definition: "Capitalised, so distinct".to_string(),
            pronunciation: None,
        });
        assert!(validate(draft.clone()).is_ok());

        draft.levels.get_mut("1").unwrap().key_terms.push(KeyTerm {
            term: "eardrum".to_string(),
            definition: "Defined twice".to_string(),
            pronunciation: None,
        });
        let errors = errors(draft);
        assert_eq!(
            errors.iter().next().unwrap(),
            &ValidationError::new(
                "levels.1.keyTerms.3.term",
                Problem::DuplicateTerm("eardrum".to_string())
            )
        );
    }

    #[test]
    fn all_problems_are_reported_together() {
        let mut draft = fixtures::draft("ear-otitis-media");
        draft.name = String::new();
        draft.levels.remove("1");
        draft.levels.get_mut("3").unwrap().summary = "  ".to_string();
        draft.status = Checked::Unknown("publshed".to_string());
        draft.tags.clinical_relevance = Checked::Unknown("urgent".to_string());
        draft.version = 0;

        let errors = errors(draft);
        for field in [
            "name",
            "levels.1",
            "levels.3.summary",
            "status",
            "tags.clinicalRelevance",
            "version",
        ] {
            assert!(errors.mentions(field), "expected an error for {field}");
        }
        assert_eq!(errors.len(), 6);
    }

    #[test_case("type"; "content type")]
    #[test_case("media.0.type"; "media type")]
    #[test_case("citations.0.type"; "citation type")]
    #[test_case("crossReferences.0.relationship"; "relationship")]
    #[test_case("crossReferences.0.targetType"; "target type")]
    fn unknown_vocabulary_values_are_field_errors(field: &str) {
        let mut draft = fixtures::draft("ear-otitis-media");
        draft.cross_references = vec![fixtures::reference("ear-cholesteatoma", Relationship::Related)];
        match field {
            "type" => draft.kind = bogus(),
            "media.0.type" => draft.media[0].kind = bogus(),
            "citations.0.type" => draft.citations[0].kind = bogus(),
            "crossReferences.0.relationship" => draft.cross_references[0].relationship = bogus(),
            _ => draft.cross_references[0].target_type = bogus(),
        }

        let errors = errors(draft);
        assert!(errors.mentions(field));
        assert!(matches!(
            &errors.iter().find(|e| e.field == field).unwrap().problem,
            Problem::UnknownValue(UnknownValue { value, .. }) if value == "bogus"
        ));
    }

    #[test]
    fn unknown_values_parse_and_are_reported() {
        let json = serde_json::json!({
            "id": "ear-otitis-media",
            "type": "condition",
            "name": "Otitis Media",
            "tags": { "clinicalRelevance": "urgent" },
        });
        let draft: EducationalContent = serde_json::from_value(json).unwrap();
        let errors = errors(draft);

        assert!(errors.mentions("tags.clinicalRelevance"));
        for level in 1..=5 {
            assert!(errors.mentions(&format!("levels.{level}")));
        }
        assert!(errors.mentions("createdAt"));
        assert!(errors.mentions("status"));
    }

    #[test]
    fn mistyped_values_are_field_errors() {
        let mut json = serde_json::to_value(fixtures::draft("ear-otitis-media")).unwrap();
        json["tags"]["clinicalRelevance"] = serde_json::json!(3);
        json["levels"]["six"] = json["levels"]["5"].clone();
        let draft: EducationalContent = serde_json::from_value(json).unwrap();

        let errors = errors(draft);
        assert_eq!(errors.len(), 2);
        assert!(matches!(
            &errors.iter().find(|e| e.field == "tags.clinicalRelevance").unwrap().problem,
            Problem::UnknownValue(UnknownValue { value, .. }) if value == "3"
        ));
        assert_eq!(
            errors.iter().find(|e| e.field == "levels.six").unwrap().problem,
            Problem::UnexpectedLevel
        );
    }

    #[test]
    fn malformed_cross_reference_target_is_rejected() {
        let mut draft = fixtures::draft("ear-otitis-media");
        draft.cross_references = vec![fixtures::reference("Ear Cholesteatoma", Relationship::Related)];
        assert!(errors(draft).mentions("crossReferences.0.targetId"));
    }

    #[test]
    fn hpo_id_only_on_conditions() {
        let mut draft = fixtures::draft("ear-anatomy");
        draft.kind = ContentType::Structure.into();
        let errors = errors(draft);
        assert!(errors.iter().any(|e| e.field == "hpoId" && e.problem == Problem::HpoIdNotAllowed));

        let mut draft = fixtures::draft("ear-anatomy");
        draft.kind = ContentType::Structure.into();
        draft.hpo_id = None;
        assert!(validate(draft).is_ok());
    }

    #[test]
    fn hpo_id_format_is_checked() {
        let mut draft = fixtures::draft("ear-otitis-media");
        draft.hpo_id = Some("HP:38".to_string());
        assert!(errors(draft).mentions("hpoId"));
    }

    #[test_case("createdAt", "30/01/2026"; "created not rfc3339")]
    #[test_case("updatedAt", "yesterday"; "updated not rfc3339")]
    fn timestamps_must_be_rfc3339(field: &str, value: &str) {
        let mut draft = fixtures::draft("ear-otitis-media");
        if field == "createdAt" {
            draft.created_at = value.to_string();
        } else {
            draft.updated_at = value.to_string();
        }
        let errors = errors(draft);
        assert_eq!(
            errors.iter().next().unwrap().problem,
            Problem::InvalidTimestamp(value.to_string())
        );
    }

    #[test]
    fn updated_at_cannot_precede_created_at() {
        let mut draft = fixtures::draft("ear-otitis-media");
        draft.updated_at = "2025-12-31T23:59:59Z".to_string();
        assert!(errors(draft).mentions("updatedAt"));
    }

    #[test_case("TODO: write this"; "todo marker")]
    #[test_case("fixme later"; "fixme marker")]
    #[test_case("A placeholder summary"; "placeholder word")]
    fn placeholder_text_is_rejected(summary: &str) {
        let mut draft = fixtures::draft("ear-otitis-media");
        draft.levels.get_mut("2").unwrap().summary = summary.to_string();
        let errors = errors(draft);
        assert_eq!(
            errors.iter().next().unwrap(),
            &ValidationError::new("levels.2.summary", Problem::Placeholder)
        );
    }

    #[test]
    fn words_containing_markers_are_not_placeholders() {
        let mut draft = fixtures::draft("ear-otitis-media");
        draft.levels.get_mut("2").unwrap().summary = "Mastodons and placeholders-free prose.".to_string();
        assert!(validate(draft).is_ok());
    }

    #[test_case("tags.systems.1"; "systems")]
    #[test_case("tags.topics.1"; "topics")]
    #[test_case("tags.keywords.0"; "keywords")]
    #[test_case("tags.examRelevance.shelf.1"; "shelf")]
    fn blank_tag_entries_are_rejected(field: &str) {
        let mut draft = fixtures::draft("ear-otitis-media");
        draft.tags.clinical_relevance = ClinicalRelevance::Low.into();
        let tags = &mut draft.tags;
        let values = match field {
            "tags.systems.1" => &mut tags.systems,
            "tags.topics.1" => &mut tags.topics,
            "tags.keywords.0" => &mut tags.keywords,
            _ => &mut tags.exam_relevance.shelf,
        };
        values.push("  ".to_string());

        let errors = errors(draft);
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.iter().next().unwrap(),
            &ValidationError::new(field, Problem::Empty)
        );
    }

    #[test]
    fn optional_level_fields_may_be_absent() {
        let mut draft = fixtures::draft("ear-otitis-media");
        let level = draft.levels.get_mut("1").unwrap();
        level.analogies.clear();
        level.key_terms.clear();
        level.clinical_notes = None;
        assert!(validate(draft).is_ok());
    }
}
