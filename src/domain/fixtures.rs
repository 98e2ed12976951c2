//! Record builders shared by unit tests.

use std::collections::BTreeMap;

use crate::domain::{
    ContentLevel, EducationalContent, ExamRelevance, KeyTerm, Level, Topic,
    draft::{CitationDraft, CrossReferenceDraft, MediaDraft, TagsDraft},
    validate,
    vocabulary::{CitationType, ClinicalRelevance, ContentType, MediaType, Relationship, Status},
};

/// A complete, valid authored record with the given id and no
/// cross-references.
pub fn draft(id: &str) -> EducationalContent {
    let levels: BTreeMap<String, ContentLevel> = Level::ALL
        .into_iter()
        .map(|level| (level.to_string(), content_level(level)))
        .collect();

    EducationalContent {
        id: id.to_string(),
        kind: ContentType::Condition.into(),
        name: format!("Topic {id}"),
        alternate_names: vec![format!("{id} synonym")],
        hpo_id: Some("HP:0000388".to_string()),
        levels,
        media: vec![MediaDraft {
            id: format!("{id}-diagram"),
            kind: MediaType::Diagram.into(),
            filename: format!("{id}.svg"),
            title: "Overview".to_string(),
            description: "Labelled overview diagram".to_string(),
        }],
        citations: vec![CitationDraft {
            id: "aao-2016".to_string(),
            kind: CitationType::Article.into(),
            title: "Clinical Practice Guideline (2016)".to_string(),
            authors: None,
            source: "Otolaryngology-Head and Neck Surgery".to_string(),
            url: None,
            accessed_date: None,
        }],
        cross_references: Vec::new(),
        tags: TagsDraft {
            systems: vec!["auditory".to_string()],
            topics: vec!["infection".to_string()],
            keywords: Vec::new(),
            clinical_relevance: ClinicalRelevance::High.into(),
            exam_relevance: ExamRelevance {
                usmle: true,
                nbme: false,
                shelf: vec!["pediatrics".to_string()],
            },
        },
        created_at: "2026-01-30T00:00:00Z".to_string(),
        updated_at: "2026-01-30T00:00:00Z".to_string(),
        version: 1,
        status: Status::Published.into(),
        contributors: None,
    }
}

/// A cross-reference draft pointing at `target`.
pub fn reference(target: &str, relationship: Relationship) -> CrossReferenceDraft {
    CrossReferenceDraft {
        target_id: target.to_string(),
        target_type: ContentType::Condition.into(),
        relationship: relationship.into(),
        label: format!("See {target}"),
    }
}

/// A validated record with the given id.
pub fn topic(id: &str) -> Topic {
    validate(draft(id)).unwrap()
}

/// A validated record with the given id and cross-references.
pub fn linked_topic(id: &str, references: &[(&str, Relationship)]) -> Topic {
    let mut draft = draft(id);
    draft.cross_references = references
        .iter()
        .map(|(target, relationship)| reference(target, *relationship))
        .collect();
    validate(draft).unwrap()
}

fn content_level(level: Level) -> ContentLevel {
    ContentLevel {
        level: level.get(),
        summary: format!("Level {level} synopsis."),
        explanation: format!("Level {level} explanation in **markdown**."),
        key_terms: vec![
            KeyTerm {
                term: "eardrum".to_string(),
                definition: "A thin membrane that vibrates with sound".to_string(),
                pronunciation: None,
            },
            KeyTerm {
                term: "Eustachian tube".to_string(),
                definition: "Connects the middle ear to the throat".to_string(),
                pronunciation: Some("yoo-STAY-shun".to_string()),
            },
        ],
        analogies: vec!["Like a balloon filling with water.".to_string()],
        examples: None,
        clinical_notes: (level >= Level::new(3).unwrap())
            .then(|| "Watchful waiting is appropriate in mild cases.".to_string()),
        patient_counseling_points: None,
    }
}
