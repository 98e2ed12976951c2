//! Domain models for the topic catalog.
//!
//! This module contains the record model (authored and validated forms),
//! record validation, the in-memory [`Store`], the category [`Registry`] and
//! the catalog configuration.

mod config;
pub use config::{Config, ConfigError};

/// Authored (unvalidated) record types.
pub mod draft;
pub use draft::{ContentLevel, EducationalContent, ExamRelevance, KeyTerm};

mod level;
pub use level::{InvalidLevel, Level};

/// Category and domain registry.
pub mod registry;
pub use registry::{
    Category, CategoryEntry, NameCollision, NameCollisions, Registry, RegistryBuilder,
    RegistryError,
};

/// In-memory record store.
pub mod store;
pub use store::{DanglingReference, LookupError, Revision, RevisionError, SortKey, Store, Warning};

/// Validated record types.
pub mod topic;
pub use topic::{Levels, Topic};

mod topic_id;
pub use topic_id::{InvalidTopicId, TopicId};

mod validation;
pub use validation::{Problem, ValidationError, ValidationErrors, validate};

/// Closed vocabularies for enumerated record fields.
pub mod vocabulary;

#[cfg(test)]
pub(crate) mod fixtures;
