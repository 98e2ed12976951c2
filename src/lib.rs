//! A catalog of patient-education topics.
//!
//! Each topic is written at five levels of complexity, from a lay summary to
//! expert depth. Topics are authored as YAML or JSON records, validated into
//! a [`Store`], and grouped into named categories by a [`Registry`] that also
//! exports them under a flat namespace of symbolic names.

pub mod domain;
pub use domain::{
    Category, CategoryEntry, Config, ContentLevel, EducationalContent, KeyTerm, Level,
    LookupError, Registry, SortKey, Store, Topic, TopicId, ValidationError, ValidationErrors,
    validate,
};

/// Filesystem storage for catalogs.
pub mod storage;
pub use storage::{Library, LoadError, Loaded, Manifest, Unloaded};
