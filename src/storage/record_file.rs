//! Reading topic records from YAML and JSON files.
//!
//! A record file holds either a single record (a mapping) or a sequence of
//! records. The format is chosen by the file extension.

use std::{ffi::OsStr, fs, io, path::Path};

use crate::domain::EducationalContent;

/// The serialization format of a record file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    /// `.yaml` or `.yml`
    Yaml,
    /// `.json`
    Json,
}

impl RecordFormat {
    /// Determines the format from a path's extension.
    ///
    /// Returns `None` for paths that are not record files.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(OsStr::to_str) {
            Some("yaml" | "yml") => Some(Self::Yaml),
            Some("json") => Some(Self::Json),
            _ => None,
        }
    }
}

/// Records read from one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordFile {
    /// The file holds a single record.
    Single(EducationalContent),
    /// The file holds a sequence of records.
    Many(Vec<EducationalContent>),
}

impl RecordFile {
    /// The records, each paired with its position for sequence files.
    pub fn into_records(self) -> impl Iterator<Item = (Option<usize>, EducationalContent)> {
        let records = match self {
            Self::Single(record) => vec![(None, record)],
            Self::Many(records) => records
                .into_iter()
                .enumerate()
                .map(|(i, record)| (Some(i), record))
                .collect(),
        };
        records.into_iter()
    }
}

/// Errors raised while reading a record file.
#[derive(Debug, thiserror::Error)]
pub enum RecordFileError {
    /// The file could not be read.
    #[error("failed to read file: {0}")]
    Io(#[from] io::Error),

    /// The file extension is not a record format.
    #[error("not a record file (expected .yaml, .yml or .json)")]
    UnknownFormat,

    /// The file is not valid YAML, or does not have the shape of a record.
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The file is not valid JSON, or does not have the shape of a record.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The top-level value is neither a mapping nor a sequence.
    #[error("expected a record or a sequence of records")]
    NotARecord,
}

/// Reads the records in a file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not YAML or JSON, or has a
/// top-level value that is neither a record nor a sequence of records.
pub fn read(path: &Path) -> Result<RecordFile, RecordFileError> {
    let format = RecordFormat::from_path(path).ok_or(RecordFileError::UnknownFormat)?;
    let content = fs::read_to_string(path)?;
    parse(&content, format)
}

/// Parses the records in a string.
///
/// # Errors
///
/// Returns an error if the content is malformed for the given format.
pub fn parse(content: &str, format: RecordFormat) -> Result<RecordFile, RecordFileError> {
    match format {
        RecordFormat::Yaml => match serde_yaml::from_str(content)? {
            serde_yaml::Value::Sequence(items) => Ok(RecordFile::Many(
                items
                    .into_iter()
                    .map(serde_yaml::from_value)
                    .collect::<Result<_, _>>()?,
            )),
            value @ serde_yaml::Value::Mapping(_) => {
                Ok(RecordFile::Single(serde_yaml::from_value(value)?))
            }
            _ => Err(RecordFileError::NotARecord),
        },
        RecordFormat::Json => match serde_json::from_str(content)? {
            serde_json::Value::Array(items) => Ok(RecordFile::Many(
                items
                    .into_iter()
                    .map(serde_json::from_value)
                    .collect::<Result<_, _>>()?,
            )),
            value @ serde_json::Value::Object(_) => {
                Ok(RecordFile::Single(serde_json::from_value(value)?))
            }
            _ => Err(RecordFileError::NotARecord),
        },
    }
}
