/// Loading a catalog directory.
pub mod library;
/// The category manifest.
pub mod manifest;
/// Record file parsing.
pub mod record_file;

pub use library::{InvalidRecord, Library, LoadError, Loaded, UnrecognisedFile, Unloaded};
pub use manifest::{Manifest, ManifestError};
pub use record_file::{RecordFile, RecordFileError, RecordFormat};
