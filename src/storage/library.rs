//! A filesystem backed catalog
//!
//! The [`Library`] reads every record file under a root directory, validates
//! the records into a [`Store`] and registers the categories declared in
//! `manifest.toml` into a [`Registry`].

use std::{
    fmt,
    path::{Path, PathBuf},
};

use nonempty::NonEmpty;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::instrument;
use walkdir::{DirEntry, WalkDir};

use crate::{
    domain::{
        Config, ConfigError, DanglingReference, Registry, RegistryError, Store, Topic,
        ValidationErrors, Warning, validate,
    },
    storage::{
        manifest::{Manifest, ManifestError},
        record_file::{self, RecordFileError, RecordFormat},
    },
};

const CONFIG_FILE: &str = "config.toml";
const MANIFEST_FILE: &str = "manifest.toml";

/// State of a [`Library`] whose records have been loaded.
#[derive(Debug, Clone)]
pub struct Loaded {
    store: Store,
    registry: Registry,
    config: Config,
    warnings: Vec<Warning>,
}

/// State of a [`Library`] that has not been read yet.
#[derive(Debug, PartialEq, Eq)]
pub struct Unloaded;

/// A catalog stored in a directory.
#[derive(Debug)]
pub struct Library<S> {
    /// The root of the directory records are stored in.
    root: PathBuf,
    state: S,
}

impl<S> Library<S> {
    /// The catalog root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Library<Unloaded> {
    /// Opens a catalog at the given path.
    #[must_use]
    pub const fn new(root: PathBuf) -> Self {
        Self {
            root,
            state: Unloaded,
        }
    }

    /// Loads and validates every record, then registers the manifest.
    ///
    /// # Errors
    ///
    /// Loading stops at the first stage that fails, reporting every problem
    /// of that stage:
    ///
    /// - the configuration or manifest cannot be read
    /// - the root, or a directory beneath it, cannot be walked
    /// - record files cannot be parsed (unless `allow_unrecognised` is set,
    ///   in which case they are skipped)
    /// - records fail validation
    /// - two records share an id
    /// - the manifest names unknown topics or categories
    /// - cross-references dangle and `strict_references` is set
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub fn load(self) -> Result<Library<Loaded>, LoadError> {
        let config = Config::load_or_default(&self.root.join(CONFIG_FILE))?;
        let manifest = Manifest::load_or_default(&self.root.join(MANIFEST_FILE))?;
        let paths = collect_record_paths(&self.root).map_err(LoadError::UnreadablePaths)?;

        let (files, unrecognised): (Vec<_>, Vec<_>) = paths
            .into_par_iter()
            .map(|path| match record_file::read(&path) {
                Ok(file) => Ok((path, file)),
                Err(error) => Err(UnrecognisedFile { path, error }),
            })
            .partition(Result::is_ok);

        let files: Vec<_> = files.into_iter().filter_map(Result::ok).collect();
        let unrecognised: Vec<_> = unrecognised.into_iter().filter_map(Result::err).collect();

        if !unrecognised.is_empty() {
            if config.allow_unrecognised {
                for file in &unrecognised {
                    tracing::debug!("Skipping {}: {}", file.path.display(), file.error);
                }
            } else {
                return Err(LoadError::UnrecognisedFiles(unrecognised));
            }
        }

        let (topics, invalid): (Vec<_>, Vec<_>) = files
            .into_par_iter()
            .flat_map_iter(|(path, file)| {
                file.into_records().map(move |(index, record)| {
                    let id = record.id.clone();
                    validate(record).map_err(|errors| InvalidRecord {
                        path: path.clone(),
                        index,
                        id,
                        errors,
                    })
                })
            })
            .partition(Result::is_ok);

        let topics: Vec<Topic> = topics.into_iter().filter_map(Result::ok).collect();
        let mut invalid: Vec<_> = invalid.into_iter().filter_map(Result::err).collect();

        if !invalid.is_empty() {
            invalid.sort_by(|a, b| (&a.path, a.index).cmp(&(&b.path, b.index)));
            return Err(LoadError::InvalidRecords(invalid));
        }

        let store = Store::from_topics(topics).map_err(LoadError::DuplicateIds)?;
        let registry = manifest.register(&store).map_err(LoadError::Registry)?;

        let dangling = store.dangling_references();
        if config.strict_references && !dangling.is_empty() {
            return Err(LoadError::DanglingReferences(dangling));
        }

        let warnings = store.warnings();
        for warning in &warnings {
            tracing::warn!("{warning}");
        }

        tracing::info!(
            "Loaded {} topics in {} categories",
            store.len(),
            registry.categories().len()
        );

        Ok(Library {
            root: self.root,
            state: Loaded {
                store,
                registry,
                config,
                warnings,
            },
        })
    }
}

impl Library<Loaded> {
    /// The validated records.
    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.state.store
    }

    /// The registered categories and domains.
    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.state.registry
    }

    /// The configuration the catalog was loaded with.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.state.config
    }

    /// Non-blocking findings about the corpus.
    #[must_use]
    pub fn warnings(&self) -> &[Warning] {
        &self.state.warnings
    }
}

/// A file that could not be read as records.
#[derive(Debug)]
pub struct UnrecognisedFile {
    /// The offending file.
    pub path: PathBuf,
    /// Why it could not be read.
    pub error: RecordFileError,
}

/// A record that failed validation.
#[derive(Debug)]
pub struct InvalidRecord {
    /// The file holding the record.
    pub path: PathBuf,
    /// Position of the record within a multi-record file.
    pub index: Option<usize>,
    /// The record's id as authored (possibly empty or malformed).
    pub id: String,
    /// Every problem found in the record.
    pub errors: ValidationErrors,
}

impl InvalidRecord {
    /// A human-readable locator: path, position and id.
    #[must_use]
    pub fn locator(&self) -> String {
        let index = self.index.map(|i| format!("[{i}]")).unwrap_or_default();
        let id = if self.id.is_empty() {
            String::new()
        } else {
            format!(" ({})", self.id)
        };
        format!("{}{index}{id}", self.path.display())
    }
}

/// Errors raised while loading a catalog.
#[derive(Debug)]
pub enum LoadError {
    /// `config.toml` could not be loaded.
    Config(ConfigError),
    /// `manifest.toml` could not be loaded.
    Manifest(ManifestError),
    /// The root or a directory beneath it could not be read.
    UnreadablePaths(Vec<walkdir::Error>),
    /// Files that could not be parsed as records.
    UnrecognisedFiles(Vec<UnrecognisedFile>),
    /// Records that failed validation, ordered by path.
    InvalidRecords(Vec<InvalidRecord>),
    /// Records sharing an id.
    DuplicateIds(ValidationErrors),
    /// Manifest entries that could not be registered.
    Registry(NonEmpty<RegistryError>),
    /// Cross-references to unknown topics, with `strict_references` set.
    DanglingReferences(Vec<DanglingReference>),
}

impl LoadError {
    /// Which stage of loading failed.
    #[must_use]
    pub const fn summary(&self) -> &'static str {
        match self {
            Self::Config(_) => "Invalid configuration",
            Self::Manifest(_) | Self::Registry(_) => "Invalid manifest",
            Self::UnreadablePaths(_) => "Unreadable catalog directory",
            Self::UnrecognisedFiles(_) => "Unrecognised files",
            Self::InvalidRecords(_) => "Invalid records",
            Self::DuplicateIds(_) => "Duplicate topic ids",
            Self::DanglingReferences(_) => "Dangling cross-references",
        }
    }

    /// One line per underlying problem.
    #[must_use]
    pub fn problems(&self) -> Vec<String> {
        match self {
            Self::Config(e) => vec![e.to_string()],
            Self::Manifest(e) => vec![e.to_string()],
            Self::UnreadablePaths(errors) => errors.iter().map(ToString::to_string).collect(),
            Self::UnrecognisedFiles(files) => files
                .iter()
                .map(|file| format!("{}: {}", file.path.display(), file.error))
                .collect(),
            Self::InvalidRecords(records) => records
                .iter()
                .flat_map(|record| {
                    let locator = record.locator();
                    record
                        .errors
                        .iter()
                        .map(move |error| format!("{locator}: {error}"))
                })
                .collect(),
            Self::DuplicateIds(errors) => errors.iter().map(ToString::to_string).collect(),
            Self::Registry(errors) => errors.iter().map(ToString::to_string).collect(),
            Self::DanglingReferences(references) => {
                references.iter().map(ToString::to_string).collect()
            }
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !matches!(self, Self::Config(_) | Self::Manifest(_)) {
            write!(f, "{}: ", self.summary())?;
        }
        for (i, problem) in self.problems().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{problem}")?;
        }
        Ok(())
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Manifest(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for LoadError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<ManifestError> for LoadError {
    fn from(e: ManifestError) -> Self {
        Self::Manifest(e)
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

fn collect_record_paths(root: &Path) -> Result<Vec<PathBuf>, Vec<walkdir::Error>> {
    let (entries, errors): (Vec<_>, Vec<_>) = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| !is_hidden(entry))
        .partition(Result::is_ok);

    let errors: Vec<_> = errors.into_iter().filter_map(Result::err).collect();
    if !errors.is_empty() {
        return Err(errors);
    }

    let mut paths: Vec<_> = entries
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| RecordFormat::from_path(entry.path()).is_some())
        .map(DirEntry::into_path)
        .collect();
    paths.sort();
    Ok(paths)
}
