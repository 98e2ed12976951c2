//! The category manifest (`manifest.toml`).
//!
//! ```toml
//! _version = "1"
//!
//! [domains]
//! preventive-care = ["screenings", "vaccinations"]
//!
//! [categories]
//! screenings = ["colorectal-cancer-screening", { id = "mammography", export = "breastCancerScreening" }]
//! vaccinations = ["hpv-vaccine"]
//! ```
//!
//! Categories and domains keep the order in which they are written.

use std::{fmt, io, marker::PhantomData, path::Path};

use nonempty::NonEmpty;
use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{MapAccess, Visitor},
    ser::SerializeMap,
};

use crate::domain::{CategoryEntry, Registry, RegistryError, Store};

/// Declared categories and domains.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Manifest {
    domains: Ordered<Vec<String>>,
    categories: Ordered<Vec<CategoryEntry>>,
}

/// Errors raised while reading a manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// The file could not be read.
    #[error("Failed to read manifest: {0}")]
    Read(#[source] io::Error),

    /// The file is not a valid manifest.
    #[error("Failed to parse manifest: {0}")]
    Parse(#[from] toml::de::Error),
}

impl Manifest {
    /// Loads the manifest if the file exists, or returns an empty manifest.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> Result<Self, ManifestError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(toml::from_str(&content)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("No manifest at {}, no categories declared", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(ManifestError::Read(e)),
        }
    }

    /// Adds a category to the manifest.
    pub fn add_category<E: Into<CategoryEntry>>(
        &mut self,
        name: impl Into<String>,
        entries: impl IntoIterator<Item = E>,
    ) {
        self.categories
            .0
            .push((name.into(), entries.into_iter().map(Into::into).collect()));
    }

    /// Adds a domain to the manifest.
    pub fn add_domain<S: Into<String>>(
        &mut self,
        name: impl Into<String>,
        categories: impl IntoIterator<Item = S>,
    ) {
        self.domains
            .0
            .push((name.into(), categories.into_iter().map(Into::into).collect()));
    }

    /// Declared category names, in order.
    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.0.iter().map(|(name, _)| name.as_str())
    }

    /// Builds a registry over the store.
    ///
    /// All categories are registered before any domain. Registration carries
    /// on past a failure so that every problem is reported.
    ///
    /// # Errors
    ///
    /// Returns every registration failure.
    pub fn register(&self, store: &Store) -> Result<Registry, NonEmpty<RegistryError>> {
        let mut builder = Registry::builder(store);
        let mut errors = Vec::new();

        for (name, entries) in &self.categories.0 {
            if let Err(e) = builder.register_category(name.clone(), entries.iter().cloned()) {
                errors.push(e);
            }
        }
        for (name, categories) in &self.domains.0 {
            if let Err(e) = builder.register_domain(name.clone(), categories) {
                errors.push(e);
            }
        }

        NonEmpty::from_vec(errors).map_or_else(|| Ok(builder.build()), Err)
    }
}

/// A TOML table read in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Ordered<V>(Vec<(String, V)>);

impl<V> Default for Ordered<V> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<V: Serialize> Serialize for Ordered<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for Ordered<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedVisitor<V> {
            type Value = Ordered<V>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a table")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or_default());
                while let Some(entry) = map.next_entry()? {
                    entries.push(entry);
                }
                Ok(Ordered(entries))
            }
        }

        deserializer.deserialize_map(OrderedVisitor(PhantomData))
    }
}

/// The serialized versions of the manifest.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default)]
        domains: Ordered<Vec<String>>,

        #[serde(default)]
        categories: Ordered<Vec<CategoryEntry>>,
    },
}

impl From<Versions> for Manifest {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                domains,
                categories,
            } => Self {
                domains,
                categories,
            },
        }
    }
}

impl From<Manifest> for Versions {
    fn from(manifest: Manifest) -> Self {
        Self::V1 {
            domains: manifest.domains,
            categories: manifest.categories,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures;

    const MANIFEST: &str = r#"
_version = "1"

[domains]
preventive-care = ["vaccinations", "screenings"]

[categories]
vaccinations = ["hpv-vaccine"]
screenings = ["colorectal-cancer-screening", { id = "mammography", export = "breastCancerScreening" }]
"#;

    fn store() -> Store {
        Store::from_topics(
            ["hpv-vaccine", "colorectal-cancer-screening", "mammography"].map(fixtures::topic),
        )
        .unwrap()
    }

    #[test]
    fn tables_keep_document_order() {
        let manifest: Manifest = toml::from_str(MANIFEST).unwrap();
        let names: Vec<_> = manifest.category_names().collect();
        assert_eq!(names, ["vaccinations", "screenings"]);
        assert_eq!(
            manifest.categories.0[1].1[1],
            CategoryEntry::Aliased {
                id: "mammography".to_string(),
                export: "breastCancerScreening".to_string(),
            }
        );
    }

    #[test]
    fn registers_categories_then_domains() {
        let manifest: Manifest = toml::from_str(MANIFEST).unwrap();
        let store = store();
        let registry = manifest.register(&store).unwrap();

        let domain = registry.by_domain("preventive-care").unwrap();
        assert_eq!(domain[0].name(), "vaccinations");
        assert!(registry.export_all().unwrap().contains_key("breastCancerScreening"));
    }

    #[test]
    fn reports_every_registration_failure() {
        let mut manifest = Manifest::default();
        manifest.add_category("screenings", ["mammography", "colonoscopy"]);
        manifest.add_category("vaccinations", ["shingles-vaccine"]);
        manifest.add_domain("preventive-care", ["screenings"]);

        let errors = manifest.register(&store()).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(matches!(
            errors.last(),
            RegistryError::UnknownCategories { .. }
        ));
    }

    #[test]
    fn missing_manifest_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let manifest = Manifest::load_or_default(&tmp.path().join("manifest.toml")).unwrap();
        assert_eq!(manifest, Manifest::default());
    }

    #[test]
    fn unversioned_manifest_is_rejected() {
        assert!(toml::from_str::<Manifest>("[categories]\na = []\n").is_err());
    }

    #[test]
    fn serializes_with_version_tag() {
        let mut manifest = Manifest::default();
        manifest.add_category("screenings", ["mammography"]);
        let toml = toml::to_string(&manifest).unwrap();
        assert!(toml.contains("_version = \"1\""));
        assert_eq!(toml::from_str::<Manifest>(&toml).unwrap(), manifest);
    }
}
