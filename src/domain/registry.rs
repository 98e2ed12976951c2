//! Category and domain registry.
//!
//! A [`RegistryBuilder`] borrows a [`Store`] while categories and domains are
//! registered. [`RegistryBuilder::build`] then produces an immutable
//! [`Registry`] that shares the records and no longer needs the store.

use std::{
    collections::{BTreeMap, HashMap, hash_map::Entry},
    fmt,
    sync::Arc,
};

use nonempty::NonEmpty;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{LookupError, Store, Topic, TopicId};

/// One member of a category, as declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryEntry {
    /// A bare topic id, exported under its derived symbolic name.
    Id(String),
    /// A topic id with an explicit export alias.
    Aliased {
        /// The topic id.
        id: String,
        /// The symbolic name to export the topic under.
        export: String,
    },
}

impl CategoryEntry {
    /// The referenced topic id.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Id(id) | Self::Aliased { id, .. } => id,
        }
    }

    /// The explicit export alias, if any.
    #[must_use]
    pub fn export(&self) -> Option<&str> {
        match self {
            Self::Id(_) => None,
            Self::Aliased { export, .. } => Some(export),
        }
    }
}

impl From<&str> for CategoryEntry {
    fn from(id: &str) -> Self {
        Self::Id(id.to_string())
    }
}

/// Errors raised while registering categories and domains.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A category lists ids that are not in the store.
    #[error("category '{category}' lists unknown topics: {}", .ids.join(", "))]
    UnknownTopics {
        /// The category being registered.
        category: String,
        /// Every unknown id, in declared order.
        ids: Vec<String>,
    },

    /// A category lists the same topic more than once.
    #[error("category '{category}' lists '{id}' more than once")]
    RepeatedTopic {
        /// The category being registered.
        category: String,
        /// The repeated id.
        id: String,
    },

    /// A category name is already registered.
    #[error("category '{0}' is already registered")]
    DuplicateCategory(String),

    /// A domain lists categories that are not registered.
    #[error("domain '{domain}' lists unknown categories: {}", .names.join(", "))]
    UnknownCategories {
        /// The domain being registered.
        domain: String,
        /// Every unknown category, in declared order.
        names: Vec<String>,
    },

    /// A domain name is already registered.
    #[error("domain '{0}' is already registered")]
    DuplicateDomain(String),

    /// A topic was given two different export aliases.
    #[error("topic '{id}' is exported both as '{first}' and '{second}'")]
    ConflictingAlias {
        /// The topic id.
        id: TopicId,
        /// The alias declared first.
        first: String,
        /// The conflicting alias.
        second: String,
    },

    /// A category or domain name is blank.
    #[error("category and domain names must not be empty")]
    EmptyName,

    /// A category entry gives a blank export alias.
    #[error("category '{category}' gives '{id}' a blank export alias")]
    EmptyAlias {
        /// The category being registered.
        category: String,
        /// The aliased topic id.
        id: String,
    },
}

/// Two different records exported under the same symbolic name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameCollision {
    /// The symbolic name.
    pub name: String,
    /// The record that claimed the name first.
    pub first: TopicId,
    /// The record that collided with it.
    pub second: TopicId,
}

impl fmt::Display for NameCollision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' is claimed by both '{}' and '{}'",
            self.name, self.first, self.second
        )
    }
}

/// Every symbolic-name collision found by [`Registry::export_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameCollisions(NonEmpty<NameCollision>);

impl NameCollisions {
    /// Iterates the collisions in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &NameCollision> {
        self.0.iter()
    }
}

impl fmt::Display for NameCollisions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} export name collision(s): ", self.0.len())?;
        for (i, collision) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{collision}")?;
        }
        Ok(())
    }
}

impl std::error::Error for NameCollisions {}

/// A named, ordered grouping of records.
#[derive(Debug, Clone)]
pub struct Category {
    name: String,
    topics: Vec<Arc<Topic>>,
}

impl Category {
    /// The category name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The member records in declared order.
    #[must_use]
    pub fn topics(&self) -> &[Arc<Topic>] {
        &self.topics
    }
}

#[derive(Debug, Clone)]
struct Domain {
    name: String,
    categories: Vec<usize>,
}

/// Collects categories and domains against a store.
#[derive(Debug)]
pub struct RegistryBuilder<'s> {
    store: &'s Store,
    categories: Vec<Category>,
    category_index: HashMap<String, usize>,
    domains: Vec<Domain>,
    domain_index: HashMap<String, usize>,
    aliases: HashMap<TopicId, String>,
}

impl<'s> RegistryBuilder<'s> {
    /// Starts a registry over the given store.
    #[must_use]
    pub fn new(store: &'s Store) -> Self {
        Self {
            store,
            categories: Vec::new(),
            category_index: HashMap::new(),
            domains: Vec::new(),
            domain_index: HashMap::new(),
            aliases: HashMap::new(),
        }
    }

    /// Registers a category with its members in declared order.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::DuplicateCategory`] if the name is taken
    /// - [`RegistryError::UnknownTopics`] listing every id missing from the
    ///   store
    /// - [`RegistryError::RepeatedTopic`] if an id appears twice
    /// - [`RegistryError::EmptyAlias`] if an entry's export alias is blank
    /// - [`RegistryError::ConflictingAlias`] if an entry re-exports a topic
    ///   under a different alias
    ///
    /// On error nothing is registered.
    pub fn register_category<E>(
        &mut self,
        name: impl Into<String>,
        entries: impl IntoIterator<Item = E>,
    ) -> Result<&mut Self, RegistryError>
    where
        E: Into<CategoryEntry>,
    {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.category_index.contains_key(&name) {
            return Err(RegistryError::DuplicateCategory(name));
        }

        let entries: Vec<CategoryEntry> = entries.into_iter().map(Into::into).collect();

        let unknown: Vec<String> = entries
            .iter()
            .filter(|entry| !self.store.contains(entry.id()))
            .map(|entry| entry.id().to_string())
            .collect();
        if !unknown.is_empty() {
            return Err(RegistryError::UnknownTopics {
                category: name,
                ids: unknown,
            });
        }

        let mut topics: Vec<Arc<Topic>> = Vec::with_capacity(entries.len());
        let mut new_aliases: HashMap<TopicId, String> = HashMap::new();
        for entry in &entries {
            let topic = self
                .store
                .get(entry.id())
                .map_err(|_| RegistryError::UnknownTopics {
                    category: name.clone(),
                    ids: vec![entry.id().to_string()],
                })?;

            if topics.iter().any(|t| t.id() == topic.id()) {
                return Err(RegistryError::RepeatedTopic {
                    category: name,
                    id: entry.id().to_string(),
                });
            }

            if let Some(export) = entry.export() {
                if export.trim().is_empty() {
                    return Err(RegistryError::EmptyAlias {
                        category: name,
                        id: entry.id().to_string(),
                    });
                }
                let existing = self
                    .aliases
                    .get(topic.id())
                    .or_else(|| new_aliases.get(topic.id()));
                match existing {
                    Some(first) if first != export => {
                        return Err(RegistryError::ConflictingAlias {
                            id: topic.id().clone(),
                            first: first.clone(),
                            second: export.to_string(),
                        });
                    }
                    Some(_) => {}
                    None => {
                        new_aliases.insert(topic.id().clone(), export.to_string());
                    }
                }
            }

            topics.push(Arc::clone(topic));
        }

        tracing::debug!("Registered category '{name}' with {} topics", topics.len());

        self.aliases.extend(new_aliases);
        self.category_index.insert(name.clone(), self.categories.len());
        self.categories.push(Category { name, topics });
        Ok(self)
    }

    /// Registers a domain grouping already-registered categories.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::DuplicateDomain`] if the name is taken
    /// - [`RegistryError::UnknownCategories`] listing every unregistered
    ///   category
    pub fn register_domain<S>(
        &mut self,
        name: impl Into<String>,
        categories: impl IntoIterator<Item = S>,
    ) -> Result<&mut Self, RegistryError>
    where
        S: AsRef<str>,
    {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }

        let mut indices = Vec::new();
        let mut unknown = Vec::new();
        for category in categories {
            let category = category.as_ref();
            match self.category_index.get(category) {
                Some(&index) => indices.push(index),
                None => unknown.push(category.to_string()),
            }
        }
        if !unknown.is_empty() {
            return Err(RegistryError::UnknownCategories {
                domain: name,
                names: unknown,
            });
        }

        match self.domain_index.entry(name) {
            Entry::Occupied(entry) => Err(RegistryError::DuplicateDomain(entry.key().clone())),
            Entry::Vacant(entry) => {
                self.domains.push(Domain {
                    name: entry.key().clone(),
                    categories: indices,
                });
                entry.insert(self.domains.len() - 1);
                Ok(self)
            }
        }
    }

    /// Freezes the registry.
    #[must_use]
    pub fn build(self) -> Registry {
        Registry {
            categories: self.categories,
            category_index: self.category_index,
            domains: self.domains,
            domain_index: self.domain_index,
            aliases: self.aliases,
        }
    }
}

/// An immutable set of categories and domains.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    categories: Vec<Category>,
    category_index: HashMap<String, usize>,
    domains: Vec<Domain>,
    domain_index: HashMap<String, usize>,
    aliases: HashMap<TopicId, String>,
}

impl Registry {
    /// Starts building a registry over the given store.
    #[must_use]
    pub fn builder(store: &Store) -> RegistryBuilder<'_> {
        RegistryBuilder::new(store)
    }

    /// The records of a category in declared order.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::CategoryNotFound`] if no category has this name.
    pub fn by_category(&self, name: &str) -> Result<&[Arc<Topic>], LookupError> {
        self.category(name).map(Category::topics)
    }

    /// Looks up a category by name.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::CategoryNotFound`] if no category has this name.
    pub fn category(&self, name: &str) -> Result<&Category, LookupError> {
        self.category_index
            .get(name)
            .map(|&index| &self.categories[index])
            .ok_or_else(|| LookupError::CategoryNotFound(name.to_string()))
    }

    /// The categories of a domain in declared order.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::DomainNotFound`] if no domain has this name.
    pub fn by_domain(&self, name: &str) -> Result<Vec<&Category>, LookupError> {
        let domain = self
            .domain_index
            .get(name)
            .map(|&index| &self.domains[index])
            .ok_or_else(|| LookupError::DomainNotFound(name.to_string()))?;

        Ok(domain
            .categories
            .iter()
            .map(|&index| &self.categories[index])
            .collect())
    }

    /// All categories in registration order.
    pub fn categories(&self) -> impl ExactSizeIterator<Item = &Category> {
        self.categories.iter()
    }

    /// All domain names in registration order.
    pub fn domains(&self) -> impl ExactSizeIterator<Item = &str> {
        self.domains.iter().map(|domain| domain.name.as_str())
    }

    /// The symbolic name a record is exported under.
    #[must_use]
    pub fn symbol(&self, id: &TopicId) -> String {
        self.aliases
            .get(id)
            .cloned()
            .unwrap_or_else(|| id.symbol())
    }

    /// The flat export namespace.
    ///
    /// Every categorised record appears once under its symbolic name, however
    /// many categories list it.
    ///
    /// # Errors
    ///
    /// Returns every case of two different records sharing a symbolic name.
    pub fn export_all(&self) -> Result<BTreeMap<String, Arc<Topic>>, NameCollisions> {
        let mut exports: BTreeMap<String, Arc<Topic>> = BTreeMap::new();
        let mut collisions = Vec::new();

        for topic in self.categories.iter().flat_map(|category| &category.topics) {
            let name = self.symbol(topic.id());
            match exports.get(&name) {
                Some(existing) if existing.id() == topic.id() => {}
                Some(existing) => {
                    let collision = NameCollision {
                        name,
                        first: existing.id().clone(),
                        second: topic.id().clone(),
                    };
                    if !collisions.contains(&collision) {
                        collisions.push(collision);
                    }
                }
                None => {
                    exports.insert(name, Arc::clone(topic));
                }
            }
        }

        NonEmpty::from_vec(collisions).map_or(Ok(exports), |collisions| {
            Err(NameCollisions(collisions))
        })
    }
}
