//! In-memory store of validated topic records.
//!
//! The [`Store`] knows nothing about the filesystem. It holds each record
//! behind an [`Arc`], so readers keep a complete record even while a revision
//! replaces it.

use std::{
    cmp::Ordering,
    collections::HashMap,
    fmt,
    sync::{Arc, LazyLock},
};

use petgraph::{Direction, algo::tarjan_scc, graphmap::DiGraphMap};
use regex::Regex;
use thiserror::Error;
use tracing::instrument;

use crate::domain::{
    Problem, Topic, TopicId, ValidationError, ValidationErrors, vocabulary::Relationship,
};

static ICD11_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]\d{1,2}\.?\d{0,3}$").expect("valid regex"));

/// A failed lookup by name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    /// No record has this id.
    #[error("topic not found: {0}")]
    TopicNotFound(String),
    /// No category is registered under this name.
    #[error("category not found: {0}")]
    CategoryNotFound(String),
    /// No domain is registered under this name.
    #[error("domain not found: {0}")]
    DomainNotFound(String),
}

/// A keyed collection of validated topic records.
#[derive(Debug, Clone, Default)]
pub struct Store {
    topics: HashMap<TopicId, Arc<Topic>>,
}

/// Sort orders for [`Store::sorted`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    /// By topic id.
    #[default]
    Id,
    /// By display name, then id.
    Name,
    /// Most recently revised first, then id.
    UpdatedAt,
}

/// Outcome of [`Store::replace`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Revision {
    /// The record was identical (same fingerprint and version); nothing
    /// changed.
    Unchanged,
    /// The record was replaced. Holds the previous record.
    Replaced(Arc<Topic>),
}

/// Errors from [`Store::replace`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RevisionError {
    /// No record with this id exists.
    #[error(transparent)]
    NotFound(#[from] LookupError),

    /// The revision does not increase the version.
    #[error("revision of '{id}' must increase the version (current {current}, proposed {proposed})")]
    VersionNotIncreased {
        /// The record id.
        id: TopicId,
        /// The stored version.
        current: u32,
        /// The version of the revision.
        proposed: u32,
    },

    /// The revision's `updatedAt` is earlier than the stored one.
    #[error("revision of '{id}' must not move updatedAt backwards")]
    UpdatedAtMovedBackwards {
        /// The record id.
        id: TopicId,
    },
}

/// A cross-reference whose target is not in the store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DanglingReference {
    /// The record holding the reference.
    pub source: TopicId,
    /// Position within the source's `crossReferences`.
    pub index: usize,
    /// The unresolved target id.
    pub target: TopicId,
}

impl fmt::Display for DanglingReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: crossReferences.{} points to unknown topic '{}'",
            self.source, self.index, self.target
        )
    }
}

/// A non-blocking finding about the corpus.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Warning {
    /// A cross-reference that does not resolve. The target may be added later.
    DanglingReference(DanglingReference),
    /// Records whose parent/child references form a cycle.
    HierarchyCycle(Vec<TopicId>),
    /// An `ICD-11:` system tag whose code looks malformed.
    SuspiciousIcdCode {
        /// The record carrying the tag.
        source: TopicId,
        /// The code after the `ICD-11:` prefix.
        code: String,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DanglingReference(reference) => write!(f, "{reference}"),
            Self::HierarchyCycle(ids) => {
                write!(f, "parent/child cycle: ")?;
                for (i, id) in ids.iter().enumerate() {
                    if i > 0 {
                        write!(f, " -> ")?;
                    }
                    write!(f, "{id}")?;
                }
                Ok(())
            }
            Self::SuspiciousIcdCode { source, code } => {
                write!(f, "{source}: potentially invalid ICD-11 code '{code}'")
            }
        }
    }
}

impl Store {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new store with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            topics: HashMap::with_capacity(capacity),
        }
    }

    /// Builds a store from validated records.
    ///
    /// # Errors
    ///
    /// Returns one `DuplicateId` error per record whose id was already taken.
    /// Every duplicate is reported; the first record with a given id wins.
    pub fn from_topics(topics: impl IntoIterator<Item = Topic>) -> Result<Self, ValidationErrors> {
        let topics = topics.into_iter();
        let mut store = Self::with_capacity(topics.size_hint().0);
        let errors: Vec<_> = topics
            .filter_map(|topic| store.insert(topic).err())
            .collect();

        ValidationErrors::from_vec(errors).map_or(Ok(store), Err)
    }

    /// Inserts a new record.
    ///
    /// # Errors
    ///
    /// Returns a `DuplicateId` error on field `id` if a record with the same
    /// id exists. The stored record is left untouched.
    pub fn insert(&mut self, topic: Topic) -> Result<(), ValidationError> {
        if self.topics.contains_key(topic.id()) {
            return Err(ValidationError::new(
                "id",
                Problem::DuplicateId(topic.id().to_string()),
            ));
        }
        self.topics.insert(topic.id().clone(), Arc::new(topic));
        Ok(())
    }

    /// Looks up a record by id.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::TopicNotFound`] if no record has this id.
    pub fn get(&self, id: &str) -> Result<&Arc<Topic>, LookupError> {
        self.topics
            .get(id)
            .ok_or_else(|| LookupError::TopicNotFound(id.to_string()))
    }

    /// Returns `true` if a record with this id exists.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.topics.contains_key(id)
    }

    /// Iterates all records in no particular order.
    ///
    /// Each call starts a fresh iteration.
    pub fn all(&self) -> impl ExactSizeIterator<Item = &Arc<Topic>> {
        self.topics.values()
    }

    /// All records, ordered by the given key.
    #[must_use]
    pub fn sorted(&self, key: SortKey) -> Vec<&Arc<Topic>> {
        let mut topics: Vec<_> = self.all().collect();
        topics.sort_by(|a, b| compare(a, b, key));
        topics
    }

    /// The number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.topics.len()
    }

    /// Returns `true` if the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Replaces a record with a revision of it.
    ///
    /// The whole record is swapped atomically; holders of the previous
    /// `Arc<Topic>` keep seeing the previous record.
    ///
    /// # Errors
    ///
    /// - [`RevisionError::NotFound`] if no record has this id
    /// - [`RevisionError::VersionNotIncreased`] if the prose changed without a
    ///   version bump
    /// - [`RevisionError::UpdatedAtMovedBackwards`] if `updatedAt` regressed
    #[instrument(level = "debug", skip(self, topic), fields(id = %topic.id()))]
    pub fn replace(&mut self, topic: Topic) -> Result<Revision, RevisionError> {
        let slot = self
            .topics
            .get_mut(topic.id().as_str())
            .ok_or_else(|| LookupError::TopicNotFound(topic.id().to_string()))?;

        if topic.version() == slot.version() && topic.fingerprint() == slot.fingerprint() {
            return Ok(Revision::Unchanged);
        }

        if topic.version() <= slot.version() {
            return Err(RevisionError::VersionNotIncreased {
                id: topic.id().clone(),
                current: slot.version().get(),
                proposed: topic.version().get(),
            });
        }

        if topic.updated_at() < slot.updated_at() {
            return Err(RevisionError::UpdatedAtMovedBackwards {
                id: topic.id().clone(),
            });
        }

        tracing::info!(
            "Revised {} from version {} to {}",
            topic.id(),
            slot.version(),
            topic.version()
        );

        let previous = std::mem::replace(slot, Arc::new(topic));
        Ok(Revision::Replaced(previous))
    }

    /// Every cross-reference whose target is not in the store, ordered by
    /// source id and position.
    #[must_use]
    pub fn dangling_references(&self) -> Vec<DanglingReference> {
        let mut dangling: Vec<_> = self
            .all()
            .flat_map(|topic| {
                topic
                    .cross_references()
                    .iter()
                    .enumerate()
                    .filter(|(_, reference)| !self.contains(&reference.target_id))
                    .map(|(index, reference)| DanglingReference {
                        source: topic.id().clone(),
                        index,
                        target: reference.target_id.clone(),
                    })
            })
            .collect();
        dangling.sort();
        dangling
    }

    /// Records that cross-reference the given id, ordered by id.
    ///
    /// The id need not exist; this also finds the referrers of a dangling
    /// target.
    #[must_use]
    pub fn referrers(&self, id: &str) -> Vec<&Arc<Topic>> {
        let graph = self.reference_graph();
        let mut referrers: Vec<_> = graph
            .neighbors_directed(id, Direction::Incoming)
            .filter_map(|source| self.topics.get(source))
            .collect();
        referrers.sort_by(|a, b| a.id().cmp(b.id()));
        referrers
    }

    /// Groups of records whose `parent`/`child` references form a cycle.
    ///
    /// Each group is ordered by id; groups are ordered by their first id.
    #[must_use]
    pub fn hierarchy_cycles(&self) -> Vec<Vec<TopicId>> {
        // Edges point from child to parent.
        let mut hierarchy = DiGraphMap::<&TopicId, ()>::new();
        for topic in self.all() {
            for reference in topic.cross_references() {
                match reference.relationship {
                    Relationship::Parent => {
                        hierarchy.add_edge(topic.id(), &reference.target_id, ());
                    }
                    Relationship::Child => {
                        hierarchy.add_edge(&reference.target_id, topic.id(), ());
                    }
                    _ => {}
                }
            }
        }

        let mut cycles: Vec<Vec<TopicId>> = tarjan_scc(&hierarchy)
            .into_iter()
            .filter(|component| {
                component.len() > 1 || hierarchy.contains_edge(component[0], component[0])
            })
            .map(|component| {
                let mut ids: Vec<_> = component.into_iter().cloned().collect();
                ids.sort();
                ids
            })
            .collect();
        cycles.sort();
        cycles
    }

    /// All non-blocking findings about the corpus, in a stable order.
    #[must_use]
    pub fn warnings(&self) -> Vec<Warning> {
        let dangling = self
            .dangling_references()
            .into_iter()
            .map(Warning::DanglingReference);
        let cycles = self.hierarchy_cycles().into_iter().map(Warning::HierarchyCycle);

        let mut icd: Vec<_> = self
            .all()
            .flat_map(|topic| {
                topic
                    .tags()
                    .systems
                    .iter()
                    .filter_map(|system| system.strip_prefix("ICD-11:"))
                    .map(str::trim)
                    .filter(|code| !ICD11_CODE.is_match(code))
                    .map(|code| Warning::SuspiciousIcdCode {
                        source: topic.id().clone(),
                        code: code.to_string(),
                    })
            })
            .collect();
        icd.sort();

        dangling.chain(cycles).chain(icd).collect()
    }

    /// The cross-reference graph. Edges point from referrer to target.
    fn reference_graph(&self) -> DiGraphMap<&str, Relationship> {
        let mut graph = DiGraphMap::with_capacity(self.len(), self.len() * 2);
        for topic in self.all() {
            graph.add_node(topic.id().as_str());
            for reference in topic.cross_references() {
                graph.add_edge(
                    topic.id().as_str(),
                    reference.target_id.as_str(),
                    reference.relationship,
                );
            }
        }
        graph
    }
}

fn compare(a: &Topic, b: &Topic, key: SortKey) -> Ordering {
    match key {
        SortKey::Id => a.id().cmp(b.id()),
        SortKey::Name => a.name().cmp(b.name()).then_with(|| a.id().cmp(b.id())),
        SortKey::UpdatedAt => b
            .updated_at()
            .cmp(&a.updated_at())
            .then_with(|| a.id().cmp(b.id())),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::domain::{Level, fixtures};

    fn store(topics: impl IntoIterator<Item = Topic>) -> Store {
        Store::from_topics(topics).unwrap()
    }

    #[test]
    fn get_returns_inserted_record() {
        let store = store([fixtures::topic("mammography")]);
        assert_eq!(store.get("mammography").unwrap().name(), "Topic mammography");
    }

    #[test]
    fn get_unknown_id_is_not_found() {
        let store = Store::new();
        assert_eq!(
            store.get("mammography").unwrap_err(),
            LookupError::TopicNotFound("mammography".to_string())
        );
    }

    #[test]
    fn duplicate_ids_are_reported_not_dropped() {
        let error = Store::from_topics([
            fixtures::topic("mammography"),
            fixtures::topic("pap-smear"),
            fixtures::topic("mammography"),
            fixtures::topic("mammography"),
        ])
        .unwrap_err();

        assert_eq!(error.len(), 2);
        assert!(error.iter().all(|e| e.field == "id"
            && e.problem == Problem::DuplicateId("mammography".to_string())));
    }

    #[test]
    fn all_is_restartable() {
        let store = store([fixtures::topic("a"), fixtures::topic("b")]);
        assert_eq!(store.all().count(), 2);
        assert_eq!(store.all().len(), 2);
    }

    #[test]
    fn sorted_orders_by_key() {
        let mut older = fixtures::draft("zoster-vaccine");
        older.name = "A zoster vaccine".to_string();
        let mut newer = fixtures::draft("hpv-vaccine");
        newer.name = "B HPV vaccine".to_string();
        newer.updated_at = "2026-03-01T00:00:00Z".to_string();
        let store = store([
            crate::domain::validate(older).unwrap(),
            crate::domain::validate(newer).unwrap(),
        ]);

        let ids = |key| -> Vec<String> {
            store
                .sorted(key)
                .into_iter()
                .map(|t| t.id().to_string())
                .collect()
        };
        assert_eq!(ids(SortKey::Id), ["hpv-vaccine", "zoster-vaccine"]);
        assert_eq!(ids(SortKey::Name), ["zoster-vaccine", "hpv-vaccine"]);
        assert_eq!(ids(SortKey::UpdatedAt), ["hpv-vaccine", "zoster-vaccine"]);
    }

    #[test]
    fn dangling_references_are_reported() {
        let store = store([
            fixtures::linked_topic(
                "otitis-media",
                &[
                    ("cholesteatoma", Relationship::Related),
                    ("mastoiditis", Relationship::SeeAlso),
                ],
            ),
            fixtures::topic("cholesteatoma"),
        ]);

        assert_eq!(
            store.dangling_references(),
            vec![DanglingReference {
                source: "otitis-media".parse().unwrap(),
                index: 1,
                target: "mastoiditis".parse().unwrap(),
            }]
        );
    }

    #[test]
    fn referrers_follow_incoming_references() {
        let store = store([
            fixtures::linked_topic("otitis-media", &[("cholesteatoma", Relationship::Related)]),
            fixtures::linked_topic("mastoiditis", &[("cholesteatoma", Relationship::SeeAlso)]),
            fixtures::topic("cholesteatoma"),
        ]);

        let referrers: Vec<_> = store
            .referrers("cholesteatoma")
            .into_iter()
            .map(|t| t.id().as_str())
            .collect();
        assert_eq!(referrers, ["mastoiditis", "otitis-media"]);
        assert!(store.referrers("otitis-media").is_empty());
    }

    #[test]
    fn parent_child_cycles_are_detected() {
        let store = store([
            fixtures::linked_topic("ear", &[("middle-ear", Relationship::Child)]),
            fixtures::linked_topic("middle-ear", &[("otitis-media", Relationship::Child)]),
            fixtures::linked_topic("otitis-media", &[("ear", Relationship::Child)]),
            fixtures::linked_topic("hearing", &[("ear", Relationship::Related)]),
        ]);

        let cycles = store.hierarchy_cycles();
        assert_eq!(cycles.len(), 1);
        let ids: Vec<_> = cycles[0].iter().map(TopicId::as_str).collect();
        assert_eq!(ids, ["ear", "middle-ear", "otitis-media"]);
    }

    #[test]
    fn consistent_hierarchy_has_no_cycles() {
        let store = store([
            fixtures::linked_topic("ear", &[("middle-ear", Relationship::Child)]),
            fixtures::linked_topic("middle-ear", &[("ear", Relationship::Parent)]),
        ]);
        assert!(store.hierarchy_cycles().is_empty());
    }

    #[test]
    fn warnings_include_suspicious_icd_codes() {
        let mut draft = fixtures::draft("otitis-media");
        draft.tags.systems = vec!["ICD-11: AB30".to_string(), "ICD-11: A01".to_string()];
        let store = store([crate::domain::validate(draft).unwrap()]);

        assert_eq!(
            store.warnings(),
            vec![Warning::SuspiciousIcdCode {
                source: "otitis-media".parse().unwrap(),
                code: "AB30".to_string(),
            }]
        );
    }

    #[test]
    fn replace_swaps_whole_record() {
        let mut store = store([fixtures::topic("otitis-media")]);
        let reader = Arc::clone(store.get("otitis-media").unwrap());

        let at = reader.updated_at() + Duration::days(1);
        let revised = reader
            .revise(at, |levels| {
                levels.get_mut(Level::MIN).summary = "Revised synopsis.".to_string();
            })
            .unwrap();

        let outcome = store.replace(revised).unwrap();
        assert_eq!(outcome, Revision::Replaced(Arc::clone(&reader)));
        assert_eq!(store.get("otitis-media").unwrap().version().get(), 2);
        // The earlier snapshot is unaffected.
        assert_eq!(reader.level(Level::MIN).summary, "Level 1 synopsis.");
    }

    #[test]
    fn replace_identical_record_is_unchanged() {
        let topic = fixtures::topic("otitis-media");
        let mut store = store([topic.clone()]);
        assert_eq!(store.replace(topic).unwrap(), Revision::Unchanged);
    }

    #[test]
    fn replace_requires_version_bump() {
        let topic = fixtures::topic("otitis-media");
        let mut store = store([topic.clone()]);

        let mut edited = topic;
        edited.name = "Middle ear infection".to_string();

        assert_eq!(
            store.replace(edited).unwrap_err(),
            RevisionError::VersionNotIncreased {
                id: "otitis-media".parse().unwrap(),
                current: 1,
                proposed: 1,
            }
        );
    }

    #[test]
    fn replace_rejects_backdated_revision() {
        let topic = fixtures::topic("otitis-media");
        let mut store = store([topic.clone()]);

        let mut revised = topic.revise(topic.updated_at(), |_| {}).unwrap();
        revised.updated_at = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();

        assert!(matches!(
            store.replace(revised).unwrap_err(),
            RevisionError::UpdatedAtMovedBackwards { .. }
        ));
    }

    #[test]
    fn replace_unknown_record_is_not_found() {
        let mut store = Store::new();
        assert!(matches!(
            store.replace(fixtures::topic("otitis-media")).unwrap_err(),
            RevisionError::NotFound(LookupError::TopicNotFound(_))
        ));
    }
}
