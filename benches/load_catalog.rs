//! This bench test simulates loading and validating a large catalog of
//! cross-referenced topic records.

#![allow(missing_docs)]

use std::{fmt::Write as _, fs, path::Path};

use criterion::{Criterion, criterion_group, criterion_main};
use edcat::Library;
use tempfile::TempDir;

const TOPICS: usize = 500;

fn record(i: usize) -> String {
    let mut levels = String::new();
    for level in 1..=5 {
        write!(
            levels,
            "  {level}:\n    level: {level}\n    summary: Synopsis {level} of topic {i}.\n    \
             explanation: Explanation {level} of topic {i}.\n    keyTerms:\n      - term: term {i}\n        \
             definition: definition {i}\n    analogies: []\n"
        )
        .unwrap();
    }

    format!(
        "id: topic-{i}\ntype: concept\nname: Topic {i}\nalternateNames: []\nlevels:\n{levels}\
         media: []\ncitations: []\ncrossReferences:\n  - targetId: topic-{next}\n    targetType: concept\n    \
         relationship: related\n    label: Next topic\ntags:\n  systems: []\n  topics: []\n  keywords: []\n  \
         clinicalRelevance: medium\n  examRelevance:\n    usmle: false\n    nbme: false\n    shelf: []\n\
         createdAt: 2026-01-30T00:00:00Z\nupdatedAt: 2026-01-30T00:00:00Z\nversion: 1\nstatus: published\n",
        next = (i + 1) % TOPICS
    )
}

/// Writes a catalog of interlinked records, ten per directory.
fn preseed_catalog(root: &Path) {
    for i in 0..TOPICS {
        let dir = root.join(format!("group-{}", i / 10));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(format!("topic-{i}.yaml")), record(i)).unwrap();
    }

    let members: Vec<_> = (0..TOPICS).map(|i| format!("\"topic-{i}\"")).collect();
    fs::write(
        root.join("manifest.toml"),
        format!(
            "_version = \"1\"\n[categories]\nall = [{}]\n",
            members.join(", ")
        ),
    )
    .unwrap();
}

fn load_catalog(c: &mut Criterion) {
    let tmp_dir = TempDir::new().unwrap();
    preseed_catalog(tmp_dir.path());

    c.bench_function("load catalog", |b| {
        b.iter(|| {
            let library = Library::new(tmp_dir.path().to_path_buf()).load().unwrap();
            assert_eq!(library.store().len(), TOPICS);
        });
    });
}

criterion_group!(benches, load_catalog);
criterion_main!(benches);
