//! The publication ledger: which slugs already have a page on disk. There is
//! no separate record of what has been generated; an `articles/<slug>.html`
//! file is the record.

use crate::topic::Topic;
use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use walkdir::WalkDir;

const HTML_EXTENSION: &str = "html";

/// The set of slugs that already have a published page.
#[derive(Debug, Default)]
pub struct Ledger {
    published: BTreeSet<String>,
}

impl Ledger {
    /// Scans `articles_directory` (non-recursively) and collects the stem of
    /// every `.html` file. A missing directory yields an empty ledger.
    pub fn scan(articles_directory: &Path) -> Result<Ledger, walkdir::Error> {
        let mut ledger = Ledger::default();
        if !articles_directory.is_dir() {
            log::debug!(
                "Articles directory `{}` does not exist yet",
                articles_directory.display()
            );
            return Ok(ledger);
        }

        for result in WalkDir::new(articles_directory).min_depth(1).max_depth(1) {
            let entry = result?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(HTML_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ledger.published.insert(stem.to_owned());
            }
        }
        Ok(ledger)
    }

    /// Returns true if a page for `slug` already exists.
    pub fn contains(&self, slug: &str) -> bool {
        self.published.contains(slug)
    }

    /// Records a newly published slug.
    pub fn insert(&mut self, slug: &str) {
        self.published.insert(slug.to_owned());
    }

    /// The published slugs in sorted order.
    pub fn slugs(&self) -> impl Iterator<Item = &str> {
        self.published.iter().map(String::as_str)
    }

    /// The number of published pages.
    pub fn len(&self) -> usize {
        self.published.len()
    }

    pub fn is_empty(&self) -> bool {
        self.published.is_empty()
    }

    /// Filters `topics` down to those that still need a page, in their
    /// original order. When several topics share a slug only the first one is
    /// kept.
    pub fn pending<'a>(&self, topics: &'a [Topic]) -> Vec<&'a Topic> {
        let mut seen: HashSet<&str> = HashSet::new();
        topics
            .iter()
            .filter(|topic| !self.contains(&topic.slug))
            .filter(|topic| seen.insert(topic.slug.as_str()))
            .collect()
    }
}
