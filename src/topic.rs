//! Defines the [`Topic`] type and the slug encoding that turns a topic's free
//! text into a file-system and URL identifier.

use std::fs;
use std::io;
use std::path::Path;

/// The maximum length of a slug, in characters.
pub const MAX_SLUG_LEN: usize = 80;

/// Encodes free text as a slug: lowercase ASCII letters, digits, and single
/// hyphens, with no leading or trailing hyphen and at most [`MAX_SLUG_LEN`]
/// characters. Non-ASCII letters are transliterated. An empty result means the
/// text has nothing usable in it.
pub fn encode_slug(text: &str) -> String {
    let mut slug = slug::slugify(text);
    if slug.len() > MAX_SLUG_LEN {
        // `slugify` output is pure ASCII, so any byte offset is a char
        // boundary.
        slug.truncate(MAX_SLUG_LEN);
        let trimmed = slug.trim_end_matches('-').len();
        slug.truncate(trimmed);
    }
    slug
}

/// A single entry from the topics file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Topic {
    /// The trimmed line from the topics file.
    pub title: String,

    /// The slug derived from `title`. Never empty.
    pub slug: String,
}

impl Topic {
    /// Builds a topic from a raw line. Returns `None` for blank lines and for
    /// lines that produce an empty slug.
    pub fn parse(line: &str) -> Option<Topic> {
        let title = line.trim();
        if title.is_empty() {
            return None;
        }
        let slug = encode_slug(title);
        if slug.is_empty() {
            log::warn!("Skipping topic `{}`: it has no usable characters", title);
            return None;
        }
        Some(Topic {
            title: title.to_owned(),
            slug,
        })
    }
}

/// Parses newline-delimited topics. Duplicates are kept; they are collapsed
/// later by slug (see [`crate::ledger::Ledger::pending`]).
pub fn parse_topics(input: &str) -> Vec<Topic> {
    input.lines().filter_map(Topic::parse).collect()
}

/// Reads and parses the topics file at `path`.
pub fn read_topics(path: &Path) -> io::Result<Vec<Topic>> {
    Ok(parse_topics(&fs::read_to_string(path)?))
}
