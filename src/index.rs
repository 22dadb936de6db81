//! Keeps the homepage's list of articles up to date. This is text patching,
//! not HTML parsing: new `<li>` entries go before the first list's closing
//! tag, and a link whose `href` is already present is never added twice.

use crate::body::escape;
use crate::util::write_atomic;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;

/// A link to add to the index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Link {
    /// The link target, relative to the index document.
    pub href: String,

    /// The link text. Escaped on insertion.
    pub text: String,
}

// Either quote style; the value is captured still escaped.
static HREF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\bhref\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid href pattern")
});

impl Link {
    fn to_item(&self) -> String {
        format!(
            r#"<li><a href="{}">{}</a></li>"#,
            escape(&self.href),
            escape(&self.text)
        )
    }
}

/// The escaped value of every `href` attribute in `document`.
fn existing_hrefs(document: &str) -> HashSet<&str> {
    HREF.captures_iter(document)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str())
        .collect()
}

/// Returns `document` with a list item for every link in `links` whose href
/// isn't already in it. Returns `document` unchanged when nothing is new.
///
/// Items are inserted just before the closing tag of the first `<ul>`, past
/// any lists nested inside it. Without a list, a new one is placed before
/// `</body>`, or appended to the end when there is no `</body>` either.
pub fn insert_links(document: &str, links: &[Link]) -> String {
    let existing = existing_hrefs(document);
    let mut seen: HashSet<String> = HashSet::new();
    let new_links: Vec<&Link> = links
        .iter()
        .filter(|link| {
            let href = escape(&link.href);
            !existing.contains(href.as_str()) && seen.insert(href)
        })
        .collect();
    if new_links.is_empty() {
        return document.to_owned();
    }

    let lower = document.to_ascii_lowercase();
    let list_close = first_list_close(&lower);

    match list_close {
        Some(close) => {
            // If the closing tag sits on its own line, insert whole lines
            // above it, indented one step deeper than the tag.
            let line_start = lower[..close].rfind('\n').map(|i| i + 1).unwrap_or(0);
            let indent = &document[line_start..close];
            let mut items = String::new();
            if indent.chars().all(char::is_whitespace) {
                for link in &new_links {
                    items.push_str(indent);
                    items.push_str("  ");
                    items.push_str(&link.to_item());
                    items.push('\n');
                }
                splice(document, line_start, &items)
            } else {
                for link in &new_links {
                    items.push_str(&link.to_item());
                }
                splice(document, close, &items)
            }
        }
        None => {
            let mut block = String::from("<ul>\n");
            for link in &new_links {
                block.push_str("  ");
                block.push_str(&link.to_item());
                block.push('\n');
            }
            block.push_str("</ul>\n");
            match lower.rfind("</body>") {
                Some(body_close) => splice(document, body_close, &block),
                None => {
                    let mut out = document.to_owned();
                    if !out.is_empty() && !out.ends_with('\n') {
                        out.push('\n');
                    }
                    out.push_str(&block);
                    out
                }
            }
        }
    }
}

/// Finds the `</ul>` matching the first `<ul` in `lower`. An unbalanced list
/// falls back to the first `</ul>` after its opening tag.
fn first_list_close(lower: &str) -> Option<usize> {
    let start = find_list_open(lower, 0)?;
    let first_close = lower[start..].find("</ul>").map(|i| start + i)?;
    let mut depth = 0usize;
    let mut at = start;
    while let Some(close) = lower[at..].find("</ul>").map(|i| at + i) {
        match find_list_open(lower, at) {
            Some(open) if open < close => {
                depth += 1;
                at = open + 3;
            }
            _ => {
                depth -= 1;
                if depth == 0 {
                    return Some(close);
                }
                at = close + 5;
            }
        }
    }
    Some(first_close)
}

/// Finds the next `<ul` opening tag at or after `from`, skipping tags that
/// merely start with `ul`.
fn find_list_open(lower: &str, from: usize) -> Option<usize> {
    let mut at = from;
    while let Some(i) = lower[at..].find("<ul").map(|i| at + i) {
        match lower.as_bytes().get(i + 3) {
            Some(b'>') | Some(b'/') => return Some(i),
            Some(c) if c.is_ascii_whitespace() => return Some(i),
            _ => at = i + 3,
        }
    }
    None
}

fn splice(document: &str, at: usize, insert: &str) -> String {
    let mut out = String::with_capacity(document.len() + insert.len());
    out.push_str(&document[..at]);
    out.push_str(insert);
    out.push_str(&document[at..]);
    out
}

/// Applies [`insert_links`] to the file at `path`, starting from `seed` when
/// the file doesn't exist. The file is only written when its text changes.
/// Returns whether it was written.
pub fn update_index_file(
    path: &Path,
    links: &[Link],
    seed: impl FnOnce() -> String,
) -> io::Result<bool> {
    if links.is_empty() {
        return Ok(false);
    }

    let existing = match fs::read_to_string(path) {
        Ok(text) => Some(text),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => return Err(e),
    };
    let current = match &existing {
        Some(text) => text.clone(),
        None => {
            log::info!("Creating index `{}`", path.display());
            seed()
        }
    };

    let updated = insert_links(&current, links);
    if existing.as_ref() == Some(&updated) {
        log::debug!("Index `{}` already links every page", path.display());
        return Ok(false);
    }
    write_atomic(path, &updated)?;
    Ok(true)
}

#[cfg(test)]
mod test {
    use super::*;
    use tempfile::TempDir;

    fn link(href: &str, text: &str) -> Link {
        Link {
            href: href.to_owned(),
            text: text.to_owned(),
        }
    }

    const DOCUMENT: &str = "<html>\n<body>\n  <h1>Guides</h1>\n  <ul>\n    <li><a href=\"articles/a.html\">A</a></li>\n  </ul>\n</body>\n</html>\n";

    #[test]
    fn test_insert_before_list_close() {
        let updated = insert_links(DOCUMENT, &[link("articles/b.html", "B & C")]);
        assert_eq!(
            "<html>\n<body>\n  <h1>Guides</h1>\n  <ul>\n    <li><a href=\"articles/a.html\">A</a></li>\n    <li><a href=\"articles/b.html\">B &amp; C</a></li>\n  </ul>\n</body>\n</html>\n",
            updated
        );
    }

    #[test]
    fn test_insert_is_idempotent() {
        let links = [link("articles/b.html", "B"), link("articles/c.html", "C")];
        let once = insert_links(DOCUMENT, &links);
        let twice = insert_links(&once, &links);
        assert_eq!(once, twice);
        assert_eq!(1, once.matches("articles/b.html").count());
        assert_eq!(1, once.matches("articles/c.html").count());
    }

    #[test]
    fn test_existing_href_is_skipped() {
        assert_eq!(DOCUMENT, insert_links(DOCUMENT, &[link("articles/a.html", "Renamed")]));
    }

    #[test]
    fn test_duplicates_within_batch() {
        let updated = insert_links(
            DOCUMENT,
            &[link("articles/b.html", "B"), link("articles/b.html", "B again")],
        );
        assert_eq!(1, updated.matches("articles/b.html").count());
        assert!(!updated.contains("B again"));
    }

    #[test]
    fn test_single_quoted_href_is_skipped() {
        let document = "<ul><li><a href='articles/b.html'>B</a></li></ul>";
        let updated = insert_links(document, &[link("articles/b.html", "B")]);
        assert_eq!(document, updated);
        assert_eq!(1, updated.matches("articles/b.html").count());
    }

    #[test]
    fn test_escaped_href_is_skipped() {
        let document = "<ul>\n  <li><a HREF = \"guide.html?a=1&amp;b=2\">G</a></li>\n</ul>\n";
        assert_eq!(document, insert_links(document, &[link("guide.html?a=1&b=2", "G")]));
    }

    #[test]
    fn test_nested_list_is_passed_over() {
        let document = "<body>\n<ul>\n  <li>Guides\n    <ul>\n      <li>inner</li>\n    </ul>\n  </li>\n</ul>\n</body>\n";
        let updated = insert_links(document, &[link("articles/b.html", "B")]);
        assert_eq!(
            "<body>\n<ul>\n  <li>Guides\n    <ul>\n      <li>inner</li>\n    </ul>\n  </li>\n  <li><a href=\"articles/b.html\">B</a></li>\n</ul>\n</body>\n",
            updated
        );
    }

    #[test]
    fn test_unclosed_nested_list() {
        let updated = insert_links("<ul><ul></ul>", &[link("b.html", "B")]);
        assert_eq!("<ul><ul><li><a href=\"b.html\">B</a></li></ul>", updated);
    }

    #[test]
    fn test_ul_prefixed_tag_is_not_a_list() {
        let updated = insert_links("<body><ulist></ulist></body>", &[link("b.html", "B")]);
        assert_eq!(
            "<body><ulist></ulist><ul>\n  <li><a href=\"b.html\">B</a></li>\n</ul>\n</body>",
            updated
        );
    }

    #[test]
    fn test_inline_list() {
        let updated = insert_links("<body><ul><li>x</li></ul></body>", &[link("b.html", "B")]);
        assert_eq!(
            "<body><ul><li>x</li><li><a href=\"b.html\">B</a></li></ul></body>",
            updated
        );
    }

    #[test]
    fn test_only_first_list_is_touched() {
        let document = "<UL class=\"guides\">\n</UL>\n<ul>\n</ul>\n";
        let updated = insert_links(document, &[link("b.html", "B")]);
        assert_eq!(
            "<UL class=\"guides\">\n  <li><a href=\"b.html\">B</a></li>\n</UL>\n<ul>\n</ul>\n",
            updated
        );
    }

    #[test]
    fn test_no_list_inserts_before_body_close() {
        let updated = insert_links("<body>\n<h1>Hi</h1>\n</body>\n", &[link("b.html", "B")]);
        assert_eq!(
            "<body>\n<h1>Hi</h1>\n<ul>\n  <li><a href=\"b.html\">B</a></li>\n</ul>\n</body>\n",
            updated
        );
    }

    #[test]
    fn test_no_body_appends() {
        let updated = insert_links("<h1>Hi</h1>", &[link("b.html", "B")]);
        assert_eq!(
            "<h1>Hi</h1>\n<ul>\n  <li><a href=\"b.html\">B</a></li>\n</ul>\n",
            updated
        );
    }

    #[test]
    fn test_update_index_file_seeds_missing_document() -> io::Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("index.html");
        let written = update_index_file(&path, &[link("articles/b.html", "B")], || {
            String::from("<body>\n  <ul>\n  </ul>\n</body>\n")
        })?;
        assert!(written);
        assert_eq!(
            "<body>\n  <ul>\n    <li><a href=\"articles/b.html\">B</a></li>\n  </ul>\n</body>\n",
            fs::read_to_string(&path)?
        );
        Ok(())
    }

    #[test]
    fn test_update_index_file_unchanged() -> io::Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("index.html");
        fs::write(&path, DOCUMENT)?;
        let written = update_index_file(&path, &[link("articles/a.html", "A")], || {
            panic!("the index exists")
        })?;
        assert!(!written);
        assert_eq!(DOCUMENT, fs::read_to_string(&path)?);
        Ok(())
    }

    #[test]
    fn test_update_index_file_no_links() -> io::Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("index.html");
        assert!(!update_index_file(&path, &[], String::new)?);
        assert!(!path.exists());
        Ok(())
    }
}
