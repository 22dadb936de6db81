//! Rewrites product placeholders (`ASIN:B000123456`) in article bodies into
//! outbound affiliate links.

use pulldown_cmark::escape::escape_html;
use regex::{Captures, Regex};
use std::borrow::Cow;
use url::Url;

/// A placeholder is the literal `ASIN:` followed by exactly ten uppercase
/// alphanumerics, standing alone as a word.
const PLACEHOLDER_PATTERN: &str = r"\bASIN:([A-Z0-9]{10})\b";

const LINK_TEXT: &str = "Check price on Amazon";

/// Replaces placeholders with affiliate link markup.
pub struct Linker {
    pattern: Regex,
    store_url: Url,
    associate_tag: String,
}

impl Linker {
    /// `store_url` is the product-page prefix the code is appended to (e.g.
    /// `https://www.amazon.com/dp/`). An empty `associate_tag` produces plain
    /// product links.
    pub fn new(store_url: Url, associate_tag: &str) -> Result<Linker, regex::Error> {
        Ok(Linker {
            pattern: Regex::new(PLACEHOLDER_PATTERN)?,
            store_url,
            associate_tag: associate_tag.to_owned(),
        })
    }

    /// The outbound URL for a product code.
    pub fn product_url(&self, code: &str) -> Url {
        let mut url = self.store_url.clone();
        let path = format!("{}/{}", url.path().trim_end_matches('/'), code);
        url.set_path(&path);
        url.set_query(None);
        if !self.associate_tag.is_empty() {
            url.query_pairs_mut()
                .append_pair("tag", &self.associate_tag);
        }
        url
    }

    /// Rewrites every placeholder in `body`. Everything else, including
    /// malformed placeholders, is left as it was.
    pub fn rewrite<'b>(&self, body: &'b str) -> Cow<'b, str> {
        self.pattern.replace_all(body, |caps: &Captures<'_>| {
            let mut href = String::new();
            let _ = escape_html(&mut href, self.product_url(&caps[1]).as_str());
            format!(
                r#"<a class="buy-button" href="{}" rel="nofollow sponsored noopener" target="_blank">{}</a>"#,
                href, LINK_TEXT
            )
        })
    }
}
