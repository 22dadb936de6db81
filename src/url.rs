//! Builds the public URLs of the site from the configured `base_url`.

use url::{ParseError, Url};

/// The directory (relative to the site root) holding article pages.
pub const ARTICLES_PATH: &str = "articles";

const HTML_EXTENSION: &str = ".html";
const SITEMAP_FILE: &str = "sitemap.xml";

/// The URL layout of the site.
#[derive(Clone, Debug)]
pub struct SiteUrls {
    root: Url,
}

impl SiteUrls {
    /// Parses `base_url`. The configured value is documented as having no
    /// trailing slash, but one is tolerated. Internally the root always ends
    /// in `/` so that [`Url::join`] appends rather than replaces the last
    /// path segment.
    pub fn parse(base_url: &str) -> Result<SiteUrls> {
        let root = Url::parse(&format!("{}/", base_url.trim_end_matches('/')))?;
        if root.cannot_be_a_base() {
            return Err(ParseError::RelativeUrlWithoutBase);
        }
        Ok(SiteUrls { root })
    }

    /// The homepage URL, e.g. `https://example.org/`.
    pub fn home(&self) -> &Url {
        &self.root
    }

    /// The canonical URL for the page of `slug`.
    pub fn page(&self, slug: &str) -> Result<Url> {
        self.root.join(&page_href(slug))
    }

    pub fn sitemap(&self) -> Result<Url> {
        self.root.join(SITEMAP_FILE)
    }
}

/// The path of a page relative to the homepage, used for index links.
pub fn page_href(slug: &str) -> String {
    format!("{}/{}{}", ARTICLES_PATH, slug, HTML_EXTENSION)
}

type Result<T> = std::result::Result<T, ParseError>;
