use crate::body::escape;
use crate::theme;
use crate::url::SiteUrls;
use crate::util::write_atomic;
use crate::value::{self, object, string};
use gtmpl::Template;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

const HTML_EXTENSION: &str = "html";

/// One page about to be written.
#[derive(Clone, Debug)]
pub struct Article {
    pub slug: String,

    /// The display title. May differ from the topic text when a title prefix
    /// is configured.
    pub title: String,

    /// The HTML body fragment, placeholders already rewritten.
    pub body: String,
}

/// Responsible for templating article pages and writing them to disk.
pub struct Writer<'a> {
    /// The template for article pages.
    pub template: &'a Template,

    /// Shown in the page `<title>` after the article title.
    pub site_name: &'a str,

    /// Used for the `description` meta tag.
    pub description: &'a str,

    /// Used to build each page's canonical URL.
    pub urls: &'a SiteUrls,

    /// The directory in which article HTML files are written, one
    /// `<slug>.html` per article.
    pub output_directory: &'a Path,

    /// The link back to the homepage, relative to the article.
    pub home_href: &'a str,

    /// Shown on each page as its generation time.
    pub generated: &'a str,
}

impl Writer<'_> {
    /// The output file for `slug`.
    pub fn file_path(&self, slug: &str) -> PathBuf {
        self.output_directory
            .join(slug)
            .with_extension(HTML_EXTENSION)
    }

    /// Renders the full HTML document for `article`.
    pub fn render(&self, article: &Article) -> Result<String> {
        let canonical = self.urls.page(&article.slug)?;
        Ok(theme::render(
            self.template,
            object(vec![
                ("title", string(escape(&article.title))),
                ("site_name", string(escape(self.site_name))),
                ("description", string(escape(self.description))),
                ("canonical_url", value::from_url(&canonical)),
                ("generated", string(self.generated)),
                ("home_href", string(self.home_href)),
                ("body", string(article.body.as_str())),
            ]),
        )?)
    }

    /// Renders `article` and writes it to `<output_directory>/<slug>.html`,
    /// replacing any existing file. Returns the path written.
    pub fn write_article(&self, article: &Article) -> Result<PathBuf> {
        let html = self.render(article)?;
        std::fs::create_dir_all(self.output_directory)?;
        let path = self.file_path(&article.slug);
        write_atomic(&path, &html)?;
        Ok(path)
    }
}

/// The result of a fallible page-writing operation.
type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug)]
pub enum Error {
    /// An error during templating.
    Template(theme::Error),

    /// An error building the canonical URL.
    UrlParse(url::ParseError),

    /// An error writing the output file.
    Io(io::Error),
}

impl From<io::Error> for Error {
    /// Converts an [`io::Error`] into an [`Error`]. This allows us to use the
    /// `?` operator for fallible I/O operations.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<theme::Error> for Error {
    /// Converts a [`theme::Error`] into an [`Error`]. This allows us to use
    /// the `?` operator for fallible template operations.
    fn from(err: theme::Error) -> Error {
        Error::Template(err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Template(err) => err.fmt(f),
            Error::UrlParse(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Template(err) => Some(err),
            Error::UrlParse(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}
