//! Exports the [`build_site`] function which stitches together the steps of a
//! run: reading topics ([`crate::topic`]), filtering out what's already
//! published ([`crate::ledger`]), producing and linking article bodies
//! ([`crate::body`], [`crate::affiliate`]), writing pages
//! ([`crate::write`]), updating the homepage ([`crate::index`]), and
//! regenerating the sitemap ([`crate::sitemap`]).

use crate::affiliate::Linker;
use crate::body::BodySource;
use crate::config::Config;
use crate::generate::{ChatClient, ChatSettings};
use crate::index::{update_index_file, Link};
use crate::ledger::Ledger;
use crate::sitemap::write_sitemap;
use crate::theme::{self, Theme};
use crate::topic::{read_topics, Topic};
use crate::url::page_href;
use crate::value::{from_url, object, string};
use crate::write::{Article, Writer};
use chrono::Utc;
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

/// How article bodies should be produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Use the remote generator when the configuration has one.
    Auto,

    /// Always use the static body template.
    Offline,
}

/// What a run did.
#[derive(Debug, Default)]
pub struct Report {
    /// Pages written this run, in topic order.
    pub written: Vec<PathBuf>,

    /// Distinct topics skipped because their page already exists. Repeated
    /// lines for the same slug count once.
    pub already_published: usize,

    /// Topics that failed, with the reason.
    pub failed: Vec<(String, String)>,
}

/// Builds the site from a [`Config`]. Picks the body source according to
/// `strategy` and then calls [`run`].
///
/// A configured generator whose API key variable is unset is an error, not a
/// fallback to the template.
pub fn build_site(config: &Config, strategy: Strategy) -> Result<Report> {
    let theme = Theme::load(Some(&config.theme_directory))?;
    let source = match (&config.generator, strategy) {
        (Some(generator), Strategy::Auto) => {
            let api_key = std::env::var(&generator.api_key_env)
                .map_err(|_| Error::MissingApiKey(generator.api_key_env.clone()))?;
            BodySource::Remote {
                client: Box::new(ChatClient::new(ChatSettings {
                    endpoint: generator.endpoint.clone(),
                    model: generator.model.clone(),
                    api_key,
                    timeout: generator.timeout,
                })?),
                picks: generator.picks,
            }
        }
        _ => BodySource::Template {
            template: &theme.body,
            intro: &config.intro,
            site_name: &config.site_name,
        },
    };
    run(config, &theme, &source)
}

/// Runs one batch with the given templates and body source.
pub fn run(config: &Config, theme: &Theme, source: &BodySource<'_>) -> Result<Report> {
    let topics = read_topics(&config.topics_file).map_err(|err| Error::ReadTopics {
        path: config.topics_file.clone(),
        err,
    })?;
    let mut ledger = Ledger::scan(&config.articles_directory)?;

    let pending = ledger.pending(&topics);
    let mut report = Report {
        already_published: topics
            .iter()
            .map(|t| t.slug.as_str())
            .filter(|slug| ledger.contains(slug))
            .collect::<HashSet<_>>()
            .len(),
        ..Report::default()
    };
    let batch: Vec<&Topic> = pending.into_iter().take(config.articles_per_run).collect();
    if batch.is_empty() {
        log::info!(
            "No new topics to publish; {} pages already published",
            ledger.len()
        );
    } else {
        log::info!(
            "Publishing {} of {} topics using the {} body source",
            batch.len(),
            topics.len(),
            source.describe()
        );
    }

    let linker = Linker::new(config.store_url.clone(), &config.associate_tag)?;
    let generated = Utc::now().format("%Y-%m-%d %H:%M UTC").to_string();
    let writer = Writer {
        template: &theme.page,
        site_name: &config.site_name,
        description: &config.intro,
        urls: &config.urls,
        output_directory: &config.articles_directory,
        home_href: "../index.html",
        generated: &generated,
    };

    for topic in batch {
        let title = config.article_title(&topic.title);
        let result = source
            .body(&title)
            .map_err(|e| e.to_string())
            .and_then(|body| {
                let article = Article {
                    slug: topic.slug.clone(),
                    title: title.clone(),
                    body: linker.rewrite(&body).into_owned(),
                };
                writer.write_article(&article).map_err(|e| e.to_string())
            });
        match result {
            Ok(path) => {
                log::info!("Wrote `{}`", path.display());
                ledger.insert(&topic.slug);
                report.written.push(path);
            }
            Err(reason) => {
                log::error!("Skipping topic `{}`: {}", topic.title, reason);
                report.failed.push((topic.title.clone(), reason));
            }
        }
    }

    // Offer every published topic; links already in the index are skipped.
    let mut linked: HashSet<&str> = HashSet::new();
    let links: Vec<Link> = topics
        .iter()
        .filter(|t| ledger.contains(&t.slug) && linked.insert(t.slug.as_str()))
        .map(|t| Link {
            href: page_href(&t.slug),
            text: config.article_title(&t.title),
        })
        .collect();
    let index_written = update_index_file(&config.index_file, &links, || {
        theme::render(
            &theme.index,
            object(vec![
                ("site_name", string(crate::body::escape(&config.site_name))),
                ("home_url", from_url(config.urls.home())),
            ]),
        )
        .unwrap_or_else(|e| {
            log::warn!("Falling back to a bare index document: {}", e);
            String::from("<!DOCTYPE html>\n<html>\n<body>\n<ul>\n</ul>\n</body>\n</html>\n")
        })
    })
    .map_err(|err| Error::UpdateIndex {
        path: config.index_file.clone(),
        err,
    })?;
    if index_written {
        log::info!("Updated `{}`", config.index_file.display());
    }

    let mut urls = vec![config.urls.home().clone()];
    for slug in ledger.slugs() {
        urls.push(config.urls.page(slug)?);
    }
    write_sitemap(
        &config.project_directory,
        &urls,
        &config.urls.sitemap()?,
        Utc::now().naive_utc().date(),
    )
    .map_err(Error::Sitemap)?;

    Ok(report)
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for a run. These abort the whole batch; failures confined
/// to a single topic are recorded in the [`Report`] instead.
#[derive(Debug)]
pub enum Error {
    /// Returned when the topics file can't be read.
    ReadTopics { path: PathBuf, err: std::io::Error },

    /// Returned when the articles directory can't be scanned.
    Scan(walkdir::Error),

    /// Returned for errors loading the theme templates.
    Theme(theme::Error),

    /// Returned when a remote generator is configured but its API key
    /// environment variable is unset.
    MissingApiKey(String),

    /// Returned when the HTTP client can't be built.
    Client(crate::generate::Error),

    /// Returned when the placeholder pattern fails to compile.
    Pattern(regex::Error),

    /// Returned for I/O problems while updating the index document.
    UpdateIndex { path: PathBuf, err: std::io::Error },

    /// Returned for problems writing the sitemap or robots file.
    Sitemap(crate::sitemap::Error),

    /// Returned when a page URL can't be built.
    UrlParse(url::ParseError),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ReadTopics { path, err } => {
                write!(f, "Reading topics file '{}': {}", path.display(), err)
            }
            Error::Scan(err) => write!(f, "Scanning published articles: {}", err),
            Error::Theme(err) => err.fmt(f),
            Error::MissingApiKey(var) => write!(
                f,
                "A generator is configured but the `{}` environment variable is not set",
                var
            ),
            Error::Client(err) => err.fmt(f),
            Error::Pattern(err) => err.fmt(f),
            Error::UpdateIndex { path, err } => {
                write!(f, "Updating index '{}': {}", path.display(), err)
            }
            Error::Sitemap(err) => write!(f, "Writing sitemap: {}", err),
            Error::UrlParse(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ReadTopics { path: _, err } => Some(err),
            Error::Scan(err) => Some(err),
            Error::Theme(err) => Some(err),
            Error::MissingApiKey(_) => None,
            Error::Client(err) => Some(err),
            Error::Pattern(err) => Some(err),
            Error::UpdateIndex { path: _, err } => Some(err),
            Error::Sitemap(err) => Some(err),
            Error::UrlParse(err) => Some(err),
        }
    }
}

impl From<walkdir::Error> for Error {
    /// Converts [`walkdir::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: walkdir::Error) -> Error {
        Error::Scan(err)
    }
}

impl From<theme::Error> for Error {
    /// Converts [`theme::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: theme::Error) -> Error {
        Error::Theme(err)
    }
}

impl From<crate::generate::Error> for Error {
    fn from(err: crate::generate::Error) -> Error {
        Error::Client(err)
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Error {
        Error::Pattern(err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}
