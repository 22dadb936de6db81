//! Loads the project configuration from `config.json`. All paths in a
//! [`Config`] are resolved against the directory holding that file.

use crate::url::{SiteUrls, ARTICLES_PATH};
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub const CONFIG_FILE: &str = "config.json";
pub const TOPICS_FILE: &str = "topics.txt";
pub const INDEX_FILE: &str = "index.html";
pub const THEME_DIRECTORY: &str = "theme";

#[derive(Deserialize)]
struct ArticlesPerRun(usize);
impl Default for ArticlesPerRun {
    fn default() -> Self {
        ArticlesPerRun(1)
    }
}

#[derive(Deserialize)]
struct Timeout(u64);
impl Default for Timeout {
    fn default() -> Self {
        Timeout(60)
    }
}

#[derive(Deserialize)]
struct Picks(usize);
impl Default for Picks {
    fn default() -> Self {
        Picks(5)
    }
}

fn default_site_name() -> String {
    String::from("True Buyers Guide")
}

fn default_base_url() -> String {
    String::from("https://example.com")
}

fn default_intro() -> String {
    String::from("Starter draft generated automatically.")
}

fn default_store_url() -> String {
    String::from("https://www.amazon.com/dp/")
}

fn default_endpoint() -> String {
    String::from("https://api.openai.com/v1/chat/completions")
}

fn default_model() -> String {
    String::from("gpt-4o-mini")
}

fn default_api_key_env() -> String {
    String::from("OPENAI_API_KEY")
}

/// The on-disk shape of `config.json`.
#[derive(Deserialize)]
struct Project {
    #[serde(default = "default_site_name")]
    site_name: String,

    #[serde(default = "default_base_url")]
    base_url: String,

    #[serde(default)]
    associate_tag: String,

    #[serde(default)]
    articles_per_run: ArticlesPerRun,

    #[serde(default = "default_intro")]
    intro: String,

    #[serde(default)]
    site_title_prefix: Option<String>,

    #[serde(default = "default_store_url")]
    store_url: String,

    #[serde(default)]
    generator: Option<Generator>,
}

#[derive(Deserialize)]
struct Generator {
    #[serde(default = "default_endpoint")]
    endpoint: String,

    #[serde(default = "default_model")]
    model: String,

    #[serde(default = "default_api_key_env")]
    api_key_env: String,

    #[serde(default)]
    timeout_secs: Timeout,

    #[serde(default)]
    picks: Picks,
}

/// Settings for remote article generation.
#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    pub endpoint: String,
    pub model: String,

    /// The environment variable holding the API key.
    pub api_key_env: String,

    pub timeout: Duration,

    /// The number of product picks requested per article.
    pub picks: usize,
}

/// The resolved configuration for a run.
#[derive(Debug)]
pub struct Config {
    pub project_directory: PathBuf,
    pub topics_file: PathBuf,
    pub articles_directory: PathBuf,
    pub index_file: PathBuf,
    pub theme_directory: PathBuf,

    pub site_name: String,
    pub urls: SiteUrls,
    pub associate_tag: String,
    pub store_url: Url,
    pub articles_per_run: usize,
    pub intro: String,
    pub title_prefix: Option<String>,
    pub generator: Option<GeneratorConfig>,
}

impl Config {
    /// Looks for [`CONFIG_FILE`] in `dir` and then in each of its ancestors.
    pub fn from_directory(dir: &Path) -> Result<Config> {
        let mut current = Some(dir);
        while let Some(dir) = current {
            let path = dir.join(CONFIG_FILE);
            if path.is_file() {
                return Config::from_project_file(&path)
                    .with_context(|| format!("Loading configuration `{}`", path.display()));
            }
            current = dir.parent();
        }
        Err(anyhow!(
            "Could not find `{}` in `{}` or any parent directory",
            CONFIG_FILE,
            dir.display()
        ))
    }

    pub fn from_project_file(path: &Path) -> Result<Config> {
        use crate::util::open;
        let project: Project = serde_json::from_reader(open(path, "config")?)?;
        match path.parent() {
            None => Err(anyhow!(
                "Can't get parent directory for provided config file path '{:?}'",
                path
            )),
            Some(project_directory) => Config::from_project(project, project_directory),
        }
    }

    /// Parses a configuration from JSON text, resolving paths against
    /// `project_directory`.
    pub fn from_json(json: &str, project_directory: &Path) -> Result<Config> {
        Config::from_project(serde_json::from_str(json)?, project_directory)
    }

    fn from_project(project: Project, project_directory: &Path) -> Result<Config> {
        let urls = SiteUrls::parse(&project.base_url)
            .map_err(|e| anyhow!("Invalid base_url `{}`: {}", project.base_url, e))?;
        let store_url = Url::parse(&project.store_url)
            .map_err(|e| anyhow!("Invalid store_url `{}`: {}", project.store_url, e))?;

        Ok(Config {
            project_directory: project_directory.to_owned(),
            topics_file: project_directory.join(TOPICS_FILE),
            articles_directory: project_directory.join(ARTICLES_PATH),
            index_file: project_directory.join(INDEX_FILE),
            theme_directory: project_directory.join(THEME_DIRECTORY),
            site_name: project.site_name,
            urls,
            associate_tag: project.associate_tag,
            store_url,
            articles_per_run: project.articles_per_run.0,
            intro: project.intro,
            title_prefix: project
                .site_title_prefix
                .map(|p| p.trim().to_owned())
                .filter(|p| !p.is_empty()),
            generator: project.generator.map(|g| GeneratorConfig {
                endpoint: g.endpoint,
                model: g.model,
                api_key_env: g.api_key_env,
                timeout: Duration::from_secs(g.timeout_secs.0),
                picks: g.picks.0,
            }),
        })
    }

    /// The display title for a topic: the topic text, after the configured
    /// prefix if there is one.
    pub fn article_title(&self, topic: &str) -> String {
        match &self.title_prefix {
            Some(prefix) => format!("{} {}", prefix, topic),
            None => topic.to_owned(),
        }
    }
}
