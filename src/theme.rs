//! The page, body, and index templates. Each template is built in and can be
//! replaced by a file of the same name in the project's theme directory.

use gtmpl::{Context, Template, Value};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

const PAGE_TEMPLATE: &str = include_str!("../theme/page.html");
const BODY_TEMPLATE: &str = include_str!("../theme/body.html");
const INDEX_TEMPLATE: &str = include_str!("../theme/index.html");

/// The parsed templates for a run.
pub struct Theme {
    /// Wraps an article body in a full HTML document.
    pub page: Template,

    /// The static article body, used when no generator is configured.
    pub body: Template,

    /// The homepage skeleton, used when `index.html` doesn't exist yet.
    pub index: Template,
}

impl Theme {
    /// The built-in theme.
    pub fn builtin() -> Result<Theme> {
        Theme::load(None)
    }

    /// Loads the theme, preferring `page.html`, `body.html`, and `index.html`
    /// from `directory` where they exist.
    pub fn load(directory: Option<&Path>) -> Result<Theme> {
        Ok(Theme {
            page: load_template(directory, "page.html", PAGE_TEMPLATE)?,
            body: load_template(directory, "body.html", BODY_TEMPLATE)?,
            index: load_template(directory, "index.html", INDEX_TEMPLATE)?,
        })
    }
}

fn load_template(directory: Option<&Path>, name: &str, builtin: &str) -> Result<Template> {
    let override_path = directory.map(|dir| dir.join(name)).filter(|p| p.is_file());
    let contents = match &override_path {
        Some(path) => {
            log::debug!("Using template `{}`", path.display());
            fs::read_to_string(path).map_err(|err| Error::OpenTemplateFile {
                path: path.clone(),
                err,
            })?
        }
        None => builtin.to_owned(),
    };

    let mut template = Template::default();
    template
        .parse(contents)
        .map_err(|err| Error::ParseTemplate {
            name: name.to_owned(),
            message: err.to_string(),
        })?;
    Ok(template)
}

/// Executes `template` against `value` and returns the output text.
pub fn render(template: &Template, value: Value) -> Result<String> {
    let context = Context::from(value).map_err(|err| Error::Execute(err.to_string()))?;
    let mut out: Vec<u8> = Vec::new();
    template
        .execute(&mut out, &context)
        .map_err(|err| Error::Execute(err.to_string()))?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// Represents the result of a template operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading or executing a template.
#[derive(Debug)]
pub enum Error {
    /// Returned for I/O problems while opening template files.
    OpenTemplateFile { path: PathBuf, err: std::io::Error },

    /// Returned for errors parsing template files.
    ParseTemplate { name: String, message: String },

    /// Returned for errors during templating.
    Execute(String),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::OpenTemplateFile { path, err } => {
                write!(f, "Opening template file '{}': {}", path.display(), err)
            }
            Error::ParseTemplate { name, message } => {
                write!(f, "Parsing template '{}': {}", name, message)
            }
            Error::Execute(message) => write!(f, "Executing template: {}", message),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::OpenTemplateFile { path: _, err } => Some(err),
            Error::ParseTemplate { .. } => None,
            Error::Execute(_) => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::value::{object, string};
    use tempfile::TempDir;

    #[test]
    fn test_builtin_body() -> Result<()> {
        let theme = Theme::builtin()?;
        let body = render(
            &theme.body,
            object(vec![
                ("title", string("Best Kettles")),
                ("intro", string("Hand-tested picks.")),
                ("site_name", string("Guides")),
            ]),
        )?;
        assert!(body.contains(r#"<p class="note">Hand-tested picks.</p>"#));
        assert!(body.contains("<h2>What you'll find in Best Kettles</h2>"));
        Ok(())
    }

    #[test]
    fn test_theme_directory_overrides_single_template() -> Result<()> {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("body.html"), "<h2>{{.title}}</h2>").unwrap();

        let theme = Theme::load(Some(dir.path()))?;
        let body = render(&theme.body, object(vec![("title", string("Lamps"))]))?;
        assert_eq!("<h2>Lamps</h2>", body);

        // the other templates fall back to the built-ins
        let index = render(
            &theme.index,
            object(vec![
                ("site_name", string("Guides")),
                ("home_url", string("https://example.org/")),
            ]),
        )?;
        assert!(index.contains("<h1>Guides</h1>"));
        Ok(())
    }

    #[test]
    fn test_bad_template_is_reported() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("page.html"), "{{.title").unwrap();
        match Theme::load(Some(dir.path())) {
            Err(Error::ParseTemplate { name, .. }) => assert_eq!("page.html", name),
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("expected a parse error"),
        }
    }
}
