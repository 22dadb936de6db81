//! Produces the HTML body fragment of an article, either from the static body
//! template or from a remote [`Completion`].

use crate::generate::{self, clean_response, prompt, Completion};
use crate::theme;
use crate::value::{object, string};
use gtmpl::Template;
use std::fmt;

/// Where article bodies come from.
pub enum BodySource<'a> {
    /// Renders the theme's body template with the article title and intro.
    Template {
        template: &'a Template,
        intro: &'a str,
        site_name: &'a str,
    },

    /// Asks a completion service for the article.
    Remote {
        client: Box<dyn Completion + 'a>,
        picks: usize,
    },
}

impl BodySource<'_> {
    /// Returns the body fragment (no document wrapper) for an article titled
    /// `title`.
    pub fn body(&self, title: &str) -> Result<String> {
        match self {
            BodySource::Template {
                template,
                intro,
                site_name,
            } => Ok(theme::render(
                template,
                object(vec![
                    ("title", string(escape(title))),
                    ("intro", string(escape(intro))),
                    ("site_name", string(escape(site_name))),
                ]),
            )?),
            BodySource::Remote { client, picks } => {
                let raw = client.complete(&prompt(title, *picks))?;
                Ok(clean_response(&raw)?)
            }
        }
    }

    /// A short name for logs.
    pub fn describe(&self) -> &'static str {
        match self {
            BodySource::Template { .. } => "template",
            BodySource::Remote { .. } => "remote",
        }
    }
}

/// HTML-escapes `text`.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let _ = pulldown_cmark::escape::escape_html(&mut out, text);
    out
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents a failure to produce an article body.
#[derive(Debug)]
pub enum Error {
    /// Returned when the body template fails.
    Template(theme::Error),

    /// Returned when remote generation fails or returns an unusable body.
    Generate(generate::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Template(err) => err.fmt(f),
            Error::Generate(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Template(err) => Some(err),
            Error::Generate(err) => Some(err),
        }
    }
}

impl From<theme::Error> for Error {
    fn from(err: theme::Error) -> Error {
        Error::Template(err)
    }
}

impl From<generate::Error> for Error {
    fn from(err: generate::Error) -> Error {
        Error::Generate(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::theme::Theme;
    use std::cell::RefCell;

    struct Canned {
        reply: std::result::Result<&'static str, ()>,
        prompts: RefCell<Vec<String>>,
    }

    impl Completion for Canned {
        fn complete(&self, prompt: &str) -> generate::Result<String> {
            self.prompts.borrow_mut().push(prompt.to_owned());
            match self.reply {
                Ok(text) => Ok(text.to_owned()),
                Err(()) => Err(generate::Error::EmptyChoices),
            }
        }
    }

    #[test]
    fn test_template_body_escapes_title(
    ) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let theme = Theme::builtin()?;
        let source = BodySource::Template {
            template: &theme.body,
            intro: "Starter draft.",
            site_name: "Guides",
        };
        let body = source.body("Pots & Pans <2024>")?;
        assert!(body.contains("Pots &amp; Pans &lt;2024&gt;"));
        assert!(!body.contains("<html"));
        Ok(())
    }

    #[test]
    fn test_remote_body_is_cleaned() -> Result<()> {
        let canned = Canned {
            reply: Ok("```html\n<h2>Introduction</h2><p>ASIN:B000123456</p>\n```"),
            prompts: RefCell::new(Vec::new()),
        };
        let source = BodySource::Remote {
            client: Box::new(&canned),
            picks: 3,
        };
        assert_eq!(
            "<h2>Introduction</h2><p>ASIN:B000123456</p>",
            source.body("Best Kettles")?
        );
        let prompts = canned.prompts.borrow();
        assert_eq!(1, prompts.len());
        assert!(prompts[0].contains("exactly 3 products"));
        Ok(())
    }

    #[test]
    fn test_remote_failure_is_reported() {
        let canned = Canned {
            reply: Err(()),
            prompts: RefCell::new(Vec::new()),
        };
        let source = BodySource::Remote {
            client: Box::new(&canned),
            picks: 5,
        };
        assert!(matches!(
            source.body("Best Kettles"),
            Err(Error::Generate(generate::Error::EmptyChoices))
        ));
    }
}
