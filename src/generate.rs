//! Remote article generation. A [`Completion`] turns a prompt into free-form
//! text; [`ChatClient`] is the production implementation, speaking the
//! OpenAI-compatible chat-completions protocol. [`prompt`] builds the
//! structured request and [`clean_response`] turns whatever came back into
//! an HTML body fragment (or rejects it).

use crate::markdown;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Something that completes a prompt with text.
pub trait Completion {
    fn complete(&self, prompt: &str) -> Result<String>;
}

impl<T: Completion + ?Sized> Completion for &T {
    fn complete(&self, prompt: &str) -> Result<String> {
        (**self).complete(prompt)
    }
}

/// Connection settings for [`ChatClient`].
#[derive(Clone, Debug)]
pub struct ChatSettings {
    pub endpoint: String,
    pub model: String,
    pub api_key: String,
    pub timeout: Duration,
}

/// A blocking client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct ChatClient {
    client: Client,
    settings: ChatSettings,
}

impl ChatClient {
    pub fn new(settings: ChatSettings) -> Result<ChatClient> {
        let client = Client::builder().timeout(settings.timeout).build()?;
        Ok(ChatClient { client, settings })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize, Debug)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

const SYSTEM_PROMPT: &str = "You are an experienced consumer-products editor. \
You write honest, well-structured buyer's guides as clean HTML fragments.";

impl Completion for ChatClient {
    fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.settings.model,
            messages: vec![
                Message {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                Message {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        log::debug!(
            "Sending completion request to `{}` with model `{}`",
            self.settings.endpoint,
            self.settings.model
        );
        let response = self
            .client
            .post(&self.settings.endpoint)
            .bearer_auth(&self.settings.api_key)
            .json(&request)
            .send()?;

        let status = response.status();
        let text = response.text()?;
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&text)?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(Error::EmptyChoices)
    }
}

/// Builds the article prompt for `title`. The response is expected to carry
/// one `ASIN:XXXXXXXXXX` placeholder per pick, which
/// [`crate::affiliate::Linker`] later turns into links.
pub fn prompt(title: &str, picks: usize) -> String {
    format!(
        "Write a buyer's guide titled \"{title}\".\n\
         \n\
         Return ONLY an HTML fragment: no <html>, <head> or <body> tags, no \
         Markdown, no code fences. Use <h2> for each section heading and \
         these sections in this order:\n\
         \n\
         1. Introduction: two short paragraphs on who this guide is for.\n\
         2. Our top {picks} picks: an ordered list of exactly {picks} \
         products. For each, give the product name, one sentence on why it \
         stands out, a short pros/cons list, and the product's Amazon \
         identifier written exactly as ASIN:XXXXXXXXXX (the literal text \
         ASIN: followed by the 10-character uppercase code, nothing else).\n\
         3. Comparison table: a <table> comparing the {picks} picks on price \
         tier and key specs.\n\
         4. How to choose: the buying criteria that matter most.\n\
         5. FAQ: four or five questions, each as an <h3> followed by a short \
         answer.\n",
        title = title,
        picks = picks,
    )
}

/// Normalizes a raw completion into an HTML body fragment.
///
/// Code fences are stripped, a full document is cut down to the contents of
/// its `<body>`, and text without any HTML tags is rendered as Markdown. The
/// result must be non-empty and contain at least one `<h2` section heading.
pub fn clean_response(raw: &str) -> Result<String> {
    let text = strip_code_fence(raw.trim());
    let text = body_contents(text).trim();

    let html = if looks_like_html(text) {
        text.to_owned()
    } else {
        let mut html = String::with_capacity(text.len() * 2);
        markdown::to_html(&mut html, text);
        html
    };

    let html = html.trim();
    if html.is_empty() {
        return Err(Error::Malformed("the response was empty"));
    }
    if !html.to_ascii_lowercase().contains("<h2") {
        return Err(Error::Malformed("the response has no <h2> sections"));
    }
    Ok(html.to_owned())
}

fn strip_code_fence(text: &str) -> &str {
    const FENCE: &str = "```";
    if !text.starts_with(FENCE) || !text.ends_with(FENCE) || text.len() < 2 * FENCE.len() {
        return text;
    }
    let inner = &text[FENCE.len()..text.len() - FENCE.len()];
    // drop the info string (e.g. `html`) on the opening fence line
    match inner.find('\n') {
        Some(i) => &inner[i + 1..],
        None => inner,
    }
}

fn body_contents(text: &str) -> &str {
    let lower = text.to_ascii_lowercase();
    let start = match lower.find("<body") {
        Some(i) => match lower[i..].find('>') {
            Some(j) => i + j + 1,
            None => return text,
        },
        None => return text,
    };
    let end = lower[start..]
        .find("</body>")
        .map(|i| start + i)
        .unwrap_or_else(|| text.len());
    &text[start..end]
}

fn looks_like_html(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    ["<h2", "<p", "<ul", "<ol", "<table", "<div", "<section"]
        .iter()
        .any(|tag| lower.contains(tag))
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents a failure to generate a single article body.
#[derive(Debug)]
pub enum Error {
    /// Returned when the request could not be sent or the response could
    /// not be read (including timeouts).
    Request(reqwest::Error),

    /// Returned when the endpoint answers with a non-success status.
    Status { status: u16, body: String },

    /// Returned when the response body isn't the expected JSON.
    Json(serde_json::Error),

    /// Returned when the response has no choices or no message content.
    EmptyChoices,

    /// Returned when the completion text isn't a usable article body.
    Malformed(&'static str),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Request(err) => write!(f, "completion request failed: {}", err),
            Error::Status { status, body } => {
                write!(f, "completion endpoint returned status {}: {}", status, body)
            }
            Error::Json(err) => write!(f, "parsing completion response: {}", err),
            Error::EmptyChoices => write!(f, "completion response has no content"),
            Error::Malformed(reason) => write!(f, "malformed article body: {}", reason),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Request(err) => Some(err),
            Error::Json(err) => Some(err),
            Error::Status { .. } | Error::EmptyChoices | Error::Malformed(_) => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    /// Converts a [`reqwest::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for HTTP calls.
    fn from(err: reqwest::Error) -> Error {
        Error::Request(err)
    }
}

impl From<serde_json::Error> for Error {
    /// Converts a [`serde_json::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator when decoding responses.
    fn from(err: serde_json::Error) -> Error {
        Error::Json(err)
    }
}
