//! Helpers for building template [`Value`]s.

use gtmpl_value::Value;
use std::collections::HashMap;
use url::Url;

/// Builds a template object from `(field, value)` pairs.
pub fn object<'a, I>(fields: I) -> Value
where
    I: IntoIterator<Item = (&'a str, Value)>,
{
    let m: HashMap<String, Value> = fields
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v))
        .collect();
    Value::Object(m)
}

/// Shorthand for a string [`Value`].
pub fn string<S: Into<String>>(s: S) -> Value {
    Value::String(s.into())
}

pub fn from_url(url: &Url) -> Value {
    Value::String(url.to_string())
}
