//! The library code for the `guidepress` buyer's guide generator. A run can be
//! broken down into three steps:
//!
//! 1. Deciding what to write: topics are read from `topics.txt`
//!    ([`crate::topic`]) and anything whose page already exists is dropped
//!    ([`crate::ledger`]).
//! 2. Writing the pages: for each remaining topic (up to `articles_per_run`),
//!    a body is produced from a template or a remote model ([`crate::body`]),
//!    product placeholders become affiliate links ([`crate::affiliate`]), and
//!    the page is written to `articles/<slug>.html` ([`crate::write`]).
//! 3. Publishing: new pages are linked from `index.html` ([`crate::index`])
//!    and `sitemap.xml`/`robots.txt` are regenerated ([`crate::sitemap`]).
//!
//! A failure while producing or writing one article is logged and recorded in
//! the [`build::Report`]; the rest of the batch carries on.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod affiliate;
pub mod body;
pub mod build;
pub mod config;
pub mod generate;
pub mod index;
pub mod ledger;
pub mod markdown;
pub mod sitemap;
pub mod theme;
pub mod topic;
pub mod url;
pub mod util;
pub mod value;
pub mod write;
