//! Generates `sitemap.xml` and `robots.txt`. Both are rebuilt from scratch on
//! every run.

use crate::util::write_atomic;
use chrono::NaiveDate;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::fmt;
use std::io;
use std::path::Path;
use url::Url;

const SITEMAP_NAMESPACE: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";
const CHANGE_FREQUENCY: &str = "weekly";

/// Renders a sitemap listing `urls`, each stamped with `lastmod`.
pub fn render_sitemap(urls: &[Url], lastmod: NaiveDate) -> Result<String> {
    let lastmod = lastmod.format("%Y-%m-%d").to_string();
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut urlset = BytesStart::new("urlset");
    urlset.push_attribute(("xmlns", SITEMAP_NAMESPACE));
    writer.write_event(Event::Start(urlset))?;
    for url in urls {
        writer.write_event(Event::Start(BytesStart::new("url")))?;
        write_text_element(&mut writer, "loc", url.as_str())?;
        write_text_element(&mut writer, "lastmod", &lastmod)?;
        write_text_element(&mut writer, "changefreq", CHANGE_FREQUENCY)?;
        writer.write_event(Event::End(BytesEnd::new("url")))?;
    }
    writer.write_event(Event::End(BytesEnd::new("urlset")))?;

    let mut out = String::from_utf8_lossy(&writer.into_inner()).into_owned();
    out.push('\n');
    Ok(out)
}

fn write_text_element<W: io::Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Renders a robots file that allows everything and points at `sitemap`.
pub fn render_robots(sitemap: &Url) -> String {
    format!("User-agent: *\nAllow: /\nSitemap: {}\n", sitemap)
}

/// Writes `sitemap.xml` and `robots.txt` into `directory`.
pub fn write_sitemap(
    directory: &Path,
    urls: &[Url],
    sitemap_url: &Url,
    lastmod: NaiveDate,
) -> Result<()> {
    log::info!("Writing sitemap with {} URLs", urls.len());
    write_atomic(&directory.join("sitemap.xml"), &render_sitemap(urls, lastmod)?)?;
    write_atomic(&directory.join("robots.txt"), &render_robots(sitemap_url))?;
    Ok(())
}

/// The result of a fallible sitemap operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error writing the sitemap or robots file.
#[derive(Debug)]
pub enum Error {
    /// An error serializing the sitemap document.
    Xml(quick_xml::Error),

    /// An error writing an output file.
    Io(io::Error),
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Error {
        Error::Xml(err)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Xml(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Xml(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tempfile::TempDir;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    #[test]
    fn test_render_sitemap() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let urls = vec![
            Url::parse("https://example.org/")?,
            Url::parse("https://example.org/articles/best-kettles.html")?,
        ];
        let sitemap = render_sitemap(&urls, date())?;
        assert!(sitemap.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(sitemap
            .contains("<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">"));
        assert_eq!(2, sitemap.matches("<url>").count());
        assert_eq!(2, sitemap.matches("<lastmod>2024-03-09</lastmod>").count());
        assert_eq!(2, sitemap.matches("<changefreq>weekly</changefreq>").count());

        let home = sitemap.find("<loc>https://example.org/</loc>");
        let page = sitemap.find("<loc>https://example.org/articles/best-kettles.html</loc>");
        assert!(home.is_some() && page.is_some() && home < page);
        assert!(sitemap.trim_end().ends_with("</urlset>"));
        Ok(())
    }

    #[test]
    fn test_render_sitemap_escapes() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let sitemap = render_sitemap(&[Url::parse("https://example.org/?a=1&b=2")?], date())?;
        assert!(sitemap.contains("<loc>https://example.org/?a=1&amp;b=2</loc>"));
        Ok(())
    }

    #[test]
    fn test_render_robots() -> std::result::Result<(), url::ParseError> {
        assert_eq!(
            "User-agent: *\nAllow: /\nSitemap: https://example.org/sitemap.xml\n",
            render_robots(&Url::parse("https://example.org/sitemap.xml")?)
        );
        Ok(())
    }

    #[test]
    fn test_write_sitemap() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        let home = Url::parse("https://example.org/")?;
        let sitemap_url = home.join("sitemap.xml")?;
        write_sitemap(dir.path(), &[home], &sitemap_url, date())?;

        let sitemap = std::fs::read_to_string(dir.path().join("sitemap.xml"))?;
        assert_eq!(1, sitemap.matches("<url>").count());
        let robots = std::fs::read_to_string(dir.path().join("robots.txt"))?;
        assert!(robots.ends_with("Sitemap: https://example.org/sitemap.xml\n"));
        Ok(())
    }
}
