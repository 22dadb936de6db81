//! Renders Markdown article bodies (as some models return them) to HTML.

use pulldown_cmark::{html, Event, Options, Parser, Tag};

/// Converts `markdown` to HTML, appending the result to `w`.
///
/// Headings are demoted one level: the page template owns the `<h1>` (the
/// article title), so a Markdown `#` becomes `<h2>`, `##` becomes `<h3>`,
/// and so on, bottoming out at `<h6>`.
pub fn to_html(w: &mut String, markdown: &str) {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);

    html::push_html(
        w,
        Parser::new_ext(markdown, options).map(|ev| match ev {
            Event::Start(Tag::Heading(level)) => Event::Start(Tag::Heading(demote(level))),
            Event::End(Tag::Heading(level)) => Event::End(Tag::Heading(demote(level))),
            _ => ev,
        }),
    );
}

fn demote(level: u32) -> u32 {
    std::cmp::min(level + 1, 6)
}

#[cfg(test)]
mod test {
    use super::*;

    fn render(markdown: &str) -> String {
        let mut out = String::new();
        to_html(&mut out, markdown);
        out
    }

    #[test]
    fn test_headings_are_demoted() {
        assert_eq!(
            "<h2>Our picks</h2>\n<h3>1. Sony</h3>\n<h6>Deep</h6>\n",
            render("# Our picks\n\n## 1. Sony\n\n###### Deep\n")
        );
    }

    #[test]
    fn test_tables_are_rendered() {
        let html = render("| Model | Price |\n|---|---|\n| Sony | $$$ |\n");
        assert!(html.contains("<table>"));
        assert!(html.contains("<td>Sony</td>"));
    }

    #[test]
    fn test_placeholders_survive() {
        assert!(render("Buy it: ASIN:B000123456\n").contains("ASIN:B000123456"));
    }
}
