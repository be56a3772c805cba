//! Converts post bodies from markdown to sanitized HTML and derives a
//! document outline from the heading structure.
//!
//! Rendering injects an `id` attribute into every heading so that outline
//! entries can anchor-link into the rendered page. The outline itself
//! ([`Headings`]) is a lazy iterator over the rendered HTML rather than a
//! second parse of the markdown; it can be restarted at any time by
//! constructing a fresh iterator over the same string.

use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};

/// Renders markdown to HTML. Tables, strikethrough, footnotes, task lists,
/// and smart punctuation are enabled. [`pulldown_cmark`] is total over
/// arbitrary input, so malformed markup degrades to whatever can be parsed
/// rather than failing.
pub fn to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut events: Vec<Event> = Vec::new();
    // Inner events of the heading currently being buffered, if any. Headings
    // are buffered so their plain text can be slugified into an `id`
    // attribute before the opening tag is emitted.
    let mut heading: Option<(u8, Vec<Event>)> = None;

    for event in Parser::new_ext(markdown, options) {
        match event {
            Event::Start(Tag::Heading(level, _, _)) => {
                heading = Some((level as u8, Vec::new()));
            }
            Event::End(Tag::Heading(..)) => {
                if let Some((level, inner)) = heading.take() {
                    let text: String = inner
                        .iter()
                        .filter_map(|event| match event {
                            Event::Text(t) | Event::Code(t) => Some(t.as_ref()),
                            _ => None,
                        })
                        .collect();
                    let id = slug::slugify(text);
                    events.push(Event::Html(CowStr::from(format!(
                        "<h{} id=\"{}\">",
                        level, id
                    ))));
                    events.extend(inner);
                    events.push(Event::Html(CowStr::from(format!("</h{}>", level))));
                }
            }
            other => match &mut heading {
                Some((_, inner)) => inner.push(other),
                None => events.push(other),
            },
        }
    }

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, events.into_iter());
    out
}

/// A single outline entry: the heading's anchor `id`, its plain text, and
/// its depth (2–6; h1 is reserved for the page title and excluded).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub id: String,
    pub text: String,
    pub level: u8,
}

/// Lazily yields the [`Heading`]s of a rendered HTML string, in document
/// order, by scanning for heading elements carrying an `id` attribute.
pub struct Headings<'a> {
    html: &'a str,
    position: usize,
}

impl<'a> Headings<'a> {
    pub fn new(html: &'a str) -> Headings<'a> {
        Headings { html, position: 0 }
    }
}

impl Iterator for Headings<'_> {
    type Item = Heading;

    fn next(&mut self) -> Option<Heading> {
        loop {
            let rest = &self.html[self.position..];
            let start = self.position + rest.find("<h")?;
            let after = &self.html[start + 2..];

            let level = match after.bytes().next() {
                Some(digit @ b'2'..=b'6') => digit - b'0',
                _ => {
                    self.position = start + 2;
                    continue;
                }
            };

            let open_end = match after.find('>') {
                Some(i) => start + 2 + i + 1,
                None => return None,
            };
            let id = match after[1..].strip_prefix(" id=\"") {
                Some(tail) => match tail.find('"') {
                    Some(i) => tail[..i].to_owned(),
                    None => return None,
                },
                None => {
                    // Heading without an anchor; skip it.
                    self.position = open_end;
                    continue;
                }
            };

            let close = format!("</h{}>", level);
            let body_end = match self.html[open_end..].find(&close) {
                Some(i) => open_end + i,
                None => return None,
            };
            self.position = body_end + close.len();

            return Some(Heading {
                id,
                text: strip_tags(&self.html[open_end..body_end]),
                level,
            });
        }
    }
}

/// Removes markup elements from a heading body, leaving its plain text.
fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headings_carry_anchor_ids() {
        let html = to_html("## Hello, World!\n\nbody\n\n### Sub *section*\n");
        assert!(html.contains("<h2 id=\"hello-world\">"));
        assert!(html.contains("<h3 id=\"sub-section\">"));
    }

    #[test]
    fn extended_constructs_render() {
        let html = to_html("| a | b |\n|---|---|\n| 1 | 2 |\n\n~~gone~~\n");
        assert!(html.contains("<table>"));
        assert!(html.contains("<del>"));
    }

    #[test]
    fn malformed_markup_degrades() {
        // Unterminated emphasis and a stray fence must still produce output.
        let html = to_html("*oops\n\n```\nunterminated");
        assert!(!html.is_empty());
    }

    #[test]
    fn outline_lists_headings_in_order() {
        let html = to_html("## First\n\n### Nested `code`\n\n## Second\n");
        let outline: Vec<Heading> = Headings::new(&html).collect();
        assert_eq!(
            outline,
            vec![
                Heading {
                    id: "first".to_owned(),
                    text: "First".to_owned(),
                    level: 2,
                },
                Heading {
                    id: "nested-code".to_owned(),
                    text: "Nested code".to_owned(),
                    level: 3,
                },
                Heading {
                    id: "second".to_owned(),
                    text: "Second".to_owned(),
                    level: 2,
                },
            ]
        );
    }

    #[test]
    fn outline_excludes_h1() {
        let html = to_html("# Title\n\n## Section\n");
        let outline: Vec<Heading> = Headings::new(&html).collect();
        assert_eq!(outline.len(), 1);
        assert_eq!(outline[0].level, 2);
    }

    #[test]
    fn outline_is_restartable() {
        let html = to_html("## Only\n");
        let first: Vec<Heading> = Headings::new(&html).collect();
        let second: Vec<Heading> = Headings::new(&html).collect();
        assert_eq!(first, second);
    }
}
