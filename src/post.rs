//! Defines the [`Post`] and [`PostMeta`] types and the logic for
//! materializing them from a persisted blob: frontmatter defaults, reading
//! time derivation, and markdown rendering.

use serde::Serialize;

use crate::frontmatter::{self, Frontmatter};
use crate::markdown;

/// Words-per-minute figure used to derive [`PostMeta::reading_time`].
const WORDS_PER_MINUTE: usize = 200;

/// A post without its body; the shape served to list views.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostMeta {
    /// URL-safe unique identifier; the file stem within a partition.
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub author: String,

    /// ISO calendar date (`YYYY-MM-DD`). Dates are ordered
    /// lexicographically, which coincides with chronological order for this
    /// format.
    pub date: String,

    /// Display order is insertion order; case is served verbatim (producers
    /// are expected to lowercase).
    pub tags: Vec<String>,

    /// The author's intent flag. Which partition the file lives in is the
    /// store's concern and may disagree transiently.
    pub published: bool,

    /// Cover image reference; absent means no hero image is rendered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Minutes; always present in the materialized record even when the
    /// source frontmatter omitted it.
    pub reading_time: u32,
}

/// A fully materialized post: metadata plus rendered body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    #[serde(flatten)]
    pub meta: PostMeta,

    /// Rendered (sanitized) HTML in the materialized form; the persisted
    /// form holds markdown instead.
    pub content: String,
}

impl Post {
    /// Materializes a post from its slug and persisted blob: decodes the
    /// frontmatter, defaults the fields it omitted, renders markdown to
    /// HTML, and derives the reading time from the raw body when the
    /// frontmatter left it unspecified.
    pub fn materialize(slug: &str, raw: &str) -> frontmatter::Result<Post> {
        let (fields, body) = frontmatter::decode(raw)?;
        Ok(Post {
            meta: PostMeta::from_frontmatter(slug, fields, body),
            content: markdown::to_html(body),
        })
    }
}

impl PostMeta {
    /// Builds list-view metadata from decoded frontmatter. `body` is the raw
    /// markdown, consulted only for reading-time derivation.
    pub fn from_frontmatter(slug: &str, fields: Frontmatter, body: &str) -> PostMeta {
        PostMeta {
            slug: slug.to_owned(),
            title: fields.title.unwrap_or_default(),
            excerpt: fields.excerpt.unwrap_or_default(),
            author: fields.author.unwrap_or_default(),
            date: fields.date.unwrap_or_default(),
            tags: fields.tags.unwrap_or_default(),
            published: fields.published.unwrap_or(false),
            image: fields.image,
            reading_time: fields
                .reading_time
                .unwrap_or_else(|| reading_time(body)),
        }
    }

    /// Derives the display status from the two raw fields; nothing is
    /// persisted for this.
    pub fn status(&self, today: &str) -> Status {
        if !self.published {
            Status::Draft
        } else if self.date.as_str() > today {
            Status::Scheduled
        } else {
            Status::Live
        }
    }
}

/// The per-record display status derived from `published` and `date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// `published = false`, regardless of partition.
    Draft,

    /// `published = true` with a future date; hidden from the public
    /// listing until the date passes.
    Scheduled,

    /// `published = true` with a now-or-past date.
    Live,
}

/// Estimated minutes to read `body`: `ceil(words / 200)`, never less than 1.
pub fn reading_time(body: &str) -> u32 {
    let words = body.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE).max(1) as u32
}

/// Derives a URL-safe slug from a title: lowercased, non-alphanumeric runs
/// collapsed to a single hyphen, leading/trailing hyphens stripped.
pub fn slugify(title: &str) -> String {
    slug::slugify(title)
}
