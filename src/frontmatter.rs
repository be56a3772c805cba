//! Defines the [`Frontmatter`] type and the codec between a persisted post
//! blob and its `(frontmatter, body)` halves. A post file is structured as
//! follows:
//!
//! 1. Initial frontmatter fence (`---`)
//! 2. YAML frontmatter with the recognized fields (`title`, `date`, `author`,
//!    `excerpt`, `tags`, `published`, `image`, `readingTime`)
//! 3. Terminal frontmatter fence (`---`)
//! 4. Post body
//!
//! For example:
//!
//! ```md
//! ---
//! title: "Hello, world!"
//! date: "2021-04-16"
//! tags: ["greet"]
//! published: true
//! ---
//! # Hello
//!
//! World
//! ```
//!
//! A blob without an opening fence is not a post; [`decode`] rejects it so
//! the store can treat the file as unreadable rather than as an empty post.

use std::fmt;

use serde::Deserialize;

/// The recognized frontmatter field set. Every field is optional at the
/// codec level; defaulting is the caller's concern (see
/// [`crate::post::Post::materialize`]).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Frontmatter {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub date: Option<String>,

    #[serde(default)]
    pub author: Option<String>,

    #[serde(default)]
    pub excerpt: Option<String>,

    /// Insertion order is preserved for display; the codec does not
    /// normalize case.
    #[serde(default)]
    pub tags: Option<Vec<String>>,

    /// Advisory intent flag; partition membership is the store's concern.
    #[serde(default)]
    pub published: Option<bool>,

    #[serde(default)]
    pub image: Option<String>,

    /// Minutes. Derived from the body on read when absent.
    #[serde(default, rename = "readingTime")]
    pub reading_time: Option<u32>,
}

const FENCE: &str = "---";

/// Splits a post blob into its frontmatter fields and body. The body is
/// everything after the terminal fence, less a single leading line break so
/// that [`encode`] followed by [`decode`] reproduces the original body.
pub fn decode(input: &str) -> Result<(Frontmatter, &str)> {
    if !input.starts_with(FENCE) {
        return Err(Error::MissingStartFence);
    }
    let (yaml, body) = match input[FENCE.len()..].find(FENCE) {
        None => return Err(Error::MissingEndFence),
        Some(offset) => (
            &input[FENCE.len()..FENCE.len() + offset],
            &input[FENCE.len() + offset + FENCE.len()..],
        ),
    };

    let mut frontmatter: Frontmatter = if yaml.trim().is_empty() {
        Frontmatter::default()
    } else {
        serde_yaml::from_str(yaml)?
    };

    // [`encode`] writes absent fields as empty values; fold them back into
    // absence so the two spellings behave identically downstream and
    // encode-then-decode reproduces absent fields.
    for field in [
        &mut frontmatter.title,
        &mut frontmatter.date,
        &mut frontmatter.author,
        &mut frontmatter.excerpt,
        &mut frontmatter.image,
    ] {
        if field.as_deref() == Some("") {
            *field = None;
        }
    }
    if frontmatter.tags.as_ref().is_some_and(|tags| tags.is_empty()) {
        frontmatter.tags = None;
    }

    let body = body.strip_prefix('\r').unwrap_or(body);
    let body = body.strip_prefix('\n').unwrap_or(body);
    Ok((frontmatter, body))
}

/// Produces the fenced blob for a field set and body. Keys are emitted in a
/// fixed order; `tags` as a bracketed quoted list, `published` as a bare
/// boolean. `readingTime` is omitted when unknown since it is re-derived on
/// every read anyway.
pub fn encode(frontmatter: &Frontmatter, body: &str) -> String {
    let mut out = String::with_capacity(body.len() + 256);
    out.push_str(FENCE);
    out.push('\n');
    push_field(&mut out, "title", frontmatter.title.as_deref());
    push_field(&mut out, "date", frontmatter.date.as_deref());
    push_field(&mut out, "author", frontmatter.author.as_deref());
    push_field(&mut out, "excerpt", frontmatter.excerpt.as_deref());
    out.push_str("tags: [");
    for (i, tag) in frontmatter.tags.iter().flatten().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        push_quoted(&mut out, tag);
    }
    out.push_str("]\n");
    out.push_str("published: ");
    out.push_str(if frontmatter.published.unwrap_or(false) {
        "true"
    } else {
        "false"
    });
    out.push('\n');
    push_field(&mut out, "image", frontmatter.image.as_deref());
    if let Some(minutes) = frontmatter.reading_time {
        out.push_str(&format!("readingTime: {}\n", minutes));
    }
    out.push_str(FENCE);
    out.push('\n');
    out.push_str(body);
    out
}

fn push_field(out: &mut String, key: &str, value: Option<&str>) {
    out.push_str(key);
    out.push_str(": ");
    push_quoted(out, value.unwrap_or(""));
    out.push('\n');
}

/// Writes `value` as a YAML double-quoted scalar.
fn push_quoted(out: &mut String, value: &str) {
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out.push('"');
}

/// Represents the result of a codec operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error decoding a post blob.
#[derive(Debug)]
pub enum Error {
    /// Returned when a post blob is missing its starting frontmatter fence
    /// (`---`).
    MissingStartFence,

    /// Returned when a post blob is missing its terminal frontmatter fence
    /// (`---` i.e., the starting fence was found but the ending one was
    /// missing).
    MissingEndFence,

    /// Returned when there was an error parsing the frontmatter as YAML.
    DeserializeYaml(serde_yaml::Error),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::MissingStartFence => write!(f, "Post must begin with `---`"),
            Error::MissingEndFence => write!(f, "Missing closing `---`"),
            Error::DeserializeYaml(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::MissingStartFence => None,
            Error::MissingEndFence => None,
            Error::DeserializeYaml(err) => Some(err),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for [`serde_yaml`] deserialization functions.
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_full_field_set() -> Result<()> {
        let input = concat!(
            "---\n",
            "title: \"Hello, world!\"\n",
            "date: \"2021-04-16\"\n",
            "author: \"Craig\"\n",
            "excerpt: \"A greeting.\"\n",
            "tags: [\"greet\", \"Meta\"]\n",
            "published: true\n",
            "image: \"/img/hello.png\"\n",
            "readingTime: 3\n",
            "---\n",
            "# Hello\n",
        );
        let (frontmatter, body) = decode(input)?;
        assert_eq!(frontmatter.title.as_deref(), Some("Hello, world!"));
        assert_eq!(frontmatter.date.as_deref(), Some("2021-04-16"));
        assert_eq!(frontmatter.author.as_deref(), Some("Craig"));
        assert_eq!(frontmatter.excerpt.as_deref(), Some("A greeting."));
        assert_eq!(
            frontmatter.tags,
            Some(vec!["greet".to_owned(), "Meta".to_owned()])
        );
        assert_eq!(frontmatter.published, Some(true));
        assert_eq!(frontmatter.image.as_deref(), Some("/img/hello.png"));
        assert_eq!(frontmatter.reading_time, Some(3));
        assert_eq!(body, "# Hello\n");
        Ok(())
    }

    #[test]
    fn decode_missing_fields_are_absent() -> Result<()> {
        let (frontmatter, body) = decode("---\ntitle: \"Sparse\"\n---\nBody")?;
        assert_eq!(frontmatter.title.as_deref(), Some("Sparse"));
        assert_eq!(frontmatter.date, None);
        assert_eq!(frontmatter.tags, None);
        assert_eq!(frontmatter.published, None);
        assert_eq!(frontmatter.reading_time, None);
        assert_eq!(body, "Body");
        Ok(())
    }

    #[test]
    fn decode_without_fence_fails() {
        assert!(matches!(
            decode("just some markdown"),
            Err(Error::MissingStartFence)
        ));
        assert!(matches!(
            decode("---\ntitle: \"Unterminated\"\n"),
            Err(Error::MissingEndFence)
        ));
    }

    #[test]
    fn decode_empty_values_are_absent() -> Result<()> {
        let (frontmatter, _) = decode("---\ntitle: \"\"\nimage: \"\"\ntags: []\n---\n")?;
        assert_eq!(frontmatter.title, None);
        assert_eq!(frontmatter.image, None);
        assert_eq!(frontmatter.tags, None);
        Ok(())
    }

    #[test]
    fn round_trip_preserves_absent_fields() -> Result<()> {
        let original = Frontmatter {
            published: Some(true),
            ..Frontmatter::default()
        };
        let encoded = encode(&original, "Body");
        let (decoded, _) = decode(&encoded)?;
        assert_eq!(decoded.title, None);
        assert_eq!(decoded.date, None);
        assert_eq!(decoded.author, None);
        assert_eq!(decoded.excerpt, None);
        assert_eq!(decoded.tags, None);
        assert_eq!(decoded.image, None);
        assert_eq!(decoded.reading_time, None);
        Ok(())
    }

    #[test]
    fn round_trip_preserves_values() -> Result<()> {
        let original = Frontmatter {
            title: Some("Quotes \"inside\" & colons: fine".to_owned()),
            date: Some("2024-02-29".to_owned()),
            author: Some("Craig".to_owned()),
            excerpt: Some("An excerpt.".to_owned()),
            tags: Some(vec!["rust".to_owned(), "Blog".to_owned()]),
            published: Some(true),
            image: None,
            reading_time: Some(2),
        };
        let body = "# Heading\n\nSome *body* text.\n";
        let encoded = encode(&original, body);
        let (decoded, decoded_body) = decode(&encoded)?;
        assert_eq!(decoded.title, original.title);
        assert_eq!(decoded.date, original.date);
        assert_eq!(decoded.author, original.author);
        assert_eq!(decoded.excerpt, original.excerpt);
        assert_eq!(decoded.tags, original.tags);
        assert_eq!(decoded.published, original.published);
        assert_eq!(decoded.image, original.image);
        assert_eq!(decoded.reading_time, original.reading_time);
        assert_eq!(decoded_body, body);
        Ok(())
    }
}
