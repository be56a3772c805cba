//! Defines the [`Store`] type, the authoritative post repository keyed by
//! slug across two physical partitions (published and drafts), and the
//! [`Error`] type for store faults.
//!
//! Every read re-scans the partition directories, so results are always
//! current-on-disk at the cost of O(n) work per listing. Reads take no lock;
//! writes (`save`, `delete`) are serialized through a store-wide mutex so
//! that a promote cannot interleave with a delete for the same slug.

use std::fmt;
use std::fs::{self, read_dir};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::frontmatter;
use crate::post::{Post, PostMeta};

const MARKDOWN_EXTENSION: &str = ".md";

/// The two physical storage areas a post file can live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    Published,
    Draft,
}

impl Partition {
    fn other(self) -> Partition {
        match self {
            Partition::Published => Partition::Draft,
            Partition::Draft => Partition::Published,
        }
    }
}

/// The file-backed post repository. A slug resolves to at most one file per
/// partition; when both partitions hold a file for the same slug, the
/// caller's preferred partition wins silently (the fallback order is the
/// contract, not an accident — see [`Store::get`]).
pub struct Store {
    published_dir: PathBuf,
    drafts_dir: PathBuf,

    /// Serializes `save` and `delete`. Coarser than a per-slug lock, which
    /// is fine for a single-editor workload.
    write_lock: Mutex<()>,
}

impl Store {
    pub fn new(published_dir: impl Into<PathBuf>, drafts_dir: impl Into<PathBuf>) -> Store {
        Store {
            published_dir: published_dir.into(),
            drafts_dir: drafts_dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn partition_dir(&self, partition: Partition) -> &Path {
        match partition {
            Partition::Published => &self.published_dir,
            Partition::Draft => &self.drafts_dir,
        }
    }

    fn post_path(&self, partition: Partition, slug: &str) -> PathBuf {
        self.partition_dir(partition)
            .join(format!("{}{}", slug, MARKDOWN_EXTENSION))
    }

    /// Reads the blob for `slug` from the preferred partition, falling back
    /// to the other partition on a miss. `Ok(None)` means the slug exists in
    /// neither; any other read fault for an existing file is an error. A
    /// slug carrying path components could name a file outside both
    /// partitions, so it is not-found by definition.
    fn read_raw(&self, slug: &str, preferred: Partition) -> Result<Option<String>> {
        if validate_slug(slug).is_err() {
            return Ok(None);
        }
        for partition in [preferred, preferred.other()] {
            match fs::read_to_string(self.post_path(partition, slug)) {
                Ok(raw) => return Ok(Some(raw)),
                Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
                Err(err) => {
                    return Err(Error::Annotated(
                        format!("reading post `{}`", slug),
                        Box::new(err.into()),
                    ))
                }
            }
        }
        Ok(None)
    }

    /// Fetches the materialized post for `slug`: preferred partition first,
    /// then the other, then not-found. A file whose frontmatter fails to
    /// decode is reported as not-found (with a warning) so callers don't
    /// crash on one corrupt file.
    pub fn get(&self, slug: &str, prefer_draft: bool) -> Result<Option<Post>> {
        let preferred = if prefer_draft {
            Partition::Draft
        } else {
            Partition::Published
        };
        match self.read_raw(slug, preferred)? {
            None => Ok(None),
            Some(raw) => match Post::materialize(slug, &raw) {
                Ok(post) => Ok(Some(post)),
                Err(err) => {
                    warn!(slug, error = %err, "undecodable post treated as not found");
                    Ok(None)
                }
            },
        }
    }

    /// Fetches the undecoded blob for `slug` with the same partition
    /// resolution rule as [`Store::get`]. Used by the editor so a load/save
    /// cycle never re-encodes the file.
    pub fn get_raw(&self, slug: &str, prefer_draft: bool) -> Result<Option<String>> {
        let preferred = if prefer_draft {
            Partition::Draft
        } else {
            Partition::Published
        };
        self.read_raw(slug, preferred)
    }

    /// Lists the published partition: records with a false `published` flag
    /// or a future date are filtered out (the flag is authoritative for
    /// filtering even though partition membership should already imply it;
    /// future-dated posts are scheduled, not yet public). Sorted by date,
    /// most recent first.
    pub fn list_published(&self) -> Result<Vec<PostMeta>> {
        let today = today();
        let mut posts = self.scan(Partition::Published)?;
        posts.retain(|post| post.published && post.date.as_str() <= today.as_str());
        posts.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(posts)
    }

    /// Lists both partitions for the admin surface: drafts and scheduled
    /// posts included, sorted by date, most recent first.
    pub fn list_all(&self) -> Result<Vec<PostMeta>> {
        let mut posts = self.scan(Partition::Published)?;
        posts.extend(self.scan(Partition::Draft)?);
        posts.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(posts)
    }

    /// Enumerates one partition's records. A missing directory is an empty
    /// partition (directories appear on first write). An unreadable or
    /// undecodable file is skipped with a warning so one corrupt post
    /// cannot take down the whole index.
    fn scan(&self, partition: Partition) -> Result<Vec<PostMeta>> {
        let dir = self.partition_dir(partition);
        let entries = match read_dir(dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(Error::Annotated(
                    format!("listing `{}`", dir.display()),
                    Box::new(err.into()),
                ))
            }
        };

        let mut posts = Vec::new();
        for result in entries {
            let entry = result?;
            let os_file_name = entry.file_name();
            let file_name = os_file_name.to_string_lossy();
            let slug = match file_name.strip_suffix(MARKDOWN_EXTENSION) {
                Some(slug) => slug,
                None => continue,
            };
            let raw = match fs::read_to_string(entry.path()) {
                Ok(raw) => raw,
                Err(err) => {
                    warn!(slug, error = %err, "skipping unreadable post");
                    continue;
                }
            };
            match frontmatter::decode(&raw) {
                Ok((fields, body)) => {
                    posts.push(PostMeta::from_frontmatter(slug, fields, body))
                }
                Err(err) => {
                    warn!(slug, error = %err, "skipping undecodable post");
                    continue;
                }
            }
        }
        Ok(posts)
    }

    /// Writes `raw` verbatim into the partition selected by `is_draft`,
    /// creating the directory on demand. Saving with `is_draft = false` is a
    /// promote: any same-slug file in the drafts partition is deleted so the
    /// published copy is the only one left.
    pub fn save(&self, slug: &str, raw: &str, is_draft: bool) -> Result<()> {
        validate_slug(slug)?;
        if raw.is_empty() {
            return Err(Error::Validation("content must not be empty".to_owned()));
        }

        let partition = if is_draft {
            Partition::Draft
        } else {
            Partition::Published
        };

        let _guard = self.write_lock.lock().unwrap();
        let annotate =
            |err: io::Error| Error::Annotated(format!("saving post `{}`", slug), Box::new(err.into()));
        fs::create_dir_all(self.partition_dir(partition)).map_err(annotate)?;
        fs::write(self.post_path(partition, slug), raw).map_err(annotate)?;
        if !is_draft {
            remove_if_present(&self.post_path(Partition::Draft, slug)).map_err(annotate)?;
        }
        debug!(slug, draft = is_draft, "saved post");
        Ok(())
    }

    /// Removes `slug` from both partitions. Absence in either is not an
    /// error, so the operation is idempotent; only an underlying I/O fault
    /// fails it.
    pub fn delete(&self, slug: &str) -> Result<()> {
        validate_slug(slug)?;
        let _guard = self.write_lock.lock().unwrap();
        for partition in [Partition::Published, Partition::Draft] {
            remove_if_present(&self.post_path(partition, slug)).map_err(|err| {
                Error::Annotated(format!("deleting post `{}`", slug), Box::new(err.into()))
            })?;
        }
        debug!(slug, "deleted post");
        Ok(())
    }

    /// Reports whether `slug` has a file in the given partition. No
    /// fallback; used by the admin surface to label records.
    pub fn exists(&self, partition: Partition, slug: &str) -> bool {
        self.post_path(partition, slug).is_file()
    }
}

fn remove_if_present(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err),
    }
}

/// Slugs become file stems; an empty slug or one carrying path components
/// could escape the partition directories.
fn validate_slug(slug: &str) -> Result<()> {
    if slug.is_empty() {
        return Err(Error::Validation("slug must not be empty".to_owned()));
    }
    if slug.contains('/') || slug.contains('\\') || slug.contains("..") {
        return Err(Error::Validation(format!(
            "slug `{}` must not contain path components",
            slug
        )));
    }
    Ok(())
}

/// Today's local calendar date in the same `YYYY-MM-DD` format posts use.
fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

/// Represents the result of a [`Store`] operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a store fault. Not-found is not represented here; reads
/// signal it with `Ok(None)`.
#[derive(Debug)]
pub enum Error {
    /// Returned when a write is rejected before touching disk (empty slug
    /// or content, path components in a slug).
    Validation(String),

    /// Returned when a blob's frontmatter fence is malformed or unparsable.
    Frontmatter(frontmatter::Error),

    /// Returned for underlying read/write/delete failures.
    Io(std::io::Error),

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Validation(message) => write!(f, "{}", message),
            Error::Frontmatter(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
            Error::Annotated(annotation, err) => {
                write!(f, "{}: {}", annotation, err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Validation(_) => None,
            Error::Frontmatter(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<frontmatter::Error> for Error {
    /// Converts a [`frontmatter::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for codec functions.
    fn from(err: frontmatter::Error) -> Error {
        Error::Frontmatter(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for fallible I/O functions.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}
