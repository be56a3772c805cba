//! Read-only projections over the published listing: tag aggregation, tag
//! filtering, and adjacent-post resolution. Everything here is a pure
//! function over an already-sorted listing; the [`crate::store::Store`]
//! methods of the same names wire them to [`crate::store::Store::list_published`].

use std::collections::BTreeSet;

use crate::post::PostMeta;
use crate::store::{Result, Store};

/// The neighbors of a post in the date-descending published listing.
/// `previous` is the next-older post, `next` the next-newer one; either is
/// absent at the corresponding boundary (and both for an unknown slug).
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize)]
pub struct Adjacent {
    pub previous: Option<PostMeta>,
    pub next: Option<PostMeta>,
}

/// The union of every listed post's tags, sorted and deduplicated. Tags are
/// compared verbatim; `Rust` and `rust` are distinct entries because the
/// store does not normalize case.
pub fn all_tags(posts: &[PostMeta]) -> Vec<String> {
    posts
        .iter()
        .flat_map(|post| post.tags.iter().cloned())
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect()
}

/// The subsequence of `posts` whose tags include `tag` (verbatim match),
/// preserving the listing's order.
pub fn posts_by_tag(posts: &[PostMeta], tag: &str) -> Vec<PostMeta> {
    posts
        .iter()
        .filter(|post| post.tags.iter().any(|t| t == tag))
        .cloned()
        .collect()
}

/// Locates `slug` in the date-descending listing and returns its neighbors.
pub fn adjacent(posts: &[PostMeta], slug: &str) -> Adjacent {
    match posts.iter().position(|post| post.slug == slug) {
        None => Adjacent::default(),
        Some(index) => Adjacent {
            previous: posts.get(index + 1).cloned(),
            next: index.checked_sub(1).and_then(|i| posts.get(i)).cloned(),
        },
    }
}

impl Store {
    /// See [`all_tags`].
    pub fn all_tags(&self) -> Result<Vec<String>> {
        Ok(all_tags(&self.list_published()?))
    }

    /// See [`posts_by_tag`].
    pub fn posts_by_tag(&self, tag: &str) -> Result<Vec<PostMeta>> {
        Ok(posts_by_tag(&self.list_published()?, tag))
    }

    /// See [`adjacent`].
    pub fn adjacent(&self, slug: &str) -> Result<Adjacent> {
        Ok(adjacent(&self.list_published()?, slug))
    }
}
