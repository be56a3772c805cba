//! The library code for the `inkstone` blog content store. The architecture
//! can be generally broken down into three distinct layers:
//!
//! 1. Codec and rendering leaves: splitting a persisted blob into
//!    frontmatter and body ([`crate::frontmatter`]) and turning the body
//!    into sanitized HTML plus an outline ([`crate::markdown`]).
//! 2. The store: a file-backed repository keyed by slug across two
//!    partitions, published and drafts ([`crate::store`]). A fetch tries the
//!    caller's preferred partition and falls back to the other; publishing
//!    a post deletes its stale draft copy; listings re-scan the directories
//!    on every call so results are always current-on-disk.
//! 3. Read-only projections and transport: tag aggregation and
//!    adjacent-post resolution over the published listing
//!    ([`crate::query`]), served alongside the store operations as JSON
//!    over HTTP ([`crate::http`]).

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod config;
pub mod frontmatter;
pub mod http;
pub mod markdown;
pub mod post;
pub mod query;
pub mod store;
