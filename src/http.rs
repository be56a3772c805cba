//! The JSON-over-HTTP surface the rendering layer consumes.
//!
//! ## Routes
//!
//! - `GET  /api/posts` — published listing (scheduled posts excluded)
//! - `GET  /api/posts/:slug` — raw blob for one post, or 404
//! - `GET  /api/posts/:slug/adjacent` — prev/next neighbors by publish date
//! - `GET  /api/tags` — sorted union of every published post's tags
//! - `GET  /api/tags/:tag` — published posts carrying `tag`
//! - `GET  /api/admin/posts` — full listing (drafts and scheduled included)
//! - `GET  /api/admin/posts/:slug` — raw blob, draft partition preferred
//! - `POST /api/admin/posts` — save `{slug?, title?, content, isDraft}`
//! - `DELETE /api/admin/posts/:slug` — remove from both partitions
//!
//! Handlers convert store faults into the response taxonomy below and never
//! leak internals: validation failures are 400s with the message, missing
//! slugs are 404s, everything else is a generic 500 logged server-side.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;

use crate::frontmatter::{self, Frontmatter};
use crate::post::{self, PostMeta};
use crate::query::Adjacent;
use crate::store::{self, Store};

/// Builds the application router over a shared [`Store`].
pub fn router(store: Arc<Store>) -> Router {
    Router::new()
        .route("/api/posts", get(list_published))
        .route("/api/posts/:slug", get(get_post))
        .route("/api/posts/:slug/adjacent", get(get_adjacent))
        .route("/api/tags", get(list_tags))
        .route("/api/tags/:tag", get(list_by_tag))
        .route("/api/admin/posts", get(list_all).post(save_post))
        .route("/api/admin/posts/:slug", get(get_post_admin).delete(delete_post))
        .with_state(store)
}

async fn list_published(
    State(store): State<Arc<Store>>,
) -> Result<Json<Vec<PostMeta>>, ApiError> {
    Ok(Json(store.list_published()?))
}

async fn list_all(State(store): State<Arc<Store>>) -> Result<Json<Vec<PostMeta>>, ApiError> {
    Ok(Json(store.list_all()?))
}

async fn get_post(
    State(store): State<Arc<Store>>,
    Path(slug): Path<String>,
) -> Result<Json<Value>, ApiError> {
    raw_response(&store, &slug, false)
}

/// Same contract as [`get_post`], but prefers the drafts partition so the
/// editor always loads the latest edit.
async fn get_post_admin(
    State(store): State<Arc<Store>>,
    Path(slug): Path<String>,
) -> Result<Json<Value>, ApiError> {
    raw_response(&store, &slug, true)
}

fn raw_response(store: &Store, slug: &str, prefer_draft: bool) -> Result<Json<Value>, ApiError> {
    match store.get_raw(slug, prefer_draft)? {
        None => Err(ApiError::NotFound),
        Some(content) => Ok(Json(json!({ "slug": slug, "content": content }))),
    }
}

async fn get_adjacent(
    State(store): State<Arc<Store>>,
    Path(slug): Path<String>,
) -> Result<Json<Adjacent>, ApiError> {
    Ok(Json(store.adjacent(&slug)?))
}

async fn list_tags(State(store): State<Arc<Store>>) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(store.all_tags()?))
}

async fn list_by_tag(
    State(store): State<Arc<Store>>,
    Path(tag): Path<String>,
) -> Result<Json<Vec<PostMeta>>, ApiError> {
    Ok(Json(store.posts_by_tag(&tag)?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaveRequest {
    /// Explicit slug; derived from `title` when absent.
    #[serde(default)]
    slug: Option<String>,

    #[serde(default)]
    title: Option<String>,

    /// The blob to persist. May arrive without a frontmatter fence, in
    /// which case one is scaffolded around it.
    #[serde(default)]
    content: String,

    #[serde(default)]
    is_draft: bool,
}

async fn save_post(
    State(store): State<Arc<Store>>,
    Json(request): Json<SaveRequest>,
) -> Result<Json<Value>, ApiError> {
    let slug = match request.slug.filter(|s| !s.is_empty()) {
        Some(slug) => slug,
        None => match request.title.as_deref().map(post::slugify) {
            Some(slug) if !slug.is_empty() => slug,
            _ => {
                return Err(ApiError::Validation(
                    "either a slug or a title is required".to_owned(),
                ))
            }
        },
    };
    if request.content.is_empty() {
        return Err(ApiError::Validation("content must not be empty".to_owned()));
    }

    let raw = if frontmatter::decode(&request.content).is_ok() {
        request.content
    } else {
        // Fence-less content comes from the plain-text editor view; wrap it
        // so the stored blob is always a valid post.
        frontmatter::encode(
            &Frontmatter {
                title: request.title.clone(),
                date: Some(chrono::Local::now().format("%Y-%m-%d").to_string()),
                published: Some(!request.is_draft),
                reading_time: Some(post::reading_time(&request.content)),
                ..Frontmatter::default()
            },
            &request.content,
        )
    };

    store.save(&slug, &raw, request.is_draft)?;
    Ok(Json(json!({ "success": true, "slug": slug })))
}

async fn delete_post(
    State(store): State<Arc<Store>>,
    Path(slug): Path<String>,
) -> Result<Json<Value>, ApiError> {
    store.delete(&slug)?;
    Ok(Json(json!({ "success": true })))
}

/// The wire-level error taxonomy. Conversion from [`store::Error`] is the
/// single place store faults meet HTTP.
#[derive(Debug)]
enum ApiError {
    NotFound,
    Validation(String),
    Internal,
}

impl From<store::Error> for ApiError {
    fn from(err: store::Error) -> ApiError {
        match err {
            store::Error::Validation(message) => ApiError::Validation(message),
            err => {
                error!(error = %err, "store operation failed");
                ApiError::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, "post not found".to_owned()),
            ApiError::Validation(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal error".to_owned(),
            ),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, Arc<Store>) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(Store::new(
            dir.path().join("posts"),
            dir.path().join("drafts"),
        ));
        (dir, store)
    }

    fn save_request(slug: &str, content: &str, is_draft: bool) -> SaveRequest {
        SaveRequest {
            slug: Some(slug.to_owned()),
            title: None,
            content: content.to_owned(),
            is_draft,
        }
    }

    #[tokio::test]
    async fn save_then_fetch_round_trips_the_blob() {
        let (_dir, store) = store();
        let blob = "---\ntitle: \"Hi\"\ndate: \"2024-01-01\"\npublished: true\n---\nBody\n";
        let saved = save_post(State(store.clone()), Json(save_request("hi", blob, false)))
            .await
            .unwrap();
        assert_eq!(saved.0["slug"], "hi");

        let fetched = get_post(State(store), Path("hi".to_owned())).await.unwrap();
        assert_eq!(fetched.0["content"], blob);
    }

    #[tokio::test]
    async fn missing_post_is_a_404() {
        let (_dir, store) = store();
        let err = get_post(State(store), Path("nope".to_owned()))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }

    #[tokio::test]
    async fn save_requires_a_slug_or_title_and_content() {
        let (_dir, store) = store();
        let request = SaveRequest {
            slug: None,
            title: None,
            content: "body".to_owned(),
            is_draft: true,
        };
        let err = save_post(State(store.clone()), Json(request))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let err = save_post(State(store), Json(save_request("slug", "", true)))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn save_derives_the_slug_from_the_title() {
        let (_dir, store) = store();
        let request = SaveRequest {
            slug: None,
            title: Some("Hello, World!".to_owned()),
            content: "Plain body without a fence.".to_owned(),
            is_draft: true,
        };
        let saved = save_post(State(store.clone()), Json(request)).await.unwrap();
        assert_eq!(saved.0["slug"], "hello-world");

        // The fence-less content was scaffolded into a valid post.
        let fetched = get_post_admin(State(store), Path("hello-world".to_owned()))
            .await
            .unwrap();
        let content = fetched.0["content"].as_str().unwrap();
        assert!(content.starts_with("---\n"));
        assert!(content.contains("title: \"Hello, World!\""));
        assert!(content.contains("published: false"));
    }

    #[tokio::test]
    async fn admin_fetch_prefers_the_draft_copy() {
        let (_dir, store) = store();
        let live = "---\ntitle: \"Live\"\npublished: true\n---\nLive body\n";
        let draft = "---\ntitle: \"Draft\"\n---\nDraft body\n";
        save_post(State(store.clone()), Json(save_request("p", live, false)))
            .await
            .unwrap();
        save_post(State(store.clone()), Json(save_request("p", draft, true)))
            .await
            .unwrap();

        let public = get_post(State(store.clone()), Path("p".to_owned()))
            .await
            .unwrap();
        assert_eq!(public.0["content"], live);
        let admin = get_post_admin(State(store), Path("p".to_owned()))
            .await
            .unwrap();
        assert_eq!(admin.0["content"], draft);
    }

    #[tokio::test]
    async fn delete_reports_success_twice() {
        let (_dir, store) = store();
        let blob = "---\ntitle: \"Bye\"\n---\nBody\n";
        save_post(State(store.clone()), Json(save_request("bye", blob, true)))
            .await
            .unwrap();

        let first = delete_post(State(store.clone()), Path("bye".to_owned()))
            .await
            .unwrap();
        assert_eq!(first.0["success"], true);
        let second = delete_post(State(store), Path("bye".to_owned()))
            .await
            .unwrap();
        assert_eq!(second.0["success"], true);
    }

    #[tokio::test]
    async fn listings_split_public_and_admin_views() {
        let (_dir, store) = store();
        let live = "---\ntitle: \"Live\"\ndate: \"2024-01-01\"\npublished: true\n---\nBody\n";
        let draft = "---\ntitle: \"WIP\"\ndate: \"2024-02-01\"\n---\nBody\n";
        save_post(State(store.clone()), Json(save_request("live", live, false)))
            .await
            .unwrap();
        save_post(State(store.clone()), Json(save_request("wip", draft, true)))
            .await
            .unwrap();

        let public = list_published(State(store.clone())).await.unwrap();
        assert_eq!(public.0.len(), 1);
        assert_eq!(public.0[0].slug, "live");

        let admin = list_all(State(store)).await.unwrap();
        assert_eq!(admin.0.len(), 2);
    }
}
