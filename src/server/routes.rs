//! HTTP route handlers for the conversation explorer API.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::services::ServeDir;

use crate::archive::{
    ConversationDetail, ConversationSummary, SearchHit, conversation_detail, list_conversations,
    search_conversations,
};

use super::state::AppState;

/// UI shell served at `/`.
const INDEX_HTML: &str = include_str!("../../static/index.html");

/// Create the API router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    let static_files = ServeDir::new(&state.static_dir);

    Router::new()
        .route("/", get(index_page))
        .route("/health", get(health_check))
        .route("/api/conversations", get(list_all))
        .route("/api/conversation", get(get_conversation))
        .route("/api/search", get(search))
        .fallback_service(static_files)
        .with_state(state)
}

async fn index_page() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Health check endpoint.
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "conversation-explorer",
        "version": env!("CARGO_PKG_VERSION"),
        "conversations": state.store.len()
    }))
}

/// List every conversation, newest first.
async fn list_all(State(state): State<Arc<AppState>>) -> Json<Vec<ConversationSummary>> {
    Json(list_conversations(state.store.get_all()))
}

/// Query string of `/api/conversation`.
#[derive(Debug, Deserialize)]
pub struct ConversationParams {
    /// Conversation id.
    pub id: Option<String>,
}

/// Fetch one conversation with flattened messages.
async fn get_conversation(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ConversationParams>,
) -> Result<Json<ConversationDetail>, (StatusCode, String)> {
    let id = params
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| (StatusCode::BAD_REQUEST, "Missing conversation ID".to_string()))?;

    conversation_detail(state.store.get_all(), &id)
        .map(Json)
        .ok_or_else(|| (StatusCode::NOT_FOUND, "Conversation not found".to_string()))
}

/// Query string of `/api/search`.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Search text; missing behaves like empty.
    pub q: Option<String>,
}

/// Substring search over names, summaries and messages.
async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Json<Vec<SearchHit>> {
    let query = params.q.unwrap_or_default();
    Json(search_conversations(state.store.get_all(), &query))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::ConversationStore;
    use crate::archive::store::index_records;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{Value, json};
    use std::path::{Path, PathBuf};
    use tower::ServiceExt;

    fn test_router(static_dir: &Path) -> Router {
        let index = index_records(vec![
            json!({
                "uuid": "a",
                "name": "Deploy notes",
                "created_at": "2024-02-01T10:00:00Z",
                "chat_messages": [{"uuid": "m1", "sender": "human", "text": "ship it"}]
            }),
            json!({"uuid": "b", "name": "Groceries", "created_at": "2024-03-01T10:00:00Z"}),
        ]);
        let conversations = index.into_values();
        let store = ConversationStore::from_conversations(conversations);
        create_router(AppState::from_store(store, static_dir.to_path_buf()))
    }

    async fn get(router: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let resp = router.oneshot(req).await.unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, Value) {
        let (status, body) = get(router, uri).await;
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    fn no_static() -> PathBuf {
        PathBuf::from("/nonexistent-static-dir")
    }

    #[tokio::test]
    async fn test_list_conversations_newest_first() {
        let (status, body) = get_json(test_router(&no_static()), "/api/conversations").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["uuid"], "b");
        assert_eq!(body[1]["uuid"], "a");
        assert_eq!(body[1]["message_count"], 1);
    }

    #[tokio::test]
    async fn test_get_conversation() {
        let (status, body) = get_json(test_router(&no_static()), "/api/conversation?id=a").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Deploy notes");
        assert_eq!(body["messages"][0]["content"], "ship it");
        assert_eq!(body["messages"][0]["sender"], "human");
    }

    #[tokio::test]
    async fn test_get_conversation_missing_id_is_bad_request() {
        let (status, _) = get(test_router(&no_static()), "/api/conversation").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = get(test_router(&no_static()), "/api/conversation?id=").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_get_conversation_unknown_id_is_not_found() {
        let (status, _) = get(test_router(&no_static()), "/api/conversation?id=zzz").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_search_endpoint() {
        let (_, empty) = get_json(test_router(&no_static()), "/api/search?q=").await;
        assert_eq!(empty, json!([]));

        let (_, missing) = get_json(test_router(&no_static()), "/api/search").await;
        assert_eq!(missing, json!([]));

        let (_, none) = get_json(test_router(&no_static()), "/api/search?q=xyz123nomatch").await;
        assert_eq!(none, json!([]));

        let (status, hits) = get_json(test_router(&no_static()), "/api/search?q=SHIP").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            hits,
            json!([{
                "uuid": "a",
                "name": "Deploy notes",
                "summary": "",
                "created_at": "2024-02-01T10:00:00Z",
                "match_type": "message"
            }])
        );
    }

    #[tokio::test]
    async fn test_index_and_health() {
        let (status, body) = get(test_router(&no_static()), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8_lossy(&body).contains("/api/conversations"));

        let (status, health) = get_json(test_router(&no_static()), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(health["conversations"], 2);
    }

    #[tokio::test]
    async fn test_index_escapes_attribute_quotes() {
        let (_, body) = get(test_router(&no_static()), "/").await;
        let page = String::from_utf8_lossy(&body);

        assert!(page.contains(r#"'"': '&quot;'"#));
        assert!(page.contains(r#""'": '&#39;'"#));
        assert!(!page.contains("div.innerHTML"));
    }

    #[tokio::test]
    async fn test_static_fallback() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();

        let (status, body) = get(test_router(dir.path()), "/notes.txt").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"hello");

        let (status, _) = get(test_router(dir.path()), "/absent.txt").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
