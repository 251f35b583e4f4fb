mod common;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use common::fixtures::{alice, bob, harness_with_api};
use postfeed_lib::application::ports::PostApi;
use postfeed_lib::domain::entities::{NewPost, Post};
use postfeed_lib::infrastructure::api::HttpPostApi;
use postfeed_lib::infrastructure::api::wire::{ErrorEnvelope, ErrorShape, SuccessEnvelope};
use postfeed_lib::presentation::components::{CreatePostForm, SubmitOutcome};
use postfeed_lib::shared::config::ApiConfig;
use postfeed_lib::shared::{AppError, ErrorCode, Platform};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

const TOKEN: &str = "test-token";

#[derive(Clone, Default)]
struct MockServerState {
    sources: Arc<Mutex<Vec<String>>>,
    posts: Arc<Mutex<Vec<Post>>>,
}

fn error_response(status: StatusCode, error: AppError, path: &str) -> Response {
    let envelope = ErrorEnvelope {
        error: ErrorShape::from_app_error(&error, path),
    };
    (status, Json(envelope)).into_response()
}

fn is_authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == format!("Bearer {TOKEN}"))
}

async fn all_handler(State(state): State<MockServerState>, headers: HeaderMap) -> Response {
    if let Some(source) = headers
        .get("x-trpc-source")
        .and_then(|value| value.to_str().ok())
    {
        state.sources.lock().unwrap().push(source.to_string());
    }
    let posts = state.posts.lock().unwrap().clone();
    Json(SuccessEnvelope::new(posts)).into_response()
}

async fn by_id_handler(
    State(state): State<MockServerState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let input: Value = params
        .get("input")
        .and_then(|raw| serde_json::from_str(raw).ok())
        .unwrap_or(Value::Null);
    let id = input.get("id").and_then(Value::as_str).unwrap_or_default();
    let found = state
        .posts
        .lock()
        .unwrap()
        .iter()
        .find(|post| post.id == id)
        .cloned();
    Json(json!({ "result": { "data": found } })).into_response()
}

async fn create_handler(
    State(state): State<MockServerState>,
    headers: HeaderMap,
    Json(input): Json<NewPost>,
) -> Response {
    if !is_authorized(&headers) {
        return error_response(
            StatusCode::UNAUTHORIZED,
            AppError::unauthorized("UNAUTHORIZED"),
            "post.create",
        );
    }
    if let Err(fields) = input.validate() {
        return error_response(
            StatusCode::BAD_REQUEST,
            AppError::validation(fields),
            "post.create",
        );
    }
    let post = Post::new(input.title, input.content, alice());
    state.posts.lock().unwrap().insert(0, post.clone());
    Json(SuccessEnvelope::new(post)).into_response()
}

async fn delete_handler(
    State(state): State<MockServerState>,
    headers: HeaderMap,
    Json(id): Json<String>,
) -> Response {
    if id == "explode" {
        return (StatusCode::BAD_GATEWAY, "upstream exploded").into_response();
    }
    if !is_authorized(&headers) {
        return error_response(
            StatusCode::UNAUTHORIZED,
            AppError::unauthorized("UNAUTHORIZED"),
            "post.delete",
        );
    }
    state.posts.lock().unwrap().retain(|post| post.id != id);
    Json(json!({ "result": {} })).into_response()
}

async fn spawn_mock_server(state: MockServerState) -> (String, JoinHandle<()>) {
    let app = Router::new()
        .route("/api/trpc/post.all", get(all_handler))
        .route("/api/trpc/post.byId", get(by_id_handler))
        .route("/api/trpc/post.create", post(create_handler))
        .route("/api/trpc/post.delete", post(delete_handler))
        .with_state(state);
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind post api mock");
    let addr = listener.local_addr().expect("post api mock addr");
    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .expect("serve post api mock");
    });

    (format!("http://{addr}"), handle)
}

fn client(base_url: &str, token: Option<&str>, platform: Platform) -> HttpPostApi {
    let config = ApiConfig {
        base_url: base_url.to_string(),
        auth_token: token.map(str::to_string),
        request_timeout: 5,
    };
    HttpPostApi::new(&config, platform).unwrap()
}

#[tokio::test]
async fn test_all_decodes_posts_and_sends_source_header() {
    let state = MockServerState::default();
    state
        .posts
        .lock()
        .unwrap()
        .push(Post::new("Hi".into(), "there".into(), bob()));
    let (base_url, server) = spawn_mock_server(state.clone()).await;

    let posts = client(&base_url, None, Platform::Mobile).all().await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].title, "Hi");
    assert_eq!(posts[0].author.name.as_deref(), Some("Bob"));
    assert_eq!(*state.sources.lock().unwrap(), vec!["expo-react"]);

    server.abort();
}

#[tokio::test]
async fn test_by_id_sends_input_and_maps_null_to_none() {
    let state = MockServerState::default();
    let post = Post::new("Hi".into(), "there".into(), bob());
    state.posts.lock().unwrap().push(post.clone());
    let (base_url, server) = spawn_mock_server(state).await;

    let api = client(&base_url, None, Platform::Web);
    assert_eq!(api.by_id(&post.id).await.unwrap(), Some(post));
    assert_eq!(api.by_id("missing").await.unwrap(), None);

    server.abort();
}

#[tokio::test]
async fn test_create_without_token_is_unauthorized() {
    let (base_url, server) = spawn_mock_server(MockServerState::default()).await;

    let err = client(&base_url, None, Platform::Web)
        .create(&NewPost::new("Hello", "World"))
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());

    server.abort();
}

#[tokio::test]
async fn test_create_validation_error_carries_field_errors() {
    let (base_url, server) = spawn_mock_server(MockServerState::default()).await;

    let err = client(&base_url, Some(TOKEN), Platform::Web)
        .create(&NewPost::new("", "World"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::BadRequest));
    let fields = err.field_errors().unwrap();
    assert_eq!(fields.first("title"), Some("Title is required"));
    assert_eq!(fields.first("content"), None);

    server.abort();
}

#[tokio::test]
async fn test_create_and_delete_with_token() {
    let state = MockServerState::default();
    let (base_url, server) = spawn_mock_server(state.clone()).await;
    let api = client(&base_url, Some(TOKEN), Platform::Web);

    let created = api.create(&NewPost::new("Hello", "World")).await.unwrap();
    assert_eq!(created.author.id, "alice");
    assert_eq!(api.all().await.unwrap().len(), 1);

    api.delete(&created.id).await.unwrap();
    assert!(state.posts.lock().unwrap().is_empty());

    server.abort();
}

#[tokio::test]
async fn test_non_json_error_body_maps_from_http_status() {
    let (base_url, server) = spawn_mock_server(MockServerState::default()).await;

    let err = client(&base_url, Some(TOKEN), Platform::Web)
        .delete("explode")
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::InternalServerError));
    assert!(err.to_string().contains("upstream exploded"));

    server.abort();
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(&format!("http://{addr}"), None, Platform::Web)
        .all()
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Network(_)));
}

#[tokio::test]
async fn test_form_shows_server_field_errors_inline() {
    let (base_url, server) = spawn_mock_server(MockServerState::default()).await;
    let api = Arc::new(client(&base_url, Some(TOKEN), Platform::Web));
    let harness = harness_with_api(api, Platform::Web);

    let form = CreatePostForm::new(&harness.state);
    form.set_title("Hello").await;

    assert!(matches!(form.submit().await, SubmitOutcome::Invalid(_)));
    let view = form.view().await;
    assert_eq!(view.content_error.as_deref(), Some("Content is required"));
    assert_eq!(view.title_error, None);
    assert_eq!(view.title, "Hello");

    server.abort();
}
