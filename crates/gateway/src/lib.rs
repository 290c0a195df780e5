//! HTTP API gateway for GraphChat.
//!
//! Exposes the chat engine over REST plus SSE: chats are created and
//! listed as JSON resources, a submitted message streams its turn's
//! progress as server-sent events, and a staged request is confirmed
//! with an immediate ack while the fetch runs detached.
//!
//! Built on Axum.

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event as SseEvent, Sse},
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use graphchat_chat::ChatEngine;
use graphchat_core::message::{ChatHandle, ChatId};
use graphchat_core::provider::Provider;
use graphchat_core::session::SessionProvider;
use graphchat_core::store::{ChatRecord, ChatStore};
use graphchat_core::stream::{Progress, StreamHandle};
use graphchat_core::view::{View, ViewEntry};
use graphchat_core::Error;
use graphchat_providers::OpenAiCompatProvider;
use graphchat_storage::{AnonymousSessionProvider, FileChatStore, InMemoryChatStore, StaticSessionProvider};
use graphchat_subgraph::SubgraphClient;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub engine: ChatEngine,
    /// Live chat handles, keyed by chat id. Stored chats are rehydrated
    /// here on first access.
    pub chats: RwLock<HashMap<ChatId, ChatHandle>>,
}

type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState, cors: bool) -> Router {
    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/api/chats", post(create_chat_handler).get(list_chats_handler))
        .route("/api/chats/{id}", get(get_chat_handler))
        .route("/api/chats/{id}/messages", post(send_message_handler))
        .route("/api/chats/{id}/confirm", post(confirm_handler))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state);

    if cors {
        // Browser clients connect from arbitrary dev origins
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

/// Start the gateway HTTP server.
pub async fn start(config: graphchat_config::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let api_key = config
        .api_key
        .clone()
        .ok_or("No API key configured, set GRAPHCHAT_API_KEY or api_key in config.toml")?;
    let provider: Arc<dyn Provider> = Arc::new(OpenAiCompatProvider::new(
        "openai",
        config.api_base.clone(),
        api_key,
    )?);

    let store: Arc<dyn ChatStore> = match config.storage.backend.as_str() {
        "memory" => Arc::new(InMemoryChatStore::new()),
        _ => Arc::new(FileChatStore::new(config.storage.data_dir.clone())?),
    };

    let sessions: Arc<dyn SessionProvider> = match &config.storage.user_id {
        Some(user_id) => Arc::new(StaticSessionProvider::new(user_id.clone())),
        None => Arc::new(AnonymousSessionProvider),
    };

    let subgraph = Arc::new(SubgraphClient::new(
        config.graph.clone(),
        config.fetch.timeout_secs,
    )?);
    let engine = ChatEngine::new(provider, store, sessions, subgraph, &config);

    let state = Arc::new(GatewayState {
        engine,
        chats: RwLock::new(HashMap::new()),
    });
    let app = build_router(state, config.gateway.cors);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    provider: &'static str,
}

/// `GET /health` — Gateway liveness plus the provider's reachability.
async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    let provider = if state.engine.provider_healthy().await {
        "ok"
    } else {
        "unreachable"
    };
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        provider,
    })
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

#[derive(Serialize)]
struct CreateChatResponse {
    id: ChatId,
}

/// `POST /api/chats` — Create a new empty chat.
async fn create_chat_handler(State(state): State<SharedState>) -> Json<CreateChatResponse> {
    let chat = ChatHandle::default();
    let id = chat.id().clone();
    state.chats.write().await.insert(id.clone(), chat);
    info!(chat_id = %id, "Chat created");
    Json(CreateChatResponse { id })
}

/// `GET /api/chats` — The current session's chats, most recent first.
async fn list_chats_handler(
    State(state): State<SharedState>,
) -> Result<Json<Vec<ChatRecord>>, ApiError> {
    let records = state.engine.list_chats().await.map_err(|e| {
        warn!(error = %e, "Chat listing failed");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    Ok(Json(records))
}

#[derive(Serialize)]
struct TranscriptResponse {
    id: ChatId,
    entries: Vec<ViewEntry>,
}

/// `GET /api/chats/{id}` — The projected transcript of one chat.
async fn get_chat_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<TranscriptResponse>, ApiError> {
    let chat = resolve_chat(&state, &ChatId::from(&id)).await?;
    let snapshot = chat.snapshot().await;
    Ok(Json(TranscriptResponse {
        id: snapshot.id.clone(),
        entries: graphchat_chat::project(&snapshot),
    }))
}

#[derive(Deserialize)]
struct SendMessageRequest {
    text: String,
}

/// `POST /api/chats/{id}/messages` — Submit a message, receive an SSE
/// stream of the turn's progress.
///
/// Events are named `pending`, `partial`, `done`, or `error`; each data
/// payload is the serialized progress state. The stream closes after the
/// terminal event.
async fn send_message_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(payload): Json<SendMessageRequest>,
) -> Result<Sse<impl futures::Stream<Item = Result<SseEvent, Infallible>>>, ApiError> {
    let chat = resolve_chat(&state, &ChatId::from(&id)).await?;

    let turn = state
        .engine
        .submit_user_message(&chat, payload.text)
        .await
        .map_err(|e| match e {
            Error::InvalidInput(reason) => api_error(StatusCode::BAD_REQUEST, reason),
            other => api_error(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
        })?;

    let (tx, rx) = tokio::sync::mpsc::channel::<Progress<View>>(16);
    tokio::spawn(forward_progress(turn.view, tx));

    let stream = ReceiverStream::new(rx).map(|progress| {
        let data = serde_json::to_string(&progress).unwrap_or_default();
        Ok(SseEvent::default()
            .event(progress_event_name(&progress))
            .data(data))
    });

    Ok(Sse::new(stream))
}

/// Pump a turn's watch-backed view into an mpsc channel for SSE delivery.
/// Ends after the terminal state, or when either side goes away.
async fn forward_progress(
    mut view: StreamHandle<View>,
    tx: tokio::sync::mpsc::Sender<Progress<View>>,
) {
    loop {
        let progress = view.current();
        let done = progress.is_done();
        if tx.send(progress).await.is_err() {
            return;
        }
        if done || !view.changed().await {
            return;
        }
    }
}

fn progress_event_name(progress: &Progress<View>) -> &'static str {
    match progress {
        Progress::Pending => "pending",
        Progress::Partial { .. } => "partial",
        Progress::Done {
            value: View::Error { .. },
        } => "error",
        Progress::Done { .. } => "done",
    }
}

#[derive(Deserialize)]
struct ConfirmRequest {
    graphql_query: String,
    protocol: String,
}

#[derive(Serialize)]
struct ConfirmResponse {
    chat_id: ChatId,
    progress: Progress<View>,
}

/// `POST /api/chats/{id}/confirm` — Confirm a staged GraphQL request.
///
/// The fetch runs on a detached task; the response is an immediate ack
/// carrying the initial progress state. The outcome lands in the
/// transcript and is visible on the next `GET /api/chats/{id}`.
async fn confirm_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(payload): Json<ConfirmRequest>,
) -> Result<Json<ConfirmResponse>, ApiError> {
    if payload.graphql_query.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "empty graphql_query"));
    }

    let chat_id = ChatId::from(&id);
    let chat = resolve_chat(&state, &chat_id).await?;

    let handles = state
        .engine
        .confirm_request(&chat, payload.graphql_query, payload.protocol);

    Ok(Json(ConfirmResponse {
        chat_id,
        progress: handles.progress.current(),
    }))
}

/// Find a live handle for the chat, rehydrating from the store when the
/// gateway has not seen it yet.
async fn resolve_chat(state: &GatewayState, id: &ChatId) -> Result<ChatHandle, ApiError> {
    if let Some(chat) = state.chats.read().await.get(id).cloned() {
        return Ok(chat);
    }

    let restored = state.engine.restore_chat(id).await.map_err(|e| {
        warn!(chat_id = %id, error = %e, "Chat restore failed");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    match restored {
        Some(chat) => {
            // A concurrent restore may have won; keep whichever landed first
            let chat = state
                .chats
                .write()
                .await
                .entry(id.clone())
                .or_insert(chat)
                .clone();
            Ok(chat)
        }
        None => Err(api_error(
            StatusCode::NOT_FOUND,
            format!("no such chat: {id}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use graphchat_config::AppConfig;
    use graphchat_providers::mock::{MockProvider, ScriptedTurn};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_state(provider: MockProvider) -> SharedState {
        let mut config = AppConfig::default();
        // Unroutable endpoint so nothing leaves the host
        config.graph.endpoint_base = "http://127.0.0.1:9/id".into();
        config.fetch.timeout_secs = 1;
        let subgraph =
            Arc::new(SubgraphClient::new(config.graph.clone(), config.fetch.timeout_secs).unwrap());
        let engine = ChatEngine::new(
            Arc::new(provider),
            Arc::new(InMemoryChatStore::new()),
            Arc::new(StaticSessionProvider::new("alice")),
            subgraph,
            &config,
        );
        Arc::new(GatewayState {
            engine,
            chats: RwLock::new(HashMap::new()),
        })
    }

    fn app(state: SharedState) -> Router {
        build_router(state, true)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn create_chat(app: &Router) -> String {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/chats")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await["id"].as_str().unwrap().to_string()
    }

    fn json_post(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_endpoint() {
        let app = app(test_state(MockProvider::text("unused")));

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["provider"], "ok");
    }

    #[tokio::test]
    async fn new_chat_has_an_empty_transcript() {
        let app = app(test_state(MockProvider::text("unused")));
        let id = create_chat(&app).await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/chats/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["id"], id);
        assert_eq!(json["entries"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn message_turn_streams_progress_to_done() {
        let app = app(test_state(MockProvider::new(vec![ScriptedTurn::TextStream(
            vec!["Indexers secure ".into(), "the network.".into()],
        )])));
        let id = create_chat(&app).await;

        let response = app
            .clone()
            .oneshot(json_post(
                &format!("/api/chats/{id}/messages"),
                serde_json::json!({"text": "what do indexers do?"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_text(response).await;
        assert!(body.contains("event: done"));
        assert!(body.contains("Indexers secure the network."));

        // The committed turn is visible in the projected transcript
        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/chats/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["entries"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn provider_failure_streams_an_error_event() {
        let app = app(test_state(MockProvider::new(vec![ScriptedTurn::Fail(
            graphchat_core::error::ProviderError::ApiError {
                status_code: 500,
                message: "upstream exploded".into(),
            },
        )])));
        let id = create_chat(&app).await;

        let response = app
            .oneshot(json_post(
                &format!("/api/chats/{id}/messages"),
                serde_json::json!({"text": "hello"}),
            ))
            .await
            .unwrap();

        let body = body_text(response).await;
        assert!(body.contains("event: error"));
        assert!(body.contains("upstream exploded"));
    }

    #[tokio::test]
    async fn empty_message_is_rejected() {
        let app = app(test_state(MockProvider::text("unused")));
        let id = create_chat(&app).await;

        let response = app
            .oneshot(json_post(
                &format!("/api/chats/{id}/messages"),
                serde_json::json!({"text": "   "}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_chat_is_not_found() {
        let app = app(test_state(MockProvider::text("unused")));

        let response = app
            .oneshot(json_post(
                "/api/chats/does-not-exist/messages",
                serde_json::json!({"text": "hello"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn confirm_acks_immediately_with_pending_progress() {
        let app = app(test_state(MockProvider::text("unused")));
        let id = create_chat(&app).await;

        let response = app
            .oneshot(json_post(
                &format!("/api/chats/{id}/confirm"),
                serde_json::json!({
                    "graphql_query": "{ epoches { id } }",
                    "protocol": "Uniswap V3"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["chat_id"], id);
        assert_eq!(json["progress"]["state"], "partial");
        assert_eq!(json["progress"]["value"]["kind"], "pending");
        assert_eq!(json["progress"]["value"]["text"], "Calling Uniswap V3...");
    }

    #[tokio::test]
    async fn confirm_rejects_an_empty_query() {
        let app = app(test_state(MockProvider::text("unused")));
        let id = create_chat(&app).await;

        let response = app
            .oneshot(json_post(
                &format!("/api/chats/{id}/confirm"),
                serde_json::json!({"graphql_query": "  ", "protocol": "Graph Network"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn finished_turns_show_up_in_the_chat_list() {
        let app = app(test_state(MockProvider::text("noted")));
        let id = create_chat(&app).await;

        let response = app
            .clone()
            .oneshot(json_post(
                &format!("/api/chats/{id}/messages"),
                serde_json::json!({"text": "remember me"}),
            ))
            .await
            .unwrap();
        // Drain the SSE body so the turn is committed before listing
        body_text(response).await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/chats")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        let list = json.as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["id"], id);
        assert_eq!(list[0]["title"], "remember me");
        assert_eq!(list[0]["user_id"], "alice");
    }

    #[tokio::test]
    async fn persisted_chats_are_rehydrated_on_access() {
        let state = test_state(MockProvider::text("archived reply"));
        let app = app(state.clone());
        let id = create_chat(&app).await;

        let response = app
            .clone()
            .oneshot(json_post(
                &format!("/api/chats/{id}/messages"),
                serde_json::json!({"text": "archive this"}),
            ))
            .await
            .unwrap();
        body_text(response).await;

        // Forget the live handle; the store still has the transcript
        state.chats.write().await.clear();

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/chats/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["entries"].as_array().unwrap().len(), 2);
    }
}
