//! The SSE chat handler.
//!
//! Wires one request through the full streaming path: history replay, the
//! stream emitter, and the detached persistence task. Frames are bridged
//! from the emitter's channel into the response body as server-sent
//! events. Any setup failure before streaming begins is still an HTTP 500
//! with the error text; once streaming starts, failures arrive as terminal
//! `error` frames.

use super::request::ChatRequest;
use super::routes::AppState;
use axum::{
    extract::{State, rejection::JsonRejection},
    http::{HeaderName, HeaderValue, StatusCode, header},
    response::{
        IntoResponse, Response,
        sse::{Event, Sse},
    },
    Json,
};
use counsel_application::{FALLBACK_MESSAGE, StreamChatUseCase, TurnRequest, completion};
use counsel_domain::{ErrorKind, Message, Role, StreamFrame, latest_user_query};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(json) => json,
        Err(rejection) => {
            warn!("chat request rejected: {rejection}");
            return (StatusCode::INTERNAL_SERVER_ERROR, rejection.to_string()).into_response();
        }
    };

    let identifiers = request.identifiers();
    info!(chat_id = %identifiers.chat_id, "chat request received");

    // Replay recent turns, then append the incoming message.
    let mut messages = state
        .recent_history
        .execute(
            &identifiers.user_id,
            &identifiers.room_id,
            state.history_turns,
        )
        .await;
    match request.message.role.parse::<Role>() {
        Ok(role) => messages.push(Message {
            role,
            content: request.message.content.clone(),
        }),
        Err(e) => warn!("ignoring message: {e}"),
    }

    let (handle, waiter) = completion::channel(StreamChatUseCase::new_message_id());
    let (frame_tx, frame_rx) = mpsc::channel::<StreamFrame>(32);

    let turn_request = TurnRequest {
        user_query: latest_user_query(&messages).unwrap_or_default().to_string(),
        model: state.stream_chat.model_name().to_string(),
        identifiers,
        started_at: Instant::now(),
    };
    // Detached: the handshake owns its own lifetime from here.
    let _ = state.persist_turn.spawn(turn_request, waiter);

    let stream_chat = state.stream_chat.clone();
    tokio::spawn(async move {
        stream_chat.execute(messages, frame_tx, handle).await;
    });

    let frames = futures::stream::unfold(frame_rx, |mut rx| async move {
        let frame = rx.recv().await?;
        Some((encode_frame(&frame), rx))
    });

    let mut response = Sse::new(frames).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(
        HeaderName::from_static("x-accel-buffering"),
        HeaderValue::from_static("no"),
    );
    response
}

/// Encode one frame as an SSE event.
///
/// An unencodable frame must not kill the stream silently: the consumer
/// gets a terminal `error` frame with the fixed fallback sentence instead.
fn encode_frame(frame: &StreamFrame) -> Result<Event, Infallible> {
    match serde_json::to_string(frame) {
        Ok(json) => Ok(Event::default().data(json)),
        Err(e) => {
            error!(kind = %ErrorKind::Serialization, "failed to encode stream frame: {e}");
            let fallback = serde_json::to_string(&StreamFrame::error(FALLBACK_MESSAGE))
                .unwrap_or_else(|_| format!("{{\"type\":\"error\",\"errorText\":\"{FALLBACK_MESSAGE}\"}}"));
            Ok(Event::default().data(fallback))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::routes::build_router;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use counsel_application::{
        NoConversationStore, PersistTurnUseCase, RecentHistoryUseCase, SafeChatModel,
        ports::chat_model::{Binding, ChatModel, ModelError, TokenStream},
    };
    use tower::ServiceExt;

    struct ScriptedModel {
        fragments: Vec<&'static str>,
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        fn name(&self) -> &str {
            "gpt-4o"
        }

        async fn invoke(&self, _messages: &[Message]) -> Result<String, ModelError> {
            Ok("죄송합니다. 잠시 후 다시 시도해 주세요.".to_string())
        }

        async fn stream(&self, _messages: &[Message]) -> Result<TokenStream, ModelError> {
            let (tx, rx) = mpsc::channel(8);
            for fragment in &self.fragments {
                tx.send(Ok(fragment.to_string())).await.unwrap();
            }
            Ok(TokenStream::new(rx))
        }

        fn rebind(&self, _binding: Binding) -> Result<Arc<dyn ChatModel>, ModelError> {
            Ok(Arc::new(Self {
                fragments: self.fragments.clone(),
            }))
        }
    }

    fn test_router(fragments: Vec<&'static str>) -> axum::Router {
        let model = SafeChatModel::new(Arc::new(ScriptedModel { fragments }));
        let store = Arc::new(NoConversationStore);
        build_router(Arc::new(AppState {
            stream_chat: StreamChatUseCase::new(model),
            persist_turn: PersistTurnUseCase::new(store.clone()),
            recent_history: RecentHistoryUseCase::new(store),
            history_turns: 10,
        }))
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn frame_types(body: &str) -> Vec<String> {
        body.lines()
            .filter_map(|line| line.strip_prefix("data: "))
            .map(|data| {
                let value: serde_json::Value = serde_json::from_str(data).unwrap();
                value["type"].as_str().unwrap().to_string()
            })
            .collect()
    }

    #[tokio::test]
    async fn chat_streams_the_frame_sequence() {
        let router = test_router(vec!["안", "녕하세요"]);
        let response = router
            .oneshot(
                Request::post("/api/chat")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"chatId": "chat-1", "message": {"role": "user", "content": "안녕"}}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/event-stream"
        );
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            "no-cache"
        );
        assert_eq!(response.headers().get("x-accel-buffering").unwrap(), "no");

        let body = body_text(response).await;
        assert_eq!(
            frame_types(&body),
            vec!["start", "text-start", "text-delta", "text-delta", "text-end", "finish"]
        );
        assert!(body.contains("안"));
        assert!(body.contains("녕하세요"));
    }

    #[tokio::test]
    async fn malformed_body_is_a_plain_500() {
        let router = test_router(vec![]);
        let response = router
            .oneshot(
                Request::post("/api/chat")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body_text(response).await.is_empty());
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let router = test_router(vec![]);
        let response = router
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("healthy"));
    }
}
