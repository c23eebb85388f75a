//! WebSocket Handler
//!
//! 客户端连接后发送一条 StoryRequest JSON，服务端逐个场景推送事件，运行结束后关闭连接。
//! 客户端中途断开时丢弃事件流，剩余场景不再调用后端。

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures_util::{
    stream::{self, BoxStream},
    SinkExt, StreamExt,
};
use std::sync::Arc;

use crate::application::{ApplicationError, IllustrateStory, PreviewScenes};
use crate::infrastructure::events::{run_events, IllustrationEvent};
use crate::infrastructure::http::dto::StoryRequest;
use crate::infrastructure::http::state::AppState;

/// 生成 WebSocket 连接处理
pub async fn illustrate_websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_illustrate_socket(socket, state))
}

/// 校验请求并返回事件流；前置条件失败时只有一个 RunRejected
pub fn illustration_events(
    state: &AppState,
    body: StoryRequest,
) -> BoxStream<'static, IllustrationEvent> {
    let prepared = body
        .into_generation_request(&state.generation)
        .and_then(|request| {
            let previews = state
                .preview_handler
                .handle(PreviewScenes::from(&request))?;
            let run = state.illustrate_handler.handle(IllustrateStory { request })?;
            Ok::<_, ApplicationError>((run, previews))
        });

    match prepared {
        Ok((run, previews)) => run_events(run, previews),
        Err(e) => {
            tracing::warn!(error = %e, "Generation run rejected");
            stream::iter([IllustrationEvent::rejected(&e)]).boxed()
        }
    }
}

/// 等待客户端发送第一条文本消息
async fn receive_request(
    receiver: &mut futures_util::stream::SplitStream<WebSocket>,
) -> Option<Result<StoryRequest, String>> {
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                return Some(
                    serde_json::from_str(&text).map_err(|e| format!("Invalid request: {}", e)),
                )
            }
            Ok(Message::Close(_)) | Err(_) => return None,
            _ => {}
        }
    }
    None
}

async fn handle_illustrate_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    tracing::info!("Illustrate WebSocket connected");

    let mut events = match receive_request(&mut receiver).await {
        Some(Ok(body)) => illustration_events(&state, body),
        Some(Err(error)) => stream::iter([IllustrationEvent::RunRejected { error }]).boxed(),
        None => {
            tracing::info!("WebSocket closed before a request was sent");
            return;
        }
    };

    loop {
        // 等待下一个事件的同时监听客户端断开
        let event = tokio::select! {
            event = events.next() => event,
            msg = receiver.next() => match msg {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => {
                    tracing::info!("WebSocket closed by client, cancelling run");
                    break;
                }
                _ => continue,
            },
        };

        let Some(event) = event else { break };

        let msg = match serde_json::to_string(&event) {
            Ok(json) => Message::Text(json),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize event");
                continue;
            }
        };

        if let Err(e) = sender.send(msg).await {
            tracing::debug!(error = %e, "Failed to send WebSocket message");
            break;
        }
    }

    drop(events);
    let _ = sender.close().await;
    tracing::info!("Illustrate WebSocket disconnected");
}
