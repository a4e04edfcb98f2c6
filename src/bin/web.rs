//! EKG Chat HTTP 服务
//!
//! 启动: cargo run --bin ekg-web --features web
//! POST /api/chat，请求体 `{"content":{"text":"..."},"extendContext":{"EKG_NODE":"<token>"}}`，
//! 以 SSE 逐条返回本轮事件；客户端断开即放弃本轮。

#![cfg(feature = "web")]

use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use ekg_chat::chat::{ChannelSink, ChatRequest, ConversationInput, OutboundEvent};
use ekg_chat::config::load_config;
use ekg_chat::core::TurnController;
use futures_util::stream::{self, Stream};

struct AppState {
    controller: Arc<TurnController>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    ekg_chat::observability::init();

    let config_path = std::env::var("EKG_CONFIG").ok().map(PathBuf::from);
    let cfg = load_config(config_path).context("Failed to load config")?;
    let state = Arc::new(AppState {
        controller: Arc::new(TurnController::from_config(&cfg)),
    });

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/chat", post(api_chat))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&cfg.web.bind)
        .await
        .with_context(|| format!("Failed to bind {}", cfg.web.bind))?;
    tracing::info!("EKG Chat: http://{}", cfg.web.bind);
    axum::serve(listener, app).await?;

    Ok(())
}

/// POST /api/chat：驱动一轮对话，事件以 SSE 推送，本轮结束时流随之关闭
async fn api_chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let input = ConversationInput::from(req);
    let (sink, rx) = ChannelSink::new();
    let controller = state.controller.clone();
    tokio::spawn(async move {
        controller.run_turn(input, sink).await;
    });

    let event_stream = stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|event| (Ok(to_sse(&event)), rx))
    });
    Sse::new(event_stream).keep_alive(
        KeepAlive::new()
            .interval(std::time::Duration::from_secs(15))
            .text("keepalive"),
    )
}

fn to_sse(event: &OutboundEvent) -> Event {
    let kind = if event.is_error() { "error" } else { "message" };
    Event::default()
        .event(kind)
        .json_data(event)
        .unwrap_or_else(|e| Event::default().event("error").data(e.to_string()))
}
