//! Usion Arena Server
//!
//! Authoritative real-time WebSocket server for the two-player space-combat
//! arena: verifies the upgrade token, runs the fixed-step simulation for
//! each room, and streams world state to both players.
//!
//! # Quick Start
//!
//! ```bash
//! # Start the arena server
//! cargo run -p usion-server
//!
//! # Override the listen port
//! cargo run -p usion-server -- --port 9000
//! ```

mod config;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::{
    extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use clap::Parser;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, instrument, warn};

use usion_gateway::{dispatch, ConnDispatchState, DispatchAction, GatewayState, PreAuthBuffer};
use usion_net::{inbound_type, outbound_type, payloads, InboundEnvelope, Outbound};
use usion_room::{outbound_channel, OutboundMessage, RoomRegistry};

use crate::config::Config;

// ============================================================================
// CLI
// ============================================================================

#[derive(Parser)]
#[command(name = "usion-arena")]
#[command(about = "Usion Arena - authoritative space-combat server")]
struct Cli {
    /// Port to listen on (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,
}

// ============================================================================
// Application State
// ============================================================================

struct AppState {
    gateway: GatewayState,
    shutting_down: AtomicBool,
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

// ============================================================================
// Routes
// ============================================================================

async fn healthz() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "ok",
        "service": "usion-arena",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn ws_handler(
    Query(query): Query<TokenQuery>,
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> axum::response::Response {
    if state.shutting_down.load(Ordering::Relaxed) {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    ws.on_upgrade(move |socket| handle_socket(socket, query.token, state)).into_response()
}

/// Per-socket connection lifecycle (§4.6): extract the token, authenticate
/// while buffering any frames that race ahead of verification, then hand
/// every subsequent frame to the dispatcher until `leave` or a closed
/// socket.
async fn handle_socket(socket: WebSocket, token: Option<String>, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let Some(token) = token else {
        send_frame(&mut sender, outbound_type::ERROR, payloads::ErrorPayload::no_token()).await;
        let _ = sender.close().await;
        return;
    };

    let mut pre_auth = PreAuthBuffer::new();
    let auth_fut = state.gateway.authenticate(&token);
    tokio::pin!(auth_fut);

    let ctx = loop {
        tokio::select! {
            result = &mut auth_fut => {
                match result {
                    Ok(ctx) => break ctx,
                    Err(err) => {
                        warn!(error = %err, "websocket upgrade token failed verification");
                        let message = err.client_message().unwrap_or_else(|| "authentication failed".to_string());
                        send_frame(&mut sender, outbound_type::ERROR, payloads::ErrorPayload::invalid_token(message)).await;
                        let _ = sender.close().await;
                        return;
                    }
                }
            }
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Ok(envelope) = serde_json::from_str::<InboundEnvelope>(&text) {
                            if !pre_auth.push(envelope) {
                                warn!("pre-auth frame buffer full, dropping frame until authentication completes");
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => return,
                    Some(Err(_)) => return,
                    _ => {}
                }
            }
        }
    };

    run_connection(sender, receiver, ctx, pre_auth, state).await;
}

#[instrument(skip(sender, receiver, ctx, pre_auth, state), fields(room_id = %ctx.room_id, user_id = %ctx.user_id))]
async fn run_connection(
    sender: futures::stream::SplitSink<WebSocket, Message>,
    mut receiver: futures::stream::SplitStream<WebSocket>,
    ctx: usion_gateway::ConnectionContext,
    mut pre_auth: PreAuthBuffer,
    state: Arc<AppState>,
) {
    let room = state.gateway.registry().get_or_create(&ctx.room_id);
    let (tx, mut outbound_rx) = outbound_channel();

    let mut writer_task = tokio::spawn(async move {
        while let Some(msg) = outbound_rx.recv().await {
            match msg {
                OutboundMessage::Frame(json) => {
                    if sender.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                OutboundMessage::Close(code) => {
                    let _ = sender
                        .send(Message::Close(Some(CloseFrame { code, reason: "".into() })))
                        .await;
                    break;
                }
            }
        }
    });

    let mut dispatch_state = ConnDispatchState::new(tx);
    let mut left = false;

    for envelope in pre_auth.drain() {
        if dispatch(&room, &ctx, &mut dispatch_state, envelope) == DispatchAction::Close {
            left = true;
        }
    }

    if !left {
        loop {
            tokio::select! {
                msg = receiver.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            let Ok(envelope) = serde_json::from_str::<InboundEnvelope>(&text) else {
                                continue;
                            };
                            if dispatch(&room, &ctx, &mut dispatch_state, envelope) == DispatchAction::Close {
                                left = true;
                                break;
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Err(_)) => break,
                        _ => {}
                    }
                }
                _ = &mut writer_task => break,
            }
        }
    }

    if !left {
        let leave = synthetic_leave_envelope();
        dispatch(&room, &ctx, &mut dispatch_state, leave);
    }

    writer_task.abort();
    state.gateway.registry().prune(&ctx.room_id);
    info!("connection closed");
}

/// A socket that disconnects without sending an explicit `leave` frame still
/// needs `Room::remove_session` invoked so the room's participant table and
/// §4.5.6 disconnect-termination check run.
fn synthetic_leave_envelope() -> InboundEnvelope {
    serde_json::from_value(serde_json::json!({"type": inbound_type::LEAVE, "payload": {}})).expect("static leave envelope is valid")
}

async fn send_frame(sender: &mut futures::stream::SplitSink<WebSocket, Message>, msg_type: &'static str, payload: impl serde::Serialize) {
    if let Ok(json) = Outbound::new(msg_type, payload).to_json() {
        let _ = sender.send(Message::Text(json)).await;
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(port) = cli.port {
        config.port = port;
    }

    info!("Starting Usion Arena Server");
    info!("==============================");
    info!("  Port: {}", config.port);
    info!("  Sim tick rate: {} Hz", config.sim_tick_hz);
    info!("  Network rate: {} Hz", config.network_hz);
    info!("  Deploy region: {}", config.deploy_region);
    info!("==============================");

    let registry = RoomRegistry::new(config.room_config(), config.webhook_config());
    let verifier = usion_auth::TokenVerifier::new(config.verifier_config());
    let gateway = GatewayState::new(verifier, registry, config.service_id.clone());

    let state = Arc::new(AppState {
        gateway,
        shutting_down: AtomicBool::new(false),
    });

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/ws", get(ws_handler))
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Listening on http://{}", addr);
    info!("WebSocket: ws://localhost:{}/ws", config.port);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state))
        .await?;

    Ok(())
}

/// Waits for `SIGINT`/`ctrl-c`, flips the shared flag so `ws_handler` rejects
/// new upgrades, then returns so `axum::serve` stops accepting and waits out
/// the in-flight connections (§3.3).
async fn shutdown_signal(state: Arc<AppState>) {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received, no longer accepting new connections");
    state.shutting_down.store(true, Ordering::Relaxed);
}
