//! WebSocket server: accept loop and per-viewer session tasks.
//!
//! This module is responsible for:
//!
//! 1. Binding a TCP listener on the configured address.
//! 2. Accepting incoming TCP connections from viewers.
//! 3. Upgrading each connection to a WebSocket session.
//! 4. Registering the viewer with the hub task and running two concurrent
//!    forwarding loops per session:
//!    - **Viewer → Hub**: reads JSON frames, decodes them into
//!      [`ClientMessage`]s, forwards them to the hub task.
//!    - **Hub → Viewer**: drains the viewer's outbound queue, encodes each
//!      [`ServerMessage`] as a JSON text frame.
//! 5. Deregistering the viewer when either loop ends.
//! 6. Stopping the accept loop when the `running` flag is cleared.
//!
//! Each viewer session runs in its own Tokio task, so one slow tablet never
//! delays page changes to the others.  Malformed frames are logged and
//! skipped; they never close the session.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::unbounded_channel;
use tokio::time::timeout;
use tokio_tungstenite::{
    accept_async,
    tungstenite::{Error as WsError, Message as WsMessage},
};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use pageturn_core::{decode_client_message, encode_message, ServerMessage};

use crate::infrastructure::hub_task::HubHandle;

// ── Public API ────────────────────────────────────────────────────────────────

/// Binds `bind_addr` and runs the accept loop until `running` is cleared.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot be bound (e.g., the port is
/// already in use or the process lacks permission to bind).
pub async fn run_server(
    bind_addr: SocketAddr,
    hub: HubHandle,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind WebSocket listener on {bind_addr}"))?;

    info!("WebSocket server listening on {bind_addr}");
    serve(listener, hub, running).await
}

/// Runs the accept loop on an already-bound listener.
///
/// Split from [`run_server`] so tests can bind an ephemeral port first.
pub async fn serve(
    listener: TcpListener,
    hub: HubHandle,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    loop {
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping accept loop");
            break;
        }

        // A short timeout lets the loop notice the shutdown flag even when no
        // viewer is connecting.
        match timeout(Duration::from_millis(200), listener.accept()).await {
            Ok(Ok((stream, peer_addr))) => {
                debug!("new connection from {peer_addr}");
                let hub = hub.clone();
                tokio::spawn(async move {
                    handle_viewer_session(stream, peer_addr, hub).await;
                });
            }
            Ok(Err(e)) => {
                // Transient accept error (e.g., too many open file descriptors).
                error!("accept error: {e}");
            }
            Err(_) => {}
        }
    }

    Ok(())
}

// ── Per-session handler ───────────────────────────────────────────────────────

async fn handle_viewer_session(raw_stream: TcpStream, peer_addr: SocketAddr, hub: HubHandle) {
    match run_session(raw_stream, peer_addr, hub).await {
        Ok(()) => debug!("session {peer_addr} closed normally"),
        Err(e) => warn!("session {peer_addr} closed with error: {e:#}"),
    }
}

/// Runs the complete lifecycle of one viewer WebSocket session.
///
/// # Errors
///
/// Returns an error if the WebSocket handshake fails.
async fn run_session(
    raw_stream: TcpStream,
    peer_addr: SocketAddr,
    hub: HubHandle,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(raw_stream)
        .await
        .with_context(|| format!("WebSocket handshake failed with {peer_addr}"))?;

    let viewer = Uuid::new_v4();
    let (outbox_tx, mut outbox_rx) = unbounded_channel::<ServerMessage>();
    if !hub.connect(viewer, outbox_tx) {
        anyhow::bail!("hub task is not running");
    }
    debug!("viewer {viewer} is {peer_addr}");

    let (mut ws_tx, mut ws_rx) = ws_stream.split();

    // ── Hub → Viewer ──────────────────────────────────────────────────────────
    let writer = async {
        while let Some(msg) = outbox_rx.recv().await {
            let frame = match encode_message(&msg) {
                Ok(frame) => frame,
                Err(e) => {
                    error!("viewer {viewer}: {e}");
                    continue;
                }
            };
            if ws_tx.send(WsMessage::Text(frame)).await.is_err() {
                debug!("viewer {viewer}: WebSocket send failed (viewer disconnected)");
                break;
            }
        }
    };

    // ── Viewer → Hub ──────────────────────────────────────────────────────────
    let reader = async {
        loop {
            let ws_msg = match ws_rx.next().await {
                Some(Ok(msg)) => msg,
                Some(Err(WsError::ConnectionClosed | WsError::Protocol(_))) | None => {
                    debug!("viewer {viewer}: WebSocket closed");
                    break;
                }
                Some(Err(e)) => {
                    warn!("viewer {viewer}: WebSocket error: {e}");
                    break;
                }
            };

            match ws_msg {
                WsMessage::Text(frame) => match decode_client_message(&frame) {
                    Ok(msg) => {
                        if !hub.forward(viewer, msg) {
                            break;
                        }
                    }
                    Err(e) => warn!("viewer {viewer}: ignoring frame: {e}"),
                },
                WsMessage::Binary(_) => {
                    warn!("viewer {viewer}: unexpected binary WebSocket frame (ignored)")
                }
                WsMessage::Close(_) => break,
                // Pings are answered by tungstenite on the next write.
                WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_) => {}
            }
        }
    };

    // The session ends as soon as either direction stops.
    tokio::select! {
        _ = writer => {}
        _ = reader => {}
    }

    hub.disconnect(viewer);
    Ok(())
}
