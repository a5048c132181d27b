//! WebSocket connection from a viewer to the server.
//!
//! Runs a reconnect loop on its own task:
//!
//! - Inbound text frames are decoded into [`ServerMessage`]s and delivered as
//!   [`ViewerEvent::Server`].  Malformed frames are logged and skipped.
//! - Outbound [`ClientMessage`]s are encoded and written to the socket.
//!   Messages queued while disconnected go out after the next connect.
//! - [`ViewerEvent::Connected`] / [`ViewerEvent::Disconnected`] mark each
//!   session.
//!
//! The loop stops when the outbound queue or the event channel closes, or
//! when `running` is cleared.  Both are checked between connection attempts;
//! a closed outbound queue also ends a live session.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time;
use tokio_tungstenite::{
    connect_async, tungstenite::Message as WsMessage, MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, info, warn};

use pageturn_core::{decode_server_message, encode_message, ClientMessage};

use crate::infrastructure::runtime::ViewerEvent;

/// Settings for the server connection.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Server WebSocket URL, e.g. `ws://192.168.1.20:3000`.
    pub url: String,
    /// Delay between connection attempts.
    pub reconnect_interval: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:3000".to_string(),
            reconnect_interval: Duration::from_secs(2),
        }
    }
}

/// Whether the reconnect loop should go on after a session ends.
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Reconnect,
    Stop,
}

/// Spawns the connection task.
pub fn spawn_connection(
    config: ConnectionConfig,
    events: UnboundedSender<ViewerEvent>,
    mut outbound: UnboundedReceiver<ClientMessage>,
    running: Arc<AtomicBool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while running.load(Ordering::Relaxed) && !outbound.is_closed() {
            match connect_async(config.url.as_str()).await {
                Ok((ws, _)) => {
                    info!("connected to server at {}", config.url);
                    if events.send(ViewerEvent::Connected).is_err() {
                        break;
                    }

                    let flow = match run_session(ws, &events, &mut outbound).await {
                        Ok(flow) => flow,
                        Err(e) => {
                            warn!("server connection lost: {e:#}");
                            Flow::Reconnect
                        }
                    };

                    if events.send(ViewerEvent::Disconnected).is_err() || flow == Flow::Stop {
                        break;
                    }
                    info!(
                        "disconnected from server; reconnecting in {:?}",
                        config.reconnect_interval
                    );
                }
                Err(e) => {
                    warn!("could not connect to server at {}: {e}", config.url);
                }
            }

            if running.load(Ordering::Relaxed) {
                time::sleep(config.reconnect_interval).await;
            }
        }
        debug!("connection task stopped");
    })
}

/// Pumps frames both ways until the socket or one of the channels closes.
///
/// # Errors
///
/// Returns an error if the socket fails while reading or writing.
async fn run_session(
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    events: &UnboundedSender<ViewerEvent>,
    outbound: &mut UnboundedReceiver<ClientMessage>,
) -> anyhow::Result<Flow> {
    let (mut ws_tx, mut ws_rx) = ws.split();

    loop {
        tokio::select! {
            frame = ws_rx.next() => {
                let frame = match frame {
                    Some(frame) => frame.context("WebSocket read failed")?,
                    None => return Ok(Flow::Reconnect),
                };
                match frame {
                    WsMessage::Text(text) => match decode_server_message(&text) {
                        Ok(msg) => {
                            if events.send(ViewerEvent::Server(msg)).is_err() {
                                return Ok(Flow::Stop);
                            }
                        }
                        Err(e) => warn!("ignoring frame from server: {e}"),
                    },
                    WsMessage::Close(_) => return Ok(Flow::Reconnect),
                    _ => {}
                }
            }
            msg = outbound.recv() => {
                let Some(msg) = msg else {
                    let _ = ws_tx.close().await;
                    return Ok(Flow::Stop);
                };
                let frame = encode_message(&msg).context("failed to encode outbound event")?;
                ws_tx
                    .send(WsMessage::Text(frame))
                    .await
                    .context("WebSocket write failed")?;
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use tokio::net::TcpListener;
    use tokio::sync::mpsc::unbounded_channel;
    use tokio::time::timeout;
    use tokio_tungstenite::accept_async;

    use pageturn_core::{decode_client_message, PageNumber, ServerMessage};

    use super::*;

    const WAIT: Duration = Duration::from_secs(5);

    async fn next_event(rx: &mut UnboundedReceiver<ViewerEvent>) -> ViewerEvent {
        timeout(WAIT, rx.recv()).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_connection_relays_events_both_ways() {
        // Arrange: a one-shot server
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();
            ws.send(WsMessage::Text("garbage".to_string())).await.unwrap();
            let frame = encode_message(&ServerMessage::PageChange {
                page: PageNumber::new(4).unwrap(),
            })
            .unwrap();
            ws.send(WsMessage::Text(frame)).await.unwrap();

            // Wait for the viewer's request.
            while let Some(frame) = ws.next().await {
                if let Ok(WsMessage::Text(text)) = frame {
                    return decode_client_message(&text).unwrap();
                }
            }
            panic!("viewer closed the socket without sending a request");
        });

        let (events_tx, mut events_rx) = unbounded_channel();
        let (outbound_tx, outbound_rx) = unbounded_channel();
        let config = ConnectionConfig {
            url,
            reconnect_interval: Duration::from_millis(50),
        };

        // Act
        let task = spawn_connection(
            config,
            events_tx,
            outbound_rx,
            Arc::new(AtomicBool::new(true)),
        );
        outbound_tx.send(ClientMessage::GetMidiPorts).unwrap();

        // Assert: connected, then the page change; the garbage frame is skipped
        assert!(matches!(next_event(&mut events_rx).await, ViewerEvent::Connected));
        match next_event(&mut events_rx).await {
            ViewerEvent::Server(msg) => assert_eq!(
                msg,
                ServerMessage::PageChange {
                    page: PageNumber::new(4).unwrap()
                }
            ),
            other => panic!("expected a server event, got {other:?}"),
        }
        let received = timeout(WAIT, server).await.unwrap().unwrap();
        assert_eq!(received, ClientMessage::GetMidiPorts);

        drop(outbound_tx);
        timeout(WAIT, task).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_reconnects_after_drop_and_sends_queued_request() {
        // Arrange: the server drops the first session, then accepts again
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut first = accept_async(stream).await.unwrap();
            first.close(None).await.unwrap();
            drop(first);

            let (stream, _) = listener.accept().await.unwrap();
            let mut second = accept_async(stream).await.unwrap();
            while let Some(frame) = second.next().await {
                if let Ok(WsMessage::Text(text)) = frame {
                    return decode_client_message(&text).unwrap();
                }
            }
            panic!("viewer closed the second session without sending a request");
        });

        let (events_tx, mut events_rx) = unbounded_channel();
        let (outbound_tx, outbound_rx) = unbounded_channel();
        let task = spawn_connection(
            ConnectionConfig {
                url,
                reconnect_interval: Duration::from_millis(50),
            },
            events_tx,
            outbound_rx,
            Arc::new(AtomicBool::new(true)),
        );

        // Act
        assert!(matches!(next_event(&mut events_rx).await, ViewerEvent::Connected));
        assert!(matches!(
            next_event(&mut events_rx).await,
            ViewerEvent::Disconnected
        ));
        outbound_tx
            .send(ClientMessage::SetMidiPort("Keys".to_string()))
            .unwrap();

        // Assert: a second session comes up and carries the queued request
        assert!(matches!(next_event(&mut events_rx).await, ViewerEvent::Connected));
        let received = timeout(WAIT, server).await.unwrap().unwrap();
        assert_eq!(received, ClientMessage::SetMidiPort("Keys".to_string()));

        drop(outbound_tx);
        timeout(WAIT, task).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_cleared_flag_stops_retrying() {
        // Arrange: nothing listens on this port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        drop(listener);

        let running = Arc::new(AtomicBool::new(true));
        let (events_tx, _events_rx) = unbounded_channel();
        let (_outbound_tx, outbound_rx) = unbounded_channel();
        let task = spawn_connection(
            ConnectionConfig {
                url,
                reconnect_interval: Duration::from_millis(20),
            },
            events_tx,
            outbound_rx,
            Arc::clone(&running),
        );

        // Act
        running.store(false, Ordering::Relaxed);

        // Assert
        timeout(WAIT, task).await.unwrap().unwrap();
    }
}
