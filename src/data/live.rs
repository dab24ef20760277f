//! Optional listener for the backend's `/ws` state push.

use futures::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::data::types::LiveState;

/// Derive the WebSocket endpoint from the REST base URL.
pub fn ws_url(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        base.to_string()
    };
    format!("{}/ws", base)
}

/// Decode one text frame; anything that is not a `state` push is skipped.
pub fn parse_live_message(text: &str) -> Option<LiveState> {
    match serde_json::from_str::<LiveState>(text) {
        Ok(state) if state.kind == "state" => Some(state),
        Ok(other) => {
            debug!("Ignoring live message of type {}", other.kind);
            None
        }
        Err(e) => {
            debug!("Unparseable live message: {}", e);
            None
        }
    }
}

/// Spawn the listener. It reconnects after `reconnect` until the receiver
/// side is dropped.
pub fn spawn_live_feed(base_url: &str, reconnect: Duration) -> mpsc::Receiver<LiveState> {
    let (tx, rx) = mpsc::channel(16);
    let url = ws_url(base_url);

    tokio::spawn(async move {
        loop {
            match connect_async(url.as_str()).await {
                Ok((mut stream, _)) => {
                    info!("Live feed connected: {}", url);

                    while let Some(frame) = stream.next().await {
                        let text = match frame {
                            Ok(Message::Text(text)) => text,
                            Ok(Message::Close(_)) => break,
                            Ok(_) => continue,
                            Err(e) => {
                                warn!("Live feed read error: {}", e);
                                break;
                            }
                        };

                        if let Some(state) = parse_live_message(&text) {
                            if tx.send(state).await.is_err() {
                                return;
                            }
                        }
                    }

                    warn!("Live feed disconnected");
                }
                Err(e) => warn!("Live feed connect failed: {}", e),
            }

            if tx.is_closed() {
                return;
            }
            tokio::time::sleep(reconnect).await;
        }
    });

    rx
}
