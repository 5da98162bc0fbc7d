//! The two halves of a connection.
//!
//! `write_pump` drains the session's outbound queue into the socket and
//! `read_pump` decodes frames from the socket and submits them to the hub.
//! Either side ending tears the connection down: the read side signals
//! `Disconnect`, the hub closes the queue, and the write side then exits.

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tungstenite::protocol::Message as WsMessage;

use crate::client::ConnectionId;
use crate::hub::{Event, HubHandle};
use crate::persistence::UserId;
use crate::transport::message::InboundFrame;

/// Forwards queued frames to `sink` until the queue is closed, then closes
/// the sink.
pub async fn write_pump<S>(mut rx: mpsc::Receiver<WsMessage>, mut sink: S, user_id: UserId)
where
    S: Sink<WsMessage> + Unpin,
    S::Error: std::fmt::Display,
{
    while let Some(msg) = rx.recv().await {
        if let Err(e) = sink.send(msg).await {
            tracing::debug!(user_id, error = %e, "write failed, stopping write pump");
            return;
        }
    }

    if let Err(e) = sink.close().await {
        tracing::trace!(user_id, error = %e, "close after queue shutdown failed");
    }
    tracing::debug!(user_id, "write pump finished");
}

/// Reads frames until the peer goes away, then signals `Disconnect`.
///
/// Undecodable frames are skipped; the connection stays open.
pub async fn read_pump<S>(
    mut stream: S,
    user_id: UserId,
    connection_id: ConnectionId,
    hub: HubHandle,
) where
    S: Stream<Item = Result<WsMessage, tungstenite::Error>> + Unpin,
{
    while let Some(next) = stream.next().await {
        let msg = match next {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(user_id, error = %e, "read failed");
                break;
            }
        };

        let frame = match &msg {
            WsMessage::Text(text) => serde_json::from_str::<InboundFrame>(text.as_str()),
            WsMessage::Binary(bytes) => serde_json::from_slice::<InboundFrame>(bytes),
            WsMessage::Close(_) => break,
            _ => continue,
        };

        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!(user_id, error = %e, "malformed frame discarded");
                continue;
            }
        };

        let Some(event) = Event::decode(user_id, frame) else {
            tracing::debug!(user_id, "frame missing required fields discarded");
            continue;
        };

        if hub.submit(event).await.is_err() {
            tracing::debug!(user_id, "hub stopped, ending read pump");
            return;
        }
    }

    hub.disconnect(user_id, connection_id).await;
}
