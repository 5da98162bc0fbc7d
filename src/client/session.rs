use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tungstenite::protocol::Message as WsMessage;
use uuid::Uuid;

use crate::persistence::UserId;

/// Distinguishes two connections opened for the same identity.
pub type ConnectionId = Uuid;

/// Represents a connected WebSocket client.
///
/// Owned by the hub registry. Dropping or closing it closes the outbound
/// queue, which ends the connection's write pump.
#[derive(Debug)]
pub struct ClientSession {
    pub user_id: UserId,
    pub connection_id: ConnectionId,
    sender: mpsc::Sender<WsMessage>,
}

impl ClientSession {
    /// Create a session with an outbound queue of `capacity` frames.
    ///
    /// The receiver goes to the write pump.
    pub fn new(user_id: UserId, capacity: usize) -> (Self, mpsc::Receiver<WsMessage>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let session = Self {
            user_id,
            connection_id: Uuid::new_v4(),
            sender,
        };
        (session, receiver)
    }

    /// Enqueue a frame without waiting.
    ///
    /// Returns `false` when the queue is full or already closed; the frame is
    /// dropped in both cases and never retried.
    pub fn send(&self, msg: WsMessage) -> bool {
        match self.sender.try_send(msg) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::trace!(user_id = self.user_id, "outbound queue full, frame dropped");
                false
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(user_id = self.user_id, "outbound queue closed");
                false
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Close the outbound queue. The write pump drains what is already
    /// queued, sends a close frame and ends the connection.
    pub fn close(self) {
        tracing::debug!(
            user_id = self.user_id,
            connection_id = %self.connection_id,
            "closing session"
        );
        drop(self.sender);
    }
}
