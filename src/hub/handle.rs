//! The hub's public face.
//!
//! Sessions and HTTP handlers never touch the registry; they send a
//! [`Command`] through a [`HubHandle`] and the control loop applies it.
//! Session-side calls (`connect`, `submit`, `disconnect`) wait for room in the
//! bounded command queue. Handler-side pushes (`broadcast`, `send_to`, ...)
//! never wait: if the loop is saturated the push is dropped and `false` is
//! returned.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::client::{ClientSession, ConnectionId};
use crate::hub::event::Event;
use crate::hub::presence::PresenceSnapshot;
use crate::persistence::UserId;
use crate::transport::message::Frame;
use crate::utils::error::HubClosed;

/// Who an externally pushed frame goes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    All,
    AllExcept(UserId),
    User(UserId),
    Users(Vec<UserId>),
}

/// Everything the control loop reacts to, in arrival order.
#[derive(Debug)]
pub enum Command {
    Connect(ClientSession),
    Disconnect {
        user_id: UserId,
        connection_id: ConnectionId,
    },
    Logout(UserId),
    Inbound(Event),
    Deliver {
        target: Target,
        frame: Frame,
    },
}

#[derive(Debug, Clone)]
pub struct HubHandle {
    commands: mpsc::Sender<Command>,
    presence: PresenceSnapshot,
}

impl HubHandle {
    pub(crate) fn new(commands: mpsc::Sender<Command>, presence: PresenceSnapshot) -> Self {
        Self { commands, presence }
    }

    /// Register a freshly accepted session.
    pub async fn connect(&self, session: ClientSession) -> Result<(), HubClosed> {
        self.commands
            .send(Command::Connect(session))
            .await
            .map_err(|_| HubClosed)
    }

    /// Hand an inbound event to the router.
    pub async fn submit(&self, event: Event) -> Result<(), HubClosed> {
        self.commands
            .send(Command::Inbound(event))
            .await
            .map_err(|_| HubClosed)
    }

    /// Signal that a connection ended. Ignored by the hub if the identity has
    /// since been taken over by a newer connection.
    pub async fn disconnect(&self, user_id: UserId, connection_id: ConnectionId) {
        let command = Command::Disconnect {
            user_id,
            connection_id,
        };
        if self.commands.send(command).await.is_err() {
            tracing::debug!(user_id, "hub stopped before disconnect was delivered");
        }
    }

    /// Deregister `user_id` whichever connection it is on.
    pub fn logout(&self, user_id: UserId) -> bool {
        self.push(Command::Logout(user_id))
    }

    /// Push a frame to every connected session.
    pub fn broadcast(&self, frame: Frame) -> bool {
        self.deliver(Target::All, frame)
    }

    /// Push a frame to every connected session except `user_id`.
    pub fn broadcast_except(&self, user_id: UserId, frame: Frame) -> bool {
        self.deliver(Target::AllExcept(user_id), frame)
    }

    /// Push a frame to `user_id` if it is online.
    pub fn send_to(&self, user_id: UserId, frame: Frame) -> bool {
        self.deliver(Target::User(user_id), frame)
    }

    /// Push a frame to each listed identity that is online.
    pub fn send_to_users(&self, user_ids: Vec<UserId>, frame: Frame) -> bool {
        self.deliver(Target::Users(user_ids), frame)
    }

    pub fn deliver(&self, target: Target, frame: Frame) -> bool {
        self.push(Command::Deliver { target, frame })
    }

    /// Identities connected as of the last registry change, ascending.
    pub fn online_users(&self) -> Vec<UserId> {
        self.presence.online_ids()
    }

    pub fn is_online(&self, user_id: UserId) -> bool {
        self.presence.is_online(user_id)
    }

    pub fn online_count(&self) -> usize {
        self.presence.len()
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    fn push(&self, command: Command) -> bool {
        match self.commands.try_send(command) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!("hub command queue full, push dropped");
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }
}
