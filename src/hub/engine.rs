//! Hub engine
//!
//! The hub owns the registry of connected sessions and is the only code that
//! reads or writes it. All work arrives as [`Command`]s on one bounded queue
//! and is applied one at a time by [`Hub::run`]:
//!
//! - `Connect`: insert the session (closing any older session for the same
//!   identity) and push a fresh `online_users` snapshot to everyone.
//! - `Disconnect` / `Logout`: remove the session, close its outbound queue and
//!   push a fresh snapshot.
//! - `Inbound`: hand the event to the router.
//! - `Deliver`: push a frame built by an HTTP handler.
//!
//! Every delivery is a non-blocking enqueue on the recipient's bounded queue,
//! so a slow client only ever stalls its own write pump. Nothing that happens
//! while handling a command is allowed to end the loop.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::mpsc;
use tungstenite::protocol::Message as WsMessage;

use crate::client::{ClientSession, ConnectionId};
use crate::config::HubSettings;
use crate::hub::handle::{Command, HubHandle, Target};
use crate::hub::presence::PresenceSnapshot;
use crate::persistence::{Store, UserId};
use crate::transport::message::{Frame, OnlineUser, OnlineUsersFrame};

pub struct Hub<S: ?Sized> {
    pub(crate) registry: BTreeMap<UserId, ClientSession>,
    pub(crate) store: Arc<S>,
    commands: mpsc::Receiver<Command>,
    presence: PresenceSnapshot,
}

impl<S> Hub<S>
where
    S: Store + ?Sized,
{
    /// Creates a hub over `store` and the handle used to talk to it.
    pub fn new(store: Arc<S>, settings: &HubSettings) -> (Self, HubHandle) {
        let (tx, rx) = mpsc::channel(settings.inbound_queue_capacity.max(1));
        let presence = PresenceSnapshot::new();
        let hub = Self {
            registry: BTreeMap::new(),
            store,
            commands: rx,
            presence: presence.clone(),
        };
        (hub, HubHandle::new(tx, presence))
    }

    /// Runs the control loop until every handle has been dropped.
    pub async fn run(mut self) {
        tracing::info!("hub control loop started");
        while let Some(command) = self.commands.recv().await {
            self.handle(command);
        }
        for (_, session) in std::mem::take(&mut self.registry) {
            session.close();
        }
        self.presence.publish(std::iter::empty());
        tracing::info!("hub control loop stopped");
    }

    /// Applies a single command.
    pub fn handle(&mut self, command: Command) {
        match command {
            Command::Connect(session) => self.connect(session),
            Command::Disconnect {
                user_id,
                connection_id,
            } => self.disconnect(user_id, connection_id),
            Command::Logout(user_id) => self.logout(user_id),
            Command::Inbound(event) => self.route(event),
            Command::Deliver { target, frame } => self.deliver(target, frame),
        }
    }

    /// Identities currently in the registry, ascending.
    pub fn online_ids(&self) -> Vec<UserId> {
        self.registry.keys().copied().collect()
    }

    fn connect(&mut self, session: ClientSession) {
        let user_id = session.user_id;
        let connection_id = session.connection_id;

        if let Some(previous) = self.registry.insert(user_id, session) {
            tracing::info!(
                user_id,
                old_connection = %previous.connection_id,
                new_connection = %connection_id,
                "identity reconnected, closing previous session"
            );
            previous.close();
        } else {
            tracing::info!(user_id, connection_id = %connection_id, "client connected");
        }

        self.presence_changed();
    }

    fn disconnect(&mut self, user_id: UserId, connection_id: ConnectionId) {
        let is_current = self
            .registry
            .get(&user_id)
            .is_some_and(|session| session.connection_id == connection_id);

        if !is_current {
            tracing::debug!(
                user_id,
                connection_id = %connection_id,
                "stale disconnect ignored"
            );
            return;
        }

        if let Some(session) = self.registry.remove(&user_id) {
            session.close();
        }
        tracing::info!(user_id, connection_id = %connection_id, "client disconnected");
        self.presence_changed();
    }

    fn logout(&mut self, user_id: UserId) {
        match self.registry.remove(&user_id) {
            Some(session) => {
                session.close();
                tracing::info!(user_id, "client logged out");
                self.presence_changed();
            }
            None => tracing::debug!(user_id, "logout for offline user"),
        }
    }

    fn deliver(&self, target: Target, mut frame: Frame) {
        if frame.timestamp.is_none() {
            frame.timestamp = Some(Utc::now());
        }
        let Some(msg) = encode(&frame) else {
            return;
        };

        let delivered = match target {
            Target::All => self.send_to_all(&msg),
            Target::AllExcept(user_id) => self.send_to_all_except(user_id, &msg),
            Target::User(user_id) => usize::from(self.send_to(user_id, &msg)),
            Target::Users(user_ids) => self.send_to_users(&user_ids, &msg),
        };
        tracing::debug!(kind = %frame.kind, delivered, "external push delivered");
    }

    /// Republishes presence and pushes the recomputed snapshot to everyone.
    fn presence_changed(&self) {
        self.presence.publish(self.registry.keys().copied());
        if let Some(msg) = self.online_users_message() {
            self.send_to_all(&msg);
        }
    }

    /// Full `online_users` frame for the current registry.
    pub(crate) fn online_users_message(&self) -> Option<WsMessage> {
        let users = self
            .registry
            .keys()
            .map(|&id| OnlineUser {
                id,
                username: self.username_or_blank(id),
            })
            .collect();
        encode(&OnlineUsersFrame::new(users, Utc::now()))
    }

    pub(crate) fn username_or_blank(&self, user_id: UserId) -> String {
        match self.store.username(user_id) {
            Ok(Some(name)) => name,
            Ok(None) => String::new(),
            Err(e) => {
                tracing::warn!(user_id, error = %e, "username lookup failed");
                String::new()
            }
        }
    }

    pub(crate) fn send_to(&self, user_id: UserId, msg: &WsMessage) -> bool {
        match self.registry.get(&user_id) {
            Some(session) => session.send(msg.clone()),
            None => false,
        }
    }

    pub(crate) fn send_to_all(&self, msg: &WsMessage) -> usize {
        self.registry
            .values()
            .filter(|session| session.send(msg.clone()))
            .count()
    }

    pub(crate) fn send_to_all_except(&self, except: UserId, msg: &WsMessage) -> usize {
        self.registry
            .values()
            .filter(|session| session.user_id != except)
            .filter(|session| session.send(msg.clone()))
            .count()
    }

    pub(crate) fn send_to_users(&self, user_ids: &[UserId], msg: &WsMessage) -> usize {
        user_ids
            .iter()
            .filter(|&&user_id| self.send_to(user_id, msg))
            .count()
    }
}

/// Serializes a frame once so fan-out only clones the text.
pub(crate) fn encode<T: Serialize>(value: &T) -> Option<WsMessage> {
    match serde_json::to_string(value) {
        Ok(json) => Some(WsMessage::text(json)),
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize outbound frame");
            None
        }
    }
}
