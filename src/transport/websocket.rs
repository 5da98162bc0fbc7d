//! WebSocket transport
//!
//! Accepts TCP connections, resolves the caller's identity from the
//! `user_id` query parameter during the upgrade, and wires each accepted
//! connection to the hub:
//! - a [`ClientSession`] is registered with the hub
//! - a write pump task drains the session's outbound queue into the socket
//! - the connection task itself runs the read pump until the peer goes away
//!
//! Identity is established by an upstream session check; this layer only
//! refuses a missing or non-positive id (400) and upgrades beyond
//! `server.max_connections` (503). No session state exists for a refused
//! connection.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures_util::StreamExt;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::accept_hdr_async;
use tungstenite::handshake::server::{ErrorResponse, Request, Response};
use url::form_urlencoded;

use crate::client::ClientSession;
use crate::client::pump::{read_pump, write_pump};
use crate::config::Settings;
use crate::hub::HubHandle;
use crate::persistence::UserId;
use crate::utils::error::ConnectError;

pub const IDENTITY_PARAM: &str = "user_id";

/// Binds the configured address and serves until the listener fails.
pub async fn start_websocket_server(hub: HubHandle, settings: Settings) -> std::io::Result<()> {
    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!("WebSocket server listening on ws://{}", listener.local_addr()?);

    serve(listener, hub, settings).await;
    Ok(())
}

/// Live connection count, checked and bumped atomically at upgrade time.
#[derive(Debug, Clone)]
pub struct ConnectionSlots {
    active: Arc<AtomicUsize>,
    max: usize,
}

/// Held for the life of one connection; releases its slot on drop.
#[derive(Debug)]
pub struct ConnectionSlot {
    active: Arc<AtomicUsize>,
}

impl ConnectionSlots {
    pub fn new(max: usize) -> Self {
        Self {
            active: Arc::new(AtomicUsize::new(0)),
            max,
        }
    }

    /// Takes a slot if one is free. `replacing` admits a reconnect even at
    /// the cap, since the connection it replaces is about to release its own.
    pub fn try_acquire(&self, replacing: bool) -> Option<ConnectionSlot> {
        let max = self.max;
        self.active
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (replacing || n < max).then_some(n + 1)
            })
            .ok()
            .map(|_| ConnectionSlot {
                active: self.active.clone(),
            })
    }

    pub fn in_use(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }
}

impl Drop for ConnectionSlot {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Accept loop over an already bound listener.
pub async fn serve(listener: TcpListener, hub: HubHandle, settings: Settings) {
    let slots = ConnectionSlots::new(settings.server.max_connections);
    let settings = Arc::new(settings);

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                tracing::warn!(error = %e, "failed to accept connection");
                continue;
            }
        };

        let hub = hub.clone();
        let settings = settings.clone();
        let slots = slots.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer, hub, settings, slots).await {
                tracing::info!(%peer, status = %e.status(), error = %e, "connection refused");
            }
        });
    }
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    hub: HubHandle,
    settings: Arc<Settings>,
    slots: ConnectionSlots,
) -> Result<(), ConnectError> {
    let mut admitted: Option<Result<(UserId, ConnectionSlot), ConnectError>> = None;

    let callback = |request: &Request, response: Response| {
        match admit(request.uri().query(), &hub, &slots) {
            Ok(granted) => {
                admitted = Some(Ok(granted));
                Ok(response)
            }
            Err(e) => {
                let rejection = reject(&e);
                admitted = Some(Err(e));
                Err(rejection)
            }
        }
    };

    let handshake = accept_hdr_async(stream, callback).await;
    let (user_id, _slot, ws_stream) = match (admitted, handshake) {
        (Some(Err(e)), _) => return Err(e),
        (_, Err(e)) => return Err(e.into()),
        (Some(Ok((user_id, slot))), Ok(ws_stream)) => (user_id, slot, ws_stream),
        (None, Ok(_)) => return Err(ConnectError::MissingIdentity),
    };

    let (session, rx) = ClientSession::new(user_id, settings.hub.outbound_queue_capacity);
    let connection_id = session.connection_id;
    tracing::debug!(%peer, user_id, %connection_id, "websocket upgraded");

    if hub.connect(session).await.is_err() {
        tracing::warn!(user_id, "hub is not running, dropping connection");
        return Ok(());
    }

    let (ws_sender, ws_receiver) = ws_stream.split();
    tokio::spawn(write_pump(rx, ws_sender, user_id));
    read_pump(ws_receiver, user_id, connection_id, hub).await;

    Ok(())
}

/// Decides whether an upgrade request may proceed and for whom.
fn admit(
    query: Option<&str>,
    hub: &HubHandle,
    slots: &ConnectionSlots,
) -> Result<(UserId, ConnectionSlot), ConnectError> {
    let user_id = identity_from_query(query)?;
    let slot = slots
        .try_acquire(hub.is_online(user_id))
        .ok_or(ConnectError::ServerFull)?;
    Ok((user_id, slot))
}

/// Extracts a positive `user_id` from a raw query string.
pub fn identity_from_query(query: Option<&str>) -> Result<UserId, ConnectError> {
    let raw = query
        .and_then(|q| {
            form_urlencoded::parse(q.as_bytes())
                .find(|(key, _)| key == IDENTITY_PARAM)
                .map(|(_, value)| value.into_owned())
        })
        .filter(|value| !value.is_empty())
        .ok_or(ConnectError::MissingIdentity)?;

    match raw.parse::<UserId>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ConnectError::InvalidIdentity(raw)),
    }
}

fn reject(error: &ConnectError) -> ErrorResponse {
    let mut response = ErrorResponse::new(Some(error.to_string()));
    *response.status_mut() = error.status();
    response
}
