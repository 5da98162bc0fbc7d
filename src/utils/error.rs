//! The `error` module defines custom error types used within the `socialhub` application.
//!
//! Errors never escape the hub control loop: each per-event failure is logged
//! and converted into a dropped event or a synthetic `error` frame for the
//! sender. These types exist so the store and the connection adapter can
//! report *why* something failed.

use thiserror::Error;
use tungstenite::http::StatusCode;

use crate::persistence::{GroupId, UserId};

/// Failure reported by the relational collaborators and the persistence bridge.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The embedded database failed (IO, corruption, closed tree).
    #[error("storage error: {0}")]
    Sled(#[from] sled::Error),

    /// A stored row could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// A group write was attempted by someone who is not an accepted member.
    #[error("user {user} is not an accepted member of group {group}")]
    NotAMember { group: GroupId, user: UserId },

    /// A key did not have the expected layout.
    #[error("corrupt key in tree '{0}'")]
    CorruptKey(&'static str),
}

impl StoreError {
    /// `true` when the failure is an authorization rejection rather than a
    /// storage fault.
    pub fn is_rejection(&self) -> bool {
        matches!(self, StoreError::NotAMember { .. })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Reasons a connection is refused before any session exists.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("missing user_id query parameter")]
    MissingIdentity,

    #[error("invalid user id '{0}'")]
    InvalidIdentity(String),

    #[error("server is full")]
    ServerFull,

    #[error("websocket handshake failed: {0}")]
    Handshake(#[from] tungstenite::Error),
}

impl ConnectError {
    /// HTTP status returned to the caller when the upgrade is refused.
    pub fn status(&self) -> StatusCode {
        match self {
            ConnectError::MissingIdentity | ConnectError::InvalidIdentity(_) => {
                StatusCode::BAD_REQUEST
            }
            ConnectError::ServerFull => StatusCode::SERVICE_UNAVAILABLE,
            ConnectError::Handshake(_) => StatusCode::BAD_REQUEST,
        }
    }
}

/// The hub control loop has stopped and no longer accepts commands.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("hub is not running")]
pub struct HubClosed;
