//! Wire frames exchanged over the WebSocket.
//!
//! Every frame is one JSON object with a `type` discriminant. Inbound frames
//! are decoded leniently: unknown fields are ignored and the sender identity
//! and timestamp are never read from the client. Outbound frames always carry
//! the server-assigned timestamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::hub::event::{ERROR, ONLINE_USERS};
use crate::persistence::{GroupId, UserId};

/// A frame as sent by a client.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct InboundFrame {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<GroupId>,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_like: Option<bool>,
    #[serde(default, alias = "isPrivate", skip_serializing_if = "Option::is_none")]
    pub is_private: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yes_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_vote: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invitation_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_date: Option<String>,
}

impl InboundFrame {
    pub fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            ..Self::default()
        }
    }
}

/// A frame pushed to a client.
///
/// HTTP-side callers build these directly when pushing live updates through
/// the hub handle; `timestamp` is filled in by the hub when left empty.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Frame {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub from: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<GroupId>,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_like: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_private: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yes_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_vote: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invitation_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_date: Option<String>,
}

impl Frame {
    pub fn new(kind: &str, from: UserId) -> Self {
        Self {
            kind: kind.to_string(),
            from,
            ..Self::default()
        }
    }

    /// Synthetic error pushed to a single client.
    pub fn error(content: &str, at: DateTime<Utc>) -> Self {
        Self {
            kind: ERROR.to_string(),
            content: content.to_string(),
            timestamp: Some(at),
            ..Self::default()
        }
    }
}

/// One entry of the presence snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OnlineUser {
    pub id: UserId,
    pub username: String,
}

/// The synthetic `online_users` frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OnlineUsersFrame {
    #[serde(rename = "type")]
    pub kind: String,
    pub users: Vec<OnlineUser>,
    pub timestamp: DateTime<Utc>,
}

impl OnlineUsersFrame {
    pub fn new(users: Vec<OnlineUser>, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind: ONLINE_USERS.to_string(),
            users,
            timestamp,
        }
    }
}
