//! Typed events routed by the hub.
//!
//! An [`InboundFrame`] is decoded exactly once into an [`Event`]: the sender
//! is stamped from the session that read it, the `type` string is resolved to
//! an [`EventKind`], and the fields each kind actually uses are moved into a
//! dedicated payload. JSON carried inside `content` is parsed at the same
//! time into [`Content::Json`] so later hops never re-parse it.

use chrono::{DateTime, Utc};

use crate::persistence::{GroupId, UserId};
use crate::transport::message::{Frame, InboundFrame};

pub const PRESENCE_QUERY: &str = "get_online_users";
pub const TYPING: &str = "typing";
pub const NEW_POST: &str = "new_post";
pub const NEW_COMMENT: &str = "new_comment";
pub const NEW_POST_LIKE: &str = "new_postLike";
pub const NEW_COMMENT_LIKE: &str = "new_commentLike";
pub const GROUP_MESSAGE: &str = "group_message";
pub const NEW_GROUP_POST: &str = "new_groupPost";
pub const NEW_GROUP_EVENT: &str = "new_groupEvent";
pub const NOTIFICATION: &str = "notif";
pub const PRIVATE_MESSAGE: &str = "private_message";
pub const LEGACY_MESSAGE: &str = "message";
pub const ERROR: &str = "error";
pub const ONLINE_USERS: &str = "online_users";

/// Message body. Structured bodies are kept parsed and re-encoded as a JSON
/// string on the wire, which is what clients expect.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Text(String),
    Json(serde_json::Value),
}

impl Content {
    pub fn parse(raw: String) -> Self {
        let trimmed = raw.trim_start();
        if trimmed.starts_with('{') || trimmed.starts_with('[') {
            if let Ok(value) = serde_json::from_str(&raw) {
                return Content::Json(value);
            }
        }
        Content::Text(raw)
    }

    pub fn to_wire(&self) -> String {
        match self {
            Content::Text(text) => text.clone(),
            Content::Json(value) => value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedKind {
    NewPost,
    NewComment,
    NewPostLike,
    NewCommentLike,
}

impl FeedKind {
    fn from_wire(kind: &str) -> Option<Self> {
        match kind {
            NEW_POST => Some(FeedKind::NewPost),
            NEW_COMMENT => Some(FeedKind::NewComment),
            NEW_POST_LIKE => Some(FeedKind::NewPostLike),
            NEW_COMMENT_LIKE => Some(FeedKind::NewCommentLike),
            _ => None,
        }
    }

    pub fn as_wire(self) -> &'static str {
        match self {
            FeedKind::NewPost => NEW_POST,
            FeedKind::NewComment => NEW_COMMENT,
            FeedKind::NewPostLike => NEW_POST_LIKE,
            FeedKind::NewCommentLike => NEW_COMMENT_LIKE,
        }
    }
}

/// A post, comment or reaction already stored by the CRUD layer.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedUpdate {
    pub kind: FeedKind,
    pub post_id: Option<i64>,
    pub comment_id: Option<i64>,
    pub is_like: Option<bool>,
    pub content: Content,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupActivityKind {
    Post,
    Event,
}

impl GroupActivityKind {
    pub fn as_wire(self) -> &'static str {
        match self {
            GroupActivityKind::Post => NEW_GROUP_POST,
            GroupActivityKind::Event => NEW_GROUP_EVENT,
        }
    }
}

/// Votes attached to a group event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Poll {
    pub yes_count: Option<i64>,
    pub no_count: Option<i64>,
    pub user_vote: Option<String>,
}

/// A group post or event already authorized by the HTTP handler.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupActivity {
    pub kind: GroupActivityKind,
    pub group_id: GroupId,
    pub post_id: Option<i64>,
    pub event_date: Option<String>,
    pub poll: Poll,
    pub content: Content,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub content: Content,
    pub to: Option<UserId>,
    pub group_id: Option<GroupId>,
    pub post_id: Option<i64>,
    pub request_id: Option<i64>,
    pub invitation_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    PresenceQuery,
    Typing {
        to: UserId,
        content: Content,
    },
    Feed(FeedUpdate),
    GroupMessage {
        group_id: GroupId,
        content: Content,
    },
    GroupActivity(GroupActivity),
    Notification(Notification),
    PrivateMessage {
        to: UserId,
        content: Content,
        /// Sent with the older `message` type; echoed back under the same name.
        legacy: bool,
    },
    /// Any unrecognized type. The inbound frame is kept whole.
    Broadcast(InboundFrame),
}

/// An inbound event with its sender stamped by the session.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub from: UserId,
    /// Display name the client attached, relayed as is.
    pub username: Option<String>,
    pub kind: EventKind,
}

/// Ids of 0 are what older clients send for "not set".
fn positive(id: Option<i64>) -> Option<i64> {
    id.filter(|id| *id > 0)
}

impl Event {
    /// Decodes a client frame sent by `from`.
    ///
    /// Returns `None` when the frame is malformed for its type (a directed
    /// event without a recipient, a group event without a group) or claims
    /// a type only the hub may emit.
    pub fn decode(from: UserId, mut frame: InboundFrame) -> Option<Self> {
        let username = frame.username.take();
        let kind = match frame.kind.as_str() {
            ERROR | ONLINE_USERS => return None,
            PRESENCE_QUERY => EventKind::PresenceQuery,
            TYPING => EventKind::Typing {
                to: positive(frame.to)?,
                content: Content::parse(frame.content),
            },
            GROUP_MESSAGE => EventKind::GroupMessage {
                group_id: positive(frame.group_id)?,
                content: Content::parse(frame.content),
            },
            NEW_GROUP_POST | NEW_GROUP_EVENT => {
                let kind = if frame.kind == NEW_GROUP_POST {
                    GroupActivityKind::Post
                } else {
                    GroupActivityKind::Event
                };
                EventKind::GroupActivity(GroupActivity {
                    kind,
                    group_id: positive(frame.group_id)?,
                    post_id: frame.post_id,
                    event_date: frame.event_date,
                    poll: Poll {
                        yes_count: frame.yes_count,
                        no_count: frame.no_count,
                        user_vote: frame.user_vote,
                    },
                    content: Content::parse(frame.content),
                })
            }
            NOTIFICATION => EventKind::Notification(Notification {
                content: Content::parse(frame.content),
                to: positive(frame.to),
                group_id: positive(frame.group_id),
                post_id: frame.post_id,
                request_id: frame.request_id,
                invitation_id: frame.invitation_id,
            }),
            PRIVATE_MESSAGE | LEGACY_MESSAGE => EventKind::PrivateMessage {
                to: positive(frame.to)?,
                legacy: frame.kind == LEGACY_MESSAGE,
                content: Content::parse(frame.content),
            },
            other => match FeedKind::from_wire(other) {
                Some(kind) => EventKind::Feed(FeedUpdate {
                    kind,
                    post_id: frame.post_id,
                    comment_id: frame.comment_id,
                    is_like: frame.is_like,
                    content: Content::parse(frame.content),
                }),
                None if other.is_empty() => return None,
                None => EventKind::Broadcast(frame),
            },
        };

        Some(Event {
            from,
            username,
            kind,
        })
    }

    /// Wire discriminant this event is delivered under.
    pub fn wire_kind(&self) -> &str {
        match &self.kind {
            EventKind::PresenceQuery => PRESENCE_QUERY,
            EventKind::Typing { .. } => TYPING,
            EventKind::Feed(update) => update.kind.as_wire(),
            EventKind::GroupMessage { .. } => GROUP_MESSAGE,
            EventKind::GroupActivity(activity) => activity.kind.as_wire(),
            EventKind::Notification(_) => NOTIFICATION,
            EventKind::PrivateMessage { legacy: true, .. } => LEGACY_MESSAGE,
            EventKind::PrivateMessage { .. } => PRIVATE_MESSAGE,
            EventKind::Broadcast(frame) => frame.kind.as_str(),
        }
    }

    /// Builds the outbound frame, stamped with the acceptance time.
    pub fn to_frame(&self, timestamp: DateTime<Utc>) -> Frame {
        let mut frame = Frame::new(self.wire_kind(), self.from);
        frame.timestamp = Some(timestamp);
        frame.username = self.username.clone();

        match &self.kind {
            EventKind::PresenceQuery => {}
            EventKind::Typing { to, content } => {
                frame.to = Some(*to);
                frame.content = content.to_wire();
            }
            EventKind::Feed(update) => {
                frame.post_id = update.post_id;
                frame.comment_id = update.comment_id;
                frame.is_like = update.is_like;
                frame.content = update.content.to_wire();
            }
            EventKind::GroupMessage { group_id, content } => {
                frame.group_id = Some(*group_id);
                frame.content = content.to_wire();
            }
            EventKind::GroupActivity(activity) => {
                frame.group_id = Some(activity.group_id);
                frame.post_id = activity.post_id;
                frame.event_date = activity.event_date.clone();
                frame.yes_count = activity.poll.yes_count;
                frame.no_count = activity.poll.no_count;
                frame.user_vote = activity.poll.user_vote.clone();
                frame.content = activity.content.to_wire();
            }
            EventKind::Notification(notification) => {
                frame.to = notification.to;
                frame.group_id = notification.group_id;
                frame.post_id = notification.post_id;
                frame.request_id = notification.request_id;
                frame.invitation_id = notification.invitation_id;
                frame.content = notification.content.to_wire();
            }
            EventKind::PrivateMessage { to, content, .. } => {
                frame.to = Some(*to);
                frame.content = content.to_wire();
            }
            EventKind::Broadcast(inbound) => {
                frame.to = inbound.to;
                frame.group_id = inbound.group_id;
                frame.content = inbound.content.clone();
                frame.post_id = inbound.post_id;
                frame.comment_id = inbound.comment_id;
                frame.is_like = inbound.is_like;
                frame.is_private = inbound.is_private;
                frame.yes_count = inbound.yes_count;
                frame.no_count = inbound.no_count;
                frame.user_vote = inbound.user_vote.clone();
                frame.request_id = inbound.request_id;
                frame.invitation_id = inbound.invitation_id;
                frame.event_date = inbound.event_date.clone();
            }
        }

        frame
    }
}
