//! The `persistence` module provides the durable side of the hub.
//!
//! It defines the two narrow contracts the hub consumes from the relational
//! store:
//!
//! - [`SocialGraph`]: follow edges, accepted group membership and usernames,
//!   consulted by the authorization gate and the presence snapshot.
//! - [`MessageStore`]: append-only direct and group message rows plus the
//!   historical reads the HTTP layer serves.
//!
//! Both are implemented by [`SledStore`], which keeps each relation in its own
//! `sled` tree with big-endian keys so prefix scans come back in id and time
//! order.

pub mod history;
pub mod sled_store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::error::StoreResult;

pub use history::HistoryReader;
pub use sled_store::SledStore;

/// Externally issued user identifier. Always positive.
pub type UserId = i64;

/// Externally issued group identifier. Always positive.
pub type GroupId = i64;

/// Status of a group membership row. Only `Accepted` grants access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    Accepted,
    Pending,
    Invited,
}

/// One row of the `messages` relation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StoredMessage {
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// One row of the `group_messages` relation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StoredGroupMessage {
    pub group_id: GroupId,
    pub sender_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A group backlog row joined with the sender's username.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupBacklogEntry {
    pub message: StoredGroupMessage,
    pub username: String,
}

/// Read-only view of the social graph owned by the CRUD layer.
///
/// Every call is synchronous and answers from the current state of the
/// store; callers must not cache results.
pub trait SocialGraph: Send + Sync {
    /// `true` if `a` follows `b` or `b` follows `a`.
    fn follows_either(&self, a: UserId, b: UserId) -> StoreResult<bool>;

    /// `true` if `user` has an accepted membership row in `group`.
    fn is_accepted_member(&self, group: GroupId, user: UserId) -> StoreResult<bool>;

    /// Ids of every accepted member of `group`, ascending.
    fn accepted_member_ids(&self, group: GroupId) -> StoreResult<Vec<UserId>>;

    /// Display name of `user`, if the user is known.
    fn username(&self, user: UserId) -> StoreResult<Option<String>>;
}

/// Durable message storage.
pub trait MessageStore: Send + Sync {
    fn persist_direct_message(
        &self,
        sender: UserId,
        recipient: UserId,
        content: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// Appends a group message. Implementations re-check that `sender` is an
    /// accepted member and fail with `StoreError::NotAMember` otherwise.
    fn persist_group_message(
        &self,
        group: GroupId,
        sender: UserId,
        content: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// Full conversation between two users, oldest first.
    fn read_history(&self, a: UserId, b: UserId) -> StoreResult<Vec<StoredMessage>>;

    /// One page of a conversation, newest first.
    fn read_history_page(
        &self,
        a: UserId,
        b: UserId,
        offset: usize,
        limit: usize,
    ) -> StoreResult<Vec<StoredMessage>>;

    /// One page of a group's backlog. The page is selected newest first and
    /// returned oldest first so it can be prepended to a chat view.
    fn read_group_backlog(
        &self,
        group: GroupId,
        offset: usize,
        limit: usize,
    ) -> StoreResult<Vec<GroupBacklogEntry>>;
}

/// Everything the hub needs from the relational side.
pub trait Store: SocialGraph + MessageStore {}

impl<T: SocialGraph + MessageStore> Store for T {}

#[cfg(test)]
mod tests;
