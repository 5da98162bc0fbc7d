//! Persistence layer backed by `sled`
//!
//! Each relation lives in its own tree. Keys are built from big-endian
//! integers so that a prefix scan yields rows ordered by id and, for message
//! trees, by creation time:
//!
//! - `users`: `user` -> username
//! - `follows`: `follower ++ following` -> ()
//! - `group_members`: `group ++ user` -> JSON `MembershipStatus`
//! - `messages`: `low_id ++ high_id ++ micros ++ seq` -> JSON `StoredMessage`
//! - `group_messages`: `group ++ micros ++ seq` -> JSON `StoredGroupMessage`
//!
//! Ids and timestamps are non-negative, so big-endian `i64` bytes sort the
//! same way the numbers do. The trailing `seq` comes from
//! `Db::generate_id` and keeps rows written in the same microsecond apart.

use chrono::{DateTime, Utc};
use sled::{Db, Tree};

use super::{
    GroupBacklogEntry, GroupId, MembershipStatus, MessageStore, SocialGraph, StoredGroupMessage,
    StoredMessage, UserId,
};
use crate::utils::error::{StoreError, StoreResult};

const USERS: &str = "users";
const FOLLOWS: &str = "follows";
const GROUP_MEMBERS: &str = "group_members";
const MESSAGES: &str = "messages";
const GROUP_MESSAGES: &str = "group_messages";

#[derive(Clone)]
pub struct SledStore {
    db: Db,
    users: Tree,
    follows: Tree,
    group_members: Tree,
    messages: Tree,
    group_messages: Tree,
}

impl SledStore {
    /// Open or create a sled database at `path`.
    pub fn open(path: &str) -> StoreResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> StoreResult<Self> {
        Ok(Self {
            users: db.open_tree(USERS)?,
            follows: db.open_tree(FOLLOWS)?,
            group_members: db.open_tree(GROUP_MEMBERS)?,
            messages: db.open_tree(MESSAGES)?,
            group_messages: db.open_tree(GROUP_MESSAGES)?,
            db,
        })
    }

    /// Flush pending writes to disk.
    pub fn flush(&self) -> StoreResult<()> {
        self.db.flush()?;
        Ok(())
    }

    // The writes below belong to the CRUD layer in production; they are
    // exposed so the collaborator data can be seeded.

    pub fn upsert_user(&self, user: UserId, username: &str) -> StoreResult<()> {
        self.users.insert(user.to_be_bytes(), username.as_bytes())?;
        Ok(())
    }

    pub fn follow(&self, follower: UserId, following: UserId) -> StoreResult<()> {
        self.follows
            .insert(pair_key(follower, following), &[] as &[u8])?;
        Ok(())
    }

    pub fn unfollow(&self, follower: UserId, following: UserId) -> StoreResult<()> {
        self.follows.remove(pair_key(follower, following))?;
        Ok(())
    }

    pub fn set_group_membership(
        &self,
        group: GroupId,
        user: UserId,
        status: MembershipStatus,
    ) -> StoreResult<()> {
        let value = serde_json::to_vec(&status)?;
        self.group_members.insert(pair_key(group, user), value)?;
        Ok(())
    }

    pub fn remove_group_membership(&self, group: GroupId, user: UserId) -> StoreResult<()> {
        self.group_members.remove(pair_key(group, user))?;
        Ok(())
    }

    fn membership(&self, group: GroupId, user: UserId) -> StoreResult<Option<MembershipStatus>> {
        match self.group_members.get(pair_key(group, user))? {
            Some(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            None => Ok(None),
        }
    }

    fn next_seq(&self) -> StoreResult<[u8; 8]> {
        Ok(self.db.generate_id()?.to_be_bytes())
    }
}

impl SocialGraph for SledStore {
    fn follows_either(&self, a: UserId, b: UserId) -> StoreResult<bool> {
        Ok(self.follows.contains_key(pair_key(a, b))?
            || self.follows.contains_key(pair_key(b, a))?)
    }

    fn is_accepted_member(&self, group: GroupId, user: UserId) -> StoreResult<bool> {
        Ok(self.membership(group, user)? == Some(MembershipStatus::Accepted))
    }

    fn accepted_member_ids(&self, group: GroupId) -> StoreResult<Vec<UserId>> {
        let mut ids = Vec::new();
        for entry in self.group_members.scan_prefix(group.to_be_bytes()) {
            let (key, value) = entry?;
            let status: MembershipStatus = serde_json::from_slice(&value)?;
            if status == MembershipStatus::Accepted {
                ids.push(read_id(&key, 8, GROUP_MEMBERS)?);
            }
        }
        Ok(ids)
    }

    fn username(&self, user: UserId) -> StoreResult<Option<String>> {
        Ok(self
            .users
            .get(user.to_be_bytes())?
            .map(|raw| String::from_utf8_lossy(&raw).into_owned()))
    }
}

impl MessageStore for SledStore {
    fn persist_direct_message(
        &self,
        sender: UserId,
        recipient: UserId,
        content: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let row = StoredMessage {
            sender_id: sender,
            receiver_id: recipient,
            content: content.to_string(),
            created_at: at,
        };

        let mut key = conversation_prefix(sender, recipient).to_vec();
        key.extend_from_slice(&at.timestamp_micros().to_be_bytes());
        key.extend_from_slice(&self.next_seq()?);

        self.messages.insert(key, serde_json::to_vec(&row)?)?;
        Ok(())
    }

    fn persist_group_message(
        &self,
        group: GroupId,
        sender: UserId,
        content: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        if !self.is_accepted_member(group, sender)? {
            return Err(StoreError::NotAMember {
                group,
                user: sender,
            });
        }

        let row = StoredGroupMessage {
            group_id: group,
            sender_id: sender,
            content: content.to_string(),
            created_at: at,
        };

        let mut key = group.to_be_bytes().to_vec();
        key.extend_from_slice(&at.timestamp_micros().to_be_bytes());
        key.extend_from_slice(&self.next_seq()?);

        self.group_messages.insert(key, serde_json::to_vec(&row)?)?;
        Ok(())
    }

    fn read_history(&self, a: UserId, b: UserId) -> StoreResult<Vec<StoredMessage>> {
        self.messages
            .scan_prefix(conversation_prefix(a, b))
            .map(|entry| -> StoreResult<StoredMessage> {
                let (_, value) = entry?;
                Ok(serde_json::from_slice(&value)?)
            })
            .collect()
    }

    fn read_history_page(
        &self,
        a: UserId,
        b: UserId,
        offset: usize,
        limit: usize,
    ) -> StoreResult<Vec<StoredMessage>> {
        self.messages
            .scan_prefix(conversation_prefix(a, b))
            .rev()
            .skip(offset)
            .take(limit)
            .map(|entry| -> StoreResult<StoredMessage> {
                let (_, value) = entry?;
                Ok(serde_json::from_slice(&value)?)
            })
            .collect()
    }

    fn read_group_backlog(
        &self,
        group: GroupId,
        offset: usize,
        limit: usize,
    ) -> StoreResult<Vec<GroupBacklogEntry>> {
        let mut page = Vec::with_capacity(limit);
        for entry in self
            .group_messages
            .scan_prefix(group.to_be_bytes())
            .rev()
            .skip(offset)
            .take(limit)
        {
            let (_, value) = entry?;
            let message: StoredGroupMessage = serde_json::from_slice(&value)?;
            let username = self.username(message.sender_id)?.unwrap_or_default();
            page.push(GroupBacklogEntry { message, username });
        }
        page.reverse();
        Ok(page)
    }
}

impl std::fmt::Debug for SledStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SledStore")
            .field("db", &"sled::Db")
            .finish()
    }
}

fn pair_key(first: i64, second: i64) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&first.to_be_bytes());
    key[8..].copy_from_slice(&second.to_be_bytes());
    key
}

/// Both directions of a conversation share one prefix.
fn conversation_prefix(a: UserId, b: UserId) -> [u8; 16] {
    pair_key(a.min(b), a.max(b))
}

fn read_id(key: &[u8], at: usize, tree: &'static str) -> StoreResult<i64> {
    key.get(at..at + 8)
        .and_then(|bytes| bytes.try_into().ok())
        .map(i64::from_be_bytes)
        .ok_or(StoreError::CorruptKey(tree))
}
