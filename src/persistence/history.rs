//! Paged reads served to the HTTP layer, rendered as wire frames so a page
//! of history looks exactly like the live events it was recorded from.

use std::sync::Arc;

use super::{GroupBacklogEntry, GroupId, MessageStore, StoredMessage, UserId};
use crate::config::StorageSettings;
use crate::hub::event::{GROUP_MESSAGE, PRIVATE_MESSAGE};
use crate::transport::message::Frame;
use crate::utils::error::StoreResult;

pub struct HistoryReader<S: ?Sized> {
    store: Arc<S>,
    history_page_size: usize,
    group_backlog_page_size: usize,
}

impl<S> HistoryReader<S>
where
    S: MessageStore + ?Sized,
{
    pub fn new(store: Arc<S>, settings: &StorageSettings) -> Self {
        Self {
            store,
            history_page_size: settings.history_page_size.max(1),
            group_backlog_page_size: settings.group_backlog_page_size.max(1),
        }
    }

    /// Page `page` (0 = most recent) of the conversation between `a` and `b`,
    /// newest first.
    pub fn conversation_page(
        &self,
        a: UserId,
        b: UserId,
        page: usize,
    ) -> StoreResult<Vec<Frame>> {
        let offset = page.saturating_mul(self.history_page_size);
        let rows = self
            .store
            .read_history_page(a, b, offset, self.history_page_size)?;
        Ok(rows.into_iter().map(Frame::from).collect())
    }

    /// Page `page` (0 = most recent) of a group's backlog, oldest first.
    pub fn group_backlog_page(&self, group: GroupId, page: usize) -> StoreResult<Vec<Frame>> {
        let offset = page.saturating_mul(self.group_backlog_page_size);
        let rows = self
            .store
            .read_group_backlog(group, offset, self.group_backlog_page_size)?;
        Ok(rows.into_iter().map(Frame::from).collect())
    }
}

impl From<StoredMessage> for Frame {
    fn from(row: StoredMessage) -> Self {
        let mut frame = Frame::new(PRIVATE_MESSAGE, row.sender_id);
        frame.to = Some(row.receiver_id);
        frame.content = row.content;
        frame.timestamp = Some(row.created_at);
        frame
    }
}

impl From<GroupBacklogEntry> for Frame {
    fn from(entry: GroupBacklogEntry) -> Self {
        let row = entry.message;
        let mut frame = Frame::new(GROUP_MESSAGE, row.sender_id);
        frame.group_id = Some(row.group_id);
        frame.content = row.content;
        frame.username = Some(entry.username);
        frame.timestamp = Some(row.created_at);
        frame
    }
}
