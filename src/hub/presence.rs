//! Read-only presence view for callers outside the control loop.
//!
//! The hub loop republishes the set of connected identities here after every
//! registry change. HTTP handlers read it under a shared lock instead of
//! round-tripping through the loop.

use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::persistence::UserId;

#[derive(Debug, Clone, Default)]
pub struct PresenceSnapshot {
    inner: Arc<RwLock<BTreeSet<UserId>>>,
}

impl PresenceSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole set. Only the hub loop calls this.
    pub(crate) fn publish(&self, online: impl IntoIterator<Item = UserId>) {
        let next: BTreeSet<UserId> = online.into_iter().collect();
        *self.inner.write() = next;
    }

    /// Connected identities, ascending.
    pub fn online_ids(&self) -> Vec<UserId> {
        self.inner.read().iter().copied().collect()
    }

    pub fn is_online(&self, user: UserId) -> bool {
        self.inner.read().contains(&user)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}
