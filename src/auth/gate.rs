use crate::persistence::{GroupId, SocialGraph, UserId};
use crate::utils::error::StoreResult;

/// May `from` send a private message to `to`?
///
/// Requires a follow edge in at least one direction. Non-positive ids are
/// refused without touching the store.
pub fn may_message<G>(graph: &G, from: UserId, to: UserId) -> StoreResult<bool>
where
    G: SocialGraph + ?Sized,
{
    if from <= 0 || to <= 0 {
        return Ok(false);
    }
    graph.follows_either(from, to)
}

/// Is `user` an accepted member of `group`?
pub fn is_accepted_member<G>(graph: &G, group: GroupId, user: UserId) -> StoreResult<bool>
where
    G: SocialGraph + ?Sized,
{
    if group <= 0 || user <= 0 {
        return Ok(false);
    }
    graph.is_accepted_member(group, user)
}

/// Accepted members of `group`, resolved fresh on every call.
pub fn accepted_member_ids<G>(graph: &G, group: GroupId) -> StoreResult<Vec<UserId>>
where
    G: SocialGraph + ?Sized,
{
    if group <= 0 {
        return Ok(Vec::new());
    }
    graph.accepted_member_ids(group)
}
