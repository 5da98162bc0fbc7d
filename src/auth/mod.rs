//! The `auth` module answers the hub's authorization questions.
//!
//! The gate is a set of stateless functions over a [`SocialGraph`]; every
//! call hits the store so follow and membership changes take effect on the
//! very next event.
//!
//! [`SocialGraph`]: crate::persistence::SocialGraph

pub mod gate;

pub use gate::{accepted_member_ids, is_accepted_member, may_message};

#[cfg(test)]
mod tests;
