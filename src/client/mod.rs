//! The `client` module defines the representation of a connected client.
//!
//! A [`ClientSession`] is the hub's handle on one connection: the identity it
//! was opened for, a per-connection id, and the sending side of a bounded
//! outbound queue. The [`pump`] functions bridge that queue and the physical
//! WebSocket in both directions.

pub mod pump;
pub mod session;

pub use session::{ClientSession, ConnectionId};
