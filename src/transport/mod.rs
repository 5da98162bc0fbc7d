//! The `transport` module is responsible for network communication with
//! clients over WebSockets.
//!
//! It defines the JSON frames exchanged with clients and the listener that
//! upgrades connections, resolves their identity and hands them to the hub.

pub mod message;
pub mod websocket;

pub use message::{Frame, InboundFrame, OnlineUser, OnlineUsersFrame};
pub use websocket::{
    ConnectionSlot, ConnectionSlots, identity_from_query, serve, start_websocket_server,
};
