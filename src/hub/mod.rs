//! The `hub` module is the core of the realtime service.
//!
//! A single [`Hub`] task owns the registry of connected sessions and applies
//! [`Command`]s one at a time. Everything else talks to it through a cloneable
//! [`HubHandle`]: sessions register, submit decoded [`Event`]s and sign off;
//! HTTP handlers push [`Frame`]s and read the [`PresenceSnapshot`].
//!
//! [`Frame`]: crate::transport::message::Frame

pub mod engine;
pub mod event;
pub mod handle;
pub mod presence;
mod router;

pub use engine::Hub;
pub use event::{Content, Event, EventKind};
pub use handle::{Command, HubHandle, Target};
pub use presence::PresenceSnapshot;
