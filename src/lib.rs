//! # SocialHub
//!
//! `socialhub` is the realtime core of a social network backend. Clients hold
//! one WebSocket each; a single hub task owns the registry of connected
//! users and routes every event by its `type`: private messages between
//! users who follow each other, group chat between accepted members, feed
//! and notification broadcasts, typing signals and presence snapshots.
//!
//! ## Core Modules
//!
//! - `hub`: the serialized control loop, router and outbound API for HTTP handlers.
//! - `client`: per-connection session state and the read/write pumps.
//! - `transport`: the WebSocket listener and the JSON wire frames.
//! - `auth`: follow and group-membership checks.
//! - `persistence`: collaborator contracts and the embedded `sled` store.
//! - `config`: layered configuration.
//! - `utils`: error types and logging setup.

pub mod auth;
pub mod client;
pub mod config;
pub mod hub;
pub mod persistence;
pub mod transport;
pub mod utils;

pub use hub::{Hub, HubHandle};
pub use persistence::{SledStore, Store};
