//! The `utils` module provides a collection of utility functions and common
//! definitions used across the `socialhub` application.
//!
//! It centralizes the error types shared by the store, hub and transport,
//! and the one-time logging bootstrap used by the binary.

pub mod error;
pub mod logging;

pub use error::{ConnectError, HubClosed, StoreError, StoreResult};
