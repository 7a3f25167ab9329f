//! Queue backend implementations.
//!
//! This module contains concrete implementations of the `QueueBackend` and
//! `BackendConnection` traits for different queue backends.

pub mod memory;
pub mod rest;

pub use memory::InMemoryBackend;
pub use rest::RestBackend;
