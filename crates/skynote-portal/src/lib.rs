//! # skynote-portal
//!
//! Skynet portal client for SkyNote.
//!
//! [`PortalClient`] implements [`skynote_core::ContentStore`] over a portal's
//! HTTP API. With the `mock` feature, [`mock::MockContentStore`] provides an
//! in-memory store for tests.

pub mod client;
#[cfg(feature = "mock")]
pub mod mock;

pub use client::{PortalClient, PortalConfig};
