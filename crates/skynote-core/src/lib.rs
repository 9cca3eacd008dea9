//! # skynote-core
//!
//! Core types, the persistent note index, and the content store abstraction
//! for SkyNote.
//!
//! This crate provides the foundational data structures and trait definitions
//! that the portal client and the HTTP server depend on.

pub mod defaults;
pub mod error;
pub mod index;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use index::Index;
pub use models::*;
pub use traits::*;
