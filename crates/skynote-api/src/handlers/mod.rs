//! HTTP handlers for skynote-api.

pub mod notes;

pub use notes::{edit_note, health_check, list_notes, save_note, view_note};
