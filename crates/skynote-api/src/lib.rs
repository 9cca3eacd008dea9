//! # skynote-api
//!
//! Wiki-style note editor. Note bodies live on a Skynet portal; a local index
//! tracks the skylink currently representing each note.

pub mod config;
pub mod error;
pub mod handlers;
pub mod services;
pub mod templates;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use services::NoteService;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub notes: Arc<NoteService>,
}

impl AppState {
    pub fn new(notes: NoteService) -> Self {
        Self {
            notes: Arc::new(notes),
        }
    }
}

/// Build the router. Unmatched routes fall through to axum's 404.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::list_notes))
        .route("/health", get(handlers::health_check))
        .route("/view/:title", get(handlers::view_note))
        .route("/edit/:title", get(handlers::edit_note))
        .route("/save/:title", post(handlers::save_note))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
