//! Note view/edit/save handlers.

use askama::Template;
use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::{Form, Json};
use serde::Deserialize;
use tracing::{debug, error};

use skynote_core::{Note, Title};

use crate::error::ApiError;
use crate::templates::{EditTemplate, IndexTemplate, ViewTemplate};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SaveForm {
    /// A missing field is treated like an empty body.
    #[serde(default)]
    pub body: String,
}

pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// `GET /` - tracked note titles.
pub async fn list_notes(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let notes = state.notes.list().await;
    Ok(Html(IndexTemplate { notes: &notes }.render()?))
}

/// `GET /view/:title` - rendered note, or a redirect to the editor when it
/// cannot be loaded.
pub async fn view_note(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Response, ApiError> {
    let title = Title::parse(raw)?;
    match state.notes.load(&title).await {
        Ok(note) => {
            let body = note.body_text();
            let html = ViewTemplate {
                title: title.as_str(),
                body: &body,
            }
            .render()?;
            Ok(Html(html).into_response())
        }
        Err(e) => {
            debug!(subsystem = "api", title = %title, error = %e, "Load failed, redirecting to editor");
            Ok(Redirect::to(&format!("/edit/{}", title)).into_response())
        }
    }
}

/// `GET /edit/:title` - editor, empty when the note cannot be loaded.
pub async fn edit_note(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Html<String>, ApiError> {
    let title = Title::parse(raw)?;
    let note = match state.notes.load(&title).await {
        Ok(note) => note,
        Err(e) => {
            debug!(subsystem = "api", title = %title, error = %e, "Opening empty editor");
            Note::new(title.clone(), Vec::new())
        }
    };
    let body = note.body_text();
    let html = EditTemplate {
        title: title.as_str(),
        body: &body,
    }
    .render()?;
    Ok(Html(html))
}

/// `POST /save/:title` - persist the form body and show the note.
pub async fn save_note(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    Form(form): Form<SaveForm>,
) -> Result<Redirect, ApiError> {
    let title = Title::parse(raw)?;
    if let Err(e) = state.notes.save(&title, form.body.as_bytes()).await {
        error!(subsystem = "api", title = %title, error = %e, "Failed to save note");
        return Err(ApiError::Internal(e.to_string()));
    }
    Ok(Redirect::to(&format!("/view/{}", title)))
}
