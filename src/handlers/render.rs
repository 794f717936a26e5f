//! Page rendering.

use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

/// Turns a page name and its view model into a response.
///
/// Handlers never build HTML themselves, so a template engine can be swapped
/// in without touching them.
pub trait Renderer: Send + Sync {
    fn render(&self, page: &str, model: Value) -> Response;
}

/// Renders the view model as JSON: `{"page": ..., "model": ...}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn render(&self, page: &str, model: Value) -> Response {
        Json(json!({ "page": page, "model": model })).into_response()
    }
}
