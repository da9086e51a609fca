use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use crate::error::AppResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/uploads/{filename}", get(serve))
}

/// Serve a stored upload by its generated filename. The blob store rejects
/// traversal-shaped names before touching the filesystem.
async fn serve(State(state): State<AppState>, Path(filename): Path<String>) -> AppResult<Response> {
    let bytes = state.blobs.get(&filename)?;
    let mime = mime_guess::from_path(&filename).first_or_octet_stream();

    Ok((
        [(header::CONTENT_TYPE, mime.as_ref().to_string())],
        bytes,
    )
        .into_response())
}
