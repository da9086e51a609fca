use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::db::models::VoteType;
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::posts;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/upload", post(upload))
        .route("/api/posts", get(feed))
        .route("/api/posts/{id}/verify", post(verify))
}

async fn upload(
    State(state): State<AppState>,
    user: CurrentUser,
    mut multipart: Multipart,
) -> AppResult<Response> {
    let mut image: Option<Vec<u8>> = None;
    let mut latitude: Option<String> = None;
    let mut longitude: Option<String> = None;
    let mut address = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read image: {}", e)))?;
                image = Some(bytes.to_vec());
            }
            "latitude" => latitude = Some(field.text().await.unwrap_or_default()),
            "longitude" => longitude = Some(field.text().await.unwrap_or_default()),
            "address" => address = field.text().await.unwrap_or_default(),
            _ => {}
        }
    }

    let image = image.ok_or_else(|| AppError::BadRequest("An image is required".into()))?;
    let latitude: f64 = latitude
        .as_deref()
        .unwrap_or("")
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid latitude".into()))?;
    let longitude: f64 = longitude
        .as_deref()
        .unwrap_or("")
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid longitude".into()))?;

    let post = posts::create_post(
        &state.db,
        state.oracle.as_ref(),
        &state.blobs,
        &user,
        &image,
        latitude,
        longitude,
        &address,
    )
    .await?;

    tracing::info!(
        "User {} reported {} pothole(s), severity {}",
        user.username,
        post.pothole_count,
        post.severity
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Upload successful", "data": post })),
    )
        .into_response())
}

async fn feed(State(state): State<AppState>) -> AppResult<Response> {
    let posts = posts::list_posts(&state.db)?;
    Ok(Json(posts).into_response())
}

#[derive(Deserialize)]
pub struct VerifyRequest {
    #[serde(rename = "type")]
    pub vote_type: String,
}

async fn verify(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(post_id): Path<String>,
    Json(req): Json<VerifyRequest>,
) -> AppResult<Response> {
    let vote = VoteType::from_str(&req.vote_type)
        .ok_or_else(|| AppError::BadRequest("Vote type must be CONFIRM or FALSE".into()))?;

    posts::cast_vote(&state.db, &user, &post_id, vote)?;

    let tally = posts::vote_tally(&state.db, &post_id)?;
    Ok(Json(json!({ "message": "Verification saved", "verification": tally })).into_response())
}
