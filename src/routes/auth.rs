use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use rusqlite::{params, TransactionBehavior};
use serde::Deserialize;
use serde_json::json;

use crate::auth::{password, token};
use crate::error::{AppError, AppResult};
use crate::routes::users::fetch_user;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/register", post(register))
        .route("/api/login", post(login))
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub phone: String,
    pub bio: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<Response> {
    for (field, value) in [
        ("username", &req.username),
        ("email", &req.email),
        ("password", &req.password),
        ("full_name", &req.full_name),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::BadRequest(format!("Missing field: {}", field)));
        }
    }

    let user_id = uuid::Uuid::now_v7().to_string();
    let hash = password::hash_password(&req.password)?;
    let bio = req.bio.unwrap_or_else(|| "New user".to_string());

    let mut conn = state.db.get()?;

    // The duplicate check and the insert must not interleave with another
    // registration, or the loser hits the UNIQUE constraint instead of
    // getting the 400.
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let taken: bool = tx.query_row(
        "SELECT COUNT(*) > 0 FROM users WHERE username = ?1 OR email = ?2",
        params![req.username, req.email],
        |r| r.get(0),
    )?;
    if taken {
        return Err(AppError::BadRequest(
            "Username or email already in use".into(),
        ));
    }

    tx.execute(
        "INSERT INTO users (id, username, email, password_hash, full_name, phone, bio)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![user_id, req.username, req.email, hash, req.full_name, req.phone, bio],
    )?;

    tx.commit()?;

    let user = fetch_user(&conn, &user_id)?
        .ok_or_else(|| AppError::Internal("registered user missing from database".into()))?;

    tracing::info!("Registered user {}", user.username);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Registration successful", "user": user })),
    )
        .into_response())
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Response> {
    let (user_id, hash) = {
        let conn = state.db.get()?;
        conn.query_row(
            "SELECT id, password_hash FROM users WHERE username = ?1",
            params![req.username],
            |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?)),
        )
        .map_err(|_| AppError::Unauthorized)?
    };

    if !password::verify_password(&req.password, &hash) {
        return Err(AppError::Unauthorized);
    }

    let bearer = token::issue_token(&state.db, &user_id, state.config.auth.token_hours)?;

    let conn = state.db.get()?;
    let user = fetch_user(&conn, &user_id)?.ok_or(AppError::Unauthorized)?;

    Ok(Json(json!({
        "message": "Login successful",
        "token": bearer,
        "user": user,
    }))
    .into_response())
}
