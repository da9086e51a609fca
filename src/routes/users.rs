use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use rusqlite::{params, OptionalExtension};
use serde::Deserialize;
use serde_json::json;

use crate::db::models::{Role, User};
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::posts;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/api/users/{id}",
        get(get_profile).put(update_profile).delete(delete_account),
    )
}

/// Load one user row as its public representation (no credential).
pub fn fetch_user(conn: &rusqlite::Connection, user_id: &str) -> AppResult<Option<User>> {
    let user = conn
        .query_row(
            "SELECT id, username, email, full_name, phone, bio, role, points, created_at
             FROM users WHERE id = ?1",
            params![user_id],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    email: row.get(2)?,
                    full_name: row.get(3)?,
                    phone: row.get(4)?,
                    bio: row.get(5)?,
                    role: Role::from_str(&row.get::<_, String>(6)?),
                    points: row.get(7)?,
                    created_at: row.get(8)?,
                })
            },
        )
        .optional()?;
    Ok(user)
}

async fn get_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let user = fetch_user(&conn, &user_id)?.ok_or(AppError::NotFound)?;
    Ok(Json(user).into_response())
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
}

async fn update_profile(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<String>,
    Json(req): Json<UpdateProfileRequest>,
) -> AppResult<Response> {
    // Self only; admins edit their own profile like anyone else.
    if current.id != user_id {
        return Err(AppError::Forbidden);
    }

    let conn = state.db.get()?;
    if let Some(full_name) = &req.full_name {
        conn.execute(
            "UPDATE users SET full_name = ?1 WHERE id = ?2",
            params![full_name, user_id],
        )?;
    }
    if let Some(phone) = &req.phone {
        conn.execute(
            "UPDATE users SET phone = ?1 WHERE id = ?2",
            params![phone, user_id],
        )?;
    }
    if let Some(bio) = &req.bio {
        conn.execute(
            "UPDATE users SET bio = ?1 WHERE id = ?2",
            params![bio, user_id],
        )?;
    }

    let user = fetch_user(&conn, &user_id)?.ok_or(AppError::NotFound)?;
    Ok(Json(json!({ "message": "Profile updated", "user": user })).into_response())
}

async fn delete_account(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<String>,
) -> AppResult<Response> {
    posts::delete_user(&state.db, &current, &user_id)?;
    tracing::info!("Deleted user {}", user_id);
    Ok(Json(json!({ "message": "Account deleted" })).into_response())
}
