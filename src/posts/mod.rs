use rusqlite::{params, TransactionBehavior};

use crate::db::models::{Post, PostWithTally, Severity, VoteTally, VoteType};
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::oracle::DetectionOracle;
use crate::severity;
use crate::state::DbPool;
use crate::storage::BlobStore;

/// Fixed award credited to the reporter for each accepted post.
const POINTS_PER_POST: i64 = 10;

/// Run an image through the detection oracle and, when it shows potholes,
/// persist the report and credit the reporter.
///
/// The post row and the point credit land in one transaction; a
/// zero-detection image persists nothing at all and surfaces as
/// `NoDetection`. Severity and count are computed here once and never
/// touched again.
pub async fn create_post(
    pool: &DbPool,
    oracle: &dyn DetectionOracle,
    blobs: &BlobStore,
    user: &CurrentUser,
    image_bytes: &[u8],
    latitude: f64,
    longitude: f64,
    address: &str,
) -> AppResult<Post> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(AppError::BadRequest("Invalid latitude".into()));
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(AppError::BadRequest("Invalid longitude".into()));
    }

    let decoded = image::load_from_memory(image_bytes)
        .map_err(|_| AppError::BadRequest("Invalid image file".into()))?;
    let (img_w, img_h) = image::GenericImageView::dimensions(&decoded);

    let detections = oracle.detect(image_bytes).await.map_err(|e| {
        tracing::error!("Detection oracle failed: {}", e);
        AppError::OracleUnavailable
    })?;

    let (severity, count) = severity::classify(&detections, img_w, img_h);
    if count == 0 {
        return Err(AppError::NoDetection);
    }

    let image_path = blobs.put(&user.id, image_bytes)?;
    let post_id = uuid::Uuid::now_v7().to_string();
    let caption = format!(
        "Detected {} pothole{} ({})",
        count,
        if count == 1 { "" } else { "s" },
        severity
    );

    let persisted = (|| -> AppResult<String> {
        let mut conn = pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute(
            "INSERT INTO posts (id, user_id, image_path, latitude, longitude, address, pothole_count, severity, caption)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                post_id,
                user.id,
                image_path,
                latitude,
                longitude,
                address,
                count as i64,
                severity.as_str(),
                caption
            ],
        )?;

        let credited = tx.execute(
            "UPDATE users SET points = points + ?1 WHERE id = ?2",
            params![POINTS_PER_POST, user.id],
        )?;
        if credited != 1 {
            return Err(AppError::Internal(format!(
                "reporter {} vanished during post creation",
                user.id
            )));
        }

        tx.commit()?;

        conn.query_row(
            "SELECT created_at FROM posts WHERE id = ?1",
            params![post_id],
            |r| r.get(0),
        )
        .map_err(AppError::from)
    })();

    let created_at = match persisted {
        Ok(created_at) => created_at,
        Err(e) => {
            // The transaction rolled back; drop the orphaned blob too.
            blobs.remove(&image_path);
            return Err(e);
        }
    };

    Ok(Post {
        id: post_id,
        user_id: user.id.clone(),
        image_path,
        latitude,
        longitude,
        address: address.to_string(),
        pothole_count: count as i64,
        severity,
        caption,
        created_at,
    })
}

/// Full feed, newest first, each post carrying its live vote tally. Tallies
/// are computed from the verification ledger on every read; they are never
/// cached on the post row.
pub fn list_posts(pool: &DbPool) -> AppResult<Vec<PostWithTally>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(
        "SELECT p.id, p.user_id, u.username, p.image_path, p.latitude, p.longitude,
                p.address, p.pothole_count, p.severity, p.caption, p.created_at,
                (SELECT COUNT(*) FROM post_verifications v
                  WHERE v.post_id = p.id AND v.verification_type = 'CONFIRM') AS valid_count,
                (SELECT COUNT(*) FROM post_verifications v
                  WHERE v.post_id = p.id AND v.verification_type = 'FALSE') AS false_count
         FROM posts p
         JOIN users u ON u.id = p.user_id
         ORDER BY p.created_at DESC, p.id DESC",
    )?;

    let posts = stmt
        .query_map([], |row| {
            let severity_text: String = row.get(8)?;
            Ok(PostWithTally {
                post: Post {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    image_path: row.get(3)?,
                    latitude: row.get(4)?,
                    longitude: row.get(5)?,
                    address: row.get(6)?,
                    pothole_count: row.get(7)?,
                    severity: Severity::from_str(&severity_text).unwrap_or(Severity::NotSerious),
                    caption: row.get(9)?,
                    created_at: row.get(10)?,
                },
                username: row.get(2)?,
                verification: VoteTally {
                    valid: row.get(11)?,
                    false_: row.get(12)?,
                },
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(posts)
}

/// Record a user's vote on a post. One row per (post, user): a revote
/// overwrites the earlier vote in place. Voting on your own post is
/// rejected.
pub fn cast_vote(
    pool: &DbPool,
    user: &CurrentUser,
    post_id: &str,
    vote: VoteType,
) -> AppResult<()> {
    let mut conn = pool.get()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let owner_id: String = tx
        .query_row(
            "SELECT user_id FROM posts WHERE id = ?1",
            params![post_id],
            |r| r.get(0),
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => AppError::NotFound,
            other => AppError::Database(other),
        })?;

    if owner_id == user.id {
        return Err(AppError::Forbidden);
    }

    let vote_id = uuid::Uuid::now_v7().to_string();
    tx.execute(
        "INSERT INTO post_verifications (id, post_id, user_id, verification_type)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT (post_id, user_id)
         DO UPDATE SET verification_type = excluded.verification_type",
        params![vote_id, post_id, user.id, vote.as_str()],
    )?;

    tx.commit()?;
    Ok(())
}

/// Current tally for one post.
pub fn vote_tally(pool: &DbPool, post_id: &str) -> AppResult<VoteTally> {
    let conn = pool.get()?;
    let tally = conn.query_row(
        "SELECT
            (SELECT COUNT(*) FROM post_verifications
              WHERE post_id = ?1 AND verification_type = 'CONFIRM'),
            (SELECT COUNT(*) FROM post_verifications
              WHERE post_id = ?1 AND verification_type = 'FALSE')",
        params![post_id],
        |r| {
            Ok(VoteTally {
                valid: r.get(0)?,
                false_: r.get(1)?,
            })
        },
    )?;
    Ok(tally)
}

/// Delete a user account: every vote they cast, every post they own (votes
/// on those posts go with them via FK cascade), then the user row itself,
/// all in one transaction. Only the owner or an admin may do this.
pub fn delete_user(pool: &DbPool, requester: &CurrentUser, target_id: &str) -> AppResult<()> {
    if requester.id != target_id && !requester.is_admin() {
        return Err(AppError::Forbidden);
    }

    let mut conn = pool.get()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let exists: bool = tx.query_row(
        "SELECT COUNT(*) > 0 FROM users WHERE id = ?1",
        params![target_id],
        |r| r.get(0),
    )?;
    if !exists {
        return Err(AppError::NotFound);
    }

    tx.execute(
        "DELETE FROM post_verifications WHERE user_id = ?1",
        params![target_id],
    )?;
    tx.execute("DELETE FROM posts WHERE user_id = ?1", params![target_id])?;
    tx.execute("DELETE FROM users WHERE id = ?1", params![target_id])?;

    tx.commit()?;
    Ok(())
}
