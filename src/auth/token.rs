use rand::Rng;
use rusqlite::params;

use crate::state::DbPool;

/// Issue a bearer token for a user. The token expires a fixed number of
/// hours after issue (6 by default, per config).
pub fn issue_token(pool: &DbPool, user_id: &str, hours: u64) -> Result<String, rusqlite::Error> {
    let conn = pool.get().map_err(|e| {
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
            Some(e.to_string()),
        )
    })?;

    let token = generate_token();
    let id = uuid::Uuid::now_v7().to_string();

    conn.execute(
        "INSERT INTO sessions (id, user_id, token, expires_at) VALUES (?1, ?2, ?3, datetime('now', ?4))",
        params![id, user_id, token, format!("+{} hours", hours)],
    )?;

    Ok(token)
}

/// Revoke a bearer token.
pub fn revoke_token(pool: &DbPool, token: &str) -> Result<(), rusqlite::Error> {
    let conn = pool.get().map_err(|e| {
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
            Some(e.to_string()),
        )
    })?;

    conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
    Ok(())
}

/// Generate a cryptographically random 32-byte hex token.
fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[test]
    fn generate_token_is_64_hex_chars() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generate_token_is_unique() {
        let t1 = generate_token();
        let t2 = generate_token();
        assert_ne!(t1, t2);
    }

    #[test]
    fn issued_token_expires_six_hours_out() {
        let pool = db::test_pool();
        let conn = pool.get().unwrap();
        conn.execute(
            "INSERT INTO users (id, username, email, password_hash, full_name) VALUES ('u1', 'a', 'a@x', 'h', 'A')",
            [],
        )
        .unwrap();
        drop(conn);

        let token = issue_token(&pool, "u1", 6).unwrap();

        let conn = pool.get().unwrap();
        let live: bool = conn
            .query_row(
                "SELECT expires_at > datetime('now', '+5 hours')
                   AND expires_at <= datetime('now', '+6 hours')
                 FROM sessions WHERE token = ?1",
                params![token],
                |r| r.get(0),
            )
            .unwrap();
        assert!(live);
    }

    #[test]
    fn revoked_token_is_gone() {
        let pool = db::test_pool();
        let conn = pool.get().unwrap();
        conn.execute(
            "INSERT INTO users (id, username, email, password_hash, full_name) VALUES ('u1', 'a', 'a@x', 'h', 'A')",
            [],
        )
        .unwrap();
        drop(conn);

        let token = issue_token(&pool, "u1", 6).unwrap();
        revoke_token(&pool, &token).unwrap();

        let conn = pool.get().unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sessions WHERE token = ?1",
                params![token],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(count, 0);
    }
}
