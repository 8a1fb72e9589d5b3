#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};

use axum::{body::Body, http::Response};
use chrono::{Duration, Utc};
use quizzery::{config::Config, db::Db, storage::Storage, AppState};

fn temp_path(kind: &str) -> PathBuf {
    static COUNTER: AtomicU32 = AtomicU32::new(0);
    let id = COUNTER.fetch_add(1, Ordering::SeqCst);
    std::env::temp_dir().join(format!("quizzery_test_{kind}_{}_{}", std::process::id(), id))
}

fn test_db_url() -> String {
    let path = temp_path("db").with_extension("sqlite");
    // Clean up leftover file from previous runs
    let _ = std::fs::remove_file(&path);
    format!("sqlite:{}?mode=rwc", path.display())
}

pub async fn create_test_db() -> Db {
    Db::new(&test_db_url()).await.expect("failed to create test database")
}

/// App state over a fresh database and a fresh local uploads directory.
pub async fn test_state() -> AppState {
    let url = test_db_url();
    let db = Db::new(&url).await.expect("failed to create test database");
    let uploads_dir = temp_path("uploads");
    let storage = Storage::from_config(None, &uploads_dir).expect("local storage");
    let config = Config {
        database_url: url,
        ..Config::for_tests(uploads_dir)
    };
    AppState::new(db, storage, config)
}

/// Moves every attachment's last edit back past the replace cool-down.
pub async fn age_attachments(state: &AppState) {
    let pool = sqlx::SqlitePool::connect(&state.config.database_url)
        .await
        .expect("open test database");
    sqlx::query("UPDATE attachments SET updated_at = ?")
        .bind(Utc::now() - Duration::minutes(2))
        .execute(&pool)
        .await
        .expect("age attachments");
    pool.close().await;
}

/// `name=value` of the session cookie set by a response, if any.
pub fn session_cookie(resp: &Response<Body>) -> Option<String> {
    resp.headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(quizzery::names::SESSION_COOKIE_NAME))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

pub async fn body_string(resp: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

pub async fn body_json(resp: Response<Body>) -> serde_json::Value {
    serde_json::from_str(&body_string(resp).await).expect("json body")
}
