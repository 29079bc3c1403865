#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHasher, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use qspool_api::config::ServerConfig;
use qspool_api::registry::{BackendEntry, Registry, UserEntry};
use qspool_api::router::build_app_router;
use qspool_api::state::AppState;
use qspool_core::queue::JobQueue;
use qspool_core::storage::MemoryStorage;

pub const ALICE: (&str, &str) = ("alice", "alice-password");
pub const BOB: (&str, &str) = ("bob", "bob-password");
pub const SPOOLER: (&str, &str) = ("spooler", "spooler-password");

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        registry_path: PathBuf::from("unused.json"),
        spooler_username: SPOOLER.0.to_string(),
    }
}

/// Argon2id with the smallest allowed cost, so tests do not spend their time
/// hashing.
fn cheap_hash(password: &str) -> String {
    let params = Params::new(Params::MIN_M_COST, 1, 1, None).unwrap();
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    let salt = SaltString::generate(&mut OsRng);
    argon2
        .hash_password(password.as_bytes(), &salt)
        .unwrap()
        .to_string()
}

pub fn test_registry() -> Registry {
    let users = [ALICE, BOB, SPOOLER]
        .into_iter()
        .map(|(username, password)| UserEntry {
            username: username.to_string(),
            password_hash: cheap_hash(password),
        })
        .collect();
    let backends = ["fermions", "bosons"]
        .into_iter()
        .map(|name| BackendEntry {
            name: name.to_string(),
            description: String::new(),
        })
        .collect();
    Registry::from_entries(users, backends).unwrap()
}

/// Build the full application router over an in-memory store.
///
/// The store is returned as well so tests can play the executor or take the
/// provider offline.
pub fn build_test_app() -> (Router, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    let config = test_config();
    let state = AppState {
        queue: JobQueue::new(storage.clone()),
        registry: Arc::new(test_registry()),
        config: Arc::new(config.clone()),
    };
    (build_app_router(state, &config), storage)
}

/// Percent-encode a query or form value.
pub fn encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

/// Build `k1=v1&k2=v2` with encoded values.
pub fn encode_pairs(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{k}={}", encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_form(app: Router, uri: &str, pairs: &[(&str, &str)]) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(encode_pairs(pairs)))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Endpoint shorthands
// ---------------------------------------------------------------------------

pub async fn submit(app: &Router, backend: &str, user: (&str, &str), json: &str) -> Response {
    post_form(
        app.clone(),
        &format!("/api/{backend}/post_job/"),
        &[("username", user.0), ("password", user.1), ("json", json)],
    )
    .await
}

pub async fn job_query(
    app: &Router,
    backend: &str,
    endpoint: &str,
    user: (&str, &str),
    job_id: &str,
) -> Response {
    let reference = serde_json::json!({ "job_id": job_id }).to_string();
    let query = encode_pairs(&[
        ("username", user.0),
        ("password", user.1),
        ("json", &reference),
    ]);
    get(app.clone(), &format!("/api/{backend}/{endpoint}/?{query}")).await
}

pub async fn credentials_get(
    app: &Router,
    backend: &str,
    endpoint: &str,
    user: (&str, &str),
) -> Response {
    let query = encode_pairs(&[("username", user.0), ("password", user.1)]);
    get(app.clone(), &format!("/api/{backend}/{endpoint}/?{query}")).await
}
