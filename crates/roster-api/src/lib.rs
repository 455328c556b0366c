//! JSON REST API for Roster.
//!
//! Exposes an axum [`Router`] backed by a [`VersionManager`] over any
//! [`roster_core::store::PersonStore`]. TLS and transport concerns are the
//! caller's responsibility.

pub mod error;
pub mod person;
pub mod persons;

use std::path::{Path, PathBuf};

use axum::{
  Router,
  routing::{get, post},
};
use roster_core::{manager::VersionManager, store::PersonStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:         String,
  pub port:         u16,
  /// SQLite database location; `:memory:` for an ephemeral store.
  pub database_url: String,
}

impl ServerConfig {
  /// Layer defaults, the optional TOML file at `path`, and `ROSTER_*`
  /// environment variables, in increasing precedence.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .set_default("host", "127.0.0.1")?
      .set_default("port", 8000)?
      .set_default("database_url", "roster.db")?
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("ROSTER"))
      .build()?
      .try_deserialize()
  }

  /// The database path with any `sqlite://` or `sqlite:` scheme stripped.
  pub fn store_path(&self) -> PathBuf {
    let url = self.database_url.as_str();
    let path = url
      .strip_prefix("sqlite://")
      .or_else(|| url.strip_prefix("sqlite:"))
      .unwrap_or(url);
    PathBuf::from(path)
  }

  pub fn is_in_memory(&self) -> bool {
    self.store_path() == Path::new(":memory:")
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router for `manager`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(manager: VersionManager<S>) -> Router<()>
where
  S: PersonStore + 'static,
  roster_core::Error: From<S::Error>,
{
  Router::new()
    .route("/person/{identity}", get(person::read::<S>).delete(person::delete::<S>))
    .route("/person/", post(person::create::<S>).put(person::update::<S>))
    .route("/person", post(person::create::<S>).put(person::update::<S>))
    .route("/persons/", get(persons::list::<S>))
    .route("/persons", get(persons::list::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(manager)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Arc;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
  };
  use roster_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use uuid::Uuid;

  async fn make_manager() -> VersionManager<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    VersionManager::new(Arc::new(store))
  }

  async fn send(
    manager: &VersionManager<SqliteStore>,
    method:  &str,
    uri:     &str,
    body:    Option<Value>,
  ) -> Response {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
      Some(json) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };
    api_router(manager.clone()).oneshot(req).await.unwrap()
  }

  async fn body_json(resp: Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  fn sample() -> Value {
    json!({
      "first_name": "a",
      "last_name":  "b",
      "email":      "a@b.com",
      "age":        20
    })
  }

  async fn create_sample(manager: &VersionManager<SqliteStore>) -> Value {
    let resp = send(manager, "POST", "/person/", Some(sample())).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    body_json(resp).await
  }

  // ── POST ────────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn create_returns_201_with_version_one() {
    let m = make_manager().await;
    let created = create_sample(&m).await;

    assert_eq!(created["record"], 1);
    assert_eq!(created["version"], 1);
    assert_eq!(created["is_latest"], true);
    assert_eq!(created["first_name"], "a");
    assert_eq!(created["last_name"], "b");
    assert_eq!(created["email"], "a@b.com");
    assert_eq!(created["age"], 20);
    assert_eq!(created["middle_name"], Value::Null);
    let identity = created["identity"].as_str().unwrap();
    assert!(Uuid::parse_str(identity).is_ok());
  }

  #[tokio::test]
  async fn create_with_bad_email_returns_400() {
    let m = make_manager().await;
    let mut body = sample();
    body["email"] = json!("not-an-email");

    let resp = send(&m, "POST", "/person/", Some(body)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let detail = body_json(resp).await;
    assert!(detail["detail"].as_str().unwrap().contains("email"));
  }

  #[tokio::test]
  async fn create_with_negative_age_returns_400() {
    let m = make_manager().await;
    let mut body = sample();
    body["age"] = json!(-1);

    let resp = send(&m, "POST", "/person/", Some(body)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  // ── GET /person ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn read_returns_latest_and_exact_versions() {
    let m = make_manager().await;
    let created = create_sample(&m).await;
    let identity = created["identity"].as_str().unwrap().to_string();

    let resp = send(
      &m,
      "PUT",
      "/person/",
      Some(json!({ "identity": identity, "age": 21 })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let latest = body_json(send(&m, "GET", &format!("/person/{identity}"), None).await).await;
    assert_eq!(latest["version"], 2);
    assert_eq!(latest["age"], 21);

    let resp = send(&m, "GET", &format!("/person/{identity}?version=1"), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let v1 = body_json(resp).await;
    assert_eq!(v1["version"], 1);
    assert_eq!(v1["is_latest"], false);
    assert_eq!(v1["age"], 20);
  }

  #[tokio::test]
  async fn read_unknown_identity_returns_404_detail() {
    let m = make_manager().await;
    let identity = Uuid::new_v4();

    let resp = send(&m, "GET", &format!("/person/{identity}"), None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(
      body_json(resp).await,
      json!({ "detail": format!("no record found for person_id {identity}") })
    );
  }

  #[tokio::test]
  async fn read_unknown_version_returns_404_detail() {
    let m = make_manager().await;
    let created = create_sample(&m).await;
    let identity = created["identity"].as_str().unwrap();

    let resp = send(&m, "GET", &format!("/person/{identity}?version=25"), None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(
      body_json(resp).await["detail"],
      format!("no version 25 record found for person_id {identity}")
    );
  }

  #[tokio::test]
  async fn read_version_zero_returns_404_detail() {
    let m = make_manager().await;
    let created = create_sample(&m).await;
    let identity = created["identity"].as_str().unwrap();

    let resp = send(&m, "GET", &format!("/person/{identity}?version=0"), None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(
      body_json(resp).await["detail"],
      format!("no version 0 record found for person_id {identity}")
    );
  }

  // ── PUT ─────────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn update_then_identical_update_returns_400() {
    let m = make_manager().await;
    let created = create_sample(&m).await;
    let identity = created["identity"].as_str().unwrap();
    let edit = json!({ "identity": identity, "age": 21 });

    let resp = send(&m, "PUT", "/person/", Some(edit.clone())).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated = body_json(resp).await;
    assert_eq!(updated["version"], 2);
    assert_eq!(updated["is_latest"], true);
    assert_eq!(updated["first_name"], "a");
    assert_eq!(updated["identity"], identity);

    let resp = send(&m, "PUT", "/person/", Some(edit)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
      body_json(resp).await,
      json!({ "detail": "no new attributes to update" })
    );
  }

  #[tokio::test]
  async fn update_unknown_identity_returns_404() {
    let m = make_manager().await;
    let identity = Uuid::new_v4();

    let resp = send(
      &m,
      "PUT",
      "/person/",
      Some(json!({ "identity": identity, "age": 3 })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(
      body_json(resp).await["detail"],
      format!("cannot update person, no records with person_id {identity} found")
    );
  }

  // ── DELETE ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn delete_walks_back_through_versions() {
    let m = make_manager().await;
    let created = create_sample(&m).await;
    let identity = created["identity"].as_str().unwrap().to_string();
    send(
      &m,
      "PUT",
      "/person/",
      Some(json!({ "identity": identity, "last_name": "c" })),
    )
    .await;

    let resp = send(&m, "DELETE", &format!("/person/{identity}"), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!({ "success": true }));

    let latest = body_json(send(&m, "GET", &format!("/person/{identity}"), None).await).await;
    assert_eq!(latest["version"], 1);
    assert_eq!(latest["is_latest"], true);
    assert_eq!(latest["last_name"], "b");

    let resp = send(&m, "DELETE", &format!("/person/{identity}"), None).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(&m, "DELETE", &format!("/person/{identity}"), None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(
      body_json(resp).await["detail"],
      format!("cannot delete record, no records with person_id {identity} found")
    );
  }

  #[tokio::test]
  async fn delete_with_missing_predecessor_returns_500() {
    let m = make_manager().await;
    let created = create_sample(&m).await;
    let identity: Uuid = created["identity"].as_str().unwrap().parse().unwrap();
    send(
      &m,
      "PUT",
      "/person/",
      Some(json!({ "identity": identity, "age": 40 })),
    )
    .await;
    m.store().delete(identity, 1).await.unwrap();

    let resp = send(&m, "DELETE", &format!("/person/{identity}"), None).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(resp).await, json!({ "detail": "versioning error" }));
  }

  // ── GET /persons ────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn list_on_empty_store_returns_404() {
    let m = make_manager().await;
    let resp = send(&m, "GET", "/persons/", None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await, json!({ "detail": "no records found" }));
  }

  #[tokio::test]
  async fn list_projects_summary_fields() {
    let m = make_manager().await;
    let created = create_sample(&m).await;

    let resp = send(&m, "GET", "/persons", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    let persons = body["persons"].as_array().unwrap();
    assert_eq!(persons.len(), 1);
    assert_eq!(
      persons[0],
      json!({
        "record":     1,
        "identity":   created["identity"],
        "first_name": "a",
        "last_name":  "b",
        "version":    1,
        "is_latest":  true
      })
    );
  }

  // ── Config ──────────────────────────────────────────────────────────────────

  #[test]
  fn store_path_strips_sqlite_scheme() {
    let mut cfg = ServerConfig {
      host:         "127.0.0.1".to_string(),
      port:         8000,
      database_url: "sqlite:///var/lib/roster.db".to_string(),
    };
    assert_eq!(cfg.store_path(), PathBuf::from("/var/lib/roster.db"));

    cfg.database_url = ":memory:".to_string();
    assert!(cfg.is_in_memory());
  }

  #[test]
  fn load_falls_back_to_defaults() {
    let cfg = ServerConfig::load(Path::new("does-not-exist.toml")).unwrap();
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.port, 8000);
  }
}
