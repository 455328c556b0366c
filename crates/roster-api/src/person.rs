//! Handlers for `/person` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/person/:identity` | Optional `?version=<n>`; latest otherwise |
//! | `POST`   | `/person/` | Body: [`NewPerson`]; returns 201 + version 1 |
//! | `PUT`    | `/person/` | Body: [`PersonUpdate`]; returns the new version |
//! | `DELETE` | `/person/:identity` | Deletes the latest version |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use roster_core::{
  Error,
  manager::VersionManager,
  person::{NewPerson, PersonRecord, PersonUpdate},
  store::PersonStore,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

// ─── Read ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ReadParams {
  pub version: Option<u32>,
}

/// `GET /person/:identity[?version=<n>]`
pub async fn read<S>(
  State(manager): State<VersionManager<S>>,
  Path(identity): Path<Uuid>,
  Query(params): Query<ReadParams>,
) -> Result<Json<PersonRecord>, ApiError>
where
  S: PersonStore + 'static,
  Error: From<S::Error>,
{
  let person = manager.read(identity, params.version).await?;
  Ok(Json(person))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /person/` — returns 201 + the stored [`PersonRecord`].
pub async fn create<S>(
  State(manager): State<VersionManager<S>>,
  Json(body): Json<NewPerson>,
) -> Result<impl IntoResponse, ApiError>
where
  S: PersonStore + 'static,
  Error: From<S::Error>,
{
  let person = manager.create(body).await?;
  Ok((StatusCode::CREATED, Json(person)))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /person/` — body carries `identity` plus the fields to change.
pub async fn update<S>(
  State(manager): State<VersionManager<S>>,
  Json(body): Json<PersonUpdate>,
) -> Result<Json<PersonRecord>, ApiError>
where
  S: PersonStore + 'static,
  Error: From<S::Error>,
{
  let person = manager.update(body).await.map_err(|e| match e {
    Error::NotFound { identity, .. } => ApiError::NotFound(format!(
      "cannot update person, no records with person_id {identity} found"
    )),
    other => other.into(),
  })?;
  Ok(Json(person))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
  pub success: bool,
}

/// `DELETE /person/:identity`
pub async fn delete<S>(
  State(manager): State<VersionManager<S>>,
  Path(identity): Path<Uuid>,
) -> Result<Json<DeleteResponse>, ApiError>
where
  S: PersonStore + 'static,
  Error: From<S::Error>,
{
  manager.delete(identity).await.map_err(|e| match e {
    Error::NotFound { identity, .. } => ApiError::NotFound(format!(
      "cannot delete record, no records with person_id {identity} found"
    )),
    other => other.into(),
  })?;
  Ok(Json(DeleteResponse { success: true }))
}
