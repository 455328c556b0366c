//! Handler for `GET /persons/`.

use axum::{Json, extract::State};
use roster_core::{
  Error, manager::VersionManager, person::PersonSummary, store::PersonStore,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

#[derive(Debug, Serialize, Deserialize)]
pub struct PersonsResponse {
  pub persons: Vec<PersonSummary>,
}

/// `GET /persons/` — every stored version of every person. An empty store is
/// reported as 404.
pub async fn list<S>(
  State(manager): State<VersionManager<S>>,
) -> Result<Json<PersonsResponse>, ApiError>
where
  S: PersonStore + 'static,
  Error: From<S::Error>,
{
  let persons = manager.list().await?;
  if persons.is_empty() {
    return Err(ApiError::NotFound("no records found".to_string()));
  }
  Ok(Json(PersonsResponse { persons }))
}
