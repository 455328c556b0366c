//! [`VersionManager`] — create/update/delete semantics over a
//! [`PersonStore`].
//!
//! Per identity the implicit state is either absent (no rows) or active
//! (at least one row, exactly one of them latest). Every write below keeps
//! that invariant; the two-step writes go through the store's atomic
//! `supersede` and `delete_latest` so a failure midway changes nothing.

use std::sync::Arc;

use uuid::Uuid;

use crate::{
  Error, Result,
  person::{NewPerson, PersonRecord, PersonSummary, PersonUpdate},
  store::{Deletion, PersonStore},
};

/// Versioning front-end for a person store.
///
/// Cloning is cheap — the store handle is reference-counted.
pub struct VersionManager<S> {
  store: Arc<S>,
}

impl<S> Clone for VersionManager<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<S> VersionManager<S>
where
  S: PersonStore,
  Error: From<S::Error>,
{
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// The underlying store handle.
  pub fn store(&self) -> &Arc<S> { &self.store }

  /// Create a new identity at version 1.
  pub async fn create(&self, person: NewPerson) -> Result<PersonRecord> {
    person.validate()?;

    let identity = self.fresh_identity().await?;
    let record = self
      .store
      .insert(person, identity, 1, true)
      .await?;

    tracing::info!(%identity, record, "created person");

    // Re-read so the caller sees exactly what was stored (timestamps
    // included).
    self
      .store
      .get(identity, Some(1))
      .await?
      .ok_or(Error::NotFound { identity, version: Some(1) })
  }

  /// Look up the latest version of `identity`, or an exact version.
  pub async fn read(
    &self,
    identity: Uuid,
    version: Option<u32>,
  ) -> Result<PersonRecord> {
    self
      .store
      .get(identity, version)
      .await?
      .ok_or(Error::NotFound { identity, version })
  }

  /// Append a new version carrying the fields of `update` that differ from
  /// the current latest row.
  pub async fn update(&self, update: PersonUpdate) -> Result<PersonRecord> {
    let identity = update.identity;
    let current = self
      .store
      .get(identity, None)
      .await?
      .ok_or(Error::NotFound { identity, version: None })?;

    let changes = update.diff(&current);
    if changes.is_empty() {
      return Err(Error::NoOpUpdate);
    }
    let fields = changes.names();

    let next = changes.apply(current.payload());
    next.validate()?;

    let Some(record) = self
      .store
      .supersede(identity, current.version, next)
      .await?
    else {
      tracing::warn!(
        %identity,
        version = current.version,
        "latest row changed underneath update"
      );
      return Err(Error::Versioning(
        "failed to deactivate previous version".to_string(),
      ));
    };

    tracing::info!(
      %identity,
      version = record.version,
      ?fields,
      "updated person"
    );
    Ok(record)
  }

  /// Delete the latest version of `identity`, promoting its predecessor.
  pub async fn delete(&self, identity: Uuid) -> Result<()> {
    let latest = self
      .store
      .latest_version(identity)
      .await?
      .ok_or(Error::NotFound { identity, version: None })?;

    match self.store.delete_latest(identity, latest).await? {
      Deletion::Missing => Err(Error::NotFound { identity, version: None }),
      Deletion::Stale => {
        tracing::warn!(
          %identity,
          version = latest,
          "latest row changed underneath delete"
        );
        Err(Error::Versioning("versioning error".to_string()))
      }
      Deletion::Emptied => {
        tracing::info!(%identity, "deleted last version of person");
        Ok(())
      }
      Deletion::Promoted(previous) => {
        tracing::info!(
          %identity,
          deleted = latest,
          latest = previous.version,
          "deleted person version"
        );
        Ok(())
      }
      Deletion::PromotionFailed => {
        tracing::warn!(
          %identity,
          version = latest,
          "no predecessor to promote; delete rolled back"
        );
        Err(Error::Versioning("versioning error".to_string()))
      }
    }
  }

  /// Every stored row, projected to its listing shape.
  pub async fn list(&self) -> Result<Vec<PersonSummary>> {
    let rows = self.store.list_all().await?;
    Ok(rows.iter().map(PersonRecord::summary).collect())
  }

  /// A v4 UUID with no rows in the store.
  async fn fresh_identity(&self) -> Result<Uuid> {
    loop {
      let identity = Uuid::new_v4();
      match self.store.latest_version(identity).await? {
        None => return Ok(identity),
        Some(_) => tracing::warn!(%identity, "identity collision, regenerating"),
      }
    }
  }
}
