//! Profile records and the document-store seam.
//!
//! The profile store is an external key-value document store keyed by
//! account id; this module defines the contract the flows consume plus the
//! idempotent bootstrap that materializes a record for a fresh identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::future::Future;
use uuid::Uuid;

use crate::{error::OnboardingError, gateway::Identity};

/// Account role stored on the profile record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileRole {
    User,
    Admin,
}

/// Profile document for one account.
///
/// Created once per identity by [`profile_ensure`], updated by login-stamp
/// merges, never deleted by this subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    /// Account id, mirroring [`Identity::id`].
    pub uid: Uuid,
    /// Email at creation time.
    pub email: String,
    /// Display name, if the user provided one.
    pub display_name: Option<String>,
    /// Account role; new records always start as [`ProfileRole::User`].
    pub role: ProfileRole,
    /// Confirmation flag mirrored from the identity at creation time.
    pub email_confirmed: bool,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the account last signed in.
    pub last_login_at: DateTime<Utc>,
    /// Free-form profile fields owned by the application.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ProfileRecord {
    /// Required-field policy consumed by the post-auth redirect: a record is
    /// complete once it carries a non-empty display name.
    pub fn is_complete(&self) -> bool {
        self.display_name
            .as_deref()
            .is_some_and(|name| !name.trim().is_empty())
    }
}

/// Document-store contract for profile records.
///
/// Implement this for your database. Operations are keyed by account id.
pub trait ProfileStore: Clone + Send + Sync + 'static {
    /// Error type for storage operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch the record for `id`, or `None` if absent.
    fn get(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<ProfileRecord>, Self::Error>> + Send;

    /// Write the record for `id`.
    ///
    /// With `merge: true` the write overlays the existing document
    /// (free-form fields are unioned); with `merge: false` it replaces the
    /// document wholesale.
    fn put(
        &self,
        id: Uuid,
        record: &ProfileRecord,
        merge: bool,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Idempotently materialize the initial profile record for an identity.
///
/// An existence check precedes creation, so re-entrant registration flows
/// and provider-side retries perform at most one write. Creation failure is
/// fatal to the calling flow and propagates.
pub async fn profile_ensure<P: ProfileStore>(
    store: &P,
    identity: &Identity,
    display_name: Option<&str>,
) -> Result<ProfileRecord, OnboardingError> {
    if let Some(existing) = store.get(identity.id).await.map_err(OnboardingError::store)? {
        tracing::debug!(uid = %identity.id, "profile already exists, skipping bootstrap");
        return Ok(existing);
    }

    let now = Utc::now();
    let record = ProfileRecord {
        uid: identity.id,
        email: identity.email.clone(),
        display_name: display_name
            .map(str::to_owned)
            .or_else(|| identity.display_name.clone()),
        role: ProfileRole::User,
        email_confirmed: identity.email_confirmed,
        created_at: now,
        last_login_at: now,
        fields: Map::new(),
    };

    store
        .put(identity.id, &record, false)
        .await
        .map_err(OnboardingError::store)?;

    tracing::debug!(uid = %identity.id, "profile record created");
    Ok(record)
}

/// Stamp `last_login_at` on an existing profile record.
///
/// Missing records are left alone; bootstrap is the only path that creates
/// them.
pub async fn profile_login_stamp<P: ProfileStore>(
    store: &P,
    id: Uuid,
) -> Result<(), OnboardingError> {
    let Some(mut record) = store.get(id).await.map_err(OnboardingError::store)? else {
        return Ok(());
    };

    record.last_login_at = Utc::now();
    store
        .put(id, &record, true)
        .await
        .map_err(OnboardingError::store)
}
