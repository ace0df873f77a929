//! Postgres-backed profile store.
//!
//! Both upsert modes are a single `INSERT ... ON CONFLICT (id)` statement, so
//! two clients creating the same profile at once still leave exactly one row.
//! `KeepExisting` uses a no-op update so `RETURNING` yields the existing row.

use sqlx::PgPool;
use uuid::Uuid;

use super::{OnConflict, ProfileStore, StoreError};
use crate::state::Profile;

const SELECT_PROFILE: &str = r"SELECT id, full_name, email, phone, location, college, graduation_year,
              organizations, email_signature, companies_interested, roles_interested,
              avatar_url, bio, profile_completed, created_at, updated_at
       FROM profiles
       WHERE id = $1";

const UPSERT_KEEP_EXISTING: &str = r"INSERT INTO profiles (id, full_name, email, phone, location, college, graduation_year,
                             organizations, email_signature, companies_interested, roles_interested,
                             avatar_url, bio, profile_completed, created_at, updated_at)
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
       ON CONFLICT (id) DO UPDATE SET id = profiles.id
       RETURNING id, full_name, email, phone, location, college, graduation_year,
                 organizations, email_signature, companies_interested, roles_interested,
                 avatar_url, bio, profile_completed, created_at, updated_at";

const UPSERT_OVERWRITE: &str = r"INSERT INTO profiles (id, full_name, email, phone, location, college, graduation_year,
                             organizations, email_signature, companies_interested, roles_interested,
                             avatar_url, bio, profile_completed, created_at, updated_at)
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
       ON CONFLICT (id) DO UPDATE SET
           full_name = EXCLUDED.full_name,
           email = EXCLUDED.email,
           phone = EXCLUDED.phone,
           location = EXCLUDED.location,
           college = EXCLUDED.college,
           graduation_year = EXCLUDED.graduation_year,
           organizations = EXCLUDED.organizations,
           email_signature = EXCLUDED.email_signature,
           companies_interested = EXCLUDED.companies_interested,
           roles_interested = EXCLUDED.roles_interested,
           avatar_url = EXCLUDED.avatar_url,
           bio = EXCLUDED.bio,
           profile_completed = EXCLUDED.profile_completed,
           updated_at = EXCLUDED.updated_at
       RETURNING id, full_name, email, phone, location, college, graduation_year,
                 organizations, email_signature, companies_interested, roles_interested,
                 avatar_url, bio, profile_completed, created_at, updated_at";

#[derive(Clone)]
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ProfileStore for PgProfileStore {
    async fn select_profile(&self, id: Uuid) -> Result<Option<Profile>, StoreError> {
        let row = sqlx::query_as::<_, Profile>(SELECT_PROFILE)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn upsert_profile(&self, record: &Profile, on_conflict: OnConflict) -> Result<Profile, StoreError> {
        let sql = match on_conflict {
            OnConflict::KeepExisting => UPSERT_KEEP_EXISTING,
            OnConflict::Overwrite => UPSERT_OVERWRITE,
        };
        let row = sqlx::query_as::<_, Profile>(sql)
            .bind(record.id)
            .bind(&record.full_name)
            .bind(&record.email)
            .bind(&record.phone)
            .bind(&record.location)
            .bind(&record.college)
            .bind(record.graduation_year)
            .bind(&record.organizations)
            .bind(&record.email_signature)
            .bind(&record.companies_interested)
            .bind(&record.roles_interested)
            .bind(&record.avatar_url)
            .bind(&record.bio)
            .bind(record.profile_completed)
            .bind(record.created_at)
            .bind(record.updated_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }
}
