//! PostgreSQL-backed `SnippetRepository` implementation.
//!
//! Expiry is enforced in the queries: expired rows are filtered out rather
//! than deleted, so a snippet past its `expires_at` reads as missing.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::domain::ports::{SnippetRepository, SnippetStoreError};
use crate::domain::{Snippet, SnippetDraft, SnippetId};

use super::models::{NewSnippetRow, SnippetRow};
use super::pool::{DbPool, PoolError};
use super::schema::snippets;

const LATEST_LIMIT: i64 = 10;

/// Diesel-backed implementation of the `SnippetRepository` port.
#[derive(Clone)]
pub struct DieselSnippetRepository {
    pool: DbPool,
}

impl DieselSnippetRepository {
    /// Create a repository over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> SnippetStoreError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            SnippetStoreError::connection(message)
        }
    }
}

fn map_diesel_error(error: diesel::result::Error) -> SnippetStoreError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            SnippetStoreError::connection("database connection error")
        }
        _ => SnippetStoreError::query("database error"),
    }
}

fn row_to_snippet(row: SnippetRow) -> Snippet {
    Snippet {
        id: SnippetId::from_uuid(row.id),
        title: row.title,
        content: row.content,
        created_at: row.created_at,
        expires_at: row.expires_at,
    }
}

#[async_trait]
impl SnippetRepository for DieselSnippetRepository {
    async fn latest(&self) -> Result<Vec<Snippet>, SnippetStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = snippets::table
            .filter(snippets::expires_at.gt(Utc::now()))
            .order(snippets::created_at.desc())
            .limit(LATEST_LIMIT)
            .select(SnippetRow::as_select())
            .load::<SnippetRow>(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(row_to_snippet).collect())
    }

    async fn get(&self, id: &SnippetId) -> Result<Snippet, SnippetStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        snippets::table
            .find(id.as_uuid())
            .filter(snippets::expires_at.gt(Utc::now()))
            .select(SnippetRow::as_select())
            .first::<SnippetRow>(&mut conn)
            .await
            .map(row_to_snippet)
            .map_err(|err| match err {
                diesel::result::Error::NotFound => SnippetStoreError::NoRecord,
                other => map_diesel_error(other),
            })
    }

    async fn insert(&self, draft: &SnippetDraft) -> Result<SnippetId, SnippetStoreError> {
        let row = NewSnippetRow {
            id: uuid::Uuid::new_v4(),
            title: &draft.title,
            content: &draft.content,
            expires_at: Utc::now() + Duration::days(i64::from(draft.expires_days)),
        };

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(snippets::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(SnippetId::from_uuid(row.id))
    }
}
