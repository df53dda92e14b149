//! PostgreSQL-backed `UserRepository` implementation.
//!
//! Owns the only code paths that touch stored hash material: plaintexts come
//! in through the port, are hashed or verified via the injected
//! [`CredentialHasher`], and neither plaintext nor hash ever leaves this
//! module or appears in logs.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::domain::ports::{UserRepository, UserStoreError};
use crate::domain::{CredentialHasher, User, UserId, VerifyOutcome};

use super::models::{NewUserRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed implementation of the `UserRepository` port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
    hasher: CredentialHasher,
}

impl DieselUserRepository {
    /// Create a repository over `pool`, hashing with `hasher`.
    pub fn new(pool: DbPool, hasher: CredentialHasher) -> Self {
        Self { pool, hasher }
    }

    async fn stored_hash(&self, id: &UserId) -> Result<String, UserStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        users::table
            .find(id.as_uuid())
            .select(users::hashed_password)
            .first::<String>(&mut conn)
            .await
            .map_err(|err| match err {
                diesel::result::Error::NotFound => UserStoreError::NoRecord,
                other => map_diesel_error(other),
            })
    }
}

fn map_pool_error(error: PoolError) -> UserStoreError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            UserStoreError::connection(message)
        }
    }
}

fn map_diesel_error(error: diesel::result::Error) -> UserStoreError {
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
            UserStoreError::connection("database connection error")
        }
        _ => UserStoreError::query("database error"),
    }
}

fn row_to_user(row: UserRow) -> User {
    User {
        id: UserId::from_uuid(row.id),
        name: row.name,
        email: row.email,
        created_at: row.created_at,
    }
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn insert(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<UserId, UserStoreError> {
        let hashed = self
            .hasher
            .hash(password)
            .map_err(|err| UserStoreError::hashing(err.to_string()))?;
        let row = NewUserRow {
            id: uuid::Uuid::new_v4(),
            name,
            email,
            hashed_password: &hashed,
        };

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(users::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map_err(|err| match err {
                diesel::result::Error::DatabaseError(
                    diesel::result::DatabaseErrorKind::UniqueViolation,
                    _,
                ) => UserStoreError::DuplicateEmail,
                other => map_diesel_error(other),
            })?;
        Ok(UserId::from_uuid(row.id))
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<UserId, UserStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let candidate = users::table
            .filter(users::email.eq(email))
            .select((users::id, users::hashed_password))
            .first::<(uuid::Uuid, String)>(&mut conn)
            .await
            .map_err(|err| match err {
                // Unknown email and wrong password are indistinguishable.
                diesel::result::Error::NotFound => UserStoreError::InvalidCredentials,
                other => map_diesel_error(other),
            })?;

        match self
            .hasher
            .verify(&candidate.1, password)
            .map_err(|err| UserStoreError::hashing(err.to_string()))?
        {
            VerifyOutcome::Verified => Ok(UserId::from_uuid(candidate.0)),
            VerifyOutcome::Mismatch => Err(UserStoreError::InvalidCredentials),
        }
    }

    async fn exists(&self, id: &UserId) -> Result<bool, UserStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::select(diesel::dsl::exists(
            users::table.filter(users::id.eq(id.as_uuid())),
        ))
        .get_result::<bool>(&mut conn)
        .await
        .map_err(map_diesel_error)
    }

    async fn get(&self, id: &UserId) -> Result<User, UserStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        users::table
            .find(id.as_uuid())
            .select(UserRow::as_select())
            .first::<UserRow>(&mut conn)
            .await
            .map(row_to_user)
            .map_err(|err| match err {
                diesel::result::Error::NotFound => UserStoreError::NoRecord,
                other => map_diesel_error(other),
            })
    }

    async fn is_correct_password(
        &self,
        id: &UserId,
        password: &str,
    ) -> Result<(), UserStoreError> {
        let stored = self.stored_hash(id).await?;
        match self
            .hasher
            .verify(&stored, password)
            .map_err(|err| UserStoreError::hashing(err.to_string()))?
        {
            VerifyOutcome::Verified => Ok(()),
            VerifyOutcome::Mismatch => Err(UserStoreError::InvalidCredentials),
        }
    }

    async fn change_password(
        &self,
        id: &UserId,
        new_password: &str,
    ) -> Result<(), UserStoreError> {
        let hashed = self
            .hasher
            .hash(new_password)
            .map_err(|err| UserStoreError::hashing(err.to_string()))?;

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(users::table.find(id.as_uuid()))
            .set(users::hashed_password.eq(&hashed))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if updated == 0 {
            return Err(UserStoreError::NoRecord);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Error mapping coverage; query paths are exercised against the
    //! in-memory port implementation in the integration suite.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(
        PoolError::checkout("timed out"),
        UserStoreError::connection("timed out")
    )]
    #[case(PoolError::build("bad url"), UserStoreError::connection("bad url"))]
    fn pool_errors_are_connection_failures(
        #[case] input: PoolError,
        #[case] expected: UserStoreError,
    ) {
        assert_eq!(map_pool_error(input), expected);
    }

    #[test]
    fn not_found_is_a_query_failure_by_default() {
        let mapped = map_diesel_error(diesel::result::Error::NotFound);
        assert!(matches!(mapped, UserStoreError::Query { .. }));
    }
}
