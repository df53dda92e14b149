//! In-memory port implementations for tests.
//!
//! Compiled for unit tests and, via the `test-support` feature, for the
//! integration suites in `tests/`. Both repositories honour the full port
//! contracts, including real credential hashing, so tests exercise the same
//! code paths as the PostgreSQL adapters minus the database.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::domain::ports::{SnippetRepository, SnippetStoreError, UserRepository, UserStoreError};
use crate::domain::{
    CredentialHasher, Snippet, SnippetDraft, SnippetId, User, UserId, VerifyOutcome,
};

struct StoredUser {
    id: UserId,
    name: String,
    email: String,
    hashed_password: String,
    created_at: chrono::DateTime<Utc>,
}

/// Mutex-protected user store with real Argon2 hashing.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<Vec<StoredUser>>,
    hasher: CredentialHasher,
}

impl InMemoryUserRepository {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an account directly, bypassing validation.
    ///
    /// # Panics
    /// Panics on hashing failure; acceptable in test fixtures.
    pub async fn seed_user(&self, name: &str, email: &str, password: &str) -> UserId {
        self.insert(name, email, password)
            .await
            .expect("seeding a fixture user succeeds")
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
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
        let mut users = self.users.lock().expect("user store lock poisoned");
        if users.iter().any(|user| user.email == email) {
            return Err(UserStoreError::DuplicateEmail);
        }
        let id = UserId::random();
        users.push(StoredUser {
            id,
            name: name.to_owned(),
            email: email.to_owned(),
            hashed_password: hashed,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<UserId, UserStoreError> {
        let stored = {
            let users = self.users.lock().expect("user store lock poisoned");
            users
                .iter()
                .find(|user| user.email == email)
                .map(|user| (user.id, user.hashed_password.clone()))
        };
        let Some((id, hashed)) = stored else {
            return Err(UserStoreError::InvalidCredentials);
        };
        match self
            .hasher
            .verify(&hashed, password)
            .map_err(|err| UserStoreError::hashing(err.to_string()))?
        {
            VerifyOutcome::Verified => Ok(id),
            VerifyOutcome::Mismatch => Err(UserStoreError::InvalidCredentials),
        }
    }

    async fn exists(&self, id: &UserId) -> Result<bool, UserStoreError> {
        let users = self.users.lock().expect("user store lock poisoned");
        Ok(users.iter().any(|user| user.id == *id))
    }

    async fn get(&self, id: &UserId) -> Result<User, UserStoreError> {
        let users = self.users.lock().expect("user store lock poisoned");
        users
            .iter()
            .find(|user| user.id == *id)
            .map(|user| User {
                id: user.id,
                name: user.name.clone(),
                email: user.email.clone(),
                created_at: user.created_at,
            })
            .ok_or(UserStoreError::NoRecord)
    }

    async fn is_correct_password(
        &self,
        id: &UserId,
        password: &str,
    ) -> Result<(), UserStoreError> {
        let stored = {
            let users = self.users.lock().expect("user store lock poisoned");
            users
                .iter()
                .find(|user| user.id == *id)
                .map(|user| user.hashed_password.clone())
        };
        let Some(hashed) = stored else {
            return Err(UserStoreError::NoRecord);
        };
        match self
            .hasher
            .verify(&hashed, password)
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
        let mut users = self.users.lock().expect("user store lock poisoned");
        match users.iter_mut().find(|user| user.id == *id) {
            Some(user) => {
                user.hashed_password = hashed;
                Ok(())
            }
            None => Err(UserStoreError::NoRecord),
        }
    }
}

/// Mutex-protected snippet store.
#[derive(Default)]
pub struct InMemorySnippetRepository {
    snippets: Mutex<Vec<Snippet>>,
}

impl InMemorySnippetRepository {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a snippet directly.
    ///
    /// # Panics
    /// Panics on insertion failure; acceptable in test fixtures.
    pub async fn seed_snippet(&self, title: &str, content: &str, expires_days: u32) -> SnippetId {
        self.insert(&SnippetDraft {
            title: title.to_owned(),
            content: content.to_owned(),
            expires_days,
        })
        .await
        .expect("seeding a fixture snippet succeeds")
    }
}

#[async_trait]
impl SnippetRepository for InMemorySnippetRepository {
    async fn latest(&self) -> Result<Vec<Snippet>, SnippetStoreError> {
        let snippets = self.snippets.lock().expect("snippet store lock poisoned");
        let now = Utc::now();
        // Insertion order stands in for creation time; newest first.
        Ok(snippets
            .iter()
            .rev()
            .filter(|snippet| snippet.expires_at > now)
            .take(10)
            .cloned()
            .collect())
    }

    async fn get(&self, id: &SnippetId) -> Result<Snippet, SnippetStoreError> {
        let snippets = self.snippets.lock().expect("snippet store lock poisoned");
        snippets
            .iter()
            .find(|snippet| snippet.id == *id && snippet.expires_at > Utc::now())
            .cloned()
            .ok_or(SnippetStoreError::NoRecord)
    }

    async fn insert(&self, draft: &SnippetDraft) -> Result<SnippetId, SnippetStoreError> {
        let id = SnippetId::random();
        let now = Utc::now();
        let mut snippets = self.snippets.lock().expect("snippet store lock poisoned");
        snippets.push(Snippet {
            id,
            title: draft.title.clone(),
            content: draft.content.clone(),
            created_at: now,
            expires_at: now + Duration::days(i64::from(draft.expires_days)),
        });
        Ok(id)
    }
}
