//! Diesel table definitions for the PostgreSQL schema.
//!
//! Must match the database migrations exactly; regenerate with
//! `diesel print-schema` when the schema changes.

diesel::table! {
    /// Registered user accounts.
    users (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Display name chosen at signup.
        name -> Varchar,
        /// Unique email address (case-sensitive unique index).
        email -> Varchar,
        /// PHC-formatted password hash.
        hashed_password -> Varchar,
        /// Record creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Stored snippets.
    snippets (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Snippet title (max 100 characters).
        title -> Varchar,
        /// Snippet body.
        content -> Text,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Expiry timestamp; rows past this moment are treated as gone.
        expires_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(users, snippets);
