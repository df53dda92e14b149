//! Outbound adapters.
//!
//! Purpose: Implement the domain ports against external infrastructure.
//! PostgreSQL persistence is the only outbound surface of this service.

pub mod persistence;
