//! Inbound adapters.
//!
//! Purpose: Translate transport-level requests into domain operations. The
//! HTTP adapter is the only inbound surface of this service.

pub mod http;
