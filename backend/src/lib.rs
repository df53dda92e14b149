//! Snipboard backend library.
//!
//! A session-authenticated snippet service arranged hexagonally: `domain`
//! holds transport-agnostic types and ports, `inbound::http` adapts HTTP onto
//! them, `outbound::persistence` implements the ports against PostgreSQL and
//! `server` wires the middleware stack.

pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod server;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use middleware::Trace;
