//! Request middleware.
//!
//! Purpose: Define middleware components for request lifecycle concerns such
//! as tracing. Session, CSRF and identity middleware live with the HTTP
//! inbound adapter since they are coupled to its session layer.

pub mod trace;

pub use trace::Trace;
