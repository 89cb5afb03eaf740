//! HTTP middleware stack: CORS, `OPTIONS` short-circuit and per-request tracing.

pub mod cors;
pub mod trace;
