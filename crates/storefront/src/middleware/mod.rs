//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span with method, uri, status, latency)
//! 3. Request ID (validated or generated, recorded on the span)
//! 4. Session layer (tower-sessions, in-memory store)

pub mod request_id;
pub mod session;

pub use request_id::{RequestId, request_id_middleware};
pub use session::create_session_layer;
