//! HTTP server and embedded web client
//!
//! Serves the token endpoint plus the browser-side negotiator page.

pub mod embedded_assets;
pub mod http_server;
pub mod shared;

pub use http_server::{build_router, run_http_server};
pub use shared::SharedState;
