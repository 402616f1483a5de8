//! Connection-facing layer: HTTP endpoints, the WebSocket relay
//! gateway, router assembly, and graceful shutdown.

mod handler;
mod runner;
mod signal;
mod state;

pub use runner::{build_router, run_server};
pub use state::AppState;
