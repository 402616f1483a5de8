//! Server state shared across handlers.

use std::sync::Arc;

use kokoro_shared::time::Clock;
use tokio::sync::Mutex;

use crate::engine::Engine;

/// Shared application state.
///
/// The engine sits behind a single mutex: every mutation of the waiting
/// pool, the room registry, and the pending-match records is serialized
/// through it, which is the correctness mechanism the relay depends on.
pub struct AppState {
    pub engine: Mutex<Engine>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            engine: Mutex::new(Engine::new()),
            clock,
        }
    }
}
