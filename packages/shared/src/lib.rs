//! Shared utilities for the Kokoro matching and relay server.
//!
//! Cross-cutting concerns only: logging setup and time handling. Domain
//! logic lives in the server package.

pub mod logger;
pub mod time;
