//! Domain types for the matching and relay core.
//!
//! Value objects validate at construction so the engine never has to
//! re-check identities, topics, or modes once an event has crossed the
//! protocol boundary.

mod error;
mod message;
mod values;

pub use error::DomainError;
pub use message::ChatMessage;
pub use values::{ConnectionId, Identity, Mode, RoomId, Topic};
