//! Anonymous peer-matching and chat relay server.
//!
//! Pairs waiting participants who share a topic and communication mode,
//! then relays text messages between the two members of the resulting
//! room in real time, over a WebSocket gateway and a polling HTTP
//! endpoint with the same matching semantics.

// layers
pub mod domain;
pub mod engine;
pub mod protocol;
pub mod ui;
