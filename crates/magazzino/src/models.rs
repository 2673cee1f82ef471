//! Data passed around the client pipeline.
//!
//! There are three wire formats to deal with:
//! - the event-stream frames pushed by the search endpoint,
//! - the plain-JSON progress payloads polled from the task endpoints,
//! - the conversation turns sent back to the server as query context.
//!
//! All of them are decoded into the typed structs here at the protocol
//! boundary; nothing downstream works on raw JSON.

pub mod events;
pub mod progress;
pub mod turn;
