//! Wire protocol between player connections and the game service.
//!
//! Frames are JSON text. Inbound frames are decoded once into a closed
//! command enum; outbound payloads are serialized by the sync hub.

/// Protocol error types.
pub mod errors;

/// Inbound commands and outbound payloads.
pub mod messages;
