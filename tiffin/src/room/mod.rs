//! Room registry: owns every live game behind one readers-writer lock.

pub mod registry;

pub use registry::{RoomError, RoomGuard, RoomHandle, RoomRegistry, RoomSummary};
