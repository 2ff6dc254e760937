//! Sync hub fanning sanitized room state out to live connections.
//!
//! ## Architecture
//!
//! One [`HubActor`] runs per process in its own Tokio task and owns every
//! [`Connection`]. Everything else talks to it through a cloneable
//! [`HubHandle`]. Each connection has a bounded outbound queue drained by its
//! writer task; a connection whose queue is full is dropped.
//!
//! ## Example
//!
//! ```ignore
//! use tiffin::hub::{HubActor, HubConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let hub = HubActor::spawn(&HubConfig::default());
//!     let (outbound, mut frames) = hub.outbound_channel();
//!     // hub.register(Connection { .. }).await;
//! }
//! ```

pub mod actor;
pub mod config;
pub mod messages;

pub use actor::{HubActor, HubError, HubHandle};
pub use config::HubConfig;
pub use messages::{Connection, ConnectionId, HubMessage};
