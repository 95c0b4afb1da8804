//! `DataPool` Core — value model, change events, and configuration merging.

pub mod config;
pub mod events;
pub mod types;

pub use events::{EventHandler, Mediator, NotificationPort};
pub use types::Value;
