//! Messaging layer for the event-driven ingestion strategy.

mod publisher;
mod subscriber;
mod types;

pub use publisher::{ImportRequestPublisher, LapinImportPublisher, NoopImportPublisher, PublishError};
pub use subscriber::{ImportedEventHandler, ImportedSubscriber};
pub use types::{ImportRequestedEvent, ImportedEvent};
