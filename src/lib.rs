// src/lib.rs
// Library surface shared by the binaries and the integration tests.

pub mod band;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod model;
mod persist;
pub mod publish;
pub mod settings;
pub mod validate;

// Presentation
pub mod gauge;
pub mod i18n;
pub mod surface;
pub mod tray;

// Runtime wiring
pub mod api;
pub mod context;
pub mod logging;
pub mod metrics;
pub mod scheduler;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::client::{SentimentClient, SnapshotSource};
pub use crate::context::{AppContext, RefreshOutcome};
pub use crate::error::{FetchError, SettingsError, StorageError};
pub use crate::model::{AssetClass, Language, Reading, SentimentSnapshot, Settings};
pub use crate::publish::{PublishChannel, PushEvent, Subscription};
