pub mod analysis;
pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod progress;
pub mod report;

pub use api::{StashApi, StashClient};
pub use config::AppConfig;
pub use engine::{DuplicateMergeEngine, MarkerCleanupEngine, PrimaryFileFixEngine};
pub use error::Error;
pub use progress::{ProgressReporter, SilentReporter};
