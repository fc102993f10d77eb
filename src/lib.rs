pub mod models;
pub mod services;

pub use models::config::AppConfig;
pub use models::locate::{MatchCandidate, MatchMode};
pub use services::config::ConfigManager;
pub use services::locator::IconLocator;
pub use services::pipeline::{AutomationPipeline, ItemOutcome, RunSummary};
