pub mod analysis;
pub mod errors;
pub mod export;
pub mod loader;
pub mod merger;
pub mod models;
pub mod period;
pub mod report;
pub mod session;
pub mod table;

pub use errors::{PipelineError, Result};
pub use models::{Category, Config};
pub use session::{AnalysisSession, DatasetStore};
