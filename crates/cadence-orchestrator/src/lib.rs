//! Daily orchestration: signal gathering, content adaptation, dispatch with
//! retries and fallback, and run bookkeeping against a [`Store`](cadence_core::Store).

pub mod engine;
pub mod error;
pub mod fallback;
pub mod package;
pub mod retry;
pub mod settings;
pub mod signals;
pub mod status;

pub use engine::{DailyRunRequest, Orchestrator, RunStats, RunSummary, ALREADY_EXECUTED};
pub use error::OrchestratorError;
pub use fallback::apply_fallback;
pub use package::{build_package, image_prompt, posting_time, AdaptationRules};
pub use settings::EngineSettings;
pub use signals::SignalAggregator;
pub use status::ExecutionStatus;
