/// State management module
///
/// This module handles all workflow state, including:
/// - The batch controller that owns one session (session.rs)
/// - The folder file queue (queue.rs)
/// - The append-only result log (library.rs)
/// - Shared data structures (data.rs)
/// - Adjustment parameters (edit.rs)
/// - Session configuration (config.rs)

pub mod config;
pub mod data;
pub mod edit;
pub mod library;
pub mod queue;
pub mod session;

pub use config::SessionConfig;
pub use data::{MeasurementResult, Progress, SkippedFile};
pub use edit::AdjustmentSettings;
pub use library::ResultLog;
pub use queue::FileQueue;
pub use session::{BatchState, InputEvent, InteractionMode, MouseButton, PointerOutcome, Session};
