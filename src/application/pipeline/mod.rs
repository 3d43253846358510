pub mod engine;
pub mod launcher;
pub mod lifecycle;
pub mod processor;
pub mod traits;

pub use engine::{ChunkEngine, RunConfig};
pub use launcher::{CloseOutcome, PipelineLauncher, RunStatusView};
pub use lifecycle::JobLifecycleTracker;
pub use processor::TransferOrchestrator;
pub use traits::{DonationSource, DonationTransfer, ResultSink, RunTracker};
