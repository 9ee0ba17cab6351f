// src/pipeline/mod.rs

pub mod frame_context;
pub mod metrics;
pub mod orchestrator;

pub use frame_context::{FrameContext, TrackerContext};
pub use metrics::PipelineMetrics;
pub use orchestrator::PipelineOrchestrator;
