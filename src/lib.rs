// Export modules for library usage
pub mod cli;
pub mod commands;
pub mod config;
pub mod descriptor;
pub mod errors;
pub mod graph;
pub mod io;
pub mod pipeline;
pub mod placement;
pub mod source;
pub mod version;

// Re-export commonly used types
pub use crate::config::{DepshiftConfig, EffectiveSettings, ModuleSettings};
pub use crate::errors::{DepshiftError, FileFailure};
pub use crate::graph::{Module, ModuleGraph, ModuleGraphBuilder, ModuleId, ModuleKind};
pub use crate::io::output::{create_writer, OutputFormat, OutputWriter};
pub use crate::pipeline::{run_pipeline, Outcome, OutcomeKind, RunOptions, RunSummary};
pub use crate::placement::{resolve_placement, PlacementDecision};
pub use crate::version::{classify, VerdictKind, VersionThresholds, VersionVerdict};
