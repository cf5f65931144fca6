//! CLI command implementations.
//!
//! - **run**: scan, decide and mutate a project
//! - **init**: write a starter `depshift.toml`

pub mod init;
pub mod run;

pub use init::init_config;
pub use run::{run_project, RunConfig};
