//! Project configuration and per-module settings.

mod core;
pub mod hierarchy;
mod loader;
pub mod settings;

pub use self::core::{
    DepshiftConfig, GenerationConfig, IgnoreConfig, InjectedEntry, ObsoleteEntry, OrderingRule,
    TrackedDependency,
};
pub use hierarchy::{
    fold_chain, load_module_layers, merge, ConfigurationConflict, HierarchicalResolver,
    ResolvedSettings,
};
pub use loader::{load_project_config, parse_and_validate_config, PROJECT_CONFIG_FILE};
pub use settings::{
    ArtifactNaming, EffectiveSettings, Flag, Indent, ModuleSettings, MODULE_SETTINGS_FILE,
};
