//! Hierarchical settings resolution.
//!
//! Effective settings are a fold over the ancestor chain, root first:
//! flags merge with `||` (sticky-true), choices take the closest explicit
//! value. Each module is resolved once, top-down, reusing its parent's result.

use super::settings::{ArtifactNaming, EffectiveSettings, Indent, ModuleSettings};
use crate::graph::{ModuleGraph, ModuleId};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Display;
use tracing::info;

/// Merge one layer onto the settings inherited from above.
pub fn merge(inherited: EffectiveSettings, layer: &ModuleSettings) -> EffectiveSettings {
    EffectiveSettings {
        opt_out: inherited.opt_out || layer.opt_out.unwrap_or(false),
        generate: inherited.generate || layer.generate.unwrap_or(false),
        remove_obsolete: inherited.remove_obsolete || layer.remove_obsolete.unwrap_or(false),
        artifact_naming: layer.artifact_naming.unwrap_or(inherited.artifact_naming),
        indent: layer.indent.unwrap_or(inherited.indent),
    }
}

/// Resolve a chain given root first, on top of the process defaults.
pub fn fold_chain<'a, I>(defaults: &ModuleSettings, chain: I) -> EffectiveSettings
where
    I: IntoIterator<Item = &'a ModuleSettings>,
{
    chain
        .into_iter()
        .fold(merge(EffectiveSettings::default(), defaults), merge)
}

/// A module's explicit choice differs from one made by an ancestor. The
/// module's own value wins; this is informational only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigurationConflict {
    pub module: ModuleId,
    pub ancestor: ModuleId,
    pub key: &'static str,
    pub ancestor_value: String,
    pub module_value: String,
}

#[derive(Debug, Clone, Default)]
pub struct ResolvedSettings {
    by_module: HashMap<ModuleId, EffectiveSettings>,
    base: EffectiveSettings,
    pub conflicts: Vec<ConfigurationConflict>,
}

impl ResolvedSettings {
    /// Effective settings of `id`; process defaults for unknown modules.
    pub fn get(&self, id: ModuleId) -> EffectiveSettings {
        self.by_module.get(&id).copied().unwrap_or(self.base)
    }

    pub fn len(&self) -> usize {
        self.by_module.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_module.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct ExplicitChoices {
    artifact_naming: Option<(ModuleId, ArtifactNaming)>,
    indent: Option<(ModuleId, Indent)>,
}

pub struct HierarchicalResolver<'g> {
    graph: &'g ModuleGraph,
    defaults: ModuleSettings,
}

impl<'g> HierarchicalResolver<'g> {
    pub fn new(graph: &'g ModuleGraph, defaults: ModuleSettings) -> Self {
        Self { graph, defaults }
    }

    pub fn resolve_all(&self, layers: &HashMap<ModuleId, ModuleSettings>) -> ResolvedSettings {
        let empty = ModuleSettings::default();
        let base = merge(EffectiveSettings::default(), &self.defaults);
        let mut by_module = HashMap::with_capacity(self.graph.len());
        let mut explicit: HashMap<ModuleId, ExplicitChoices> = HashMap::new();
        let mut conflicts = Vec::new();

        for id in self.graph.top_down() {
            let parent = self.graph.get(id).parent;
            let inherited = parent.and_then(|p| by_module.get(&p).copied()).unwrap_or(base);
            let inherited_choices = parent
                .and_then(|p| explicit.get(&p).copied())
                .unwrap_or_default();
            let layer = layers.get(&id).unwrap_or(&empty);

            let choices = ExplicitChoices {
                artifact_naming: choose(
                    id,
                    "artifact_naming",
                    inherited_choices.artifact_naming,
                    layer.artifact_naming,
                    &mut conflicts,
                ),
                indent: choose(id, "indent", inherited_choices.indent, layer.indent, &mut conflicts),
            };

            by_module.insert(id, merge(inherited, layer));
            explicit.insert(id, choices);
        }

        ResolvedSettings {
            by_module,
            base,
            conflicts,
        }
    }
}

fn choose<T: Copy + PartialEq + Display>(
    module: ModuleId,
    key: &'static str,
    inherited: Option<(ModuleId, T)>,
    own: Option<T>,
    conflicts: &mut Vec<ConfigurationConflict>,
) -> Option<(ModuleId, T)> {
    match (inherited, own) {
        (Some((ancestor, theirs)), Some(mine)) if theirs != mine => {
            info!(
                "Module {} sets {} = {}, overriding {} from ancestor {}",
                module, key, mine, theirs, ancestor
            );
            conflicts.push(ConfigurationConflict {
                module,
                ancestor,
                key,
                ancestor_value: theirs.to_string(),
                module_value: mine.to_string(),
            });
            Some((module, mine))
        }
        (_, Some(mine)) => Some((module, mine)),
        (inherited, None) => inherited,
    }
}

/// Read every module's `.depshift.toml`.
pub fn load_module_layers(graph: &ModuleGraph) -> HashMap<ModuleId, ModuleSettings> {
    graph
        .modules()
        .filter_map(|m| ModuleSettings::load(&graph.module_dir(m.id)).map(|s| (m.id, s)))
        .collect()
}
