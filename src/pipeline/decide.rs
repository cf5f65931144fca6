//! Decide pass: turn frozen facts into per-module outcomes.
//!
//! Runs only on a [`FactStore`], so it can never observe a partially scanned
//! project. Modules are independent and are decided in parallel.

use super::accumulator::{DescriptorFacts, FactStore, ModuleFacts};
use super::marker::marker_text;
use super::outcome::{Action, Anchor, ModuleDecision, Outcome, PlannedOutcome};
use crate::config::{DepshiftConfig, EffectiveSettings, OrderingRule, ResolvedSettings};
use crate::descriptor::{Coordinate, Section};
use crate::graph::{ModuleGraph, ModuleId};
use crate::placement::{render_artifact, resolve_placement};
use crate::version::{classify, is_symbolic, referenced_properties, resolve_placeholders, VersionVerdict};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use tracing::trace;

pub struct DecideContext<'a> {
    pub graph: &'a ModuleGraph,
    pub facts: &'a FactStore,
    pub settings: &'a ResolvedSettings,
    pub config: &'a DepshiftConfig,
}

/// Whether a rule gated on a tracked dependency may run in a module.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Gate {
    Open,
    /// The dependency is present but its version forbids edits.
    Closed(String),
    /// The dependency is not used by the module; the rule does not apply.
    NotApplicable,
}

/// Decisions for every module with verdicts or outcomes, parents first.
pub fn decide_all(ctx: &DecideContext<'_>) -> Vec<ModuleDecision> {
    ctx.graph
        .top_down()
        .into_par_iter()
        .map(|id| decide_module(ctx, id))
        .filter(|d| !d.verdicts.is_empty() || !d.outcomes.is_empty())
        .collect()
}

pub fn decide_module(ctx: &DecideContext<'_>, id: ModuleId) -> ModuleDecision {
    let settings = ctx.settings.get(id);
    let verdicts = module_verdicts(ctx, id);
    let mut outcomes = Vec::new();

    if let Some(facts) = ctx.facts.module(id) {
        if facts.descriptor.as_ref().is_some_and(DescriptorFacts::is_editable) {
            ordering_outcomes(ctx, id, facts, &verdicts, &mut outcomes);
            if settings.remove_obsolete {
                obsolete_outcomes(ctx, facts, &verdicts, &mut outcomes);
            }
            inject_outcomes(ctx, id, facts, &verdicts, &mut outcomes);
        }
        if settings.generate {
            generate_outcome(ctx, id, facts, &settings, &verdicts, &mut outcomes);
        }
    }

    if settings.opt_out {
        for planned in &mut outcomes {
            if planned.outcome.touches_file() {
                planned.outcome = Outcome::skip("opt_out is set for this module or an ancestor");
            }
        }
    }

    let module = ctx.graph.get(id).display_path();
    trace!("Module {}: {} outcome(s)", module, outcomes.len());
    ModuleDecision {
        module,
        verdicts,
        outcomes,
    }
}

/// Verdict of every tracked dependency the module or its ancestors declare.
fn module_verdicts(ctx: &DecideContext<'_>, id: ModuleId) -> BTreeMap<String, VersionVerdict> {
    let properties = effective_properties(ctx, id);
    ctx.config
        .tracked
        .iter()
        .filter_map(|tracked| {
            let raw = declared_version(ctx, id, &tracked.coordinate)?;
            let resolved = raw.map(|r| resolve_placeholders(&r, &properties));
            Some((
                tracked.name.clone(),
                classify(resolved.as_deref(), &tracked.thresholds()),
            ))
        })
        .collect()
}

/// Properties visible to a module: ancestors first, the module's own last.
fn effective_properties(ctx: &DecideContext<'_>, id: ModuleId) -> BTreeMap<String, String> {
    let chain = ctx.graph.ancestors(id);
    let mut properties = BTreeMap::new();
    for &ancestor in chain.iter().rev() {
        if let Some(d) = ctx.facts.descriptor(ancestor) {
            properties.extend(d.properties.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
    }
    // Profile properties only fill names the descriptors leave undefined,
    // nearest module first.
    for &ancestor in &chain {
        let Some(facts) = ctx.facts.module(ancestor) else {
            continue;
        };
        for scoped in facts.profiles.values() {
            for (name, value) in &scoped.properties {
                properties.entry(name.clone()).or_insert_with(|| value.clone());
            }
        }
    }
    properties
}

/// The version declared for `coordinate`, searching the module then its
/// ancestors. `None` when nothing in the chain mentions the coordinate;
/// `Some(None)` when it is mentioned without a version.
fn declared_version(ctx: &DecideContext<'_>, id: ModuleId, coordinate: &Coordinate) -> Option<Option<String>> {
    let mut mentioned = false;
    for ancestor in ctx.graph.ancestors(id) {
        let Some(facts) = ctx.facts.module(ancestor) else {
            continue;
        };
        let scopes = facts.descriptor.iter().chain(facts.profiles.values());
        for scope in scopes {
            for section in [Section::Dependencies, Section::DependencyManagement] {
                if let Some(dep) = scope.find(section, coordinate) {
                    if dep.version.is_some() {
                        return Some(dep.version.clone());
                    }
                    mentioned = true;
                }
            }
        }
        if let Some(parent) = facts
            .descriptor
            .as_ref()
            .and_then(|d| d.parent.as_ref())
            .filter(|p| &p.coordinate == coordinate)
        {
            if parent.version.is_some() {
                return Some(parent.version.clone());
            }
            mentioned = true;
        }
    }
    mentioned.then_some(None)
}

fn gate(ctx: &DecideContext<'_>, name: Option<&str>, verdicts: &BTreeMap<String, VersionVerdict>) -> Gate {
    let Some(name) = name else {
        return Gate::Open;
    };
    match (verdicts.get(name), ctx.config.tracked(name)) {
        (Some(verdict), _) if verdict.is_actionable() => Gate::Open,
        (Some(verdict), Some(tracked)) => Gate::Closed(format!(
            "{} version {}; automatic edits need {} >= {}",
            name,
            verdict.describe(),
            name,
            tracked.upper
        )),
        _ => Gate::NotApplicable,
    }
}

fn scope_label(profile: Option<&str>) -> String {
    match profile {
        Some(id) => format!("profile '{}' dependencyManagement", id),
        None => "dependencyManagement".to_string(),
    }
}

fn scopes(facts: &ModuleFacts) -> impl Iterator<Item = (Option<&str>, &DescriptorFacts)> {
    facts
        .descriptor
        .iter()
        .map(|d| (None, d))
        .chain(facts.profiles.iter().map(|(id, d)| (Some(id.as_str()), d)))
}

fn ordering_outcomes(
    ctx: &DecideContext<'_>,
    id: ModuleId,
    facts: &ModuleFacts,
    verdicts: &BTreeMap<String, VersionVerdict>,
    outcomes: &mut Vec<PlannedOutcome>,
) {
    let parent = facts.descriptor.as_ref().and_then(|d| d.parent.as_ref());
    for rule in &ctx.config.ordering {
        if let (Some(superseding), Some(parent)) = (&rule.superseding_parent, parent) {
            if &parent.coordinate == superseding {
                trace!("{}: ordering handled by parent {}", ctx.graph.get(id).display_path(), superseding);
                continue;
            }
        }
        for (profile, scope) in scopes(facts) {
            let Some(outcome) = ordering_outcome(ctx, rule, profile, scope, verdicts) else {
                continue;
            };
            if already_marked(facts, &outcome) {
                trace!("{}: review marker already present", scope.path.display());
                continue;
            }
            outcomes.push(PlannedOutcome {
                file: scope.path.clone(),
                topic: format!("ordering {} before {} in {}", rule.first, rule.second, scope_label(profile)),
                outcome,
            });
        }
    }
}

/// True for a Mark whose comment a previous run already left in the file.
fn already_marked(facts: &ModuleFacts, outcome: &Outcome) -> bool {
    match (outcome, facts.descriptor.as_ref()) {
        (Outcome::Mark { text, .. }, Some(descriptor)) => descriptor.markers.contains(text),
        _ => false,
    }
}

fn ordering_outcome(
    ctx: &DecideContext<'_>,
    rule: &OrderingRule,
    profile: Option<&str>,
    scope: &DescriptorFacts,
    verdicts: &BTreeMap<String, VersionVerdict>,
) -> Option<Outcome> {
    let first = scope.find(Section::DependencyManagement, &rule.first)?;
    let second = scope.find(Section::DependencyManagement, &rule.second)?;
    if first.ordinal < second.ordinal {
        return None;
    }

    match gate(ctx, rule.gate.as_deref(), verdicts) {
        Gate::NotApplicable => return None,
        Gate::Closed(reason) => return Some(Outcome::skip(reason)),
        Gate::Open => {}
    }

    match second.version.as_deref().filter(|v| is_symbolic(v)) {
        Some(raw) => Some(Outcome::Mark {
            text: marker_text(
                &format!("ordering {} must precede {}", rule.first, rule.second),
                &format!(
                    "in {} {} is at position {} and {} at position {}; {} version {} is unresolved, move {} above {} by hand once it is confirmed",
                    scope_label(profile),
                    rule.first,
                    first.ordinal,
                    rule.second,
                    second.ordinal,
                    rule.second,
                    raw,
                    rule.first,
                    rule.second
                ),
            ),
            anchor: Anchor {
                profile: profile.map(str::to_string),
                coordinate: rule.second.clone(),
            },
        }),
        None => Some(Outcome::Apply(Action::Reorder {
            profile: profile.map(str::to_string),
            first: rule.first.clone(),
            second: rule.second.clone(),
        })),
    }
}

fn obsolete_outcomes(
    ctx: &DecideContext<'_>,
    facts: &ModuleFacts,
    verdicts: &BTreeMap<String, VersionVerdict>,
    outcomes: &mut Vec<PlannedOutcome>,
) {
    struct Removal<'f> {
        profile: Option<&'f str>,
        coordinate: &'f Coordinate,
        references: Vec<String>,
        path: PathBuf,
    }

    let mut removals = Vec::new();
    for rule in &ctx.config.obsolete {
        for (profile, scope) in scopes(facts) {
            let Some(entry) = scope.find(Section::DependencyManagement, &rule.coordinate) else {
                continue;
            };
            let topic = format!("remove {} from {}", rule.coordinate, scope_label(profile));
            match gate(ctx, rule.gate.as_deref(), verdicts) {
                Gate::NotApplicable => {}
                Gate::Closed(reason) => outcomes.push(PlannedOutcome {
                    file: scope.path.clone(),
                    topic,
                    outcome: Outcome::skip(reason),
                }),
                Gate::Open => removals.push((
                    topic,
                    Removal {
                        profile,
                        coordinate: &rule.coordinate,
                        references: entry
                            .version
                            .as_deref()
                            .map(referenced_properties)
                            .unwrap_or_default(),
                        path: scope.path.clone(),
                    },
                )),
            }
        }
    }

    // A property defined in this descriptor goes too when every one of its
    // references is being removed.
    let Some(descriptor) = facts.descriptor.as_ref() else {
        return;
    };
    let mut removed_refs: BTreeMap<&str, usize> = BTreeMap::new();
    for (_, removal) in &removals {
        for name in &removal.references {
            *removed_refs.entry(name.as_str()).or_insert(0) += 1;
        }
    }
    let mut claimed: BTreeSet<String> = BTreeSet::new();

    for (topic, removal) in &removals {
        let unused_properties = removal
            .references
            .iter()
            .filter(|name| {
                descriptor.properties.contains_key(name.as_str())
                    && descriptor.property_usage.get(name.as_str()) == removed_refs.get(name.as_str())
            })
            .filter(|name| claimed.insert((*name).clone()))
            .cloned()
            .collect();
        outcomes.push(PlannedOutcome {
            file: removal.path.clone(),
            topic: topic.clone(),
            outcome: Outcome::Apply(Action::RemoveManaged {
                profile: removal.profile.map(str::to_string),
                coordinate: removal.coordinate.clone(),
                unused_properties,
            }),
        });
    }
}

fn inject_outcomes(
    ctx: &DecideContext<'_>,
    id: ModuleId,
    facts: &ModuleFacts,
    verdicts: &BTreeMap<String, VersionVerdict>,
    outcomes: &mut Vec<PlannedOutcome>,
) {
    let Some(descriptor) = facts.descriptor.as_ref() else {
        return;
    };
    let ancestors = ctx.graph.ancestors(id);

    for entry in &ctx.config.inject {
        let targeted = match &entry.when_present {
            // The topmost module declaring the dependency owns the entry.
            Some(trigger) => {
                declares(facts, trigger)
                    && !ancestors[1..]
                        .iter()
                        .filter_map(|a| ctx.facts.module(*a))
                        .any(|f| declares(f, trigger))
            }
            None => ctx.graph.get(id).is_root(),
        };
        if !targeted {
            continue;
        }

        let already_managed = ancestors
            .iter()
            .filter_map(|a| ctx.facts.module(*a))
            .any(|f| scopes(f).any(|(_, s)| s.find(Section::DependencyManagement, &entry.coordinate).is_some()));
        if already_managed {
            continue;
        }

        let topic = format!("inject {} into dependencyManagement", entry.coordinate);
        let outcome = match gate(ctx, entry.gate.as_deref(), verdicts) {
            Gate::NotApplicable => continue,
            Gate::Closed(reason) => Outcome::skip(reason),
            Gate::Open => Outcome::Apply(Action::InjectManaged {
                entry: entry.clone(),
                before: insertion_anchor(ctx, descriptor, &entry.coordinate),
            }),
        };
        outcomes.push(PlannedOutcome {
            file: descriptor.path.clone(),
            topic,
            outcome,
        });
    }
}

fn declares(facts: &ModuleFacts, coordinate: &Coordinate) -> bool {
    scopes(facts).any(|(_, s)| s.declares(coordinate))
}

/// An existing entry the injected one must precede, per the ordering rules.
fn insertion_anchor(ctx: &DecideContext<'_>, descriptor: &DescriptorFacts, coordinate: &Coordinate) -> Option<Coordinate> {
    ctx.config
        .ordering
        .iter()
        .filter(|rule| &rule.first == coordinate)
        .filter_map(|rule| descriptor.find(Section::DependencyManagement, &rule.second))
        .min_by_key(|d| d.ordinal)
        .map(|d| d.coordinate.clone())
}

fn generate_outcome(
    ctx: &DecideContext<'_>,
    id: ModuleId,
    facts: &ModuleFacts,
    settings: &EffectiveSettings,
    verdicts: &BTreeMap<String, VersionVerdict>,
    outcomes: &mut Vec<PlannedOutcome>,
) {
    if !ctx.graph.is_placement_target(id) {
        return;
    }
    if facts.main_sources().any(|(_, s)| s.has_marker) {
        return;
    }

    let module = ctx.graph.get(id);
    let generation = &ctx.config.generation;
    let namespaces = facts
        .main_sources()
        .filter(|(_, s)| !s.declarations.is_empty())
        .filter_map(|(_, s)| s.package.as_deref());
    let Some(placement) = resolve_placement(namespaces, &module.name, settings, generation) else {
        return;
    };

    let module_dir = ctx.graph.module_dir(id);
    let Some(code_root) = module
        .main_roots
        .iter()
        .map(|root| module_dir.join(root))
        .find(|root| module.main_sources.iter().any(|s| s.starts_with(root)))
    else {
        return;
    };
    let file = code_root.join(placement.relative_path());
    let topic = format!("generate {}", placement.qualified_name());

    let outcome = match gate(ctx, generation.gate.as_deref(), verdicts) {
        Gate::NotApplicable => return,
        Gate::Closed(reason) => Outcome::skip(reason),
        Gate::Open if file.exists() => Outcome::skip(format!(
            "{} already exists without the @{} marker; add the marker or move the file",
            file.display(),
            crate::source::simple_name(&generation.marker_annotation)
        )),
        Gate::Open => Outcome::Apply(Action::Generate {
            content: render_artifact(&placement, settings, generation),
            placement,
        }),
    };
    outcomes.push(PlannedOutcome {
        file,
        topic,
        outcome,
    });
}
