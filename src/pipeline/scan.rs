//! Scan pass: read every descriptor and Java file once, in parallel.

use super::accumulator::{
    Accumulator, DependencyFact, DescriptorFacts, FactKey, Facts, ParentFact, SourceFacts,
};
use super::marker::existing_markers;
use crate::config::GenerationConfig;
use crate::descriptor::{
    DependencySection, DescriptorKind, DescriptorRef, GradleScript, PomDocument, Section,
};
use crate::errors::FileFailure;
use crate::graph::{ModuleGraph, ModuleId};
use crate::placement::has_marker;
use crate::source::JavaSource;
use crate::version::referenced_properties;
use anyhow::Context;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Default)]
pub struct ScanReport {
    pub files_scanned: usize,
    pub failures: Vec<FileFailure>,
}

enum ScanJob<'g> {
    Descriptor {
        module: ModuleId,
        descriptor: &'g DescriptorRef,
    },
    Source {
        module: ModuleId,
        path: &'g Path,
        test: bool,
    },
}

/// Scan every file of the graph into `acc`. Returns once all files are done.
pub fn scan_project(
    graph: &ModuleGraph,
    generation: &GenerationConfig,
    acc: &Accumulator,
) -> ScanReport {
    let jobs: Vec<ScanJob<'_>> = graph
        .modules()
        .flat_map(|m| {
            let descriptor = m.descriptor.as_ref().map(|descriptor| ScanJob::Descriptor {
                module: m.id,
                descriptor,
            });
            let main = m.main_sources.iter().map(move |path| ScanJob::Source {
                module: m.id,
                path,
                test: false,
            });
            let test = m.test_sources.iter().map(move |path| ScanJob::Source {
                module: m.id,
                path,
                test: true,
            });
            descriptor.into_iter().chain(main).chain(test)
        })
        .collect();

    let failures: Vec<FileFailure> = jobs
        .par_iter()
        .filter_map(|job| scan_job(job, generation, acc).err())
        .collect();

    debug!(
        "Scanned {} files ({} failed), {} fact entries",
        jobs.len(),
        failures.len(),
        acc.len()
    );
    ScanReport {
        files_scanned: jobs.len(),
        failures,
    }
}

fn scan_job(job: &ScanJob<'_>, generation: &GenerationConfig, acc: &Accumulator) -> Result<(), FileFailure> {
    let (module, path) = match job {
        ScanJob::Descriptor { module, descriptor } => (*module, descriptor.path.as_path()),
        ScanJob::Source { module, path, .. } => (*module, *path),
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))
        .map_err(|e| FileFailure::file_read(path.to_path_buf(), e))?;

    let records = match job {
        ScanJob::Descriptor { descriptor, .. } => descriptor_records(module, descriptor, &text)?,
        ScanJob::Source { test, .. } => {
            let source = JavaSource::parse(&text)
                .map_err(|e| FileFailure::source_parse(path.to_path_buf(), e.into()))?;
            vec![(
                FactKey::source(module, path),
                Facts::Source(SourceFacts {
                    has_marker: has_marker(&source.declarations, generation),
                    package: source.package,
                    declarations: source.declarations,
                    test: *test,
                }),
            )]
        }
    };

    for (key, facts) in records {
        if let Err(e) = acc.record(key, facts) {
            warn!("{}", e);
        }
    }
    Ok(())
}

fn descriptor_records(
    module: ModuleId,
    descriptor: &DescriptorRef,
    text: &str,
) -> Result<Vec<(FactKey, Facts)>, FileFailure> {
    let path = &descriptor.path;
    match descriptor.kind {
        DescriptorKind::Maven => {
            let pom = PomDocument::parse(text)
                .map_err(|e| FileFailure::descriptor_parse(path.clone(), e.into()))?;
            let (facts, profiles) = pom_facts(path, text, &pom);
            let mut records = vec![(FactKey::descriptor(module), Facts::Descriptor(facts))];
            records.extend(
                profiles
                    .into_iter()
                    .map(|(id, facts)| (FactKey::profile(module, id), Facts::Descriptor(facts))),
            );
            Ok(records)
        }
        DescriptorKind::Gradle => Ok(vec![(
            FactKey::descriptor(module),
            Facts::Descriptor(gradle_facts(path, text)),
        )]),
    }
}

/// Facts of a POM and of each of its profiles.
pub fn pom_facts(
    path: &Path,
    text: &str,
    pom: &PomDocument,
) -> (DescriptorFacts, Vec<(String, DescriptorFacts)>) {
    let mut facts = DescriptorFacts::new(path, DescriptorKind::Maven);
    facts.dependencies = dependency_facts(&pom.dependencies, Section::Dependencies);
    facts.managed = dependency_facts(&pom.managed, Section::DependencyManagement);
    facts.parent = pom.parent.as_ref().map(|p| ParentFact {
        coordinate: p.coordinate.clone(),
        version: p.version.clone(),
    });
    facts.properties = implicit_properties(pom);
    facts
        .properties
        .extend(pom.properties.iter().map(|p| (p.name.clone(), p.value.clone())));
    facts.property_usage = property_usage(text);
    facts.markers = existing_markers(text);

    let profiles = pom
        .profiles
        .iter()
        .map(|profile| {
            let mut scoped = DescriptorFacts::new(path, DescriptorKind::Maven);
            scoped.dependencies = dependency_facts(&profile.dependencies, Section::Dependencies);
            scoped.managed = dependency_facts(&profile.managed, Section::DependencyManagement);
            scoped
                .properties
                .extend(profile.properties.iter().map(|p| (p.name.clone(), p.value.clone())));
            (profile.id.clone(), scoped)
        })
        .collect();

    (facts, profiles)
}

fn gradle_facts(path: &Path, text: &str) -> DescriptorFacts {
    let script = GradleScript::parse(text);
    let mut facts = DescriptorFacts::new(path, DescriptorKind::Gradle);
    facts.dependencies = script
        .dependencies
        .into_iter()
        .map(|d| DependencyFact {
            coordinate: d.coordinate,
            version: d.version,
            section: Section::Dependencies,
            ordinal: d.ordinal,
        })
        .collect();
    facts
}

fn dependency_facts(section: &DependencySection, kind: Section) -> Vec<DependencyFact> {
    section
        .entries
        .iter()
        .map(|e| DependencyFact {
            coordinate: e.coordinate.clone(),
            version: e.version.clone(),
            section: kind,
            ordinal: e.ordinal,
        })
        .collect()
}

fn implicit_properties(pom: &PomDocument) -> BTreeMap<String, String> {
    let mut properties = BTreeMap::new();
    let parent_version = pom.parent.as_ref().and_then(|p| p.version.clone());
    if let Some(version) = pom.version.clone().or_else(|| parent_version.clone()) {
        properties.insert("project.version".to_string(), version);
    }
    if let Some(version) = parent_version {
        properties.insert("project.parent.version".to_string(), version);
    }
    properties
}

fn property_usage(text: &str) -> BTreeMap<String, usize> {
    let mut usage = BTreeMap::new();
    for name in referenced_properties(text) {
        *usage.entry(name).or_insert(0) += 1;
    }
    usage
}
