//! End-to-end runs of the scan, decide and mutate passes over real files.

mod common;

use common::{pom, ProjectFixture, TRACKED_CONFIG};
use depshift::descriptor::PomDocument;
use depshift::pipeline::{run_pipeline, Action, Outcome, RunOptions, RunState, RunSummary};
use depshift::version::VerdictKind;

fn run(fixture: &ProjectFixture) -> RunSummary {
    run_pipeline(&RunOptions {
        root: fixture.root().to_path_buf(),
        ..Default::default()
    })
    .unwrap()
}

fn managed_order(text: &str) -> Vec<String> {
    PomDocument::parse(text)
        .unwrap()
        .managed
        .entries
        .iter()
        .map(|e| e.coordinate.artifact_id.clone())
        .collect()
}

fn outcomes(summary: &RunSummary) -> Vec<&Outcome> {
    summary
        .decisions
        .iter()
        .flat_map(|d| d.outcomes.iter().map(|p| &p.outcome))
        .collect()
}

#[test]
fn test_literal_violation_is_reordered_once() {
    let fixture = ProjectFixture::new();
    fixture
        .write("depshift.toml", TRACKED_CONFIG)
        .write(
            "pom.xml",
            &pom(
                "app",
                &[],
                &[("org.other", "other-bom", "2.0"), ("org.lib", "lib-bom", "14.1.0")],
            ),
        );

    let first = run(&fixture);
    assert_eq!(first.state, RunState::Done);
    assert_eq!(first.counts.apply, 1);
    assert_eq!(first.files_changed(), 1);
    assert_eq!(managed_order(&fixture.read("pom.xml")), vec!["lib-bom", "other-bom"]);
    assert_eq!(first.decisions[0].verdicts["lib"].kind, VerdictKind::Compatible);

    let before = fixture.read("pom.xml");
    let second = run(&fixture);
    assert!(!second.has_changes());
    assert_eq!(second.counts.apply, 0);
    assert_eq!(fixture.read("pom.xml"), before);
}

#[test]
fn test_incompatible_version_blocks_the_reorder() {
    let fixture = ProjectFixture::new();
    let original = pom(
        "app",
        &[],
        &[("org.other", "other-bom", "2.0"), ("org.lib", "lib-bom", "11.0.0")],
    );
    fixture.write("depshift.toml", TRACKED_CONFIG).write("pom.xml", &original);

    let summary = run(&fixture);
    assert_eq!(summary.counts.skip, 1);
    assert_eq!(summary.counts.apply, 0);
    assert!(!summary.has_changes());
    assert_eq!(fixture.read("pom.xml"), original);
    match outcomes(&summary)[0] {
        Outcome::Skip { reason } => assert!(reason.contains("incompatible")),
        other => panic!("expected skip, got {:?}", other),
    }
}

#[test]
fn test_review_range_version_blocks_the_reorder() {
    let fixture = ProjectFixture::new();
    let original = pom(
        "app",
        &[],
        &[("org.other", "other-bom", "2.0"), ("org.lib", "lib-bom", "13.2.0")],
    );
    fixture.write("depshift.toml", TRACKED_CONFIG).write("pom.xml", &original);

    let summary = run(&fixture);
    assert_eq!(summary.decisions[0].verdicts["lib"].kind, VerdictKind::RequiresReview);
    assert_eq!(fixture.read("pom.xml"), original);
}

#[test]
fn test_symbolic_second_entry_is_marked_not_moved() {
    let fixture = ProjectFixture::new();
    fixture.write("depshift.toml", TRACKED_CONFIG).write(
        "pom.xml",
        &pom(
            "app",
            &[],
            &[
                ("org.other", "other-bom", "${other.version}"),
                ("org.lib", "lib-bom", "14.0.0"),
            ],
        ),
    );

    let first = run(&fixture);
    assert_eq!(first.counts.mark, 1);
    let text = fixture.read("pom.xml");
    assert_eq!(managed_order(&text), vec!["other-bom", "lib-bom"]);
    assert_eq!(text.matches("@NeedsReview: ordering org.lib:lib-bom must precede").count(), 1);

    let second = run(&fixture);
    assert!(!second.has_changes());
    assert_eq!(second.counts.mark, 0);
    assert_eq!(fixture.read("pom.xml"), text);
}

#[test]
fn test_versions_inherited_from_parent_gate_children() {
    let fixture = ProjectFixture::new();
    fixture
        .write("depshift.toml", TRACKED_CONFIG)
        .write(
            "pom.xml",
            &pom("parent", &["child"], &[("org.lib", "lib-bom", "11.0.0")]),
        )
        .write(
            "child/pom.xml",
            &pom(
                "child",
                &[],
                &[("org.other", "other-bom", "2.0"), ("org.lib", "lib-bom", "${lib.version}")],
            ),
        );

    let summary = run(&fixture);
    let child = summary
        .decisions
        .iter()
        .find(|d| d.module == "child")
        .unwrap();
    // The child's own entry is found first and cannot be resolved.
    assert_eq!(child.verdicts["lib"].kind, VerdictKind::Unresolved);
    assert!(!summary.has_changes());
}

#[test]
fn test_generation_places_artifact_at_common_prefix() {
    let fixture = ProjectFixture::new();
    fixture
        .write("pom.xml", &pom("orders", &[], &[]))
        .write(".depshift.toml", "generate = true\n")
        .java("", "com.acme.orders.api", "OrderResource")
        .java("", "com.acme.orders.model", "Order");

    let first = run(&fixture);
    assert_eq!(first.counts.apply, 1);
    let artifact = "src/main/java/com/acme/orders/OrdersScanConfiguration.java";
    let text = fixture.read(artifact);
    assert!(text.starts_with("package com.acme.orders;\n"));
    assert!(text.contains("@ComponentScan(basePackages = \"com.acme.orders\")"));

    let second = run(&fixture);
    assert!(!second.has_changes());
    assert!(second.counts.apply == 0);
    assert_eq!(fixture.read(artifact), text);
}

#[test]
fn test_disjoint_packages_fall_back_and_need_review() {
    let fixture = ProjectFixture::new();
    fixture
        .write("pom.xml", &pom("billing-core", &[], &[]))
        .write(".depshift.toml", "generate = true\n")
        .java("", "org.foo.x", "A")
        .java("", "com.bar.y", "B");

    let summary = run(&fixture);
    let generated = outcomes(&summary)
        .into_iter()
        .find_map(|o| match o {
            Outcome::Apply(Action::Generate { placement, .. }) => Some(placement.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(generated.namespace, "app");
    assert!(generated.needs_review);
    let text = fixture.read("src/main/java/app/BillingCoreScanConfiguration.java");
    assert!(text.contains("@NeedsReview("));
}

#[test]
fn test_sticky_true_reaches_descendants_only() {
    // root
    // ├── a        generate = true
    // │   └── b    generate = false, still generates
    // └── c        no settings, does not generate
    let fixture = ProjectFixture::new();
    fixture
        .write("pom.xml", &pom("root", &["a", "c"], &[]))
        .write("a/pom.xml", &pom("a", &["b"], &[]))
        .write("a/.depshift.toml", "generate = true\n")
        .write("a/b/pom.xml", &pom("b", &[], &[]))
        .write("a/b/.depshift.toml", "generate = false\n")
        .java("a/b", "com.acme.b", "Service")
        .write("c/pom.xml", &pom("c", &[], &[]))
        .java("c", "com.acme.c", "Service");

    run(&fixture);

    assert!(fixture.path("a/b/src/main/java/com/acme/b/BScanConfiguration.java").is_file());
    assert!(!fixture.path("c/src/main/java/com/acme/c/CScanConfiguration.java").exists());
}

#[test]
fn test_opt_out_leaves_files_untouched() {
    let fixture = ProjectFixture::new();
    let original = pom(
        "app",
        &[],
        &[("org.other", "other-bom", "2.0"), ("org.lib", "lib-bom", "14.0.0")],
    );
    fixture
        .write("depshift.toml", TRACKED_CONFIG)
        .write("pom.xml", &original)
        .write(".depshift.toml", "opt_out = true\n");

    let summary = run(&fixture);
    assert_eq!(summary.counts.skip, 1);
    assert_eq!(fixture.read("pom.xml"), original);
}

#[test]
fn test_dry_run_reports_without_writing() {
    let fixture = ProjectFixture::new();
    let original = pom(
        "app",
        &[],
        &[("org.other", "other-bom", "2.0"), ("org.lib", "lib-bom", "14.0.0")],
    );
    fixture.write("depshift.toml", TRACKED_CONFIG).write("pom.xml", &original);

    let summary = run_pipeline(&RunOptions {
        root: fixture.root().to_path_buf(),
        dry_run: true,
        ..Default::default()
    })
    .unwrap();
    assert_eq!(summary.files_changed(), 1);
    assert!(!summary.changes[0].written);
    assert_eq!(fixture.read("pom.xml"), original);
}

#[test]
fn test_broken_descriptor_does_not_stop_the_run() {
    let fixture = ProjectFixture::new();
    fixture
        .write("depshift.toml", TRACKED_CONFIG)
        .write("pom.xml", &pom("root", &["good", "bad"], &[]))
        .write(
            "good/pom.xml",
            &pom(
                "good",
                &[],
                &[("org.other", "other-bom", "2.0"), ("org.lib", "lib-bom", "14.0.0")],
            ),
        )
        .write("bad/pom.xml", "<project><artifactId>bad</artifactId>");

    let summary = run(&fixture);
    assert_eq!(summary.failures.len(), 1);
    assert!(summary.failures[0].path.ends_with("bad/pom.xml"));
    assert_eq!(managed_order(&fixture.read("good/pom.xml")), vec!["lib-bom", "other-bom"]);
}

#[test]
fn test_override_forces_generation() {
    let fixture = ProjectFixture::new();
    fixture
        .write("pom.xml", &pom("orders", &[], &[]))
        .java("", "com.acme.orders", "Order");

    run_pipeline(&RunOptions {
        root: fixture.root().to_path_buf(),
        overrides: vec!["generate=true".to_string()],
        ..Default::default()
    })
    .unwrap();
    assert!(fixture
        .path("src/main/java/com/acme/orders/OrdersScanConfiguration.java")
        .is_file());
}
