// Copyright (c) 2025 - Cowboy AI, Inc.
//! Composition across units: references, groups and apply order

use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::BTreeSet;

use igdb_stacks::composition::{CompositionBuilder, CompositionError, StackUnit};
use igdb_stacks::domain::{ResourceType, StackName};

fn name(s: &str) -> StackName {
    StackName::new(s).unwrap()
}

/// net ← db, s3 (no deps), job consumes db and s3 outputs
fn units() -> (StackUnit, StackUnit, StackUnit, StackUnit) {
    let mut net = StackUnit::new(name("net"), "network");
    let vpc = net.add_resource("VPC", ResourceType::Vpc, &json!({})).unwrap();

    let mut db = StackUnit::new(name("db"), "database");
    let secret = db
        .add_resource("Secret", ResourceType::Secret, &json!({ "Vpc": vpc.reference() }))
        .unwrap();

    let mut s3 = StackUnit::new(name("s3"), "storage");
    let bucket = s3.add_resource("Bucket", ResourceType::Bucket, &json!({})).unwrap();

    let mut job = StackUnit::new(name("job"), "job");
    job.add_resource(
        "Function",
        ResourceType::Function,
        &json!({
            "Environment": {
                "DB_SECRET_ARN": secret.reference(),
                "BUCKET_NAME": bucket.reference(),
            }
        }),
    )
    .unwrap();
    (net, db, s3, job)
}

fn builder() -> CompositionBuilder {
    let (net, db, s3, job) = units();
    let mut b = CompositionBuilder::new();
    b.add_unit(net)
        .unwrap()
        .add_unit(db)
        .unwrap()
        .add_unit(s3)
        .unwrap()
        .add_unit(job)
        .unwrap();
    b.depends_on(&name("db"), &name("net")).unwrap();
    b
}

#[test]
fn test_group_edge_backs_references() {
    let mut b = builder();
    let data = b.group("data", &[&name("db"), &name("s3")]).unwrap();
    b.depends_on_group(&name("job"), &data).unwrap();
    let plan = b.build().unwrap();

    let order: Vec<String> = plan.order().iter().map(|n| n.to_string()).collect();
    assert_eq!(order, vec!["net", "s3", "db", "job"]);
}

#[test]
fn test_group_satisfied_in_either_order() {
    let mut b = builder();
    let data = b.group("data", &[&name("db"), &name("s3")]).unwrap();
    b.depends_on_group(&name("job"), &data).unwrap();
    let plan = b.build().unwrap();

    let base: BTreeSet<StackName> = [name("net")].into_iter().collect();
    for first in ["db", "s3"] {
        let second = if first == "db" { "s3" } else { "db" };
        let mut applied = base.clone();
        applied.insert(name(first));
        assert!(!plan.is_satisfied(&name("job"), &applied));
        applied.insert(name(second));
        assert!(plan.is_satisfied(&name("job"), &applied));
        assert_eq!(plan.ready(&applied), vec![&name("job")]);
    }
}

#[test]
fn test_missing_edge_is_caught_at_build() {
    let mut b = builder();
    b.depends_on(&name("job"), &name("db")).unwrap();
    let err = b.build().unwrap_err();
    assert!(matches!(
        err,
        CompositionError::UndeclaredReference { ref consumer, ref producer, .. }
            if consumer.as_str() == "job" && producer.as_str() == "s3"
    ));
}

#[test]
fn test_dependent_units_cannot_be_grouped() {
    let mut b = builder();
    let err = b.group("data", &[&name("db"), &name("net")]).unwrap_err();
    assert!(matches!(err, CompositionError::GroupNotIndependent { .. }));
}

#[test]
fn test_back_edge_reports_cycle_path() {
    let mut b = builder();
    b.depends_on(&name("job"), &name("db")).unwrap();
    let err = b.depends_on(&name("net"), &name("job")).unwrap_err();
    match err {
        CompositionError::Cycle { path } => {
            let path: Vec<&str> = path.iter().map(|n| n.as_str()).collect();
            assert_eq!(path, vec!["net", "job", "db", "net"]);
        }
        other => panic!("expected cycle, got {other:?}"),
    }
}

#[test]
fn test_plan_document_serializes_units_in_order() {
    let mut b = builder();
    let data = b.group("data", &[&name("db"), &name("s3")]).unwrap();
    b.depends_on_group(&name("job"), &data).unwrap();
    let doc = serde_json::to_value(b.build().unwrap().to_document()).unwrap();

    assert_eq!(doc["stages"], json!([["net", "s3"], ["db"], ["job"]]));
    assert_eq!(doc["groups"]["data"], json!(["db", "s3"]));
    let job = &doc["units"][3];
    assert_eq!(job["name"], "job");
    assert_eq!(job["depends_on"], json!(["db", "s3"]));
    assert_eq!(
        job["resources"]["Function"]["Properties"]["Environment"]["DB_SECRET_ARN"],
        "${Token[db/Secret]}"
    );
}
