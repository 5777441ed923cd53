//! Quality Pipeline Integration Tests
//!
//! Tests for check aggregation, summaries and gate evaluation.

use std::sync::{Arc, Mutex};

use aegis::adapters::CheckOutcome;
use aegis::core::{QualityError, QualityPipeline, VALIDATOR_REJECTED};
use aegis::domain::{CheckRecord, PipelineReport};
use serde_json::{json, Value};

fn coverage_gate(result: &Value) -> anyhow::Result<bool> {
    let coverage = result["coverage"]
        .as_f64()
        .ok_or_else(|| anyhow::anyhow!("coverage missing from result"))?;
    Ok(coverage >= 90.0)
}

fn report_with(name: &str, result: Value) -> PipelineReport {
    PipelineReport {
        passed: true,
        checks: vec![CheckRecord {
            name: name.to_string(),
            passed: true,
            result: Some(result),
            error: None,
        }],
        summary: String::new(),
    }
}

#[tokio::test]
async fn test_all_checks_pass() {
    let mut pipeline = QualityPipeline::new();
    pipeline
        .add_check("lint", || async { anyhow::Ok(CheckOutcome::pass(json!({ "warnings": 0 }))) })
        .unwrap();
    pipeline
        .add_check("test", || async { anyhow::Ok(CheckOutcome::pass(json!({ "failed": 0 }))) })
        .unwrap();

    let report = pipeline.execute().await;

    assert!(report.passed);
    assert_eq!(report.checks.len(), 2);
    assert_eq!(report.checks[0].name, "lint");
    assert_eq!(report.checks[1].name, "test");
    assert!(report.summary.is_empty());
}

#[tokio::test]
async fn test_failing_check_reported_in_summary() {
    let mut pipeline = QualityPipeline::new();
    pipeline
        .add_check("a", || async { anyhow::Ok(CheckOutcome::pass(Value::Null)) })
        .unwrap();
    pipeline
        .add_check("b", || async { anyhow::Ok(CheckOutcome::fail("x")) })
        .unwrap();

    let report = pipeline.execute().await;

    assert!(!report.passed);
    assert!(report.summary.contains("b: x"));
    assert_eq!(report.check("b").unwrap().result, Some(json!("x")));
}

#[tokio::test]
async fn test_failing_check_without_result_says_failed() {
    let mut pipeline = QualityPipeline::new();
    pipeline
        .add_check("audit", || async { anyhow::Ok(CheckOutcome::fail(Value::Null)) })
        .unwrap();

    let report = pipeline.execute().await;
    assert_eq!(report.summary, "audit: failed");
}

#[tokio::test]
async fn test_errors_do_not_short_circuit() {
    let ran = Arc::new(Mutex::new(Vec::new()));
    let mut pipeline = QualityPipeline::new();

    let log = Arc::clone(&ran);
    pipeline
        .add_check("build", move || {
            log.lock().unwrap().push("build");
            async { Err::<CheckOutcome, _>(anyhow::anyhow!("linker error")) }
        })
        .unwrap();
    let log = Arc::clone(&ran);
    pipeline
        .add_check("style", move || {
            log.lock().unwrap().push("style");
            async { anyhow::Ok(CheckOutcome::fail("2 issues")) }
        })
        .unwrap();
    let log = Arc::clone(&ran);
    pipeline
        .add_check("docs", move || {
            log.lock().unwrap().push("docs");
            async { anyhow::Ok(CheckOutcome::pass(Value::Null)) }
        })
        .unwrap();

    let report = pipeline.execute().await;

    assert_eq!(*ran.lock().unwrap(), vec!["build", "style", "docs"]);
    assert!(!report.passed);
    assert_eq!(report.summary, "build: linker error; style: 2 issues");

    let build = report.check("build").unwrap();
    assert!(!build.passed);
    assert_eq!(build.error.as_deref(), Some("linker error"));
    assert_eq!(build.result, None);
}

#[tokio::test]
async fn test_empty_pipeline_passes() {
    let pipeline = QualityPipeline::new();

    let report = pipeline.execute().await;

    assert!(report.passed);
    assert!(report.checks.is_empty());
    assert!(report.summary.is_empty());
}

#[test]
fn test_duplicate_check_rejected() {
    let mut pipeline = QualityPipeline::new();
    pipeline
        .add_check("lint", || async { anyhow::Ok(CheckOutcome::pass(Value::Null)) })
        .unwrap();

    let result = pipeline.add_check("lint", || async { anyhow::Ok(CheckOutcome::pass(Value::Null)) });

    match result {
        Err(QualityError::DuplicateCheck(name)) => assert_eq!(name, "lint"),
        other => panic!("Expected DuplicateCheck, got {:?}", other),
    }
    assert_eq!(pipeline.get_checks(), vec!["lint"]);
}

#[test]
fn test_listings() {
    let mut pipeline = QualityPipeline::new();
    pipeline
        .add_check("lint", || async { anyhow::Ok(CheckOutcome::pass(Value::Null)) })
        .unwrap();
    pipeline
        .add_check("test", || async { anyhow::Ok(CheckOutcome::pass(Value::Null)) })
        .unwrap();
    pipeline.add_gate("coverage", coverage_gate);

    assert_eq!(pipeline.get_checks(), vec!["lint", "test"]);
    assert_eq!(pipeline.get_gates(), vec!["coverage"]);
}

#[test]
fn test_no_gates_always_pass() {
    let pipeline = QualityPipeline::new();

    let failing = PipelineReport {
        passed: false,
        checks: Vec::new(),
        summary: "lint: failed".to_string(),
    };
    let gates = pipeline.validate_gates(&failing);

    assert!(gates.passed);
    assert!(gates.failed_gates.is_empty());
}

#[test]
fn test_coverage_gate_fails_below_threshold() {
    let mut pipeline = QualityPipeline::new();
    pipeline.add_gate("coverage", coverage_gate);

    let gates = pipeline.validate_gates(&report_with("coverage", json!({ "coverage": 85 })));

    assert!(!gates.passed);
    assert_eq!(gates.failed_gates.len(), 1);
    assert_eq!(gates.failed_gates[0].name, "coverage");
    assert_eq!(gates.failed_gates[0].reason, VALIDATOR_REJECTED);
}

#[test]
fn test_coverage_gate_passes_at_threshold() {
    let mut pipeline = QualityPipeline::new();
    pipeline.add_gate("coverage", coverage_gate);

    let gates = pipeline.validate_gates(&report_with("coverage", json!({ "coverage": 90 })));

    assert!(gates.passed);
}

#[test]
fn test_validator_error_becomes_failed_gate() {
    let mut pipeline = QualityPipeline::new();
    pipeline.add_gate("coverage", coverage_gate);
    pipeline.add_gate("size", |_: &Value| anyhow::Ok(true));

    let mut report = report_with("coverage", json!({ "lines": 120 }));
    report.checks.push(CheckRecord {
        name: "size".to_string(),
        passed: true,
        result: Some(json!(1024)),
        error: None,
    });
    let gates = pipeline.validate_gates(&report);

    assert!(!gates.passed);
    assert_eq!(gates.failed_gates.len(), 1);
    assert_eq!(gates.failed_gates[0].reason, "coverage missing from result");
}

#[test]
fn test_gate_without_matching_check_is_skipped() {
    let mut pipeline = QualityPipeline::new();
    pipeline.add_gate("security", |_: &Value| anyhow::Ok(false));

    let gates = pipeline.validate_gates(&report_with("lint", json!({})));

    assert!(gates.passed);
    assert!(gates.failed_gates.is_empty());
}

#[tokio::test]
async fn test_gate_evaluation_does_not_mutate_report() {
    let mut pipeline = QualityPipeline::new();
    pipeline
        .add_check("coverage", || async { anyhow::Ok(CheckOutcome::pass(json!({ "coverage": 70 }))) })
        .unwrap();
    pipeline.add_gate("coverage", coverage_gate);

    let report = pipeline.execute().await;
    let before = report.clone();
    let gates = pipeline.validate_gates(&report);

    assert!(!gates.passed);
    assert_eq!(report, before);
    // The check itself passed; only the gate rejected it
    assert!(report.passed);
}
