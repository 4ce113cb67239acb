//! Conversion cases loaded from `conversion_cases.json`.
//!
//! Each case holds an expression in its serde form, optional per-call variables and either the expected
//! filter queries (besides the node type filter) or the expected error kind.

mod common;
use audlang::CoreExpression;
use common::*;
use itertools::Itertools;
use serde::Deserialize;
use std::collections::HashMap;

const CONVERSION_CASES_JSON: &str = include_str!("../conversion_cases.json");

#[derive(Debug, Deserialize)]
struct ConversionCases {
    suites: Vec<TestSuite>,
}
#[derive(Debug, Deserialize)]
struct TestSuite {
    name: String,
    cases: Vec<TestCase>,
}
#[derive(Debug, Deserialize)]
struct TestCase {
    name: String,
    expression: CoreExpression,
    #[serde(default)]
    variables: HashMap<String, String>,
    #[serde(default)]
    filter_queries: Vec<String>,
    error: Option<String>,
}

fn all_suites() -> Vec<TestSuite> {
    let cases: ConversionCases = serde_json::from_str(CONVERSION_CASES_JSON).expect("parse");
    cases.suites
}

#[test]
fn test_conversion_cases() {
    let converter = converter();
    let mut failures = Vec::new();
    for suite in all_suites() {
        for case in suite.cases {
            let label = format!("{} / {}", suite.name, case.name);
            match (converter.convert_with_variables(&case.expression, case.variables), case.error) {
                (Ok(definition), None) => {
                    let actual = conditions(&definition);
                    if actual != case.filter_queries {
                        failures.push(format!("{label}: expected {:?}, got {:?}", case.filter_queries, actual));
                    }
                }
                (Err(e), Some(kind)) if format!("{:?}", e.kind()) == kind => {}
                (Ok(definition), Some(kind)) => failures.push(format!("{label}: expected {kind} error, got {definition}")),
                (Err(e), _) => failures.push(format!("{label}: unexpected error {e}")),
            }
        }
    }
    assert!(failures.is_empty(), "{} case(s) failed:\n{}", failures.len(), failures.iter().join("\n"));
}
