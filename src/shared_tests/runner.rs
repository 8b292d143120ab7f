use super::{ContextTest, FunctionTest, SharedTestCase, TestFolder};
use crate::context::{resolve_contexts, ExprContext};
use crate::engine::evaluate_json;
use itertools::Itertools;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum TestOutcome {
    Passed,
    Failed(String),
}

impl TestOutcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, TestOutcome::Passed)
    }
}

/// Evaluate a function fixture. A fixture with `expectsFailure` passes only
/// when evaluation fails with a message containing that text.
pub fn run_function_test(test: &FunctionTest) -> TestOutcome {
    let node = test.context.clone().unwrap_or_default();
    let ctx = ExprContext::new(&node, &test.base.sources);
    let result = evaluate_json(&test.expression, &ctx);

    match (&test.expects_failure, result) {
        (Some(expected), Err(e)) => {
            let message = e.to_string();
            if message.contains(expected.as_str()) {
                TestOutcome::Passed
            } else {
                TestOutcome::Failed(format!(
                    "expected failure containing '{expected}', got '{message}'"
                ))
            }
        }
        (Some(expected), Ok(v)) => TestOutcome::Failed(format!(
            "expected failure containing '{expected}', but evaluated to {v}"
        )),
        (None, Err(e)) => TestOutcome::Failed(format!("unexpected failure: {e}")),
        (None, Ok(v)) => match &test.expects {
            Some(expected) if same_value(&v, expected) => TestOutcome::Passed,
            Some(expected) => TestOutcome::Failed(format!("expected {expected}, got {v}")),
            None => TestOutcome::Failed("fixture has neither expects nor expectsFailure".into()),
        },
    }
}

/// Resolve every context in the fixture's layouts and compare with the
/// expected list.
pub fn run_context_test(test: &ContextTest) -> TestOutcome {
    match resolve_contexts(&test.base.sources) {
        Ok(found) if found == test.expected_contexts => TestOutcome::Passed,
        Ok(found) => TestOutcome::Failed(format!(
            "expected contexts {}, got {}",
            serde_json::to_string(&test.expected_contexts).unwrap_or_default(),
            serde_json::to_string(&found).unwrap_or_default()
        )),
        Err(e) => TestOutcome::Failed(format!("unexpected failure: {e}")),
    }
}

/// Numbers compare by value so `18` and `18.0` match.
fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(fx), Some(fy)) => fx == fy,
            _ => x == y,
        },
        _ => a == b,
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub passed: usize,
    /// `(fixture name, reason)` for each failure.
    pub failures: Vec<(String, String)>,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.passed + self.failures.len()
    }

    pub fn merge(&mut self, other: RunSummary) {
        self.passed += other.passed;
        self.failures.extend(other.failures);
    }

    pub fn report(&self) -> String {
        let mut out = format!("{} passed, {} failed", self.passed, self.failures.len());
        if !self.failures.is_empty() {
            out.push('\n');
            out.push_str(
                &self
                    .failures
                    .iter()
                    .map(|(name, reason)| format!("  {name}: {reason}"))
                    .join("\n"),
            );
        }
        out
    }
}

/// Run every fixture in `folder` (recursively) through `run`.
pub fn run_folder<T, F>(folder: &TestFolder<T>, run: F) -> RunSummary
where
    T: SharedTestCase,
    F: Fn(&T) -> TestOutcome,
{
    let mut summary = RunSummary::default();
    for test in folder.tests() {
        match run(test) {
            TestOutcome::Passed => summary.passed += 1,
            TestOutcome::Failed(reason) => {
                tracing::debug!(name = test.name(), %reason, "fixture failed");
                summary.failures.push((test.name().to_string(), reason));
            }
        }
    }
    summary
}
