//! Result aggregation and the textual report

use bqci_core::TestResult;
use std::fmt;

/// Exit status when every test passed.
pub const EXIT_SUCCESS: i32 = 0;

/// Exit status when at least one test failed.
pub const EXIT_TEST_FAILURES: i32 = 2;

const NAME_HEADER: &str = "Test Name";
const RESULT_HEADER: &str = "Result";

/// All results of a run, ordered by test name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    results: Vec<TestResult>,
}

impl Report {
    pub fn new(mut results: Vec<TestResult>) -> Self {
        results.sort_by(|a, b| a.name.cmp(&b.name));
        Self { results }
    }

    pub fn results(&self) -> &[TestResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.status.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.len() - self.passed()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            EXIT_SUCCESS
        } else {
            EXIT_TEST_FAILURES
        }
    }

    /// Two-column table, one line per test, names padded to the widest.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .results
            .iter()
            .map(|r| r.name.chars().count())
            .fold(NAME_HEADER.len(), usize::max);

        writeln!(f, "{:<width$} | {}", NAME_HEADER, RESULT_HEADER)?;
        for result in &self.results {
            writeln!(f, "{:<width$} | {}", result.name, result.status)?;
        }
        Ok(())
    }
}
