//! Test-suite documents: two parallel label lists paired by position.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Deserialize)]
struct SuiteDocument {
    test_suite: TestSuite,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TestSuite {
    pub input_list: Vec<String>,
    pub output_list: Vec<String>,
}

/// One step of the suite: what to do, and what to expect back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestCase {
    pub index: usize,
    pub input_label: String,
    pub output_label: String,
}

impl TestSuite {
    pub fn new(input_list: Vec<String>, output_list: Vec<String>) -> Self {
        Self {
            input_list,
            output_list,
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<SuiteDocument>(raw).map(|doc| doc.test_suite)
    }

    /// Pairs the two lists. Unequal lengths are a configuration error.
    pub fn cases(&self) -> Result<Vec<TestCase>, ConfigError> {
        if self.input_list.len() != self.output_list.len() {
            return Err(ConfigError::LabelCountMismatch {
                inputs: self.input_list.len(),
                outputs: self.output_list.len(),
            });
        }

        Ok(self
            .input_list
            .iter()
            .zip(&self.output_list)
            .enumerate()
            .map(|(index, (input, output))| TestCase {
                index,
                input_label: input.clone(),
                output_label: output.clone(),
            })
            .collect())
    }
}

pub fn load_suite(path: &Path) -> Result<TestSuite, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::SuiteRead {
        path: path.to_path_buf(),
        source,
    })?;
    TestSuite::from_json(&raw).map_err(|source| ConfigError::SuiteParse {
        path: path.to_path_buf(),
        source,
    })
}
