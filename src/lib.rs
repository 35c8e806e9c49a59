//! Classify source, markup and prose files into the spans worth spell
//! checking, then check the words inside them.

pub mod checker;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod directives;
pub mod dispatch;
pub mod error;

pub use checker::{SpellChecker, SpellingEngine};
pub use classifier::{Classification, ClassifierSettings, SpellCheckSpan, TextClassifier};
pub use config::Config;
pub use dispatch::ClassifierRegistry;
pub use error::ClassifyError;

use serde::Serialize;
use std::path::PathBuf;

/// Spans of one file.
#[derive(Debug, Clone, Serialize)]
pub struct ClassifiedFile {
    pub path: PathBuf,
    pub classifier: String,
    pub spans: Vec<SpellCheckSpan>,
}

/// Misspellings of one file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckResult {
    pub path: PathBuf,
    pub classifier: String,
    pub errors: Vec<SpellError>,
}

impl CheckResult {
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpellError {
    pub word: String,
    /// Byte offset into the file.
    pub offset: usize,
    pub line: usize,
    pub column: usize,
    pub classification: Classification,
    pub context: String,
    pub suggestions: Vec<String>,
}
