//! Generated artifact types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Entry document every deployable artifact must contain
pub const ROOT_DOCUMENT: &str = "index.html";

/// Deployable file set produced by one generation run
///
/// Never persisted: it lives until deployment succeeds or the job fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedArtifact {
    /// Relative path -> file content, ordered for deterministic commits
    pub files: BTreeMap<String, String>,
    /// Whether the structural sanity check passed
    pub validated: bool,
    /// Completion calls spent producing this artifact
    pub attempts: u32,
}

impl GeneratedArtifact {
    pub fn new(files: BTreeMap<String, String>, validated: bool, attempts: u32) -> Self {
        Self {
            files,
            validated,
            attempts,
        }
    }

    pub fn root_document(&self) -> Option<&str> {
        self.files.get(ROOT_DOCUMENT).map(String::as_str)
    }

    /// Adds a file unless the generated output already provides one at `path`
    pub fn with_default_file(mut self, path: &str, content: String) -> Self {
        self.files.entry(path.to_string()).or_insert(content);
        self
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }
}
