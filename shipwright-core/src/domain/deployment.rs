//! Deployment domain types

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Longest repository name the source-control host accepts
const MAX_REPOSITORY_NAME_LEN: usize = 100;

/// Derives the repository name for a task
///
/// Deterministic: every round of a task maps to the same repository.
pub fn repository_name(task_id: &str) -> String {
    let cleaned: String = task_id
        .to_lowercase()
        .chars()
        .map(|c| if c == '_' || c == ' ' { '-' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '.')
        .collect();

    let trimmed = cleaned.trim_matches(|c| c == '-' || c == '.');
    let name: String = trimmed.chars().take(MAX_REPOSITORY_NAME_LEN).collect();
    let name = name.trim_end_matches(|c| c == '-' || c == '.');

    if name.is_empty() {
        let digest = hex::encode(Sha256::digest(task_id.as_bytes()));
        format!("task-{}", &digest[..12])
    } else {
        name.to_string()
    }
}

/// Public hosting URL the host assigns to a repository by convention
pub fn default_hosting_url(owner: &str, repository: &str) -> String {
    format!("https://{}.github.io/{}/", owner.to_lowercase(), repository)
}

/// Repository as reported by the source-control host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub name: String,
    pub html_url: String,
    pub default_branch: String,
}

/// Hosting endpoint state of a repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostingStatus {
    pub ready: bool,
    pub url: Option<String>,
}

/// Output of a successful deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentResult {
    pub repository_name: String,
    pub repository_url: String,
    /// True only when this run created the repository
    pub created: bool,
    pub hosting_url: String,
    pub commit_ref: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_name_normalises_task_id() {
        assert_eq!(repository_name("Captcha_Solver v2"), "captcha-solver-v2");
        assert_eq!(repository_name("sum-of-sales-1a2b"), "sum-of-sales-1a2b");
        assert_eq!(repository_name("--weird!!name.."), "weirdname");
    }

    #[test]
    fn test_repository_name_is_deterministic() {
        assert_eq!(repository_name("t1"), repository_name("t1"));
    }

    #[test]
    fn test_repository_name_truncates() {
        let long = "a".repeat(150);
        assert_eq!(repository_name(&long).len(), MAX_REPOSITORY_NAME_LEN);
    }

    #[test]
    fn test_repository_name_falls_back_to_hash() {
        let name = repository_name("!!!");
        assert!(name.starts_with("task-"));
        assert_eq!(name.len(), "task-".len() + 12);
        assert_ne!(name, repository_name("???"));
    }

    #[test]
    fn test_default_hosting_url() {
        assert_eq!(
            default_hosting_url("OctoCat", "t1"),
            "https://octocat.github.io/t1/"
        );
    }
}
