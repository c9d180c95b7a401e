//! GitHub REST client
//!
//! Covers the handful of endpoints the deployer needs: repository lookup and
//! creation, a multi-file commit through the git data API, and GitHub Pages
//! activation and status.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use shipwright_core::domain::deployment::{HostingStatus, RepositoryInfo};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::Result;

const API_VERSION: &str = "2022-11-28";

/// HTTP client for the GitHub REST API, scoped to one repository owner
#[derive(Debug, Clone)]
pub struct GitHubClient {
    api_url: String,
    token: String,
    owner: String,
    client: Client,
}

impl GitHubClient {
    /// Create a new GitHub client
    ///
    /// # Arguments
    /// * `api_url` - API base, normally "https://api.github.com"
    /// * `token` - Personal access token with `repo` and `pages` scope
    /// * `owner` - Login of the account that owns the deployed repositories
    /// * `timeout` - Per-request timeout
    pub fn new(
        api_url: impl Into<String>,
        token: impl Into<String>,
        owner: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let api_url = api_url.into();
        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.into(),
            owner: owner.into(),
            client: crate::http_client(timeout)?,
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    fn repo_url(&self, repo: &str, path: &str) -> String {
        format!("{}/repos/{}/{}{}", self.api_url, self.owner, repo, path)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    // =============================================================================
    // Repositories
    // =============================================================================

    /// Look up a repository owned by the configured owner
    pub async fn get_repository(&self, name: &str) -> Result<RepositoryInfo> {
        let url = self.repo_url(name, "");
        let response = self.authorized(self.client.get(&url)).send().await?;

        let repo: RepoResponse = crate::handle_response(response).await?;
        Ok(repo.into())
    }

    /// Create a public, auto-initialised repository for the authenticated user
    ///
    /// GitHub answers 422 when the name is already taken; see
    /// [`ClientError::is_name_taken`](crate::ClientError::is_name_taken).
    pub async fn create_repository(&self, name: &str, description: &str) -> Result<RepositoryInfo> {
        let url = format!("{}/user/repos", self.api_url);
        let body = CreateRepoRequest {
            name,
            description,
            private: false,
            auto_init: true,
        };
        let response = self
            .authorized(self.client.post(&url))
            .json(&body)
            .send()
            .await?;

        let repo: RepoResponse = crate::handle_response(response).await?;
        Ok(repo.into())
    }

    // =============================================================================
    // Git data
    // =============================================================================

    /// Write `files` to the repository's default branch as one commit
    ///
    /// Existing files not listed in `files` are kept. Returns the new commit SHA.
    pub async fn commit_files(
        &self,
        repo: &RepositoryInfo,
        files: &BTreeMap<String, String>,
        message: &str,
    ) -> Result<String> {
        let branch = &repo.default_branch;

        let head = self.branch_head(&repo.name, branch).await?;
        let base_tree = self.commit_tree(&repo.name, &head).await?;

        let mut entries = Vec::with_capacity(files.len());
        for (path, content) in files {
            let sha = self.create_blob(&repo.name, content).await?;
            tracing::debug!(repo = %repo.name, path = %path, bytes = content.len(), "Blob created");
            entries.push(TreeEntry {
                path,
                mode: "100644",
                kind: "blob",
                sha,
            });
        }

        let tree_url = self.repo_url(&repo.name, "/git/trees");
        let response = self
            .authorized(self.client.post(&tree_url))
            .json(&CreateTreeRequest {
                base_tree: &base_tree,
                tree: entries,
            })
            .send()
            .await?;
        let tree: ShaResponse = crate::handle_response(response).await?;

        let commit_url = self.repo_url(&repo.name, "/git/commits");
        let response = self
            .authorized(self.client.post(&commit_url))
            .json(&CreateCommitRequest {
                message,
                tree: &tree.sha,
                parents: vec![&head],
            })
            .send()
            .await?;
        let commit: ShaResponse = crate::handle_response(response).await?;

        let ref_url = self.repo_url(&repo.name, &format!("/git/refs/heads/{}", branch));
        let response = self
            .authorized(self.client.patch(&ref_url))
            .json(&UpdateRefRequest {
                sha: &commit.sha,
                force: false,
            })
            .send()
            .await?;
        crate::handle_empty_response(response).await?;

        Ok(commit.sha)
    }

    async fn branch_head(&self, repo: &str, branch: &str) -> Result<String> {
        let url = self.repo_url(repo, &format!("/git/ref/heads/{}", branch));
        let response = self.authorized(self.client.get(&url)).send().await?;

        let git_ref: RefResponse = crate::handle_response(response).await?;
        Ok(git_ref.object.sha)
    }

    async fn commit_tree(&self, repo: &str, commit_sha: &str) -> Result<String> {
        let url = self.repo_url(repo, &format!("/git/commits/{}", commit_sha));
        let response = self.authorized(self.client.get(&url)).send().await?;

        let commit: CommitResponse = crate::handle_response(response).await?;
        Ok(commit.tree.sha)
    }

    async fn create_blob(&self, repo: &str, content: &str) -> Result<String> {
        let url = self.repo_url(repo, "/git/blobs");
        let response = self
            .authorized(self.client.post(&url))
            .json(&CreateBlobRequest {
                content: BASE64.encode(content.as_bytes()),
                encoding: "base64",
            })
            .send()
            .await?;

        let blob: ShaResponse = crate::handle_response(response).await?;
        Ok(blob.sha)
    }

    // =============================================================================
    // Pages
    // =============================================================================

    /// Enable GitHub Pages from the root of the default branch
    ///
    /// GitHub answers 409 when Pages is already enabled.
    pub async fn enable_pages(&self, repo: &RepositoryInfo) -> Result<()> {
        let url = self.repo_url(&repo.name, "/pages");
        let response = self
            .authorized(self.client.post(&url))
            .json(&EnablePagesRequest {
                source: PagesSource {
                    branch: &repo.default_branch,
                    path: "/",
                },
            })
            .send()
            .await?;

        crate::handle_empty_response(response).await
    }

    /// Query the Pages site; ready once the latest build reports `built`
    pub async fn pages_status(&self, repo: &RepositoryInfo) -> Result<HostingStatus> {
        let url = self.repo_url(&repo.name, "/pages");
        let response = self.authorized(self.client.get(&url)).send().await?;

        let pages: PagesResponse = crate::handle_response(response).await?;
        Ok(HostingStatus {
            ready: pages.status.as_deref() == Some("built"),
            url: pages.html_url,
        })
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Deserialize)]
struct RepoResponse {
    name: String,
    html_url: String,
    #[serde(default)]
    default_branch: Option<String>,
}

impl From<RepoResponse> for RepositoryInfo {
    fn from(repo: RepoResponse) -> Self {
        Self {
            name: repo.name,
            html_url: repo.html_url,
            default_branch: repo.default_branch.unwrap_or_else(|| "main".to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct CreateRepoRequest<'a> {
    name: &'a str,
    description: &'a str,
    private: bool,
    auto_init: bool,
}

#[derive(Debug, Deserialize)]
struct ShaResponse {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct RefResponse {
    object: ShaResponse,
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    tree: ShaResponse,
}

#[derive(Debug, Serialize)]
struct CreateBlobRequest {
    content: String,
    encoding: &'static str,
}

#[derive(Debug, Serialize)]
struct TreeEntry<'a> {
    path: &'a str,
    mode: &'static str,
    #[serde(rename = "type")]
    kind: &'static str,
    sha: String,
}

#[derive(Debug, Serialize)]
struct CreateTreeRequest<'a> {
    base_tree: &'a str,
    tree: Vec<TreeEntry<'a>>,
}

#[derive(Debug, Serialize)]
struct CreateCommitRequest<'a> {
    message: &'a str,
    tree: &'a str,
    parents: Vec<&'a str>,
}

#[derive(Debug, Serialize)]
struct UpdateRefRequest<'a> {
    sha: &'a str,
    force: bool,
}

#[derive(Debug, Serialize)]
struct EnablePagesRequest<'a> {
    source: PagesSource<'a>,
}

#[derive(Debug, Serialize)]
struct PagesSource<'a> {
    branch: &'a str,
    path: &'static str,
}

#[derive(Debug, Deserialize)]
struct PagesResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    html_url: Option<String>,
}
