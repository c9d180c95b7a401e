//! Source-control repository
//!
//! Handles communication with the source-control host:
//! - Creating and looking up repositories
//! - Committing a file set
//! - Enabling and querying the public hosting endpoint

use async_trait::async_trait;
use shipwright_client::{ClientError, GitHubClient};
use shipwright_core::domain::deployment::{HostingStatus, RepositoryInfo};
use std::collections::BTreeMap;

use crate::error::UpstreamError;

/// Repository trait for source-control operations
///
/// Every method distinguishes `NotFound`, `AlreadyExists` and `Transient`
/// failures so the deployer can choose between create, update and retry.
#[async_trait]
pub trait SourceControlRepository: Send + Sync {
    /// Account that owns the repositories
    fn owner(&self) -> &str;

    /// Creates a public repository; `AlreadyExists` if the name is taken
    async fn create_repository(
        &self,
        name: &str,
        description: &str,
    ) -> Result<RepositoryInfo, UpstreamError>;

    /// Looks up a repository; `NotFound` if it does not exist
    async fn get_repository(&self, name: &str) -> Result<RepositoryInfo, UpstreamError>;

    /// Writes `files` as a single commit on the default branch, returning its SHA
    async fn commit_files(
        &self,
        repo: &RepositoryInfo,
        files: &BTreeMap<String, String>,
        message: &str,
    ) -> Result<String, UpstreamError>;

    /// Enables public hosting; `AlreadyExists` if it was already enabled
    async fn enable_hosting(&self, repo: &RepositoryInfo) -> Result<(), UpstreamError>;

    /// Reports whether the hosting endpoint serves the latest build
    async fn hosting_status(&self, repo: &RepositoryInfo) -> Result<HostingStatus, UpstreamError>;
}

/// GitHub implementation of SourceControlRepository
pub struct HttpSourceControlRepository {
    client: GitHubClient,
}

impl HttpSourceControlRepository {
    pub fn new(client: GitHubClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceControlRepository for HttpSourceControlRepository {
    fn owner(&self) -> &str {
        self.client.owner()
    }

    async fn create_repository(
        &self,
        name: &str,
        description: &str,
    ) -> Result<RepositoryInfo, UpstreamError> {
        self.client
            .create_repository(name, description)
            .await
            .map_err(creation_error)
    }

    async fn get_repository(&self, name: &str) -> Result<RepositoryInfo, UpstreamError> {
        Ok(self.client.get_repository(name).await?)
    }

    async fn commit_files(
        &self,
        repo: &RepositoryInfo,
        files: &BTreeMap<String, String>,
        message: &str,
    ) -> Result<String, UpstreamError> {
        // A freshly created repository answers 404/409 on its git data until
        // the initial commit lands.
        self.client
            .commit_files(repo, files, message)
            .await
            .map_err(|err| match UpstreamError::from(err) {
                UpstreamError::NotFound(message) | UpstreamError::AlreadyExists(message) => {
                    UpstreamError::Transient(message)
                }
                other => other,
            })
    }

    async fn enable_hosting(&self, repo: &RepositoryInfo) -> Result<(), UpstreamError> {
        Ok(self.client.enable_pages(repo).await?)
    }

    async fn hosting_status(&self, repo: &RepositoryInfo) -> Result<HostingStatus, UpstreamError> {
        Ok(self.client.pages_status(repo).await?)
    }
}

/// Maps a failed creation; only a taken name counts as `AlreadyExists`
fn creation_error(err: ClientError) -> UpstreamError {
    if err.is_name_taken() {
        UpstreamError::AlreadyExists(err.to_string())
    } else {
        UpstreamError::from(err)
    }
}
