//! Service layer
//!
//! Services hold the stage logic of the pipeline. Each one owns a single
//! stage, drives its repository under a retry policy, and reports failures
//! through the stage's error type.

pub mod artifact;
mod deployer;
mod generator;
mod notifier;
pub mod prompt;
pub mod scaffold;

pub use deployer::RepositoryDeployer;
pub use generator::ArtifactGenerator;
pub use notifier::OutcomeNotifier;
