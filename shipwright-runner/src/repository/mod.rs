//! Repository layer
//!
//! Repositories are thin adapters over the upstream HTTP clients. They hold
//! no pipeline logic; their job is to report every failure as an
//! [`UpstreamError`](crate::error::UpstreamError) the services can branch on.
//!
//! All repositories are trait-based so the services can be exercised against
//! in-memory fakes.

mod callback;
mod completion;
mod source_control;

// Re-export traits
pub use callback::CallbackRepository;
pub use completion::CompletionRepository;
pub use source_control::SourceControlRepository;

// Re-export implementations
pub use callback::HttpCallbackRepository;
pub use completion::HttpCompletionRepository;
pub use source_control::HttpSourceControlRepository;
