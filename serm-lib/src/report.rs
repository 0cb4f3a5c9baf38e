use crate::models::{SearchResult, User};
use async_trait::async_trait;
use std::path::PathBuf;

/// Renders search results into a report artifact (for example a PDF).
///
/// Failures are logged by the caller and never fail the search itself.
#[async_trait]
pub trait ReportGenerator: Send + Sync {
    async fn generate(&self, user: &User, results: &[SearchResult]) -> anyhow::Result<PathBuf>;
}
