//! The external search provider: client, raw payload parsing and the
//! generic tree the payload is normalized into.

mod client;
mod node;
mod xml;

pub use client::XmlProxyClient;
pub use node::ProviderNode;
pub use xml::parse_xml;

use crate::error::{MonitorError, MonitorResult};
use async_trait::async_trait;

/// Source of raw search responses
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run `query` and return the response body.
    ///
    /// Transport failures and non-success statuses are `ProviderTransport` errors.
    async fn fetch(&self, query: &str) -> MonitorResult<String>;
}

/// Parse a raw payload: XML when it starts with `<`, JSON otherwise
pub fn parse_response(raw: &str) -> MonitorResult<ProviderNode> {
    let trimmed = raw.trim_start();
    if trimmed.is_empty() {
        return Err(MonitorError::MalformedResponse("empty response body".to_string()));
    }
    if trimmed.starts_with('<') {
        return parse_xml(trimmed);
    }
    serde_json::from_str::<serde_json::Value>(trimmed)
        .map(ProviderNode::from)
        .map_err(|err| MonitorError::MalformedResponse(format!("invalid JSON: {}", err)))
}
