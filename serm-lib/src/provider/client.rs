use super::SearchProvider;
use crate::config::ProviderConfig;
use crate::error::{MonitorError, MonitorResult};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Instant;
use tracing::{info, warn};

/// Longest slice of an error body carried into the error message
const ERROR_BODY_LIMIT: usize = 200;

/// HTTP client for the XMLProxy search API
#[derive(Clone)]
pub struct XmlProxyClient {
    http: reqwest::Client,
    config: ProviderConfig,
}

impl XmlProxyClient {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .with_context(|| "Failed to build search provider HTTP client")?;
        Ok(Self { http, config })
    }

    fn query_params<'a>(&'a self, query: &'a str) -> Vec<(&'static str, &'a str)> {
        let mut params = Vec::with_capacity(3);
        if let Some(user) = &self.config.user {
            params.push(("user", user.as_str()));
        }
        if let Some(key) = &self.config.key {
            params.push(("key", key.as_str()));
        }
        params.push(("query", query));
        params
    }
}

#[async_trait]
impl SearchProvider for XmlProxyClient {
    async fn fetch(&self, query: &str) -> MonitorResult<String> {
        let started = Instant::now();
        info!(query, "querying search provider");

        let response = self
            .http
            .get(&self.config.url)
            .query(&self.query_params(query))
            .send()
            .await
            .map_err(|err| {
                warn!(error = %err, elapsed_ms = started.elapsed().as_millis() as u64, "search provider unreachable");
                MonitorError::from(err)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let excerpt: String = body.trim().chars().take(ERROR_BODY_LIMIT).collect();
            warn!(status = status.as_u16(), "search provider returned an error status");
            return Err(MonitorError::ProviderTransport {
                status: Some(status.as_u16()),
                message: if excerpt.is_empty() {
                    status.to_string()
                } else {
                    format!("{}: {}", status, excerpt)
                },
            });
        }

        let body = response.text().await?;
        info!(
            bytes = body.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "search provider answered"
        );
        Ok(body)
    }
}
