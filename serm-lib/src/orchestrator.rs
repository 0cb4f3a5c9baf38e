use crate::error::{MonitorError, MonitorResult};
use crate::keyword::keyword_clause;
use crate::mapper::map_response;
use crate::models::{SearchResult, User};
use crate::provider::{parse_response, SearchProvider};
use std::sync::Arc;
use tracing::{info, warn};

/// Stateless search pipeline: query composition, provider call, mapping
#[derive(Clone)]
pub struct SearchOrchestrator {
    provider: Arc<dyn SearchProvider>,
}

impl SearchOrchestrator {
    pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
        Self { provider }
    }

    /// `"<name surname [patronymic]> <keyword clause>"`
    pub fn build_query(user: &User, keyword_clause: &str) -> String {
        format!("{} {}", user.display_name(), keyword_clause)
    }

    /// Search the provider for `user` combined with `keywords`.
    ///
    /// Fails with a validation error, before any provider call, when the
    /// keywords normalize to nothing.
    pub async fn search<S: AsRef<str>>(
        &self,
        user: &User,
        keywords: &[S],
    ) -> MonitorResult<Vec<SearchResult>> {
        let clause = keyword_clause(keywords.iter());
        if clause.is_empty() {
            return Err(MonitorError::validation("No keywords available"));
        }
        let query = Self::build_query(user, &clause);

        let raw = self.provider.fetch(&query).await.map_err(|err| {
            warn!(telegram_id = %user.telegram_id, error = %err, "search failed");
            err
        })?;

        let root = parse_response(&raw)?;
        let results = map_response(&root, &clause).map_err(|err| {
            warn!(telegram_id = %user.telegram_id, error = %err, "could not map provider response");
            err
        })?;

        info!(
            telegram_id = %user.telegram_id,
            keywords = %clause,
            results = results.len(),
            "search complete"
        );
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use parking_lot::Mutex;

    /// Provider answering with a canned body and remembering every query
    struct CannedProvider {
        body: MonitorResult<String>,
        queries: Mutex<Vec<String>>,
    }

    impl CannedProvider {
        fn new(body: MonitorResult<String>) -> Arc<Self> {
            Arc::new(Self {
                body,
                queries: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl SearchProvider for CannedProvider {
        async fn fetch(&self, query: &str) -> MonitorResult<String> {
            self.queries.lock().push(query.to_string());
            match &self.body {
                Ok(body) => Ok(body.clone()),
                Err(MonitorError::ProviderTransport { status, message }) => {
                    Err(MonitorError::ProviderTransport {
                        status: *status,
                        message: message.clone(),
                    })
                }
                Err(other) => Err(MonitorError::Storage(other.to_string())),
            }
        }
    }

    fn user(patronymic: Option<&str>) -> User {
        let now = Utc::now();
        User {
            id: 1,
            name: "Ivan".to_string(),
            surname: "Petrov".to_string(),
            patronymic: patronymic.map(str::to_string),
            date_of_birth: None,
            telegram_id: "t1".to_string(),
            password: None,
            phone: "+79990001122".to_string(),
            phone2: None,
            city: "Moscow".to_string(),
            city2: None,
            city3: None,
            link: None,
            link2: None,
            link3: None,
            link4: None,
            link5: None,
            created_at: now,
            updated_at: now,
        }
    }

    const ONE_RESULT: &str = r#"{"yandexsearch": {"response": {"results": {"grouping": {"group": {"doc": {"url": "https://x.example", "headline": "X"}}}}}}}"#;

    #[test]
    fn test_build_query() {
        assert_eq!(
            SearchOrchestrator::build_query(&user(Some("Sergeevich")), "bar,foo"),
            "Ivan Petrov Sergeevich bar,foo"
        );
        assert_eq!(SearchOrchestrator::build_query(&user(None), "foo"), "Ivan Petrov foo");
        assert_eq!(SearchOrchestrator::build_query(&user(Some("  ")), "foo"), "Ivan Petrov foo");
    }

    #[tokio::test]
    async fn test_query_uses_sorted_unique_keywords() {
        let provider = CannedProvider::new(Ok(ONE_RESULT.to_string()));
        let orchestrator = SearchOrchestrator::new(provider.clone());

        let results = orchestrator
            .search(&user(None), &["Foo", " bar ", "foo", ""])
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(provider.queries.lock().as_slice(), ["Ivan Petrov bar,foo"]);
    }

    #[tokio::test]
    async fn test_no_keywords_skips_provider() {
        let provider = CannedProvider::new(Ok(ONE_RESULT.to_string()));
        let orchestrator = SearchOrchestrator::new(provider.clone());

        let err = orchestrator.search(&user(None), &["  "]).await.unwrap_err();
        assert!(matches!(err, MonitorError::Validation(_)));
        assert!(provider.queries.lock().is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_is_distinct() {
        let provider = CannedProvider::new(Err(MonitorError::ProviderTransport {
            status: Some(502),
            message: "bad gateway".to_string(),
        }));
        let orchestrator = SearchOrchestrator::new(provider);

        let err = orchestrator.search(&user(None), &["foo"]).await.unwrap_err();
        assert!(matches!(
            err,
            MonitorError::ProviderTransport { status: Some(502), .. }
        ));
    }

    #[tokio::test]
    async fn test_malformed_response_is_not_empty_success() {
        for body in ["{\"unexpected\": true}", "<html><body>captcha</body></html>", "garbage"] {
            let orchestrator = SearchOrchestrator::new(CannedProvider::new(Ok(body.to_string())));
            let err = orchestrator.search(&user(None), &["foo"]).await.unwrap_err();
            assert!(
                matches!(err, MonitorError::MalformedResponse(_)),
                "{} gave {:?}",
                body,
                err
            );
        }
    }
}
