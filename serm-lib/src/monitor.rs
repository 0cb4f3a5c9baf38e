use crate::config::Config;
use crate::db_connection::{create_pool, ensure_schema};
use crate::error::{MonitorError, MonitorResult};
use crate::keyword::{check_length, normalize_all};
use crate::models::{Keyword, NewUser, SearchOutcome, User};
use crate::orchestrator::SearchOrchestrator;
use crate::provider::{SearchProvider, XmlProxyClient};
use crate::report::ReportGenerator;
use crate::store::{PgRepository, Repository};
use crate::subscriptions::SubscriptionStore;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

/// The monitoring core as seen by the HTTP layer and the CLI.
///
/// Users are addressed by their Telegram identifier.
#[derive(Clone)]
pub struct Monitor {
    repo: Arc<dyn Repository>,
    subscriptions: SubscriptionStore,
    orchestrator: SearchOrchestrator,
    reports: Option<Arc<dyn ReportGenerator>>,
}

impl Monitor {
    pub fn new(repo: Arc<dyn Repository>, provider: Arc<dyn SearchProvider>) -> Self {
        Self {
            subscriptions: SubscriptionStore::new(repo.clone()),
            orchestrator: SearchOrchestrator::new(provider),
            repo,
            reports: None,
        }
    }

    /// Connect to PostgreSQL, ensure the schema and build the XMLProxy client
    pub async fn connect(config: &Config) -> anyhow::Result<Self> {
        let pool = create_pool(&config.database)?;
        ensure_schema(&pool).await?;
        let provider = XmlProxyClient::new(config.provider.clone())?;
        Ok(Self::new(
            Arc::new(PgRepository::new(pool)),
            Arc::new(provider),
        ))
    }

    pub fn with_report_generator(mut self, reports: Arc<dyn ReportGenerator>) -> Self {
        self.reports = Some(reports);
        self
    }

    /// Register a user; any unique-key collision is a `Duplicate` error
    pub async fn register(&self, user: NewUser) -> MonitorResult<User> {
        user.validate()?;
        let created = self.repo.create_user(&user).await?;
        info!(telegram_id = %created.telegram_id, "registered user");
        Ok(created)
    }

    pub async fn find_user(&self, telegram_id: &str) -> MonitorResult<Option<User>> {
        require_telegram_id(telegram_id)?;
        self.repo.find_user(telegram_id).await
    }

    pub async fn get_user(&self, telegram_id: &str) -> MonitorResult<User> {
        self.find_user(telegram_id)
            .await?
            .ok_or_else(|| MonitorError::not_found(format!("user {} not found", telegram_id)))
    }

    pub async fn add_keywords<S: AsRef<str> + Sync>(
        &self,
        telegram_id: &str,
        keywords: &[S],
    ) -> MonitorResult<Vec<Keyword>> {
        require_keywords(keywords)?;
        let user = self.get_user(telegram_id).await?;
        self.subscriptions.add_keywords(&user, keywords).await
    }

    pub async fn list_keywords(&self, telegram_id: &str) -> MonitorResult<Vec<String>> {
        let user = self.get_user(telegram_id).await?;
        self.subscriptions.list_keywords(&user).await
    }

    pub async fn remove_keywords<S: AsRef<str> + Sync>(
        &self,
        telegram_id: &str,
        keywords: &[S],
    ) -> MonitorResult<Vec<String>> {
        require_keywords(keywords)?;
        let user = self.get_user(telegram_id).await?;
        self.subscriptions.remove_keywords(&user, keywords).await
    }

    /// Search for a user with explicit keywords, or with the stored ones when
    /// the explicit list normalizes to nothing.
    pub async fn search<S: AsRef<str> + Sync>(
        &self,
        telegram_id: &str,
        keywords: &[S],
        generate_report: bool,
    ) -> MonitorResult<SearchOutcome> {
        let user = self.get_user(telegram_id).await?;

        let mut chosen = normalize_all(keywords.iter());
        for name in &chosen {
            check_length(name)?;
        }
        if chosen.is_empty() {
            chosen = self.subscriptions.list_keywords(&user).await?;
        }
        if chosen.is_empty() {
            return Err(MonitorError::validation("No keywords available"));
        }

        let results = self.orchestrator.search(&user, &chosen).await?;
        let report = if generate_report {
            self.render_report(&user, &results).await
        } else {
            None
        };

        Ok(SearchOutcome {
            results,
            generated_at: Utc::now(),
            report,
        })
    }

    async fn render_report(
        &self,
        user: &User,
        results: &[crate::models::SearchResult],
    ) -> Option<String> {
        let Some(reports) = &self.reports else {
            warn!(telegram_id = %user.telegram_id, "report requested but no generator is configured");
            return None;
        };
        match reports.generate(user, results).await {
            Ok(path) => Some(path.display().to_string()),
            Err(err) => {
                warn!(telegram_id = %user.telegram_id, error = %err, "report generation failed");
                None
            }
        }
    }

    /// Delete a user together with its subscriptions
    pub async fn delete_user(&self, telegram_id: &str) -> MonitorResult<()> {
        require_telegram_id(telegram_id)?;
        if !self.repo.delete_user(telegram_id).await? {
            return Err(MonitorError::not_found(format!("user {} not found", telegram_id)));
        }
        info!(telegram_id, "deleted user");
        Ok(())
    }
}

fn require_telegram_id(telegram_id: &str) -> MonitorResult<()> {
    if telegram_id.trim().is_empty() {
        return Err(MonitorError::validation("telegram_id is required"));
    }
    Ok(())
}

fn require_keywords<S>(keywords: &[S]) -> MonitorResult<()> {
    if keywords.is_empty() {
        return Err(MonitorError::validation("keywords must not be empty"));
    }
    Ok(())
}
