use crate::error::{MonitorError, MonitorResult};
use crate::keyword::{check_length, normalize, normalize_all};
use crate::models::{Keyword, User};
use crate::store::Repository;
use std::sync::Arc;
use tracing::{debug, info};

/// Keyword subscriptions of users, on top of a [`Repository`]
#[derive(Clone)]
pub struct SubscriptionStore {
    repo: Arc<dyn Repository>,
}

impl SubscriptionStore {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    /// Return the keyword for an already-normalized name, creating it if needed
    pub async fn get_or_create_keyword(&self, name: &str) -> MonitorResult<Keyword> {
        let name = normalize(name);
        if name.is_empty() {
            return Err(MonitorError::validation("keyword must not be empty"));
        }
        check_length(&name)?;
        self.repo.get_or_create_keyword(&name).await
    }

    /// Attach keywords to a user, returning only the ones newly attached.
    ///
    /// Blank names are skipped and repeats within the batch count once. The
    /// batch commits as a whole.
    pub async fn add_keywords<S: AsRef<str>>(
        &self,
        user: &User,
        raw_names: &[S],
    ) -> MonitorResult<Vec<Keyword>> {
        let names = normalize_all(raw_names.iter());
        for name in &names {
            check_length(name)?;
        }
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let added = self.repo.attach_keywords(user.id, &names).await?;
        info!(
            telegram_id = %user.telegram_id,
            requested = names.len(),
            added = added.len(),
            "attached keywords"
        );
        Ok(added)
    }

    /// Detach keywords from a user; unknown or unattached names are ignored
    pub async fn remove_keywords<S: AsRef<str>>(
        &self,
        user: &User,
        raw_names: &[S],
    ) -> MonitorResult<Vec<String>> {
        let names = normalize_all(raw_names.iter());
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let removed = self.repo.detach_keywords(user.id, &names).await?;
        debug!(telegram_id = %user.telegram_id, removed = ?removed, "detached keywords");
        Ok(removed)
    }

    /// Keyword names attached to the user, in lexicographic order
    pub async fn list_keywords(&self, user: &User) -> MonitorResult<Vec<String>> {
        let mut names = self.repo.list_keywords(user.id).await?;
        // Database collation may differ from byte order
        names.sort();
        names.dedup();
        Ok(names)
    }
}
