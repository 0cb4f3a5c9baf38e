//! Persistence for users, keywords and the subscriptions joining them.
//!
//! `Repository` is the seam the core talks to. Every method is a single
//! atomic unit: batch attach/detach either fully commit or fail with
//! [`MonitorError::Storage`](crate::MonitorError::Storage).

mod memory;
mod postgres;

pub use memory::MemoryRepository;
pub use postgres::PgRepository;

use crate::error::MonitorResult;
use crate::models::{Keyword, NewUser, User};
use async_trait::async_trait;

#[async_trait]
pub trait Repository: Send + Sync {
    /// Insert a user; unique collisions surface as `Duplicate`
    async fn create_user(&self, user: &NewUser) -> MonitorResult<User>;

    async fn find_user(&self, telegram_id: &str) -> MonitorResult<Option<User>>;

    /// Delete a user and its subscriptions, returning whether it existed
    async fn delete_user(&self, telegram_id: &str) -> MonitorResult<bool>;

    /// Case-insensitive lookup on the normalized name
    async fn find_keyword(&self, name: &str) -> MonitorResult<Option<Keyword>>;

    /// Return the keyword with this name, creating it when missing
    async fn get_or_create_keyword(&self, name: &str) -> MonitorResult<Keyword>;

    /// Get-or-create every name and attach it to the user in one transaction.
    ///
    /// Returns only the keywords that were not attached before the call.
    async fn attach_keywords(&self, user_id: i32, names: &[String]) -> MonitorResult<Vec<Keyword>>;

    /// Detach the named keywords in one transaction, returning the names removed
    async fn detach_keywords(&self, user_id: i32, names: &[String]) -> MonitorResult<Vec<String>>;

    /// Names of every keyword attached to the user
    async fn list_keywords(&self, user_id: i32) -> MonitorResult<Vec<String>>;
}
