//! Core of the SERM monitoring service.
//!
//! Users registered from a Telegram bot subscribe to keywords; a search
//! combines the user's identity with those keywords, queries the XMLProxy
//! search provider and flattens its nested response into [`SearchResult`]s.
//!
//! - [`keyword`]: keyword normalization and the query keyword clause
//! - [`subscriptions`]: the user ↔ keyword relation on top of a [`Repository`]
//! - [`mapper`]: provider response → ordered search results
//! - [`orchestrator`]: query composition and the provider round trip
//! - [`Monitor`]: the operations exposed to the HTTP service and the CLI

mod config;
mod db_connection;
mod error;
mod models;
mod monitor;
mod yaml_parser;

pub mod keyword;
pub mod mapper;
pub mod orchestrator;
pub mod provider;
pub mod report;
pub mod store;
pub mod subscriptions;

pub use config::*;
pub use db_connection::{create_pool, ensure_schema, test_connection, SCHEMA_SQL};
pub use error::{ErrorKind, MonitorError, MonitorResult};
pub use models::*;
pub use monitor::Monitor;
pub use orchestrator::SearchOrchestrator;
pub use provider::{ProviderNode, SearchProvider, XmlProxyClient};
pub use report::ReportGenerator;
pub use store::{MemoryRepository, PgRepository, Repository};
pub use subscriptions::SubscriptionStore;
pub use yaml_parser::*;
