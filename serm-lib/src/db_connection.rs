use crate::config::DatabaseConfig;
use anyhow::{Context, Result};
use deadpool_postgres::{Config as PgConfig, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime};
use tokio_postgres::NoTls;
use tracing::info;

/// Tables, constraints and indexes, safe to run on every boot
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id            serial PRIMARY KEY,
    name          varchar(50)  NOT NULL,
    surname       varchar(50)  NOT NULL,
    patronymic    varchar(50),
    date_of_birth date,
    telegram_id   varchar(64)  NOT NULL UNIQUE,
    password      varchar(255),
    phone         varchar(16)  NOT NULL UNIQUE,
    phone2        varchar(16)  UNIQUE,
    city          varchar(30)  NOT NULL,
    city2         varchar(30),
    city3         varchar(30),
    link          varchar(200),
    link2         varchar(200),
    link3         varchar(200),
    link4         varchar(200),
    link5         varchar(200),
    created_at    timestamptz  NOT NULL DEFAULT now(),
    updated_at    timestamptz  NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS keywords (
    id         serial PRIMARY KEY,
    name       varchar(50) NOT NULL UNIQUE,
    created_at timestamptz NOT NULL DEFAULT now(),
    updated_at timestamptz NOT NULL DEFAULT now()
);
CREATE UNIQUE INDEX IF NOT EXISTS keywords_name_lower_idx ON keywords (lower(name));

CREATE TABLE IF NOT EXISTS subs (
    users_id integer NOT NULL REFERENCES users (id) ON DELETE CASCADE,
    words_id integer NOT NULL REFERENCES keywords (id) ON DELETE CASCADE,
    PRIMARY KEY (users_id, words_id)
);
CREATE INDEX IF NOT EXISTS subs_words_id_idx ON subs (words_id);
"#;

/// Build a connection pool for the configured database
pub fn create_pool(config: &DatabaseConfig) -> Result<Pool> {
    let mut cfg = PgConfig::new();
    cfg.url = Some(config.url.clone());
    cfg.pool = Some(PoolConfig::new(config.pool_size));
    cfg.manager = Some(ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    });

    cfg.create_pool(Some(Runtime::Tokio1), NoTls)
        .with_context(|| "Failed to create database connection pool")
}

/// Create missing tables and indexes
pub async fn ensure_schema(pool: &Pool) -> Result<()> {
    let client = pool
        .get()
        .await
        .with_context(|| "Failed to acquire database connection")?;
    client
        .batch_execute(SCHEMA_SQL)
        .await
        .with_context(|| "Failed to apply database schema")?;
    info!("database schema is up to date");
    Ok(())
}

/// Test the database connection
pub async fn test_connection(pool: &Pool) -> Result<()> {
    let client = pool
        .get()
        .await
        .with_context(|| "Failed to acquire database connection")?;
    client
        .execute("SELECT 1", &[])
        .await
        .with_context(|| "Failed to test database connection")?;
    Ok(())
}
