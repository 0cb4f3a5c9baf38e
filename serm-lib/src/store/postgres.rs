use super::Repository;
use crate::error::{MonitorError, MonitorResult};
use crate::models::{Keyword, NewUser, User};
use async_trait::async_trait;
use deadpool_postgres::Pool;
use tokio_postgres::error::SqlState;
use tokio_postgres::{Client, Row, Transaction};
use tracing::debug;

const USER_COLUMNS: &str = "id, name, surname, patronymic, date_of_birth, telegram_id, password, \
     phone, phone2, city, city2, city3, link, link2, link3, link4, link5, created_at, updated_at";

const KEYWORD_COLUMNS: &str = "id, name, created_at, updated_at";

/// PostgreSQL-backed repository using a deadpool connection pool
#[derive(Clone)]
pub struct PgRepository {
    pool: Pool,
}

impl PgRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &Row) -> User {
    User {
        id: row.get("id"),
        name: row.get("name"),
        surname: row.get("surname"),
        patronymic: row.get("patronymic"),
        date_of_birth: row.get("date_of_birth"),
        telegram_id: row.get("telegram_id"),
        password: row.get("password"),
        phone: row.get("phone"),
        phone2: row.get("phone2"),
        city: row.get("city"),
        city2: row.get("city2"),
        city3: row.get("city3"),
        link: row.get("link"),
        link2: row.get("link2"),
        link3: row.get("link3"),
        link4: row.get("link4"),
        link5: row.get("link5"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn keyword_from_row(row: &Row) -> Keyword {
    Keyword {
        id: row.get("id"),
        name: row.get("name"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Translate a unique violation on `users` into a `Duplicate` error
fn registration_error(err: tokio_postgres::Error) -> MonitorError {
    if err.code() != Some(&SqlState::UNIQUE_VIOLATION) {
        return err.into();
    }
    let constraint = err
        .as_db_error()
        .and_then(|db| db.constraint())
        .unwrap_or_default();
    let column = constraint
        .trim_start_matches("users_")
        .trim_end_matches("_key");
    if column == "telegram_id" || column.is_empty() {
        MonitorError::Duplicate("User already exists.".to_string())
    } else {
        MonitorError::Duplicate(format!("{} is already registered", column))
    }
}

/// Concurrent batches must touch keyword rows in one global order or they deadlock
fn lock_order(names: &[String]) -> Vec<&String> {
    let mut ordered: Vec<&String> = names.iter().collect();
    ordered.sort();
    ordered.dedup();
    ordered
}

/// Insert-on-conflict-do-nothing, then re-select in a fresh statement snapshot
async fn get_or_create_in(tx: &Transaction<'_>, name: &str) -> Result<Keyword, tokio_postgres::Error> {
    let insert = format!(
        "INSERT INTO keywords (name) VALUES ($1) ON CONFLICT DO NOTHING RETURNING {}",
        KEYWORD_COLUMNS
    );
    if let Some(row) = tx.query_opt(insert.as_str(), &[&name]).await? {
        debug!(keyword = name, "created keyword");
        return Ok(keyword_from_row(&row));
    }

    let select = format!(
        "SELECT {} FROM keywords WHERE lower(name) = lower($1)",
        KEYWORD_COLUMNS
    );
    let row = tx.query_one(select.as_str(), &[&name]).await?;
    Ok(keyword_from_row(&row))
}

#[async_trait]
impl Repository for PgRepository {
    async fn create_user(&self, user: &NewUser) -> MonitorResult<User> {
        let client = self.pool.get().await?;
        let sql = format!(
            "INSERT INTO users (name, surname, patronymic, date_of_birth, telegram_id, password, \
             phone, phone2, city, city2, city3, link, link2, link3, link4, link5) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16) \
             RETURNING {}",
            USER_COLUMNS
        );
        let row = client
            .query_one(
                sql.as_str(),
                &[
                    &user.name,
                    &user.surname,
                    &user.patronymic,
                    &user.date_of_birth,
                    &user.telegram_id,
                    &user.password,
                    &user.phone,
                    &user.phone2,
                    &user.city,
                    &user.city2,
                    &user.city3,
                    &user.link,
                    &user.link2,
                    &user.link3,
                    &user.link4,
                    &user.link5,
                ],
            )
            .await
            .map_err(registration_error)?;
        Ok(user_from_row(&row))
    }

    async fn find_user(&self, telegram_id: &str) -> MonitorResult<Option<User>> {
        let client = self.pool.get().await?;
        let sql = format!("SELECT {} FROM users WHERE telegram_id = $1", USER_COLUMNS);
        let row = client.query_opt(sql.as_str(), &[&telegram_id]).await?;
        Ok(row.as_ref().map(user_from_row))
    }

    async fn delete_user(&self, telegram_id: &str) -> MonitorResult<bool> {
        let client = self.pool.get().await?;
        let deleted = client
            .execute("DELETE FROM users WHERE telegram_id = $1", &[&telegram_id])
            .await?;
        Ok(deleted > 0)
    }

    async fn find_keyword(&self, name: &str) -> MonitorResult<Option<Keyword>> {
        let client = self.pool.get().await?;
        let sql = format!(
            "SELECT {} FROM keywords WHERE lower(name) = lower($1)",
            KEYWORD_COLUMNS
        );
        let row = client.query_opt(sql.as_str(), &[&name]).await?;
        Ok(row.as_ref().map(keyword_from_row))
    }

    async fn get_or_create_keyword(&self, name: &str) -> MonitorResult<Keyword> {
        let mut conn = self.pool.get().await?;
        let client: &mut Client = &mut conn;
        let tx = client.transaction().await?;
        let keyword = get_or_create_in(&tx, name).await?;
        tx.commit().await?;
        Ok(keyword)
    }

    async fn attach_keywords(&self, user_id: i32, names: &[String]) -> MonitorResult<Vec<Keyword>> {
        let mut conn = self.pool.get().await?;
        let client: &mut Client = &mut conn;
        let tx = client.transaction().await?;

        let mut added = Vec::new();
        for name in lock_order(names) {
            let keyword = get_or_create_in(&tx, name).await?;
            let attached = tx
                .execute(
                    "INSERT INTO subs (users_id, words_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
                    &[&user_id, &keyword.id],
                )
                .await?;
            if attached > 0 {
                added.push(keyword);
            }
        }

        // Dropping an uncommitted transaction rolls the whole batch back
        tx.commit().await?;
        Ok(added)
    }

    async fn detach_keywords(&self, user_id: i32, names: &[String]) -> MonitorResult<Vec<String>> {
        let mut conn = self.pool.get().await?;
        let client: &mut Client = &mut conn;
        let tx = client.transaction().await?;

        let mut removed = Vec::new();
        for name in lock_order(names) {
            let row = tx
                .query_opt(
                    "DELETE FROM subs USING keywords \
                     WHERE subs.words_id = keywords.id AND subs.users_id = $1 \
                     AND lower(keywords.name) = lower($2) \
                     RETURNING keywords.name",
                    &[&user_id, &name],
                )
                .await?;
            if let Some(row) = row {
                removed.push(row.get::<_, String>(0));
            }
        }

        tx.commit().await?;
        Ok(removed)
    }

    async fn list_keywords(&self, user_id: i32) -> MonitorResult<Vec<String>> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                "SELECT k.name FROM keywords k JOIN subs s ON s.words_id = k.id \
                 WHERE s.users_id = $1 ORDER BY k.name",
                &[&user_id],
            )
            .await?;
        Ok(rows.into_iter().map(|row| row.get::<_, String>(0)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_order_is_sorted_and_unique() {
        let forward: Vec<String> = ["kw_0", "kw_2", "kw_1"].iter().map(|s| s.to_string()).collect();
        let backward: Vec<String> = ["kw_1", "kw_2", "kw_0", "kw_1"].iter().map(|s| s.to_string()).collect();
        assert_eq!(lock_order(&forward), vec!["kw_0", "kw_1", "kw_2"]);
        assert_eq!(lock_order(&forward), lock_order(&backward));
    }
}
