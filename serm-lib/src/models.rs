use crate::error::{MonitorError, MonitorResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A monitored person registered through the Telegram bot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub surname: String,
    pub patronymic: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub telegram_id: String,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub phone: String,
    pub phone2: Option<String>,
    pub city: String,
    pub city2: Option<String>,
    pub city3: Option<String>,
    pub link: Option<String>,
    pub link2: Option<String>,
    pub link3: Option<String>,
    pub link4: Option<String>,
    pub link5: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Name, surname and patronymic joined with single spaces
    pub fn display_name(&self) -> String {
        [
            Some(self.name.as_str()),
            Some(self.surname.as_str()),
            self.patronymic.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }
}

/// Registration payload for a new user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub surname: String,
    #[serde(default)]
    pub patronymic: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    pub telegram_id: String,
    #[serde(default)]
    pub password: Option<String>,
    pub phone: String,
    #[serde(default)]
    pub phone2: Option<String>,
    pub city: String,
    #[serde(default)]
    pub city2: Option<String>,
    #[serde(default)]
    pub city3: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub link2: Option<String>,
    #[serde(default)]
    pub link3: Option<String>,
    #[serde(default)]
    pub link4: Option<String>,
    #[serde(default)]
    pub link5: Option<String>,
}

impl NewUser {
    /// Check every field against the column limits, reporting all violations at once
    pub fn validate(&self) -> MonitorResult<()> {
        let mut problems = Vec::new();

        check_required(&mut problems, "name", &self.name, 1, 50);
        check_required(&mut problems, "surname", &self.surname, 1, 50);
        check_optional(&mut problems, "patronymic", &self.patronymic, 50);
        check_required(&mut problems, "telegram_id", &self.telegram_id, 1, 64);
        check_optional(&mut problems, "password", &self.password, 255);
        check_required(&mut problems, "phone", &self.phone, 5, 16);
        check_optional(&mut problems, "phone2", &self.phone2, 16);
        check_required(&mut problems, "city", &self.city, 1, 30);
        check_optional(&mut problems, "city2", &self.city2, 30);
        check_optional(&mut problems, "city3", &self.city3, 30);
        for (field, value) in [
            ("link", &self.link),
            ("link2", &self.link2),
            ("link3", &self.link3),
            ("link4", &self.link4),
            ("link5", &self.link5),
        ] {
            check_optional(&mut problems, field, value, 200);
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(MonitorError::Validation(problems.join("; ")))
        }
    }
}

fn check_required(problems: &mut Vec<String>, field: &str, value: &str, min: usize, max: usize) {
    let len = value.chars().count();
    if len < min || len > max {
        problems.push(format!(
            "{}: length must be between {} and {}",
            field, min, max
        ));
    }
}

fn check_optional(problems: &mut Vec<String>, field: &str, value: &Option<String>, max: usize) {
    if let Some(value) = value {
        if value.chars().count() > max {
            problems.push(format!("{}: longer than maximum length {}", field, max));
        }
    }
}

/// A normalized keyword shared by every user subscribed to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Keyword {
    pub id: i32,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One flattened entry of a provider response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: usize,
    pub url: Option<String>,
    pub snippet: String,
    pub headline: String,
}

/// Everything a completed search produced
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub results: Vec<SearchResult>,
    pub generated_at: DateTime<Utc>,
    pub report: Option<String>,
}
