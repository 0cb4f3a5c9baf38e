use super::Repository;
use crate::error::{MonitorError, MonitorResult};
use crate::models::{Keyword, NewUser, User};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Default)]
struct State {
    users: BTreeMap<i32, User>,
    keywords: BTreeMap<i32, Keyword>,
    /// (user id, keyword id)
    subs: BTreeSet<(i32, i32)>,
    next_user_id: i32,
    next_keyword_id: i32,
}

impl State {
    fn keyword_id(&self, name: &str) -> Option<i32> {
        let name = name.to_lowercase();
        self.keywords
            .values()
            .find(|k| k.name.to_lowercase() == name)
            .map(|k| k.id)
    }

    fn get_or_create_keyword(&mut self, name: &str) -> Keyword {
        if let Some(id) = self.keyword_id(name) {
            return self.keywords[&id].clone();
        }
        self.next_keyword_id += 1;
        let now = Utc::now();
        let keyword = Keyword {
            id: self.next_keyword_id,
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.keywords.insert(keyword.id, keyword.clone());
        keyword
    }

    fn check_unique(&self, user: &NewUser) -> MonitorResult<()> {
        for existing in self.users.values() {
            if existing.telegram_id == user.telegram_id {
                return Err(MonitorError::Duplicate("User already exists.".to_string()));
            }
            if existing.phone == user.phone {
                return Err(MonitorError::Duplicate("phone is already registered".to_string()));
            }
            // NULLs never collide, matching the Postgres UNIQUE semantics
            if user.phone2.is_some() && existing.phone2 == user.phone2 {
                return Err(MonitorError::Duplicate("phone2 is already registered".to_string()));
            }
        }
        Ok(())
    }
}

/// In-process repository; every operation runs under one lock, so batches are atomic
#[derive(Default)]
pub struct MemoryRepository {
    state: Mutex<State>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keywords, orphans included
    pub fn keyword_count(&self) -> usize {
        self.state.lock().keywords.len()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn create_user(&self, user: &NewUser) -> MonitorResult<User> {
        let mut state = self.state.lock();
        state.check_unique(user)?;

        state.next_user_id += 1;
        let now = Utc::now();
        let created = User {
            id: state.next_user_id,
            name: user.name.clone(),
            surname: user.surname.clone(),
            patronymic: user.patronymic.clone(),
            date_of_birth: user.date_of_birth,
            telegram_id: user.telegram_id.clone(),
            password: user.password.clone(),
            phone: user.phone.clone(),
            phone2: user.phone2.clone(),
            city: user.city.clone(),
            city2: user.city2.clone(),
            city3: user.city3.clone(),
            link: user.link.clone(),
            link2: user.link2.clone(),
            link3: user.link3.clone(),
            link4: user.link4.clone(),
            link5: user.link5.clone(),
            created_at: now,
            updated_at: now,
        };
        state.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_user(&self, telegram_id: &str) -> MonitorResult<Option<User>> {
        let state = self.state.lock();
        Ok(state
            .users
            .values()
            .find(|u| u.telegram_id == telegram_id)
            .cloned())
    }

    async fn delete_user(&self, telegram_id: &str) -> MonitorResult<bool> {
        let mut state = self.state.lock();
        let id = match state.users.values().find(|u| u.telegram_id == telegram_id) {
            Some(user) => user.id,
            None => return Ok(false),
        };
        state.users.remove(&id);
        state.subs.retain(|(user_id, _)| *user_id != id);
        Ok(true)
    }

    async fn find_keyword(&self, name: &str) -> MonitorResult<Option<Keyword>> {
        let state = self.state.lock();
        Ok(state.keyword_id(name).map(|id| state.keywords[&id].clone()))
    }

    async fn get_or_create_keyword(&self, name: &str) -> MonitorResult<Keyword> {
        Ok(self.state.lock().get_or_create_keyword(name))
    }

    async fn attach_keywords(&self, user_id: i32, names: &[String]) -> MonitorResult<Vec<Keyword>> {
        let mut state = self.state.lock();
        if !state.users.contains_key(&user_id) {
            return Err(MonitorError::Storage(format!("user {} does not exist", user_id)));
        }

        let mut added = Vec::new();
        for name in names {
            let keyword = state.get_or_create_keyword(name);
            if state.subs.insert((user_id, keyword.id)) {
                added.push(keyword);
            }
        }
        Ok(added)
    }

    async fn detach_keywords(&self, user_id: i32, names: &[String]) -> MonitorResult<Vec<String>> {
        let mut state = self.state.lock();
        let mut removed = Vec::new();
        for name in names {
            if let Some(id) = state.keyword_id(name) {
                if state.subs.remove(&(user_id, id)) {
                    removed.push(state.keywords[&id].name.clone());
                }
            }
        }
        Ok(removed)
    }

    async fn list_keywords(&self, user_id: i32) -> MonitorResult<Vec<String>> {
        let state = self.state.lock();
        Ok(state
            .subs
            .iter()
            .filter(|(owner, _)| *owner == user_id)
            .map(|(_, keyword_id)| state.keywords[keyword_id].name.clone())
            .collect())
    }
}
