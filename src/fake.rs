//! In-memory store backing `AppState::fake()` in unit tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::AppError;
use crate::metrics::repo::MetricsRepo;
use crate::roles::Role;
use crate::users::repo::UserRepo;
use crate::users::repo_types::{User, UserRecord};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    events: Vec<(i32, i32)>,  // (id, creator_id)
    tickets: Vec<(i32, i32)>, // (event_id, status_id)
    photos: Vec<i32>,         // event_id
    next_id: i32,
    fail_metrics: bool,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn creator_events(&self, creator_id: i32) -> impl Iterator<Item = i32> + '_ {
        self.events
            .iter()
            .filter(move |(_, c)| *c == creator_id)
            .map(|(id, _)| *id)
    }

    fn check_unique(&self, skip_id: Option<i32>, record: &UserRecord) -> Result<(), AppError> {
        let clash = self.users.iter().filter(|u| Some(u.id) != skip_id).any(|u| {
            u.username == record.username || u.email == record.email
        });
        if clash {
            return Err(AppError::Conflict("username or email already taken".into()));
        }
        Ok(())
    }

    fn check_metrics(&self) -> Result<(), AppError> {
        if self.fail_metrics {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

fn apply(user: &mut User, record: &UserRecord) {
    user.name = record.name.clone();
    user.username = record.username.clone();
    user.email = record.email.clone();
    user.password = record.password.clone();
    user.profile_picture = record.profile_picture.clone();
    user.image_format = record.image_format.clone();
    user.verification_code = record.verification_code.clone();
    user.is_verified = record.is_verified;
}

fn set_role(user: &mut User, role_id: i32) {
    user.role_id = Some(role_id);
    user.role_name = Role::from_id(role_id).map(|r| r.name().to_string());
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a user with a fixed id and a placeholder password.
    pub fn seed_user(&self, id: i32, username: &str, role: Option<Role>) -> User {
        let user = User {
            id,
            name: username.to_string(),
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password: "00000000000000000000000000000000:abcd".into(),
            profile_picture: None,
            image_format: None,
            verification_code: None,
            is_verified: true,
            role_id: role.map(Role::id),
            role_name: role.map(|r| r.name().to_string()),
        };
        let mut t = self.tables.lock().unwrap();
        t.next_id = t.next_id.max(id);
        t.users.push(user.clone());
        user
    }

    pub fn add_event(&self, creator_id: i32) -> i32 {
        let mut t = self.tables.lock().unwrap();
        let id = t.next_id();
        t.events.push((id, creator_id));
        id
    }

    pub fn add_ticket(&self, event_id: i32, status_id: i32) {
        self.tables.lock().unwrap().tickets.push((event_id, status_id));
    }

    pub fn add_photo(&self, event_id: i32) {
        self.tables.lock().unwrap().photos.push(event_id);
    }

    /// Makes every metrics read fail with a database error.
    pub fn fail_metrics(&self) {
        self.tables.lock().unwrap().fail_metrics = true;
    }

    /// Overwrites the stored password column as-is.
    pub fn set_stored_password(&self, id: i32, password: &str) {
        let mut t = self.tables.lock().unwrap();
        if let Some(user) = t.users.iter_mut().find(|u| u.id == id) {
            user.password = password.to_string();
        }
    }

    /// Raw stored row, password included.
    pub fn stored(&self, id: i32) -> Option<User> {
        let t = self.tables.lock().unwrap();
        t.users.iter().find(|u| u.id == id).cloned()
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn insert(&self, record: &UserRecord, role_id: i32) -> Result<User, AppError> {
        let mut t = self.tables.lock().unwrap();
        t.check_unique(None, record)?;
        let mut user = User {
            id: t.next_id(),
            name: String::new(),
            username: String::new(),
            email: String::new(),
            password: String::new(),
            profile_picture: None,
            image_format: None,
            verification_code: None,
            is_verified: false,
            role_id: None,
            role_name: None,
        };
        apply(&mut user, record);
        set_role(&mut user, role_id);
        t.users.push(user.clone());
        Ok(user)
    }

    async fn list(&self) -> Result<Vec<User>, AppError> {
        Ok(self.tables.lock().unwrap().users.clone())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AppError> {
        Ok(self.stored(id))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let t = self.tables.lock().unwrap();
        Ok(t.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let t = self.tables.lock().unwrap();
        Ok(t.users.iter().find(|u| u.username == username).cloned())
    }

    async fn update(&self, id: i32, record: &UserRecord) -> Result<Option<User>, AppError> {
        let mut t = self.tables.lock().unwrap();
        t.check_unique(Some(id), record)?;
        let Some(user) = t.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        apply(user, record);
        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: i32) -> Result<bool, AppError> {
        let mut t = self.tables.lock().unwrap();
        let before = t.users.len();
        t.users.retain(|u| u.id != id);
        Ok(t.users.len() < before)
    }

    async fn set_role_id(&self, id: i32, role_id: i32) -> Result<bool, AppError> {
        let mut t = self.tables.lock().unwrap();
        match t.users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                set_role(user, role_id);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl MetricsRepo for MemoryStore {
    async fn count_attendees(&self, creator_id: i32, status_id: i32) -> Result<i64, AppError> {
        let t = self.tables.lock().unwrap();
        t.check_metrics()?;
        let events: Vec<i32> = t.creator_events(creator_id).collect();
        let n = t
            .tickets
            .iter()
            .filter(|(ev, st)| events.contains(ev) && *st == status_id)
            .count();
        Ok(n as i64)
    }

    async fn count_events(&self, creator_id: i32) -> Result<i64, AppError> {
        let t = self.tables.lock().unwrap();
        t.check_metrics()?;
        Ok(t.creator_events(creator_id).count() as i64)
    }

    async fn count_pictures(&self, creator_id: i32) -> Result<i64, AppError> {
        let t = self.tables.lock().unwrap();
        t.check_metrics()?;
        let events: Vec<i32> = t.creator_events(creator_id).collect();
        Ok(t.photos.iter().filter(|ev| events.contains(ev)).count() as i64)
    }
}
