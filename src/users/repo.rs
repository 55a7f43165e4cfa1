use parking_lot::RwLock;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::password::hash_password;
use crate::users::repo_types::{Gender, User};

pub const SEED_ADMIN_LOGIN: &str = "Admin";

/// Storage seam for user records.
///
/// Each call is atomic on its own, but a lookup followed by an `update` is
/// not: two writers racing on the same record leave whichever wrote last.
pub trait UserRepo: Send + Sync {
    /// Inserts without any uniqueness check; callers look the login up first.
    fn add(&self, user: User);
    fn find_by_login(&self, login: &str) -> Option<User>;
    fn find_by_id(&self, id: Uuid) -> Option<User>;
    /// Active users ordered by creation time, oldest first.
    fn list_active(&self) -> Vec<User>;
    /// Active users with a birthday at least `age` years before `now`.
    fn list_older_than(&self, age: u32, now: OffsetDateTime) -> Vec<User>;
    /// Replaces the record with the same id. No-op when absent.
    fn update(&self, user: User);
    /// Removes the record with this id. No-op when absent.
    fn remove(&self, id: Uuid);
}

#[derive(Default)]
pub struct InMemoryUserRepo {
    users: RwLock<Vec<User>>,
}

impl InMemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding only the bootstrap administrator.
    pub fn seeded(admin_password: &str) -> anyhow::Result<Self> {
        let repo = Self::new();
        repo.add(User {
            id: Uuid::new_v4(),
            login: SEED_ADMIN_LOGIN.to_string(),
            password_hash: hash_password(admin_password)?,
            name: "Administrator".to_string(),
            gender: Gender::Unknown,
            birthday: None,
            admin: true,
            created_on: OffsetDateTime::now_utc(),
            created_by: "system".to_string(),
            modified_on: None,
            modified_by: None,
            revoked_on: None,
            revoked_by: None,
        });
        Ok(repo)
    }
}

impl UserRepo for InMemoryUserRepo {
    fn add(&self, user: User) {
        self.users.write().push(user);
    }

    fn find_by_login(&self, login: &str) -> Option<User> {
        self.users.read().iter().find(|u| u.login == login).cloned()
    }

    fn find_by_id(&self, id: Uuid) -> Option<User> {
        self.users.read().iter().find(|u| u.id == id).cloned()
    }

    fn list_active(&self) -> Vec<User> {
        let mut active: Vec<User> = self
            .users
            .read()
            .iter()
            .filter(|u| u.is_active())
            .cloned()
            .collect();
        active.sort_by_key(|u| u.created_on);
        active
    }

    fn list_older_than(&self, age: u32, now: OffsetDateTime) -> Vec<User> {
        self.users
            .read()
            .iter()
            .filter(|u| u.is_active())
            .filter(|u| match u.birthday {
                Some(b) => add_years(b, age).is_some_and(|aged| aged <= now),
                None => false,
            })
            .cloned()
            .collect()
    }

    fn update(&self, user: User) {
        let mut users = self.users.write();
        if let Some(slot) = users.iter_mut().find(|u| u.id == user.id) {
            *slot = user;
        }
    }

    fn remove(&self, id: Uuid) {
        self.users.write().retain(|u| u.id != id);
    }
}

/// Calendar-year addition; Feb 29 lands on Feb 28 in non-leap years.
/// `None` when the result leaves the supported date range.
fn add_years(dt: OffsetDateTime, years: u32) -> Option<OffsetDateTime> {
    let year = dt.year().checked_add(i32::try_from(years).ok()?)?;
    match dt.replace_year(year) {
        Ok(shifted) => Some(shifted),
        Err(_) => dt.replace_day(28).ok()?.replace_year(year).ok(),
    }
}
