use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::repo_types::{Gender, User};

/// Request body for `POST /users`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub login: String,
    pub password: String,
    pub name: String,
    #[serde(default)]
    pub gender: Gender,
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub birthday: Option<OffsetDateTime>,
    #[serde(default)]
    pub admin: bool,
}

/// Request body for `PUT /users/{login}/profile`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: String,
    #[serde(default)]
    pub gender: Gender,
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub birthday: Option<OffsetDateTime>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeLoginRequest {
    pub new_login: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteParams {
    #[serde(default)]
    pub hard: bool,
}

/// Response of `GET /users/{login}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub gender: Gender,
    #[serde(with = "time::serde::rfc3339::option")]
    pub birthday: Option<OffsetDateTime>,
    pub is_active: bool,
}

impl From<&User> for UserProfile {
    fn from(u: &User) -> Self {
        Self {
            name: u.name.clone(),
            gender: u.gender,
            birthday: u.birthday,
            is_active: u.is_active(),
        }
    }
}

/// Response of `POST /users/authenticate`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticateResponse {
    pub id: Uuid,
    pub login: String,
    pub name: String,
    pub gender: Gender,
    #[serde(with = "time::serde::rfc3339::option")]
    pub birthday: Option<OffsetDateTime>,
    pub admin: bool,
    pub is_active: bool,
}

impl From<User> for AuthenticateResponse {
    fn from(u: User) -> Self {
        let is_active = u.is_active();
        Self {
            id: u.id,
            login: u.login,
            name: u.name,
            gender: u.gender,
            birthday: u.birthday,
            admin: u.admin,
            is_active,
        }
    }
}
