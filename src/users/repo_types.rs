use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Gender code as stored and exchanged over JSON: 0 female, 1 male, 2 unknown.
/// An omitted code reads as 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Gender {
    #[default]
    Female,
    Male,
    Unknown,
}

impl TryFrom<u8> for Gender {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Gender::Female),
            1 => Ok(Gender::Male),
            2 => Ok(Gender::Unknown),
            other => Err(format!("unknown gender code {other}")),
        }
    }
}

impl From<Gender> for u8 {
    fn from(g: Gender) -> Self {
        match g {
            Gender::Female => 0,
            Gender::Male => 1,
            Gender::Unknown => 2,
        }
    }
}

/// User record held by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub login: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String, // Argon2 hash, not exposed in JSON
    pub name: String,
    pub gender: Gender,
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub birthday: Option<OffsetDateTime>,
    pub admin: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_on: OffsetDateTime,
    pub created_by: String,
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub modified_on: Option<OffsetDateTime>,
    pub modified_by: Option<String>,
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub revoked_on: Option<OffsetDateTime>,
    pub revoked_by: Option<String>,
}

impl User {
    pub fn is_active(&self) -> bool {
        self.revoked_on.is_none()
    }

    /// Stamps the modification fields with `now` and the acting login.
    pub fn touch(&mut self, by: &str, now: OffsetDateTime) {
        self.modified_on = Some(now);
        self.modified_by = Some(by.to_string());
    }
}
