use serde::{Deserialize, Serialize};

/// Role claim carried in the token.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn for_admin_flag(admin: bool) -> Self {
        if admin {
            Role::Admin
        } else {
            Role::User
        }
    }
}

/// JWT payload used for authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,  // user id
    pub name: String, // login at issuance
    pub role: Role,
    pub iat: usize,
    pub exp: usize,
    pub iss: String,
    pub aud: String,
}
