use tracing::{info, warn};

use crate::auth::password::verify_password;
use crate::error::{ApiError, ApiResult};
use crate::users::{repo::UserRepo, repo_types::User};

/// Checks login and password against the store.
///
/// Unknown login, wrong password and revoked account all collapse into
/// `Unauthorized` so callers cannot tell them apart.
pub fn authenticate(users: &dyn UserRepo, login: &str, password: &str) -> ApiResult<User> {
    let Some(user) = users.find_by_login(login) else {
        warn!(%login, "login unknown");
        return Err(ApiError::Unauthorized);
    };

    if !verify_password(password, &user.password_hash)? {
        warn!(%login, user_id = %user.id, "login invalid password");
        return Err(ApiError::Unauthorized);
    }

    if !user.is_active() {
        warn!(%login, user_id = %user.id, "login on revoked account");
        return Err(ApiError::Unauthorized);
    }

    info!(%login, user_id = %user.id, "credentials accepted");
    Ok(user)
}
