//! User management operations.
//!
//! Every function receives the store and the acting principal explicitly;
//! handlers only translate HTTP into these calls.

use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{extractors::Principal, password::hash_password};
use crate::error::{ApiError, ApiResult};
use crate::users::{
    dto::{
        ChangeLoginRequest, ChangePasswordRequest, CreateUserRequest, UpdateProfileRequest,
        UserProfile,
    },
    repo::UserRepo,
    repo_types::User,
    validation::{is_valid_login, is_valid_name, is_valid_password},
};

fn require_admin(actor: &Principal) -> ApiResult<()> {
    if actor.is_admin() {
        Ok(())
    } else {
        warn!(login = %actor.login, "admin role required");
        Err(ApiError::Forbidden)
    }
}

/// Resolves an active target the actor may modify: 404 first, then 403.
fn editable_target(users: &dyn UserRepo, actor: &Principal, login: &str) -> ApiResult<User> {
    let user = users
        .find_by_login(login)
        .filter(User::is_active)
        .ok_or(ApiError::NotFound)?;
    if !actor.may_act_on(login) {
        warn!(actor = %actor.login, target = %login, "self-service on another user");
        return Err(ApiError::Forbidden);
    }
    Ok(user)
}

pub fn create_user(
    users: &dyn UserRepo,
    actor: &Principal,
    req: CreateUserRequest,
) -> ApiResult<User> {
    require_admin(actor)?;

    if users.find_by_login(&req.login).is_some() {
        return Err(ApiError::validation("Login already exists"));
    }
    if !is_valid_login(&req.login) || !is_valid_password(&req.password) || !is_valid_name(&req.name)
    {
        return Err(ApiError::validation(
            "Invalid characters in login, password or name",
        ));
    }

    let user = User {
        id: Uuid::new_v4(),
        login: req.login,
        password_hash: hash_password(&req.password)?,
        name: req.name,
        gender: req.gender,
        birthday: req.birthday,
        admin: req.admin,
        created_on: OffsetDateTime::now_utc(),
        created_by: actor.login.clone(),
        modified_on: None,
        modified_by: None,
        revoked_on: None,
        revoked_by: None,
    };
    users.add(user.clone());

    info!(user_id = %user.id, login = %user.login, by = %actor.login, "user created");
    Ok(user)
}

pub fn update_profile(
    users: &dyn UserRepo,
    actor: &Principal,
    login: &str,
    req: UpdateProfileRequest,
) -> ApiResult<()> {
    let mut user = editable_target(users, actor, login)?;
    if !is_valid_name(&req.name) {
        return Err(ApiError::validation("Invalid characters in name"));
    }

    user.name = req.name;
    user.gender = req.gender;
    user.birthday = req.birthday;
    user.touch(&actor.login, OffsetDateTime::now_utc());
    users.update(user);

    info!(%login, by = %actor.login, "profile updated");
    Ok(())
}

pub fn change_password(
    users: &dyn UserRepo,
    actor: &Principal,
    login: &str,
    req: ChangePasswordRequest,
) -> ApiResult<()> {
    let mut user = editable_target(users, actor, login)?;
    if !is_valid_password(&req.new_password) {
        return Err(ApiError::validation("Invalid characters in password"));
    }

    user.password_hash = hash_password(&req.new_password)?;
    user.touch(&actor.login, OffsetDateTime::now_utc());
    users.update(user);

    info!(%login, by = %actor.login, "password changed");
    Ok(())
}

pub fn change_login(
    users: &dyn UserRepo,
    actor: &Principal,
    login: &str,
    req: ChangeLoginRequest,
) -> ApiResult<()> {
    let mut user = editable_target(users, actor, login)?;
    if users.find_by_login(&req.new_login).is_some() {
        return Err(ApiError::validation("New login already exists"));
    }
    if !is_valid_login(&req.new_login) {
        return Err(ApiError::validation("Invalid characters in login"));
    }

    user.login = req.new_login;
    user.touch(&actor.login, OffsetDateTime::now_utc());
    info!(old = %login, new = %user.login, by = %actor.login, "login changed");
    users.update(user);
    Ok(())
}

pub fn list_active(users: &dyn UserRepo, actor: &Principal) -> ApiResult<Vec<User>> {
    require_admin(actor)?;
    Ok(users.list_active())
}

pub fn get_profile(users: &dyn UserRepo, actor: &Principal, login: &str) -> ApiResult<UserProfile> {
    require_admin(actor)?;
    let user = users.find_by_login(login).ok_or(ApiError::NotFound)?;
    Ok(UserProfile::from(&user))
}

pub fn list_older_than(users: &dyn UserRepo, actor: &Principal, age: u32) -> ApiResult<Vec<User>> {
    require_admin(actor)?;
    Ok(users.list_older_than(age, OffsetDateTime::now_utc()))
}

/// Soft delete marks the record revoked; hard delete purges it.
pub fn delete_user(
    users: &dyn UserRepo,
    actor: &Principal,
    login: &str,
    hard: bool,
) -> ApiResult<()> {
    require_admin(actor)?;
    let mut user = users.find_by_login(login).ok_or(ApiError::NotFound)?;

    if hard {
        users.remove(user.id);
        info!(%login, by = %actor.login, "user purged");
    } else {
        user.revoked_on = Some(OffsetDateTime::now_utc());
        user.revoked_by = Some(actor.login.clone());
        users.update(user);
        info!(%login, by = %actor.login, "user revoked");
    }
    Ok(())
}

pub fn restore_user(users: &dyn UserRepo, actor: &Principal, login: &str) -> ApiResult<()> {
    require_admin(actor)?;
    let mut user = users
        .find_by_login(login)
        .filter(|u| !u.is_active())
        .ok_or(ApiError::NotFound)?;

    user.revoked_on = None;
    user.revoked_by = None;
    user.touch(&actor.login, OffsetDateTime::now_utc());
    users.update(user);

    info!(%login, by = %actor.login, "user restored");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{claims::Role, services::authenticate};
    use crate::config::DEFAULT_ADMIN_PASSWORD;
    use crate::users::repo::{InMemoryUserRepo, SEED_ADMIN_LOGIN};
    use crate::users::repo_types::Gender;
    use time::macros::datetime;

    fn admin(repo: &InMemoryUserRepo) -> Principal {
        let u = repo.find_by_login(SEED_ADMIN_LOGIN).unwrap();
        Principal {
            id: u.id,
            login: u.login,
            role: Role::Admin,
        }
    }

    fn as_user(u: &User) -> Principal {
        Principal {
            id: u.id,
            login: u.login.clone(),
            role: Role::for_admin_flag(u.admin),
        }
    }

    fn create_req(login: &str, password: &str, name: &str) -> CreateUserRequest {
        CreateUserRequest {
            login: login.into(),
            password: password.into(),
            name: name.into(),
            gender: Gender::Male,
            birthday: None,
            admin: false,
        }
    }

    fn setup() -> (InMemoryUserRepo, Principal) {
        let repo = InMemoryUserRepo::seeded(DEFAULT_ADMIN_PASSWORD).unwrap();
        let admin = admin(&repo);
        (repo, admin)
    }

    #[test]
    fn created_user_can_authenticate_only_with_own_password() {
        let (repo, admin) = setup();
        let bob = create_user(&repo, &admin, create_req("bob123", "Passw0rd", "Bob")).unwrap();
        assert_eq!(bob.created_by, SEED_ADMIN_LOGIN);
        assert!(authenticate(&repo, "bob123", "Passw0rd").is_ok());
        assert!(matches!(
            authenticate(&repo, "bob123", "Passw0rdx"),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn create_rejects_duplicates_and_bad_characters() {
        let (repo, admin) = setup();
        let dup = create_user(&repo, &admin, create_req(SEED_ADMIN_LOGIN, "abc", "Bob"));
        assert!(matches!(dup, Err(ApiError::Validation(_))));
        for req in [
            create_req("bad login!", "Passw0rd", "Bob"),
            create_req("bob", "Pass word", "Bob"),
            create_req("bob", "Passw0rd", "Bob1"),
        ] {
            assert!(matches!(
                create_user(&repo, &admin, req),
                Err(ApiError::Validation(_))
            ));
        }
        assert_eq!(repo.list_active().len(), 1);
    }

    #[test]
    fn create_requires_admin() {
        let (repo, admin) = setup();
        let bob = create_user(&repo, &admin, create_req("bob123", "Passw0rd", "Bob")).unwrap();
        let res = create_user(&repo, &as_user(&bob), create_req("eve", "Passw0rd", "Eve"));
        assert!(matches!(res, Err(ApiError::Forbidden)));
    }

    #[test]
    fn login_taken_by_revoked_user_stays_reserved() {
        let (repo, admin) = setup();
        create_user(&repo, &admin, create_req("bob123", "Passw0rd", "Bob")).unwrap();
        delete_user(&repo, &admin, "bob123", false).unwrap();
        let res = create_user(&repo, &admin, create_req("bob123", "Other1", "Bob"));
        assert!(matches!(res, Err(ApiError::Validation(_))));
    }

    #[test]
    fn self_service_update_stamps_modification() {
        let (repo, admin) = setup();
        let bob = create_user(&repo, &admin, create_req("bob123", "Passw0rd", "Bob")).unwrap();
        let me = as_user(&bob);
        update_profile(
            &repo,
            &me,
            "bob123",
            UpdateProfileRequest {
                name: "Роберт".into(),
                gender: Gender::Unknown,
                birthday: Some(datetime!(1990-01-01 0:00 UTC)),
            },
        )
        .unwrap();

        let stored = repo.find_by_id(bob.id).unwrap();
        assert_eq!(stored.name, "Роберт");
        assert_eq!(stored.gender, Gender::Unknown);
        assert_eq!(stored.birthday, Some(datetime!(1990-01-01 0:00 UTC)));
        assert!(stored.modified_on.is_some());
        assert_eq!(stored.modified_by.as_deref(), Some("bob123"));
    }

    #[test]
    fn non_admin_cannot_touch_other_users() {
        let (repo, admin) = setup();
        let bob = create_user(&repo, &admin, create_req("bob123", "Passw0rd", "Bob")).unwrap();
        create_user(&repo, &admin, create_req("other", "Passw0rd", "Other")).unwrap();
        let me = as_user(&bob);

        let res = change_password(
            &repo,
            &me,
            "other",
            ChangePasswordRequest {
                new_password: "NewPass1".into(),
            },
        );
        assert!(matches!(res, Err(ApiError::Forbidden)));
        // missing target is reported before the permission check
        let res = change_password(
            &repo,
            &me,
            "ghost",
            ChangePasswordRequest {
                new_password: "NewPass1".into(),
            },
        );
        assert!(matches!(res, Err(ApiError::NotFound)));
    }

    #[test]
    fn password_change_replaces_credentials() {
        let (repo, admin) = setup();
        create_user(&repo, &admin, create_req("bob123", "Passw0rd", "Bob")).unwrap();
        change_password(
            &repo,
            &admin,
            "bob123",
            ChangePasswordRequest {
                new_password: "NewPass1".into(),
            },
        )
        .unwrap();
        assert!(authenticate(&repo, "bob123", "Passw0rd").is_err());
        assert!(authenticate(&repo, "bob123", "NewPass1").is_ok());
    }

    #[test]
    fn login_change_checks_uniqueness_and_keeps_id() {
        let (repo, admin) = setup();
        let bob = create_user(&repo, &admin, create_req("bob123", "Passw0rd", "Bob")).unwrap();
        let me = as_user(&bob);

        let taken = change_login(
            &repo,
            &me,
            "bob123",
            ChangeLoginRequest {
                new_login: SEED_ADMIN_LOGIN.into(),
            },
        );
        assert!(matches!(taken, Err(ApiError::Validation(_))));
        let invalid = change_login(
            &repo,
            &me,
            "bob123",
            ChangeLoginRequest {
                new_login: "bob 2".into(),
            },
        );
        assert!(matches!(invalid, Err(ApiError::Validation(_))));

        change_login(
            &repo,
            &me,
            "bob123",
            ChangeLoginRequest {
                new_login: "robert".into(),
            },
        )
        .unwrap();
        assert!(repo.find_by_login("bob123").is_none());
        assert_eq!(repo.find_by_login("robert").unwrap().id, bob.id);
    }

    #[test]
    fn revoked_users_cannot_be_edited() {
        let (repo, admin) = setup();
        create_user(&repo, &admin, create_req("bob123", "Passw0rd", "Bob")).unwrap();
        delete_user(&repo, &admin, "bob123", false).unwrap();
        let res = update_profile(
            &repo,
            &admin,
            "bob123",
            UpdateProfileRequest {
                name: "Bob".into(),
                gender: Gender::Male,
                birthday: None,
            },
        );
        assert!(matches!(res, Err(ApiError::NotFound)));
    }

    #[test]
    fn soft_delete_then_restore_round_trip() {
        let (repo, admin) = setup();
        let bob = create_user(&repo, &admin, create_req("bob123", "Passw0rd", "Bob")).unwrap();

        delete_user(&repo, &admin, "bob123", false).unwrap();
        let revoked = repo.find_by_id(bob.id).unwrap();
        assert!(revoked.revoked_on.is_some());
        assert_eq!(revoked.revoked_by.as_deref(), Some(SEED_ADMIN_LOGIN));
        assert!(!get_profile(&repo, &admin, "bob123").unwrap().is_active);

        restore_user(&repo, &admin, "bob123").unwrap();
        let restored = repo.find_by_id(bob.id).unwrap();
        assert!(restored.revoked_on.is_none());
        assert!(restored.revoked_by.is_none());
        assert!(get_profile(&repo, &admin, "bob123").unwrap().is_active);

        // restoring an active user is a 404
        assert!(matches!(
            restore_user(&repo, &admin, "bob123"),
            Err(ApiError::NotFound)
        ));
    }

    #[test]
    fn hard_delete_purges() {
        let (repo, admin) = setup();
        let bob = create_user(&repo, &admin, create_req("bob123", "Passw0rd", "Bob")).unwrap();
        delete_user(&repo, &admin, "bob123", true).unwrap();
        assert!(repo.find_by_id(bob.id).is_none());
        assert!(matches!(
            get_profile(&repo, &admin, "bob123"),
            Err(ApiError::NotFound)
        ));
        assert!(matches!(
            delete_user(&repo, &admin, "bob123", true),
            Err(ApiError::NotFound)
        ));
    }

    #[test]
    fn older_than_skips_revoked_and_unknown_birthdays() {
        let (repo, admin) = setup();
        let mut old = create_req("old", "Passw0rd", "Old");
        old.birthday = Some(datetime!(1950-01-01 0:00 UTC));
        create_user(&repo, &admin, old).unwrap();
        let mut gone = create_req("gone", "Passw0rd", "Gone");
        gone.birthday = Some(datetime!(1940-01-01 0:00 UTC));
        create_user(&repo, &admin, gone).unwrap();
        create_user(&repo, &admin, create_req("ageless", "Passw0rd", "Ageless")).unwrap();
        delete_user(&repo, &admin, "gone", false).unwrap();

        for age in [0, 18, 70] {
            let logins: Vec<_> = list_older_than(&repo, &admin, age)
                .unwrap()
                .into_iter()
                .map(|u| u.login)
                .collect();
            assert_eq!(logins, vec!["old"], "age {age}");
        }
        assert!(list_older_than(&repo, &admin, 200).unwrap().is_empty());
    }
}
