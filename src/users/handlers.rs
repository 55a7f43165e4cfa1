use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post, put, MethodRouter},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::LoginRequest,
        extractors::{AdminUser, AuthUser},
        services::authenticate,
    },
    error::ApiResult,
    extract::JsonBody,
    state::AppState,
    users::{
        dto::{
            AuthenticateResponse, ChangeLoginRequest, ChangePasswordRequest, CreateUserRequest,
            DeleteParams, UpdateProfileRequest, UserProfile,
        },
        extractors::{OlderThanAge, TargetLogin, RESERVED_LOGINS},
        repo_types::User,
        services,
    },
};

pub fn user_routes() -> Router<AppState> {
    let mut router = Router::new()
        .route("/users", post(create_user).get(list_active_users))
        .route("/users/:login", get(get_user).delete(delete_user))
        .route(
            "/users/authenticate",
            post(authenticate_user).get(get_user).delete(delete_user),
        )
        .route("/users/olderthan", get(get_user).delete(delete_user))
        .route("/users/olderthan/:age", get(list_users_older_than))
        .merge(member_routes("/users/:login"));

    // Literal copies win over `:login`, so reserved logins need their own.
    for login in RESERVED_LOGINS {
        router = router.merge(member_routes(&format!("/users/{login}")));
    }
    router
}

fn member_routes(prefix: &str) -> Router<AppState> {
    // `/users/olderthan/{x}` still answers GET as an age query
    let with_age = |m: MethodRouter<AppState>| {
        if prefix == "/users/olderthan" {
            m.get(list_users_older_than)
        } else {
            m
        }
    };
    Router::new()
        .route(&format!("{prefix}/profile"), with_age(put(update_profile)))
        .route(&format!("{prefix}/password"), with_age(put(change_password)))
        .route(&format!("{prefix}/login"), with_age(put(change_login)))
        .route(&format!("{prefix}/restore"), with_age(put(restore_user)))
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    JsonBody(payload): JsonBody<CreateUserRequest>,
) -> ApiResult<StatusCode> {
    services::create_user(state.users.as_ref(), &actor, payload)?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    TargetLogin(login): TargetLogin,
    JsonBody(payload): JsonBody<UpdateProfileRequest>,
) -> ApiResult<StatusCode> {
    services::update_profile(state.users.as_ref(), &actor, &login, payload)?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    TargetLogin(login): TargetLogin,
    JsonBody(payload): JsonBody<ChangePasswordRequest>,
) -> ApiResult<StatusCode> {
    services::change_password(state.users.as_ref(), &actor, &login, payload)?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, payload))]
pub async fn change_login(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    TargetLogin(login): TargetLogin,
    JsonBody(payload): JsonBody<ChangeLoginRequest>,
) -> ApiResult<StatusCode> {
    services::change_login(state.users.as_ref(), &actor, &login, payload)?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn list_active_users(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(services::list_active(state.users.as_ref(), &actor)?))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    TargetLogin(login): TargetLogin,
) -> ApiResult<Json<UserProfile>> {
    Ok(Json(services::get_profile(state.users.as_ref(), &actor, &login)?))
}

#[instrument(skip(state))]
pub async fn list_users_older_than(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    OlderThanAge(age): OlderThanAge,
) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(services::list_older_than(state.users.as_ref(), &actor, age)?))
}

#[instrument(skip(state, payload))]
pub async fn authenticate_user(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> ApiResult<Json<AuthenticateResponse>> {
    let user = authenticate(state.users.as_ref(), &payload.login, &payload.password)?;
    Ok(Json(AuthenticateResponse::from(user)))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    TargetLogin(login): TargetLogin,
    Query(params): Query<DeleteParams>,
) -> ApiResult<StatusCode> {
    services::delete_user(state.users.as_ref(), &actor, &login, params.hard)?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn restore_user(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    TargetLogin(login): TargetLogin,
) -> ApiResult<StatusCode> {
    services::restore_user(state.users.as_ref(), &actor, &login)?;
    Ok(StatusCode::NO_CONTENT)
}
