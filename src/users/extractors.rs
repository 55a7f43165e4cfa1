//! Path extractors for `/users/...` routes.
//!
//! `authenticate` and `olderthan` are valid logins as well as fixed route
//! segments, so some member routes are registered with the literal segment
//! in place of `:login`. These extractors read the target from the matched
//! params when present and fall back to the literal path otherwise.

use std::collections::HashMap;

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};

use crate::error::ApiError;

/// Fixed segments under `/users` that can also be a user's login.
pub const RESERVED_LOGINS: [&str; 2] = ["authenticate", "olderthan"];

async fn path_params<S: Send + Sync>(parts: &mut Parts, state: &S) -> HashMap<String, String> {
    match Option::<Path<HashMap<String, String>>>::from_request_parts(parts, state).await {
        Ok(Some(Path(params))) => params,
        _ => HashMap::new(),
    }
}

/// Raw segments following `users` in the request path.
fn segments_after_users(parts: &Parts) -> Vec<String> {
    parts
        .uri
        .path()
        .split('/')
        .filter(|s| !s.is_empty())
        .skip_while(|s| *s != "users")
        .skip(1)
        .map(str::to_string)
        .collect()
}

/// Login addressed by a `/users/{login}[/...]` route.
pub struct TargetLogin(pub String);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for TargetLogin {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(login) = path_params(parts, state).await.remove("login") {
            return Ok(TargetLogin(login));
        }
        segments_after_users(parts)
            .into_iter()
            .next()
            .map(TargetLogin)
            .ok_or(ApiError::NotFound)
    }
}

/// Age addressed by `/users/olderthan/{age}`; non-numeric or negative is a 400.
pub struct OlderThanAge(pub u32);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for OlderThanAge {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let raw = match path_params(parts, state).await.remove("age") {
            Some(age) => age,
            None => segments_after_users(parts)
                .into_iter()
                .nth(1)
                .ok_or(ApiError::NotFound)?,
        };
        raw.parse::<u32>()
            .map(OlderThanAge)
            .map_err(|_| ApiError::validation(format!("Invalid age: {raw}")))
    }
}
