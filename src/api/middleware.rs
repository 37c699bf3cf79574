use crate::error::{AppError, Result};
use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct TokenQuery {
    t: Option<String>,
}

/// Provider token passed by the frontend as the `t` query parameter.
pub struct AccessToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for AccessToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        let token = Query::<TokenQuery>::try_from_uri(&parts.uri)
            .ok()
            .and_then(|Query(q)| q.t)
            .filter(|t| !t.is_empty())
            .ok_or(AppError::MissingCredential)?;

        Ok(AccessToken(token))
    }
}
