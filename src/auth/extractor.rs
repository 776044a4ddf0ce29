use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use super::repo::User;
use crate::error::ApiError;
use crate::state::AppState;

/// Access gate. Resolves the bearer credential on a request down to the
/// owning user's record key, or rejects the request with 403.
///
/// The gate never distinguishes its failure modes to the client: a missing
/// credential, a bad token and an unresolvable subject all look the same.
pub struct AuthUser(pub Uuid);

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Locate the credential: `Authorization: Bearer <token>` header first, the
/// `token` query parameter only when the header is absent. A header that is
/// present but not Bearer-prefixed fails outright.
pub(crate) fn bearer_credential(parts: &Parts) -> Option<String> {
    if let Some(header) = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        return header.strip_prefix("Bearer ").map(str::to_owned);
    }
    Query::<TokenQuery>::try_from_uri(&parts.uri)
        .ok()
        .and_then(|q| q.0.token)
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_credential(parts).ok_or_else(|| {
            warn!("no bearer credential on request");
            ApiError::Forbidden
        })?;

        let claims = state.jwt.verify(&token).map_err(|e| {
            warn!(error = %e, "token rejected");
            ApiError::Forbidden
        })?;

        let user = User::find_by_email(&state.db, &claims.sub)
            .await
            .map_err(|e| ApiError::Internal(e.into()))?
            .ok_or_else(|| {
                warn!(email = %claims.sub, "token subject does not resolve to a user");
                ApiError::Forbidden
            })?;

        Ok(AuthUser(user.id))
    }
}
