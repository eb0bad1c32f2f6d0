//! Bearer-token authentication middleware
//!
//! Every route except health, signup and login runs behind this layer. The
//! resolved user is placed in request extensions as [`AuthenticatedUser`].

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use greenchain_common::api::{parse_bearer, ApiAuthError};
use greenchain_common::models::User;
use tracing::debug;

use crate::error::ApiError;
use crate::AppState;

/// Caller identity for protected handlers
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

fn bearer_token(headers: &HeaderMap) -> Result<String, ApiAuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(ApiAuthError::MissingToken)?
        .to_str()
        .map_err(|_| ApiAuthError::MalformedHeader("not valid ASCII".to_string()))?;

    parse_bearer(value).map(str::to_string)
}

/// Authentication middleware
///
/// Returns 401 Unauthorized when the token is missing, malformed, unknown
/// or expired. Identity provider failures surface as 500.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())?;
    let user = state.identity.verify_token(&token).await?;

    debug!("Authenticated {} for {}", user.id, request.uri().path());
    request.extensions_mut().insert(AuthenticatedUser(user));

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), Err(ApiAuthError::MissingToken));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Token abc"));
        assert!(matches!(
            bearer_token(&headers),
            Err(ApiAuthError::MalformedHeader(_))
        ));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer_token(&headers).unwrap(), "abc");
    }
}
