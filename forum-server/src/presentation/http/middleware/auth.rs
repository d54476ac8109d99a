use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, Uri, header, request::Parts},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::domain::user::Principal;
use crate::infrastructure::jwt::JwtService;
use crate::presentation::AppState;
use crate::presentation::http::app_error::AppError;

/// The principal of a request that passed [`require_login`].
#[derive(Debug, Clone)]
pub(crate) struct AuthenticatedUser(pub(crate) Principal);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(AuthenticatedUser)
            .ok_or_else(|| AppError::LoginRequired {
                next: requested_path(&parts.uri),
            })
    }
}

/// Attaches the [`Principal`] of a valid bearer token. Requests without one stay anonymous.
pub(crate) async fn identify_principal(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(principal) = bearer_principal(&state.jwt, request.headers()) {
        request.extensions_mut().insert(principal);
    }
    next.run(request).await
}

/// Sends anonymous requests to the login page.
pub(crate) async fn require_login(request: Request, next: Next) -> Result<Response, AppError> {
    if request.extensions().get::<Principal>().is_none() {
        return Err(AppError::LoginRequired {
            next: requested_path(request.uri()),
        });
    }
    Ok(next.run(request).await)
}

fn bearer_principal(jwt: &JwtService, headers: &HeaderMap) -> Option<Principal> {
    let auth_header = headers.get(header::AUTHORIZATION)?.to_str().ok()?;

    let mut parts = auth_header.split_whitespace();
    let scheme = parts.next()?;
    let token = parts.next()?;
    if parts.next().is_some() || !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    match jwt.verify_token(token) {
        Ok(claims) => Some(Principal {
            user_id: claims.user_id,
            username: claims.username,
        }),
        Err(err) => {
            debug!(error = %err, "ignoring invalid bearer token");
            None
        }
    }
}

fn requested_path(uri: &Uri) -> String {
    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string())
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, HeaderValue, Uri, header};
    use chrono::Utc;

    use super::{bearer_principal, requested_path};
    use crate::domain::user::User;
    use crate::infrastructure::jwt::JwtService;

    fn jwt() -> JwtService {
        JwtService::new("0123456789abcdef0123456789abcdef", 3600)
    }

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(value).expect("valid header"),
        );
        headers
    }

    #[test]
    fn bearer_token_yields_principal() {
        let jwt = jwt();
        let user = User::new(3, "amalia", "amalia@example.com", Utc::now()).expect("valid user");
        let token = jwt.generate_token(&user).expect("token");

        let principal =
            bearer_principal(&jwt, &headers(&format!("Bearer {token}"))).expect("principal");
        assert_eq!(principal.user_id, 3);
        assert_eq!(principal.username, "amalia");
    }

    #[test]
    fn malformed_headers_are_anonymous() {
        let jwt = jwt();
        assert!(bearer_principal(&jwt, &HeaderMap::new()).is_none());
        assert!(bearer_principal(&jwt, &headers("Bearer")).is_none());
        assert!(bearer_principal(&jwt, &headers("Basic abc")).is_none());
        assert!(bearer_principal(&jwt, &headers("Bearer a b")).is_none());
        assert!(bearer_principal(&jwt, &headers("Bearer not-a-jwt")).is_none());
    }

    #[test]
    fn requested_path_keeps_query() {
        let uri: Uri = "/amalia/1/edit/?page=2".parse().expect("valid uri");
        assert_eq!(requested_path(&uri), "/amalia/1/edit/?page=2");
    }
}
