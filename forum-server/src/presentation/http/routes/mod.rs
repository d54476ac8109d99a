use axum::Router;

use crate::presentation::AppState;

pub(crate) mod auth;
pub(crate) mod posts;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .merge(posts::router())
}
