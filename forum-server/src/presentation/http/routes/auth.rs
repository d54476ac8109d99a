use axum::{
    Router,
    routing::{get, post},
};

use crate::presentation::AppState;
use crate::presentation::http::handlers::auth::{login, login_page, register};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/signup/", post(register))
        .route("/login/", get(login_page).post(login))
}
