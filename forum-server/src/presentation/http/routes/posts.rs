use axum::Router;
use axum::middleware;
use axum::routing::get;

use crate::presentation::AppState;
use crate::presentation::http::handlers::posts::{
    group_posts, index, new_post, new_post_form, post_edit, post_edit_form, post_view, profile,
};
use crate::presentation::http::middleware::auth::require_login;

pub(crate) fn router() -> Router<AppState> {
    let public = Router::new()
        .route("/", get(index))
        .route("/group/{slug}/", get(group_posts))
        .route("/{username}/", get(profile))
        .route("/{username}/{post_id}/", get(post_view));

    let protected = Router::new()
        .route("/new/", get(new_post_form).post(new_post))
        .route(
            "/{username}/{post_id}/edit/",
            get(post_edit_form).post(post_edit),
        )
        .route_layer(middleware::from_fn(require_login));

    public.merge(protected)
}
