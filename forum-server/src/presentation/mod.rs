use std::sync::Arc;

use crate::application::auth_service::AuthService;
use crate::application::post_service::PostService;
use crate::data::group_repository::GroupRepository;
use crate::data::post_repository::PostRepository;
use crate::data::user_repository::UserRepository;
use crate::infrastructure::jwt::JwtService;

pub(crate) mod http;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) auth_service: Arc<AuthService>,
    pub(crate) post_service: Arc<PostService>,
    pub(crate) jwt: Arc<JwtService>,
}

impl AppState {
    pub(crate) fn new(
        users: Arc<dyn UserRepository>,
        posts: Arc<dyn PostRepository>,
        groups: Arc<dyn GroupRepository>,
        jwt: Arc<JwtService>,
    ) -> Self {
        Self {
            auth_service: Arc::new(AuthService::new(users.clone(), jwt.clone())),
            post_service: Arc::new(PostService::new(posts, groups, users)),
            jwt,
        }
    }
}
