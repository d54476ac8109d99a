use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::presentation::http::handlers::auth::{
    AuthResponseDto, LoginDto, LoginPageDto, LoginPageQuery, RegisterDto, UserDto,
};
use crate::presentation::http::handlers::posts::{
    AuthorDto, FormValuesDto, GroupDto, GroupPageDto, IndexPageDto, PageDto, PageQuery, PostDto,
    PostFormDto, PostFormPageDto, PostPageDto, ProfilePageDto,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::presentation::http::handlers::auth::register,
        crate::presentation::http::handlers::auth::login,
        crate::presentation::http::handlers::auth::login_page,
        crate::presentation::http::handlers::posts::index,
        crate::presentation::http::handlers::posts::group_posts,
        crate::presentation::http::handlers::posts::profile,
        crate::presentation::http::handlers::posts::post_view,
        crate::presentation::http::handlers::posts::new_post_form,
        crate::presentation::http::handlers::posts::new_post,
        crate::presentation::http::handlers::posts::post_edit_form,
        crate::presentation::http::handlers::posts::post_edit
    ),
    components(
        schemas(
            RegisterDto,
            LoginDto,
            LoginPageQuery,
            LoginPageDto,
            AuthResponseDto,
            UserDto,
            PageQuery,
            PostFormDto,
            AuthorDto,
            GroupDto,
            PostDto,
            PageDto,
            IndexPageDto,
            GroupPageDto,
            ProfilePageDto,
            PostPageDto,
            FormValuesDto,
            PostFormPageDto
        )
    ),
    tags(
        (name = "auth", description = "Signup and login"),
        (name = "posts", description = "Feeds, single posts and the post form")
    ),
    modifiers(&SecurityAddon)
)]
pub(crate) struct ApiDoc;

pub(crate) struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let mut components = openapi.components.take().unwrap_or_default();
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
        openapi.components = Some(components);
    }
}
