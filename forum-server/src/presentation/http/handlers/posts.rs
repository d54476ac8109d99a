use std::collections::BTreeMap;

use axum::{
    Form, Json,
    extract::{Path, Query, State, rejection::FormRejection},
    response::{IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::application::post_service::{EditAccess, GroupFeed, PostDetail, ProfileFeed};
use crate::domain::error::DomainError;
use crate::domain::group::Group;
use crate::domain::pagination::Page;
use crate::domain::post::{Author, FormErrors, Post, PostForm};
use crate::domain::user::User;
use crate::presentation::AppState;
use crate::presentation::http::app_error::{AppError, AppResult};
use crate::presentation::http::middleware::auth::AuthenticatedUser;

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub(crate) struct PageQuery {
    /// Page number. Anything that is not a number falls back to the first page.
    pub(crate) page: Option<String>,
}

/// Submitted post form, `application/x-www-form-urlencoded`.
#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct PostFormDto {
    #[serde(default)]
    pub(crate) text: String,
    /// Group id, empty for no group.
    pub(crate) group: Option<String>,
}

impl From<PostFormDto> for PostForm {
    fn from(dto: PostFormDto) -> Self {
        Self {
            text: dto.text,
            group: dto.group,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct AuthorDto {
    pub(crate) id: i64,
    pub(crate) username: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct GroupDto {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) slug: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct PostDto {
    pub(crate) id: i64,
    pub(crate) text: String,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) author: AuthorDto,
    pub(crate) group: Option<GroupDto>,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct PageDto {
    pub(crate) posts: Vec<PostDto>,
    pub(crate) number: u32,
    pub(crate) num_pages: u32,
    /// Posts on this page.
    pub(crate) object_count: usize,
    /// Posts in the whole listing.
    pub(crate) count: u64,
    pub(crate) has_next: bool,
    pub(crate) has_previous: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct IndexPageDto {
    pub(crate) page: PageDto,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct GroupPageDto {
    pub(crate) group: GroupDto,
    pub(crate) page: PageDto,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct ProfilePageDto {
    pub(crate) author: AuthorDto,
    pub(crate) post_count: i64,
    pub(crate) page: PageDto,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct PostPageDto {
    pub(crate) author: AuthorDto,
    pub(crate) post: PostDto,
    pub(crate) post_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct FormValuesDto {
    pub(crate) text: String,
    pub(crate) group: Option<String>,
}

/// Create/edit page context. `errors` is keyed by field name.
#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct PostFormPageDto {
    pub(crate) is_edit: bool,
    pub(crate) post_id: Option<i64>,
    pub(crate) form: FormValuesDto,
    pub(crate) errors: BTreeMap<String, Vec<String>>,
    pub(crate) groups: Vec<GroupDto>,
}

impl From<Author> for AuthorDto {
    fn from(author: Author) -> Self {
        Self {
            id: author.id,
            username: author.username,
        }
    }
}

impl From<User> for AuthorDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}

impl From<Group> for GroupDto {
    fn from(group: Group) -> Self {
        Self {
            id: group.id,
            title: group.title,
            slug: group.slug,
        }
    }
}

impl From<Post> for PostDto {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            text: post.text,
            created_at: post.created_at,
            author: post.author.into(),
            group: post.group.map(GroupDto::from),
        }
    }
}

impl From<Page<Post>> for PageDto {
    fn from(page: Page<Post>) -> Self {
        let object_count = page.object_count();
        let window = page.window;
        let page = page.map(PostDto::from);
        Self {
            posts: page.items,
            number: window.number,
            num_pages: window.num_pages,
            object_count,
            count: window.count,
            has_next: window.has_next(),
            has_previous: window.has_previous(),
        }
    }
}

impl From<GroupFeed> for GroupPageDto {
    fn from(feed: GroupFeed) -> Self {
        Self {
            group: feed.group.into(),
            page: feed.page.into(),
        }
    }
}

impl From<ProfileFeed> for ProfilePageDto {
    fn from(feed: ProfileFeed) -> Self {
        Self {
            author: feed.author.into(),
            post_count: feed.post_count,
            page: feed.page.into(),
        }
    }
}

impl From<PostDetail> for PostPageDto {
    fn from(detail: PostDetail) -> Self {
        Self {
            author: detail.author.into(),
            post: detail.post.into(),
            post_count: detail.post_count,
        }
    }
}

fn profile_path(username: &str) -> String {
    format!("/{username}/")
}

fn post_path(username: &str, post_id: i64) -> String {
    format!("/{username}/{post_id}/")
}

/// Post ids that are not numbers cannot name a post.
fn parse_post_id(raw: &str) -> AppResult<i64> {
    raw.parse::<i64>().map_err(|_| AppError::NotFound)
}

#[utoipa::path(
    get,
    path = "/",
    tag = "posts",
    params(PageQuery),
    responses(
        (status = 200, description = "Newest posts across the site", body = IndexPageDto),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn index(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<IndexPageDto>> {
    let page = state.post_service.index(query.page.as_deref()).await?;

    Ok(Json(IndexPageDto { page: page.into() }))
}

#[utoipa::path(
    get,
    path = "/group/{slug}/",
    tag = "posts",
    params(
        ("slug" = String, Path, description = "Group slug"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Posts of the group", body = GroupPageDto),
        (status = 404, description = "Group not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn group_posts(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<GroupPageDto>> {
    let feed = state
        .post_service
        .group_feed(&slug, query.page.as_deref())
        .await?;

    Ok(Json(feed.into()))
}

#[utoipa::path(
    get,
    path = "/{username}/",
    tag = "posts",
    params(
        ("username" = String, Path, description = "Author username"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Posts of the author", body = ProfilePageDto),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<ProfilePageDto>> {
    let feed = state
        .post_service
        .profile_feed(&username, query.page.as_deref())
        .await?;

    Ok(Json(feed.into()))
}

#[utoipa::path(
    get,
    path = "/{username}/{post_id}/",
    tag = "posts",
    params(
        ("username" = String, Path, description = "Author username"),
        ("post_id" = i64, Path, description = "Post id")
    ),
    responses(
        (status = 200, description = "Single post", body = PostPageDto),
        (status = 404, description = "No such post by this author"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn post_view(
    State(state): State<AppState>,
    Path((username, post_id)): Path<(String, String)>,
) -> AppResult<Json<PostPageDto>> {
    let post_id = parse_post_id(&post_id)?;
    let detail = state.post_service.post_detail(&username, post_id).await?;

    Ok(Json(detail.into()))
}

#[utoipa::path(
    get,
    path = "/new/",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Empty create form", body = PostFormPageDto),
        (status = 303, description = "Anonymous, redirected to login"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn new_post_form(
    State(state): State<AppState>,
    _auth: AuthenticatedUser,
) -> AppResult<Json<PostFormPageDto>> {
    render_form(&state, None, PostForm::default(), FormErrors::default()).await
}

#[utoipa::path(
    post,
    path = "/new/",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    request_body(content = PostFormDto, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Form re-rendered with errors", body = PostFormPageDto),
        (status = 303, description = "Created and redirected to the index, or anonymous and redirected to login"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn new_post(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Form(dto): Form<PostFormDto>,
) -> AppResult<Response> {
    let form = PostForm::from(dto);

    match state.post_service.create_post(&principal, &form).await {
        Ok(_) => Ok(Redirect::to("/").into_response()),
        Err(DomainError::InvalidForm(errors)) => {
            Ok(render_form(&state, None, form, errors).await?.into_response())
        }
        Err(err) => Err(err.into()),
    }
}

#[utoipa::path(
    get,
    path = "/{username}/{post_id}/edit/",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("username" = String, Path, description = "Author username"),
        ("post_id" = i64, Path, description = "Post id")
    ),
    responses(
        (status = 200, description = "Form prefilled with the post", body = PostFormPageDto),
        (status = 303, description = "Not the author, redirected to the author's profile, or anonymous and redirected to login"),
        (status = 404, description = "No such post by this author"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn post_edit_form(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path((username, post_id)): Path<(String, String)>,
) -> AppResult<Response> {
    let post_id = parse_post_id(&post_id)?;

    match state
        .post_service
        .open_for_edit(&principal, &username, post_id)
        .await?
    {
        EditAccess::NotOwner { author_username } => {
            Ok(Redirect::to(&profile_path(&author_username)).into_response())
        }
        EditAccess::Owner(post) => {
            let form = PostForm::from_post(&post);
            Ok(render_form(&state, Some(post.id), form, FormErrors::default())
                .await?
                .into_response())
        }
    }
}

#[utoipa::path(
    post,
    path = "/{username}/{post_id}/edit/",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("username" = String, Path, description = "Author username"),
        ("post_id" = i64, Path, description = "Post id")
    ),
    request_body(content = PostFormDto, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Form re-rendered with errors", body = PostFormPageDto),
        (status = 303, description = "Saved and redirected to the post, not the author and redirected to the profile, or anonymous and redirected to login"),
        (status = 404, description = "No such post by this author"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn post_edit(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path((username, post_id)): Path<(String, String)>,
    submitted: Result<Form<PostFormDto>, FormRejection>,
) -> AppResult<Response> {
    let post_id = parse_post_id(&post_id)?;

    // non-owners are redirected whatever the body holds
    let post = match state
        .post_service
        .open_for_edit(&principal, &username, post_id)
        .await?
    {
        EditAccess::Owner(post) => post,
        EditAccess::NotOwner { author_username } => {
            return Ok(Redirect::to(&profile_path(&author_username)).into_response());
        }
    };

    let Form(dto) = submitted?;
    let form = PostForm::from(dto);
    match state.post_service.update_post(&principal, &post, &form).await {
        Ok(updated) => {
            Ok(Redirect::to(&post_path(&updated.author.username, updated.id)).into_response())
        }
        Err(DomainError::InvalidForm(errors)) => Ok(render_form(&state, Some(post.id), form, errors)
            .await?
            .into_response()),
        Err(err) => Err(err.into()),
    }
}

async fn render_form(
    state: &AppState,
    post_id: Option<i64>,
    form: PostForm,
    errors: FormErrors,
) -> AppResult<Json<PostFormPageDto>> {
    let groups = state.post_service.group_choices().await?;

    Ok(Json(PostFormPageDto {
        is_edit: post_id.is_some(),
        post_id,
        form: FormValuesDto {
            text: form.text,
            group: form.group,
        },
        errors: errors.into_map(),
        groups: groups.into_iter().map(GroupDto::from).collect(),
    }))
}
