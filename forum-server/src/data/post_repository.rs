use async_trait::async_trait;

use crate::domain::error::DomainError;
use crate::domain::post::Post;

#[derive(Debug, Clone)]
pub(crate) struct NewPost {
    pub(crate) text: String,
    pub(crate) author_id: i64,
    pub(crate) group_id: Option<i64>,
}

/// Fields an author may change. The author itself is not part of it.
#[derive(Debug, Clone)]
pub(crate) struct PostPatch {
    pub(crate) text: String,
    pub(crate) group_id: Option<i64>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Pagination {
    pub(crate) page: u32,
    pub(crate) page_size: u32,
}

/// Which posts a listing draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PostScope {
    All,
    Group(i64),
    Author(i64),
}

/// Listings are ordered newest first, ties broken by id descending.
#[async_trait]
pub(crate) trait PostRepository: Send + Sync {
    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError>;
    async fn find_post_by_author(
        &self,
        post_id: i64,
        username: &str,
    ) -> Result<Option<Post>, DomainError>;
    async fn update_post_owned(
        &self,
        post_id: i64,
        owner_id: i64,
        patch: PostPatch,
    ) -> Result<Option<Post>, DomainError>;
    async fn list_posts(
        &self,
        scope: PostScope,
        pagination: Pagination,
    ) -> Result<Vec<Post>, DomainError>;
    async fn count_posts(&self, scope: PostScope) -> Result<i64, DomainError>;
}
