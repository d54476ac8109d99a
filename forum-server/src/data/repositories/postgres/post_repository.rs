use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::data::post_repository::{NewPost, Pagination, PostPatch, PostRepository, PostScope};
use crate::domain::error::DomainError;
use crate::domain::group::Group;
use crate::domain::post::{Author, Post};

#[derive(Debug, Clone)]
pub(crate) struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    text: String,
    created_at: DateTime<Utc>,
    author_id: i64,
    author_username: String,
    group_id: Option<i64>,
    group_title: Option<String>,
    group_slug: Option<String>,
}

// `p` is any relation shaped like `posts`; joined with its author and group.
const POST_PROJECTION: &str = r#"
    SELECT
        p.id,
        p.text,
        p.created_at,
        u.id AS author_id,
        u.username AS author_username,
        g.id AS group_id,
        g.title AS group_title,
        g.slug AS group_slug
"#;

const POST_JOINS: &str = r#"
    JOIN users u ON u.id = p.author_id
    LEFT JOIN post_groups g ON g.id = p.group_id
"#;

const SCOPE_FILTER: &str = r#"
    WHERE ($1::BIGINT IS NULL OR p.group_id = $1)
      AND ($2::BIGINT IS NULL OR p.author_id = $2)
"#;

fn scope_params(scope: PostScope) -> (Option<i64>, Option<i64>) {
    match scope {
        PostScope::All => (None, None),
        PostScope::Group(group_id) => (Some(group_id), None),
        PostScope::Author(author_id) => (None, Some(author_id)),
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError> {
        let sql = format!(
            r#"
            WITH p AS (
                INSERT INTO posts (text, author_id, group_id)
                VALUES ($1, $2, $3)
                RETURNING *
            )
            {POST_PROJECTION}
            FROM p
            {POST_JOINS}
            "#
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(&input.text)
            .bind(input.author_id)
            .bind(input.group_id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_post_db_error)?;

        map_row_to_post(row)
    }

    async fn find_post_by_author(
        &self,
        post_id: i64,
        username: &str,
    ) -> Result<Option<Post>, DomainError> {
        let sql = format!(
            r#"
            {POST_PROJECTION}
            FROM posts p
            {POST_JOINS}
            WHERE p.id = $1 AND u.username = $2
            "#
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(post_id)
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_post_db_error)?;

        row.map(map_row_to_post).transpose()
    }

    async fn update_post_owned(
        &self,
        post_id: i64,
        owner_id: i64,
        patch: PostPatch,
    ) -> Result<Option<Post>, DomainError> {
        let sql = format!(
            r#"
            WITH p AS (
                UPDATE posts
                SET text = $3,
                    group_id = $4
                WHERE id = $1 AND author_id = $2
                RETURNING *
            )
            {POST_PROJECTION}
            FROM p
            {POST_JOINS}
            "#
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(post_id)
            .bind(owner_id)
            .bind(&patch.text)
            .bind(patch.group_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_post_db_error)?;

        row.map(map_row_to_post).transpose()
    }

    async fn list_posts(
        &self,
        scope: PostScope,
        pagination: Pagination,
    ) -> Result<Vec<Post>, DomainError> {
        let limit = pagination.page_size as i64;
        let offset = (pagination.page.saturating_sub(1) as i64) * limit;
        let (group_id, author_id) = scope_params(scope);

        let sql = format!(
            r#"
            {POST_PROJECTION}
            FROM posts p
            {POST_JOINS}
            {SCOPE_FILTER}
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT $3
            OFFSET $4
            "#
        );
        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(group_id)
            .bind(author_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(map_post_db_error)?;

        rows.into_iter().map(map_row_to_post).collect()
    }

    async fn count_posts(&self, scope: PostScope) -> Result<i64, DomainError> {
        let (group_id, author_id) = scope_params(scope);
        let sql = format!(
            r#"
            SELECT COUNT(*)
            FROM posts p
            {SCOPE_FILTER}
            "#
        );
        sqlx::query_scalar::<_, i64>(&sql)
            .bind(group_id)
            .bind(author_id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_post_db_error)
    }
}

fn map_row_to_post(row: PostRow) -> Result<Post, DomainError> {
    let group = match (row.group_id, row.group_title, row.group_slug) {
        (Some(id), Some(title), Some(slug)) => Some(
            Group::new(id, title, slug).map_err(|err| DomainError::Unexpected(err.to_string()))?,
        ),
        _ => None,
    };
    let author = Author {
        id: row.author_id,
        username: row.author_username,
    };

    Post::new(row.id, row.text, row.created_at, author, group)
        .map_err(|err| DomainError::Unexpected(err.to_string()))
}

fn map_post_db_error(err: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db_err) = &err
        && db_err.code().as_deref() == Some("23503")
    {
        return match db_err.constraint() {
            Some("posts_group_id_fkey") => DomainError::group_choice_gone(),
            _ => DomainError::NotFound("author".to_string()),
        };
    }
    DomainError::Unexpected(err.to_string())
}
