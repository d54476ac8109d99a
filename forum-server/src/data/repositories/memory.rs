//! In-memory storage backend. Data is lost on process restart.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::data::group_repository::GroupRepository;
use crate::data::post_repository::{NewPost, Pagination, PostPatch, PostRepository, PostScope};
use crate::data::user_repository::{NewUser, UserCredentials, UserRepository};
use crate::domain::error::DomainError;
use crate::domain::group::{Group, NewGroup};
use crate::domain::post::{Author, Post};
use crate::domain::user::User;

struct StoredPost {
    id: i64,
    text: String,
    created_at: DateTime<Utc>,
    author_id: i64,
    group_id: Option<i64>,
}

#[derive(Default)]
struct Tables {
    users: Vec<UserCredentials>,
    groups: Vec<Group>,
    posts: Vec<StoredPost>,
    last_user_id: i64,
    last_group_id: i64,
    last_post_id: i64,
}

impl Tables {
    fn user(&self, id: i64) -> Option<&User> {
        self.users
            .iter()
            .map(|creds| &creds.user)
            .find(|user| user.id == id)
    }

    fn group(&self, id: i64) -> Option<&Group> {
        self.groups.iter().find(|group| group.id == id)
    }

    fn check_group(&self, group_id: Option<i64>) -> Result<(), DomainError> {
        match group_id {
            Some(id) if self.group(id).is_none() => Err(DomainError::group_choice_gone()),
            _ => Ok(()),
        }
    }

    fn materialize(&self, stored: &StoredPost) -> Result<Post, DomainError> {
        let user = self
            .user(stored.author_id)
            .ok_or_else(|| DomainError::Unexpected(format!("post {} has no author", stored.id)))?;
        let author = Author {
            id: user.id,
            username: user.username.clone(),
        };
        let group = stored.group_id.and_then(|id| self.group(id)).cloned();

        Post::new(stored.id, stored.text.clone(), stored.created_at, author, group)
    }

    fn in_scope(stored: &StoredPost, scope: PostScope) -> bool {
        match scope {
            PostScope::All => true,
            PostScope::Group(group_id) => stored.group_id == Some(group_id),
            PostScope::Author(author_id) => stored.author_id == author_id,
        }
    }
}

#[derive(Clone, Default)]
pub(crate) struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create_user(&self, input: NewUser) -> Result<User, DomainError> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .iter()
            .any(|creds| creds.user.username == input.username)
        {
            return Err(DomainError::AlreadyExists("username".to_string()));
        }
        if tables.users.iter().any(|creds| creds.user.email == input.email) {
            return Err(DomainError::AlreadyExists("email".to_string()));
        }

        let user = User::new(
            tables.last_user_id + 1,
            input.username,
            input.email,
            Utc::now(),
        )?;
        tables.last_user_id = user.id;
        tables.users.push(UserCredentials {
            user: user.clone(),
            password_hash: input.password_hash,
        });
        Ok(user)
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserCredentials>, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|creds| creds.user.username == username)
            .cloned())
    }
}

#[async_trait]
impl GroupRepository for InMemoryStore {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables.groups.iter().find(|group| group.slug == slug).cloned())
    }

    async fn list_groups(&self) -> Result<Vec<Group>, DomainError> {
        let tables = self.tables.read().await;
        let mut groups = tables.groups.clone();
        groups.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(groups)
    }

    async fn ensure_group(&self, input: NewGroup) -> Result<Group, DomainError> {
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables.groups.iter().find(|group| group.slug == input.slug) {
            return Ok(existing.clone());
        }

        let group = Group::new(tables.last_group_id + 1, input.title, input.slug)?;
        tables.last_group_id = group.id;
        tables.groups.push(group.clone());
        Ok(group)
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError> {
        let mut tables = self.tables.write().await;
        if tables.user(input.author_id).is_none() {
            return Err(DomainError::NotFound("author".to_string()));
        }
        tables.check_group(input.group_id)?;

        let stored = StoredPost {
            id: tables.last_post_id + 1,
            text: input.text,
            created_at: Utc::now(),
            author_id: input.author_id,
            group_id: input.group_id,
        };
        let post = tables.materialize(&stored)?;
        tables.last_post_id = stored.id;
        tables.posts.push(stored);
        Ok(post)
    }

    async fn find_post_by_author(
        &self,
        post_id: i64,
        username: &str,
    ) -> Result<Option<Post>, DomainError> {
        let tables = self.tables.read().await;
        let Some(stored) = tables.posts.iter().find(|post| post.id == post_id) else {
            return Ok(None);
        };
        let post = tables.materialize(stored)?;
        Ok(post.is_authored_by(username).then_some(post))
    }

    async fn update_post_owned(
        &self,
        post_id: i64,
        owner_id: i64,
        patch: PostPatch,
    ) -> Result<Option<Post>, DomainError> {
        let mut tables = self.tables.write().await;
        tables.check_group(patch.group_id)?;

        let Some(index) = tables
            .posts
            .iter()
            .position(|post| post.id == post_id && post.author_id == owner_id)
        else {
            return Ok(None);
        };

        let stored = &mut tables.posts[index];
        stored.text = patch.text;
        stored.group_id = patch.group_id;

        let post = tables.materialize(&tables.posts[index])?;
        Ok(Some(post))
    }

    async fn list_posts(
        &self,
        scope: PostScope,
        pagination: Pagination,
    ) -> Result<Vec<Post>, DomainError> {
        let tables = self.tables.read().await;
        let mut matching: Vec<&StoredPost> = tables
            .posts
            .iter()
            .filter(|post| Tables::in_scope(post, scope))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let limit = pagination.page_size as usize;
        let offset = pagination.page.saturating_sub(1) as usize * limit;

        matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|post| tables.materialize(post))
            .collect()
    }

    async fn count_posts(&self, scope: PostScope) -> Result<i64, DomainError> {
        let tables = self.tables.read().await;
        let count = tables
            .posts
            .iter()
            .filter(|post| Tables::in_scope(post, scope))
            .count();
        Ok(count as i64)
    }
}
