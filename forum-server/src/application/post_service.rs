use std::sync::Arc;

use tracing::{info, warn};

use crate::data::group_repository::GroupRepository;
use crate::data::post_repository::{NewPost, Pagination, PostPatch, PostRepository, PostScope};
use crate::data::user_repository::UserRepository;
use crate::domain::error::DomainError;
use crate::domain::group::{Group, NewGroup};
use crate::domain::pagination::{PAGE_SIZE, Page, PageWindow};
use crate::domain::post::{CleanedPost, Post, PostForm};
use crate::domain::user::{Principal, User};

#[derive(Debug, Clone)]
pub(crate) struct GroupFeed {
    pub(crate) group: Group,
    pub(crate) page: Page<Post>,
}

#[derive(Debug, Clone)]
pub(crate) struct ProfileFeed {
    pub(crate) author: User,
    pub(crate) post_count: i64,
    pub(crate) page: Page<Post>,
}

#[derive(Debug, Clone)]
pub(crate) struct PostDetail {
    pub(crate) author: User,
    pub(crate) post: Post,
    pub(crate) post_count: i64,
}

/// Outcome of resolving a post for editing on behalf of a principal.
#[derive(Debug, Clone)]
pub(crate) enum EditAccess {
    Owner(Post),
    /// The post exists but belongs to someone else.
    NotOwner { author_username: String },
}

pub(crate) struct PostService {
    posts: Arc<dyn PostRepository>,
    groups: Arc<dyn GroupRepository>,
    users: Arc<dyn UserRepository>,
}

impl PostService {
    pub(crate) fn new(
        posts: Arc<dyn PostRepository>,
        groups: Arc<dyn GroupRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            posts,
            groups,
            users,
        }
    }

    pub(crate) async fn index(&self, raw_page: Option<&str>) -> Result<Page<Post>, DomainError> {
        self.paginate(PostScope::All, raw_page).await
    }

    pub(crate) async fn group_feed(
        &self,
        slug: &str,
        raw_page: Option<&str>,
    ) -> Result<GroupFeed, DomainError> {
        let group = self
            .groups
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("group slug: {slug}")))?;

        let page = self.paginate(PostScope::Group(group.id), raw_page).await?;
        Ok(GroupFeed { group, page })
    }

    pub(crate) async fn profile_feed(
        &self,
        username: &str,
        raw_page: Option<&str>,
    ) -> Result<ProfileFeed, DomainError> {
        let author = self.find_author(username).await?;

        let page = self.paginate(PostScope::Author(author.id), raw_page).await?;
        let post_count = page.window.count as i64;
        Ok(ProfileFeed {
            author,
            post_count,
            page,
        })
    }

    pub(crate) async fn post_detail(
        &self,
        username: &str,
        post_id: i64,
    ) -> Result<PostDetail, DomainError> {
        let author = self.find_author(username).await?;
        let post = self.find_post(username, post_id).await?;
        let post_count = self.posts.count_posts(PostScope::Author(author.id)).await?;

        Ok(PostDetail {
            author,
            post,
            post_count,
        })
    }

    pub(crate) async fn group_choices(&self) -> Result<Vec<Group>, DomainError> {
        self.groups.list_groups().await
    }

    /// Saves a new post authored by `principal`.
    ///
    /// An invalid form yields [`DomainError::InvalidForm`] and nothing is stored.
    pub(crate) async fn create_post(
        &self,
        principal: &Principal,
        form: &PostForm,
    ) -> Result<Post, DomainError> {
        let cleaned = self.clean_form(form).await?;

        let post = self
            .posts
            .create_post(NewPost {
                text: cleaned.text,
                author_id: principal.user_id,
                group_id: cleaned.group.map(|group| group.id),
            })
            .await?;

        info!(post_id = post.id, author = %principal.username, "post created");
        Ok(post)
    }

    /// Resolves `post_id` under `username` and decides whether `principal` may edit it.
    pub(crate) async fn open_for_edit(
        &self,
        principal: &Principal,
        username: &str,
        post_id: i64,
    ) -> Result<EditAccess, DomainError> {
        let post = self.find_post(username, post_id).await?;

        if !post.is_authored_by(&principal.username) {
            warn!(
                post_id,
                author = %post.author.username,
                principal = %principal.username,
                "edit attempt by non-owner"
            );
            return Ok(EditAccess::NotOwner {
                author_username: post.author.username,
            });
        }
        Ok(EditAccess::Owner(post))
    }

    /// Replaces text and group of a post previously opened with [`Self::open_for_edit`].
    pub(crate) async fn update_post(
        &self,
        principal: &Principal,
        post: &Post,
        form: &PostForm,
    ) -> Result<Post, DomainError> {
        let cleaned = self.clean_form(form).await?;

        let updated = self
            .posts
            .update_post_owned(
                post.id,
                principal.user_id,
                PostPatch {
                    text: cleaned.text,
                    group_id: cleaned.group.map(|group| group.id),
                },
            )
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("post id: {}", post.id)))?;

        info!(post_id = updated.id, author = %principal.username, "post updated");
        Ok(updated)
    }

    pub(crate) async fn seed_groups(&self, seeds: Vec<NewGroup>) -> Result<Vec<Group>, DomainError> {
        let mut groups = Vec::with_capacity(seeds.len());
        for seed in seeds {
            let group = self.groups.ensure_group(seed).await?;
            info!(group_id = group.id, slug = %group.slug, "group available");
            groups.push(group);
        }
        Ok(groups)
    }

    async fn clean_form(&self, form: &PostForm) -> Result<CleanedPost, DomainError> {
        let choices = self.groups.list_groups().await?;
        form.clean(&choices).map_err(DomainError::InvalidForm)
    }

    async fn find_author(&self, username: &str) -> Result<User, DomainError> {
        self.users
            .find_by_username(username)
            .await?
            .map(|creds| creds.user)
            .ok_or_else(|| DomainError::NotFound(format!("user: {username}")))
    }

    async fn find_post(&self, username: &str, post_id: i64) -> Result<Post, DomainError> {
        self.posts
            .find_post_by_author(post_id, username)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("post id: {post_id}")))
    }

    async fn paginate(
        &self,
        scope: PostScope,
        raw_page: Option<&str>,
    ) -> Result<Page<Post>, DomainError> {
        let count = self.posts.count_posts(scope).await?;
        let window = PageWindow::resolve(raw_page, count.max(0) as u64, PAGE_SIZE);
        let items = self
            .posts
            .list_posts(
                scope,
                Pagination {
                    page: window.number,
                    page_size: window.page_size,
                },
            )
            .await?;

        Ok(Page { items, window })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{EditAccess, PostService};
    use crate::data::group_repository::GroupRepository;
    use crate::data::post_repository::{NewPost, PostRepository, PostScope};
    use crate::data::repositories::memory::InMemoryStore;
    use crate::data::user_repository::{NewUser, UserRepository};
    use crate::domain::error::DomainError;
    use crate::domain::group::{Group, NewGroup};
    use crate::domain::post::{Post, PostForm};
    use crate::domain::user::Principal;

    struct Fixture {
        store: InMemoryStore,
        service: PostService,
    }

    impl Fixture {
        fn new() -> Self {
            let store = InMemoryStore::new();
            let service = PostService::new(
                Arc::new(store.clone()),
                Arc::new(store.clone()),
                Arc::new(store.clone()),
            );
            Self { store, service }
        }

        async fn user(&self, username: &str) -> Principal {
            let user = self
                .store
                .create_user(NewUser {
                    username: username.to_string(),
                    email: format!("{username}@example.com"),
                    password_hash: "hash".to_string(),
                })
                .await
                .expect("user must be created");
            Principal {
                user_id: user.id,
                username: user.username,
            }
        }

        async fn group(&self, title: &str, slug: &str) -> Group {
            self.store
                .ensure_group(NewGroup::new(title, slug).expect("valid group"))
                .await
                .expect("group must be created")
        }

        async fn post(&self, author: &Principal, text: &str, group: Option<&Group>) -> Post {
            self.store
                .create_post(NewPost {
                    text: text.to_string(),
                    author_id: author.user_id,
                    group_id: group.map(|group| group.id),
                })
                .await
                .expect("post must be created")
        }

        async fn total(&self) -> i64 {
            self.store
                .count_posts(PostScope::All)
                .await
                .expect("count must succeed")
        }
    }

    fn form(text: &str, group: Option<&Group>) -> PostForm {
        PostForm {
            text: text.to_string(),
            group: group.map(|group| group.id.to_string()),
        }
    }

    #[tokio::test]
    async fn create_post_sets_author_to_principal() {
        let fx = Fixture::new();
        let amalia = fx.user("amalia").await;
        let group = fx.group("Cats", "cats").await;

        let post = fx
            .service
            .create_post(&amalia, &form("  hello  ", Some(&group)))
            .await
            .expect("create must succeed");

        assert_eq!(fx.total().await, 1);
        assert_eq!(post.author.username, "amalia");
        assert_eq!(post.text, "hello");
        assert_eq!(post.group, Some(group));
    }

    #[tokio::test]
    async fn create_post_with_invalid_form_stores_nothing() {
        let fx = Fixture::new();
        let amalia = fx.user("amalia").await;

        let err = fx
            .service
            .create_post(
                &amalia,
                &PostForm {
                    text: "   ".to_string(),
                    group: Some("404".to_string()),
                },
            )
            .await
            .expect_err("form must be rejected");

        match err {
            DomainError::InvalidForm(errors) => {
                assert_eq!(errors.field("text").len(), 1);
                assert_eq!(errors.field("group").len(), 1);
            }
            other => panic!("expected InvalidForm, got {other:?}"),
        }
        assert_eq!(fx.total().await, 0);
    }

    #[tokio::test]
    async fn index_pages_thirteen_posts() {
        let fx = Fixture::new();
        let amalia = fx.user("amalia").await;
        for i in 0..13 {
            fx.post(&amalia, &i.to_string(), None).await;
        }

        let first = fx.service.index(None).await.expect("page 1");
        let second = fx.service.index(Some("2")).await.expect("page 2");
        let clamped = fx.service.index(Some("7")).await.expect("page 7");
        let garbage = fx.service.index(Some("abc")).await.expect("page abc");

        assert_eq!(first.object_count(), 10);
        assert_eq!(first.window.num_pages, 2);
        assert_eq!(first.items[0].text, "12");
        assert_eq!(second.object_count(), 3);
        assert_eq!(clamped.window.number, 2);
        assert_eq!(clamped.object_count(), 3);
        assert_eq!(garbage.window.number, 1);
    }

    #[tokio::test]
    async fn group_feed_only_contains_group_posts() {
        let fx = Fixture::new();
        let amalia = fx.user("amalia").await;
        let cats = fx.group("Cats", "cats").await;
        let dogs = fx.group("Dogs", "dogs").await;
        fx.post(&amalia, "meow", Some(&cats)).await;
        fx.post(&amalia, "woof", Some(&dogs)).await;
        fx.post(&amalia, "nothing", None).await;

        let feed = fx.service.group_feed("cats", None).await.expect("feed");

        assert_eq!(feed.group.slug, "cats");
        assert_eq!(feed.page.items.len(), 1);
        assert_eq!(feed.page.items[0].text, "meow");
    }

    #[tokio::test]
    async fn group_feed_for_unknown_slug_is_not_found() {
        let fx = Fixture::new();
        let err = fx
            .service
            .group_feed("missing", None)
            .await
            .expect_err("must fail");
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn profile_feed_counts_only_authors_posts() {
        let fx = Fixture::new();
        let amalia = fx.user("amalia").await;
        let other = fx.user("a").await;
        for i in 0..12 {
            fx.post(&amalia, &format!("mine {i}"), None).await;
        }
        for i in 0..4 {
            fx.post(&other, &format!("theirs {i}"), None).await;
        }

        let feed = fx.service.profile_feed("amalia", None).await.expect("feed");

        assert_eq!(feed.author.username, "amalia");
        assert_eq!(feed.post_count, 12);
        assert_eq!(feed.page.object_count(), 10);
        assert!(feed.page.items.iter().all(|post| post.author.username == "amalia"));
    }

    #[tokio::test]
    async fn profile_feed_for_unknown_user_is_not_found() {
        let fx = Fixture::new();
        let err = fx
            .service
            .profile_feed("ghost", None)
            .await
            .expect_err("must fail");
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn post_detail_requires_matching_author() {
        let fx = Fixture::new();
        let amalia = fx.user("amalia").await;
        fx.user("a").await;
        let post = fx.post(&amalia, "aaaa", None).await;

        let detail = fx
            .service
            .post_detail("amalia", post.id)
            .await
            .expect("detail");
        assert_eq!(detail.post.text, "aaaa");
        assert_eq!(detail.post_count, 1);

        let err = fx
            .service
            .post_detail("a", post.id)
            .await
            .expect_err("mismatched author must fail");
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn owner_edit_replaces_text_and_clears_group() {
        let fx = Fixture::new();
        let amalia = fx.user("amalia").await;
        let group = fx.group("Group", "group").await;
        let post = fx.post(&amalia, "g", Some(&group)).await;
        let untouched = fx.post(&amalia, "other", Some(&group)).await;

        let EditAccess::Owner(opened) = fx
            .service
            .open_for_edit(&amalia, "amalia", post.id)
            .await
            .expect("open")
        else {
            panic!("owner must be allowed to edit");
        };
        let updated = fx
            .service
            .update_post(&amalia, &opened, &form("ga", None))
            .await
            .expect("update");

        assert_eq!(updated.id, post.id);
        assert_eq!(updated.text, "ga");
        assert!(updated.group.is_none());
        assert_eq!(updated.author, post.author);
        assert_eq!(fx.total().await, 2);

        let other = fx
            .service
            .post_detail("amalia", untouched.id)
            .await
            .expect("detail");
        assert_eq!(other.post.text, "other");
        assert_eq!(other.post.group, Some(group));
    }

    #[tokio::test]
    async fn non_owner_is_pointed_at_the_author() {
        let fx = Fixture::new();
        let amalia = fx.user("amalia").await;
        let intruder = fx.user("a").await;
        let post = fx.post(&amalia, "mine", None).await;

        let access = fx
            .service
            .open_for_edit(&intruder, "amalia", post.id)
            .await
            .expect("open");

        match access {
            EditAccess::NotOwner { author_username } => assert_eq!(author_username, "amalia"),
            EditAccess::Owner(_) => panic!("non-owner must not get the post"),
        }
    }

    #[tokio::test]
    async fn open_for_edit_with_wrong_username_is_not_found() {
        let fx = Fixture::new();
        let amalia = fx.user("amalia").await;
        let post = fx.post(&amalia, "mine", None).await;

        let err = fx
            .service
            .open_for_edit(&amalia, "someone-else", post.id)
            .await
            .expect_err("must fail");
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn seed_groups_is_idempotent() {
        let fx = Fixture::new();
        let seeds = vec![NewGroup::new("Cats", "cats").expect("valid")];

        fx.service.seed_groups(seeds.clone()).await.expect("seed");
        fx.service.seed_groups(seeds).await.expect("seed again");

        assert_eq!(fx.service.group_choices().await.expect("choices").len(), 1);
    }
}
