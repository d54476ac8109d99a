//! Клиентская библиотека для работы с forum-server по HTTP.
//!
//! Клиент хранит JWT-токен после `register`/`login` и автоматически использует
//! его в защищённых операциях. Формы постов отправляются так же, как из
//! браузера: успех приходит редиректом, ошибки валидации приходят формой.
#![warn(missing_docs)]

mod error;
mod http_client;
mod models;

pub use error::{ForumClientError, ForumClientResult};
pub use http_client::HttpClient;
pub use models::{
    AuthResponse, Author, FormPage, FormValues, Group, GroupPage, IndexPage, Page, Post,
    PostPage, ProfilePage, Submission, User,
};

#[derive(Debug, Clone)]
/// Клиент forum-server с сохранённым токеном.
pub struct ForumClient {
    http: HttpClient,
    token: Option<String>,
}

impl ForumClient {
    /// Создаёт клиент для сервера по базовому URL, например `http://127.0.0.1:8080`.
    pub fn new(base_url: impl Into<String>) -> ForumClientResult<Self> {
        Ok(Self {
            http: HttpClient::new(base_url)?,
            token: None,
        })
    }

    /// Устанавливает JWT-токен вручную.
    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    /// Возвращает текущий JWT-токен, если он установлен.
    pub fn get_token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Очищает сохранённый JWT-токен.
    pub fn clear_token(&mut self) {
        self.token = None;
    }

    /// Регистрирует пользователя и сохраняет полученный JWT-токен в клиенте.
    pub async fn register(
        &mut self,
        username: &str,
        email: &str,
        password: &str,
    ) -> ForumClientResult<AuthResponse> {
        let result = self.http.register(username, email, password).await?;
        self.token = Some(result.access_token.clone());
        Ok(result)
    }

    /// Выполняет вход пользователя и сохраняет полученный JWT-токен в клиенте.
    pub async fn login(&mut self, username: &str, password: &str) -> ForumClientResult<AuthResponse> {
        let result = self.http.login(username, password).await?;
        self.token = Some(result.access_token.clone());
        Ok(result)
    }

    /// Главная лента; `None` означает первую страницу.
    pub async fn index(&self, page: Option<u32>) -> ForumClientResult<IndexPage> {
        self.http.index(page, self.get_token()).await
    }

    /// Лента группы.
    pub async fn group_feed(&self, slug: &str, page: Option<u32>) -> ForumClientResult<GroupPage> {
        self.http.group_feed(slug, page, self.get_token()).await
    }

    /// Профиль автора.
    pub async fn profile(&self, username: &str, page: Option<u32>) -> ForumClientResult<ProfilePage> {
        self.http.profile(username, page, self.get_token()).await
    }

    /// Возвращает пост автора `username`.
    pub async fn get_post(&self, username: &str, post_id: i64) -> ForumClientResult<PostPage> {
        self.http.get_post(username, post_id, self.get_token()).await
    }

    /// Список групп, доступных в форме поста.
    ///
    /// Требует установленный JWT-токен.
    pub async fn groups(&self) -> ForumClientResult<Vec<Group>> {
        let token = self.require_token()?;
        Ok(self.http.new_post_form(token).await?.groups)
    }

    /// Форма редактирования поста.
    ///
    /// Требует установленный JWT-токен. Для чужого поста сервер отвечает
    /// редиректом на профиль автора, это `ForumClientError::UnexpectedResponse`.
    pub async fn edit_form(&self, username: &str, post_id: i64) -> ForumClientResult<FormPage> {
        let token = self.require_token()?;
        self.http.edit_post_form(token, username, post_id).await
    }

    /// Создаёт пост, `group` это id группы.
    ///
    /// Требует установленный JWT-токен.
    pub async fn create_post(&self, text: &str, group: Option<i64>) -> ForumClientResult<Submission> {
        let token = self.require_token()?;
        self.http.create_post(token, text, group).await
    }

    /// Редактирует пост.
    ///
    /// Требует установленный JWT-токен. Успех перенаправляет на пост, попытка
    /// изменить чужой пост перенаправляет на профиль автора.
    pub async fn edit_post(
        &self,
        username: &str,
        post_id: i64,
        text: &str,
        group: Option<i64>,
    ) -> ForumClientResult<Submission> {
        let token = self.require_token()?;
        self.http
            .edit_post(token, username, post_id, text, group)
            .await
    }

    fn require_token(&self) -> ForumClientResult<&str> {
        self.token.as_deref().ok_or(ForumClientError::Unauthorized)
    }
}
