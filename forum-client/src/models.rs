use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Публичная модель пользователя.
pub struct User {
    /// Идентификатор пользователя.
    pub id: i64,
    /// Логин.
    pub username: String,
    /// Email.
    pub email: String,
    /// Дата и время регистрации (UTC).
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Ответ после успешной регистрации или входа.
pub struct AuthResponse {
    /// JWT access token.
    pub access_token: String,
    /// Данные пользователя.
    pub user: User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Автор поста.
pub struct Author {
    /// Идентификатор пользователя.
    pub id: i64,
    /// Логин.
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Группа (сообщество).
pub struct Group {
    /// Идентификатор группы, он же значение поля `group` в форме.
    pub id: i64,
    /// Название.
    pub title: String,
    /// Slug для адреса `/group/{slug}/`.
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Публичная модель поста.
pub struct Post {
    /// Идентификатор поста.
    pub id: i64,
    /// Текст.
    pub text: String,
    /// Дата и время публикации (UTC).
    pub created_at: DateTime<Utc>,
    /// Автор.
    pub author: Author,
    /// Группа, если выбрана.
    pub group: Option<Group>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Страница ленты.
pub struct Page {
    /// Посты текущей страницы, новые сверху.
    pub posts: Vec<Post>,
    /// Номер страницы (с единицы).
    pub number: u32,
    /// Всего страниц.
    pub num_pages: u32,
    /// Постов на этой странице.
    pub object_count: usize,
    /// Постов во всей ленте.
    pub count: u64,
    /// Есть ли следующая страница.
    pub has_next: bool,
    /// Есть ли предыдущая страница.
    pub has_previous: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Главная лента.
pub struct IndexPage {
    /// Страница постов.
    pub page: Page,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Лента группы.
pub struct GroupPage {
    /// Группа.
    pub group: Group,
    /// Страница постов группы.
    pub page: Page,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Профиль автора.
pub struct ProfilePage {
    /// Автор.
    pub author: Author,
    /// Сколько всего постов у автора.
    pub post_count: i64,
    /// Страница постов автора.
    pub page: Page,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Страница одного поста.
pub struct PostPage {
    /// Автор.
    pub author: Author,
    /// Пост.
    pub post: Post,
    /// Сколько всего постов у автора.
    pub post_count: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
/// Значения полей формы в том виде, в каком их покажет сервер.
pub struct FormValues {
    /// Текст.
    pub text: String,
    /// Выбранная группа (id строкой), пусто если без группы.
    pub group: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Форма создания или редактирования поста.
pub struct FormPage {
    /// `true` для редактирования.
    pub is_edit: bool,
    /// Редактируемый пост.
    pub post_id: Option<i64>,
    /// Значения полей.
    pub form: FormValues,
    /// Ошибки по полям.
    pub errors: BTreeMap<String, Vec<String>>,
    /// Доступные группы.
    pub groups: Vec<Group>,
}

#[derive(Debug, Clone)]
/// Результат отправки формы поста.
pub enum Submission {
    /// Форма принята, сервер перенаправил по адресу `Location`.
    Redirected(String),
    /// Форма отклонена; сервер вернул её с ошибками.
    Rejected(FormPage),
}
