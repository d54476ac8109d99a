use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, header, redirect};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::time::Duration;

use crate::error::{ForumClientError, ForumClientResult};
use crate::models::{
    AuthResponse, FormPage, GroupPage, IndexPage, PostPage, ProfilePage, Submission,
};

const LOGIN_PATH: &str = "/auth/login/";

#[derive(Debug, Serialize)]
struct RegisterRequestDto<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct LoginRequestDto<'a> {
    username: &'a str,
    password: &'a str,
}

/// Поля формы поста; пустой `group` означает «без группы».
#[derive(Debug, Serialize)]
struct PostFormDto<'a> {
    text: &'a str,
    group: String,
}

impl<'a> PostFormDto<'a> {
    fn new(text: &'a str, group: Option<i64>) -> Self {
        Self {
            text,
            group: group.map(|id| id.to_string()).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct PageQuery {
    page: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorResponseDto {
    error: Option<String>,
}

#[derive(Debug, Clone)]
/// HTTP-клиент для работы с `forum-server`.
///
/// Редиректы не выполняются автоматически: для форм они и есть ответ.
pub struct HttpClient {
    base_url: String,
    client: Client,
}

impl HttpClient {
    /// Создаёт новый HTTP-клиент с базовым URL сервера.
    pub fn new(base_url: impl Into<String>) -> ForumClientResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(15))
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let request = self.client.request(method, self.endpoint(path));
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn decode_error(response: Response) -> ForumClientError {
        let status = response.status();

        let message = match response.json::<ErrorResponseDto>().await {
            Ok(body) => body
                .error
                .unwrap_or_else(|| format!("http status {status}")),
            Err(_) => format!("http status {status}"),
        };
        ForumClientError::from_http_status(status, Some(message))
    }

    async fn send(request: RequestBuilder) -> ForumClientResult<Response> {
        request.send().await.map_err(ForumClientError::from_reqwest)
    }

    /// Успешный ответ → JSON, редирект → `Redirected` (или `Unauthorized` для страницы входа).
    async fn read_json<T: DeserializeOwned>(response: Response) -> ForumClientResult<T> {
        if response.status().is_redirection() {
            return Err(redirect_error(&location(&response)?));
        }
        if !response.status().is_success() {
            return Err(Self::decode_error(response).await);
        }
        response
            .json::<T>()
            .await
            .map_err(ForumClientError::from_reqwest)
    }

    /// Отправка формы: редирект означает успех, `200` означает форму с ошибками.
    async fn read_submission(response: Response) -> ForumClientResult<Submission> {
        let status = response.status();
        if status.is_redirection() {
            let target = location(&response)?;
            if is_login_redirect(&target) {
                return Err(ForumClientError::Unauthorized);
            }
            return Ok(Submission::Redirected(target));
        }
        if status == StatusCode::OK {
            let form = response
                .json::<FormPage>()
                .await
                .map_err(ForumClientError::from_reqwest)?;
            return Ok(Submission::Rejected(form));
        }
        Err(Self::decode_error(response).await)
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        page: Option<u32>,
        token: Option<&str>,
    ) -> ForumClientResult<T> {
        let mut request = self.request(Method::GET, path, token);
        if let Some(page) = page {
            request = request.query(&PageQuery { page });
        }
        Self::read_json(Self::send(request).await?).await
    }

    /// Регистрирует пользователя и возвращает JWT + данные пользователя.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> ForumClientResult<AuthResponse> {
        let payload = RegisterRequestDto {
            username,
            email,
            password,
        };
        let request = self
            .request(Method::POST, "/auth/signup/", None)
            .json(&payload);
        Self::read_json(Self::send(request).await?).await
    }

    /// Выполняет вход и возвращает JWT + данные пользователя.
    pub async fn login(&self, username: &str, password: &str) -> ForumClientResult<AuthResponse> {
        let payload = LoginRequestDto { username, password };
        let request = self.request(Method::POST, LOGIN_PATH, None).json(&payload);
        Self::read_json(Self::send(request).await?).await
    }

    /// Главная лента.
    pub async fn index(&self, page: Option<u32>, token: Option<&str>) -> ForumClientResult<IndexPage> {
        self.get_page("/", page, token).await
    }

    /// Лента группы по slug.
    pub async fn group_feed(
        &self,
        slug: &str,
        page: Option<u32>,
        token: Option<&str>,
    ) -> ForumClientResult<GroupPage> {
        self.get_page(&format!("/group/{slug}/"), page, token).await
    }

    /// Профиль автора с его постами.
    pub async fn profile(
        &self,
        username: &str,
        page: Option<u32>,
        token: Option<&str>,
    ) -> ForumClientResult<ProfilePage> {
        self.get_page(&format!("/{username}/"), page, token).await
    }

    /// Один пост; `username` должен совпадать с автором.
    pub async fn get_post(
        &self,
        username: &str,
        post_id: i64,
        token: Option<&str>,
    ) -> ForumClientResult<PostPage> {
        self.get_page(&format!("/{username}/{post_id}/"), None, token)
            .await
    }

    /// Пустая форма создания поста со списком групп.
    pub async fn new_post_form(&self, token: &str) -> ForumClientResult<FormPage> {
        self.get_page("/new/", None, Some(token)).await
    }

    /// Форма редактирования, заполненная текущими значениями поста.
    pub async fn edit_post_form(
        &self,
        token: &str,
        username: &str,
        post_id: i64,
    ) -> ForumClientResult<FormPage> {
        self.get_page(&format!("/{username}/{post_id}/edit/"), None, Some(token))
            .await
    }

    /// Отправляет форму создания поста.
    pub async fn create_post(
        &self,
        token: &str,
        text: &str,
        group: Option<i64>,
    ) -> ForumClientResult<Submission> {
        let request = self
            .request(Method::POST, "/new/", Some(token))
            .form(&PostFormDto::new(text, group));
        Self::read_submission(Self::send(request).await?).await
    }

    /// Отправляет форму редактирования поста.
    pub async fn edit_post(
        &self,
        token: &str,
        username: &str,
        post_id: i64,
        text: &str,
        group: Option<i64>,
    ) -> ForumClientResult<Submission> {
        let request = self
            .request(
                Method::POST,
                &format!("/{username}/{post_id}/edit/"),
                Some(token),
            )
            .form(&PostFormDto::new(text, group));
        Self::read_submission(Self::send(request).await?).await
    }
}

fn location(response: &Response) -> ForumClientResult<String> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .ok_or_else(|| {
            ForumClientError::UnexpectedResponse(format!(
                "redirect {} without location",
                response.status()
            ))
        })
}

fn is_login_redirect(target: &str) -> bool {
    target.starts_with(LOGIN_PATH)
}

fn redirect_error(target: &str) -> ForumClientError {
    if is_login_redirect(target) {
        ForumClientError::Unauthorized
    } else {
        ForumClientError::UnexpectedResponse(format!("redirected to {target}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_normalizes_slashes() {
        let client = HttpClient::new("http://localhost:8080/").expect("client");
        assert_eq!(client.endpoint("/new/"), "http://localhost:8080/new/");
        assert_eq!(client.endpoint("amalia/3/"), "http://localhost:8080/amalia/3/");
    }

    #[test]
    fn empty_group_is_sent_as_blank() {
        assert_eq!(PostFormDto::new("hi", None).group, "");
        assert_eq!(PostFormDto::new("hi", Some(4)).group, "4");
    }

    #[test]
    fn login_redirects_mean_unauthorized() {
        assert!(matches!(
            redirect_error("/auth/login/?next=/new/"),
            ForumClientError::Unauthorized
        ));
        assert!(matches!(
            redirect_error("/amalia/"),
            ForumClientError::UnexpectedResponse(_)
        ));
    }

    #[test]
    fn form_page_parses_server_payload() {
        let raw = r#"{
            "is_edit": true,
            "post_id": 7,
            "form": {"text": "", "group": "999"},
            "errors": {"text": ["This field is required."]},
            "groups": [{"id": 1, "title": "Cats", "slug": "cats"}]
        }"#;
        let page: FormPage = serde_json::from_str(raw).expect("must parse");
        assert_eq!(page.post_id, Some(7));
        assert_eq!(page.errors["text"][0], "This field is required.");
        assert_eq!(page.groups[0].slug, "cats");
    }
}
