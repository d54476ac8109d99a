use thiserror::Error;

#[derive(Debug, Error)]
/// Ошибки клиентской библиотеки `forum-client`.
pub enum ForumClientError {
    /// Ошибка HTTP-транспорта (`reqwest`).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Требуется авторизация: токена нет или сервер отправил на страницу входа.
    #[error("unauthorized")]
    Unauthorized,

    /// Запрошенный ресурс не найден.
    #[error("not found")]
    NotFound,

    /// Некорректный запрос или бизнес-ошибка валидации.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Сервер ответил так, как клиент не ожидает.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// Результат операций `forum-client`.
pub type ForumClientResult<T> = Result<T, ForumClientError>;

impl ForumClientError {
    pub(crate) fn from_http_status(status: reqwest::StatusCode, message: Option<String>) -> Self {
        match status {
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                Self::Unauthorized
            }
            reqwest::StatusCode::NOT_FOUND => Self::NotFound,
            _ => {
                let message = message.unwrap_or_else(|| format!("http status {status}"));
                Self::InvalidRequest(message)
            }
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::from_http_status(status, None);
        }
        Self::Http(err)
    }
}

#[cfg(test)]
mod tests {
    use super::ForumClientError;

    #[test]
    fn maps_statuses() {
        assert!(matches!(
            ForumClientError::from_http_status(reqwest::StatusCode::NOT_FOUND, None),
            ForumClientError::NotFound
        ));
        assert!(matches!(
            ForumClientError::from_http_status(reqwest::StatusCode::UNAUTHORIZED, None),
            ForumClientError::Unauthorized
        ));
        match ForumClientError::from_http_status(
            reqwest::StatusCode::CONFLICT,
            Some("username already exists".to_string()),
        ) {
            ForumClientError::InvalidRequest(message) => {
                assert_eq!(message, "username already exists")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
