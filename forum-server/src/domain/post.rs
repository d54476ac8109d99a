use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::group::Group;

pub(crate) const REQUIRED_MESSAGE: &str = "This field is required.";
pub(crate) const INVALID_CHOICE_MESSAGE: &str =
    "Select a valid choice. That choice is not one of the available choices.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Author {
    pub(crate) id: i64,
    pub(crate) username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Post {
    pub(crate) id: i64,
    pub(crate) text: String,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) author: Author,
    pub(crate) group: Option<Group>,
}

impl Post {
    pub(crate) fn new(
        id: i64,
        text: impl Into<String>,
        created_at: DateTime<Utc>,
        author: Author,
        group: Option<Group>,
    ) -> Result<Self, DomainError> {
        validate_positive_i64("id", id)?;
        validate_positive_i64("author_id", author.id)?;
        let text = normalize_text(&text.into()).ok_or(DomainError::Validation {
            field: "text",
            message: "must not be empty",
        })?;

        Ok(Self {
            id,
            text,
            created_at,
            author,
            group,
        })
    }

    pub(crate) fn is_authored_by(&self, username: &str) -> bool {
        self.author.username == username
    }
}

/// Field name to messages, ordered by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub(crate) struct FormErrors(BTreeMap<&'static str, Vec<String>>);

impl FormErrors {
    pub(crate) fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn field(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub(crate) fn into_map(self) -> BTreeMap<String, Vec<String>> {
        self.0
            .into_iter()
            .map(|(field, messages)| (field.to_string(), messages))
            .collect()
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.0.keys().copied().collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

/// Post form exactly as submitted. `group` holds the raw choice value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct PostForm {
    pub(crate) text: String,
    pub(crate) group: Option<String>,
}

/// Result of a successful [`PostForm::clean`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CleanedPost {
    pub(crate) text: String,
    pub(crate) group: Option<Group>,
}

impl PostForm {
    /// Prefills the form from an existing post.
    pub(crate) fn from_post(post: &Post) -> Self {
        Self {
            text: post.text.clone(),
            group: post.group.as_ref().map(|group| group.id.to_string()),
        }
    }

    /// Validates the submission against the available group choices.
    ///
    /// Every field is checked so that all errors are reported at once.
    pub(crate) fn clean(&self, choices: &[Group]) -> Result<CleanedPost, FormErrors> {
        let mut errors = FormErrors::default();

        let text = normalize_text(&self.text);
        if text.is_none() {
            errors.add("text", REQUIRED_MESSAGE);
        }

        let group = match self.group.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => {
                let chosen = raw
                    .parse::<i64>()
                    .ok()
                    .and_then(|id| choices.iter().find(|group| group.id == id));
                if chosen.is_none() {
                    errors.add("group", INVALID_CHOICE_MESSAGE);
                }
                chosen.cloned()
            }
        };

        match text {
            Some(text) if errors.is_empty() => Ok(CleanedPost { text, group }),
            _ => Err(errors),
        }
    }
}

fn validate_positive_i64(field: &'static str, value: i64) -> Result<(), DomainError> {
    if value <= 0 {
        return Err(DomainError::Validation {
            field,
            message: "must be > 0",
        });
    }
    Ok(())
}

fn normalize_text(text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some(text.to_string())
}
