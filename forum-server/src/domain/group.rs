use serde::{Deserialize, Serialize};

use super::error::DomainError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Group {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) slug: String,
}

impl Group {
    pub(crate) fn new(
        id: i64,
        title: impl Into<String>,
        slug: impl Into<String>,
    ) -> Result<Self, DomainError> {
        if id <= 0 {
            return Err(DomainError::Validation {
                field: "id",
                message: "must be > 0",
            });
        }

        Ok(Self {
            id,
            title: normalize_title(&title.into())?,
            slug: normalize_slug(&slug.into())?,
        })
    }
}

/// A group definition supplied out-of-band, e.g. through `SEED_GROUPS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NewGroup {
    pub(crate) title: String,
    pub(crate) slug: String,
}

impl NewGroup {
    pub(crate) fn new(title: &str, slug: &str) -> Result<Self, DomainError> {
        Ok(Self {
            title: normalize_title(title)?,
            slug: normalize_slug(slug)?,
        })
    }

    /// Parses `Title:slug`.
    pub(crate) fn parse(raw: &str) -> Result<Self, DomainError> {
        let (title, slug) = raw.rsplit_once(':').ok_or(DomainError::Validation {
            field: "group",
            message: "must look like 'Title:slug'",
        })?;
        Self::new(title, slug)
    }
}

fn normalize_title(title: &str) -> Result<String, DomainError> {
    let title = title.trim();
    let len = title.chars().count();
    if len == 0 || len > 200 {
        return Err(DomainError::Validation {
            field: "title",
            message: "must be 1..200 chars",
        });
    }
    Ok(title.to_string())
}

fn normalize_slug(slug: &str) -> Result<String, DomainError> {
    let slug = slug.trim();
    let valid_chars = slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
    if slug.is_empty() || slug.len() > 50 || !valid_chars {
        return Err(DomainError::Validation {
            field: "slug",
            message: "must be 1..50 chars of [a-z0-9_-]",
        });
    }
    Ok(slug.to_string())
}

#[cfg(test)]
mod tests {
    use super::{Group, NewGroup};
    use crate::domain::error::DomainError;

    #[test]
    fn group_new_trims_title() {
        let group = Group::new(1, "  Cats  ", "cats").expect("group must be valid");
        assert_eq!(group.title, "Cats");
        assert_eq!(group.slug, "cats");
    }

    #[test]
    fn slug_rejects_non_url_safe_chars() {
        for slug in ["", "Cats", "cats and dogs", "котики", "a/b"] {
            let err = Group::new(1, "Cats", slug).expect_err("slug must be rejected");
            assert!(matches!(err, DomainError::Validation { field: "slug", .. }));
        }
    }

    #[test]
    fn new_group_parses_title_and_slug() {
        let group = NewGroup::parse(" Rust: news : rust-news ").expect("must parse");
        assert_eq!(group.title, "Rust: news");
        assert_eq!(group.slug, "rust-news");
    }

    #[test]
    fn new_group_parse_requires_separator() {
        assert!(NewGroup::parse("no-separator").is_err());
    }
}
