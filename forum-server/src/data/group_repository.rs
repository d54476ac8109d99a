use async_trait::async_trait;

use crate::domain::error::DomainError;
use crate::domain::group::{Group, NewGroup};

#[async_trait]
pub(crate) trait GroupRepository: Send + Sync {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, DomainError>;
    /// All groups ordered by title.
    async fn list_groups(&self) -> Result<Vec<Group>, DomainError>;
    /// Inserts the group, or returns the existing one with the same slug.
    async fn ensure_group(&self, input: NewGroup) -> Result<Group, DomainError>;
}
