use crate::domain::ports::RegistrationRepository;
use crate::domain::registration::Registration;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory registration table.
///
/// Rows are kept in insertion order and numbered from 1, like an
/// auto-increment key. Nothing survives the process.
#[derive(Default, Clone)]
pub struct InMemoryRegistrationRepository {
    rows: Arc<RwLock<Vec<Registration>>>,
}

impl InMemoryRegistrationRepository {
    /// Creates a new, empty in-memory table.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RegistrationRepository for InMemoryRegistrationRepository {
    async fn append(&self, mut registration: Registration) -> Result<Registration> {
        let mut rows = self.rows.write().await;
        registration.sequence = Some(rows.len() as u64 + 1);
        rows.push(registration.clone());
        Ok(registration)
    }

    async fn list(&self) -> Result<Vec<Registration>> {
        let rows = self.rows.read().await;
        Ok(rows.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::profile::Profile;
    use crate::domain::program::ProgramCatalog;
    use crate::domain::registration::RegistrationDraft;

    fn registration() -> Registration {
        let catalog = ProgramCatalog::default();
        RegistrationDraft::new(
            &Profile::new("Ali", "ali@example.com"),
            catalog.get("Industriel").unwrap(),
        )
        .into_registration()
    }

    #[tokio::test]
    async fn test_append_assigns_increasing_sequence() {
        let repo = InMemoryRegistrationRepository::new();

        let first = repo.append(registration()).await.unwrap();
        let second = repo.append(registration()).await.unwrap();
        assert_eq!(first.sequence, Some(1));
        assert_eq!(second.sequence, Some(2));

        let all = repo.list().await.unwrap();
        assert_eq!(all, vec![first, second]);
    }

    #[tokio::test]
    async fn test_clones_share_rows() {
        let repo = InMemoryRegistrationRepository::new();
        let other = repo.clone();
        repo.append(registration()).await.unwrap();
        assert_eq!(other.list().await.unwrap().len(), 1);
    }
}
