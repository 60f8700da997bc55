use crate::domain::ports::RegistrationRepositoryBox;
use crate::domain::registration::{Registration, RegistrationDraft};
use crate::error::Result;

/// Records registration attempts in the configured table.
///
/// Every call stamps a new UUID, so identical drafts yield distinct records.
pub struct TransactionStore {
    repository: RegistrationRepositoryBox,
}

impl TransactionStore {
    pub fn new(repository: RegistrationRepositoryBox) -> Self {
        Self { repository }
    }

    pub async fn create_transaction(&self, draft: RegistrationDraft) -> Result<Registration> {
        let registration = draft.into_registration();
        let id = registration.id;
        match self.repository.append(registration).await {
            Ok(stored) => {
                tracing::info!(%id, program = %stored.program_code, "registration recorded");
                Ok(stored)
            }
            Err(e) => {
                tracing::warn!(%id, error = %e, "failed to record registration");
                Err(e)
            }
        }
    }

    /// Every stored registration, for the admin view.
    pub async fn list_transactions(&self) -> Result<Vec<Registration>> {
        self.repository.list().await
    }
}
