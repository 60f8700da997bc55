use crate::domain::ports::RegistrationRepository;
use crate::domain::profile::Rank;
use crate::domain::program::{Currency, Fee};
use crate::domain::registration::{Registration, RegistrationStatus};
use crate::error::{EnrollmentError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// One line of the registration file.
#[derive(Debug, Serialize, Deserialize)]
struct RegistrationRow {
    id: Uuid,
    sequence: u64,
    name: String,
    email: String,
    phone: Option<String>,
    rank: Option<Rank>,
    program_code: String,
    program_name: String,
    institution: String,
    amount: String,
    currency: String,
    status: RegistrationStatus,
    created_at: DateTime<Utc>,
}

impl RegistrationRow {
    fn new(registration: &Registration, sequence: u64) -> Self {
        Self {
            id: registration.id,
            sequence,
            name: registration.name.clone(),
            email: registration.email.clone(),
            phone: registration.phone.clone(),
            rank: registration.rank,
            program_code: registration.program_code.clone(),
            program_name: registration.program_name.clone(),
            institution: registration.institution.clone(),
            amount: registration.amount.to_string(),
            currency: registration.currency.to_string(),
            status: registration.status,
            created_at: registration.created_at,
        }
    }

    fn into_registration(self) -> Result<Registration> {
        let amount = Decimal::from_str(&self.amount).map_err(|e| {
            EnrollmentError::StorageUnavailable(format!("row {}: bad amount: {e}", self.sequence))
        })?;
        Ok(Registration {
            id: self.id,
            sequence: Some(self.sequence),
            name: self.name,
            email: self.email,
            phone: self.phone,
            rank: self.rank,
            program_code: self.program_code,
            program_name: self.program_name,
            institution: self.institution,
            amount: Fee::new(amount)?,
            currency: Currency::new(&self.currency)?,
            status: self.status,
            created_at: self.created_at,
        })
    }
}

/// A durable registration table kept in a local CSV file.
///
/// Rows are appended with a header on first write and numbered from 1.
/// The file is the local default table; it survives restarts without any
/// optional feature.
#[derive(Clone)]
pub struct CsvFileRegistrationRepository {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl CsvFileRegistrationRepository {
    /// Uses `path`, creating missing parent directories. The file itself is
    /// created on the first append.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| EnrollmentError::StorageUnavailable(format!("{}: {e}", parent.display())))?;
        }
        Ok(Self {
            path,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_rows(&self) -> Result<Vec<RegistrationRow>> {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.unavailable(e)),
        };
        csv::Reader::from_reader(file)
            .into_deserialize::<RegistrationRow>()
            .map(|row| row.map_err(|e| self.unavailable(e)))
            .collect()
    }

    fn unavailable(&self, e: impl std::fmt::Display) -> EnrollmentError {
        EnrollmentError::StorageUnavailable(format!("{}: {e}", self.path.display()))
    }
}

#[async_trait]
impl RegistrationRepository for CsvFileRegistrationRepository {
    async fn append(&self, mut registration: Registration) -> Result<Registration> {
        let _guard = self.write_lock.lock().await;

        let existing = self.read_rows()?;
        let sequence = existing.last().map_or(1, |row| row.sequence + 1);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.unavailable(e))?;
        let is_new = file
            .metadata()
            .map_err(|e| self.unavailable(e))?
            .len()
            == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(is_new)
            .from_writer(file);
        writer
            .serialize(RegistrationRow::new(&registration, sequence))
            .map_err(|e| EnrollmentError::WriteFailed(e.to_string()))?;
        writer
            .flush()
            .map_err(|e| EnrollmentError::WriteFailed(e.to_string()))?;

        registration.sequence = Some(sequence);
        tracing::debug!(path = %self.path.display(), sequence, "row appended");
        Ok(registration)
    }

    async fn list(&self) -> Result<Vec<Registration>> {
        self.read_rows()?
            .into_iter()
            .map(RegistrationRow::into_registration)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::profile::Profile;
    use crate::domain::program::ProgramCatalog;
    use crate::domain::registration::RegistrationDraft;
    use tempfile::tempdir;

    fn registration(name: &str) -> Registration {
        let catalog = ProgramCatalog::default();
        RegistrationDraft::new(
            &Profile::new(name, "student@example.com").with_rank(Rank::Tsi),
            catalog.get("Electric").unwrap(),
        )
        .into_registration()
    }

    #[tokio::test]
    async fn test_missing_file_is_an_empty_table() {
        let dir = tempdir().unwrap();
        let repo = CsvFileRegistrationRepository::open(dir.path().join("registrations.csv")).unwrap();
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rows_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("registrations.csv");

        let first = registration("Ali");
        {
            let repo = CsvFileRegistrationRepository::open(&path).unwrap();
            let stored = repo.append(first.clone()).await.unwrap();
            assert_eq!(stored.sequence, Some(1));
        }

        let repo = CsvFileRegistrationRepository::open(&path).unwrap();
        let second = repo.append(registration("Sara")).await.unwrap();
        assert_eq!(second.sequence, Some(2));

        let rows = repo.list().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, first.id);
        assert_eq!(rows[0].sequence, Some(1));
        assert_eq!(rows[0].rank, Some(Rank::Tsi));
        assert_eq!(rows[0].phone, None);
        assert_eq!(rows[0].amount, first.amount);
        assert_eq!(rows[0].created_at, first.created_at);
        assert_eq!(rows[1].name, "Sara");
        assert!(rows.iter().all(|r| r.status == RegistrationStatus::Pending));

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().filter(|l| l.starts_with("id,")).count(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_storage_unavailable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("registrations.csv");
        std::fs::write(&path, "id,sequence\nnot-a-uuid,x\n").unwrap();

        let repo = CsvFileRegistrationRepository::open(&path).unwrap();
        assert!(matches!(
            repo.list().await,
            Err(EnrollmentError::StorageUnavailable(_))
        ));
        assert!(matches!(
            repo.append(registration("Ali")).await,
            Err(EnrollmentError::StorageUnavailable(_))
        ));
    }
}
