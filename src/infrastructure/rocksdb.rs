use crate::domain::ports::RegistrationRepository;
use crate::domain::registration::Registration;
use crate::error::{EnrollmentError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family holding registration rows keyed by sequence number.
pub const CF_REGISTRATIONS: &str = "registrations";
/// Column Family holding table metadata such as the next sequence number.
pub const CF_META: &str = "meta";

const NEXT_SEQUENCE_KEY: &[u8] = b"next_sequence";

/// A persistent registration table backed by RocksDB.
///
/// Rows are keyed by a big-endian `u64` sequence so iteration returns them in
/// insertion order. The sequence counter and the row are written in one batch.
///
/// `Clone` shares the underlying `Arc<DB>` and the sequence lock.
#[derive(Clone)]
pub struct RocksDBRegistrationRepository {
    db: Arc<DB>,
    sequence_lock: Arc<Mutex<()>>,
}

impl RocksDBRegistrationRepository {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the "registrations" and "meta" column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_registrations = ColumnFamilyDescriptor::new(CF_REGISTRATIONS, Options::default());
        let cf_meta = ColumnFamilyDescriptor::new(CF_META, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_registrations, cf_meta])
            .map_err(|e| EnrollmentError::StorageUnavailable(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            sequence_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            EnrollmentError::StorageUnavailable(format!("{name} column family not found"))
        })
    }

    fn next_sequence(&self) -> Result<u64> {
        let meta = self.cf(CF_META)?;
        let stored = self
            .db
            .get_cf(meta, NEXT_SEQUENCE_KEY)
            .map_err(|e| EnrollmentError::StorageUnavailable(e.to_string()))?;
        let current = match stored {
            Some(bytes) => {
                let bytes: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                    EnrollmentError::StorageUnavailable("corrupt sequence counter".to_string())
                })?;
                u64::from_be_bytes(bytes)
            }
            None => 1,
        };
        Ok(current)
    }
}

#[async_trait]
impl RegistrationRepository for RocksDBRegistrationRepository {
    async fn append(&self, mut registration: Registration) -> Result<Registration> {
        let _guard = self.sequence_lock.lock().await;

        let sequence = self.next_sequence()?;
        registration.sequence = Some(sequence);

        let value = serde_json::to_vec(&registration)
            .map_err(|e| EnrollmentError::WriteFailed(format!("Serialization error: {}", e)))?;

        let mut batch = WriteBatch::default();
        batch.put_cf(self.cf(CF_REGISTRATIONS)?, sequence.to_be_bytes(), value);
        batch.put_cf(self.cf(CF_META)?, NEXT_SEQUENCE_KEY, (sequence + 1).to_be_bytes());
        self.db
            .write(batch)
            .map_err(|e| EnrollmentError::WriteFailed(e.to_string()))?;

        Ok(registration)
    }

    async fn list(&self) -> Result<Vec<Registration>> {
        let handle = self.cf(CF_REGISTRATIONS)?;

        let mut registrations = Vec::new();
        for item in self.db.iterator_cf(handle, IteratorMode::Start) {
            let (_key, value) =
                item.map_err(|e| EnrollmentError::StorageUnavailable(e.to_string()))?;
            let registration: Registration = serde_json::from_slice(&value).map_err(|e| {
                EnrollmentError::StorageUnavailable(format!(
                    "Failed to deserialize registration: {}",
                    e
                ))
            })?;
            registrations.push(registration);
        }

        Ok(registrations)
    }
}
