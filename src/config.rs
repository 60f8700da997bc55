//! Runtime configuration: a TOML file merged with `CNC_`-prefixed
//! environment variables (`__` separates nested keys, e.g.
//! `CNC_PAYMENT__SECRET_KEY`).

use crate::application::payment::PaymentInitiator;
use crate::domain::ports::RegistrationRepositoryBox;
use crate::domain::profile::{InterestPolicy, ProfileValidator};
use crate::domain::program::{Program, ProgramCatalog};
use crate::error::{EnrollmentError, Result};
use crate::infrastructure::csv_file::CsvFileRegistrationRepository;
use crate::infrastructure::http::{DEFAULT_TIMEOUT, HttpClient};
use crate::infrastructure::in_memory::InMemoryRegistrationRepository;
use crate::infrastructure::stripe::{DEFAULT_API_BASE, StripeGateway};
use crate::infrastructure::table_service::TableServiceRepository;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "cnc-enrollment.toml";
pub const ENV_PREFIX: &str = "CNC_";
pub const DEFAULT_REGISTRATIONS_FILE: &str = "cnc-registrations.csv";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Config {
    /// Reject profiles that list no field of interest.
    #[serde(default)]
    pub require_interests: bool,
    #[serde(default)]
    pub storage: StorageConfig,
    pub payment: Option<PaymentConfig>,
    /// Replaces the built-in catalog when non-empty.
    #[serde(default)]
    pub catalog: Vec<Program>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Local CSV table, the default.
    File {
        #[serde(default = "default_registrations_file")]
        path: PathBuf,
    },
    /// Process-local table; nothing survives the process.
    Memory,
    Rocksdb {
        path: PathBuf,
    },
    Table {
        endpoint: String,
        table: String,
        #[serde(default)]
        sas_token: String,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::File {
            path: default_registrations_file(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PaymentConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    pub secret_key: String,
    /// Checkout URL template with `{client_secret}` and `{intent_id}` placeholders.
    pub checkout_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_registrations_file() -> PathBuf {
    PathBuf::from(DEFAULT_REGISTRATIONS_FILE)
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

impl Config {
    /// Loads `path` (or `cnc-enrollment.toml` when absent) and applies environment overrides.
    ///
    /// A missing file is not an error; every section has a default.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = path.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));
        Self::from_figment(
            Figment::new()
                .merge(Toml::file(file))
                .merge(Env::prefixed(ENV_PREFIX).split("__")),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        Ok(figment.extract()?)
    }

    pub fn catalog(&self) -> ProgramCatalog {
        if self.catalog.is_empty() {
            ProgramCatalog::default()
        } else {
            ProgramCatalog::new(self.catalog.clone())
        }
    }

    pub fn validator(&self) -> ProfileValidator {
        if self.require_interests {
            ProfileValidator::new(InterestPolicy::Required)
        } else {
            ProfileValidator::new(InterestPolicy::Optional)
        }
    }

    pub fn payment_initiator(&self, client: &HttpClient) -> Result<PaymentInitiator> {
        let payment = self
            .payment
            .as_ref()
            .ok_or(EnrollmentError::MissingConfig("payment"))?;
        let client = client
            .clone()
            .with_timeout(Duration::from_secs(payment.timeout_secs));
        let gateway = StripeGateway::new(client, &payment.api_base, &payment.secret_key);
        Ok(PaymentInitiator::new(
            Box::new(gateway),
            payment.checkout_url.clone(),
        ))
    }
}

impl StorageConfig {
    /// Opens the configured registration table.
    pub fn open(&self, client: &HttpClient) -> Result<RegistrationRepositoryBox> {
        match self {
            StorageConfig::File { path } => {
                Ok(Box::new(CsvFileRegistrationRepository::open(path)?))
            }
            StorageConfig::Memory => Ok(Box::new(InMemoryRegistrationRepository::new())),
            #[cfg(feature = "storage-rocksdb")]
            StorageConfig::Rocksdb { path } => Ok(Box::new(
                crate::infrastructure::rocksdb::RocksDBRegistrationRepository::open(path)?,
            )),
            #[cfg(not(feature = "storage-rocksdb"))]
            StorageConfig::Rocksdb { path } => {
                tracing::warn!(
                    path = %path.display(),
                    "Persistent storage requested, but the 'storage-rocksdb' feature is not enabled. Falling back to in-memory storage."
                );
                Ok(Box::new(InMemoryRegistrationRepository::new()))
            }
            StorageConfig::Table {
                endpoint,
                table,
                sas_token,
                timeout_secs,
            } => Ok(Box::new(TableServiceRepository::new(
                client.clone().with_timeout(Duration::from_secs(*timeout_secs)),
                endpoint,
                table,
                sas_token,
            ))),
        }
    }

    /// Whether stored registrations are lost when the process exits.
    pub fn is_volatile(&self) -> bool {
        match self {
            StorageConfig::Memory => true,
            #[cfg(not(feature = "storage-rocksdb"))]
            StorageConfig::Rocksdb { .. } => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults_without_file() {
        Jail::expect_with(|_jail| {
            let config = Config::load(None).map_err(|e| e.to_string())?;
            assert_eq!(config, Config::default());
            assert_eq!(config.catalog().len(), 5);
            Ok(())
        });
    }

    #[test]
    fn test_file_and_env_are_merged() {
        Jail::expect_with(|jail| {
            jail.create_file(
                DEFAULT_CONFIG_FILE,
                r#"
                require_interests = true

                [storage]
                backend = "table"
                endpoint = "https://acct.table.core.windows.net"
                table = "registrations"

                [payment]
                secret_key = "sk_test_file"
                checkout_url = "https://pay.test/{client_secret}"

                [[catalog]]
                code = "Civil"
                name = "Génie Civil"
                institution = "EHTP"
                fee = 750
                currency = "MAD"
                tags = ["Construction", "BTP"]
                "#,
            )?;
            jail.set_env("CNC_PAYMENT__SECRET_KEY", "sk_test_env");
            jail.set_env("CNC_STORAGE__SAS_TOKEN", "sv=1&sig=x");

            let config = Config::load(None).map_err(|e| e.to_string())?;
            assert!(config.require_interests);
            assert_eq!(
                config.storage,
                StorageConfig::Table {
                    endpoint: "https://acct.table.core.windows.net".to_string(),
                    table: "registrations".to_string(),
                    sas_token: "sv=1&sig=x".to_string(),
                    timeout_secs: 30,
                }
            );
            let payment = config.payment.as_ref().unwrap();
            assert_eq!(payment.secret_key, "sk_test_env");
            assert_eq!(payment.api_base, DEFAULT_API_BASE);
            assert_eq!(payment.timeout_secs, 30);

            let catalog = config.catalog();
            assert_eq!(catalog.len(), 1);
            assert_eq!(catalog.get("Civil").unwrap().fee.value(), dec!(750));
            Ok(())
        });
    }

    #[test]
    fn test_explicit_path() {
        Jail::expect_with(|jail| {
            jail.create_file("custom.toml", "[storage]\nbackend = \"rocksdb\"\npath = \"data\"")?;
            let config = Config::load(Some(Path::new("custom.toml"))).map_err(|e| e.to_string())?;
            assert_eq!(
                config.storage,
                StorageConfig::Rocksdb {
                    path: PathBuf::from("data")
                }
            );
            Ok(())
        });
    }

    #[test]
    fn test_default_storage_is_a_local_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                DEFAULT_CONFIG_FILE,
                "[storage]\nbackend = \"file\"\n\n[payment]\nsecret_key = \"sk\"\ncheckout_url = \"https://pay.test\"\ntimeout_secs = 5",
            )?;
            let config = Config::load(None).map_err(|e| e.to_string())?;
            assert_eq!(config.storage, StorageConfig::default());
            assert_eq!(
                config.storage,
                StorageConfig::File {
                    path: PathBuf::from(DEFAULT_REGISTRATIONS_FILE)
                }
            );
            assert!(!config.storage.is_volatile());
            assert!(StorageConfig::Memory.is_volatile());
            assert_eq!(config.payment.as_ref().unwrap().timeout_secs, 5);
            Ok(())
        });
    }

    #[test]
    fn test_payment_is_required_to_pay() {
        let config = Config::default();
        assert!(matches!(
            config.payment_initiator(&HttpClient::new()),
            Err(EnrollmentError::MissingConfig("payment"))
        ));
    }

    #[test]
    fn test_invalid_catalog_is_a_config_error() {
        Jail::expect_with(|jail| {
            jail.create_file(
                DEFAULT_CONFIG_FILE,
                "[[catalog]]\ncode = \"X\"\nname = \"X\"\ninstitution = \"Y\"\nfee = 0\ncurrency = \"MAD\"",
            )?;
            assert!(matches!(
                Config::load(None),
                Err(EnrollmentError::Config(_))
            ));
            Ok(())
        });
    }
}
