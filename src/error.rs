use thiserror::Error;

/// Reasons a student profile is rejected before anything is persisted.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter your full name")]
    MissingName,
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("Please list at least one field of interest")]
    MissingInterests,
}

#[derive(Error, Debug)]
pub enum EnrollmentError {
    #[error("Invalid profile: {0}")]
    Validation(#[from] ValidationError),
    #[error("Unknown program code: {0}")]
    UnknownProgram(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("Write failed: {0}")]
    WriteFailed(String),
    #[error("Payment provider error: {0}")]
    PaymentProvider(String),
    #[error("Cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },
    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),
    #[error("Missing configuration: {0}")]
    MissingConfig(&'static str),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for EnrollmentError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, EnrollmentError>;
