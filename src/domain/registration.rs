use super::profile::{Profile, Rank};
use super::program::{Currency, Fee, Program};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RegistrationStatus {
    #[default]
    Pending,
    Paid,
    #[serde(other)]
    Unknown,
}

impl RegistrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Pending => "Pending",
            RegistrationStatus::Paid => "Paid",
            RegistrationStatus::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated profile paired with the program it applies to.
///
/// The fee is copied from the program at selection time.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationDraft {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub rank: Option<Rank>,
    pub program_code: String,
    pub program_name: String,
    pub institution: String,
    pub amount: Fee,
    pub currency: Currency,
}

impl RegistrationDraft {
    pub fn new(profile: &Profile, program: &Program) -> Self {
        Self {
            name: profile.name.trim().to_string(),
            email: profile.email.clone(),
            phone: profile
                .phone
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string),
            rank: profile.rank,
            program_code: program.code.clone(),
            program_name: program.name.clone(),
            institution: program.institution.clone(),
            amount: program.fee,
            currency: program.currency.clone(),
        }
    }

    /// Stamps the draft with a fresh id and creation time.
    pub fn into_registration(self) -> Registration {
        Registration {
            id: Uuid::new_v4(),
            sequence: None,
            name: self.name,
            email: self.email,
            phone: self.phone,
            rank: self.rank,
            program_code: self.program_code,
            program_name: self.program_name,
            institution: self.institution,
            amount: self.amount,
            currency: self.currency,
            status: RegistrationStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

/// Durable record of a registration and its payment attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    pub id: Uuid,
    /// Auto-incremented key assigned by local tables.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u64>,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub rank: Option<Rank>,
    pub program_code: String,
    pub program_name: String,
    pub institution: String,
    pub amount: Fee,
    pub currency: Currency,
    pub status: RegistrationStatus,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::program::ProgramCatalog;

    #[test]
    fn test_draft_copies_program_fee() {
        let catalog = ProgramCatalog::default();
        let program = catalog.get("Data").unwrap();
        let profile = Profile::new("  Ali  ", "ali@example.com").with_phone(" ");

        let draft = RegistrationDraft::new(&profile, program);
        assert_eq!(draft.name, "Ali");
        assert_eq!(draft.phone, None);
        assert_eq!(draft.amount, program.fee);
        assert_eq!(draft.program_name, "Data Science");
    }

    #[test]
    fn test_each_registration_gets_a_fresh_id() {
        let catalog = ProgramCatalog::default();
        let profile = Profile::new("Ali", "ali@example.com");
        let draft = RegistrationDraft::new(&profile, catalog.get("AI").unwrap());

        let first = draft.clone().into_registration();
        let second = draft.into_registration();
        assert_ne!(first.id, second.id);
        assert_eq!(first.status, RegistrationStatus::Pending);
        assert_eq!(first.sequence, None);
    }

    #[test]
    fn test_unrecognized_status_is_unknown() {
        let status: RegistrationStatus = serde_json::from_str("\"Refunded\"").unwrap();
        assert_eq!(status, RegistrationStatus::Unknown);
        let status: RegistrationStatus = serde_json::from_str("\"Paid\"").unwrap();
        assert_eq!(status, RegistrationStatus::Paid);
    }
}
