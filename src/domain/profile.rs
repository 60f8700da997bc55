use crate::error::ValidationError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("valid email pattern")
});

/// CNC preparatory track the student comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Rank {
    Mp,
    Psi,
    Tsi,
}

impl Rank {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rank::Mp => "MP",
            Rank::Psi => "PSI",
            Rank::Tsi => "TSI",
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rank {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MP" => Ok(Rank::Mp),
            "PSI" => Ok(Rank::Psi),
            "TSI" => Ok(Rank::Tsi),
            other => Err(format!("unknown CNC track '{other}', expected MP, PSI or TSI")),
        }
    }
}

/// Contact details and preferences entered by a student.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Profile {
    pub name: String,
    pub email: String,
    pub rank: Option<Rank>,
    pub phone: Option<String>,
    pub interests: Option<String>,
}

impl Profile {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            ..Default::default()
        }
    }

    pub fn with_rank(mut self, rank: Rank) -> Self {
        self.rank = Some(rank);
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_interests(mut self, interests: impl Into<String>) -> Self {
        self.interests = Some(interests.into());
        self
    }
}

/// Whether a profile must list interests to be accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterestPolicy {
    #[default]
    Optional,
    Required,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileValidator {
    interests: InterestPolicy,
}

impl ProfileValidator {
    pub fn new(interests: InterestPolicy) -> Self {
        Self { interests }
    }

    /// Checks name, then email, then interests, returning the first failure.
    pub fn validate(&self, profile: &Profile) -> Result<(), ValidationError> {
        if profile.name.trim().is_empty() {
            return Err(ValidationError::MissingName);
        }
        if !is_valid_email(&profile.email) {
            return Err(ValidationError::InvalidEmail);
        }
        if self.interests == InterestPolicy::Required {
            let has_interest = profile
                .interests
                .as_deref()
                .is_some_and(|s| s.split(',').any(|token| !token.trim().is_empty()));
            if !has_interest {
                return Err(ValidationError::MissingInterests);
            }
        }
        Ok(())
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}
