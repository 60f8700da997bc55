use crate::error::{EnrollmentError, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Application fee charged for a program.
///
/// Wraps `rust_decimal::Decimal` so a fee can never be zero or negative.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Fee(Decimal);

impl Fee {
    pub fn new(value: Decimal) -> Result<Self> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(EnrollmentError::InvalidAmount(format!(
                "fee must be positive, got {value}"
            )))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Fee {
    type Error = EnrollmentError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Fee> for Decimal {
    fn from(fee: Fee) -> Self {
        fee.0
    }
}

impl fmt::Display for Fee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

/// ISO 4217 currency code, stored upper-case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    pub fn new(code: &str) -> Result<Self> {
        let code = code.trim();
        if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(code.to_ascii_uppercase()))
        } else {
            Err(EnrollmentError::InvalidAmount(format!(
                "'{code}' is not a currency code"
            )))
        }
    }

    /// Moroccan dirham, the currency of every built-in program.
    pub fn mad() -> Self {
        Self("MAD".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Currency {
    type Error = EnrollmentError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An engineering program ("formation") a student can apply to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub code: String,
    pub name: String,
    pub institution: String,
    pub fee: Fee,
    pub currency: Currency,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Program {
    pub fn new(
        code: &str,
        name: &str,
        institution: &str,
        fee: Fee,
        currency: Currency,
        tags: &[&str],
    ) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            institution: institution.to_string(),
            fee,
            currency,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// The fee as shown to students, e.g. `500 MAD`.
    pub fn fee_label(&self) -> String {
        format!("{} {}", self.fee, self.currency)
    }
}

/// Immutable, ordered list of programs loaded once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramCatalog {
    programs: Vec<Program>,
}

impl ProgramCatalog {
    pub fn new(programs: Vec<Program>) -> Self {
        Self { programs }
    }

    pub fn get(&self, code: &str) -> Option<&Program> {
        self.programs.iter().find(|p| p.code == code)
    }

    /// Looks up a program, failing with `UnknownProgram` when the code is absent.
    pub fn require(&self, code: &str) -> Result<&Program> {
        self.get(code)
            .ok_or_else(|| EnrollmentError::UnknownProgram(code.to_string()))
    }

    pub fn programs(&self) -> &[Program] {
        &self.programs
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}

impl Default for ProgramCatalog {
    fn default() -> Self {
        let fee = Fee(dec!(500));
        let mad = Currency::mad();
        Self::new(vec![
            Program::new(
                "Data",
                "Data Science",
                "ENSIAS",
                fee,
                mad.clone(),
                &["Data", "Statistiques", "IA", "Programmation"],
            ),
            Program::new(
                "Electric",
                "Génie Électrique",
                "ENIM",
                fee,
                mad.clone(),
                &["Électricité", "Électronique", "Énergie", "Automatique"],
            ),
            Program::new(
                "Mechanique",
                "Génie Mécanique",
                "ENSAM",
                fee,
                mad.clone(),
                &["Mécanique", "Conception", "Fabrication", "Matériaux"],
            ),
            Program::new(
                "AI",
                "Intelligence Artificielle",
                "EMI",
                fee,
                mad.clone(),
                &["Informatique", "IA", "Programmation", "Machine Learning"],
            ),
            Program::new(
                "Industriel",
                "Génie Industriel",
                "EHTP",
                fee,
                mad,
                &["Logistique", "Production", "Management", "Qualité"],
            ),
        ])
    }
}
