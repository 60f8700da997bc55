use super::program::Currency;
use crate::error::{EnrollmentError, Result};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::fmt;

/// Payment methods accepted for application fees.
pub const CARD: &str = "card";

/// Converts a major-unit amount to the provider's minor unit.
///
/// Multiplies by 100 and truncates toward zero, so sub-cent fractions are dropped.
pub fn to_minor_units(amount: Decimal) -> Result<i64> {
    if amount <= Decimal::ZERO {
        return Err(EnrollmentError::InvalidAmount(format!(
            "amount must be positive, got {amount}"
        )));
    }
    let minor = amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|value| value.trunc())
        .and_then(|value| value.to_i64())
        .ok_or_else(|| EnrollmentError::InvalidAmount(format!("amount {amount} is too large")))?;
    if minor == 0 {
        return Err(EnrollmentError::InvalidAmount(format!(
            "amount {amount} is below one minor unit"
        )));
    }
    Ok(minor)
}

/// What the provider is asked to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntentRequest {
    pub amount_minor: i64,
    pub currency: Currency,
    pub payment_method_types: Vec<String>,
}

impl PaymentIntentRequest {
    pub fn card(amount_minor: i64, currency: Currency) -> Self {
        Self {
            amount_minor,
            currency,
            payment_method_types: vec![CARD.to_string()],
        }
    }
}

/// Opaque handle returned by the provider for a created payment intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentReference {
    pub intent_id: Option<String>,
    pub client_secret: String,
}

/// Provider-hosted page the student is redirected to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutLink(String);

impl CheckoutLink {
    /// Substitutes `{client_secret}` and `{intent_id}` in `template`.
    ///
    /// Values are form-encoded, so a provider value containing `&`, `/` or
    /// spaces cannot change the shape of the query string.
    pub fn render(template: &str, reference: &PaymentReference) -> Result<Self> {
        let secret = encode_component(&reference.client_secret)?;
        let intent = encode_component(reference.intent_id.as_deref().unwrap_or_default())?;
        let link = template
            .replace("{client_secret}", &secret)
            .replace("{intent_id}", &intent);
        Ok(Self(link))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn encode_component(value: &str) -> Result<String> {
    let pair = serde_urlencoded::to_string([("v", value)])
        .map_err(|e| EnrollmentError::PaymentProvider(format!("cannot encode checkout value: {e}")))?;
    Ok(pair.strip_prefix("v=").unwrap_or_default().to_string())
}

impl fmt::Display for CheckoutLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
