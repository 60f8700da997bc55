use super::payment::{PaymentIntentRequest, PaymentReference};
use super::registration::Registration;
use crate::error::Result;
use async_trait::async_trait;

/// Append-only table of registration records.
#[async_trait]
pub trait RegistrationRepository: Send + Sync {
    /// Persists a new record and returns it as stored (local tables fill in `sequence`).
    async fn append(&self, registration: Registration) -> Result<Registration>;
    async fn list(&self) -> Result<Vec<Registration>>;
}

/// External provider creating payment intents.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_payment_intent(&self, request: PaymentIntentRequest)
    -> Result<PaymentReference>;
}

pub type RegistrationRepositoryBox = Box<dyn RegistrationRepository>;
pub type PaymentGatewayBox = Box<dyn PaymentGateway>;
