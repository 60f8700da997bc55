use crate::domain::payment::{CheckoutLink, PaymentIntentRequest, PaymentReference, to_minor_units};
use crate::domain::ports::PaymentGatewayBox;
use crate::domain::program::{Currency, Fee};
use crate::error::Result;

/// Asks the payment provider for a card payment intent and turns the
/// returned reference into a checkout URL.
pub struct PaymentInitiator {
    gateway: PaymentGatewayBox,
    checkout_template: String,
}

impl PaymentInitiator {
    /// # Arguments
    ///
    /// * `gateway` - The provider adapter.
    /// * `checkout_template` - Checkout URL, with `{client_secret}` and `{intent_id}` placeholders.
    pub fn new(gateway: PaymentGatewayBox, checkout_template: impl Into<String>) -> Self {
        Self {
            gateway,
            checkout_template: checkout_template.into(),
        }
    }

    pub async fn initiate(&self, amount: Fee, currency: &Currency) -> Result<PaymentReference> {
        let amount_minor = to_minor_units(amount.value())?;
        let request = PaymentIntentRequest::card(amount_minor, currency.clone());
        tracing::debug!(amount_minor, %currency, "requesting payment intent");

        let reference = self.gateway.create_payment_intent(request).await?;
        tracing::info!(intent = ?reference.intent_id, "payment intent created");
        Ok(reference)
    }

    pub fn checkout_link(&self, reference: &PaymentReference) -> Result<CheckoutLink> {
        CheckoutLink::render(&self.checkout_template, reference)
    }
}
