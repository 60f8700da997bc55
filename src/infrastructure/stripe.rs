use super::http::HttpClient;
use crate::domain::payment::{PaymentIntentRequest, PaymentReference};
use crate::domain::ports::PaymentGateway;
use crate::error::{EnrollmentError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use hyper::Method;
use hyper::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use serde::Deserialize;

pub const DEFAULT_API_BASE: &str = "https://api.stripe.com";

#[derive(Deserialize)]
struct PaymentIntentCreated {
    id: Option<String>,
    client_secret: String,
}

#[derive(Deserialize)]
struct ProviderErrorEnvelope {
    error: ProviderError,
}

#[derive(Deserialize)]
struct ProviderError {
    message: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

/// Creates payment intents through Stripe's REST API.
pub struct StripeGateway {
    client: HttpClient,
    api_base: String,
    secret_key: String,
}

impl StripeGateway {
    pub fn new(client: HttpClient, api_base: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            secret_key: secret_key.into(),
        }
    }

    /// Form body for `POST /v1/payment_intents`, one `payment_method_types[]` pair per method.
    pub fn encode_form(request: &PaymentIntentRequest) -> Result<String> {
        if request.payment_method_types.is_empty() {
            return Err(EnrollmentError::PaymentProvider(
                "no payment method requested".to_string(),
            ));
        }
        let mut fields = vec![
            ("amount", request.amount_minor.to_string()),
            ("currency", request.currency.as_str().to_ascii_lowercase()),
        ];
        for method in &request.payment_method_types {
            fields.push(("payment_method_types[]", method.clone()));
        }
        serde_urlencoded::to_string(&fields)
            .map_err(|e| EnrollmentError::PaymentProvider(e.to_string()))
    }

    /// Maps a provider response to a reference or a descriptive error.
    pub fn parse_response(status: u16, body: &[u8]) -> Result<PaymentReference> {
        if (200..300).contains(&status) {
            let created: PaymentIntentCreated = serde_json::from_slice(body).map_err(|e| {
                EnrollmentError::PaymentProvider(format!("unreadable provider response: {e}"))
            })?;
            return Ok(PaymentReference {
                intent_id: created.id,
                client_secret: created.client_secret,
            });
        }

        let detail = serde_json::from_slice::<ProviderErrorEnvelope>(body)
            .ok()
            .and_then(|envelope| match (envelope.error.kind, envelope.error.message) {
                (Some(kind), Some(message)) => Some(format!("{kind}: {message}")),
                (None, Some(message)) => Some(message),
                (Some(kind), None) => Some(kind),
                (None, None) => None,
            })
            .unwrap_or_else(|| String::from_utf8_lossy(body).into_owned());
        Err(EnrollmentError::PaymentProvider(format!(
            "status {status}: {detail}"
        )))
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_payment_intent(
        &self,
        request: PaymentIntentRequest,
    ) -> Result<PaymentReference> {
        let body = Self::encode_form(&request)?;
        let url = format!("{}/v1/payment_intents", self.api_base);
        let auth = HeaderValue::from_str(&format!("Bearer {}", self.secret_key))
            .map_err(|_| EnrollmentError::PaymentProvider("malformed API key".to_string()))?;
        let headers = [
            (AUTHORIZATION, auth),
            (
                CONTENT_TYPE,
                HeaderValue::from_static("application/x-www-form-urlencoded"),
            ),
        ];

        let response = self
            .client
            .send(Method::POST, &url, &headers, Bytes::from(body))
            .await
            .map_err(|e| EnrollmentError::PaymentProvider(e.to_string()))?;

        Self::parse_response(response.status.as_u16(), &response.body)
    }
}
