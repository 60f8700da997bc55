use super::http::{HttpClient, HttpResponse};
use crate::domain::ports::RegistrationRepository;
use crate::domain::profile::Rank;
use crate::domain::program::{Currency, Fee};
use crate::domain::registration::{Registration, RegistrationStatus};
use crate::error::{EnrollmentError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use hyper::header::{ACCEPT, CONTENT_TYPE, HeaderName, HeaderValue};
use hyper::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const NO_METADATA: &str = "application/json;odata=nometadata";
const API_VERSION: &str = "2019-02-02";
const NEXT_PARTITION_KEY: &str = "x-ms-continuation-nextpartitionkey";
const NEXT_ROW_KEY: &str = "x-ms-continuation-nextrowkey";

/// A registration as stored in the cloud table.
///
/// Partitioned by program display name, one row per generated id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RegistrationEntity {
    pub partition_key: String,
    pub row_key: String,
    pub name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub formation: String,
    pub program_code: String,
    pub institution: String,
    pub amount: Fee,
    pub currency: Currency,
    pub rank: Option<Rank>,
    pub status: RegistrationStatus,
    pub timestamp: DateTime<Utc>,
}

impl From<&Registration> for RegistrationEntity {
    fn from(registration: &Registration) -> Self {
        Self {
            partition_key: registration.program_name.clone(),
            row_key: registration.id.to_string(),
            name: registration.name.clone(),
            email: registration.email.clone(),
            phone_number: registration.phone.clone(),
            formation: registration.program_name.clone(),
            program_code: registration.program_code.clone(),
            institution: registration.institution.clone(),
            amount: registration.amount,
            currency: registration.currency.clone(),
            rank: registration.rank,
            status: registration.status,
            timestamp: registration.created_at,
        }
    }
}

impl TryFrom<RegistrationEntity> for Registration {
    type Error = EnrollmentError;

    fn try_from(entity: RegistrationEntity) -> Result<Self> {
        let id = Uuid::parse_str(&entity.row_key).map_err(|e| {
            EnrollmentError::StorageUnavailable(format!(
                "row key {} is not a registration id: {e}",
                entity.row_key
            ))
        })?;
        Ok(Self {
            id,
            sequence: None,
            name: entity.name,
            email: entity.email,
            phone: entity.phone_number,
            rank: entity.rank,
            program_code: entity.program_code,
            program_name: entity.formation,
            institution: entity.institution,
            amount: entity.amount,
            currency: entity.currency,
            status: entity.status,
            created_at: entity.timestamp,
        })
    }
}

#[derive(Deserialize)]
struct EntityPage {
    value: Vec<RegistrationEntity>,
}

/// Registration table hosted by an Azure-Table-compatible REST service.
///
/// Requests are authorized with a SAS token appended to every URL.
pub struct TableServiceRepository {
    client: HttpClient,
    endpoint: String,
    table: String,
    sas_token: String,
}

impl TableServiceRepository {
    /// # Arguments
    ///
    /// * `endpoint` - Service root, e.g. `https://account.table.core.windows.net`.
    /// * `table` - Table name.
    /// * `sas_token` - Shared access signature query string, with or without the leading `?`.
    pub fn new(
        client: HttpClient,
        endpoint: impl Into<String>,
        table: impl Into<String>,
        sas_token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            table: table.into(),
            sas_token: sas_token.into().trim_start_matches('?').to_string(),
        }
    }

    fn url(&self, resource: &str, extra_query: &[(&str, &str)]) -> Result<String> {
        let mut url = format!("{}/{}", self.endpoint, resource);
        let mut query = Vec::new();
        if !self.sas_token.is_empty() {
            query.push(self.sas_token.clone());
        }
        if !extra_query.is_empty() {
            query.push(
                serde_urlencoded::to_string(extra_query)
                    .map_err(|e| EnrollmentError::StorageUnavailable(e.to_string()))?,
            );
        }
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query.join("&"));
        }
        Ok(url)
    }

    fn headers() -> [(HeaderName, HeaderValue); 3] {
        [
            (ACCEPT, HeaderValue::from_static(NO_METADATA)),
            (CONTENT_TYPE, HeaderValue::from_static("application/json")),
            (
                HeaderName::from_static("x-ms-version"),
                HeaderValue::from_static(API_VERSION),
            ),
        ]
    }

    /// Maps a non-success status to the storage error taxonomy.
    fn check_status(response: &HttpResponse) -> Result<()> {
        let status = response.status;
        if status.is_success() {
            return Ok(());
        }
        let detail = String::from_utf8_lossy(&response.body).into_owned();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(
                EnrollmentError::StorageUnavailable(format!("authorization failed ({status})")),
            ),
            s if s.is_server_error() => Err(EnrollmentError::StorageUnavailable(format!(
                "{status}: {detail}"
            ))),
            _ => Err(EnrollmentError::WriteFailed(format!("{status}: {detail}"))),
        }
    }
}

#[async_trait]
impl RegistrationRepository for TableServiceRepository {
    async fn append(&self, registration: Registration) -> Result<Registration> {
        let entity = RegistrationEntity::from(&registration);
        let body = serde_json::to_vec(&entity)
            .map_err(|e| EnrollmentError::WriteFailed(format!("Serialization error: {e}")))?;
        let url = self.url(&self.table, &[])?;

        let mut headers = Self::headers().to_vec();
        headers.push((
            HeaderName::from_static("prefer"),
            HeaderValue::from_static("return-no-content"),
        ));

        let response = self
            .client
            .send(Method::POST, &url, &headers, Bytes::from(body))
            .await
            .map_err(|e| EnrollmentError::StorageUnavailable(e.to_string()))?;
        Self::check_status(&response)?;

        tracing::debug!(partition = %entity.partition_key, row = %entity.row_key, "entity inserted");
        Ok(registration)
    }

    async fn list(&self) -> Result<Vec<Registration>> {
        let resource = format!("{}()", self.table);
        let mut registrations = Vec::new();
        let mut continuation: Option<(String, String)> = None;

        loop {
            let url = {
                let mut extra: Vec<(&str, &str)> = Vec::new();
                if let Some((partition, row)) = &continuation {
                    extra.push(("NextPartitionKey", partition.as_str()));
                    if !row.is_empty() {
                        extra.push(("NextRowKey", row.as_str()));
                    }
                }
                self.url(&resource, &extra)?
            };

            let response = self
                .client
                .send(Method::GET, &url, &Self::headers(), Bytes::new())
                .await
                .map_err(|e| EnrollmentError::StorageUnavailable(e.to_string()))?;
            Self::check_status(&response)?;

            let page: EntityPage = serde_json::from_slice(&response.body).map_err(|e| {
                EnrollmentError::StorageUnavailable(format!("unreadable entity page: {e}"))
            })?;
            for entity in page.value {
                registrations.push(Registration::try_from(entity)?);
            }

            continuation = response.header(NEXT_PARTITION_KEY).map(|partition| {
                let row = response.header(NEXT_ROW_KEY).unwrap_or_default();
                (partition.to_string(), row.to_string())
            });
            if continuation.is_none() {
                break;
            }
        }

        registrations.sort_by_key(|r| r.created_at);
        Ok(registrations)
    }
}
