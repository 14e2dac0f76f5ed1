//! Sheety destination store client
//!
//! Reads the watched destinations and subscriber emails from a Google Sheet
//! exposed through Sheety, and writes resolved codes back to it.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use super::Destination;
use crate::config::StoreSettings;
use crate::monitor::DestinationStore;

/// Timeout for every store request
const STORE_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur when talking to the destination store
#[derive(Debug, Error)]
pub enum StoreError {
    /// HTTP request failed (connection, timeout, body read)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a non-success status
    #[error("Store error: {status} - {body}")]
    Status { status: u16, body: String },

    /// The response body did not have the expected shape
    #[error("Malformed store response: {0}")]
    MalformedResponse(String),
}

/// Body of the prices sheet
#[derive(Debug, Deserialize)]
struct PricesResponse {
    #[serde(default)]
    prices: Vec<PriceRow>,
}

/// One row of the prices sheet
#[derive(Debug, Deserialize)]
struct PriceRow {
    id: u64,
    city: String,
    #[serde(rename = "iataCode", default)]
    iata_code: Option<String>,
    #[serde(rename = "lowestPrice")]
    lowest_price: f64,
}

impl From<PriceRow> for Destination {
    fn from(row: PriceRow) -> Self {
        let code = row
            .iata_code
            .map(|code| code.trim().to_string())
            .filter(|code| !code.is_empty());
        Destination {
            id: row.id,
            city: row.city,
            code,
            target_price: row.lowest_price,
        }
    }
}

/// Body of the users sheet
#[derive(Debug, Deserialize)]
struct UsersResponse {
    #[serde(default)]
    users: Vec<UserRow>,
}

#[derive(Debug, Deserialize)]
struct UserRow {
    #[serde(default)]
    email: Option<String>,
}

/// Body of a code update
#[derive(Debug, Serialize)]
struct CodeUpdate<'a> {
    price: CodeUpdateFields<'a>,
}

#[derive(Debug, Serialize)]
struct CodeUpdateFields<'a> {
    #[serde(rename = "iataCode")]
    iata_code: &'a str,
}

/// Client for the Sheety-backed destination store
#[derive(Debug, Clone)]
pub struct SheetyClient {
    http_client: Client,
    prices_endpoint: String,
    users_endpoint: String,
    token: Option<String>,
}

impl SheetyClient {
    pub fn new(settings: &StoreSettings) -> Self {
        Self {
            http_client: Client::new(),
            prices_endpoint: settings.prices_endpoint.trim_end_matches('/').to_string(),
            users_endpoint: settings.users_endpoint.clone(),
            token: settings.token.clone(),
        }
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.timeout(STORE_TIMEOUT);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl DestinationStore for SheetyClient {
    async fn fetch_all(&self) -> Result<Vec<Destination>, StoreError> {
        let response = self
            .authorized(self.http_client.get(&self.prices_endpoint))
            .send()
            .await?;

        let body: PricesResponse = decode(response).await?;
        Ok(body.prices.into_iter().map(Destination::from).collect())
    }

    async fn persist_code(&self, id: u64, code: &str) -> Result<(), StoreError> {
        let body = CodeUpdate {
            price: CodeUpdateFields { iata_code: code },
        };
        let response = self
            .authorized(
                self.http_client
                    .put(format!("{}/{}", self.prices_endpoint, id))
                    .json(&body),
            )
            .send()
            .await?;

        check_status(response).await?;
        debug!(id, code, "Persisted destination code");
        Ok(())
    }

    async fn fetch_subscriber_emails(&self) -> Result<Vec<String>, StoreError> {
        let response = self
            .authorized(self.http_client.get(&self.users_endpoint))
            .send()
            .await?;

        let body: UsersResponse = decode(response).await?;
        Ok(emails(body))
    }
}

/// Non-blank emails from the users sheet, in sheet order
fn emails(body: UsersResponse) -> Vec<String> {
    body.users
        .into_iter()
        .filter_map(|user| user.email)
        .map(|email| email.trim().to_string())
        .filter(|email| !email.is_empty())
        .collect()
}

async fn check_status(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Status {
        status: status.as_u16(),
        body,
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, StoreError> {
    let text = check_status(response).await?.text().await?;
    serde_json::from_str(&text).map_err(|e| StoreError::MalformedResponse(e.to_string()))
}
