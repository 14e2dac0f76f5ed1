//! Amadeus self-service API client
//!
//! Performs the OAuth2 client-credentials handshake once per run, then serves
//! the two lookups the monitor needs: city → airport code, and round-trip
//! flight offers for a route. Every call is a single attempt with a fixed
//! timeout; failures are returned to the caller untouched.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::ProviderSettings;
use crate::resolver::LocationLookup;
use crate::search::{FlightOfferSource, OfferQuery};

const TOKEN_PATH: &str = "/v1/security/oauth2/token";
const CITY_SEARCH_PATH: &str = "/v1/reference-data/locations/cities";
const FLIGHT_OFFERS_PATH: &str = "/v2/shopping/flight-offers";

/// Timeout for the token handshake and code lookups
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for flight offer searches
const SEARCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Errors that can occur when talking to the flight provider
#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP request failed (connection, timeout, body read)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success status
    #[error("API error: {status} - {body}")]
    Status { status: u16, body: String },

    /// The token handshake did not yield a usable token
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The response body did not have the expected shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// Token endpoint response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Location search response
#[derive(Debug, Deserialize)]
struct LocationsResponse {
    #[serde(default)]
    data: Vec<LocationRecord>,
}

#[derive(Debug, Deserialize)]
struct LocationRecord {
    #[serde(rename = "iataCode", default)]
    iata_code: Option<String>,
}

/// Flight offers search response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlightOffersResponse {
    #[serde(default)]
    pub data: Vec<OfferRecord>,
}

/// One offer as returned by the provider
#[derive(Debug, Clone, Deserialize)]
pub struct OfferRecord {
    pub price: PriceRecord,
    #[serde(default)]
    pub itineraries: Vec<Itinerary>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriceRecord {
    /// Decimal amount encoded as a string, e.g. `"612.37"`
    pub total: String,
    #[serde(default)]
    pub currency: Option<String>,
}

/// One direction of travel; the first itinerary is outbound, the second inbound
#[derive(Debug, Clone, Deserialize)]
pub struct Itinerary {
    #[serde(default)]
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Segment {
    pub departure: SegmentEndpoint,
    pub arrival: SegmentEndpoint,
    #[serde(rename = "carrierCode", default)]
    pub carrier_code: Option<String>,
    #[serde(default)]
    pub number: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SegmentEndpoint {
    #[serde(rename = "iataCode")]
    pub iata_code: String,
    /// Local timestamp, e.g. `"2026-11-02T09:35:00"`
    pub at: String,
}

/// Authenticated client for the Amadeus API
#[derive(Debug, Clone)]
pub struct AmadeusClient {
    http_client: Client,
    base_url: String,
    token: String,
}

impl AmadeusClient {
    /// Runs the token handshake and returns an authenticated client
    pub async fn connect(settings: &ProviderSettings) -> Result<Self, ProviderError> {
        let http_client = Client::new();
        let base_url = settings.base_url.trim_end_matches('/').to_string();

        info!("Obtaining access token from the flight provider");
        let response = http_client
            .post(format!("{}{}", base_url, TOKEN_PATH))
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", settings.api_key.as_str()),
                ("client_secret", settings.api_secret.as_str()),
            ])
            .timeout(LOOKUP_TIMEOUT)
            .send()
            .await?;

        let token: TokenResponse = decode(response).await?;
        if token.access_token.trim().is_empty() {
            return Err(ProviderError::Auth("empty access token".to_string()));
        }
        debug!(expires_in = ?token.expires_in, "Access token obtained");

        Ok(Self {
            http_client,
            base_url,
            token: token.access_token,
        })
    }

    /// Creates a client around an already issued token (for testing)
    #[cfg(test)]
    pub fn with_token(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl LocationLookup for AmadeusClient {
    async fn lookup_code(&self, city: &str) -> Result<Option<String>, ProviderError> {
        debug!(city, "Searching for location code");

        let response = self
            .http_client
            .get(self.url(CITY_SEARCH_PATH))
            .bearer_auth(&self.token)
            .query(&[("keyword", city), ("max", "1"), ("include", "AIRPORTS")])
            .timeout(LOOKUP_TIMEOUT)
            .send()
            .await?;

        let locations: LocationsResponse = decode(response).await?;
        Ok(first_code(locations))
    }
}

#[async_trait]
impl FlightOfferSource for AmadeusClient {
    async fn search_offers(&self, query: &OfferQuery) -> Result<FlightOffersResponse, ProviderError> {
        debug!(
            origin = %query.origin,
            destination = %query.destination,
            "Searching flight offers"
        );

        let params = [
            ("originLocationCode", query.origin.clone()),
            ("destinationLocationCode", query.destination.clone()),
            ("departureDate", query.depart.format("%Y-%m-%d").to_string()),
            ("returnDate", query.return_date.format("%Y-%m-%d").to_string()),
            ("adults", "1".to_string()),
            ("nonStop", query.non_stop.to_string()),
            ("currencyCode", query.currency.clone()),
            ("max", query.max_results.to_string()),
        ];

        let response = self
            .http_client
            .get(self.url(FLIGHT_OFFERS_PATH))
            .bearer_auth(&self.token)
            .query(&params)
            .timeout(SEARCH_TIMEOUT)
            .send()
            .await?;

        decode(response).await
    }
}

/// Picks the first non-blank code out of a location search
fn first_code(locations: LocationsResponse) -> Option<String> {
    locations
        .data
        .into_iter()
        .next()
        .and_then(|record| record.iata_code)
        .map(|code| code.trim().to_string())
        .filter(|code| !code.is_empty())
}

/// Checks the status and decodes the JSON body of a provider response
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ProviderError> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        return Err(ProviderError::Status {
            status: status.as_u16(),
            body: text,
        });
    }

    serde_json::from_str(&text).map_err(|e| ProviderError::MalformedResponse(e.to_string()))
}
