//! Route price search, cache first
//!
//! A fresh route cache entry always wins over the provider: freshness, not
//! price, decides whether the external search runs. Provider responses are
//! validated into a `FlightOffer` before they are cached.

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;
use tracing::info;

use crate::cache::{CacheError, RouteCache, RouteKey};
use crate::data::amadeus::{FlightOffersResponse, OfferRecord};
use crate::data::{google_flights_link, FlightOffer, ProviderError, SearchDates};

/// Searches are limited to this many offers
pub const MAX_RESULTS: u32 = 1;

/// Parameters of one external offer search
#[derive(Debug, Clone, PartialEq)]
pub struct OfferQuery {
    pub origin: String,
    pub destination: String,
    pub depart: NaiveDate,
    pub return_date: NaiveDate,
    pub currency: String,
    pub non_stop: bool,
    pub max_results: u32,
}

/// External call that searches round-trip offers
#[async_trait]
pub trait FlightOfferSource: Send + Sync {
    async fn search_offers(&self, query: &OfferQuery) -> Result<FlightOffersResponse, ProviderError>;
}

/// Errors that can occur during a price search
#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The provider's offer is missing a field the search depends on
    #[error("Malformed offer: {0}")]
    MalformedResponse(String),
}

/// Finds the current offer for a route, consulting the route cache first
#[derive(Debug, Clone)]
pub struct PriceSearch<F> {
    source: F,
    cache: RouteCache,
    currency: String,
}

impl<F: FlightOfferSource> PriceSearch<F> {
    pub fn new(source: F, cache: RouteCache, currency: impl Into<String>) -> Self {
        Self {
            source,
            cache,
            currency: currency.into(),
        }
    }

    /// Returns the offer for `origin → destination`
    ///
    /// # Returns
    /// * `Ok(Some(offer))` from a fresh cache entry, or from the provider (then cached)
    /// * `Ok(None)` if the provider has no matching offer; nothing is cached
    /// * `Err(SearchError)` on any cache, transport or parsing failure
    pub async fn search(
        &self,
        origin: &str,
        destination: &str,
        dates: &SearchDates,
    ) -> Result<Option<FlightOffer>, SearchError> {
        let key = RouteKey::new(origin, destination)?;
        if let Some(offer) = self.cache.get(&key)? {
            return Ok(Some(offer));
        }

        let query = OfferQuery {
            origin: key.origin().to_string(),
            destination: key.destination().to_string(),
            depart: dates.depart,
            return_date: dates.return_date,
            currency: self.currency.clone(),
            non_stop: true,
            max_results: MAX_RESULTS,
        };

        info!(route = %key, "Searching flights");
        let response = self.source.search_offers(&query).await?;
        let Some(record) = response.data.first() else {
            info!(route = %key, "No flights found");
            return Ok(None);
        };

        let offer = parse_offer(record)?;
        self.cache.put(&key, &offer)?;
        Ok(Some(offer))
    }
}

/// Validates a provider offer into a `FlightOffer`
///
/// Origin and destination are the airports actually flown, taken from the
/// outbound leg; the return date comes from the first segment of the inbound
/// leg. Stops are counted on the outbound leg only.
pub fn parse_offer(record: &OfferRecord) -> Result<FlightOffer, SearchError> {
    let price = record
        .price
        .total
        .trim()
        .parse::<f64>()
        .map_err(|_| malformed(format!("price.total is not a number: {:?}", record.price.total)))?;

    let outbound = record
        .itineraries
        .first()
        .ok_or_else(|| malformed("missing outbound itinerary"))?;
    let first_segment = outbound
        .segments
        .first()
        .ok_or_else(|| malformed("outbound itinerary has no segments"))?;
    let last_segment = outbound
        .segments
        .last()
        .ok_or_else(|| malformed("outbound itinerary has no segments"))?;

    let inbound_segment = record
        .itineraries
        .get(1)
        .ok_or_else(|| malformed("missing inbound itinerary"))?
        .segments
        .first()
        .ok_or_else(|| malformed("inbound itinerary has no segments"))?;

    let origin_code = first_segment.departure.iata_code.clone();
    let destination_code = last_segment.arrival.iata_code.clone();
    let depart_date = parse_date(&first_segment.departure.at)?;
    let return_date = parse_date(&inbound_segment.departure.at)?;

    Ok(FlightOffer {
        price,
        booking_url: Some(google_flights_link(&origin_code, &destination_code, depart_date)),
        origin_code,
        destination_code,
        depart_date,
        return_date,
        airline_code: first_segment.carrier_code.clone(),
        flight_number: first_segment.number.clone(),
        stop_count: (outbound.segments.len() - 1) as u32,
    })
}

/// Parses the date part of a timestamp such as `2026-11-02T09:35:00`
fn parse_date(timestamp: &str) -> Result<NaiveDate, SearchError> {
    let date_part = timestamp.split('T').next().unwrap_or_default();
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|_| malformed(format!("invalid timestamp: {:?}", timestamp)))
}

fn malformed(reason: impl Into<String>) -> SearchError {
    SearchError::MalformedResponse(reason.into())
}
