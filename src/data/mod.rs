//! Core data models for Farewatch
//!
//! This module contains the data types shared by the resolver, the price
//! search and the monitor, plus the clients for the external services.

pub mod airlines;
pub mod amadeus;
pub mod sheety;

pub use airlines::airline_name;
pub use amadeus::{AmadeusClient, ProviderError};
pub use sheety::{SheetyClient, StoreError};

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Rendered in place of a missing carrier code
pub const UNKNOWN_AIRLINE: &str = "Unknown";

/// Rendered in place of a missing flight number
pub const UNKNOWN_FLIGHT_NUMBER: &str = "N/A";

/// A destination being watched
///
/// `code` is filled in during resolution; `target_price` is never rewritten
/// by the monitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    /// Row identifier in the destination store
    pub id: u64,
    /// City name as entered by the user
    pub city: String,
    /// Airport or city code, if known
    pub code: Option<String>,
    /// Price an offer must beat to count as a deal
    pub target_price: f64,
}

impl Destination {
    /// Returns the code if it is present and non-blank
    pub fn code(&self) -> Option<&str> {
        self.code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
    }
}

/// A single round-trip flight offer
///
/// Produced by the price search, either from the provider or from the route
/// cache. `origin_code`/`destination_code` are the airports actually served,
/// which may differ from the codes searched for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightOffer {
    /// Total price in the configured currency
    pub price: f64,
    /// Departure airport of the outbound leg
    pub origin_code: String,
    /// Arrival airport of the outbound leg
    pub destination_code: String,
    /// Date of the outbound departure
    pub depart_date: NaiveDate,
    /// Date of the inbound departure
    pub return_date: NaiveDate,
    /// Carrier of the first outbound segment
    #[serde(default)]
    pub airline_code: Option<String>,
    /// Flight number of the first outbound segment
    #[serde(default)]
    pub flight_number: Option<String>,
    /// Connections on the outbound leg
    #[serde(default)]
    pub stop_count: u32,
    /// Where the offer can be booked
    #[serde(default)]
    pub booking_url: Option<String>,
}

impl FlightOffer {
    /// Whether the outbound leg has no connections
    pub fn is_direct(&self) -> bool {
        self.stop_count == 0
    }

    pub fn airline_code_or_unknown(&self) -> &str {
        self.airline_code.as_deref().unwrap_or(UNKNOWN_AIRLINE)
    }

    pub fn flight_number_or_unknown(&self) -> &str {
        self.flight_number.as_deref().unwrap_or(UNKNOWN_FLIGHT_NUMBER)
    }

    /// Booking link, falling back to a flight search link when none was recorded
    pub fn booking_link(&self) -> String {
        self.booking_url.clone().unwrap_or_else(|| {
            google_flights_link(&self.origin_code, &self.destination_code, self.depart_date)
        })
    }
}

/// Builds a Google Flights search link for a route and outbound date
pub fn google_flights_link(origin: &str, destination: &str, depart_date: NaiveDate) -> String {
    format!(
        "https://www.google.com/travel/flights?q=Flights%20from%20{}%20to%20{}%20on%20{}",
        origin,
        destination,
        depart_date.format("%Y-%m-%d")
    )
}

/// Outbound and inbound dates for a round-trip search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchDates {
    pub depart: NaiveDate,
    pub return_date: NaiveDate,
}

impl SearchDates {
    /// Dates offset from `today` by the given number of days
    pub fn from_offsets(today: NaiveDate, depart_offset_days: i64, return_offset_days: i64) -> Self {
        Self {
            depart: today + Duration::days(depart_offset_days),
            return_date: today + Duration::days(return_offset_days),
        }
    }
}

/// Classification of one destination after a run
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// An offer came in strictly below the target
    Deal {
        destination: Destination,
        offer: FlightOffer,
        target_price: f64,
    },
    /// An offer exists but does not beat the target
    PriceNotMet {
        destination: Destination,
        offer: FlightOffer,
    },
    /// The provider had no matching offer
    NoFlightFound { destination: Destination },
    /// The destination has no code, so no search was made
    Skipped { destination: Destination },
}

impl Outcome {
    /// Classifies a search result against the destination's target price
    pub fn classify(destination: Destination, offer: Option<FlightOffer>) -> Self {
        match offer {
            None => Outcome::NoFlightFound { destination },
            Some(offer) if offer.price < destination.target_price => {
                let target_price = destination.target_price;
                Outcome::Deal {
                    destination,
                    offer,
                    target_price,
                }
            }
            Some(offer) => Outcome::PriceNotMet { destination, offer },
        }
    }

    pub fn destination(&self) -> &Destination {
        match self {
            Outcome::Deal { destination, .. }
            | Outcome::PriceNotMet { destination, .. }
            | Outcome::NoFlightFound { destination }
            | Outcome::Skipped { destination } => destination,
        }
    }

    pub fn is_deal(&self) -> bool {
        matches!(self, Outcome::Deal { .. })
    }
}
