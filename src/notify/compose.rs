//! Plain-text message composition for run outcomes

use chrono::{DateTime, Local};
use std::fmt::Write;

use crate::data::{airline_name, Destination, FlightOffer, Outcome};

const SIGNATURE: &str = "-- Farewatch flight price monitor";

/// Formats deal alerts, run summaries and failure notices
#[derive(Debug, Clone)]
pub struct Composer {
    origin: String,
    currency_symbol: String,
}

impl Composer {
    pub fn new(origin: impl Into<String>, currency_symbol: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            currency_symbol: currency_symbol.into(),
        }
    }

    fn money(&self, amount: f64) -> String {
        format!("{}{:.2}", self.currency_symbol, amount)
    }

    /// All messages for a completed run: one per deal, then the summary if any
    /// destination missed out
    pub fn messages(&self, outcomes: &[Outcome], generated_at: DateTime<Local>) -> Vec<String> {
        let mut messages: Vec<String> = outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                Outcome::Deal {
                    destination,
                    offer,
                    target_price,
                } => Some(self.deal_message(destination, offer, *target_price)),
                _ => None,
            })
            .collect();

        if let Some(summary) = self.summary_message(outcomes, generated_at) {
            messages.push(summary);
        }
        messages
    }

    /// Alert for a single deal
    pub fn deal_message(&self, destination: &Destination, offer: &FlightOffer, target_price: f64) -> String {
        let airline = match &offer.airline_code {
            Some(code) => format!("{} {}", airline_name(code), offer.flight_number_or_unknown()),
            None => offer.airline_code_or_unknown().to_string(),
        };
        let flight_type = if offer.is_direct() {
            "Direct flight".to_string()
        } else {
            format!("{} connection(s)", offer.stop_count)
        };

        format!(
            "Low price alert!\n\n\
             Destination: {city}\n\
             Current price: {price}\n\
             Target price: {target}\n\
             Save: {saving}\n\n\
             Departure: {origin}\n\
             Arrival: {arrival}\n\
             Outbound date: {depart}\n\
             Return date: {ret}\n\
             Airline: {airline}\n\
             Flight type: {flight_type}\n\n\
             Booking URL:\n{link}\n\n\
             Prices may change at any time. Book soon!\n\n\
             {SIGNATURE}",
            city = destination.city,
            price = self.money(offer.price),
            target = self.money(target_price),
            saving = self.money(target_price - offer.price),
            origin = offer.origin_code,
            arrival = offer.destination_code,
            depart = offer.depart_date.format("%Y-%m-%d"),
            ret = offer.return_date.format("%Y-%m-%d"),
            link = offer.booking_link(),
        )
    }

    /// Run summary, or `None` when every outcome was a deal
    pub fn summary_message(&self, outcomes: &[Outcome], generated_at: DateTime<Local>) -> Option<String> {
        let mut deals = Vec::new();
        let mut not_met = Vec::new();
        let mut no_flight = Vec::new();
        let mut skipped = Vec::new();
        for outcome in outcomes {
            match outcome {
                Outcome::Deal { .. } => deals.push(outcome),
                Outcome::PriceNotMet { .. } => not_met.push(outcome),
                Outcome::NoFlightFound { .. } => no_flight.push(outcome),
                Outcome::Skipped { .. } => skipped.push(outcome),
            }
        }

        if not_met.is_empty() && no_flight.is_empty() && skipped.is_empty() {
            return None;
        }

        // Writing to a String cannot fail.
        let mut out = String::new();
        let _ = writeln!(out, "Flight price monitoring report\n");
        let _ = writeln!(out, "Date: {}", generated_at.format("%Y-%m-%d %H:%M"));
        let _ = writeln!(out, "Departure: {}\n", self.origin);

        if deals.is_empty() {
            let _ = writeln!(out, "No low-priced flights were found this time\n");
        } else {
            let _ = writeln!(out, "Low-priced flights ({}):", deals.len());
            for outcome in &deals {
                if let Outcome::Deal { destination, offer, .. } = outcome {
                    let _ = writeln!(out, "  • {}: {}", destination.city, self.money(offer.price));
                }
            }
            let _ = writeln!(out);
        }

        if !not_met.is_empty() {
            let _ = writeln!(out, "Target price not reached ({}):", not_met.len());
            for outcome in &not_met {
                if let Outcome::PriceNotMet { destination, offer } = outcome {
                    let _ = writeln!(
                        out,
                        "  • {}: {} (Target: {}, Gap: {})",
                        destination.city,
                        self.money(offer.price),
                        self.money(destination.target_price),
                        self.money(offer.price - destination.target_price),
                    );
                }
            }
            let _ = writeln!(out);
        }

        if !no_flight.is_empty() {
            let _ = writeln!(out, "No direct flight found ({}):", no_flight.len());
            for outcome in &no_flight {
                let _ = writeln!(out, "  • {}", outcome.destination().city);
            }
            let _ = writeln!(out);
        }

        if !skipped.is_empty() {
            let _ = writeln!(out, "Skipped ({}):", skipped.len());
            for outcome in &skipped {
                let _ = writeln!(out, "  • {} (needs an airport code)", outcome.destination().city);
            }
            let _ = writeln!(out);
        }

        let _ = writeln!(
            out,
            "Consider adjusting the target prices or watching other destinations.\n"
        );
        out.push_str(SIGNATURE);
        Some(out)
    }

    /// Notice sent when a run is aborted, worded for where the failure came from
    pub fn failure_message(&self, source: FailureSource, error: &str) -> String {
        let (headline, context, reasons, advice) = match source {
            FailureSource::FlightProvider => (
                "An API call failed.",
                "calling the flight provider",
                "• The API key has expired or become invalid\n\
                 • Network connection issue\n\
                 • The API service is temporarily unavailable\n\
                 • The monthly API quota has been exhausted",
                "Please try again later or check the API configuration.",
            ),
            FailureSource::DestinationStore => (
                "Updating the destination sheet failed.",
                "talking to the destination sheet",
                "• The sheet endpoint or token is wrong\n\
                 • The sheet does not allow edits\n\
                 • Network connection issue\n\
                 • The monthly request quota has been exhausted",
                "Please try again later or check the sheet configuration.",
            ),
            FailureSource::Cache => (
                "Reading the local cache failed.",
                "reading the local cache",
                "• A cache file is corrupt or was edited by hand\n\
                 • The cache directory cannot be read or written",
                "Delete the file named above to have it rebuilt on the next run.",
            ),
        };

        format!(
            "Flight price monitoring system notification\n\n\
             {headline}\n\n\
             The system encountered a problem when {context}:\n\
             {error}\n\n\
             Possible reasons:\n\
             {reasons}\n\n\
             {advice}\n\n\
             {SIGNATURE}"
        )
    }
}

/// Where a run-ending failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureSource {
    FlightProvider,
    DestinationStore,
    Cache,
}
