//! Integration tests for a full monitoring run against in-memory collaborators
//!
//! Exercises the public API the way the binary wires it: real on-disk caches,
//! fake store, provider and mail transport.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use tempfile::TempDir;

use farewatch::cache::{CodeCache, RouteCache, RouteKey};
use farewatch::data::amadeus::FlightOffersResponse;
use farewatch::data::{Destination, Outcome, ProviderError, SearchDates, StoreError};
use farewatch::monitor::{DestinationStore, Monitor, RunState};
use farewatch::notify::{Composer, Mailer, Notifier, NotifyError};
use farewatch::resolver::{CodeResolver, LocationLookup};
use farewatch::search::{FlightOfferSource, OfferQuery, PriceSearch};

const TOKYO_OFFER: &str = r#"{
    "data": [{
        "price": {"currency": "AUD", "total": "455.10"},
        "itineraries": [
            {"segments": [{
                "departure": {"iataCode": "SYD", "at": "2026-11-02T21:40:00"},
                "arrival": {"iataCode": "HND", "at": "2026-11-03T05:15:00"},
                "carrierCode": "QF", "number": "25"
            }]},
            {"segments": [{
                "departure": {"iataCode": "HND", "at": "2026-11-11T20:25:00"},
                "arrival": {"iataCode": "SYD", "at": "2026-11-12T08:00:00"},
                "carrierCode": "QF", "number": "26"
            }]}
        ]
    }]
}"#;

struct Sheet {
    rows: Vec<Destination>,
    persisted: Arc<Mutex<Vec<(u64, String)>>>,
}

#[async_trait]
impl DestinationStore for Sheet {
    async fn fetch_all(&self) -> Result<Vec<Destination>, StoreError> {
        Ok(self.rows.clone())
    }

    async fn persist_code(&self, id: u64, code: &str) -> Result<(), StoreError> {
        self.persisted.lock().unwrap().push((id, code.to_string()));
        Ok(())
    }

    async fn fetch_subscriber_emails(&self) -> Result<Vec<String>, StoreError> {
        Ok(Vec::new())
    }
}

#[derive(Clone, Default)]
struct Provider {
    lookups: Arc<AtomicUsize>,
    searches: Arc<AtomicUsize>,
}

#[async_trait]
impl LocationLookup for Provider {
    async fn lookup_code(&self, city: &str) -> Result<Option<String>, ProviderError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(match city {
            "Tokyo" => Some("TYO".to_string()),
            _ => None,
        })
    }
}

#[async_trait]
impl FlightOfferSource for Provider {
    async fn search_offers(&self, query: &OfferQuery) -> Result<FlightOffersResponse, ProviderError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        let json = if query.destination == "TYO" {
            TOKYO_OFFER
        } else {
            r#"{"data": []}"#
        };
        serde_json::from_str(json).map_err(|e| ProviderError::MalformedResponse(e.to_string()))
    }
}

/// Mail transport that counts calls
#[derive(Clone, Default)]
struct CountingMailer {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Mailer for CountingMailer {
    async fn send(&self, _body: &str, _recipients: &[String]) -> Result<(), NotifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn destination(id: u64, city: &str, code: Option<&str>, target: f64) -> Destination {
    Destination {
        id,
        city: city.to_string(),
        code: code.map(str::to_string),
        target_price: target,
    }
}

#[tokio::test]
async fn test_repeated_runs_hit_the_cache() {
    let cache_dir = TempDir::new().expect("Failed to create temp directory");
    let provider = Provider::default();
    let mailer = CountingMailer::default();
    let persisted = Arc::new(Mutex::new(Vec::new()));
    let sheet = Sheet {
        rows: vec![
            destination(2, "Tokyo", None, 500.0),
            destination(3, "Atlantis", None, 100.0),
            destination(4, "Bali", Some("DPS"), 300.0),
        ],
        persisted: persisted.clone(),
    };

    let monitor = Monitor::new(
        sheet,
        CodeResolver::new(provider.clone(), CodeCache::new(cache_dir.path().to_path_buf())),
        PriceSearch::new(
            provider.clone(),
            RouteCache::new(cache_dir.path().to_path_buf(), Duration::hours(24)),
            "AUD",
        ),
        Notifier::new(mailer.clone()),
        Composer::new("SYD", "A$"),
        "SYD",
        SearchDates::from_offsets(NaiveDate::from_ymd_opt(2026, 11, 1).unwrap(), 1, 10),
    );

    let first = monitor.run().await;
    assert_eq!(first.state, RunState::Completed);
    assert_eq!(first.outcomes.len(), 3);
    match &first.outcomes[0] {
        Outcome::Deal { offer, target_price, .. } => {
            assert_eq!(offer.destination_code, "HND");
            assert!((offer.price - 455.10).abs() < 0.001);
            assert!((target_price - 500.0).abs() < 0.001);
        }
        other => panic!("Expected a deal for Tokyo, got {:?}", other),
    }
    assert!(matches!(first.outcomes[1], Outcome::Skipped { .. }));
    assert!(matches!(first.outcomes[2], Outcome::NoFlightFound { .. }));
    assert_eq!(provider.lookups.load(Ordering::SeqCst), 2);
    assert_eq!(provider.searches.load(Ordering::SeqCst), 2);

    let second = monitor.run().await;
    assert_eq!(second.state, RunState::Completed);
    assert_eq!(second.outcomes, first.outcomes);
    // Atlantis is looked up again and Bali searched again: misses are never cached.
    assert_eq!(provider.lookups.load(Ordering::SeqCst), 3);
    assert_eq!(provider.searches.load(Ordering::SeqCst), 3);

    assert_eq!(mailer.calls.load(Ordering::SeqCst), 0, "No subscribers, no mail");
    assert_eq!(
        *persisted.lock().unwrap(),
        vec![(2, "TYO".to_string()), (2, "TYO".to_string())]
    );
    assert!(cache_dir.path().join("iata_codes.json").exists());
    assert!(cache_dir.path().join("flights").join("SYD_TYO.json").exists());
}

#[tokio::test]
async fn test_cached_route_written_by_one_search_serves_another() {
    let cache_dir = TempDir::new().expect("Failed to create temp directory");
    let provider = Provider::default();
    let routes = RouteCache::new(cache_dir.path().to_path_buf(), Duration::hours(24));
    let dates = SearchDates::from_offsets(NaiveDate::from_ymd_opt(2026, 11, 1).unwrap(), 1, 10);

    let writer = PriceSearch::new(provider.clone(), routes.clone(), "AUD");
    let reader = PriceSearch::new(provider.clone(), routes.clone(), "AUD");

    let written = writer.search("SYD", "TYO", &dates).await.unwrap();
    let read = reader.search("SYD", "TYO", &dates).await.unwrap();

    assert_eq!(written, read);
    assert_eq!(provider.searches.load(Ordering::SeqCst), 1);
    assert!(routes.get(&RouteKey::new("TYO", "SYD").unwrap()).unwrap().is_none());
}
