//! Batch monitoring run
//!
//! A run is one linear pass over the destination list:
//!
//! 1. fetch destinations from the store (failure is fatal, nobody is told)
//! 2. resolve missing codes, writing each new code back to the store
//! 3. search and classify each destination in list order
//! 4. notify subscribers
//!
//! Phases 2 and 3 stop at the first failed external call: a failure notice is
//! sent on a best-effort basis and the run ends. Destinations not reached by
//! then appear in no outcome bucket. "Not found" answers are not failures.

use async_trait::async_trait;
use chrono::Local;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::cache::is_route_code;
use crate::data::{Destination, Outcome, SearchDates, StoreError};
use crate::notify::{Composer, FailureSource, Mailer, Notifier};
use crate::resolver::{CodeResolver, LocationLookup, ResolveError};
use crate::search::{FlightOfferSource, PriceSearch, SearchError};

/// External store holding the watched destinations and their subscribers
#[async_trait]
pub trait DestinationStore: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<Destination>, StoreError>;

    async fn persist_code(&self, id: u64, code: &str) -> Result<(), StoreError>;

    async fn fetch_subscriber_emails(&self) -> Result<Vec<String>, StoreError>;
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// All phases ran, including notification
    Completed,
    /// A code resolution (or the write-back of a code) failed
    AbortedAtResolve,
    /// A price search failed
    AbortedAtSearch,
    /// The destination list could not be fetched
    FatalFetchFailure,
}

impl RunState {
    pub fn is_success(self) -> bool {
        self == RunState::Completed
    }
}

/// Errors that abort a run
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Failed to fetch destinations: {0}")]
    Fetch(#[source] StoreError),

    #[error("Failed to resolve code for {city}: {source}")]
    Resolve {
        city: String,
        #[source]
        source: ResolveError,
    },

    #[error("Failed to save code for {city}: {source}")]
    PersistCode {
        city: String,
        #[source]
        source: StoreError,
    },

    #[error("Failed to search flights to {city}: {source}")]
    Search {
        city: String,
        #[source]
        source: SearchError,
    },
}

impl RunError {
    /// Which collaborator the failure came from
    pub fn failure_source(&self) -> FailureSource {
        match self {
            RunError::Fetch(_) | RunError::PersistCode { .. } => FailureSource::DestinationStore,
            RunError::Resolve {
                source: ResolveError::Cache(_),
                ..
            }
            | RunError::Search {
                source: SearchError::Cache(_),
                ..
            } => FailureSource::Cache,
            RunError::Resolve { .. } | RunError::Search { .. } => FailureSource::FlightProvider,
        }
    }
}

/// Result of one run
#[derive(Debug)]
pub struct RunReport {
    pub state: RunState,
    /// Number of destinations fetched from the store
    pub destinations: usize,
    /// Outcomes in list order, one per destination reached
    pub outcomes: Vec<Outcome>,
    /// The error that ended the run early, if any
    pub failure: Option<RunError>,
}

impl RunReport {
    pub fn deals(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.is_deal()).count()
    }
}

/// Drives destinations through resolution, search, classification and notification
pub struct Monitor<S, L, F, M> {
    store: S,
    resolver: CodeResolver<L>,
    search: PriceSearch<F>,
    notifier: Notifier<M>,
    composer: Composer,
    origin: String,
    dates: SearchDates,
}

impl<S, L, F, M> Monitor<S, L, F, M>
where
    S: DestinationStore,
    L: LocationLookup,
    F: FlightOfferSource,
    M: Mailer,
{
    pub fn new(
        store: S,
        resolver: CodeResolver<L>,
        search: PriceSearch<F>,
        notifier: Notifier<M>,
        composer: Composer,
        origin: impl Into<String>,
        dates: SearchDates,
    ) -> Self {
        Self {
            store,
            resolver,
            search,
            notifier,
            composer,
            origin: origin.into(),
            dates,
        }
    }

    /// Runs all phases once
    pub async fn run(&self) -> RunReport {
        info!("Fetching destinations");
        let mut destinations = match self.store.fetch_all().await {
            Ok(destinations) => destinations,
            Err(e) => {
                error!("Failed to fetch destinations: {}", e);
                return RunReport {
                    state: RunState::FatalFetchFailure,
                    destinations: 0,
                    outcomes: Vec::new(),
                    failure: Some(RunError::Fetch(e)),
                };
            }
        };
        info!(count = destinations.len(), "Fetched destinations");

        if let Err(e) = self.resolve_codes(&mut destinations).await {
            self.report_failure(&e).await;
            return RunReport {
                state: RunState::AbortedAtResolve,
                destinations: destinations.len(),
                outcomes: Vec::new(),
                failure: Some(e),
            };
        }

        let (outcomes, failure) = self.search_and_classify(&destinations).await;
        if let Some(e) = failure {
            self.report_failure(&e).await;
            return RunReport {
                state: RunState::AbortedAtSearch,
                destinations: destinations.len(),
                outcomes,
                failure: Some(e),
            };
        }

        self.notify(&outcomes).await;

        RunReport {
            state: RunState::Completed,
            destinations: destinations.len(),
            outcomes,
            failure: None,
        }
    }

    /// Fills in missing codes, stopping at the first failed call
    async fn resolve_codes(&self, destinations: &mut [Destination]) -> Result<(), RunError> {
        for destination in destinations.iter_mut() {
            if destination.code().is_some() {
                continue;
            }

            let resolved = self
                .resolver
                .resolve(&destination.city)
                .await
                .map_err(|source| RunError::Resolve {
                    city: destination.city.clone(),
                    source,
                })?;

            let Some(code) = resolved else {
                warn!(city = %destination.city, "No code found, destination will be skipped");
                continue;
            };

            self.store
                .persist_code(destination.id, &code)
                .await
                .map_err(|source| RunError::PersistCode {
                    city: destination.city.clone(),
                    source,
                })?;
            info!(city = %destination.city, code = %code, "Resolved code");
            destination.code = Some(code);
        }
        Ok(())
    }

    /// Searches each destination in order, stopping at the first failed search
    ///
    /// Returns the outcomes gathered so far and the error that stopped the
    /// iteration, if any.
    async fn search_and_classify(
        &self,
        destinations: &[Destination],
    ) -> (Vec<Outcome>, Option<RunError>) {
        let mut outcomes = Vec::with_capacity(destinations.len());

        for destination in destinations {
            let Some(code) = destination.code() else {
                info!(city = %destination.city, "Skipping, no code");
                outcomes.push(Outcome::Skipped {
                    destination: destination.clone(),
                });
                continue;
            };
            if !is_route_code(code) {
                warn!(city = %destination.city, code, "Skipping, code is not searchable");
                outcomes.push(Outcome::Skipped {
                    destination: destination.clone(),
                });
                continue;
            }

            let offer = match self.search.search(&self.origin, code, &self.dates).await {
                Ok(offer) => offer,
                Err(source) => {
                    let e = RunError::Search {
                        city: destination.city.clone(),
                        source,
                    };
                    return (outcomes, Some(e));
                }
            };

            let outcome = Outcome::classify(destination.clone(), offer);
            match &outcome {
                Outcome::Deal { offer, target_price, .. } => info!(
                    city = %destination.city,
                    price = offer.price,
                    target = target_price,
                    "Deal found"
                ),
                Outcome::PriceNotMet { offer, .. } => info!(
                    city = %destination.city,
                    price = offer.price,
                    target = destination.target_price,
                    "Price above target"
                ),
                _ => info!(city = %destination.city, "No direct flight found"),
            }
            outcomes.push(outcome);
        }

        (outcomes, None)
    }

    /// Sends deal alerts and the run summary; errors are logged, not returned
    async fn notify(&self, outcomes: &[Outcome]) {
        let recipients = match self.store.fetch_subscriber_emails().await {
            Ok(recipients) => recipients,
            Err(e) => {
                error!("Failed to fetch subscribers: {}", e);
                return;
            }
        };
        if recipients.is_empty() {
            info!("No subscribers, skipping notifications");
            return;
        }

        for message in self.composer.messages(outcomes, Local::now()) {
            if let Err(e) = self.notifier.dispatch(&message, &recipients).await {
                error!("Failed to send notification: {}", e);
            }
        }
    }

    /// Best-effort failure notice; any error here is logged and swallowed
    async fn report_failure(&self, failure: &RunError) {
        error!("Run aborted: {}", failure);

        let recipients = match self.store.fetch_subscriber_emails().await {
            Ok(recipients) => recipients,
            Err(e) => {
                error!("Failed to fetch subscribers for failure notice: {}", e);
                return;
            }
        };

        let message = self
            .composer
            .failure_message(failure.failure_source(), &failure.to_string());
        match self.notifier.dispatch(&message, &recipients).await {
            Ok(()) if !recipients.is_empty() => info!("Failure notice sent"),
            Ok(()) => {}
            Err(e) => error!("Failed to send failure notice: {}", e),
        }
    }
}
