use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use tokio::sync::RwLock;
use tracing::{error, info, instrument, warn};

use crate::{
    Config,
    aggregator::Aggregator,
    config::ForecastSettings,
    error::PipelineError,
    model::{Query, Snapshot},
    provider::{WeatherProvider, provider_from_config},
    resolver::Resolver,
};

/// Geocode, fetch and derive in one call.
#[derive(Debug, Clone)]
pub struct Pipeline {
    resolver: Resolver,
    aggregator: Aggregator,
}

impl Pipeline {
    pub fn new(provider: Arc<dyn WeatherProvider>, settings: ForecastSettings) -> Self {
        Self {
            resolver: Resolver::new(provider.clone()),
            aggregator: Aggregator::new(provider, settings),
        }
    }

    /// Build against OpenWeather using the key and endpoints in `config`.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let provider = provider_from_config(config)?;
        Ok(Self::new(provider, config.forecast))
    }

    #[instrument(skip(self))]
    pub async fn run(&self, query: &str) -> Result<Snapshot, PipelineError> {
        let result = self.run_inner(query).await;

        match &result {
            Ok(snapshot) => info!(
                location = %snapshot.current.location_name,
                points = snapshot.forecast_series.len(),
                "weather snapshot ready"
            ),
            Err(err @ PipelineError::NetworkFailure(_)) => error!(%err, "weather fetch failed"),
            Err(err) => info!(%err, "weather query rejected"),
        }

        result
    }

    async fn run_inner(&self, query: &str) -> Result<Snapshot, PipelineError> {
        let query = Query::parse(query)?;
        let coord = self.resolver.resolve(&query).await?;
        self.aggregator.aggregate(coord).await
    }

    /// Run `query` and publish the outcome to `slot`, unless a newer run was
    /// started in the meantime.
    pub async fn run_latest(&self, slot: &SnapshotSlot, query: &str) -> Published {
        let ticket = slot.begin();
        let result = self.run(query).await;
        slot.publish(ticket, result).await
    }
}

/// Sequence number handed out when a run starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RunTicket(u64);

impl RunTicket {
    pub fn seq(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Published {
    Current,
    /// A newer run had already started; the result was dropped.
    Stale,
}

#[derive(Debug, Clone, Default)]
pub struct SlotState {
    pub snapshot: Option<Arc<Snapshot>>,
    pub error: Option<PipelineError>,
    /// Ticket of the run that last wrote here, 0 before any.
    pub run: u64,
}

/// Holds the last snapshot and the last error, ordered by run start.
///
/// Success replaces the snapshot and clears the error. Failure records the
/// error and leaves the previous snapshot in place.
#[derive(Debug, Default)]
pub struct SnapshotSlot {
    latest: AtomicU64,
    state: RwLock<SlotState>,
}

impl SnapshotSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> RunTicket {
        RunTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub async fn publish(
        &self,
        ticket: RunTicket,
        result: Result<Snapshot, PipelineError>,
    ) -> Published {
        let mut state = self.state.write().await;

        let latest = self.latest.load(Ordering::SeqCst);
        if ticket.0 != latest {
            warn!(run = ticket.0, latest, "discarding result of superseded run");
            return Published::Stale;
        }

        match result {
            Ok(snapshot) => {
                state.snapshot = Some(Arc::new(snapshot));
                state.error = None;
            }
            Err(err) => state.error = Some(err),
        }
        state.run = ticket.0;

        Published::Current
    }

    pub async fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.state.read().await.snapshot.clone()
    }

    pub async fn error(&self) -> Option<PipelineError> {
        self.state.read().await.error.clone()
    }

    pub async fn state(&self) -> SlotState {
        self.state.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeProvider;
    use chrono::Utc;

    fn pipeline(fake: Arc<FakeProvider>) -> Pipeline {
        Pipeline::new(fake, ForecastSettings::default())
    }

    #[tokio::test]
    async fn blank_query_makes_no_calls() {
        let fake = Arc::new(FakeProvider::working("Berlin", 0, 8));
        let p = pipeline(fake.clone());

        assert_eq!(p.run("").await.unwrap_err(), PipelineError::EmptyQuery);
        assert_eq!(p.run("   ").await.unwrap_err(), PipelineError::EmptyQuery);
        assert_eq!(fake.total_calls(), 0);
    }

    #[tokio::test]
    async fn not_found_never_aggregates() {
        let fake = Arc::new(
            FakeProvider::working("Berlin", 0, 8).with_candidates(Vec::new()),
        );
        let p = pipeline(fake.clone());

        let err = p.run("Atlantis").await.unwrap_err();

        assert_eq!(err, PipelineError::LocationNotFound("Atlantis".into()));
        assert_eq!(fake.geocode_calls(), 1);
        assert_eq!(fake.current_calls(), 0);
        assert_eq!(fake.forecast_calls(), 0);
    }

    #[tokio::test]
    async fn successful_run() {
        let now = Utc::now().timestamp();
        let fake = Arc::new(FakeProvider::working("Berlin", now + 60, 40));
        let p = pipeline(fake);

        let snapshot = p.run("  Berlin ").await.expect("snapshot");

        assert_eq!(snapshot.current.location_name, "Berlin");
        assert_eq!(snapshot.daily_samples.len(), 5);
        assert_eq!(snapshot.next_hours.len(), 4);
    }

    #[tokio::test]
    async fn geocode_failure_is_network_failure() {
        let fake = Arc::new(FakeProvider::working("Berlin", 0, 8).failing_geocode());
        let err = pipeline(fake.clone()).run("Berlin").await.unwrap_err();

        assert!(matches!(err, PipelineError::NetworkFailure(_)));
        assert_eq!(fake.current_calls(), 0);
    }

    #[tokio::test]
    async fn stale_run_is_discarded() {
        let mut fake = FakeProvider::working("unused", 0, 8)
            .with_place("Slowtown", 10.0, 10.0)
            .with_place("Fastville", 20.0, 20.0);
        let release_slow = fake.gate("Slowtown");
        let p = Arc::new(pipeline(Arc::new(fake)));
        let slot = Arc::new(SnapshotSlot::new());

        let first = {
            let (p, slot) = (p.clone(), slot.clone());
            tokio::spawn(async move { p.run_latest(&slot, "Slowtown").await })
        };
        // let the first run take its ticket and park on geocoding
        while slot.latest.load(Ordering::SeqCst) < 1 {
            tokio::task::yield_now().await;
        }

        let second = p.run_latest(&slot, "Fastville").await;
        release_slow.notify_one();
        let first = first.await.expect("task");

        assert_eq!(second, Published::Current);
        assert_eq!(first, Published::Stale);

        let state = slot.state().await;
        assert_eq!(state.run, 2);
        assert_eq!(
            state.snapshot.expect("snapshot").current.location_name,
            "Fastville"
        );
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn stale_success_does_not_override_newer_error() {
        let slot = SnapshotSlot::new();
        let older = slot.begin();
        let newer = slot.begin();

        let published = slot
            .publish(newer, Err(PipelineError::LocationNotFound("Atlantis".into())))
            .await;
        assert_eq!(published, Published::Current);

        let snapshot = crate::aggregator::assemble(
            crate::test_support::sample_current("Berlin"),
            Vec::new(),
            0,
            &ForecastSettings::default(),
        );
        assert_eq!(slot.publish(older, Ok(snapshot)).await, Published::Stale);

        assert!(slot.snapshot().await.is_none());
        assert_eq!(
            slot.error().await,
            Some(PipelineError::LocationNotFound("Atlantis".into()))
        );
    }

    #[tokio::test]
    async fn failure_keeps_previous_snapshot() {
        let slot = SnapshotSlot::new();
        let fake = Arc::new(FakeProvider::working("Berlin", 0, 8));
        let p = pipeline(fake);

        assert_eq!(p.run_latest(&slot, "Berlin").await, Published::Current);
        assert_eq!(p.run_latest(&slot, " ").await, Published::Current);

        let state = slot.state().await;
        assert_eq!(state.error, Some(PipelineError::EmptyQuery));
        assert_eq!(
            state.snapshot.expect("kept").current.location_name,
            "Berlin"
        );

        assert_eq!(p.run_latest(&slot, "Berlin").await, Published::Current);
        assert!(slot.error().await.is_none());
    }
}
