//! Credential cache with renewal-before-expiry and single-flight exchanges.
//!
//! [`CredentialStore`] owns the only copy of the current [`Credential`]. Reading the cache and
//! deciding to renew happen under one lock, and a renewal is represented by a shared future kept
//! inside the store: every caller that finds the credential absent or inside the renewal margin
//! awaits that same future, so concurrent callers collapse onto one exchange and all observe its
//! outcome. Because the store keeps its own handle on the in-flight exchange, a caller that gives
//! up (its future is dropped on a deadline) never cancels the exchange for the others; whoever
//! awaits it next keeps driving it to completion.

mod metrics;

pub use self::metrics::RefreshMetrics;

// std
use std::sync::Weak;
// crates.io
use futures::future::{BoxFuture, FutureExt, Shared};
// self
use crate::{
	_prelude::*,
	auth::Credential,
	clock::Clock,
	error::CredentialError,
	obs::{self, CallKind, CallOutcome, CallSpan},
};

/// Boxed future returned by [`CredentialSource::exchange`].
pub type SourceFuture<'a> =
	Pin<Box<dyn Future<Output = Result<Credential, CredentialError>> + 'a + Send>>;

type SharedExchange = Shared<BoxFuture<'static, Result<Credential, Arc<CredentialError>>>>;

/// Performs the token-issuing exchange.
///
/// Implementations hold only the client identity; every call is one independent round trip and
/// nothing is retried.
pub trait CredentialSource
where
	Self: Send + Sync,
{
	/// Exchanges the client identity for a freshly issued credential.
	fn exchange(&self) -> SourceFuture<'_>;
}

#[derive(Default)]
struct StoreState {
	current: Option<Credential>,
	in_flight: Option<(u64, SharedExchange)>,
	next_flight: u64,
}

/// Owns the cached credential and serializes renewal.
pub struct CredentialStore {
	source: Arc<dyn CredentialSource>,
	clock: Arc<dyn Clock>,
	renewal_margin: Duration,
	state: Arc<Mutex<StoreState>>,
	metrics: Arc<RefreshMetrics>,
}
impl CredentialStore {
	/// Margin applied when none is configured.
	pub const DEFAULT_RENEWAL_MARGIN: Duration = Duration::seconds(60);

	/// Creates an empty store that renews through `source`.
	pub fn new(source: Arc<dyn CredentialSource>, clock: Arc<dyn Clock>) -> Self {
		Self {
			source,
			clock,
			renewal_margin: Self::DEFAULT_RENEWAL_MARGIN,
			state: Default::default(),
			metrics: Default::default(),
		}
	}

	/// Overrides the renewal margin (negative values clamp to zero).
	pub fn with_renewal_margin(mut self, margin: Duration) -> Self {
		self.renewal_margin = if margin.is_negative() { Duration::ZERO } else { margin };

		self
	}

	/// Margin subtracted from the expiry instant when deciding to renew.
	pub fn renewal_margin(&self) -> Duration {
		self.renewal_margin
	}

	/// Shared counters describing cache hits and exchanges.
	pub fn metrics(&self) -> &Arc<RefreshMetrics> {
		&self.metrics
	}

	/// Returns the cached credential without checking freshness or contacting the source.
	pub fn current(&self) -> Option<Credential> {
		self.state.lock().current.clone()
	}

	/// Drops the cached credential so the next [`acquire`](Self::acquire) exchanges.
	///
	/// An exchange already in flight is left alone and will still publish its result.
	pub fn invalidate(&self) {
		self.state.lock().current = None;
	}

	/// Returns a credential that is usable now, exchanging only when necessary.
	///
	/// The cached credential is returned as long as `now < expires_at - margin`. Otherwise the
	/// caller joins the in-flight exchange or starts one. A failed exchange leaves the cached
	/// value untouched and is reported to every caller that awaited it.
	pub async fn acquire(&self) -> Result<Credential> {
		let flight = {
			let mut state = self.state.lock();
			let now = self.clock.now();

			if let Some(credential) =
				state.current.as_ref().filter(|c| c.is_usable_at(now, self.renewal_margin))
			{
				self.metrics.record_cache_hit();

				return Ok(credential.clone());
			}

			self.join_or_begin(&mut state)
		};

		flight.await.map_err(Error::from)
	}

	/// Renews regardless of the cached credential's freshness.
	///
	/// Joins an exchange that is already in flight instead of starting a second one.
	pub async fn force_refresh(&self) -> Result<Credential> {
		let flight = {
			let mut state = self.state.lock();

			self.join_or_begin(&mut state)
		};

		flight.await.map_err(Error::from)
	}

	fn join_or_begin(&self, state: &mut StoreState) -> SharedExchange {
		if let Some((_, flight)) = &state.in_flight {
			return flight.clone();
		}

		let id = state.next_flight;
		let source = Arc::clone(&self.source);
		let shared_state = Arc::downgrade(&self.state);
		let metrics = Arc::clone(&self.metrics);
		let span = CallSpan::new(CallKind::Exchange, "credential_store");

		state.next_flight = state.next_flight.wrapping_add(1);
		metrics.record_exchange();
		obs::record_call_outcome(CallKind::Exchange, CallOutcome::Attempt);

		let flight = span
			.instrument(async move {
				let outcome = source.exchange().await;

				settle(&shared_state, &metrics, id, outcome)
			})
			.boxed()
			.shared();

		state.in_flight = Some((id, flight.clone()));

		flight
	}
}
impl Debug for CredentialStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let state = self.state.lock();

		f.debug_struct("CredentialStore")
			.field("renewal_margin", &self.renewal_margin)
			.field("current", &state.current)
			.field("in_flight", &state.in_flight.is_some())
			.finish()
	}
}

// Publishes the outcome and retires the flight under the same lock, so no caller can observe a
// finished flight without also observing its credential. The flight lives inside the state it
// publishes to, hence the weak handle; a dropped store simply discards the outcome.
fn settle(
	state: &Weak<Mutex<StoreState>>,
	metrics: &RefreshMetrics,
	id: u64,
	outcome: Result<Credential, CredentialError>,
) -> Result<Credential, Arc<CredentialError>> {
	let shared = state.upgrade();
	let mut state = shared.as_deref().map(|state| state.lock());

	if let Some(state) = state
		.as_mut()
		.filter(|state| state.in_flight.as_ref().is_some_and(|(flight, _)| *flight == id))
	{
		state.in_flight = None;
	}

	match outcome {
		Ok(credential) => {
			if let Some(state) = state.as_mut() {
				state.current = Some(credential.clone());
			}

			metrics.record_success();
			obs::record_call_outcome(CallKind::Exchange, CallOutcome::Success);

			Ok(credential)
		},
		Err(err) => {
			metrics.record_failure();
			obs::record_call_outcome(CallKind::Exchange, CallOutcome::Failure);

			Err(Arc::new(err))
		},
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// crates.io
	use time::macros;
	// self
	use super::*;
	use crate::{clock::ManualClock, error::ApiError};

	struct CountingSource {
		clock: ManualClock,
		lifetime: Duration,
		delay: std::time::Duration,
		fail: bool,
		calls: AtomicUsize,
	}
	impl CountingSource {
		fn new(clock: ManualClock, lifetime: Duration) -> Self {
			Self {
				clock,
				lifetime,
				delay: std::time::Duration::ZERO,
				fail: false,
				calls: AtomicUsize::new(0),
			}
		}

		fn with_delay(mut self, delay: std::time::Duration) -> Self {
			self.delay = delay;

			self
		}

		fn failing(mut self) -> Self {
			self.fail = true;

			self
		}

		fn calls(&self) -> usize {
			self.calls.load(Ordering::SeqCst)
		}
	}
	impl CredentialSource for CountingSource {
		fn exchange(&self) -> SourceFuture<'_> {
			Box::pin(async move {
				let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

				if !self.delay.is_zero() {
					tokio::time::sleep(self.delay).await;
				}
				if self.fail {
					return Err(CredentialError::Rejected(ApiError::new(
						oauth2::http::Method::POST,
						Url::parse("https://auth.example.com/oauth/token")
							.expect("Token URL fixture should parse."),
						401,
						b"{\"error\":\"invalid_client\"}",
					)));
				}

				Ok(Credential::builder()
					.token(format!("T{n}"))
					.issued_at(self.clock.now())
					.lifetime(self.lifetime)
					.build()?)
			})
		}
	}

	fn fixture(lifetime: Duration) -> (ManualClock, Arc<CountingSource>) {
		let clock = ManualClock::new(macros::datetime!(2025-01-01 00:00 UTC));
		let source = Arc::new(CountingSource::new(clock.clone(), lifetime));

		(clock, source)
	}

	fn store(clock: &ManualClock, source: Arc<dyn CredentialSource>) -> CredentialStore {
		CredentialStore::new(source, Arc::new(clock.clone()))
	}

	#[tokio::test]
	async fn absent_credential_is_exchanged_with_local_expiry() {
		let (clock, source) = fixture(Duration::seconds(3600));
		let store = store(&clock, source.clone());
		let credential = store.acquire().await.expect("First acquisition should exchange.");

		assert_eq!(credential.token().expose(), "T1");
		assert_eq!(credential.expires_at(), clock.now() + Duration::seconds(3600));
		assert_eq!(source.calls(), 1);
	}

	#[tokio::test]
	async fn fresh_credential_is_served_from_cache() {
		let (clock, source) = fixture(Duration::seconds(3600));
		let store = store(&clock, source.clone());

		store.acquire().await.expect("First acquisition should exchange.");
		clock.advance(Duration::minutes(30));

		let cached = store.acquire().await.expect("Cached acquisition should succeed.");

		assert_eq!(cached.token().expose(), "T1");
		assert_eq!(source.calls(), 1);
		assert_eq!(store.metrics().cache_hits(), 1);
		assert_eq!(store.metrics().exchanges(), 1);
	}

	#[tokio::test]
	async fn credential_inside_margin_is_renewed() {
		let (clock, source) = fixture(Duration::seconds(3600));
		let store = store(&clock, source.clone());

		store.acquire().await.expect("First acquisition should exchange.");
		// Ten seconds left against a sixty second margin.
		clock.advance(Duration::seconds(3590));

		let renewed = store.acquire().await.expect("Renewal should succeed.");

		assert_eq!(renewed.token().expose(), "T2");
		assert_eq!(renewed.issued_at(), clock.now());
		assert_eq!(source.calls(), 2);
	}

	#[tokio::test]
	async fn custom_margin_changes_the_renewal_point() {
		let (clock, source) = fixture(Duration::seconds(3600));
		let store = store(&clock, source.clone()).with_renewal_margin(Duration::ZERO);

		store.acquire().await.expect("First acquisition should exchange.");
		clock.advance(Duration::seconds(3590));

		assert_eq!(store.acquire().await.expect("Cached acquisition.").token().expose(), "T1");

		clock.advance(Duration::seconds(10));

		assert_eq!(store.acquire().await.expect("Expired renewal.").token().expose(), "T2");
		assert_eq!(
			CredentialStore::new(source, Arc::new(clock))
				.with_renewal_margin(Duration::seconds(-5))
				.renewal_margin(),
			Duration::ZERO
		);
	}

	#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
	async fn concurrent_acquisitions_collapse_onto_one_exchange() {
		let clock = ManualClock::new(macros::datetime!(2025-01-01 00:00 UTC));
		let source = Arc::new(
			CountingSource::new(clock.clone(), Duration::seconds(900))
				.with_delay(std::time::Duration::from_millis(50)),
		);
		let store = Arc::new(store(&clock, source.clone()));
		let tasks = (0..16)
			.map(|_| {
				let store = Arc::clone(&store);

				tokio::spawn(async move { store.acquire().await })
			})
			.collect::<Vec<_>>();

		for task in tasks {
			let credential = task
				.await
				.expect("Acquisition task should not panic.")
				.expect("Collapsed acquisition should succeed.");

			assert_eq!(credential.token().expose(), "T1");
			assert!(credential.expires_at() > clock.now());
		}

		assert_eq!(source.calls(), 1);
		assert_eq!(store.metrics().exchanges(), 1);
	}

	#[tokio::test]
	async fn failed_exchange_is_shared_and_keeps_the_previous_credential() {
		let clock = ManualClock::new(macros::datetime!(2025-01-01 00:00 UTC));
		let healthy = Arc::new(CountingSource::new(clock.clone(), Duration::seconds(120)));
		let store = store(&clock, healthy);

		store.acquire().await.expect("Seed acquisition should succeed.");

		let failing = Arc::new(
			CountingSource::new(clock.clone(), Duration::seconds(120))
				.with_delay(std::time::Duration::from_millis(20))
				.failing(),
		);
		let store = CredentialStore { source: failing.clone(), ..store };

		clock.advance(Duration::seconds(90));

		let (first, second) = tokio::join!(store.acquire(), store.acquire());
		let first = first.expect_err("Rejected exchange should fail the first caller.");
		let second = second.expect_err("Rejected exchange should fail the second caller.");

		assert_eq!(first.status(), Some(401));
		assert_eq!(second.status(), Some(401));
		assert_eq!(failing.calls(), 1);
		assert_eq!(store.metrics().failures(), 1);
		assert_eq!(
			store.current().expect("Previous credential should survive.").token().expose(),
			"T1"
		);
	}

	#[tokio::test]
	async fn force_refresh_bypasses_a_fresh_cache() {
		let (clock, source) = fixture(Duration::seconds(3600));
		let store = store(&clock, source.clone());

		store.acquire().await.expect("First acquisition should exchange.");

		let forced = store.force_refresh().await.expect("Forced refresh should succeed.");

		assert_eq!(forced.token().expose(), "T2");
		assert_eq!(store.current().expect("Forced credential is cached.").token().expose(), "T2");
	}

	#[tokio::test]
	async fn force_refresh_joins_an_in_flight_exchange() {
		let clock = ManualClock::new(macros::datetime!(2025-01-01 00:00 UTC));
		let source = Arc::new(
			CountingSource::new(clock.clone(), Duration::seconds(900))
				.with_delay(std::time::Duration::from_millis(30)),
		);
		let store = store(&clock, source.clone());
		let (acquired, forced) = tokio::join!(store.acquire(), store.force_refresh());

		assert_eq!(acquired.expect("Acquisition should succeed.").token().expose(), "T1");
		assert_eq!(forced.expect("Forced refresh should succeed.").token().expose(), "T1");
		assert_eq!(source.calls(), 1);
	}

	#[tokio::test]
	async fn invalidate_forces_the_next_exchange() {
		let (clock, source) = fixture(Duration::seconds(3600));
		let store = store(&clock, source.clone());

		store.acquire().await.expect("First acquisition should exchange.");
		store.invalidate();

		assert!(store.current().is_none());
		assert_eq!(store.acquire().await.expect("Re-acquisition.").token().expose(), "T2");
	}

	#[tokio::test]
	async fn abandoned_exchange_completes_for_remaining_waiters() {
		let clock = ManualClock::new(macros::datetime!(2025-01-01 00:00 UTC));
		let source = Arc::new(
			CountingSource::new(clock.clone(), Duration::seconds(900))
				.with_delay(std::time::Duration::from_millis(100)),
		);
		let store = store(&clock, source.clone());
		let leader = tokio::time::timeout(std::time::Duration::from_millis(10), store.acquire());
		let (leader, waiter) = tokio::join!(leader, store.acquire());

		assert!(leader.is_err(), "The leader's own deadline should elapse first.");
		assert_eq!(waiter.expect("Waiter should receive the credential.").token().expose(), "T1");
		assert_eq!(source.calls(), 1);
	}

	#[tokio::test]
	async fn unpolled_exchange_is_resumed_by_the_next_caller() {
		let clock = ManualClock::new(macros::datetime!(2025-01-01 00:00 UTC));
		let source = Arc::new(
			CountingSource::new(clock.clone(), Duration::seconds(900))
				.with_delay(std::time::Duration::from_millis(50)),
		);
		let store = store(&clock, source.clone());
		let abandoned =
			tokio::time::timeout(std::time::Duration::from_millis(5), store.acquire()).await;

		assert!(abandoned.is_err());

		let resumed = store.acquire().await.expect("Next caller should resume the exchange.");

		assert_eq!(resumed.token().expose(), "T1");
		assert_eq!(source.calls(), 1);
	}

	#[tokio::test]
	async fn abandoned_exchange_does_not_keep_a_dropped_store_alive() {
		let clock = ManualClock::new(macros::datetime!(2025-01-01 00:00 UTC));
		let source = Arc::new(
			CountingSource::new(clock.clone(), Duration::seconds(900))
				.with_delay(std::time::Duration::from_millis(50)),
		);
		let store = store(&clock, source);
		let abandoned =
			tokio::time::timeout(std::time::Duration::from_millis(5), store.acquire()).await;

		assert!(abandoned.is_err());
		assert!(store.state.lock().in_flight.is_some());

		let state = Arc::downgrade(&store.state);

		drop(store);

		assert!(state.upgrade().is_none());
	}
}
