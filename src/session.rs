//! The authenticated session: one credential store plus one dispatcher per API client.

pub mod config;

pub use config::*;

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	clock::{Clock, SystemClock},
	dispatch::{
		Discard, RequestDescriptor, RequestDispatcher, ResponseSink, sink::decode_json,
	},
	error::DecodeError,
	http::HttpTransport,
	oauth::{ClientCredentialsSource, TransportErrorMapper},
	store::{CredentialStore, RefreshMetrics},
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// Session specialized for the crate's default reqwest transport stack.
pub type ReqwestSession = Session<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Authenticated client for the TruSTAR REST API.
///
/// A session is cheap to share behind an [`Arc`]; every method takes `&self` and concurrent
/// callers share one cached credential. The credential is obtained lazily on the first call and
/// renewed once it enters the renewal margin.
pub struct Session<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	config: SessionConfig,
	dispatcher: RequestDispatcher<C, M>,
}
impl<C, M> Session<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a session that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		config: SessionConfig,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self::with_clock(config, http_client, mapper, Arc::new(SystemClock))
	}

	/// Same as [`with_http_client`](Self::with_http_client) with an explicit time source.
	pub fn with_clock(
		config: SessionConfig,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
		clock: Arc<dyn Clock>,
	) -> Self {
		let http_client = http_client.into();
		let mapper = mapper.into();
		let source = ClientCredentialsSource::<C, M>::new(
			&config.client_id,
			&config.client_secret,
			config.token_endpoint.clone(),
			Arc::clone(&http_client),
			Arc::clone(&mapper),
			Arc::clone(&clock),
		);
		let store = CredentialStore::new(Arc::new(source), clock)
			.with_renewal_margin(config.renewal_margin);
		let dispatcher =
			RequestDispatcher::new(config.base_url.clone(), Arc::new(store), http_client, mapper);

		Self { config, dispatcher }
	}

	/// Settings this session was built from.
	pub fn config(&self) -> &SessionConfig {
		&self.config
	}

	/// Credential store backing this session.
	pub fn credentials(&self) -> &Arc<CredentialStore> {
		self.dispatcher.store()
	}

	/// Exchange and cache counters of the credential store.
	pub fn metrics(&self) -> &Arc<RefreshMetrics> {
		self.credentials().metrics()
	}

	/// Sends `descriptor` and feeds the body of a 2xx answer into `sink`.
	///
	/// Every failure is returned to the caller as-is and leaves `sink` untouched: a failed
	/// exchange ([`Error::Credential`]), a non-2xx answer ([`Error::Api`]), a body that does not
	/// fit the sink ([`Error::Decode`]) or a transport failure ([`Error::Transport`]). A caller
	/// enforcing its own deadline may drop the returned future at any time; a credential renewal
	/// already underway keeps going for the other callers.
	pub async fn send_into<S>(&self, descriptor: &RequestDescriptor, sink: &mut S) -> Result<()>
	where
		S: ?Sized + Send + ResponseSink,
	{
		self.dispatcher.send_into(descriptor, sink).await
	}

	/// Sends `descriptor` and decodes a JSON answer into `T`.
	pub async fn send_json<T>(&self, descriptor: &RequestDescriptor) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let body = self.dispatcher.send_raw(descriptor).await?;

		Ok(decode_json(&body)?)
	}

	/// Sends `descriptor` and returns the answer as text.
	pub async fn send_text(&self, descriptor: &RequestDescriptor) -> Result<String> {
		let body = self.dispatcher.send_raw(descriptor).await?;

		Ok(String::from_utf8(body).map_err(DecodeError::from)?)
	}

	/// Sends `descriptor` and ignores the body of a 2xx answer.
	pub async fn send_discard(&self, descriptor: &RequestDescriptor) -> Result<()> {
		self.send_into(descriptor, &mut Discard).await
	}
}
#[cfg(feature = "reqwest")]
impl Session<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a session backed by a fresh reqwest client.
	///
	/// The client does not follow redirects and identifies itself with the configured
	/// `User-Agent`.
	pub fn new(config: SessionConfig) -> Result<Self> {
		let http_client = ReqwestHttpClient::with_user_agent(&config.user_agent)?;

		Ok(Self::with_http_client(config, http_client, ReqwestTransportErrorMapper))
	}
}
impl<C, M> Debug for Session<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Session")
			.field("config", &self.config)
			.field("dispatcher", &self.dispatcher)
			.finish()
	}
}
