//! Authenticated request dispatch.
//!
//! A call resolves its descriptor against the base URL, obtains a usable credential from the
//! [`CredentialStore`], attaches it as a bearer header, and hands the fully read body of a 2xx
//! answer to a [`ResponseSink`]. Anything else comes back as an error and leaves the sink
//! untouched. Nothing is retried.

pub mod descriptor;
pub mod sink;

pub use descriptor::*;
pub use sink::*;

// crates.io
use oauth2::{
	AsyncHttpClient, HttpRequest,
	http::{
		self as http_types, HeaderValue,
		header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
	},
};
// self
use crate::{
	_prelude::*,
	auth::BearerToken,
	error::{ApiError, RequestError},
	http::{HttpTransport, ResponseMetadataSlot},
	oauth::TransportErrorMapper,
	obs::{self, CallKind, CallOutcome, CallSpan},
	store::CredentialStore,
};

const JSON: &str = "application/json";

/// Sends descriptors to the API on behalf of a session.
pub struct RequestDispatcher<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	base_url: Url,
	store: Arc<CredentialStore>,
	http_client: Arc<C>,
	transport_mapper: Arc<M>,
}
impl<C, M> RequestDispatcher<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a dispatcher rooted at `base_url`.
	///
	/// `base_url` is expected to end with `/` so relative paths land beneath it.
	pub fn new(
		base_url: Url,
		store: Arc<CredentialStore>,
		http_client: impl Into<Arc<C>>,
		transport_mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			base_url,
			store,
			http_client: http_client.into(),
			transport_mapper: transport_mapper.into(),
		}
	}

	/// Base URL every descriptor path is resolved against.
	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	/// Credential store consulted before every call.
	pub fn store(&self) -> &Arc<CredentialStore> {
		&self.store
	}

	/// Performs the call and feeds a 2xx body into `sink`.
	pub async fn send_into<S>(&self, descriptor: &RequestDescriptor, sink: &mut S) -> Result<()>
	where
		S: ?Sized + Send + ResponseSink,
	{
		let body = self.send_raw(descriptor).await?;

		sink.accept(body)?;

		Ok(())
	}

	/// Performs the call and returns the drained body of a 2xx answer.
	pub(crate) async fn send_raw(&self, descriptor: &RequestDescriptor) -> Result<Vec<u8>> {
		let span = CallSpan::new(CallKind::Dispatch, "send");

		obs::record_call_outcome(CallKind::Dispatch, CallOutcome::Attempt);

		let result = span.instrument(self.dispatch(descriptor)).await;
		let outcome = if result.is_ok() { CallOutcome::Success } else { CallOutcome::Failure };

		obs::record_call_outcome(CallKind::Dispatch, outcome);

		result
	}

	async fn dispatch(&self, descriptor: &RequestDescriptor) -> Result<Vec<u8>> {
		let url = descriptor.resolve(&self.base_url)?;
		let credential = self.store.acquire().await?;
		let request = build_request(descriptor, &url, credential.token())?;
		let meta = ResponseMetadataSlot::default();
		let handle = self.http_client.with_metadata(meta.clone());
		let response = match handle.call(request).await {
			Ok(response) => response,
			Err(err) => {
				obs::record_request(descriptor.method(), &url, None);

				return Err(self
					.transport_mapper
					.map_transport_error(CallKind::Dispatch, meta.take().as_ref(), err)
					.into());
			},
		};
		let status = response.status();

		obs::record_request(descriptor.method(), &url, Some(status.as_u16()));

		let body = response.into_body();

		if !status.is_success() {
			return Err(ApiError::new(descriptor.method().clone(), url, status.as_u16(), &body).into());
		}

		Ok(body)
	}
}
impl<C, M> Debug for RequestDispatcher<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RequestDispatcher")
			.field("base_url", &self.base_url.as_str())
			.field("store", &self.store)
			.finish()
	}
}

fn build_request(
	descriptor: &RequestDescriptor,
	url: &Url,
	token: &BearerToken,
) -> Result<HttpRequest, RequestError> {
	let mut authorization = HeaderValue::from_str(&token.authorization_value())?;

	authorization.set_sensitive(true);

	let mut builder = http_types::Request::builder()
		.method(descriptor.method().clone())
		.uri(url.as_str())
		.header(AUTHORIZATION, authorization)
		.header(ACCEPT, HeaderValue::from_static(JSON));

	if descriptor.payload().is_some() {
		builder = builder.header(CONTENT_TYPE, HeaderValue::from_static(JSON));
	}

	Ok(builder.body(descriptor.payload().map(<[u8]>::to_vec).unwrap_or_default())?)
}
