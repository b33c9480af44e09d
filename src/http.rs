//! Transport primitives shared by the token exchange and API dispatch.
//!
//! The module exposes [`HttpTransport`] alongside [`ResponseMetadata`] and
//! [`ResponseMetadataSlot`] so downstream crates can plug in custom HTTP clients. Requests and
//! responses are the `oauth2` crate's [`HttpRequest`]/[`HttpResponse`] aliases, whose bodies
//! are owned byte buffers: a handle returns only after the response body has been read in
//! full, and the buffer is released when the caller drops it.

// crates.io
use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse};
// self
use crate::_prelude::*;

/// Abstraction over HTTP transports used for both legs of an authenticated call.
///
/// Callers provide an implementation (typically behind `Arc<T>`) and the session requests
/// short-lived [`AsyncHttpClient`] handles that each carry a clone of a
/// [`ResponseMetadataSlot`]. Implementations must be `Send + Sync + 'static` so they can be
/// shared across sessions and concurrent callers, and the handles they return must own
/// whatever state is required so their request futures remain `Send`.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// [`AsyncHttpClient`] handle tied to a [`ResponseMetadataSlot`].
	type Handle: for<'c> AsyncHttpClient<
			'c,
			Error = HttpClientError<Self::TransportError>,
			Future: 'c + Send,
		>
		+ 'static
		+ Send
		+ Sync;

	/// Builds an [`AsyncHttpClient`] handle that records outcomes in `slot`.
	///
	/// # Metadata Contract
	///
	/// - Call [`ResponseMetadataSlot::take`] before submitting the HTTP request so stale
	///   information never leaks across calls.
	/// - Once a response (successful or not) has been read, save its status and body with
	///   [`ResponseMetadataSlot::store`]. The token exchange relies on this to report rejected
	///   credentials with the raw body.
	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle;
}

/// Captures metadata from the most recent HTTP response for downstream error mapping.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadata {
	/// HTTP status code returned by the endpoint, if available.
	pub status: Option<u16>,
	/// Raw response body, if it was read.
	pub body: Option<Vec<u8>>,
}

/// Thread-safe slot for sharing [`ResponseMetadata`] between transport and error layers.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadataSlot(Arc<Mutex<Option<ResponseMetadata>>>);
impl ResponseMetadataSlot {
	/// Stores new metadata for the current request.
	pub fn store(&self, meta: ResponseMetadata) {
		*self.0.lock() = Some(meta);
	}

	/// Returns the captured metadata, if any, consuming it from the slot.
	pub fn take(&self) -> Option<ResponseMetadata> {
		self.0.lock().take()
	}
}

/// Default transport backed by a shared [`ReqwestClient`] connection pool.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client that identifies itself with `user_agent`.
	///
	/// Redirects are not followed: the token endpoint must answer directly, and API calls
	/// surface 3xx answers as errors instead of re-sending the bearer token elsewhere.
	pub fn with_user_agent(user_agent: &str) -> Result<Self, crate::error::ConfigError> {
		let client = ReqwestClient::builder()
			.user_agent(user_agent)
			.redirect(reqwest::redirect::Policy::none())
			.build()?;

		Ok(Self(client))
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestHttpClient {
	type Handle = ReqwestHandle;
	type TransportError = ReqwestError;

	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
		ReqwestHandle { client: self.0.clone(), slot }
	}
}

/// Per-call handle returned by [`ReqwestHttpClient`]; drains every response into memory and
/// publishes its status and body to the slot.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestHandle {
	client: ReqwestClient,
	slot: ResponseMetadataSlot,
}
#[cfg(feature = "reqwest")]
impl ReqwestHandle {
	async fn execute(
		client: ReqwestClient,
		slot: ResponseMetadataSlot,
		request: HttpRequest,
	) -> Result<HttpResponse, HttpClientError<ReqwestError>> {
		slot.take();

		let request = reqwest::Request::try_from(request).map_err(Box::new)?;
		let response = client.execute(request).await.map_err(Box::new)?;
		let status = response.status();
		let headers = response.headers().clone();
		// Reading the body to completion hands the connection back to the pool.
		let body = response.bytes().await.map_err(Box::new)?.to_vec();

		slot.store(ResponseMetadata { status: Some(status.as_u16()), body: Some(body.clone()) });

		let mut drained = HttpResponse::new(body);

		*drained.status_mut() = status;
		*drained.headers_mut() = headers;

		Ok(drained)
	}
}
#[cfg(feature = "reqwest")]
impl<'c> AsyncHttpClient<'c> for ReqwestHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		Box::pin(Self::execute(self.client.clone(), self.slot.clone(), request))
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn metadata_slot_take_clears_the_value() {
		let slot = ResponseMetadataSlot::default();

		slot.store(ResponseMetadata { status: Some(401), body: Some(b"denied".to_vec()) });

		let meta = slot.take().expect("Stored metadata should be returned once.");

		assert_eq!(meta.status, Some(401));
		assert_eq!(meta.body.as_deref(), Some(&b"denied"[..]));
		assert!(slot.take().is_none());
	}
}
