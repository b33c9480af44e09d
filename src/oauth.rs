//! Client-credentials exchange against the token endpoint.

pub use oauth2;

// crates.io
use oauth2::{
	ClientId, EndpointNotSet, EndpointSet, HttpClientError, RequestTokenError, TokenResponse,
	TokenUrl,
	basic::{BasicClient, BasicRequestTokenError, BasicTokenResponse},
	http::Method,
};
// self
use crate::{
	_prelude::*,
	auth::{ClientSecret, Credential, CredentialBuildError},
	clock::Clock,
	error::{ApiError, CredentialError, TransportError},
	http::{HttpTransport, ResponseMetadata, ResponseMetadataSlot},
	obs::CallKind,
	store::{CredentialSource, SourceFuture},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

type ConfiguredBasicClient =
	BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Maps HTTP transport failures into session [`TransportError`] values.
///
/// The same mapper serves both legs of a call; `kind` says which one failed.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a session error.
	fn map_transport_error(
		&self,
		kind: CallKind,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> TransportError;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		_kind: CallKind,
		_meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> TransportError {
		match err {
			HttpClientError::Reqwest(inner) => TransportError::from(*inner),
			HttpClientError::Http(inner) => TransportError::InvalidRequest(inner),
			HttpClientError::Io(inner) => TransportError::Io(inner),
			HttpClientError::Other(message) => TransportError::Other { message },
			_ => TransportError::Other { message: "unrecognized HTTP client failure".into() },
		}
	}
}

/// [`ClientCredentialsSource`] specialized for the crate's default reqwest transport stack.
#[cfg(feature = "reqwest")]
pub type ReqwestClientCredentialsSource =
	ClientCredentialsSource<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// [`CredentialSource`] that performs the OAuth 2.0 client-credentials grant.
///
/// The client identity travels in an HTTP Basic `Authorization` header and the form body carries
/// `grant_type=client_credentials`. Every call is a single round trip.
pub struct ClientCredentialsSource<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	oauth_client: ConfiguredBasicClient,
	token_endpoint: Url,
	http_client: Arc<C>,
	error_mapper: Arc<M>,
	clock: Arc<dyn Clock>,
}
impl<C, M> ClientCredentialsSource<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a source for the given client identity and token endpoint.
	pub fn new(
		client_id: &str,
		client_secret: &ClientSecret,
		token_endpoint: Url,
		http_client: impl Into<Arc<C>>,
		error_mapper: impl Into<Arc<M>>,
		clock: Arc<dyn Clock>,
	) -> Self {
		let oauth_client = BasicClient::new(ClientId::new(client_id.to_owned()))
			.set_client_secret(oauth2::ClientSecret::new(client_secret.expose().to_owned()))
			.set_token_uri(TokenUrl::from_url(token_endpoint.clone()));

		Self {
			oauth_client,
			token_endpoint,
			http_client: http_client.into(),
			error_mapper: error_mapper.into(),
			clock,
		}
	}

	/// Token endpoint this source posts to.
	pub fn token_endpoint(&self) -> &Url {
		&self.token_endpoint
	}

	fn credential_from(
		&self,
		response: BasicTokenResponse,
		issued_at: OffsetDateTime,
	) -> Result<Credential, CredentialError> {
		let lifetime = response.expires_in().ok_or(CredentialBuildError::MissingLifetime)?;
		let lifetime =
			Duration::try_from(lifetime).map_err(|_| CredentialBuildError::LifetimeOutOfRange)?;
		let kind: &str = response.token_type().as_ref();
		let mut builder = Credential::builder()
			.token(response.access_token().secret().to_owned())
			.kind(kind)
			.issued_at(issued_at)
			.lifetime(lifetime);

		if let Some(scopes) = response.scopes() {
			builder = builder
				.scope(scopes.iter().map(|scope| scope.as_str()).collect::<Vec<_>>().join(" "));
		}

		Ok(builder.build()?)
	}

	fn map_request_error(
		&self,
		meta: Option<ResponseMetadata>,
		err: BasicRequestTokenError<HttpClientError<C::TransportError>>,
	) -> CredentialError {
		let status = meta.as_ref().and_then(|meta| meta.status);
		// oauth2 only accepts 200, so any other 2xx falls through to the structured arms below.
		let rejected = meta.as_ref().and_then(|meta| {
			meta.status
				.filter(|status| !(200..300).contains(status))
				.map(|status| (status, meta.body.as_deref().unwrap_or_default()))
		});

		match (err, rejected) {
			(RequestTokenError::Request(error), _) => CredentialError::Transport(
				self.error_mapper.map_transport_error(CallKind::Exchange, meta.as_ref(), error),
			),
			(_, Some((status, body))) => CredentialError::Rejected(ApiError::new(
				Method::POST,
				self.token_endpoint.clone(),
				status,
				body,
			)),
			(RequestTokenError::Parse(source, _), None) =>
				CredentialError::Malformed { source, status },
			(RequestTokenError::ServerResponse(response), None) =>
				CredentialError::UnexpectedResponse {
					message: format!("OAuth error `{}`", response.error().as_ref()),
					status,
				},
			(RequestTokenError::Other(message), None) =>
				CredentialError::UnexpectedResponse { message, status },
		}
	}
}
impl<C, M> CredentialSource for ClientCredentialsSource<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn exchange(&self) -> SourceFuture<'_> {
		let meta = ResponseMetadataSlot::default();
		// Stamped before the request leaves, so a response read late never extends the lifetime.
		let issued_at = self.clock.now();

		Box::pin(async move {
			let instrumented = self.http_client.with_metadata(meta.clone());
			let response = self
				.oauth_client
				.exchange_client_credentials()
				.request_async(&instrumented)
				.await
				.map_err(|err| self.map_request_error(meta.take(), err))?;

			self.credential_from(response, issued_at)
		})
	}
}
impl<C, M> Debug for ClientCredentialsSource<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientCredentialsSource")
			.field("client_id", self.oauth_client.client_id())
			.field("token_endpoint", &self.token_endpoint.as_str())
			.finish()
	}
}
