//! Session-level error types shared by the credential store, the dispatcher, and API wrappers.

// crates.io
use oauth2::http::{Method, header::InvalidHeaderValue};
// self
use crate::_prelude::*;

/// Session-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical session error exposed by public APIs.
///
/// None of these are recovered inside the crate; each one reaches the immediate caller of
/// [`Session::send_into`](crate::session::Session::send_into) untouched.
#[derive(Debug, ThisError)]
pub enum Error {
	/// The authorization exchange failed; the target endpoint was never contacted.
	///
	/// Every caller collapsed onto the same failed exchange observes the same value, hence the
	/// [`Arc`].
	#[error(transparent)]
	Credential(Arc<CredentialError>),
	/// The outgoing request could not be constructed.
	#[error(transparent)]
	Request(#[from] RequestError),
	/// The target endpoint answered with a non-success status.
	#[error(transparent)]
	Api(#[from] ApiError),
	/// The response body did not match the decode target.
	#[error(transparent)]
	Decode(#[from] DecodeError),
	/// Transport failure (DNS, TCP, TLS) while calling the target endpoint.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
}
impl Error {
	/// Returns the HTTP status carried by API failures or rejected credential exchanges.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Api(api) => Some(api.status),
			Self::Credential(err) => match err.as_ref() {
				CredentialError::Rejected(api) => Some(api.status),
				_ => None,
			},
			_ => None,
		}
	}

	/// Returns the structured API error, if this is one.
	pub fn as_api(&self) -> Option<&ApiError> {
		match self {
			Self::Api(api) => Some(api),
			_ => None,
		}
	}
}
impl From<CredentialError> for Error {
	fn from(e: CredentialError) -> Self {
		Self::Credential(Arc::new(e))
	}
}
impl From<Arc<CredentialError>> for Error {
	fn from(e: Arc<CredentialError>) -> Self {
		Self::Credential(e)
	}
}

/// Non-success response captured as plain data.
///
/// The response body has already been read in full and the transport handle released by the
/// time this value exists.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("{method} {url} returned HTTP {status}: {body}")]
pub struct ApiError {
	/// HTTP method of the failed request.
	pub method: Method,
	/// Absolute URL of the failed request.
	pub url: Url,
	/// HTTP status code returned by the endpoint.
	pub status: u16,
	/// Raw response body, lossily decoded as UTF-8.
	pub body: String,
}
impl ApiError {
	/// Builds an API error from a drained response body.
	pub fn new(method: Method, url: Url, status: u16, body: &[u8]) -> Self {
		Self { method, url, status, body: String::from_utf8_lossy(body).into_owned() }
	}
}

/// Authorization exchange failures.
#[derive(Debug, ThisError)]
pub enum CredentialError {
	/// Token endpoint answered with a non-success status.
	#[error("Token endpoint rejected the client credentials.")]
	Rejected(#[source] ApiError),
	/// Transport failure while calling the token endpoint.
	#[error("Transport failed while calling the token endpoint.")]
	Transport(#[source] TransportError),
	/// Token endpoint responded with JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	Malformed {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Token endpoint responded with something the OAuth client could not interpret.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	UnexpectedResponse {
		/// Summary of the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Token endpoint returned a token the session cannot use.
	#[error("Token endpoint returned an unusable credential.")]
	InvalidCredential(#[from] crate::auth::CredentialBuildError),
}

/// Failures raised while turning a descriptor into a transport request.
#[derive(Debug, ThisError)]
pub enum RequestError {
	/// The descriptor path cannot be resolved against the base URL.
	#[error("Request path `{path}` cannot be resolved against the base URL.")]
	InvalidPath {
		/// Offending descriptor path.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A path parameter is empty or a dot segment and cannot name a resource.
	#[error("Path segment `{segment}` cannot name a resource.")]
	InvalidSegment {
		/// Offending value.
		segment: String,
	},
	/// The request body could not be serialized as JSON.
	#[error("Request body could not be serialized as JSON.")]
	Body(#[source] serde_json::Error),
	/// The bearer token cannot be carried in an HTTP header.
	#[error("Bearer token cannot be encoded as an Authorization header.")]
	InvalidHeader(#[from] InvalidHeaderValue),
	/// HTTP request construction failed.
	#[error(transparent)]
	Build(#[from] oauth2::http::Error),
}

/// Response decoding failures.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// The body is not JSON of the expected shape (an empty body included).
	#[error("Response body does not match the expected shape.")]
	Json {
		/// Structured parsing failure, including the failing path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// The JSON value is followed by trailing data.
	#[error("Response body carries trailing data after the JSON value.")]
	TrailingData(#[source] serde_json::Error),
	/// The body was expected to be text but is not valid UTF-8.
	#[error("Response body is not valid UTF-8.")]
	Utf8(#[from] std::string::FromUtf8Error),
}

/// Configuration and validation failures raised while building a session.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// A configured URL cannot be parsed or cannot serve as a base.
	#[error("The {field} URL is invalid.")]
	InvalidUrl {
		/// Which configuration field failed validation.
		field: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// The configured base URL cannot carry relative paths (e.g. `mailto:`).
	#[error("The base URL `{url}` cannot be used as a base.")]
	CannotBeABase {
		/// Offending URL.
		url: String,
	},
	/// Client identifier was empty.
	#[error("Client identifier cannot be empty.")]
	MissingClientId,
	/// Client secret was empty.
	#[error("Client secret cannot be empty.")]
	MissingClientSecret,
	/// The renewal margin must not be negative.
	#[error("The renewal margin must not be negative.")]
	NegativeRenewalMargin,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO), shared by the exchange and the target call.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while sending the request.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The underlying HTTP client gave up waiting for the endpoint.
	#[error("Request timed out.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while sending the request.")]
	Io(#[from] std::io::Error),
	/// The transport could not convert the request into its own representation.
	#[error("Transport rejected the request.")]
	InvalidRequest(#[source] oauth2::http::Error),
	/// Catch-all for transport failures without a structured source.
	#[error("HTTP client error occurred: {message}.")]
	Other {
		/// Transport-supplied message.
		message: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Timeout { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::timeout(e) } else { Self::network(e) }
	}
}
