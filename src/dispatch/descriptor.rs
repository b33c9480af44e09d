//! Declarative description of one API call.

// crates.io
use oauth2::http::Method;
// self
use crate::{_prelude::*, error::RequestError};

/// Method, relative path, query pairs and optional JSON body for a single call.
///
/// Descriptors are plain data: they never touch the network and can be built, cloned and
/// inspected before being handed to a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestDescriptor {
	method: Method,
	path: String,
	query: Vec<(String, String)>,
	body: Option<Vec<u8>>,
}
impl RequestDescriptor {
	/// Creates a descriptor for `method` against `path`, relative to the session base URL.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self { method, path: path.into(), query: Vec::new(), body: None }
	}

	/// Shorthand for a `GET` descriptor.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::GET, path)
	}

	/// Shorthand for a `POST` descriptor.
	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::POST, path)
	}

	/// Shorthand for a `PUT` descriptor.
	pub fn put(path: impl Into<String>) -> Self {
		Self::new(Method::PUT, path)
	}

	/// Shorthand for a `DELETE` descriptor.
	pub fn delete(path: impl Into<String>) -> Self {
		Self::new(Method::DELETE, path)
	}

	/// Appends one query parameter; repeated keys are kept in order.
	pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.push((key.into(), value.into()));

		self
	}

	/// Appends every pair yielded by `pairs`.
	pub fn queries<I, K, V>(mut self, pairs: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		self.query.extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));

		self
	}

	/// Serializes `body` as the JSON request payload.
	pub fn json<T>(mut self, body: &T) -> Result<Self, RequestError>
	where
		T: ?Sized + Serialize,
	{
		self.body = Some(serde_json::to_vec(body).map_err(RequestError::Body)?);

		Ok(self)
	}

	/// Uses pre-encoded JSON bytes as the request payload.
	pub fn body(mut self, bytes: impl Into<Vec<u8>>) -> Self {
		self.body = Some(bytes.into());

		self
	}

	/// HTTP method.
	pub fn method(&self) -> &Method {
		&self.method
	}

	/// Path as given, before resolution.
	pub fn path(&self) -> &str {
		&self.path
	}

	/// Query pairs in insertion order.
	pub fn query_pairs(&self) -> &[(String, String)] {
		&self.query
	}

	/// Encoded request payload, if any.
	pub fn payload(&self) -> Option<&[u8]> {
		self.body.as_deref()
	}

	/// Resolves the descriptor against `base` and appends its query pairs.
	///
	/// Resolution follows RFC 3986, except that a leading `/` is ignored so `"/ping"` and
	/// `"ping"` both land under the base path. `..` segments climb out of it.
	pub fn resolve(&self, base: &Url) -> Result<Url, RequestError> {
		let relative = self.path.trim_start_matches('/');
		let mut url = base
			.join(relative)
			.map_err(|source| RequestError::InvalidPath { path: self.path.clone(), source })?;

		if !self.query.is_empty() {
			url.query_pairs_mut()
				.extend_pairs(self.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
		}

		Ok(url)
	}
}

/// Percent-encodes `value` for use as a single path segment.
///
/// Empty values and the dot segments `.` and `..` are rejected: URL resolution would collapse
/// them and send the request to a different resource.
pub fn path_segment(value: &str) -> Result<String, RequestError> {
	if matches!(value, "" | "." | "..") {
		return Err(RequestError::InvalidSegment { segment: value.to_owned() });
	}

	// Form encoding escapes `+` itself, so every remaining `+` stands for a space.
	Ok(url::form_urlencoded::byte_serialize(value.as_bytes())
		.collect::<String>()
		.replace('+', "%20"))
}
