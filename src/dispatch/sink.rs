//! Decode targets for successful response bodies.

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{_prelude::*, error::DecodeError};

/// Receives the body of a 2xx response.
///
/// A sink is only touched after the status check passed; on any failure it is left as it was.
pub trait ResponseSink {
	/// Consumes the fully read response body.
	fn accept(&mut self, body: Vec<u8>) -> Result<(), DecodeError>;
}

/// Decodes the body as JSON into `T`.
///
/// An empty body is a decode failure; use `Option<T>` when the endpoint may answer with none.
#[derive(Clone, Debug, PartialEq)]
pub struct Json<T>(pub Option<T>);
impl<T> Json<T> {
	/// Creates an empty target.
	pub fn new() -> Self {
		Self(None)
	}

	/// Borrows the decoded value.
	pub fn get(&self) -> Option<&T> {
		self.0.as_ref()
	}

	/// Returns the decoded value.
	pub fn into_inner(self) -> Option<T> {
		self.0
	}
}
impl<T> Default for Json<T> {
	fn default() -> Self {
		Self::new()
	}
}
impl<T> ResponseSink for Json<T>
where
	T: DeserializeOwned,
{
	fn accept(&mut self, body: Vec<u8>) -> Result<(), DecodeError> {
		self.0 = Some(decode_json(&body)?);

		Ok(())
	}
}

/// Optional JSON: an empty (or whitespace-only) body leaves the target as `None`.
impl<T> ResponseSink for Option<T>
where
	T: DeserializeOwned,
{
	fn accept(&mut self, body: Vec<u8>) -> Result<(), DecodeError> {
		if body.iter().all(u8::is_ascii_whitespace) {
			return Ok(());
		}

		*self = Some(decode_json(&body)?);

		Ok(())
	}
}

/// Appends the body as UTF-8 text.
impl ResponseSink for String {
	fn accept(&mut self, body: Vec<u8>) -> Result<(), DecodeError> {
		self.push_str(&String::from_utf8(body)?);

		Ok(())
	}
}

/// Drops the body; any 2xx answer, empty or not, is a success.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Discard;
impl ResponseSink for Discard {
	fn accept(&mut self, _body: Vec<u8>) -> Result<(), DecodeError> {
		Ok(())
	}
}

pub(crate) fn decode_json<T>(body: &[u8]) -> Result<T, DecodeError>
where
	T: DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(body);
	let value = serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| DecodeError::Json { source })?;

	deserializer.end().map_err(DecodeError::TrailingData)?;

	Ok(value)
}
