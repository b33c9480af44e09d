//! Enclave endpoints.

// self
use crate::{
	_prelude::*,
	api::Enclave,
	dispatch::RequestDescriptor,
	http::HttpTransport,
	oauth::TransportErrorMapper,
	session::Session,
};

impl<C, M> Session<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Lists the enclaves the client can access, with its permissions in each.
	///
	/// `GET enclaves`
	pub async fn enclaves(&self) -> Result<Vec<Enclave>> {
		self.send_json(&RequestDescriptor::get("enclaves")).await
	}
}
