//! Connectivity and account endpoints.

// self
use crate::{
	_prelude::*,
	api::RequestQuota,
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
	/// Checks that the API is reachable with the current credential.
	///
	/// `GET ping`
	pub async fn ping(&self) -> Result<String> {
		self.send_text(&RequestDescriptor::get("ping")).await
	}

	/// Returns the current stable API version.
	///
	/// The endpoint is unversioned, so it is resolved as a sibling of the versioned base.
	pub async fn version(&self) -> Result<String> {
		self.send_text(&RequestDescriptor::get("../version")).await
	}

	/// Returns the request quotas of the client's company.
	///
	/// `GET request-quotas`
	pub async fn request_quotas(&self) -> Result<Vec<RequestQuota>> {
		self.send_json(&RequestDescriptor::get("request-quotas")).await
	}
}
