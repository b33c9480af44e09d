//! Company whitelist endpoints.

// self
use crate::{
	_prelude::*,
	api::{Indicator, Page, Query},
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
	/// Adds indicator values to the company whitelist.
	///
	/// `POST whitelist`
	pub async fn whitelist_indicators<S>(&self, values: &[S]) -> Result<()>
	where
		S: AsRef<str> + Sync,
	{
		let values = values.iter().map(|value| value.as_ref()).collect::<Vec<&str>>();

		self.send_discard(&RequestDescriptor::post("whitelist").json(&values)?).await
	}

	/// Returns a page of whitelisted indicators.
	///
	/// `GET whitelist`
	pub async fn whitelist(&self, query: Query<'_>) -> Result<Page<Indicator>> {
		self.send_json(&RequestDescriptor::get("whitelist").queries(query.iter().copied())).await
	}

	/// Removes the indicator described by `query` (`indicatorType` and `value`) from the
	/// whitelist. The endpoint answers with no content.
	///
	/// `DELETE whitelist`
	pub async fn delete_from_whitelist(&self, query: Query<'_>) -> Result<()> {
		self.send_discard(&RequestDescriptor::delete("whitelist").queries(query.iter().copied()))
			.await
	}
}
