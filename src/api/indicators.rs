//! Indicator endpoints.

// self
use crate::{
	_prelude::*,
	api::{Indicator, IndicatorMetadata, IndicatorSubmission, Page, Query, TrendingIndicator},
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
	/// Returns a page of indicators matching the search term and filters in `query`.
	///
	/// `GET indicators/search`
	pub async fn search_indicators(&self, query: Query<'_>) -> Result<Page<Indicator>> {
		self.send_json(&RequestDescriptor::get("indicators/search").queries(query.iter().copied()))
			.await
	}

	/// Returns a page of indicators that share a report with the indicators in `query`.
	///
	/// `GET indicators/related`
	pub async fn related_indicators(&self, query: Query<'_>) -> Result<Page<Indicator>> {
		self.send_json(&RequestDescriptor::get("indicators/related").queries(query.iter().copied()))
			.await
	}

	/// Returns the metadata held for each of `indicators`.
	///
	/// `POST indicators/metadata`
	pub async fn indicator_metadata(
		&self,
		indicators: &[Indicator],
	) -> Result<Vec<IndicatorMetadata>> {
		self.send_json(&RequestDescriptor::post("indicators/metadata").json(indicators)?).await
	}

	/// Returns the indicators trending in community reports.
	///
	/// The endpoint answers with an empty body when nothing is trending, which yields an empty
	/// list.
	pub async fn trending_indicators(&self, query: Query<'_>) -> Result<Vec<TrendingIndicator>> {
		let descriptor = RequestDescriptor::get("indicators/community-trending")
			.queries(query.iter().copied());
		let mut trending = None::<Vec<TrendingIndicator>>;

		self.send_into(&descriptor, &mut trending).await?;

		Ok(trending.unwrap_or_default())
	}

	/// Submits indicators to the given enclaves.
	///
	/// `POST indicators`
	pub async fn submit_indicators(&self, submission: &IndicatorSubmission) -> Result<()> {
		self.send_discard(&RequestDescriptor::post("indicators").json(submission)?).await
	}
}
