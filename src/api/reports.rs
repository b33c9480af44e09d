//! Report endpoints.

// self
use crate::{
	_prelude::*,
	api::{Indicator, Page, Query, ReportDetails, ReportSubmission},
	dispatch::{RequestDescriptor, path_segment},
	error::RequestError,
	http::HttpTransport,
	oauth::TransportErrorMapper,
	session::Session,
};

impl<C, M> Session<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Returns a page of reports matching `query`; with no filters, the latest 25.
	///
	/// `GET reports`
	pub async fn reports(&self, query: Query<'_>) -> Result<Page<ReportDetails>> {
		self.send_json(&RequestDescriptor::get("reports").queries(query.iter().copied())).await
	}

	/// Returns a page of reports containing the search term given in `query`.
	///
	/// `GET reports/search`
	pub async fn search_reports(&self, query: Query<'_>) -> Result<Page<ReportDetails>> {
		self.send_json(&RequestDescriptor::get("reports/search").queries(query.iter().copied()))
			.await
	}

	/// Returns a page of reports containing any of the indicator values given in `query`.
	///
	/// `GET reports/correlated`
	pub async fn correlated_reports(&self, query: Query<'_>) -> Result<Page<ReportDetails>> {
		self.send_json(&RequestDescriptor::get("reports/correlated").queries(query.iter().copied()))
			.await
	}

	/// Returns one report.
	///
	/// `GET reports/{id}`
	pub async fn report(&self, id: &str) -> Result<ReportDetails> {
		self.send_json(&RequestDescriptor::get(report_path(id)?)).await
	}

	/// Returns a page of the indicators contained in a report.
	///
	/// `GET reports/{id}/indicators`
	pub async fn report_indicators(&self, id: &str, query: Query<'_>) -> Result<Page<Indicator>> {
		let descriptor = RequestDescriptor::get(format!("{}/indicators", report_path(id)?))
			.queries(query.iter().copied());

		self.send_json(&descriptor).await
	}

	/// Submits a report and returns the identifier assigned to it.
	///
	/// `POST reports`
	pub async fn submit_report(&self, report: &ReportSubmission) -> Result<String> {
		self.send_text(&RequestDescriptor::post("reports").json(report)?).await
	}

	/// Replaces the content of an existing report.
	///
	/// `PUT reports/{id}`
	pub async fn update_report(&self, id: &str, report: &ReportSubmission) -> Result<()> {
		self.send_discard(&RequestDescriptor::put(report_path(id)?).json(report)?).await
	}

	/// Deletes a report.
	///
	/// `DELETE reports/{id}`
	pub async fn delete_report(&self, id: &str) -> Result<()> {
		self.send_discard(&RequestDescriptor::delete(report_path(id)?)).await
	}
}

fn report_path(id: &str) -> Result<String, RequestError> {
	Ok(format!("reports/{}", path_segment(id)?))
}
