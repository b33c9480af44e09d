//! Wire payloads exchanged with the TruSTAR API.
//!
//! Timestamps stay in their millisecond-epoch wire form; the `*_at` accessors convert them.

// self
use crate::{_prelude::*, api::epoch};

fn is_default<T>(value: &T) -> bool
where
	T: Default + PartialEq,
{
	*value == T::default()
}

/// Who may read a submitted report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DistributionType {
	/// Visible to the listed enclaves only.
	Enclave,
	/// Shared with the whole community.
	Community,
}

/// Enclave the user can access, with the permissions held in it.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enclave {
	pub id: String,
	pub name: String,
	#[serde(rename = "type")]
	pub kind: String,
	#[serde(default, skip_serializing_if = "is_default")]
	pub read: bool,
	#[serde(default, skip_serializing_if = "is_default")]
	pub create: bool,
	#[serde(default, skip_serializing_if = "is_default")]
	pub update: bool,
}

/// One page of a paginated listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
	/// Entries on this page.
	pub items: Vec<T>,
	/// Zero-based page index.
	#[serde(default, skip_serializing_if = "is_default")]
	pub page_number: i64,
	/// Requested page size.
	#[serde(default, skip_serializing_if = "is_default")]
	pub page_size: i64,
	/// Whether another page follows.
	#[serde(default, skip_serializing_if = "is_default")]
	pub has_next: bool,
	/// Whether the listing is empty.
	#[serde(default, skip_serializing_if = "is_default")]
	pub empty: bool,
	/// Total number of entries, when the endpoint reports it.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub total_elements: Option<i64>,
	/// Total number of pages, when the endpoint reports it.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub total_pages: Option<i64>,
}

/// Industry sector attached to a report.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sector {
	pub id: i64,
	pub label: String,
	pub name: String,
}

/// A stored incident report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDetails {
	/// TruSTAR report identifier.
	pub id: String,
	/// Report title.
	pub title: String,
	/// Report text.
	#[serde(default, skip_serializing_if = "is_default")]
	pub report_body: String,
	/// Distribution of the report.
	pub distribution_type: DistributionType,
	/// Enclaves the report was submitted to.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub enclave_ids: Vec<String>,
	/// Caller-side tracking identifier.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub external_id: Option<String>,
	/// Sector classification.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub sector: Option<Sector>,
	/// Creation time, milliseconds since the Unix epoch.
	pub created: i64,
	/// Last update time, milliseconds since the Unix epoch.
	pub updated: i64,
	/// Incident start time, milliseconds since the Unix epoch.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub time_began: Option<i64>,
}
impl ReportDetails {
	/// Creation instant.
	pub fn created_at(&self) -> Result<OffsetDateTime, time::error::ComponentRange> {
		epoch::from_ms_epoch(self.created)
	}

	/// Last update instant.
	pub fn updated_at(&self) -> Result<OffsetDateTime, time::error::ComponentRange> {
		epoch::from_ms_epoch(self.updated)
	}
}

/// Payload for submitting or updating a report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSubmission {
	/// Report title.
	pub title: String,
	/// Report text.
	pub report_body: String,
	/// Distribution of the report.
	pub distribution_type: DistributionType,
	/// Target enclaves; required for [`DistributionType::Enclave`].
	#[serde(default)]
	pub enclave_ids: Vec<String>,
	/// Caller-side tracking identifier.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub external_tracking_id: Option<String>,
	/// Link back to the caller's own copy of the report.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub external_url: Option<String>,
	/// Incident start time as an ISO-8601 string or millisecond epoch.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub time_began: Option<String>,
}
impl ReportSubmission {
	/// Creates a submission with the required fields.
	pub fn new(
		title: impl Into<String>,
		report_body: impl Into<String>,
		distribution_type: DistributionType,
	) -> Self {
		Self {
			title: title.into(),
			report_body: report_body.into(),
			distribution_type,
			enclave_ids: Vec::new(),
			external_tracking_id: None,
			external_url: None,
			time_began: None,
		}
	}

	/// Adds a target enclave.
	pub fn enclave(mut self, id: impl Into<String>) -> Self {
		self.enclave_ids.push(id.into());

		self
	}

	/// Records the incident start time.
	pub fn time_began(mut self, instant: OffsetDateTime) -> Self {
		self.time_began = Some(epoch::to_ms_epoch(instant).to_string());

		self
	}
}

/// Indicator reference as returned by searches and accepted by metadata lookups.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Indicator {
	/// Indicator value (IP, domain, hash, ...).
	pub value: String,
	/// Indicator type, e.g. `IP` or `URL`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub indicator_type: Option<String>,
	/// TruSTAR global identifier.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub guid: Option<String>,
	/// Priority assigned by TruSTAR.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub priority_level: Option<String>,
}
impl Indicator {
	/// Creates a bare indicator reference.
	pub fn new(value: impl Into<String>) -> Self {
		Self { value: value.into(), indicator_type: None, guid: None, priority_level: None }
	}
}

/// Tag attached to an indicator inside an enclave.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorTag {
	#[serde(default, skip_serializing_if = "is_default")]
	pub guid: String,
	pub name: String,
	#[serde(default, skip_serializing_if = "is_default")]
	pub enclave_id: String,
}

/// Metadata held for one indicator.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorMetadata {
	pub value: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub indicator_type: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub guid: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub priority_level: Option<String>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub enclave_ids: Vec<String>,
	/// Milliseconds since the Unix epoch.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub first_seen: Option<i64>,
	/// Milliseconds since the Unix epoch.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub last_seen: Option<i64>,
	#[serde(default, skip_serializing_if = "is_default")]
	pub sightings: i64,
	#[serde(default, skip_serializing_if = "is_default")]
	pub note_count: i64,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub notes: Vec<String>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub tags: Vec<IndicatorTag>,
}

/// Indicator trending in community reports.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingIndicator {
	/// Number of reports the indicator appeared in.
	pub correlation_count: i64,
	/// The indicator itself.
	#[serde(flatten)]
	pub indicator: Indicator,
}

/// One indicator inside an [`IndicatorSubmission`].
#[allow(missing_docs)]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorContent {
	pub value: String,
	/// Milliseconds since the Unix epoch.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub first_seen: Option<i64>,
	/// Milliseconds since the Unix epoch.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub last_seen: Option<i64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub sightings: Option<i64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub source: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub notes: Option<String>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub tags: Vec<IndicatorTag>,
}
impl IndicatorContent {
	/// Creates content for `value` with no optional fields.
	pub fn new(value: impl Into<String>) -> Self {
		Self { value: value.into(), ..Default::default() }
	}
}

/// Payload for submitting indicators.
#[allow(missing_docs)]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorSubmission {
	pub enclave_ids: Vec<String>,
	pub content: Vec<IndicatorContent>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub tags: Vec<IndicatorTag>,
}

/// Status of one request quota window.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestQuota {
	pub guid: String,
	pub max_requests: i64,
	pub used_requests: i64,
	/// Window length in milliseconds.
	pub time_window: i64,
	/// Milliseconds since the Unix epoch.
	pub last_reset_time: i64,
	/// Milliseconds since the Unix epoch.
	pub next_reset_time: i64,
}
impl RequestQuota {
	/// Requests left in the current window.
	pub fn remaining(&self) -> i64 {
		(self.max_requests - self.used_requests).max(0)
	}

	/// Instant the current window ends.
	pub fn next_reset_at(&self) -> Result<OffsetDateTime, time::error::ComponentRange> {
		epoch::from_ms_epoch(self.next_reset_time)
	}
}
