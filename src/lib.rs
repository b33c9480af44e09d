//! Authenticated session layer for the TruSTAR REST API: cached client-credentials tokens,
//! single-flight renewal before expiry, and one request/response/error pipeline behind every
//! endpoint.
//!
//! ```no_run
//! # async fn demo() -> trustar_session::error::Result<()> {
//! use trustar_session::session::{ReqwestSession, SessionConfig};
//!
//! let config = SessionConfig::builder("client-id", "client-secret").build()?;
//! let session = ReqwestSession::new(config)?;
//!
//! println!("{}", session.ping().await?);
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod auth;
pub mod clock;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod session;
pub mod store;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		clock::ManualClock,
		http::ReqwestHttpClient,
		oauth::ReqwestTransportErrorMapper,
		session::{ReqwestSession, Session, SessionConfig},
	};

	/// Client identifier used by test sessions.
	pub const CLIENT_ID: &str = "test-client";
	/// Client secret used by test sessions.
	pub const CLIENT_SECRET: &str = "test-secret";

	/// Builds a reqwest HTTP client suitable for talking to `httpmock` servers.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.expect("Failed to build Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Builds a configuration pointing both endpoints at a mock server.
	pub fn test_config(base_url: &str, token_endpoint: &str) -> SessionConfig {
		SessionConfig::builder(CLIENT_ID, CLIENT_SECRET)
			.base_url(Url::parse(base_url).expect("Test base URL should parse."))
			.token_endpoint(Url::parse(token_endpoint).expect("Test token endpoint should parse."))
			.build()
			.expect("Test configuration should build.")
	}

	/// Constructs a reqwest-backed [`Session`] driven by a [`ManualClock`], returning the clock
	/// so tests can move time forward.
	pub fn build_reqwest_test_session(
		base_url: &str,
		token_endpoint: &str,
	) -> (ReqwestSession, ManualClock) {
		let clock = ManualClock::default();
		let session = Session::with_clock(
			test_config(base_url, token_endpoint),
			test_reqwest_http_client(),
			ReqwestTransportErrorMapper,
			Arc::new(clock.clone()),
		);

		(session, clock)
	}
}

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use color_eyre as _;
