//! Session configuration and its validating builder.

// self
use crate::{_prelude::*, auth::ClientSecret, error::ConfigError, store::CredentialStore};

/// Validated settings shared by every call made through a [`Session`](crate::session::Session).
#[derive(Clone, Debug)]
pub struct SessionConfig {
	/// Versioned API prefix, always ending with `/`.
	pub base_url: Url,
	/// OAuth 2.0 token endpoint used for the client-credentials exchange.
	pub token_endpoint: Url,
	/// Client identifier presented during the exchange.
	pub client_id: String,
	/// Client secret presented during the exchange.
	pub client_secret: ClientSecret,
	/// Time before expiry at which the cached credential is renewed.
	pub renewal_margin: Duration,
	/// `User-Agent` header sent by the default transport.
	pub user_agent: String,
}
impl SessionConfig {
	/// Live API prefix.
	pub const DEFAULT_BASE_URL: &'static str = "https://api.trustar.co/api/1.3/";
	/// Live token endpoint.
	pub const DEFAULT_TOKEN_ENDPOINT: &'static str = "https://api.trustar.co/oauth/token";
	/// Default `User-Agent` value.
	pub const DEFAULT_USER_AGENT: &'static str =
		concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

	/// Starts a builder for the given client identity.
	pub fn builder(
		client_id: impl Into<String>,
		client_secret: impl Into<ClientSecret>,
	) -> SessionConfigBuilder {
		SessionConfigBuilder::new(client_id, client_secret)
	}
}

/// Builder for [`SessionConfig`].
#[derive(Clone, Debug)]
pub struct SessionConfigBuilder {
	client_id: String,
	client_secret: ClientSecret,
	base_url: Option<Url>,
	token_endpoint: Option<Url>,
	renewal_margin: Option<Duration>,
	user_agent: Option<String>,
}
impl SessionConfigBuilder {
	fn new(client_id: impl Into<String>, client_secret: impl Into<ClientSecret>) -> Self {
		Self {
			client_id: client_id.into(),
			client_secret: client_secret.into(),
			base_url: None,
			token_endpoint: None,
			renewal_margin: None,
			user_agent: None,
		}
	}

	/// Overrides the versioned API prefix.
	pub fn base_url(mut self, url: Url) -> Self {
		self.base_url = Some(url);

		self
	}

	/// Overrides the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Overrides the renewal margin (default 60 seconds).
	pub fn renewal_margin(mut self, margin: Duration) -> Self {
		self.renewal_margin = Some(margin);

		self
	}

	/// Overrides the `User-Agent` header.
	pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.user_agent = Some(user_agent.into());

		self
	}

	/// Validates the settings and produces a [`SessionConfig`].
	pub fn build(self) -> Result<SessionConfig, ConfigError> {
		if self.client_id.trim().is_empty() {
			return Err(ConfigError::MissingClientId);
		}
		if self.client_secret.is_empty() {
			return Err(ConfigError::MissingClientSecret);
		}

		let renewal_margin = self.renewal_margin.unwrap_or(CredentialStore::DEFAULT_RENEWAL_MARGIN);

		if renewal_margin.is_negative() {
			return Err(ConfigError::NegativeRenewalMargin);
		}

		let base_url = match self.base_url {
			Some(url) => url,
			None => parse_default("base", SessionConfig::DEFAULT_BASE_URL)?,
		};
		let token_endpoint = match self.token_endpoint {
			Some(url) => url,
			None => parse_default("token endpoint", SessionConfig::DEFAULT_TOKEN_ENDPOINT)?,
		};

		Ok(SessionConfig {
			base_url: normalize_base(base_url)?,
			token_endpoint,
			client_id: self.client_id,
			client_secret: self.client_secret,
			renewal_margin,
			user_agent: self
				.user_agent
				.unwrap_or_else(|| SessionConfig::DEFAULT_USER_AGENT.to_owned()),
		})
	}
}

fn parse_default(field: &'static str, raw: &str) -> Result<Url, ConfigError> {
	Url::parse(raw).map_err(|source| ConfigError::InvalidUrl { field, source })
}

fn normalize_base(mut url: Url) -> Result<Url, ConfigError> {
	if url.cannot_be_a_base() {
		return Err(ConfigError::CannotBeABase { url: url.into() });
	}
	if !url.path().ends_with('/') {
		let path = format!("{}/", url.path());

		url.set_path(&path);
	}

	Ok(url)
}
