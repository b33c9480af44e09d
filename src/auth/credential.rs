//! Immutable bearer credential and its builder.
//!
//! The token endpoint only reports a relative lifetime, so a [`Credential`] stores the locally
//! captured `issued_at` instant next to that lifetime and derives `expires_at` from the pair.
//! A credential is never mutated; renewal replaces it wholesale.

// self
use crate::{_prelude::*, auth::BearerToken};

/// Freshness of a credential relative to an instant and a renewal margin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CredentialStatus {
	/// Usable without renewal.
	Fresh,
	/// Still valid but inside the renewal margin; the store renews it before use.
	Renewable,
	/// Past its expiry instant.
	Expired,
}

/// Errors produced by [`CredentialBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum CredentialBuildError {
	/// Issued when no token value was provided.
	#[error("Bearer token is required.")]
	MissingToken,
	/// Issued when no lifetime was provided.
	#[error("Token lifetime is required.")]
	MissingLifetime,
	/// Issued when the lifetime is zero or negative.
	#[error("Token lifetime must be positive.")]
	NonPositiveLifetime,
	/// Issued when the reported lifetime does not fit the supported range.
	#[error("Token lifetime exceeds the supported range.")]
	LifetimeOutOfRange,
}

/// Bearer token plus the local issuance instant and the server-reported lifetime.
#[derive(Clone)]
pub struct Credential {
	token: BearerToken,
	scope: Option<String>,
	kind: Option<String>,
	issued_at: OffsetDateTime,
	lifetime: Duration,
}
impl Credential {
	/// Returns a builder for a new credential.
	pub fn builder() -> CredentialBuilder {
		CredentialBuilder::default()
	}

	/// Bearer token attached to API calls.
	pub fn token(&self) -> &BearerToken {
		&self.token
	}

	/// Scope string reported by the token endpoint (informational).
	pub fn scope(&self) -> Option<&str> {
		self.scope.as_deref()
	}

	/// Token type reported by the token endpoint (informational).
	pub fn kind(&self) -> Option<&str> {
		self.kind.as_deref()
	}

	/// Instant captured locally when the exchange response arrived.
	pub fn issued_at(&self) -> OffsetDateTime {
		self.issued_at
	}

	/// Lifetime reported by the token endpoint.
	pub fn lifetime(&self) -> Duration {
		self.lifetime
	}

	/// Expiry instant, always `issued_at + lifetime`.
	pub fn expires_at(&self) -> OffsetDateTime {
		self.issued_at + self.lifetime
	}

	/// Classifies the credential at `now` given the renewal `margin`.
	pub fn status_at(&self, now: OffsetDateTime, margin: Duration) -> CredentialStatus {
		let expires_at = self.expires_at();

		if now >= expires_at {
			return CredentialStatus::Expired;
		}
		if now < expires_at - margin {
			return CredentialStatus::Fresh;
		}

		CredentialStatus::Renewable
	}

	/// Returns `true` when the credential can be used at `now` without renewal.
	pub fn is_usable_at(&self, now: OffsetDateTime, margin: Duration) -> bool {
		matches!(self.status_at(now, margin), CredentialStatus::Fresh)
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credential")
			.field("token", &"<redacted>")
			.field("scope", &self.scope)
			.field("kind", &self.kind)
			.field("issued_at", &self.issued_at)
			.field("lifetime", &self.lifetime)
			.finish()
	}
}

/// Builder for [`Credential`].
#[derive(Clone, Debug, Default)]
pub struct CredentialBuilder {
	token: Option<BearerToken>,
	scope: Option<String>,
	kind: Option<String>,
	issued_at: Option<OffsetDateTime>,
	lifetime: Option<Duration>,
}
impl CredentialBuilder {
	/// Provides the bearer token value.
	pub fn token(mut self, token: impl Into<String>) -> Self {
		self.token = Some(BearerToken::new(token));

		self
	}

	/// Records the scope string reported by the token endpoint.
	pub fn scope(mut self, scope: impl Into<String>) -> Self {
		self.scope = Some(scope.into());

		self
	}

	/// Records the token type reported by the token endpoint.
	pub fn kind(mut self, kind: impl Into<String>) -> Self {
		self.kind = Some(kind.into());

		self
	}

	/// Sets the locally captured issuance instant.
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Sets the lifetime reported by the token endpoint.
	pub fn lifetime(mut self, lifetime: Duration) -> Self {
		self.lifetime = Some(lifetime);

		self
	}

	/// Consumes the builder and produces a [`Credential`].
	///
	/// `issued_at` defaults to the current UTC instant when unset.
	pub fn build(self) -> Result<Credential, CredentialBuildError> {
		let token = self.token.ok_or(CredentialBuildError::MissingToken)?;

		if token.is_empty() {
			return Err(CredentialBuildError::MissingToken);
		}

		let lifetime = self.lifetime.ok_or(CredentialBuildError::MissingLifetime)?;

		if !lifetime.is_positive() {
			return Err(CredentialBuildError::NonPositiveLifetime);
		}

		Ok(Credential {
			token,
			scope: self.scope,
			kind: self.kind,
			issued_at: self.issued_at.unwrap_or_else(OffsetDateTime::now_utc),
			lifetime,
		})
	}
}
