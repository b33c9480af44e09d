//! Demonstrates a session against a local mock of the TruSTAR API: the first call exchanges the
//! client credentials, later calls reuse the cached token.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use trustar_session::session::{ReqwestSession, SessionConfig};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"bearer\",\"expires_in\":900}",
			);
		})
		.await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/1.3/ping").header("authorization", "Bearer demo-access");
			then.status(200).body("pong");
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/version");
			then.status(200).body("1.3");
		})
		.await;

	let config = SessionConfig::builder("demo-client", "demo-secret")
		.base_url(Url::parse(&server.url("/api/1.3/"))?)
		.token_endpoint(Url::parse(&server.url("/oauth/token"))?)
		.build()?;
	let session = ReqwestSession::new(config)?;

	println!("ping: {}", session.ping().await?);
	println!("version: {}", session.version().await?);

	let credential = session.credentials().current();

	println!(
		"token exchanges: {} (cached until {:?})",
		session.metrics().exchanges(),
		credential.map(|credential| credential.expires_at())
	);
	token_mock.assert_calls_async(1).await;

	Ok(())
}
