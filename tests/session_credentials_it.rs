// crates.io
use httpmock::{Mock, prelude::*};
// self
use trustar_session::{
	_preludet::*,
	clock::{Clock, ManualClock},
	error::{CredentialError, Error},
	session::ReqwestSession,
};

const BASIC_AUTH: &str = "Basic dGVzdC1jbGllbnQ6dGVzdC1zZWNyZXQ=";

async fn mock_token<'a>(server: &'a MockServer, token: &str, expires_in: i64) -> Mock<'a> {
	let body = format!(
		"{{\"access_token\":\"{token}\",\"token_type\":\"bearer\",\"expires_in\":{expires_in},\"scope\":\"read\"}}"
	);

	server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/oauth/token")
				.header("authorization", BASIC_AUTH)
				.body_includes("grant_type=client_credentials");
			then.status(200).header("content-type", "application/json").body(body);
		})
		.await
}

async fn mock_ping<'a>(server: &'a MockServer, token: &str) -> Mock<'a> {
	let bearer = format!("Bearer {token}");

	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/1.3/ping").header("authorization", bearer);
			then.status(200).body("pong");
		})
		.await
}

fn session(server: &MockServer) -> (ReqwestSession, ManualClock) {
	build_reqwest_test_session(&server.url("/api/1.3/"), &server.url("/oauth/token"))
}

#[tokio::test]
async fn first_call_exchanges_and_later_calls_reuse_the_credential() {
	let server = MockServer::start_async().await;
	let token = mock_token(&server, "T1", 3600).await;
	let ping = mock_ping(&server, "T1").await;
	let (session, clock) = session(&server);

	assert_eq!(session.ping().await.expect("First ping should succeed."), "pong");

	clock.advance(Duration::minutes(30));

	assert_eq!(session.ping().await.expect("Second ping should succeed."), "pong");

	token.assert_calls_async(1).await;
	ping.assert_calls_async(2).await;

	let credential = session.credentials().current().expect("Credential should be cached.");

	assert_eq!(credential.token().expose(), "T1");
	assert_eq!(credential.scope(), Some("read"));
	assert_eq!(session.metrics().exchanges(), 1);
	assert_eq!(session.metrics().cache_hits(), 1);
}

#[tokio::test]
async fn credential_inside_the_renewal_margin_is_replaced_before_use() {
	let server = MockServer::start_async().await;
	let first_token = mock_token(&server, "T1", 3600).await;
	let first_ping = mock_ping(&server, "T1").await;
	let (session, clock) = session(&server);

	session.ping().await.expect("Ping with the first credential should succeed.");
	first_token.assert_calls_async(1).await;
	first_ping.assert_calls_async(1).await;
	first_token.delete_async().await;
	first_ping.delete_async().await;

	let second_token = mock_token(&server, "T2", 3600).await;
	let second_ping = mock_ping(&server, "T2").await;

	// Ten seconds before expiry, inside the default sixty second margin.
	clock.advance(Duration::seconds(3590));
	session.ping().await.expect("Ping with the renewed credential should succeed.");

	second_token.assert_calls_async(1).await;
	second_ping.assert_calls_async(1).await;
	assert_eq!(
		session.credentials().current().expect("Renewed credential is cached.").expires_at(),
		clock.now() + Duration::seconds(3600)
	);
}

#[tokio::test]
async fn concurrent_first_calls_share_one_exchange() {
	let server = MockServer::start_async().await;
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200)
				.header("content-type", "application/json")
				.delay(std::time::Duration::from_millis(100))
				.body("{\"access_token\":\"T1\",\"token_type\":\"bearer\",\"expires_in\":900}");
		})
		.await;
	let ping = mock_ping(&server, "T1").await;
	let (session, _clock) = session(&server);
	let results = futures::future::join_all((0..8).map(|_| session.ping())).await;

	for result in results {
		assert_eq!(result.expect("Every concurrent ping should succeed."), "pong");
	}

	token.assert_calls_async(1).await;
	ping.assert_calls_async(8).await;
}

#[tokio::test]
async fn rejected_exchange_surfaces_status_and_body_without_calling_the_api() {
	let server = MockServer::start_async().await;
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_client\",\"error_description\":\"Bad credentials\"}");
		})
		.await;
	let ping = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/1.3/ping");
			then.status(200).body("pong");
		})
		.await;
	let (session, _clock) = session(&server);
	let err = session.ping().await.expect_err("Rejected credentials should fail the call.");

	assert_eq!(err.status(), Some(401));

	match &err {
		Error::Credential(inner) => match inner.as_ref() {
			CredentialError::Rejected(api) => assert!(api.body.contains("Bad credentials")),
			other => panic!("Expected a rejected exchange, got {other:?}."),
		},
		other => panic!("Expected a credential error, got {other:?}."),
	}

	token.assert_calls_async(1).await;
	ping.assert_calls_async(0).await;
	assert!(session.credentials().current().is_none());
	assert_eq!(session.metrics().failures(), 1);
}

#[tokio::test]
async fn failed_exchange_is_not_cached_and_the_next_call_retries_it() {
	let server = MockServer::start_async().await;
	let rejected = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(503).body("maintenance");
		})
		.await;
	let (session, _clock) = session(&server);

	session.ping().await.expect_err("The unavailable token endpoint should fail the call.");
	rejected.assert_calls_async(1).await;
	rejected.delete_async().await;

	let token = mock_token(&server, "T1", 3600).await;
	let ping = mock_ping(&server, "T1").await;

	assert_eq!(session.ping().await.expect("The next call should exchange again."), "pong");

	token.assert_calls_async(1).await;
	ping.assert_calls_async(1).await;
}

#[tokio::test]
async fn resumed_exchange_keeps_the_instant_it_was_started() {
	let server = MockServer::start_async().await;
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200)
				.header("content-type", "application/json")
				.delay(std::time::Duration::from_millis(100))
				.body("{\"access_token\":\"T1\",\"token_type\":\"bearer\",\"expires_in\":3600}");
		})
		.await;
	let ping = mock_ping(&server, "T1").await;
	let (session, clock) = session(&server);
	let started = clock.now();
	let leader = tokio::time::timeout(std::time::Duration::from_millis(20), session.ping()).await;

	assert!(leader.is_err(), "The leader's deadline should elapse before the token arrives.");

	// The token endpoint answers while nobody is waiting on the exchange.
	tokio::time::sleep(std::time::Duration::from_millis(300)).await;
	clock.advance(Duration::minutes(50));

	assert_eq!(session.ping().await.expect("The next call should resume the exchange."), "pong");

	let credential = session.credentials().current().expect("Resumed credential is cached.");

	assert_eq!(credential.issued_at(), started);
	assert_eq!(credential.expires_at(), started + Duration::hours(1));

	token.assert_calls_async(1).await;
	ping.assert_calls_async(1).await;
}
