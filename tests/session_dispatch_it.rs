// crates.io
use httpmock::prelude::*;
// self
use trustar_session::{
	_preludet::*,
	dispatch::{Discard, Json, RequestDescriptor},
	error::{DecodeError, Error, TransportError},
	session::{ReqwestSession, Session},
};

#[derive(Debug, PartialEq, Deserialize)]
struct Echo {
	id: String,
	tags: Vec<String>,
}

async fn session_with_token(server: &MockServer) -> ReqwestSession {
	server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"T1\",\"token_type\":\"bearer\",\"expires_in\":3600}");
		})
		.await;

	build_reqwest_test_session(&server.url("/api/1.3/"), &server.url("/oauth/token")).0
}

#[tokio::test]
async fn json_body_round_trips_with_bearer_and_query() {
	let server = MockServer::start_async().await;
	let session = session_with_token(&server).await;
	let mock = server
		.mock_async(|when, then| {
			when.method(PUT)
				.path("/api/1.3/echo/42")
				.query_param("mode", "full")
				.header("authorization", "Bearer T1")
				.header("content-type", "application/json")
				.header("accept", "application/json")
				.body("{\"id\":\"42\",\"tags\":[\"a\"]}");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"id\":\"42\",\"tags\":[\"a\",\"b\"]}");
		})
		.await;
	let descriptor = RequestDescriptor::put("echo/42")
		.query("mode", "full")
		.json(&serde_json::json!({ "id": "42", "tags": ["a"] }))
		.expect("JSON body should serialize.");
	let mut sink = Json::<Echo>::new();

	session.send_into(&descriptor, &mut sink).await.expect("Echo call should succeed.");
	mock.assert_async().await;

	assert_eq!(sink.into_inner(), Some(Echo { id: "42".into(), tags: vec!["a".into(), "b".into()] }));
}

#[tokio::test]
async fn non_success_status_becomes_api_error_and_leaves_the_sink_alone() {
	let server = MockServer::start_async().await;
	let session = session_with_token(&server).await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/1.3/reports/missing");
			then.status(404).body("{\"message\":\"Report not found\"}");
		})
		.await;

	let mut sink = Json(Some(Echo { id: "untouched".into(), tags: Vec::new() }));
	let err = session
		.send_into(&RequestDescriptor::get("reports/missing"), &mut sink)
		.await
		.expect_err("A 404 should be an error.");
	let api = err.as_api().expect("A 404 should be an API error.");

	assert_eq!(api.status, 404);
	assert_eq!(api.method, trustar_session::oauth::oauth2::http::Method::GET);
	assert_eq!(api.url.as_str(), server.url("/api/1.3/reports/missing"));
	assert_eq!(api.body, "{\"message\":\"Report not found\"}");
	assert!(err.to_string().contains("Report not found"));
	assert_eq!(sink.get().map(|echo| echo.id.as_str()), Some("untouched"));
}

#[tokio::test]
async fn empty_success_body_depends_on_the_declared_target() {
	let server = MockServer::start_async().await;
	let session = session_with_token(&server).await;

	server
		.mock_async(|when, then| {
			when.method(DELETE).path("/api/1.3/whitelist");
			then.status(200);
		})
		.await;

	let descriptor = RequestDescriptor::delete("whitelist");

	session.send_into(&descriptor, &mut Discard).await.expect("Discard accepts an empty body.");

	let mut optional = None::<Echo>;

	session
		.send_into(&descriptor, &mut optional)
		.await
		.expect("An optional target accepts an empty body.");

	assert!(optional.is_none());

	let err = session
		.send_json::<Echo>(&descriptor)
		.await
		.expect_err("A structured target rejects an empty body.");

	assert!(matches!(err, Error::Decode(DecodeError::Json { .. })));
}

#[tokio::test]
async fn malformed_json_reports_the_failing_field() {
	let server = MockServer::start_async().await;
	let session = session_with_token(&server).await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/1.3/echo");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"id\":\"42\",\"tags\":\"not-a-list\"}");
		})
		.await;

	let err = session
		.send_json::<Echo>(&RequestDescriptor::get("echo"))
		.await
		.expect_err("A string is not a list.");

	match err {
		Error::Decode(DecodeError::Json { source }) =>
			assert_eq!(source.path().to_string(), "tags"),
		other => panic!("Expected a decode error, got {other:?}."),
	}
}

#[tokio::test]
async fn unreachable_api_is_a_transport_error() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"T1\",\"token_type\":\"bearer\",\"expires_in\":3600}");
		})
		.await;

	// Nothing listens on port 9 of the loopback interface.
	let session = Session::with_http_client(
		test_config("http://127.0.0.1:9/api/1.3/", &server.url("/oauth/token")),
		test_reqwest_http_client(),
		trustar_session::oauth::ReqwestTransportErrorMapper,
	);
	let err = session.ping().await.expect_err("Connection refused should fail the call.");

	assert!(matches!(err, Error::Transport(TransportError::Network { .. })));
	assert!(session.credentials().current().is_some());
}

#[tokio::test]
async fn invalid_path_fails_before_any_exchange() {
	let server = MockServer::start_async().await;
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200);
		})
		.await;
	let (session, _clock) =
		build_reqwest_test_session(&server.url("/api/1.3/"), &server.url("/oauth/token"));
	let err = session
		.send_discard(&RequestDescriptor::get("http://[::1"))
		.await
		.expect_err("An unparsable URL cannot be dispatched.");

	assert!(matches!(err, Error::Request(_)));

	token.assert_calls_async(0).await;
}

#[tokio::test]
async fn default_transport_does_not_follow_redirects() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"T1\",\"token_type\":\"bearer\",\"expires_in\":3600}");
		})
		.await;

	let moved = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/1.3/ping");
			then.status(302).header("location", "https://elsewhere.example.com/steal");
		})
		.await;
	let session =
		ReqwestSession::new(test_config(&server.url("/api/1.3/"), &server.url("/oauth/token")))
			.expect("Default session should build.");
	let err = session.ping().await.expect_err("A redirect should surface as an error.");

	assert_eq!(err.status(), Some(302));

	moved.assert_calls_async(1).await;
}
