use anyhow::Result;
use create_dmp::adapters::PdbClient;
use create_dmp::config::DirectoryConfig;
use create_dmp::domain::ports::PersonDirectory;
use create_dmp::ImportError;
use httpmock::prelude::*;
use serde_json::json;

fn client(server: &MockServer) -> PdbClient {
    PdbClient::new(&DirectoryConfig {
        url: server.url("/pdb"),
        user: "pdb-user".to_string(),
        password: "pdb-pw".to_string(),
    })
}

async fn mock_start(server: &MockServer) -> httpmock::Mock<'_> {
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/pdb")
                .json_body(json!({"function": "session_start", "params": []}));
            then.status(200).json_body(json!({"session": "s-42"}));
        })
        .await
}

async fn mock_stop(server: &MockServer) -> httpmock::Mock<'_> {
    server
        .mock_async(|when, then| {
            when.method(POST).path("/pdb").json_body(json!({
                "function": "session_stop",
                "params": [],
                "session": "s-42"
            }));
            then.status(200).json_body(json!({"result": true}));
        })
        .await
}

#[tokio::test]
async fn test_session_lifecycle_and_lookup() -> Result<()> {
    let server = MockServer::start_async().await;
    let start_mock = mock_start(&server).await;
    let login_mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/pdb").json_body(json!({
                "function": "session_auth_login",
                "params": ["pdb-user", "pdb-pw"],
                "session": "s-42"
            }));
            then.status(200).json_body(json!({"result": true}));
        })
        .await;
    let dig_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/pdb")
                .json_body_partial(r#"{"function": "person_dig", "session": "s-42"}"#)
                .body_contains("louise.olsson@chalmers.se");
            then.status(200).json_body(json!({
                "result": [{"primary_email": "louise@chalmers.se", "cid": "louiseo"}]
            }));
        })
        .await;
    let stop_mock = mock_stop(&server).await;

    let directory = client(&server);
    let session = directory.open().await?;
    assert_eq!(session.token(), "s-42");

    let contact = directory
        .lookup(&session, "louise.olsson@chalmers.se")
        .await?
        .expect("person should be found");
    assert_eq!(contact.email, "louise@chalmers.se");
    assert_eq!(contact.identifier.as_deref(), Some("louiseo"));

    directory.stop(session).await?;

    start_mock.assert_async().await;
    login_mock.assert_async().await;
    dig_mock.assert_async().await;
    stop_mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_lookup_without_match() -> Result<()> {
    let server = MockServer::start_async().await;
    mock_start(&server).await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/pdb")
                .json_body_partial(r#"{"function": "person_dig"}"#);
            then.status(200).json_body(json!({"result": []}));
        })
        .await;
    mock_stop(&server).await;

    let directory = client(&server);
    let session = directory.start().await?;
    let contact = directory.lookup(&session, "nobody@chalmers.se").await?;
    directory.stop(session).await?;

    assert!(contact.is_none());
    Ok(())
}

#[tokio::test]
async fn test_failed_login_still_stops_session() -> Result<()> {
    let server = MockServer::start_async().await;
    mock_start(&server).await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/pdb")
                .json_body_partial(r#"{"function": "session_auth_login"}"#);
            then.status(200).json_body(json!({"error": {"code": 401, "message": "bad credentials"}}));
        })
        .await;
    let stop_mock = mock_stop(&server).await;

    let err = match client(&server).open().await {
        Ok(_) => panic!("login should fail"),
        Err(e) => e,
    };

    assert!(matches!(err, ImportError::AuthenticationError { .. }));
    stop_mock.assert_async().await;
    Ok(())
}
