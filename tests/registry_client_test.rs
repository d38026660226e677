use anyhow::Result;
use create_dmp::adapters::{FunderApiRegistry, SwecrisRegistry};
use create_dmp::config::{FunderApiConfig, SwecrisConfig};
use create_dmp::domain::ports::GrantRegistry;
use create_dmp::ImportError;
use httpmock::prelude::*;
use serde_json::json;

fn swecris(server: &MockServer) -> SwecrisRegistry {
    SwecrisRegistry::new(
        &SwecrisConfig {
            url: server.url("/v1/projects/"),
            api_key: "swecris-key".to_string(),
        },
        "VR",
    )
}

fn funder_api(server: &MockServer) -> FunderApiRegistry {
    FunderApiRegistry::new(&FunderApiConfig {
        url: server.url("/grants"),
        api_key: None,
        name: Some("Formas API".to_string()),
    })
}

#[tokio::test]
async fn test_swecris_fetch_uses_composite_key_and_truncates_dates() -> Result<()> {
    let server = MockServer::start_async().await;
    let project_mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v1/projects/2021-05377_VR")
                .header("authorization", "Bearer swecris-key");
            then.status(200).json_body(json!({
                "projectId": "2021-05377_VR",
                "projectTitleEn": "Yeast cell factories",
                "projectTitleSv": "Jästcellfabriker",
                "projectAbstractEn": "About yeast",
                "projectAbstractSv": "Om jäst",
                "projectStartDate": "2022-01-01 00:00:00",
                "projectEndDate": "2025-12-31 00:00:00"
            }));
        })
        .await;

    let registry = swecris(&server);
    let metadata = registry.fetch("2021-05377").await?.expect("project should exist");

    assert_eq!(registry.source_name(), "SweCRIS");
    assert_eq!(metadata.title_en, "Yeast cell factories");
    assert_eq!(metadata.description_sv, "Om jäst");
    assert_eq!(metadata.start_date, "2022-01-01");
    assert_eq!(metadata.end_date, "2025-12-31");
    project_mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_swecris_server_error_means_not_found() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/projects/1999-00000_VR");
            then.status(500).json_body(json!({"message": "Internal server error"}));
        })
        .await;

    assert!(swecris(&server).fetch("1999-00000").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_swecris_error_body_with_success_status_means_not_found() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/projects/1999-00001_VR");
            then.status(200).body(r#"{"message": "Internal server error"}"#);
        })
        .await;

    assert!(swecris(&server).fetch("1999-00001").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_swecris_rejected_key_is_an_error_not_a_miss() -> Result<()> {
    let server = MockServer::start_async().await;
    let denied = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v1/projects/2021-05377_VR")
                .header("Authorization", "Bearer swecris-key");
            then.status(401).body("Unauthorized");
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/projects/2021-05378_VR");
            then.status(429).body("Too many requests");
        })
        .await;

    let registry = swecris(&server);
    match registry.fetch("2021-05377").await {
        Err(ImportError::RemoteError { status, .. }) => assert_eq!(status, 401),
        other => panic!("expected RemoteError, got {:?}", other),
    }
    assert!(matches!(
        registry.fetch("2021-05378").await,
        Err(ImportError::RemoteError { status: 429, .. })
    ));
    denied.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_funder_api_fetch() -> Result<()> {
    let server = MockServer::start_async().await;
    let grant_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/grants/2023-01234");
            then.status(200).json_body(json!({
                "titleEn": "Soil carbon",
                "titleSv": "Markkol",
                "descriptionEn": "Carbon in soil",
                "descriptionSv": "Kol i mark",
                "startDate": "2023-07-01T00:00:00Z",
                "endDate": "2026-06-30T00:00:00Z"
            }));
        })
        .await;

    let registry = funder_api(&server);
    let metadata = registry.fetch("2023-01234").await?.expect("grant should exist");

    assert_eq!(registry.source_name(), "Formas API");
    assert_eq!(metadata.title_sv, "Markkol");
    assert_eq!(metadata.start_date, "2023-07-01");
    assert_eq!(metadata.end_date, "2026-06-30");
    grant_mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_funder_api_not_found_and_null() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/grants/missing");
            then.status(404);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/grants/withdrawn");
            then.status(200).body("null");
        })
        .await;

    let registry = funder_api(&server);
    assert!(registry.fetch("missing").await?.is_none());
    assert!(registry.fetch("withdrawn").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_funder_api_server_error_is_an_error() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/grants/2023-01234");
            then.status(503).body("maintenance");
        })
        .await;

    assert!(funder_api(&server).fetch("2023-01234").await.is_err());
    Ok(())
}
