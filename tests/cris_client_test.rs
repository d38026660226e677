use anyhow::Result;
use create_dmp::adapters::CrisClient;
use create_dmp::config::CrisConfig;
use create_dmp::domain::model::{ContractInfo, PersonInfo, ProjectMetadata, ResearchProjectRecord};
use create_dmp::domain::ports::ResearchInfoSystem;
use httpmock::prelude::*;
use serde_json::json;

fn client(server: &MockServer) -> CrisClient {
    CrisClient::new(&CrisConfig {
        api_url: server.url("/ProjectsAPI/v1"),
        person_url: server.url("/PersonsAPI/v1"),
        ui_url: "https://research.example.org".to_string(),
        year: Some(2024),
        api_key: None,
    })
}

#[tokio::test]
async fn test_project_search() -> Result<()> {
    let server = MockServer::start_async().await;
    let hit_mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/ProjectsAPI/v1/ProjectSearch")
                .query_param("query", "\"2021-05377\" AND \"5\"");
            then.status(200).json_body(json!({"TotalCount": 1, "Projects": [{"ID": 17}]}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/ProjectsAPI/v1/ProjectSearch")
                .query_param("query", "\"2022-00001\" AND \"5\"");
            then.status(200).json_body(json!({"TotalCount": 0, "Projects": []}));
        })
        .await;

    let cris = client(&server);
    assert!(cris.project_exists("2021-05377", "5").await?);
    assert!(!cris.project_exists("2022-00001", "5").await?);
    hit_mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_person_and_home_organization() -> Result<()> {
    let server = MockServer::start_async().await;
    let person_mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/PersonsAPI/v1/Persons")
                .query_param("idValue", "louise.olsson@chalmers.se")
                .query_param("idTypeValue", "EMAIL")
                .query_param("maxCount", "1")
                .query_param("selectedFields", "Id");
            then.status(200)
                .json_body(json!({"TotalCount": 1, "Persons": [{"Id": "8f2c-person"}]}));
        })
        .await;
    let org_mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/PersonsAPI/v1/Persons/8f2c-person/OrganizationHomes")
                .query_param("year", "2024")
                .query_param("currentOnly", "true")
                .query_param("maxLevelDepartment", "true");
            then.status(200).json_body(json!({"OrganizationId": 6032}));
        })
        .await;

    let cris = client(&server);
    let person_id = cris
        .resolve_person("louise.olsson@chalmers.se")
        .await?
        .expect("person should exist");
    let organization_id = cris.resolve_home_organization(&person_id, 2024).await?;

    assert_eq!(person_id, "8f2c-person");
    assert_eq!(organization_id, "6032");
    person_mock.assert_async().await;
    org_mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_unknown_person() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/PersonsAPI/v1/Persons");
            then.status(200).json_body(json!({"TotalCount": 0, "Persons": []}));
        })
        .await;

    assert!(client(&server).resolve_person("nobody@chalmers.se").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_create_project() -> Result<()> {
    let server = MockServer::start_async().await;
    let create_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/ProjectsAPI/v1/Projects")
                .json_body_partial(
                    r#"{"ProjectTitleEng": "Yeast cell factories", "PublishStatus": 1,
                        "StartDate": "2022-01-01T00:00:00", "EndDate": "2025-12-31T00:00:00",
                        "ProjectSource": "SweCRIS", "CreatedBy": "dsw"}"#,
                )
                .body_contains("\"DmpValue\":\"https://dsw.example.org/wizard/projects/dmp-1\"");
            then.status(200).json_body(json!({"ID": 4242}));
        })
        .await;

    let record = ResearchProjectRecord::new(
        &ProjectMetadata::new(
            "Yeast cell factories",
            "Jästcellfabriker",
            "About yeast",
            "Om jäst",
            "2022-01-01",
            "2025-12-31",
        ),
        "SweCRIS",
        ContractInfo {
            grant_id: "2021-05377".to_string(),
            funder_cris_id: "5".to_string(),
            start_date: "2022-01-01".to_string(),
            end_date: "2025-12-31".to_string(),
            dmp_url: "https://dsw.example.org/wizard/projects/dmp-1".to_string(),
        },
        PersonInfo {
            person_id: "8f2c-person".to_string(),
            organization_id: "6032".to_string(),
        },
    );

    let cris = client(&server);
    let id = cris.create_project(&record).await?;

    assert_eq!(id, 4242);
    assert_eq!(cris.project_url(id), "https://research.example.org/en/project/4242");
    create_mock.assert_async().await;
    Ok(())
}
