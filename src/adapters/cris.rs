use crate::adapters::http::{join_url, json_body};
use crate::config::CrisConfig;
use crate::domain::model::ResearchProjectRecord;
use crate::domain::ports::ResearchInfoSystem;
use crate::utils::error::{ImportError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const SERVICE: &str = "CRIS";
const CREATED_BY: &str = "dsw";
const PUBLISH_STATUS_PUBLISHED: u8 = 1;
const PERSON_ROLE_PROJECT_LEADER: u8 = 1;
const CONTRACT_IDENTIFIER_GRANT: u8 = 2;
const DMP_VERSION: u8 = 1;

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct CrisProject<'a> {
    project_title_eng: &'a str,
    project_title_swe: &'a str,
    project_description_eng: &'a str,
    project_description_eng_html: String,
    project_description_swe: &'a str,
    project_description_swe_html: String,
    publish_status: u8,
    start_date: String,
    end_date: String,
    project_source: &'a str,
    created_date: &'a str,
    created_by: &'a str,
    contracts: Vec<CrisContract<'a>>,
    persons: Vec<CrisPerson<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct CrisContract<'a> {
    contract_source: &'a str,
    contract_start_date: String,
    contract_end_date: String,
    dmp_value: &'a str,
    dmp_version: u8,
    contract_organization: CrisOrganizationRef<'a>,
    #[serde(rename = "OrganizationID")]
    organization_id: &'a str,
    contract_identifiers: Vec<CrisContractIdentifier<'a>>,
    created_date: &'a str,
    created_by: &'a str,
}

#[derive(Debug, Serialize)]
struct CrisOrganizationRef<'a> {
    #[serde(rename = "Id")]
    id: &'a str,
}

#[derive(Debug, Serialize)]
struct CrisContractIdentifier<'a> {
    #[serde(rename = "ProjectContractIdentifierID")]
    identifier_type: u8,
    #[serde(rename = "ProjectContractIdentifierValue")]
    value: &'a str,
}

#[derive(Debug, Serialize)]
struct CrisPerson<'a> {
    #[serde(rename = "PersonID")]
    person_id: &'a str,
    #[serde(rename = "PersonOrganizations")]
    organizations: Vec<CrisPersonOrganization<'a>>,
    #[serde(rename = "PersonRoleID")]
    role_id: u8,
}

#[derive(Debug, Serialize)]
struct CrisPersonOrganization<'a> {
    #[serde(rename = "OrganizationID")]
    organization_id: &'a str,
}

/// CRIS wants full timestamps for plain dates.
fn cris_date(date: &str) -> String {
    format!("{}T00:00:00", date)
}

impl<'a> CrisProject<'a> {
    fn from_record(record: &'a ResearchProjectRecord, created_date: &'a str) -> Self {
        Self {
            project_title_eng: &record.title_en,
            project_title_swe: &record.title_sv,
            project_description_eng: &record.description_en,
            project_description_eng_html: record.description_en_html(),
            project_description_swe: &record.description_sv,
            project_description_swe_html: record.description_sv_html(),
            publish_status: PUBLISH_STATUS_PUBLISHED,
            start_date: cris_date(&record.start_date),
            end_date: cris_date(&record.end_date),
            project_source: &record.source,
            created_date,
            created_by: CREATED_BY,
            contracts: record
                .contracts
                .iter()
                .map(|contract| CrisContract {
                    contract_source: CREATED_BY,
                    contract_start_date: cris_date(&contract.start_date),
                    contract_end_date: cris_date(&contract.end_date),
                    dmp_value: &contract.dmp_url,
                    dmp_version: DMP_VERSION,
                    contract_organization: CrisOrganizationRef {
                        id: &contract.funder_cris_id,
                    },
                    organization_id: &contract.funder_cris_id,
                    contract_identifiers: vec![CrisContractIdentifier {
                        identifier_type: CONTRACT_IDENTIFIER_GRANT,
                        value: &contract.grant_id,
                    }],
                    created_date,
                    created_by: CREATED_BY,
                })
                .collect(),
            persons: record
                .persons
                .iter()
                .map(|person| CrisPerson {
                    person_id: &person.person_id,
                    organizations: vec![CrisPersonOrganization {
                        organization_id: &person.organization_id,
                    }],
                    role_id: PERSON_ROLE_PROJECT_LEADER,
                })
                .collect(),
        }
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(rename = "TotalCount", default)]
    total_count: u64,
}

#[derive(Deserialize)]
struct PersonsResponse {
    #[serde(rename = "Persons", default)]
    persons: Vec<PersonIdDto>,
}

#[derive(Deserialize)]
struct PersonIdDto {
    #[serde(rename = "Id")]
    id: Value,
}

#[derive(Deserialize)]
struct OrganizationHomeResponse {
    #[serde(rename = "OrganizationId")]
    organization_id: Value,
}

#[derive(Deserialize)]
struct CreatedProject {
    #[serde(rename = "ID")]
    id: i64,
}

/// Ids come back as either JSON strings or numbers.
fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Research-information-system client (project search, persons, project create).
pub struct CrisClient {
    client: Client,
    api_url: String,
    person_url: String,
    ui_url: String,
    api_key: Option<String>,
}

impl CrisClient {
    pub fn new(config: &CrisConfig) -> Self {
        Self {
            client: Client::new(),
            api_url: config.api_url.clone(),
            person_url: config.person_url.clone(),
            ui_url: config.ui_url.clone(),
            api_key: config.api_key.clone(),
        }
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let builder = builder.header("Accept", "application/json");
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }
}

#[async_trait]
impl ResearchInfoSystem for CrisClient {
    async fn project_exists(&self, grant_id: &str, funder_id: &str) -> Result<bool> {
        let query = format!("\"{}\" AND \"{}\"", grant_id, funder_id);
        let response = self
            .request(self.client.get(join_url(&self.api_url, "ProjectSearch")))
            .query(&[("query", query.as_str())])
            .send()
            .await?;
        let search: SearchResponse = json_body(SERVICE, response).await?;
        tracing::debug!("CRIS search for {}: {} hits", grant_id, search.total_count);
        Ok(search.total_count > 0)
    }

    async fn resolve_person(&self, email: &str) -> Result<Option<String>> {
        let response = self
            .request(self.client.get(join_url(&self.person_url, "Persons")))
            .query(&[
                ("idValue", email),
                ("idTypeValue", "EMAIL"),
                ("maxCount", "1"),
                ("selectedFields", "Id"),
            ])
            .send()
            .await?;
        let persons: PersonsResponse = json_body(SERVICE, response).await?;
        Ok(persons.persons.first().and_then(|p| id_string(&p.id)))
    }

    async fn resolve_home_organization(&self, person_id: &str, year: i32) -> Result<String> {
        let path = format!("Persons/{}/OrganizationHomes", person_id);
        let year = year.to_string();
        let response = self
            .request(self.client.get(join_url(&self.person_url, &path)))
            .query(&[
                ("year", year.as_str()),
                ("currentOnly", "true"),
                ("maxLevelDepartment", "true"),
            ])
            .send()
            .await?;
        let home: OrganizationHomeResponse = json_body(SERVICE, response).await?;

        id_string(&home.organization_id).ok_or_else(|| ImportError::UnexpectedResponse {
            service: SERVICE.to_string(),
            message: format!("no home organization for person {}", person_id),
        })
    }

    async fn create_project(&self, project: &ResearchProjectRecord) -> Result<i64> {
        let created_date = chrono::Local::now()
            .format("%Y-%m-%dT%H:%M:%S%.6f")
            .to_string();
        let payload = CrisProject::from_record(project, &created_date);

        let response = self
            .request(self.client.post(join_url(&self.api_url, "Projects")))
            .json(&payload)
            .send()
            .await?;
        let created: CreatedProject = json_body(SERVICE, response).await?;
        Ok(created.id)
    }

    fn project_url(&self, project_id: i64) -> String {
        join_url(&self.ui_url, &format!("en/project/{}", project_id))
    }
}
