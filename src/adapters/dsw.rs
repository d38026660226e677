use crate::adapters::http::{ensure_success, join_url, json_body};
use crate::config::DswConfig;
use crate::domain::events::ContentEvent;
use crate::domain::model::{NewPlatformUser, NewQuestionnaire, PlatformUser};
use crate::domain::ports::DmpPlatform;
use crate::utils::error::{ImportError, Result};
use async_trait::async_trait;
use rand::Rng;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const SERVICE: &str = "DSW";
const USER_ROLE: &str = "researcher";
const PASSWORD_LENGTH: usize = 44;
const PASSWORD_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const OWNER_PERMISSIONS: [&str; 4] = ["VIEW", "COMMENT", "EDIT", "ADMIN"];

#[derive(Serialize)]
struct TokenRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
}

#[derive(Deserialize)]
struct UserPage {
    #[serde(rename = "_embedded")]
    embedded: EmbeddedUsers,
}

#[derive(Deserialize)]
struct EmbeddedUsers {
    #[serde(default)]
    users: Vec<UserDto>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserDto {
    uuid: String,
    email: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    #[serde(default = "default_active")]
    active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateUserRequest<'a> {
    email: &'a str,
    first_name: &'a str,
    last_name: &'a str,
    role: &'a str,
    password: &'a str,
    affiliation: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ActivateUserRequest<'a> {
    email: &'a str,
    active: bool,
    first_name: &'a str,
    last_name: &'a str,
    role: &'a str,
    affiliation: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateQuestionnaireRequest<'a> {
    name: &'a str,
    package_id: &'a str,
    template_id: &'a str,
    question_tag_uuids: &'a [String],
    format_uuid: &'a str,
    visibility: &'a str,
    sharing: &'a str,
    state: &'a str,
    is_template: bool,
}

#[derive(Serialize)]
struct ContentRequest<'a> {
    events: &'a [ContentEvent],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ShareRequest<'a> {
    visibility: &'a str,
    sharing: &'a str,
    permissions: Vec<Permission<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Permission<'a> {
    member_type: &'a str,
    member_uuid: &'a str,
    perms: [&'a str; 4],
}

#[derive(Deserialize)]
struct CreatedResource {
    uuid: String,
}

/// DMP platform REST client holding a bearer token for the whole run.
pub struct DswClient {
    client: Client,
    api_url: String,
    ui_url: String,
    token: String,
    package_id: String,
    template_id: String,
    affiliation: String,
}

impl DswClient {
    /// 以服務帳號登入並取得 token
    pub async fn authenticate(config: &DswConfig) -> Result<Self> {
        let client = Client::new();
        tracing::info!("🔐 Authenticating with DSW as {}", config.user);

        let response = client
            .post(join_url(&config.url, "tokens"))
            .header("Accept", "application/json")
            .json(&TokenRequest {
                email: &config.user,
                password: &config.password,
            })
            .send()
            .await
            .map_err(|e| auth_error(&config.user, e))?;

        let token: TokenResponse = json_body(SERVICE, response)
            .await
            .map_err(|e| auth_error(&config.user, e))?;

        Ok(Self {
            client,
            api_url: config.url.clone(),
            ui_url: config.ui_url.clone(),
            token: token.token,
            package_id: config.package_id.clone(),
            template_id: config.template_id.clone(),
            affiliation: config.affiliation.clone(),
        })
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .get(join_url(&self.api_url, path))
            .header("Accept", "application/json")
            .bearer_auth(&self.token)
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(join_url(&self.api_url, path))
            .header("Accept", "application/json")
            .bearer_auth(&self.token)
    }

    fn put(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .put(join_url(&self.api_url, path))
            .header("Accept", "application/json")
            .bearer_auth(&self.token)
    }
}

fn auth_error(user: &str, error: impl std::fmt::Display) -> ImportError {
    ImportError::AuthenticationError {
        service: SERVICE.to_string(),
        message: format!("user {}: {}", user, error),
    }
}

/// Random letters-only password; new users reset it themselves.
pub fn generate_password() -> String {
    let mut rng = rand::thread_rng();
    (0..PASSWORD_LENGTH)
        .map(|_| PASSWORD_ALPHABET[rng.gen_range(0..PASSWORD_ALPHABET.len())] as char)
        .collect()
}

#[async_trait]
impl DmpPlatform for DswClient {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<PlatformUser>> {
        let response = self.get("users").query(&[("q", email)]).send().await?;
        let page: UserPage = json_body(SERVICE, response).await?;

        // 搜尋為模糊比對，只接受完全相同的 email
        Ok(page
            .embedded
            .users
            .into_iter()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .map(|user| PlatformUser {
                uuid: user.uuid,
                email: user.email,
                first_name: user.first_name,
                last_name: user.last_name,
                active: user.active,
            }))
    }

    async fn create_user(&self, user: &NewPlatformUser) -> Result<String> {
        let password = generate_password();
        let response = self
            .post("users")
            .json(&CreateUserRequest {
                email: &user.email,
                first_name: &user.first_name,
                last_name: &user.last_name,
                role: USER_ROLE,
                password: &password,
                affiliation: &self.affiliation,
            })
            .send()
            .await?;
        let created: CreatedResource = json_body(SERVICE, response).await?;
        tracing::debug!("User {} created with uuid {}", user.email, created.uuid);

        self.activate_user(&PlatformUser {
            uuid: created.uuid.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            active: false,
        })
        .await?;
        Ok(created.uuid)
    }

    /// 失敗時錯誤帶上 uuid，讓已建立但未啟用的帳號可被追查
    async fn activate_user(&self, user: &PlatformUser) -> Result<()> {
        let activation = async {
            let response = self
                .put(&format!("users/{}", user.uuid))
                .json(&ActivateUserRequest {
                    email: &user.email,
                    active: true,
                    first_name: &user.first_name,
                    last_name: &user.last_name,
                    role: USER_ROLE,
                    affiliation: &self.affiliation,
                })
                .send()
                .await?;
            ensure_success(SERVICE, response).await.map(|_| ())
        };

        activation
            .await
            .map_err(|e| ImportError::UserActivationError {
                uuid: user.uuid.clone(),
                source: Box::new(e),
            })
    }

    async fn create_questionnaire(&self, questionnaire: &NewQuestionnaire) -> Result<String> {
        let response = self
            .post("questionnaires")
            .json(&CreateQuestionnaireRequest {
                name: &questionnaire.name,
                package_id: &self.package_id,
                template_id: &self.template_id,
                question_tag_uuids: &questionnaire.question_tag_uuids,
                format_uuid: &questionnaire.format_uuid,
                visibility: "PrivateQuestionnaire",
                sharing: "RestrictedQuestionnaire",
                state: "Default",
                is_template: false,
            })
            .send()
            .await?;
        let created: CreatedResource = json_body(SERVICE, response).await?;
        Ok(created.uuid)
    }

    async fn set_content(&self, questionnaire_uuid: &str, events: &[ContentEvent]) -> Result<()> {
        let response = self
            .put(&format!("questionnaires/{}/content", questionnaire_uuid))
            .json(&ContentRequest { events })
            .send()
            .await?;
        ensure_success(SERVICE, response).await?;
        Ok(())
    }

    async fn set_sharing(&self, questionnaire_uuid: &str, owner_uuid: &str) -> Result<()> {
        let response = self
            .put(&format!("questionnaires/{}/share", questionnaire_uuid))
            .json(&ShareRequest {
                visibility: "PrivateQuestionnaire",
                sharing: "RestrictedQuestionnaire",
                permissions: vec![Permission {
                    member_type: "UserQuestionnairePermType",
                    member_uuid: owner_uuid,
                    perms: OWNER_PERMISSIONS,
                }],
            })
            .send()
            .await?;
        ensure_success(SERVICE, response).await?;
        Ok(())
    }

    fn dmp_url(&self, questionnaire_uuid: &str) -> String {
        join_url(&self.ui_url, &format!("projects/{}", questionnaire_uuid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_password_is_letters_only() {
        let password = generate_password();
        assert_eq!(password.len(), PASSWORD_LENGTH);
        assert!(password.chars().all(|c| c.is_ascii_alphabetic()));
        assert_ne!(password, generate_password());
    }

    #[test]
    fn test_share_request_wire_shape() {
        let body = serde_json::to_value(ShareRequest {
            visibility: "PrivateQuestionnaire",
            sharing: "RestrictedQuestionnaire",
            permissions: vec![Permission {
                member_type: "UserQuestionnairePermType",
                member_uuid: "user-1",
                perms: OWNER_PERMISSIONS,
            }],
        })
        .unwrap();

        assert_eq!(body["permissions"][0]["memberType"], "UserQuestionnairePermType");
        assert_eq!(body["permissions"][0]["memberUuid"], "user-1");
        assert_eq!(
            body["permissions"][0]["perms"],
            serde_json::json!(["VIEW", "COMMENT", "EDIT", "ADMIN"])
        );
    }
}
