use crate::adapters::http::json_body;
use crate::config::DirectoryConfig;
use crate::domain::model::Contact;
use crate::domain::ports::{DirectorySession, PersonDirectory};
use crate::utils::error::{ImportError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const SERVICE: &str = "PDB";

#[derive(Serialize)]
struct FunctionCall<'a> {
    function: &'a str,
    params: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    session: Option<&'a str>,
}

#[derive(Deserialize)]
struct StartResponse {
    session: String,
}

#[derive(Deserialize)]
struct DigResponse {
    #[serde(default)]
    result: Vec<PersonRecord>,
}

#[derive(Deserialize)]
struct PersonRecord {
    primary_email: Option<String>,
    cid: Option<String>,
}

/// Person directory speaking the JSON function-call protocol.
pub struct PdbClient {
    client: Client,
    url: String,
    user: String,
    password: String,
}

impl PdbClient {
    pub fn new(config: &DirectoryConfig) -> Self {
        Self {
            client: Client::new(),
            url: config.url.clone(),
            user: config.user.clone(),
            password: config.password.clone(),
        }
    }

    /// 呼叫遠端函式；回應中含 `error` 欄位即視為失敗
    async fn call(&self, function: &str, params: Value, session: Option<&str>) -> Result<Value> {
        tracing::debug!("📡 {} {}", SERVICE, function);
        let response = self
            .client
            .post(&self.url)
            .json(&FunctionCall {
                function,
                params,
                session,
            })
            .send()
            .await?;

        let body: Value = json_body(SERVICE, response).await?;
        match body.get("error") {
            Some(error) if !error.is_null() => Err(ImportError::UnexpectedResponse {
                service: SERVICE.to_string(),
                message: format!("{} failed: {}", function, error),
            }),
            _ => Ok(body),
        }
    }

    fn decode<T: serde::de::DeserializeOwned>(function: &str, body: Value) -> Result<T> {
        serde_json::from_value(body).map_err(|e| ImportError::UnexpectedResponse {
            service: SERVICE.to_string(),
            message: format!("{}: {}", function, e),
        })
    }
}

#[async_trait]
impl PersonDirectory for PdbClient {
    async fn start(&self) -> Result<DirectorySession> {
        let body = self.call("session_start", json!([]), None).await?;
        let started: StartResponse = Self::decode("session_start", body)?;
        tracing::info!("✓ PDB session started");
        Ok(DirectorySession::new(started.session))
    }

    async fn login(&self, session: &DirectorySession) -> Result<()> {
        self.call(
            "session_auth_login",
            json!([self.user, self.password]),
            Some(session.token()),
        )
        .await
        .map_err(|e| ImportError::AuthenticationError {
            service: SERVICE.to_string(),
            message: e.to_string(),
        })?;
        tracing::info!("✓ PDB login successful");
        Ok(())
    }

    async fn lookup(&self, session: &DirectorySession, email: &str) -> Result<Option<Contact>> {
        let body = self
            .call(
                "person_dig",
                json!([{ "email": email }, { "primary_email": true, "cid": true }]),
                Some(session.token()),
            )
            .await?;
        let dig: DigResponse = Self::decode("person_dig", body)?;

        Ok(dig.result.into_iter().next().and_then(|person| {
            person.primary_email.map(|primary_email| Contact {
                email: primary_email,
                identifier: person.cid,
            })
        }))
    }

    async fn stop(&self, mut session: DirectorySession) -> Result<()> {
        // 不論結果如何，此 session 都不再使用
        session.mark_closed();
        self.call("session_stop", json!([]), Some(session.token())).await?;
        tracing::info!("✓ PDB session terminated");
        Ok(())
    }
}
