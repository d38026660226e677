use crate::domain::events::ContentEvent;
use crate::domain::model::{
    Contact, NewPlatformUser, NewQuestionnaire, Notification, PlatformUser, ProjectMetadata,
    ResearchProjectRecord,
};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Grant metadata source; `Ok(None)` means the registry has no such grant.
#[async_trait]
pub trait GrantRegistry: Send + Sync {
    fn source_name(&self) -> &str;
    async fn fetch(&self, grant_id: &str) -> Result<Option<ProjectMetadata>>;
}

/// Token of an open person-directory session.
///
/// Must be handed back to [`PersonDirectory::stop`]; dropping it while still
/// open only logs a warning.
#[derive(Debug)]
pub struct DirectorySession {
    token: String,
    closed: bool,
}

impl DirectorySession {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            closed: false,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn mark_closed(&mut self) {
        self.closed = true;
    }
}

impl Drop for DirectorySession {
    fn drop(&mut self) {
        if !self.closed {
            tracing::warn!("⚠️ Directory session dropped without being stopped");
        }
    }
}

#[async_trait]
pub trait PersonDirectory: Send + Sync {
    async fn start(&self) -> Result<DirectorySession>;
    async fn login(&self, session: &DirectorySession) -> Result<()>;
    async fn lookup(&self, session: &DirectorySession, email: &str) -> Result<Option<Contact>>;
    async fn stop(&self, session: DirectorySession) -> Result<()>;

    /// start + login; a session whose login fails is stopped again.
    async fn open(&self) -> Result<DirectorySession> {
        let session = self.start().await?;
        if let Err(e) = self.login(&session).await {
            if let Err(stop_error) = self.stop(session).await {
                tracing::warn!("⚠️ Could not stop directory session after failed login: {}", stop_error);
            }
            return Err(e);
        }
        Ok(session)
    }
}

#[async_trait]
pub trait DmpPlatform: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<PlatformUser>>;
    /// Creates and activates a user, returning its uuid.
    async fn create_user(&self, user: &NewPlatformUser) -> Result<String>;
    async fn activate_user(&self, user: &PlatformUser) -> Result<()>;
    async fn create_questionnaire(&self, questionnaire: &NewQuestionnaire) -> Result<String>;
    async fn set_content(&self, questionnaire_uuid: &str, events: &[ContentEvent]) -> Result<()>;
    async fn set_sharing(&self, questionnaire_uuid: &str, owner_uuid: &str) -> Result<()>;
    fn dmp_url(&self, questionnaire_uuid: &str) -> String;
}

#[async_trait]
pub trait ResearchInfoSystem: Send + Sync {
    async fn project_exists(&self, grant_id: &str, funder_id: &str) -> Result<bool>;
    async fn resolve_person(&self, email: &str) -> Result<Option<String>>;
    async fn resolve_home_organization(&self, person_id: &str, year: i32) -> Result<String>;
    async fn create_project(&self, project: &ResearchProjectRecord) -> Result<i64>;
    fn project_url(&self, project_id: i64) -> String;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<()>;
}
