use crate::config::QuestionnaireConfig;
use crate::core::content::{build_content_events, ContentFields};
use crate::core::notification::TemplateValues;
use crate::core::strategy::{FunderStrategies, FunderStrategy};
use crate::domain::model::{
    Contact, ContractInfo, InputRow, NewPlatformUser, NewQuestionnaire, PersonInfo,
    ProjectMetadata, ResearchProjectRecord, RowOutcome,
};
use crate::domain::ports::{
    DirectorySession, DmpPlatform, Notifier, PersonDirectory, ResearchInfoSystem,
};
use crate::utils::error::{ImportError, Result};

pub fn timestamp_now() -> String {
    chrono::Local::now()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

struct ResearchTarget<'a> {
    system: &'a dyn ResearchInfoSystem,
    year: i32,
}

/// Runs the fixed per-row sequence:
/// metadata → user → DMP container → content → sharing → CRIS record → email.
///
/// Only a failed DMP container creation is returned as `Err`; every other
/// failure is recorded on the [`RowOutcome`].
pub struct RowProcessor<'a> {
    platform: &'a dyn DmpPlatform,
    directory: &'a dyn PersonDirectory,
    session: &'a DirectorySession,
    funders: &'a FunderStrategies,
    questionnaire: &'a QuestionnaireConfig,
    research: Option<ResearchTarget<'a>>,
    notifier: Option<&'a dyn Notifier>,
}

impl<'a> RowProcessor<'a> {
    pub fn new(
        platform: &'a dyn DmpPlatform,
        directory: &'a dyn PersonDirectory,
        session: &'a DirectorySession,
        funders: &'a FunderStrategies,
        questionnaire: &'a QuestionnaireConfig,
    ) -> Self {
        Self {
            platform,
            directory,
            session,
            funders,
            questionnaire,
            research: None,
            notifier: None,
        }
    }

    pub fn with_research(mut self, system: &'a dyn ResearchInfoSystem, year: i32) -> Self {
        self.research = Some(ResearchTarget { system, year });
        self
    }

    pub fn with_notifier(mut self, notifier: &'a dyn Notifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub async fn process(&self, row: &InputRow) -> Result<RowOutcome> {
        let strategy = self.funders.for_row(row.funder)?;
        let mut outcome = RowOutcome::new(row, timestamp_now());

        // 1. 取得專案資料
        let metadata = match strategy.registry.fetch(&row.grant_id).await {
            Ok(Some(metadata)) => metadata,
            Ok(None) => {
                tracing::warn!(
                    "⏭️ No data for {} in {}, skipping",
                    row.grant_id,
                    strategy.registry.source_name()
                );
                return Ok(outcome.skip(format!(
                    "no data in {}",
                    strategy.registry.source_name()
                )));
            }
            Err(e) => {
                tracing::warn!("⏭️ Registry lookup for {} failed: {}", row.grant_id, e);
                return Ok(outcome.skip(format!("registry lookup failed: {}", e)));
            }
        };
        tracing::info!("📡 Got data for {}: {}", row.grant_id, metadata.title_en);
        outcome.entry.title = metadata.title_en.clone();

        // 2. 解析聯絡人並取得/建立平台使用者
        let contact = self.resolve_contact(row).await;
        outcome.entry.email = contact.email.clone();

        let user_uuid = match self.resolve_or_create_user(row, &contact).await {
            Ok(uuid) => uuid,
            Err(e) => {
                tracing::error!("❌ Could not resolve platform user {}: {}", contact.email, e);
                return Ok(outcome.skip(format!("platform user failed: {}", e)));
            }
        };

        // 3. 建立 DMP（失敗即中止整個批次）
        tracing::info!("📝 Creating DMP '{}'", metadata.title_en);
        let dmp_uuid = self
            .platform
            .create_questionnaire(&NewQuestionnaire {
                name: metadata.title_en.clone(),
                question_tag_uuids: self.questionnaire.question_tag_uuids.clone(),
                format_uuid: self.questionnaire.format_uuid.clone(),
            })
            .await
            .map_err(|e| ImportError::DmpCreationError {
                title: metadata.title_en.clone(),
                source: Box::new(e),
            })?;
        let dmp_url = self.platform.dmp_url(&dmp_uuid);
        outcome.entry.dmp_url = dmp_url.clone();
        tracing::info!("✅ DMP {} created", dmp_uuid);

        // 4. 填入內容
        let events = build_content_events(
            self.questionnaire,
            &ContentFields {
                row,
                contact: &contact,
                metadata: &metadata,
                funder: &strategy.profile,
            },
        );
        if let Err(e) = self.platform.set_content(&dmp_uuid, &events).await {
            tracing::error!("❌ Could not add content to DMP {}: {}", dmp_uuid, e);
            return Ok(outcome.abandon(format!("content update failed: {}", e)));
        }
        tracing::debug!("DMP {} updated with {} events", dmp_uuid, events.len());

        // 5. 轉移擁有權
        if let Err(e) = self.platform.set_sharing(&dmp_uuid, &user_uuid).await {
            tracing::error!("❌ Could not change owner of DMP {}: {}", dmp_uuid, e);
            return Ok(outcome.abandon(format!("ownership transfer failed: {}", e)));
        }
        tracing::info!("👤 DMP {} now owned by {}", dmp_uuid, user_uuid);

        // 6. CRIS 專案（可選）
        if let Some(target) = &self.research {
            match self
                .create_research_project(target, row, strategy, &metadata, &contact, &dmp_url)
                .await
            {
                Ok(project_id) => {
                    outcome.entry.research_project_id = project_id;
                    outcome.entry.research_project_url = target.system.project_url(project_id);
                    outcome.research_project_created = true;
                    tracing::info!("🏛️ CRIS project {} created for {}", project_id, row.grant_id);
                }
                Err(note) => {
                    tracing::warn!("⚠️ {}: {}", row.grant_id, note);
                    outcome.issue(note);
                }
            }
        }

        // 7. 通知信（可選；範本於啟動時即已載入）
        if let (Some(notifier), Some(template)) = (self.notifier, &strategy.email) {
            let notification = template.notification(
                &contact.email,
                &TemplateValues {
                    recipient_name: &row.display_name(),
                    project_id: &row.grant_id,
                    dmp_title: &metadata.title_en,
                    dmp_url: &dmp_url,
                    cris_url: &outcome.entry.research_project_url,
                },
            );
            match notifier.send(&notification).await {
                Ok(()) => {
                    outcome.email_sent = true;
                    tracing::info!("📧 Email sent to {}", contact.email);
                }
                Err(e) => {
                    tracing::warn!("⚠️ Failed to send email to {}: {}", contact.email, e);
                    outcome.issue(format!("email failed: {}", e));
                }
            }
        }

        Ok(outcome.finish())
    }

    async fn resolve_contact(&self, row: &InputRow) -> Contact {
        let fallback = || Contact {
            email: row.email.clone(),
            identifier: None,
        };

        match self.directory.lookup(self.session, &row.email).await {
            Ok(Some(contact)) => {
                tracing::debug!(
                    "Directory resolved {} to {} ({:?})",
                    row.email,
                    contact.email,
                    contact.identifier
                );
                contact
            }
            Ok(None) => {
                tracing::debug!("{} not found in directory, using input email", row.email);
                fallback()
            }
            Err(e) => {
                tracing::warn!("⚠️ Directory lookup for {} failed, using input email: {}", row.email, e);
                fallback()
            }
        }
    }

    async fn resolve_or_create_user(&self, row: &InputRow, contact: &Contact) -> Result<String> {
        if let Some(user) = self.platform.find_user_by_email(&contact.email).await? {
            tracing::info!("👤 User {} exists: {}", contact.email, user.uuid);
            if !user.active {
                tracing::info!("👤 User {} is inactive, activating", user.uuid);
                self.platform.activate_user(&user).await?;
            }
            return Ok(user.uuid);
        }

        tracing::info!("👤 User {} does not exist, creating", contact.email);
        let uuid = self
            .platform
            .create_user(&NewPlatformUser {
                email: contact.email.clone(),
                first_name: row.first_name(),
                last_name: row.last_name().to_string(),
            })
            .await?;
        tracing::info!("👤 User {} created and activated: {}", contact.email, uuid);
        Ok(uuid)
    }

    /// Returns the new CRIS project id, or a note explaining why none was created.
    async fn create_research_project(
        &self,
        target: &ResearchTarget<'_>,
        row: &InputRow,
        strategy: &FunderStrategy,
        metadata: &ProjectMetadata,
        contact: &Contact,
        dmp_url: &str,
    ) -> std::result::Result<i64, String> {
        let system = target.system;
        let funder_id = &strategy.profile.cris_funder_id;

        match system.project_exists(&row.grant_id, funder_id).await {
            Ok(false) => {}
            Ok(true) => {
                return Err("project already exists in CRIS, add DMP manually".to_string())
            }
            Err(e) => return Err(format!("CRIS project search failed: {}", e)),
        }

        let person_id = match system.resolve_person(&contact.email).await {
            Ok(Some(id)) => id,
            Ok(None) => return Err(format!("person {} not found in CRIS", contact.email)),
            Err(e) => return Err(format!("CRIS person lookup failed: {}", e)),
        };

        let organization_id = system
            .resolve_home_organization(&person_id, target.year)
            .await
            .map_err(|e| format!("CRIS organization lookup failed: {}", e))?;

        let record = ResearchProjectRecord::new(
            metadata,
            strategy.registry.source_name(),
            ContractInfo {
                grant_id: row.grant_id.clone(),
                funder_cris_id: funder_id.clone(),
                start_date: metadata.start_date.clone(),
                end_date: metadata.end_date.clone(),
                dmp_url: dmp_url.to_string(),
            },
            PersonInfo {
                person_id,
                organization_id,
            },
        );

        system
            .create_project(&record)
            .await
            .map_err(|e| format!("CRIS project creation failed: {}", e))
    }
}
