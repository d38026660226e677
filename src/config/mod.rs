#[cfg(feature = "cli")]
pub mod cli;

use crate::domain::events::PhasesAnsweredIndication;
use crate::domain::model::Funder;
use crate::utils::error::{ImportError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_required_field, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "create-dmp.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub dsw: DswConfig,
    pub swecris: Option<SwecrisConfig>,
    pub funder_api: Option<FunderApiConfig>,
    pub directory: DirectoryConfig,
    pub cris: Option<CrisConfig>,
    pub smtp: Option<SmtpConfig>,
    pub input: Option<InputConfig>,
    pub log: Option<LogConfig>,
    pub questionnaire: QuestionnaireConfig,
    #[serde(default)]
    pub funders: BTreeMap<Funder, FunderProfile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DswConfig {
    pub url: String,
    pub ui_url: String,
    pub user: String,
    pub password: String,
    pub package_id: String,
    pub template_id: String,
    #[serde(default = "default_affiliation")]
    pub affiliation: String,
}

fn default_affiliation() -> String {
    "Chalmers".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwecrisConfig {
    pub url: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunderApiConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    pub url: String,
    pub user: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrisConfig {
    pub api_url: String,
    pub person_url: String,
    pub ui_url: String,
    pub year: Option<i32>,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub server: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
    pub sender: String,
}

fn default_smtp_port() -> u16 {
    587
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub email_domain: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub directory: String,
}

/// Answer paths and fixed choices of the DMP questionnaire template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionnaireConfig {
    pub question_tag_uuids: Vec<String>,
    pub format_uuid: String,
    pub phase_uuid: String,
    pub start_path: String,
    pub contributor_uuid: String,
    pub name_path: String,
    pub email_path: String,
    pub orcid_path: String,
    pub affiliation_path: String,
    pub affiliation_choice: String,
    pub role_path: String,
    pub role_choice: String,
    pub project_path: String,
    pub project_item_uuid: String,
    pub project_name_path: String,
    pub project_description_path: String,
    pub project_start_path: String,
    pub project_end_path: String,
    pub funding_path: String,
    pub funding_item_uuid: String,
    pub funder_path: String,
    pub status_path: String,
    pub status_choice_granted: String,
    pub grant_id_path: String,
    #[serde(default = "default_answered")]
    pub answered_questions: u32,
    #[serde(default = "default_unanswered")]
    pub unanswered_questions: u32,
}

fn default_answered() -> u32 {
    7
}

fn default_unanswered() -> u32 {
    1
}

impl QuestionnaireConfig {
    pub fn phases_answered(&self) -> PhasesAnsweredIndication {
        PhasesAnsweredIndication::new(self.answered_questions, self.unanswered_questions)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryKind {
    Swecris,
    FunderApi,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunderProfile {
    pub name: String,
    pub dsw_funder_id: String,
    pub cris_funder_id: String,
    pub registry: RegistryKind,
    pub swecris_suffix: Option<String>,
    pub email_template: Option<String>,
    pub email_subject: Option<String>,
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| ImportError::ConfigError {
            message: format!("cannot read {}: {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Self::from_toml_str_with(content, |name| std::env::var(name).ok())
    }

    /// 以自訂的變數來源解析配置
    pub fn from_toml_str_with<F>(content: &str, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let processed_content = Self::substitute_env_vars(content, lookup)?;

        toml::from_str(&processed_content).map_err(|e| ImportError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DSW_PW})；註解行不處理，未設定的變數視為缺少配置
    fn substitute_env_vars<F>(content: &str, lookup: F) -> Result<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ImportError::ConfigError {
            message: e.to_string(),
        })?;

        let mut unresolved: Vec<String> = Vec::new();
        let mut result = String::with_capacity(content.len());
        for line in content.split_inclusive('\n') {
            if line.trim_start().starts_with('#') {
                result.push_str(line);
                continue;
            }
            let replaced = re.replace_all(line, |caps: &regex::Captures| {
                let var_name = &caps[1];
                lookup(var_name).unwrap_or_else(|| {
                    if !unresolved.iter().any(|name| name == var_name) {
                        unresolved.push(var_name.to_string());
                    }
                    String::new()
                })
            });
            result.push_str(&replaced);
        }

        if !unresolved.is_empty() {
            return Err(ImportError::MissingConfigError {
                field: unresolved.join(", "),
            });
        }
        Ok(result)
    }

    pub fn funder_profile(&self, funder: Funder) -> Result<&FunderProfile> {
        self.funders
            .get(&funder)
            .ok_or_else(|| ImportError::MissingConfigError {
                field: format!("funders.{}", funder),
            })
    }

    pub fn swecris(&self) -> Result<&SwecrisConfig> {
        validate_required_field("swecris", &self.swecris)
    }

    pub fn funder_api(&self) -> Result<&FunderApiConfig> {
        validate_required_field("funder_api", &self.funder_api)
    }

    pub fn cris(&self) -> Result<&CrisConfig> {
        validate_required_field("cris", &self.cris)
    }

    pub fn smtp(&self) -> Result<&SmtpConfig> {
        validate_required_field("smtp", &self.smtp)
    }

    pub fn email_domain(&self) -> Option<&str> {
        self.input.as_ref().and_then(|i| i.email_domain.as_deref())
    }

    pub fn log_directory(&self) -> PathBuf {
        PathBuf::from(
            self.log
                .as_ref()
                .map(|l| l.directory.as_str())
                .unwrap_or("logs"),
        )
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_url("dsw.url", &self.dsw.url)?;
        validate_url("dsw.ui_url", &self.dsw.ui_url)?;
        validate_non_empty_string("dsw.user", &self.dsw.user)?;
        validate_non_empty_string("dsw.package_id", &self.dsw.package_id)?;
        validate_non_empty_string("dsw.template_id", &self.dsw.template_id)?;
        validate_url("directory.url", &self.directory.url)?;

        if let Some(swecris) = &self.swecris {
            validate_url("swecris.url", &swecris.url)?;
        }
        if let Some(funder_api) = &self.funder_api {
            validate_url("funder_api.url", &funder_api.url)?;
        }
        if let Some(cris) = &self.cris {
            validate_url("cris.api_url", &cris.api_url)?;
            validate_url("cris.person_url", &cris.person_url)?;
            validate_url("cris.ui_url", &cris.ui_url)?;
        }
        if let Some(smtp) = &self.smtp {
            validate_non_empty_string("smtp.server", &smtp.server)?;
            validate_non_empty_string("smtp.sender", &smtp.sender)?;
        }
        if let Some(log) = &self.log {
            validate_path("log.directory", &log.directory)?;
        }

        for (funder, profile) in &self.funders {
            if profile.registry == RegistryKind::Swecris && profile.swecris_suffix.is_none() {
                return Err(ImportError::ConfigValidationError {
                    field: format!("funders.{}.swecris_suffix", funder),
                    message: "required when registry = \"swecris\"".to_string(),
                });
            }
            if let Some(template) = &profile.email_template {
                validate_path(&format!("funders.{}.email_template", funder), template)?;
            }
        }

        Ok(())
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
