use crate::domain::model::Notification;
use crate::utils::error::{ImportError, Result};
use regex::Regex;
use std::path::Path;

/// Per-funder HTML email with `{name}` placeholders.
#[derive(Debug, Clone)]
pub struct EmailTemplate {
    subject: String,
    html: String,
    placeholders: Regex,
}

pub struct TemplateValues<'a> {
    pub recipient_name: &'a str,
    pub project_id: &'a str,
    pub dmp_title: &'a str,
    pub dmp_url: &'a str,
    pub cris_url: &'a str,
}

impl EmailTemplate {
    pub fn new(subject: impl Into<String>, html: impl Into<String>) -> Result<Self> {
        let placeholders =
            Regex::new(r"\{(recipient_name|project_id|dmp_title|dmp_url|cris_url)\}").map_err(
                |e| ImportError::EmailError {
                    message: format!("invalid placeholder pattern: {}", e),
                },
            )?;
        Ok(Self {
            subject: subject.into(),
            html: html.into(),
            placeholders,
        })
    }

    pub fn load<P: AsRef<Path>>(path: P, subject: impl Into<String>) -> Result<Self> {
        let html = std::fs::read_to_string(&path).map_err(|e| ImportError::EmailError {
            message: format!("cannot read template {}: {}", path.as_ref().display(), e),
        })?;
        Self::new(subject, html)
    }

    /// 只替換已知的佔位符，其餘大括號（例如 CSS）保持原樣
    pub fn render(&self, values: &TemplateValues<'_>) -> String {
        self.placeholders
            .replace_all(&self.html, |caps: &regex::Captures| match &caps[1] {
                "recipient_name" => values.recipient_name.to_string(),
                "project_id" => values.project_id.to_string(),
                "dmp_title" => values.dmp_title.to_string(),
                "dmp_url" => values.dmp_url.to_string(),
                _ => values.cris_url.to_string(),
            })
            .into_owned()
    }

    pub fn notification(&self, recipient: &str, values: &TemplateValues<'_>) -> Notification {
        Notification {
            recipient: recipient.to_string(),
            recipient_name: values.recipient_name.to_string(),
            subject: self.subject.clone(),
            html_body: self.render(values),
        }
    }
}
