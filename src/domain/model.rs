use serde::{Deserialize, Serialize};
use std::fmt;

/// 支援的資助機構
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum Funder {
    Vr,
    Formas,
    Forte,
    Vinnova,
}

impl Funder {
    pub const ALL: [Funder; 4] = [Funder::Vr, Funder::Formas, Funder::Forte, Funder::Vinnova];

    pub fn key(&self) -> &'static str {
        match self {
            Funder::Vr => "vr",
            Funder::Formas => "formas",
            Funder::Forte => "forte",
            Funder::Vinnova => "vinnova",
        }
    }

    pub fn parse(value: &str) -> Option<Funder> {
        let value = value.trim();
        Funder::ALL
            .into_iter()
            .find(|funder| funder.key().eq_ignore_ascii_case(value))
    }
}

impl fmt::Display for Funder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One line of the tab separated input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRow {
    pub line: usize,
    pub grant_id: String,
    /// Inverted name, "Last First".
    pub person_name: String,
    pub email: String,
    pub orcid: Option<String>,
    pub funder: Option<Funder>,
}

impl InputRow {
    pub fn last_name(&self) -> &str {
        self.person_name.split_whitespace().next().unwrap_or("")
    }

    pub fn first_name(&self) -> String {
        self.person_name
            .split_whitespace()
            .skip(1)
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn display_name(&self) -> String {
        let first = self.first_name();
        if first.is_empty() {
            self.last_name().to_string()
        } else {
            format!("{} {}", first, self.last_name())
        }
    }
}

/// 截取日期的前 10 個字元 (YYYY-MM-DD)
pub fn normalize_date(value: &str) -> String {
    value.trim().chars().take(10).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProjectMetadata {
    pub title_en: String,
    pub title_sv: String,
    pub description_en: String,
    pub description_sv: String,
    pub start_date: String,
    pub end_date: String,
}

impl ProjectMetadata {
    pub fn new(
        title_en: impl Into<String>,
        title_sv: impl Into<String>,
        description_en: impl Into<String>,
        description_sv: impl Into<String>,
        start_date: &str,
        end_date: &str,
    ) -> Self {
        Self {
            title_en: title_en.into(),
            title_sv: title_sv.into(),
            description_en: description_en.into(),
            description_sv: description_sv.into(),
            start_date: normalize_date(start_date),
            end_date: normalize_date(end_date),
        }
    }
}

/// Result of a directory lookup; falls back to the input email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub email: String,
    pub identifier: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformUser {
    pub uuid: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPlatformUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuestionnaire {
    pub name: String,
    pub question_tag_uuids: Vec<String>,
    pub format_uuid: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractInfo {
    pub grant_id: String,
    pub funder_cris_id: String,
    pub start_date: String,
    pub end_date: String,
    pub dmp_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonInfo {
    pub person_id: String,
    pub organization_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResearchProjectRecord {
    pub title_en: String,
    pub title_sv: String,
    pub description_en: String,
    pub description_sv: String,
    pub start_date: String,
    pub end_date: String,
    pub source: String,
    pub contracts: Vec<ContractInfo>,
    pub persons: Vec<PersonInfo>,
}

impl ResearchProjectRecord {
    pub fn new(
        metadata: &ProjectMetadata,
        source: impl Into<String>,
        contract: ContractInfo,
        person: PersonInfo,
    ) -> Self {
        Self {
            title_en: metadata.title_en.clone(),
            title_sv: metadata.title_sv.clone(),
            description_en: metadata.description_en.clone(),
            description_sv: metadata.description_sv.clone(),
            start_date: metadata.start_date.clone(),
            end_date: metadata.end_date.clone(),
            source: source.into(),
            contracts: vec![contract],
            persons: vec![person],
        }
    }

    pub fn description_en_html(&self) -> String {
        format!("<p>{}</p>", self.description_en)
    }

    pub fn description_sv_html(&self) -> String {
        format!("<p>{}</p>", self.description_sv)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub recipient: String,
    pub recipient_name: String,
    pub subject: String,
    pub html_body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStatus {
    Completed,
    Skipped,
    Incomplete,
}

impl RowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RowStatus::Completed => "completed",
            RowStatus::Skipped => "skipped",
            RowStatus::Incomplete => "incomplete",
        }
    }
}

/// One line of the run log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: String,
    pub grant_id: String,
    pub title: String,
    pub person_name: String,
    pub email: String,
    pub dmp_url: String,
    pub research_project_id: i64,
    pub research_project_url: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowOutcome {
    pub status: RowStatus,
    pub issues: usize,
    pub notes: Vec<String>,
    pub entry: LogEntry,
    pub research_project_created: bool,
    pub email_sent: bool,
}

impl RowOutcome {
    pub fn new(row: &InputRow, timestamp: String) -> Self {
        Self {
            status: RowStatus::Completed,
            issues: 0,
            notes: Vec::new(),
            entry: LogEntry {
                timestamp,
                grant_id: row.grant_id.clone(),
                title: String::new(),
                person_name: row.display_name(),
                email: row.email.clone(),
                dmp_url: String::new(),
                research_project_id: 0,
                research_project_url: String::new(),
                status: String::new(),
            },
            research_project_created: false,
            email_sent: false,
        }
    }

    pub fn issue(&mut self, note: impl Into<String>) {
        self.issues += 1;
        self.notes.push(note.into());
    }

    pub fn skip(mut self, note: impl Into<String>) -> Self {
        self.status = RowStatus::Skipped;
        self.issue(note);
        self.finish()
    }

    pub fn abandon(mut self, note: impl Into<String>) -> Self {
        self.status = RowStatus::Incomplete;
        self.issue(note);
        self.finish()
    }

    /// 將狀態與備註寫入 log entry
    pub fn finish(mut self) -> Self {
        self.entry.status = if self.notes.is_empty() {
            self.status.as_str().to_string()
        } else {
            format!("{}: {}", self.status.as_str(), self.notes.join("; "))
        };
        self
    }
}
