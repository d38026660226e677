use crate::domain::model::LogEntry;
use crate::utils::error::Result;
use chrono::{DateTime, Local};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Append-only, tab separated outcome log; one line per processed row.
pub struct RunLog {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl RunLog {
    /// 在目錄中建立以時間命名的 log 檔
    pub fn create<P: AsRef<Path>>(directory: P, started: DateTime<Local>) -> Result<Self> {
        let directory = directory.as_ref();
        std::fs::create_dir_all(directory)?;
        let path = directory.join(format!("create-dmp_{}.log", started.format("%Y%m%d_%H%M%S")));
        Self::open(path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .quote_style(csv::QuoteStyle::Never)
            .flexible(true)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(file);

        tracing::debug!("Run log: {}", path.display());
        Ok(Self { path, writer })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&mut self, entry: &LogEntry) -> Result<()> {
        let research_project_id = entry.research_project_id.to_string();
        self.write(&[
            entry.timestamp.as_str(),
            entry.grant_id.as_str(),
            entry.title.as_str(),
            entry.person_name.as_str(),
            entry.email.as_str(),
            entry.dmp_url.as_str(),
            research_project_id.as_str(),
            entry.research_project_url.as_str(),
            entry.status.as_str(),
        ])
    }

    pub fn append_fatal(&mut self, timestamp: &str, message: &str) -> Result<()> {
        self.write(&[timestamp, "FATAL", message])
    }

    fn write(&mut self, fields: &[&str]) -> Result<()> {
        self.writer.write_record(fields.iter().map(|field| sanitize(field)))?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Tabs and line breaks would break the one-line-per-row format.
fn sanitize(field: &str) -> String {
    field
        .chars()
        .map(|c| if matches!(c, '\t' | '\n' | '\r') { ' ' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn entry(title: &str) -> LogEntry {
        LogEntry {
            timestamp: "2024-05-02T10:00:00.000000".to_string(),
            grant_id: "2021-05377".to_string(),
            title: title.to_string(),
            person_name: "Louise Olsson".to_string(),
            email: "louise.olsson@chalmers.se".to_string(),
            dmp_url: "https://dsw.example.org/wizard/projects/dmp-1".to_string(),
            research_project_id: 0,
            research_project_url: String::new(),
            status: "completed".to_string(),
        }
    }

    #[test]
    fn test_create_uses_timestamped_name() {
        let dir = TempDir::new().unwrap();
        let started = Local.with_ymd_and_hms(2024, 5, 2, 10, 11, 12).unwrap();

        let log = RunLog::create(dir.path().join("logs"), started).unwrap();

        assert!(log.path().ends_with("logs/create-dmp_20240502_101112.log"));
        assert!(log.path().exists());
    }

    #[test]
    fn test_append_writes_one_tab_separated_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("run.log");
        let mut log = RunLog::open(&path).unwrap();

        log.append(&entry("Yeast\tcell\nfactories")).unwrap();
        log.append_fatal("2024-05-02T10:00:01.000000", "Could not create DMP").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let columns: Vec<&str> = lines[0].split('\t').collect();
        assert_eq!(columns.len(), 9);
        assert_eq!(columns[2], "Yeast cell factories");
        assert_eq!(columns[6], "0");
        assert_eq!(columns[7], "");
        assert_eq!(lines[1], "2024-05-02T10:00:01.000000\tFATAL\tCould not create DMP");
    }

    #[test]
    fn test_open_appends_to_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("run.log");
        RunLog::open(&path).unwrap().append(&entry("First")).unwrap();
        RunLog::open(&path).unwrap().append(&entry("Second")).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }
}
