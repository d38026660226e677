use crate::core::processor::{timestamp_now, RowProcessor};
use crate::domain::model::{InputRow, RowOutcome, RowStatus};
use crate::utils::error::Result;
use crate::utils::run_log::RunLog;
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
    pub completed: usize,
    pub skipped: usize,
    pub incomplete: usize,
    pub issues: usize,
    pub research_projects_created: usize,
    pub emails_sent: usize,
}

impl RunSummary {
    pub fn record(&mut self, outcome: &RowOutcome) {
        self.processed += 1;
        match outcome.status {
            RowStatus::Completed => self.completed += 1,
            RowStatus::Skipped => self.skipped += 1,
            RowStatus::Incomplete => self.incomplete += 1,
        }
        self.issues += outcome.issues;
        self.research_projects_created += usize::from(outcome.research_project_created);
        self.emails_sent += usize::from(outcome.email_sent);
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} processed, {} completed, {} skipped, {} incomplete, {} issues, \
             {} research records created, {} emails sent",
            self.processed,
            self.completed,
            self.skipped,
            self.incomplete,
            self.issues,
            self.research_projects_created,
            self.emails_sent
        )
    }
}

/// Drives the row processor over all rows in file order, one at a time.
pub struct ImportEngine<'a> {
    processor: RowProcessor<'a>,
}

impl<'a> ImportEngine<'a> {
    pub fn new(processor: RowProcessor<'a>) -> Self {
        Self { processor }
    }

    pub async fn run(&self, rows: &[InputRow], log: &mut RunLog) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        println!("Processing {} rows...", rows.len());

        for (index, row) in rows.iter().enumerate() {
            println!(
                "[{}/{}] {} {} <{}>",
                index + 1,
                rows.len(),
                row.grant_id,
                row.display_name(),
                row.email
            );

            let outcome = match self.processor.process(row).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!("❌ Aborting run at line {}: {}", row.line, e);
                    if let Err(log_error) = log.append_fatal(&timestamp_now(), &e.to_string()) {
                        tracing::warn!("⚠️ Could not write to run log: {}", log_error);
                    }
                    return Err(e);
                }
            };

            log.append(&outcome.entry)?;
            println!("  → {}", outcome.entry.status);
            summary.record(&outcome);
        }

        tracing::info!("📊 {}", summary);
        Ok(summary)
    }
}
