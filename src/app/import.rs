use crate::adapters::{CrisClient, DswClient, FunderApiRegistry, PdbClient, SmtpMailer, SwecrisRegistry};
use crate::config::{AppConfig, FunderProfile, RegistryKind};
use crate::core::input::InputReader;
use crate::core::notification::EmailTemplate;
use crate::core::processor::timestamp_now;
use crate::core::strategy::{FunderStrategies, FunderStrategy};
use crate::core::{ImportEngine, RowProcessor, RunSummary};
use crate::domain::model::{Funder, InputRow};
use crate::domain::ports::{DirectorySession, GrantRegistry, PersonDirectory};
use crate::utils::error::{ImportError, Result};
use crate::utils::prompt::confirm;
use crate::utils::run_log::RunLog;
use chrono::Datelike;
use std::collections::BTreeSet;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

/// What the user asked for on the command line.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub infile: PathBuf,
    pub funder: Funder,
    pub update_cris: bool,
    pub send_emails: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunReport {
    Completed { summary: RunSummary, log_path: PathBuf },
    Declined { log_path: PathBuf },
}

impl RunReport {
    pub fn log_path(&self) -> &Path {
        match self {
            RunReport::Completed { log_path, .. } | RunReport::Declined { log_path } => log_path,
        }
    }
}

fn log_fatal(log: &mut RunLog, error: ImportError) -> ImportError {
    if let Err(log_error) = log.append_fatal(&timestamp_now(), &error.to_string()) {
        tracing::warn!("⚠️ Could not write to run log: {}", log_error);
    }
    error
}

/// Remote services opened before the first row is touched.
struct Services {
    dsw: DswClient,
    mailer: Option<SmtpMailer>,
    cris: Option<(CrisClient, i32)>,
}

pub struct ImportApp {
    config: AppConfig,
    options: RunOptions,
}

impl ImportApp {
    pub fn new(config: AppConfig, options: RunOptions) -> Self {
        Self { config, options }
    }

    /// Runs one whole import session; `input`/`output` carry the confirmation dialog.
    pub async fn run<R: BufRead, W: Write>(&self, input: R, mut output: W) -> Result<RunReport> {
        // 1. 讀取並驗證輸入檔（尚未連線任何服務）
        let rows = InputReader::new(self.config.email_domain()).read(&self.options.infile)?;
        tracing::info!("📂 {} rows read from {}", rows.len(), self.options.infile.display());

        // 2. 準備各 funder 的策略
        let strategies = self.build_strategies(&rows)?;

        // 3. 建立 run log
        let mut log = RunLog::create(self.config.log_directory(), chrono::Local::now())?;
        let log_path = log.path().to_path_buf();

        // 4. 連線服務
        let services = match self.connect().await {
            Ok(services) => services,
            Err(e) => return Err(log_fatal(&mut log, e)),
        };

        // 5. 開啟 directory session，之後每條路徑都要關閉
        let directory = PdbClient::new(&self.config.directory);
        let session = match directory.open().await {
            Ok(session) => session,
            Err(e) => return Err(log_fatal(&mut log, e)),
        };

        let result = self
            .confirm_and_process(
                &rows,
                &strategies,
                &services,
                &directory,
                &session,
                &mut log,
                input,
                &mut output,
            )
            .await;

        if let Err(e) = directory.stop(session).await {
            tracing::warn!("⚠️ Could not stop directory session: {}", e);
        }

        let report = match result? {
            Some(summary) => {
                writeln!(output, "✅ {}", summary)?;
                writeln!(output, "📁 Run log: {}", log_path.display())?;
                RunReport::Completed { summary, log_path }
            }
            None => {
                writeln!(output, "Aborted, nothing was created.")?;
                RunReport::Declined { log_path }
            }
        };
        Ok(report)
    }

    async fn connect(&self) -> Result<Services> {
        let dsw = DswClient::authenticate(&self.config.dsw).await?;
        tracing::info!("✅ Authenticated with DSW");

        let mailer = if self.options.send_emails {
            let mailer = SmtpMailer::new(self.config.smtp()?)?;
            mailer.test_connection().await?;
            Some(mailer)
        } else {
            None
        };

        let cris = if self.options.update_cris {
            let cris_config = self.config.cris()?;
            let year = cris_config
                .year
                .unwrap_or_else(|| chrono::Local::now().year());
            Some((CrisClient::new(cris_config), year))
        } else {
            None
        };

        Ok(Services { dsw, mailer, cris })
    }

    #[allow(clippy::too_many_arguments)]
    async fn confirm_and_process<R: BufRead, W: Write>(
        &self,
        rows: &[InputRow],
        strategies: &FunderStrategies,
        services: &Services,
        directory: &PdbClient,
        session: &DirectorySession,
        log: &mut RunLog,
        input: R,
        output: &mut W,
    ) -> Result<Option<RunSummary>> {
        self.print_summary(rows, strategies, log.path(), output)?;
        if !confirm(input, &mut *output, "Continue?")? {
            tracing::info!("🛑 Run declined by user");
            return Ok(None);
        }

        let mut processor = RowProcessor::new(
            &services.dsw,
            directory,
            session,
            strategies,
            &self.config.questionnaire,
        );
        if let Some((cris, year)) = &services.cris {
            processor = processor.with_research(cris, *year);
        }
        if let Some(mailer) = &services.mailer {
            processor = processor.with_notifier(mailer);
        }

        let summary = ImportEngine::new(processor).run(rows, log).await?;
        Ok(Some(summary))
    }

    /// 只為實際用到的 funder 建立策略：-f 指定的以及輸入檔中出現的
    fn build_strategies(&self, rows: &[InputRow]) -> Result<FunderStrategies> {
        let funders: BTreeSet<Funder> = std::iter::once(self.options.funder)
            .chain(rows.iter().filter_map(|row| row.funder))
            .collect();

        let mut strategies = FunderStrategies::new(self.options.funder);
        for funder in funders {
            let profile = self.config.funder_profile(funder)?;
            let strategy = FunderStrategy {
                profile: profile.clone(),
                registry: self.registry_for(funder, profile)?,
                email: self.email_template_for(funder, profile)?,
            };
            strategies.insert(funder, strategy);
        }
        Ok(strategies)
    }

    fn registry_for(&self, funder: Funder, profile: &FunderProfile) -> Result<Box<dyn GrantRegistry>> {
        match profile.registry {
            RegistryKind::Swecris => {
                let suffix =
                    profile
                        .swecris_suffix
                        .as_deref()
                        .ok_or_else(|| ImportError::MissingConfigError {
                            field: format!("funders.{}.swecris_suffix", funder),
                        })?;
                Ok(Box::new(SwecrisRegistry::new(self.config.swecris()?, suffix)))
            }
            RegistryKind::FunderApi => {
                Ok(Box::new(FunderApiRegistry::new(self.config.funder_api()?)))
            }
        }
    }

    fn email_template_for(
        &self,
        funder: Funder,
        profile: &FunderProfile,
    ) -> Result<Option<EmailTemplate>> {
        if !self.options.send_emails {
            return Ok(None);
        }

        let path = profile
            .email_template
            .as_deref()
            .ok_or_else(|| ImportError::MissingConfigError {
                field: format!("funders.{}.email_template", funder),
            })?;
        let subject = profile
            .email_subject
            .clone()
            .unwrap_or_else(|| format!("Data management plan for your {} grant", profile.name));
        EmailTemplate::load(path, subject).map(Some)
    }

    fn print_summary<W: Write>(
        &self,
        rows: &[InputRow],
        strategies: &FunderStrategies,
        log_path: &Path,
        output: &mut W,
    ) -> Result<()> {
        let yes_no = |flag: bool| if flag { "yes" } else { "no" };
        let default_funder = strategies.for_row(None)?;

        writeln!(output, "📋 Import summary:")?;
        writeln!(output, "  Input file: {}", self.options.infile.display())?;
        writeln!(output, "  Rows: {}", rows.len())?;
        writeln!(
            output,
            "  Funder: {} ({}), data from {}",
            default_funder.profile.name,
            strategies.default_funder(),
            default_funder.registry.source_name()
        )?;
        let overridden = rows.iter().filter(|row| row.funder.is_some()).count();
        if overridden > 0 {
            writeln!(output, "  Rows with their own funder: {}", overridden)?;
        }
        writeln!(output, "  DMP platform: {} as {}", self.config.dsw.url, self.config.dsw.user)?;
        writeln!(output, "  Update CRIS: {}", yes_no(self.options.update_cris))?;
        writeln!(output, "  Send emails: {}", yes_no(self.options.send_emails))?;
        writeln!(output, "  Run log: {}", log_path.display())?;
        writeln!(output)?;
        Ok(())
    }
}
