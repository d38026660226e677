use crate::app::RunOptions;
use crate::config::DEFAULT_CONFIG_FILE;
use crate::domain::model::Funder;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum YesNo {
    #[value(name = "y", alias = "yes")]
    Yes,
    #[value(name = "n", alias = "no")]
    No,
}

impl YesNo {
    pub fn is_yes(self) -> bool {
        self == YesNo::Yes
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "create-dmp")]
#[command(about = "Create DMPs and research project records from a tab separated grant list")]
pub struct CliArgs {
    /// Tab separated input file: grant id, "Last First" name, email [, ORCID [, funder]]
    #[arg(short = 'i', long = "infile")]
    pub infile: PathBuf,

    /// Funder of the grants in the input file
    #[arg(short = 'f', long = "funder", value_enum)]
    pub funder: Funder,

    /// Create research project records in CRIS
    #[arg(short = 'u', long = "updateCRIS", value_enum, default_value = "n")]
    pub update_cris: YesNo,

    /// Send a notification email to each researcher
    #[arg(short = 'e', long = "sendEmails", value_enum, default_value = "n")]
    pub send_emails: YesNo,

    /// Enable verbose output
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Path to the configuration file
    #[arg(short = 'c', long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,
}

impl CliArgs {
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            infile: self.infile.clone(),
            funder: self.funder,
            update_cris: self.update_cris.is_yes(),
            send_emails: self.send_emails.is_yes(),
        }
    }
}
