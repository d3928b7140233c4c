//! CLI argument definitions for the roster sync tool.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use colorchoice_clap::Color;
use roster_report::{DEFAULT_SMTP_HOST, DEFAULT_SMTP_PORT};
use tracing::level_filters::LevelFilter;

use crate::logging::LogFormat;

#[derive(Parser)]
#[command(
    name = "roster-sync",
    version,
    about = "Keep a school-management roster in line with the student-information system",
    long_about = "Reconcile students, teachers, parents, year groups and class enrollments\n\
                  from the source student-information system into the destination\n\
                  school-management platform. The source is always authoritative."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for warnings only).
    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run one reconciliation.
    Sync(Box<SyncArgs>),

    /// Print the effective deployment configuration as TOML.
    Config {
        /// Deployment file to merge over the built-in defaults.
        #[arg(long = "config", value_name = "PATH")]
        config: Option<PathBuf>,
    },
}

#[derive(Args)]
pub struct SyncArgs {
    /// Date the run acts on (default: today).
    #[arg(long = "date", value_name = "YYYY-MM-DD")]
    pub date: Option<NaiveDate>,

    /// Suffix appended to the export file names.
    #[arg(long = "postfix", default_value = "", hide = true)]
    pub postfix: String,

    /// Reconcile every parent-child link (one listing call per parent).
    #[arg(long = "associate-relationships", overrides_with = "skip_associations")]
    pub associate_relationships: bool,

    /// Only link parents created in this run.
    #[arg(long = "skip-associations", overrides_with = "associate_relationships")]
    pub skip_associations: bool,

    /// Keep profile fields of existing students in sync.
    #[arg(long = "update-profile", overrides_with = "skip_profile")]
    pub update_profile: bool,

    /// Leave profile fields of existing students alone.
    #[arg(long = "skip-profile", overrides_with = "update_profile")]
    pub skip_profile: bool,

    /// Create and archive only; no enrollment, class removal or field update.
    #[arg(long = "provision-only")]
    pub provision_only: bool,

    /// Decide and report every operation without sending any.
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Deployment file (query names, field mapping, default flags).
    #[arg(long = "config", value_name = "PATH", env = "ROSTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory for the CSV exports.
    #[arg(long = "output-dir", value_name = "DIR", default_value = "output")]
    pub output_dir: PathBuf,

    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub destination: DestinationArgs,

    #[command(flatten)]
    pub mail: MailArgs,
}

#[derive(Args)]
pub struct SourceArgs {
    /// Source API root.
    #[arg(id = "source_url", long = "source-url", value_name = "URL", env = "SOURCE_URL")]
    pub url: String,

    /// Source OAuth root (token endpoint `oauth/access_token`).
    #[arg(long = "source-oauth-url", value_name = "URL", env = "SOURCE_OAUTH_URL")]
    pub oauth_url: String,

    #[arg(long = "client-id", env = "SOURCE_CLIENT_ID", hide_env_values = true)]
    pub client_id: String,

    #[arg(long = "client-secret", env = "SOURCE_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: String,
}

#[derive(Args)]
pub struct DestinationArgs {
    /// Destination API root.
    #[arg(id = "destination_url", long = "destination-url", value_name = "URL", env = "DESTINATION_URL")]
    pub url: String,

    #[arg(long = "destination-token", env = "DESTINATION_TOKEN", hide_env_values = true)]
    pub token: String,
}

#[derive(Args)]
pub struct MailArgs {
    /// Notification recipient (repeatable). Without one, the summary is printed.
    #[arg(long = "to", value_name = "ADDRESS")]
    pub to: Vec<String>,

    /// Sender account, also used to authenticate.
    #[arg(long = "smtp-user", env = "SMTP_USER", default_value = "")]
    pub smtp_user: String,

    #[arg(long = "smtp-password", env = "SMTP_PASSWORD", hide_env_values = true)]
    pub smtp_password: Option<String>,

    #[arg(long = "smtp-host", env = "SMTP_HOST", default_value = DEFAULT_SMTP_HOST)]
    pub smtp_host: String,

    #[arg(long = "smtp-port", env = "SMTP_PORT", default_value_t = DEFAULT_SMTP_PORT)]
    pub smtp_port: u16,
}

impl SyncArgs {
    pub fn associations(&self) -> Option<bool> {
        flag_pair(self.associate_relationships, self.skip_associations)
    }

    pub fn profiles(&self) -> Option<bool> {
        flag_pair(self.update_profile, self.skip_profile)
    }

    /// Checks clap cannot express; run before any I/O.
    pub fn validate(&self) -> Result<(), String> {
        if !self.mail.to.is_empty() {
            if self.mail.smtp_password.as_deref().is_none_or(str::is_empty) {
                return Err("--to requires --smtp-password (or SMTP_PASSWORD)".to_string());
            }
            if self.mail.smtp_user.is_empty() {
                return Err("--to requires --smtp-user (or SMTP_USER)".to_string());
            }
        }
        Ok(())
    }
}

fn flag_pair(enable: bool, disable: bool) -> Option<bool> {
    match (enable, disable) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

impl From<LogLevelArg> for LevelFilter {
    fn from(level: LogLevelArg) -> Self {
        match level {
            LogLevelArg::Error => Self::ERROR,
            LogLevelArg::Warn => Self::WARN,
            LogLevelArg::Info => Self::INFO,
            LogLevelArg::Debug => Self::DEBUG,
            LogLevelArg::Trace => Self::TRACE,
        }
    }
}

impl From<LogFormatArg> for LogFormat {
    fn from(format: LogFormatArg) -> Self {
        match format {
            LogFormatArg::Pretty => Self::Pretty,
            LogFormatArg::Compact => Self::Compact,
            LogFormatArg::Json => Self::Json,
        }
    }
}
