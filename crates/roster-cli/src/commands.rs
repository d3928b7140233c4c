use std::path::Path;

use anyhow::Result;
use chrono::{Local, NaiveDate};
use tracing::{error, info, info_span, warn};

use roster_core::{SyncContext, SyncError, SyncOutcome, reconcile};
use roster_dest::{DestinationCredentials, DryRunDestination, HttpDestination};
use roster_ingest::{
    FlatTable, PowerSchoolClient, SnapshotLoader, SourceCredentials, SourceEntity, SourceSnapshot,
};
use roster_model::{LoadError, SyncOptions};
use roster_report::{RunReport, RunSummary, SmtpNotifier, SmtpSettings};

use crate::cli::SyncArgs;
use crate::config::{DeploymentConfig, RunDefaults};
use crate::types::SyncResult;

pub fn run_config(path: Option<&Path>) -> Result<String> {
    let config = load_config(path)?;
    config.to_toml()
}

pub fn run_sync(args: &SyncArgs) -> Result<SyncResult> {
    let config = load_config(args.config.as_deref())?;
    let run_date = args.date.unwrap_or_else(|| Local::now().date_naive());
    let options = sync_options(args, config.defaults, run_date);
    let span = info_span!(
        "sync",
        %run_date,
        dry_run = args.dry_run,
        provision_only = options.provision_only
    );
    let _guard = span.enter();
    info!(
        profiles = options.profiles,
        associations = options.associations,
        "starting run"
    );
    let context = SyncContext::new(options).with_mapping(config.mapping.clone());

    let (outcome, tables) = match load_source(args, &config) {
        Ok(snapshot) => {
            let outcome = sync_destination(args, &context, &snapshot);
            (outcome, snapshot.tables)
        }
        Err(err) => {
            error!(error = %err, "source snapshot failed to load");
            (SyncOutcome::aborted(SyncError::Load(err)), Vec::new())
        }
    };

    let fatal = outcome.result.as_ref().err().map(ToString::to_string);
    Ok(report(args, run_date, &outcome, &tables, fatal))
}

/// Command-line flags win over the deployment defaults.
pub fn sync_options(args: &SyncArgs, defaults: RunDefaults, run_date: NaiveDate) -> SyncOptions {
    SyncOptions::new(run_date)
        .with_profiles(args.profiles().unwrap_or(defaults.profiles))
        .with_associations(args.associations().unwrap_or(defaults.associations))
        .with_provision_only(args.provision_only)
}

fn load_config(path: Option<&Path>) -> Result<DeploymentConfig> {
    match path {
        Some(path) => DeploymentConfig::load(path),
        None => Ok(DeploymentConfig::default()),
    }
}

fn load_source(args: &SyncArgs, config: &DeploymentConfig) -> Result<SourceSnapshot, LoadError> {
    let credentials = SourceCredentials {
        base_url: args.source.url.clone(),
        oauth_url: args.source.oauth_url.clone(),
        client_id: args.source.client_id.clone(),
        client_secret: args.source.client_secret.clone(),
    };
    let client = PowerSchoolClient::connect(&credentials)?;
    SnapshotLoader::new(&client, &config.queries, &config.mapping).load()
}

fn sync_destination(args: &SyncArgs, context: &SyncContext, snapshot: &SourceSnapshot) -> SyncOutcome {
    let credentials = DestinationCredentials {
        base_url: args.destination.url.clone(),
        auth_token: args.destination.token.clone(),
    };
    let destination = match HttpDestination::new(&credentials) {
        Ok(destination) => destination,
        Err(err) => return SyncOutcome::aborted(SyncError::Connect(err)),
    };
    if args.dry_run {
        let mut destination = DryRunDestination::new(destination);
        reconcile(context, snapshot, &mut destination)
    } else {
        let mut destination = destination;
        reconcile(context, snapshot, &mut destination)
    }
}

/// Summarise, export and notify. Runs whatever happened before it.
fn report(
    args: &SyncArgs,
    run_date: NaiveDate,
    outcome: &SyncOutcome,
    tables: &[(SourceEntity, FlatTable)],
    fatal: Option<String>,
) -> SyncResult {
    let mut result = SyncResult {
        run_date,
        dry_run: args.dry_run,
        summary: RunSummary::from_log(&outcome.log),
        missing_classes: outcome.log.missing_classes.len(),
        exports: Vec::new(),
        fatal,
        report_errors: Vec::new(),
        body: None,
    };

    let report = match RunReport::build(&outcome.log, tables) {
        Ok(report) => report,
        Err(err) => {
            warn!(error = %err, "failed to render exports");
            result.report_errors.push(format!("render exports: {err}"));
            result.body = Some(result.summary.body());
            return result;
        }
    };

    let stamp = format!("{run_date}{}", args.postfix);
    match report.write_to(&args.output_dir, &stamp) {
        Ok(paths) => result.exports = paths,
        Err(err) => {
            warn!(error = %err, "failed to write exports");
            result.report_errors.push(format!("write exports: {err}"));
        }
    }

    if args.mail.to.is_empty() {
        result.body = Some(report.body());
        return result;
    }
    let notifier = SmtpNotifier::new(
        SmtpSettings {
            host: args.mail.smtp_host.clone(),
            port: args.mail.smtp_port,
            user: args.mail.smtp_user.clone(),
            password: args.mail.smtp_password.clone().unwrap_or_default(),
        },
        args.mail.to.clone(),
    );
    if let Err(err) = report.send(&notifier) {
        warn!(error = %err, "failed to send notification");
        result.report_errors.push(format!("send notification: {err}"));
        result.body = Some(report.body());
    }
    result
}

