//! Command-line parsing and deployment configuration.

use std::path::Path;

use chrono::NaiveDate;
use clap::Parser;
use roster_cli::cli::{Cli, Command, SyncArgs};
use roster_cli::commands::sync_options;
use roster_cli::config::{DeploymentConfig, RunDefaults};

const REQUIRED: [&str; 12] = [
    "--source-url",
    "https://sis.example.org",
    "--source-oauth-url",
    "https://sis.example.org",
    "--client-id",
    "id",
    "--client-secret",
    "secret",
    "--destination-url",
    "https://api.example.org",
    "--destination-token",
    "token",
];

fn parse_sync(extra: &[&str]) -> SyncArgs {
    let mut argv = vec!["roster-sync", "sync"];
    argv.extend(REQUIRED);
    argv.extend(extra);
    match Cli::try_parse_from(argv).unwrap().command {
        Command::Sync(args) => *args,
        Command::Config { .. } => panic!("expected the sync command"),
    }
}

fn run_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 9, 1).unwrap()
}

#[test]
fn flags_default_to_deployment_values() {
    let args = parse_sync(&[]);
    assert_eq!(args.profiles(), None);
    assert_eq!(args.associations(), None);
    assert_eq!(args.output_dir, Path::new("output"));

    let options = sync_options(&args, RunDefaults::default(), run_date());
    assert!(options.profiles);
    assert!(!options.associations);
    assert!(!options.provision_only);
}

#[test]
fn command_line_overrides_deployment_defaults() {
    let args = parse_sync(&["--skip-profile", "--associate-relationships", "--provision-only"]);
    let defaults = RunDefaults {
        profiles: true,
        associations: false,
    };
    let options = sync_options(&args, defaults, run_date());
    assert!(!options.profiles);
    assert!(options.associations);
    assert!(options.provision_only);
}

#[test]
fn last_of_a_flag_pair_wins() {
    let args = parse_sync(&["--skip-associations", "--associate-relationships"]);
    assert_eq!(args.associations(), Some(true));
    let args = parse_sync(&["--update-profile", "--skip-profile"]);
    assert_eq!(args.profiles(), Some(false));
}

#[test]
fn date_is_parsed_as_calendar_date() {
    let args = parse_sync(&["--date", "2024-09-01", "--dry-run"]);
    assert_eq!(args.date, Some(run_date()));
    assert!(args.dry_run);

    let mut argv = vec!["roster-sync", "sync", "--date", "01/09/2024"];
    argv.extend(REQUIRED);
    assert!(Cli::try_parse_from(argv).is_err());
}

#[test]
fn recipients_need_smtp_credentials() {
    let args = parse_sync(&["--to", "office@school.org"]);
    if args.mail.smtp_password.is_none() {
        let message = args.validate().unwrap_err();
        assert!(message.contains("--smtp-password"));
    }

    let args = parse_sync(&[
        "--to",
        "office@school.org",
        "--smtp-user",
        "sync@school.org",
        "--smtp-password",
        "app-password",
    ]);
    assert!(args.validate().is_ok());
    assert_eq!(args.mail.smtp_port, 465);
}

#[test]
fn no_recipients_needs_no_credentials() {
    let args = parse_sync(&[]);
    assert!(args.validate().is_ok());
}

#[test]
fn deployment_file_overrides_only_what_it_names() {
    let config = DeploymentConfig::parse(
        r#"
        [defaults]
        associations = true

        [mapping.grades]
        ignored_year_groups = [10543690]
        "#,
    )
    .unwrap();
    assert!(config.defaults.profiles);
    assert!(config.defaults.associations);
    assert_eq!(config.mapping.grades.ignored_year_groups, vec![10543690]);
    assert_eq!(config.queries, DeploymentConfig::default().queries);
}

#[test]
fn effective_config_renders_and_reloads() {
    let config = DeploymentConfig::default();
    let text = config.to_toml().unwrap();
    assert!(text.contains("[defaults]"));
    assert_eq!(DeploymentConfig::parse(&text).unwrap(), config);
}

#[test]
fn deployment_file_is_read_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("deployment.toml");
    std::fs::write(&path, "[defaults]\nprofiles = false\n").unwrap();
    let config = DeploymentConfig::load(&path).unwrap();
    assert!(!config.defaults.profiles);

    let missing = DeploymentConfig::load(&dir.path().join("absent.toml")).unwrap_err();
    insta::assert_snapshot!(
        format!("{missing}").replace(dir.path().to_str().unwrap(), "<dir>"),
        @"read deployment config <dir>/absent.toml"
    );
}
