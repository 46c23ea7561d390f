// tests/cli_args.rs

use std::path::PathBuf;

use clap::Parser;
use sitepipe::cli::{CliArgs, Command};
use sitepipe::types::TaskId;

#[test]
fn no_subcommand_means_dev() {
    let args = CliArgs::parse_from(["sitepipe"]);

    assert_eq!(args.command(), Command::Dev);
    assert_eq!(args.config, PathBuf::from("Sitepipe.toml"));
    assert!(!args.dry_run);
    assert!(args.log_level.is_none());
}

#[test]
fn run_takes_a_task_name() {
    let args = CliArgs::parse_from(["sitepipe", "run", "styles", "--config", "site/Sitepipe.toml"]);

    assert_eq!(args.command(), Command::Run { task: TaskId::Styles });
    assert_eq!(args.config, PathBuf::from("site/Sitepipe.toml"));
}

#[test]
fn unknown_task_is_rejected() {
    assert!(CliArgs::try_parse_from(["sitepipe", "run", "minify"]).is_err());
}

#[test]
fn global_flags_work_after_subcommand() {
    let args = CliArgs::try_parse_from(["sitepipe", "build", "--dry-run", "--log-level", "debug"]).unwrap();

    assert_eq!(args.command(), Command::Build);
    assert!(args.dry_run);
}

#[test]
fn project_root_is_the_config_directory() {
    let dir = tempfile::tempdir().unwrap();
    let root = sitepipe::project_root(&dir.path().join("Sitepipe.toml")).unwrap();

    assert_eq!(root, dir.path().canonicalize().unwrap());
}
