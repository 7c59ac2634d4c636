//! Tests for check, config, completions.

use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;
use clap_complete::Shell;

#[test]
fn cli_parse_check() {
    match parse(&["pagepull", "check", "--output", "pages", "--count", "604"]) {
        CliCommand::Check { overrides } => {
            assert_eq!(overrides.count, Some(604));
            assert_eq!(overrides.output.as_deref(), Some(std::path::Path::new("pages")));
        }
        _ => panic!("expected Check"),
    }
}

#[test]
fn cli_parse_config() {
    match parse(&["pagepull", "config"]) {
        CliCommand::Config { defaults } => assert!(!defaults),
        _ => panic!("expected Config"),
    }
    match parse(&["pagepull", "config", "--defaults"]) {
        CliCommand::Config { defaults } => assert!(defaults),
        _ => panic!("expected Config --defaults"),
    }
}

#[test]
fn cli_parse_completions() {
    match parse(&["pagepull", "completions", "bash"]) {
        CliCommand::Completions { shell } => assert_eq!(shell, Shell::Bash),
        _ => panic!("expected Completions"),
    }
}

#[test]
fn cli_completions_requires_known_shell() {
    assert!(Cli::try_parse_from(["pagepull", "completions", "cmd.exe"]).is_err());
}

#[test]
fn cli_requires_subcommand() {
    assert!(Cli::try_parse_from(["pagepull"]).is_err());
}

#[test]
fn cli_definition_is_consistent() {
    use clap::CommandFactory;
    Cli::command().debug_assert();
}
