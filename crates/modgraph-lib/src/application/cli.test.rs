use super::*;
use crate::primitives::{ColorIntent, OutputFormat};
use clap::CommandFactory;

#[test]
fn test_cli_definition_is_valid() {
    Cli::command().debug_assert();
}

#[test]
fn test_parse_dependents() {
    let cli = Cli::try_parse_from(["modgraph", "dependents", "core"]).unwrap();
    assert_eq!(
        cli.command,
        Some(Commands::Dependents {
            module: "core".to_string()
        })
    );
}

#[test]
fn test_parse_resolve_with_filter() {
    let cli = Cli::try_parse_from(["modgraph", "resolve", "app", "lib"]).unwrap();
    assert_eq!(
        cli.command,
        Some(Commands::Resolve {
            modules: vec!["app".to_string(), "lib".to_string()]
        })
    );
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from(["modgraph", "check", "--output", "json", "--color", "never"]).unwrap();
    assert_eq!(cli.command, Some(Commands::Check));
    assert_eq!(cli.config.output, OutputFormat::Json);
    assert_eq!(cli.config.color, ColorIntent::Never);
}

#[test]
fn test_dependents_requires_module() {
    assert!(Cli::try_parse_from(["modgraph", "dependents"]).is_err());
}

#[test]
fn test_requires_workspace() {
    assert!(!Commands::Version.requires_workspace());
    assert!(Commands::Check.requires_workspace());
    assert!(Commands::Order.requires_workspace());
}
