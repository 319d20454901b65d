//! Argument parsing for the download command.

use clap::Parser;
use leasecp::cli::{Cli, Command};

fn parse(args: &[&str]) -> leasecp::cli::DownloadCommand {
    let cli = Cli::try_parse_from(args).unwrap();
    match cli.command {
        Command::Download(command) => command,
    }
}

#[test]
fn test_destination_is_optional() {
    let command = parse(&["leasecp", "download", "-s", "mystack", "--server", "lion", "/path/to/file"]);
    assert_eq!(command.stack.as_deref(), Some("mystack"));
    assert_eq!(command.server, "lion");
    assert_eq!(command.remote_path, "/path/to/file");
    assert_eq!(command.destination, None);
}

#[test]
fn test_second_positional_sets_destination() {
    let command = parse(&[
        "leasecp",
        "download",
        "--server",
        "52.65.34.98",
        "/path/to/source/file",
        "/path/to/target/directory",
    ]);
    assert_eq!(command.stack, None);
    assert_eq!(command.destination.as_deref(), Some("/path/to/target/directory"));
}

#[test]
fn test_server_flag_is_required() {
    let result = Cli::try_parse_from(["leasecp", "download", "-s", "mystack", "/path/to/file"]);
    assert!(result.is_err());
}

#[test]
fn test_remote_path_is_required() {
    let result = Cli::try_parse_from(["leasecp", "download", "--server", "lion"]);
    let err = result.unwrap_err();
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn test_extra_positionals_are_rejected() {
    let result = Cli::try_parse_from(["leasecp", "download", "--server", "web", "/a", "/b", "/c"]);
    assert!(result.is_err());
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from([
        "leasecp",
        "download",
        "--server",
        "web",
        "/a",
        "--config",
        "/tmp/leasecp.toml",
        "-v",
    ])
    .unwrap();
    assert!(cli.verbose);
    assert_eq!(cli.config.unwrap().to_str(), Some("/tmp/leasecp.toml"));
}

#[test]
fn test_environment_filter() {
    let command = parse(&[
        "leasecp",
        "download",
        "-s",
        "app",
        "-e",
        "staging",
        "--server",
        "web",
        "/a",
    ]);
    assert_eq!(command.environment.as_deref(), Some("staging"));

    let command = parse(&["leasecp", "download", "--server", "web", "/a"]);
    assert_eq!(command.environment, None);
}
