//! Smoke tests -- verify the binary runs and every subcommand is wired up.

use assert_cmd::Command;

#[test]
fn test_cli_help() {
    Command::cargo_bin("bee")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicates::str::contains("recorded history"));
}

#[test]
fn test_cli_version() {
    Command::cargo_bin("bee")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicates::str::contains("bee"));
}

#[test]
fn test_no_command_prints_help() {
    Command::cargo_bin("bee")
        .unwrap()
        .assert()
        .success()
        .stdout(predicates::str::contains("history:delete"));
}

#[test]
fn test_subcommands_exist() {
    for sub in [
        "run",
        "script:run",
        "history",
        "history:delete",
        "output",
        "output:delete",
        "list",
        "pending",
        "script:make",
    ] {
        Command::cargo_bin("bee")
            .unwrap()
            .args([sub, "--help"])
            .assert()
            .success();
    }
}

#[test]
fn test_unknown_command_is_usage_error() {
    Command::cargo_bin("bee")
        .unwrap()
        .arg("frobnicate")
        .assert()
        .code(2);
}
