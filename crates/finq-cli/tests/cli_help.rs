use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn test_help_shows_all_commands() {
    cargo_bin_cmd!("finq")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("logout"))
        .stdout(predicate::str::contains("signup"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_login_help_shows_federated_flag() {
    cargo_bin_cmd!("finq")
        .args(["login", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--federated"))
        .stdout(predicate::str::contains("--username"))
        .stdout(predicate::str::contains("--password"));
}

#[test]
fn test_list_help_names_every_collection() {
    cargo_bin_cmd!("finq")
        .args(["list", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("transactions"))
        .stdout(predicate::str::contains("budgets"))
        .stdout(predicate::str::contains("reports"))
        .stdout(predicate::str::contains("dashboard"))
        .stdout(predicate::str::contains("profile"));
}

#[test]
fn test_config_help_shows_subcommands() {
    cargo_bin_cmd!("finq")
        .args(["config", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("path"))
        .stdout(predicate::str::contains("init"));
}

#[test]
fn test_version_flag() {
    cargo_bin_cmd!("finq")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.1"));
}
