// End-to-end CLI checks: argument surface and the fail-closed paths that
// need no network access.

use assert_cmd::Command;
use predicates::prelude::*;

fn bootstrap_cmd(home: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("repo-bootstrap").unwrap();
    // Point everything the run persists (projects root, tools root, shell RC)
    // at a throwaway home.
    cmd.env("HOME", home);
    cmd.env_remove("HTTP_PROXY");
    cmd.env_remove("HTTPS_PROXY");
    cmd
}

#[test]
fn help_documents_the_proxy_flags() {
    let home = tempfile::tempdir().unwrap();
    bootstrap_cmd(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--http-proxy"))
        .stdout(predicate::str::contains("--https-proxy"))
        .stdout(predicate::str::contains("--force"));
}

#[test]
fn missing_repository_arguments_are_a_usage_error() {
    let home = tempfile::tempdir().unwrap();
    bootstrap_cmd(home.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("REPO_URL"));
}

#[test]
fn unsafe_repository_url_fails_the_run() {
    let home = tempfile::tempdir().unwrap();
    bootstrap_cmd(home.path())
        .arg("https://github.com/user/repo;rm -rf /")
        .assert()
        .code(1);
}

#[test]
fn invalid_proxy_url_fails_before_any_work() {
    let home = tempfile::tempdir().unwrap();
    bootstrap_cmd(home.path())
        .args(["--http-proxy", "not-a-proxy"])
        .arg("https://github.com/user/repo.git")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid proxy URL"));
}

#[test]
fn git_user_requires_git_email() {
    let home = tempfile::tempdir().unwrap();
    bootstrap_cmd(home.path())
        .args(["--git-user", "Dev"])
        .arg("https://github.com/user/repo.git")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--git-email"));
}
