use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Contract tests for the `scaffold` binary

fn scaffold(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("scaffold").unwrap();
    cmd.env("HOME", home.path())
        .env_remove("CLI_HOME")
        .env_remove("CLI_TARGET_PATH")
        .env_remove("SCAFFOLD_REGISTRY")
        .env_remove("SCAFFOLD_NODE")
        .env_remove("RUST_LOG");
    cmd
}

fn write_local_package(dir: &std::path::Path, main: Option<&str>) -> std::path::PathBuf {
    let package_dir = dir.join("init-package");
    std::fs::create_dir_all(&package_dir).unwrap();
    let manifest = match main {
        Some(main) => {
            std::fs::write(package_dir.join(main), "module.exports = function () {};\n").unwrap();
            format!(r#"{{"name":"@scaffold-cli/init","version":"0.0.0","main":"{main}"}}"#)
        }
        None => r#"{"name":"@scaffold-cli/init","version":"0.0.0"}"#.to_string(),
    };
    std::fs::write(package_dir.join("package.json"), manifest).unwrap();
    package_dir
}

#[test]
fn test_help_lists_commands() {
    let home = TempDir::new().unwrap();
    scaffold(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("publish"))
        .stdout(predicate::str::contains("--target-path"));
}

#[test]
fn test_no_arguments_prints_help() {
    let home = TempDir::new().unwrap();
    scaffold(&home)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_unknown_command_fails() {
    let home = TempDir::new().unwrap();
    scaffold(&home)
        .arg("deploy")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_package_without_entry_exits_cleanly() {
    let home = TempDir::new().unwrap();
    let package_dir = write_local_package(home.path(), None);

    scaffold(&home)
        .args(["init", "my-app", "--no-update-check", "--target-path"])
        .arg(&package_dir)
        .assert()
        .success();
}

#[test]
fn test_missing_node_reports_error() {
    let home = TempDir::new().unwrap();
    let package_dir = write_local_package(home.path(), Some("index.js"));

    scaffold(&home)
        .args(["init", "--no-update-check", "--target-path"])
        .arg(&package_dir)
        .arg("--node")
        .arg(home.path().join("no-such-node"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to launch command package"));
}

#[cfg(unix)]
#[test]
fn test_child_exit_code_is_propagated() {
    use std::os::unix::fs::PermissionsExt;

    let home = TempDir::new().unwrap();
    let package_dir = write_local_package(home.path(), Some("index.js"));
    let node = home.path().join("fake-node");
    std::fs::write(&node, "#!/bin/sh\nexit 7\n").unwrap();
    std::fs::set_permissions(&node, std::fs::Permissions::from_mode(0o755)).unwrap();

    scaffold(&home)
        .env("CLI_TARGET_PATH", &package_dir)
        .env("SCAFFOLD_NODE", &node)
        .args(["init", "my-app", "--force", "--no-update-check"])
        .assert()
        .code(7);
}

#[test]
fn test_invalid_config_file_is_reported() {
    let home = TempDir::new().unwrap();
    let cli_home = home.path().join(".scaffold-cli");
    std::fs::create_dir_all(&cli_home).unwrap();
    std::fs::write(cli_home.join("config.toml"), "registry = \"ftp://mirror\"\n").unwrap();

    scaffold(&home)
        .args(["publish", "--no-update-check"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Configuration error"));
}
