use std::path::{Path, PathBuf};

use serde_json::json;
use tempfile::TempDir;

use scaffold::models::invocation::{DispatchInvocation, ExitOutcome, PARENT_KEY};
use scaffold::models::package::cache_entry_path;
use scaffold::services::command_dispatcher::CommandDispatcher;
use scaffold::utils::config::{Config, ConfigOverrides};
use scaffold::ScaffoldError;

use super::common::local_package;

fn config_for(home: &Path, target_path: Option<PathBuf>, registry: &str, node_bin: PathBuf) -> Config {
    Config::load_from_home(
        home,
        ConfigOverrides {
            target_path,
            registry: Some(registry.to_string()),
            node_bin: Some(node_bin),
            no_update_check: true,
            ..Default::default()
        },
    )
    .unwrap()
}

fn init_invocation(project_name: &str) -> DispatchInvocation {
    DispatchInvocation::new("init")
        .with_arg(json!(project_name))
        .with_option("force", json!(true))
        .with_option("_name", json!("init"))
        .with_option(PARENT_KEY, json!({ "debug": false }))
}

#[tokio::test]
async fn test_unknown_command_is_rejected() {
    let home = TempDir::new().unwrap();
    let config = config_for(home.path(), None, "http://127.0.0.1:9", PathBuf::from("node"));
    let dispatcher = CommandDispatcher::new(&config).unwrap();

    let err = dispatcher.dispatch(&DispatchInvocation::new("deploy")).await.unwrap_err();
    assert!(matches!(err, ScaffoldError::ConfigError(message) if message.contains("deploy")));
}

#[tokio::test]
async fn test_local_package_without_entry_is_skipped() {
    let home = TempDir::new().unwrap();
    let package_dir = local_package(home.path(), None);
    let config = config_for(
        home.path(),
        Some(package_dir),
        "http://127.0.0.1:9",
        home.path().join("no-such-node"),
    );
    let dispatcher = CommandDispatcher::new(&config).unwrap();

    let outcome = dispatcher.dispatch(&init_invocation("my-app")).await.unwrap();
    assert_eq!(outcome, ExitOutcome::Skipped);
    assert_eq!(outcome.exit_code(), 0);
}

#[tokio::test]
async fn test_missing_interpreter_is_a_dispatch_error() {
    let home = TempDir::new().unwrap();
    let package_dir = local_package(home.path(), Some("index.js"));
    let config = config_for(
        home.path(),
        Some(package_dir),
        "http://127.0.0.1:9",
        home.path().join("no-such-node"),
    );
    let dispatcher = CommandDispatcher::new(&config).unwrap();

    let err = dispatcher.dispatch(&init_invocation("my-app")).await.unwrap_err();
    assert!(matches!(err, ScaffoldError::DispatchError(_)));
}

#[cfg(unix)]
mod with_fake_node {
    use super::*;
    use crate::integration::common::{command_package_tarball, fake_node, packument, registry_path};
    use mockito::{Matcher, Server};

    fn recorded_args(record: &Path) -> Vec<String> {
        std::fs::read_to_string(record)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[tokio::test]
    async fn test_local_package_exit_code_propagates() {
        let home = TempDir::new().unwrap();
        let package_dir = local_package(home.path(), Some("index.js"));
        let record = home.path().join("node-args.txt");
        let node = fake_node(home.path(), &record, 7);

        let config = config_for(home.path(), Some(package_dir.clone()), "http://127.0.0.1:9", node);
        let dispatcher = CommandDispatcher::new(&config).unwrap();

        let outcome = dispatcher.dispatch(&init_invocation("my-app")).await.unwrap();
        assert_eq!(outcome, ExitOutcome::Exited(7));
        assert_eq!(outcome.exit_code(), 7);

        let args = recorded_args(&record);
        assert_eq!(args.len(), 2);
        assert_eq!(args[0], "-e");
        assert_eq!(
            args[1],
            format!(
                "require('{}').call(null, [\"my-app\",{{\"force\":true}}])",
                package_dir.join("index.js").display()
            )
        );
    }

    #[tokio::test]
    async fn test_cached_package_is_installed_then_reused() {
        let home = TempDir::new().unwrap();
        let record = home.path().join("node-args.txt");
        let node = fake_node(home.path(), &record, 0);

        let mut server = Server::new_async().await;
        let doc = packument(&server.url(), "@scaffold-cli/init", &["1.0.0"], Some("1.0.0"));
        let _packument = server
            .mock("GET", Matcher::Regex(format!("^{}$", registry_path("@scaffold-cli/init")).replace("%2f", "%2[fF]")))
            .with_status(200)
            .with_body(doc.to_string())
            .expect_at_least(1)
            .create_async()
            .await;
        let tarball = server
            .mock("GET", "/tarballs/scaffold-cli-init-1.0.0.tgz")
            .with_status(200)
            .with_body(command_package_tarball("@scaffold-cli/init", "1.0.0"))
            .expect(1)
            .create_async()
            .await;

        let config = config_for(home.path(), None, &server.url(), node);
        let dispatcher = CommandDispatcher::new(&config).unwrap();

        let first = dispatcher.dispatch(&init_invocation("my-app")).await.unwrap();
        let second = dispatcher.dispatch(&init_invocation("other-app")).await.unwrap();

        assert_eq!(first, ExitOutcome::Exited(0));
        assert_eq!(second, ExitOutcome::Exited(0));
        tarball.assert_async().await;

        let entry = cache_entry_path(&config.store_dir(), "@scaffold-cli/init", "1.0.0");
        assert!(entry.ends_with("_@scaffold-cli_init@1.0.0@@scaffold-cli/init"));
        assert!(entry.join("lib/index.js").is_file());

        let args = recorded_args(&record);
        assert_eq!(args.len(), 4);
        let expected_root = entry.join("lib/index.js");
        assert!(args[1].starts_with(&format!("require('{}')", expected_root.display())));
        assert!(args[3].contains("[\"other-app\",{\"force\":true}]"));
    }
}
