use mockito::{Matcher, Server};

use scaffold::services::registry_client::RegistryClient;
use scaffold::services::update_notifier::{check_for_update, newer_release, SELF_PACKAGE};

use super::common::packument;

#[tokio::test]
async fn test_newer_release_only_within_compatible_range() {
    let mut server = Server::new_async().await;
    let doc = packument(&server.url(), SELF_PACKAGE, &["1.0.0", "1.2.0", "2.0.0"], Some("2.0.0"));

    let mock = server
        .mock("GET", Matcher::Regex(r"^/@scaffold-cli%2[fF]core$".to_string()))
        .with_status(200)
        .with_body(doc.to_string())
        .expect(2)
        .create_async()
        .await;

    let client = RegistryClient::with_registry_url(server.url());

    let newer = newer_release(&client, SELF_PACKAGE, "1.0.0").await.unwrap();
    assert_eq!(newer.as_deref(), Some("1.2.0"));

    // 2.0.0 is outside ^1.2.0, so 1.2.0 is already the newest compatible release
    let newer = newer_release(&client, SELF_PACKAGE, "1.2.0").await.unwrap();
    assert_eq!(newer, None);

    mock.assert_async().await;
}

#[tokio::test]
async fn test_update_check_survives_unreachable_registry() {
    let client = RegistryClient::with_registry_url("http://127.0.0.1:9".to_string());

    assert!(newer_release(&client, SELF_PACKAGE, "1.0.0").await.is_err());
    // must return normally; the command goes on regardless
    check_for_update(&client).await;
}
