//! File provider loading and reload tests.

use std::fs;
use std::time::Duration;

use config_aggregator::config::FileProviderConfig;
use config_aggregator::provider::FileProvider;
use config_aggregator::{Pool, Provider, ProviderAggregator, Registration};
use tokio::sync::mpsc;

mod common;
use common::{recv_timeout, MockProvider};

const ONE_ROUTE: &str = r#"
[[routes]]
name = "api"
path_prefix = "/api"
backend_group = "web"

[[backends]]
name = "b1"
group = "web"
address = "127.0.0.1:3000"
"#;

const TWO_ROUTES: &str = r#"
[[routes]]
name = "api"
path_prefix = "/api"
backend_group = "web"

[[routes]]
name = "static"
path_prefix = "/static"
backend_group = "web"

[[backends]]
name = "b1"
group = "web"
address = "127.0.0.1:3000"
"#;

#[tokio::test]
async fn test_snapshot_is_sent_before_provide_returns() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dynamic.toml");
    fs::write(&path, ONE_ROUTE).unwrap();

    let mut provider = FileProvider::new(FileProviderConfig {
        filename: Some(path),
        ..Default::default()
    });
    provider.init().unwrap();

    let (tx, mut rx) = mpsc::channel(10);
    provider.provide(tx, Pool::new()).await.unwrap();

    let message = rx.try_recv().expect("snapshot not sent synchronously");
    assert_eq!(message.provider_name, "file");
    assert_eq!(message.configuration.routes.len(), 1);
    assert_eq!(message.configuration.backends[0].address, "127.0.0.1:3000");
}

#[tokio::test]
async fn test_file_provider_leads_the_aggregate() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("routes.toml"), ONE_ROUTE).unwrap();

    let mut aggregator = ProviderAggregator::new();
    aggregator.add_provider(Registration::dynamic(MockProvider::new("salad", 1))).unwrap();
    aggregator
        .add_provider(FileProvider::new(FileProviderConfig {
            directory: Some(dir.path().to_path_buf()),
            ..Default::default()
        }))
        .unwrap();

    let pool = Pool::new();
    let (tx, mut rx) = mpsc::channel(10);
    aggregator.provide(tx, pool.clone()).await.unwrap();

    assert_eq!(recv_timeout(&mut rx).await.unwrap().provider_name, "file");
    assert_eq!(recv_timeout(&mut rx).await.unwrap().provider_name, "salad");
    pool.stop().await;
}

#[tokio::test]
async fn test_watch_sends_full_snapshot_on_change() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dynamic.toml");
    fs::write(&path, ONE_ROUTE).unwrap();

    let mut provider = FileProvider::new(FileProviderConfig {
        filename: Some(path.clone()),
        directory: None,
        watch: true,
    });
    provider.init().unwrap();

    let pool = Pool::new();
    let (tx, mut rx) = mpsc::channel(10);
    provider.provide(tx, pool.clone()).await.unwrap();
    assert_eq!(recv_timeout(&mut rx).await.unwrap().configuration.routes.len(), 1);

    // Let the watcher settle before editing.
    tokio::time::sleep(Duration::from_millis(200)).await;
    fs::write(&path, TWO_ROUTES).unwrap();

    let mut latest = None;
    while let Ok(Some(message)) = tokio::time::timeout(Duration::from_secs(3), rx.recv()).await {
        let done = message.configuration.routes.len() == 2;
        latest = Some(message);
        if done {
            break;
        }
    }

    let latest = latest.expect("no reload after the file changed");
    assert_eq!(latest.provider_name, "file");
    assert_eq!(latest.configuration.routes.len(), 2);
    assert_eq!(latest.configuration.backends.len(), 1);

    pool.stop().await;
}

#[tokio::test]
async fn test_broken_edit_keeps_watching() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dynamic.toml");
    fs::write(&path, ONE_ROUTE).unwrap();

    let mut provider = FileProvider::new(FileProviderConfig {
        filename: Some(path.clone()),
        directory: None,
        watch: true,
    });
    provider.init().unwrap();

    let pool = Pool::new();
    let (tx, mut rx) = mpsc::channel(10);
    provider.provide(tx, pool.clone()).await.unwrap();
    recv_timeout(&mut rx).await.unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;
    fs::write(&path, "[[routes]\nbroken").unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;
    fs::write(&path, TWO_ROUTES).unwrap();

    let mut reloaded = false;
    while let Ok(Some(message)) = tokio::time::timeout(Duration::from_secs(3), rx.recv()).await {
        if message.configuration.routes.len() == 2 {
            reloaded = true;
            break;
        }
    }
    assert!(reloaded, "watcher gave up after a broken edit");

    pool.stop().await;
}

#[tokio::test]
async fn test_parse_error_fails_the_feed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dynamic.toml");
    fs::write(&path, "not = [valid").unwrap();

    let mut provider = FileProvider::new(FileProviderConfig {
        filename: Some(path),
        ..Default::default()
    });
    provider.init().unwrap();

    let (tx, mut rx) = mpsc::channel(10);
    assert!(provider.provide(tx, Pool::new()).await.is_err());
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn test_failed_first_send_starts_no_watcher() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dynamic.toml");
    fs::write(&path, ONE_ROUTE).unwrap();

    let mut provider = FileProvider::new(FileProviderConfig {
        filename: Some(path),
        directory: None,
        watch: true,
    });
    provider.init().unwrap();

    let pool = Pool::new();
    let (tx, rx) = mpsc::channel(10);
    drop(rx);

    let err = provider.provide(tx, pool.clone()).await.unwrap_err();
    assert!(matches!(err, config_aggregator::ProviderError::Closed));
    assert!(pool.is_empty());
}
