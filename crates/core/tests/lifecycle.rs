//! Install, activate and generation rotation.

mod support;

use std::sync::Arc;

use lantern_domain::{LanternError, LifecycleState, Request, Response};
use support::{precache_network, test_config, url, Harness, MockCacheStorage, MockClients};

#[tokio::test]
async fn install_then_activate_claims_clients() {
    let harness = Harness::new(test_config("v1"));

    let installed = harness.manager.install().await.unwrap();
    assert_eq!(installed.critical_cached, 3);
    assert_eq!(installed.static_cached, 1);
    assert_eq!(installed.static_failed, 0);
    assert!(installed.activate_now);
    assert_eq!(harness.manager.state(), LifecycleState::Installed);

    let activated = harness.manager.activate().await.unwrap();
    assert_eq!(activated.version, "v1");
    assert_eq!(activated.clients_claimed, 2);
    assert_eq!(harness.clients.claims(), 1);
    assert_eq!(harness.manager.state(), LifecycleState::Active);
}

#[tokio::test]
async fn critical_failure_aborts_install_and_leaves_no_entries() {
    let network = precache_network();
    network.fail(&url("/assets/js/main.js"));
    let harness = Harness::with_parts(
        test_config("v1"),
        Arc::new(MockCacheStorage::new()),
        network,
        Arc::new(MockClients::new(1)),
    );

    let err = harness.manager.install().await.unwrap_err();

    assert!(matches!(err, LanternError::Install(_)));
    assert_eq!(harness.manager.state(), LifecycleState::Redundant);
    assert!(harness.storage.names().is_empty());
    assert!(harness.manager.activate().await.is_err());
}

#[tokio::test]
async fn critical_error_status_aborts_install() {
    let network = precache_network();
    network.route(&url("/offline.html"), Response::new(500, "boom"));
    let harness = Harness::with_parts(
        test_config("v1"),
        Arc::new(MockCacheStorage::new()),
        network,
        Arc::new(MockClients::new(1)),
    );

    assert!(harness.manager.install().await.is_err());
    assert!(harness.storage.store("v1").is_none());
}

#[tokio::test]
async fn static_failures_are_tolerated() {
    let network = precache_network();
    network.fail(&url("/assets/images/logo.png"));
    let harness = Harness::with_parts(
        test_config("v1"),
        Arc::new(MockCacheStorage::new()),
        network,
        Arc::new(MockClients::new(0)),
    );

    let installed = harness.manager.install().await.unwrap();

    assert_eq!(installed.static_cached, 0);
    assert_eq!(installed.static_failed, 1);
    assert_eq!(harness.store().count(), 3);
}

#[tokio::test]
async fn activation_leaves_exactly_one_generation() {
    let storage = Arc::new(MockCacheStorage::new());
    let network = precache_network();
    let clients = Arc::new(MockClients::new(1));

    let v1 = Harness::with_parts(test_config("v1"), storage.clone(), network.clone(), clients.clone());
    v1.manager.install().await.unwrap();
    v1.manager.activate().await.unwrap();
    let old_store = storage.store("v1").unwrap();
    assert_eq!(old_store.count(), 4);

    let v2 = Harness::with_parts(test_config("v2"), storage.clone(), network, clients);
    v2.manager.install().await.unwrap();
    let activated = v2.manager.activate().await.unwrap();

    assert_eq!(activated.superseded, vec!["v1".to_string()]);
    assert_eq!(storage.names(), vec!["v2".to_string()]);
    assert_eq!(old_store.count(), 0);
    assert_eq!(v2.store().count(), 4);
}

#[tokio::test]
async fn failed_upgrade_keeps_previous_generation_serving() {
    let storage = Arc::new(MockCacheStorage::new());
    let network = precache_network();
    let clients = Arc::new(MockClients::new(1));

    let v1 = Harness::with_parts(test_config("v1"), storage.clone(), network.clone(), clients.clone());
    v1.manager.install().await.unwrap();
    v1.manager.activate().await.unwrap();

    network.fail(&url("/"));
    let v2 = Harness::with_parts(test_config("v2"), storage.clone(), network.clone(), clients);
    assert!(v2.manager.install().await.is_err());

    assert_eq!(storage.names(), vec!["v1".to_string()]);
    network.set_offline(true);
    let served = v1.manager.handle_fetch(&Request::get(url("/")).unwrap()).await.unwrap();
    assert_eq!(served.text(), "<h1>home</h1>");
}

#[tokio::test]
async fn waiting_generation_activates_on_skip_waiting() {
    let storage = Arc::new(MockCacheStorage::new());
    let network = precache_network();
    let clients = Arc::new(MockClients::new(1));

    let v1 = Harness::with_parts(test_config("v1"), storage.clone(), network.clone(), clients.clone());
    v1.manager.install_and_activate().await.unwrap();

    let mut config = test_config("v2");
    config.cache.skip_waiting_on_install = false;
    let v2 = Harness::with_parts(config, storage.clone(), network, clients);
    let installed = v2.manager.install().await.unwrap();
    assert!(!installed.activate_now);
    assert_eq!(v2.manager.state(), LifecycleState::Installed);

    let activated = v2.manager.skip_waiting().await.unwrap().unwrap();
    assert_eq!(activated.version, "v2");
    assert_eq!(v2.manager.state(), LifecycleState::Active);
    assert_eq!(storage.names(), vec!["v2".to_string()]);
}

#[tokio::test]
async fn skip_waiting_before_install_is_remembered() {
    let storage = Arc::new(MockCacheStorage::new());
    let network = precache_network();
    let clients = Arc::new(MockClients::new(1));

    let v1 = Harness::with_parts(test_config("v1"), storage.clone(), network.clone(), clients.clone());
    v1.manager.install_and_activate().await.unwrap();

    let mut config = test_config("v2");
    config.cache.skip_waiting_on_install = false;
    let v2 = Harness::with_parts(config, storage, network, clients);
    assert!(v2.manager.skip_waiting().await.unwrap().is_none());

    let installed = v2.manager.install().await.unwrap();
    assert!(installed.activate_now);
}

#[tokio::test]
async fn install_is_rejected_once_installed() {
    let harness = Harness::new(test_config("v1"));
    harness.manager.install().await.unwrap();

    assert!(matches!(harness.manager.install().await, Err(LanternError::Install(_))));
}
