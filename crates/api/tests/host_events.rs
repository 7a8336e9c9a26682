//! Integration tests for the service-worker event surface

mod support;

use std::sync::Arc;

use lantern_core::CacheStore;
use lantern_domain::{
    ControlMessage, ControlReply, HostAction, LifecycleState, Request, Response, ResponseSource,
};
use lantern_lib::host::{install_event, MessageEvent, NotificationClickEvent, PushEvent, SyncEvent};
use support::{site_network, started_app, test_app, test_config, url, StubNetwork};

#[tokio::test]
async fn start_installs_activates_and_claims_clients() {
    let app = test_app(test_config("v1"), site_network());
    app.clients.register("/");
    app.clients.register("/events.html");

    let (installed, activated) = app.context.host.start().await.unwrap();

    assert_eq!(installed.critical_cached, 2);
    assert_eq!(installed.static_cached, 1);
    let activated = activated.expect("first install activates right away");
    assert_eq!(activated.clients_claimed, 2);
    assert_eq!(app.clients.controlled(), 2);
    assert_eq!(app.context.manager.state(), LifecycleState::Active);
}

#[tokio::test]
async fn failed_install_reports_through_the_completion_handle() {
    let network = site_network();
    network.route("/offline.html", Response::new(500, "boom"));
    let app = test_app(test_config("v1"), network);

    let (event, completion) = install_event();
    assert!(app.context.host.on_install(event).await.is_err());
    assert!(completion.wait().await.is_err());
    assert_eq!(app.context.manager.state(), LifecycleState::Redundant);

    let request = Request::get(url("/")).unwrap();
    assert!(app.context.host.on_fetch(&request).await.is_none());
}

#[tokio::test]
async fn fetch_is_answered_once_active() {
    let app = started_app().await;
    app.network.set_offline(true);

    let request = Request::get(url("/")).unwrap().with_destination("document");
    let response = app.context.host.on_fetch(&request).await.expect("intercepted");

    assert_eq!(response.source, ResponseSource::Cache);
    assert_eq!(response.text(), "<h1>home</h1>");
}

#[tokio::test]
async fn get_version_replies_over_the_port() {
    let app = started_app().await;

    let (event, reply) = MessageEvent::with_reply(ControlMessage::GetVersion);
    app.context.host.on_message(event).await.unwrap();

    assert_eq!(reply.await.unwrap(), ControlReply::Version { version: "v1".into() });
}

#[tokio::test]
async fn skip_waiting_sends_no_reply() {
    let app = started_app().await;

    let (event, reply) = MessageEvent::with_reply(ControlMessage::SkipWaiting);
    app.context.host.on_message(event).await.unwrap();

    assert!(reply.await.is_err());
}

#[tokio::test]
async fn clear_cache_empties_the_active_generation() {
    let app = started_app().await;

    let (event, reply) = MessageEvent::with_reply(ControlMessage::ClearCache);
    app.context.host.on_message(event).await.unwrap();

    assert_eq!(reply.await.unwrap(), ControlReply::Cleared { cleared: 3 });
    let store = app.context.manager.active_store().unwrap();
    assert_eq!(store.len().await.unwrap(), 0);
}

#[tokio::test]
async fn push_uses_defaults_and_payload_overrides() {
    let app = test_app(test_config("v1"), Arc::new(StubNetwork::default()));
    let host = &app.context.host;

    let HostAction::ShowNotification(plain) = host.on_push(&PushEvent::default()) else {
        panic!("push must show a notification");
    };
    assert_eq!(plain.body, "New content available");
    assert_eq!(plain.icon, "/assets/images/icons/icon-192x192.png");
    assert_eq!(plain.badge, "/assets/images/icons/icon-72x72.png");
    assert_eq!(plain.vibrate, vec![100, 50, 100]);
    let actions: Vec<_> = plain.actions.iter().map(|a| a.action.as_str()).collect();
    assert_eq!(actions, ["explore", "close"]);

    let event = PushEvent { data: Some(r#"{"title":"Agenda","body":"New event"}"#.into()) };
    let HostAction::ShowNotification(custom) = host.on_push(&event) else {
        panic!("push must show a notification");
    };
    assert_eq!(custom.title, "Agenda");
    assert_eq!(custom.body, "New event");

    let event = PushEvent { data: Some("not json".into()) };
    let HostAction::ShowNotification(fallback) = host.on_push(&event) else {
        panic!("push must show a notification");
    };
    assert_eq!(fallback.body, "New content available");
}

#[tokio::test]
async fn notification_clicks_map_to_window_actions() {
    let app = test_app(test_config("v1"), Arc::new(StubNetwork::default()));
    let host = &app.context.host;
    let click = |action: &str| NotificationClickEvent { action: action.into() };

    assert_eq!(host.on_notification_click(&click("explore")), HostAction::OpenWindow("/".into()));
    assert_eq!(host.on_notification_click(&click("close")), HostAction::None);
    assert_eq!(host.on_notification_click(&click("")), HostAction::OpenWindow("/".into()));

    app.clients.register("/");
    assert_eq!(host.on_notification_click(&click("")), HostAction::FocusOrOpen("/".into()));
}

#[tokio::test]
async fn push_and_sync_leave_cache_state_alone() {
    let app = started_app().await;
    let host = &app.context.host;
    let before = app.context.manager.stats().await;

    host.on_push(&PushEvent::default());
    host.on_notification_click(&NotificationClickEvent::default());
    assert!(host.on_sync(&SyncEvent { tag: "background-sync".into() }));
    assert!(!host.on_sync(&SyncEvent { tag: "other".into() }));

    assert_eq!(app.context.manager.stats().await, before);
    assert_eq!(app.context.manager.state(), LifecycleState::Active);
}
