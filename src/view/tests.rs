use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio_test::{assert_err, assert_ok};

use super::*;
use crate::api::mock::{client, MockTransport};
use crate::api::Method;
use crate::dispatch::{Action, Command, CommandDispatcher, CommandState, KillMode};
use crate::error::{ConsoleError, ErrorKind};
use crate::models::LifecycleState;
use crate::policy::Classification;

const DEVICE: &str = "lab-pc-01";
const SOFTWARE_PATH: &str = "/api/devices/lab-pc-01/software";
const SERVICES_PATH: &str = "/api/devices/lab-pc-01/services";
const EXTENSIONS_PATH: &str = "/api/devices/lab-pc-01/extensions";

fn backend() -> Arc<MockTransport> {
    let transport = MockTransport::new();
    transport
        .on(
            Method::Get,
            EXTENSIONS_PATH,
            Ok(json!([
                { "name": "prettier", "type": "vscode" },
                { "name": "EvilExt", "type": "vscode" },
                { "name": "uBlock Origin", "type": "browser" }
            ])),
        )
        .on(
            Method::Get,
            SOFTWARE_PATH,
            Ok(json!([
                { "name": "foo", "version": "1.2", "type": "package", "state": "installed" },
                { "name": "firefox", "version": "131", "type": "package", "state": "installed" },
                { "name": "firefox", "type": "process", "state": "running" },
                { "name": "steam", "type": "process", "state": "running" }
            ])),
        )
        .on(
            Method::Get,
            SERVICES_PATH,
            Ok(json!([{ "name": "bar", "status": "running", "startup": "auto" }])),
        )
        .on(
            Method::Get,
            "/api/devices/lab-pc-01/extension-policy",
            Ok(json!({ "vscode": ["Prettier"] })),
        )
        .on(
            Method::Get,
            "/api/devices/lab-pc-01/extension-blacklist",
            Ok(json!({ "vscode": ["evilext"] })),
        );
    transport
}

async fn mounted(transport: &Arc<MockTransport>) -> (DeviceView, CommandDispatcher) {
    let dispatcher = CommandDispatcher::new(client(transport), Duration::from_secs(5));
    let mut view = DeviceView::new(DEVICE);
    view.mount(dispatcher.client()).await.unwrap();
    (view, dispatcher)
}

fn software_names(view: &DeviceView) -> Vec<&str> {
    view.software().iter().map(|s| s.name.as_str()).collect()
}

// ============================================================================
// MOUNT / CLASSIFY
// ============================================================================

#[tokio::test]
async fn test_new_view_is_stale_until_mounted() {
    let transport = backend();
    let view = DeviceView::new(DEVICE);
    assert_eq!(
        view.stale_collections(),
        vec![Collection::Extensions, Collection::Software, Collection::Services]
    );
    assert!(view.synced_at().is_none());

    let (view, _) = mounted(&transport).await;
    assert!(view.stale_collections().is_empty());
    assert_eq!(view.software().len(), 4);
    assert!(view.synced_at().is_some());
}

#[tokio::test]
async fn test_failed_mount_keeps_previous_state() {
    let transport = MockTransport::new();
    transport
        .on(Method::Get, EXTENSIONS_PATH, Err(ConsoleError::Unauthorized))
        .on(Method::Get, SOFTWARE_PATH, Err(ConsoleError::Unauthorized))
        .on(Method::Get, SERVICES_PATH, Err(ConsoleError::Unauthorized));
    let mut view = DeviceView::new(DEVICE);

    let err = view.mount(&client(&transport)).await.unwrap_err();

    assert_eq!(err, ConsoleError::Unauthorized);
    assert!(view.extensions().is_empty());
    assert!(view.is_stale(Collection::Services));
}

#[tokio::test]
async fn test_mounted_view_classifies_against_policy() {
    let transport = backend();
    let (view, _) = mounted(&transport).await;

    let classes: Vec<(String, Classification)> = view
        .classified_extensions()
        .into_iter()
        .map(|(e, c)| (e.name.clone(), c))
        .collect();
    assert_eq!(
        classes,
        vec![
            ("prettier".to_string(), Classification::Whitelisted),
            ("EvilExt".to_string(), Classification::Blacklisted),
            ("uBlock Origin".to_string(), Classification::Unclassified),
        ]
    );
    assert_eq!(view.non_compliant().len(), 2);

    let query = ExtensionQuery { tab: ExtensionTab::Blacklisted, search: "evil".to_string() };
    assert_eq!(view.filtered_extensions(&query).len(), 1);
}

// ============================================================================
// OPTIMISTIC REMOVAL
// ============================================================================

#[tokio::test]
async fn test_uninstall_removes_item_without_refetch() {
    let transport = backend();
    transport.on(Method::Delete, "/api/devices/lab-pc-01/software/foo", Ok(json!({ "status": "queued" })));
    let (mut view, dispatcher) = mounted(&transport).await;
    let fetches = transport.calls_to(Method::Get, SOFTWARE_PATH);

    let outcome = assert_ok!(view.dispatch(&dispatcher, &Command::uninstall(DEVICE, "foo")).await);

    assert_eq!(outcome.effect, LocalEffect::Removed { collection: Collection::Software, count: 1 });
    assert!(!software_names(&view).contains(&"foo"));
    assert_eq!(transport.calls_to(Method::Get, SOFTWARE_PATH), fetches);
    assert!(!view.is_stale(Collection::Software));
}

#[tokio::test]
async fn test_kill_only_drops_process_entries() {
    let transport = backend();
    transport.on(
        Method::Post,
        "/api/devices/lab-pc-01/processes/firefox/kill",
        Ok(json!({ "status": "kill queued" })),
    );
    let (mut view, dispatcher) = mounted(&transport).await;
    assert_eq!(view.processes().len(), 2);

    let outcome = view
        .dispatch(&dispatcher, &Command::kill(DEVICE, "firefox", KillMode::Forever))
        .await
        .unwrap();

    assert_eq!(outcome.effect, LocalEffect::Removed { collection: Collection::Software, count: 1 });
    assert_eq!(software_names(&view), vec!["foo", "firefox", "steam"]);
    let processes: Vec<&str> = view.processes().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(processes, vec!["steam"]);
    assert_eq!(transport.calls()[transport.call_count() - 1].body, Some(json!({ "mode": "forever" })));
}

#[tokio::test]
async fn test_extension_removal_is_optimistic() {
    let transport = backend();
    transport.on(
        Method::Delete,
        "/api/devices/lab-pc-01/extensions/EvilExt",
        Ok(json!({ "status": "removal queued" })),
    );
    let (mut view, dispatcher) = mounted(&transport).await;

    assert_ok!(view.dispatch(&dispatcher, &Command::remove_extension(DEVICE, "EvilExt")).await);

    assert_eq!(view.extensions().len(), 2);
    assert!(view.extensions().iter().all(|e| e.name != "EvilExt"));
}

#[tokio::test]
async fn test_failed_dispatch_leaves_state_untouched() {
    let transport = backend();
    transport.on(
        Method::Delete,
        "/api/devices/lab-pc-01/software/foo",
        Err(ConsoleError::Server { status: 500 }),
    );
    let (mut view, dispatcher) = mounted(&transport).await;
    let before = view.software().to_vec();

    let err = assert_err!(view.dispatch(&dispatcher, &Command::uninstall(DEVICE, "foo")).await);

    assert_eq!(err.kind(), ErrorKind::NetworkFailure);
    assert_eq!(view.software(), before.as_slice());
    assert_eq!(view.history().count(), 0);
}

// ============================================================================
// SERVICE RE-FETCH
// ============================================================================

#[tokio::test]
async fn test_service_stop_waits_for_refetch() {
    let transport = MockTransport::new();
    transport
        .on(
            Method::Get,
            SERVICES_PATH,
            Ok(json!([{ "name": "bar", "status": "running", "startup": "auto" }])),
        )
        .on(
            Method::Get,
            SERVICES_PATH,
            Ok(json!([{ "name": "bar", "status": "stopped", "startup": "auto" }])),
        )
        .on(
            Method::Post,
            "/api/devices/lab-pc-01/services/bar/stop",
            Ok(json!({ "status": "queued", "action": "stop" })),
        );
    let dispatcher = CommandDispatcher::new(client(&transport), Duration::from_secs(5));
    let mut view = DeviceView::new(DEVICE);
    view.refresh(dispatcher.client(), Collection::Services).await.unwrap();

    let outcome = view
        .dispatch(&dispatcher, &Command::service(DEVICE, "bar", Action::Stop))
        .await
        .unwrap();

    assert_eq!(outcome.effect, LocalEffect::RefetchPending(Collection::Services));
    assert_eq!(view.services()[0].status, LifecycleState::Running);
    assert!(view.is_stale(Collection::Services));

    view.refresh(dispatcher.client(), Collection::Services).await.unwrap();
    assert_eq!(view.services()[0].status, LifecycleState::Stopped);
    assert!(!view.is_stale(Collection::Services));
}

#[tokio::test]
async fn test_reconcile_fetches_only_stale_collections() {
    let transport = backend();
    transport.on(Method::Post, "/api/devices/lab-pc-01/services/bar/restart", Ok(json!({ "status": "queued" })));
    let (mut view, dispatcher) = mounted(&transport).await;
    let software_fetches = transport.calls_to(Method::Get, SOFTWARE_PATH);

    view.dispatch(&dispatcher, &Command::service(DEVICE, "bar", Action::Restart))
        .await
        .unwrap();
    let refreshed = view.reconcile(dispatcher.client()).await.unwrap();

    assert_eq!(refreshed, vec![Collection::Services]);
    assert_eq!(transport.calls_to(Method::Get, SERVICES_PATH), 2);
    assert_eq!(transport.calls_to(Method::Get, SOFTWARE_PATH), software_fetches);
    assert!(view.stale_collections().is_empty());
}

#[tokio::test]
async fn test_dispatch_and_reconcile_keeps_ack_when_refetch_fails() {
    let transport = MockTransport::new();
    transport
        .on(Method::Get, SERVICES_PATH, Ok(json!([{ "name": "bar", "status": "running" }])))
        .on(Method::Get, SERVICES_PATH, Err(ConsoleError::Network("refused".to_string())))
        .on(Method::Post, "/api/devices/lab-pc-01/services/bar/disable", Ok(json!({ "status": "queued" })));
    let dispatcher = CommandDispatcher::new(client(&transport), Duration::from_secs(5));
    let mut view = DeviceView::new(DEVICE);
    view.refresh(dispatcher.client(), Collection::Services).await.unwrap();

    let outcome = assert_ok!(
        view.dispatch_and_reconcile(&dispatcher, &Command::service(DEVICE, "bar", Action::Disable))
            .await
    );

    assert_eq!(outcome.ack.state, CommandState::Queued);
    assert_eq!(outcome.refetch_error, Some(ConsoleError::Network("refused".to_string())));
    assert!(view.is_stale(Collection::Services));
    assert_eq!(view.services().len(), 1);
}

#[tokio::test]
async fn test_dispatch_and_reconcile_refetches_services() {
    let transport = MockTransport::new();
    transport
        .on(
            Method::Get,
            SERVICES_PATH,
            Ok(json!([{ "name": "bar", "status": "running", "startup": "auto" }])),
        )
        .on(
            Method::Get,
            SERVICES_PATH,
            Ok(json!([{ "name": "bar", "status": "stopped", "startup": "auto" }])),
        )
        .on(
            Method::Post,
            "/api/devices/lab-pc-01/services/bar/stop",
            Ok(json!({ "status": "queued", "action": "stop" })),
        );
    let dispatcher = CommandDispatcher::new(client(&transport), Duration::from_secs(5));
    let mut view = DeviceView::new(DEVICE);
    view.refresh(dispatcher.client(), Collection::Services).await.unwrap();
    let fetches = transport.calls_to(Method::Get, SERVICES_PATH);

    let outcome = assert_ok!(
        view.dispatch_and_reconcile(&dispatcher, &Command::service(DEVICE, "bar", Action::Stop))
            .await
    );

    assert_eq!(outcome.effect, LocalEffect::RefetchPending(Collection::Services));
    assert_eq!(outcome.refetch_error, None);
    assert_eq!(view.services()[0].status, LifecycleState::Stopped);
    assert!(!view.is_stale(Collection::Services));
    assert_eq!(transport.calls_to(Method::Get, SERVICES_PATH), fetches + 1);
}

// ============================================================================
// LEDGER / SCOPING
// ============================================================================

#[tokio::test]
async fn test_command_for_other_device_rejected() {
    let transport = backend();
    let (mut view, dispatcher) = mounted(&transport).await;
    let calls = transport.call_count();

    let err = view
        .dispatch(&dispatcher, &Command::device("ws-7", Action::Lock))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ValidationFailure);
    assert_eq!(transport.call_count(), calls);
}

#[tokio::test]
async fn test_history_is_bounded_and_queued_only() {
    let transport = MockTransport::new();
    transport.on(Method::Post, "/api/devices/lab-pc-01/action/lock", Ok(json!({ "status": "lock requested" })));
    let dispatcher = CommandDispatcher::new(client(&transport), Duration::from_secs(5));
    let mut view = DeviceView::new(DEVICE);

    for _ in 0..MAX_HISTORY + 3 {
        let outcome = view
            .dispatch(&dispatcher, &Command::device(DEVICE, Action::Lock))
            .await
            .unwrap();
        assert_eq!(outcome.effect, LocalEffect::None);
    }

    assert_eq!(view.history().count(), MAX_HISTORY);
    assert!(view.history().all(|ack| ack.state == CommandState::Queued));
}
