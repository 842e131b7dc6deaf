//! Tests for the update coordinator
//!
//! - Full vs delta selection
//! - Missing timestamp fails before any network call
//! - Cancellation suppresses installation and late results
//! - Installation, once started, cannot be cancelled
//! - Only one request in flight

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use storm_content::{
    BundleKind, FetchError, InstallError, UpdateCoordinator, UpdateError, UpdateOutcome,
    UpdateReport, UpdateState,
};

use super::support::{FixedTimestamp, GatedInstaller, MockTransport, RecordingInstaller, Reply};

fn coordinator(
    timestamp: Option<i64>,
    reply: Reply,
) -> (
    Arc<UpdateCoordinator>,
    Arc<MockTransport>,
    Arc<RecordingInstaller>,
) {
    let transport = Arc::new(MockTransport::new(reply));
    let installer = Arc::new(RecordingInstaller::default());
    let coordinator = Arc::new(UpdateCoordinator::new(
        Arc::new(FixedTimestamp(timestamp)),
        transport.clone(),
        installer.clone(),
    ));
    (coordinator, transport, installer)
}

#[tokio::test]
async fn test_check_for_bundle_fetches_full_and_installs() {
    let (coordinator, transport, installer) =
        coordinator(Some(100), Reply::Bundle(vec![1, 2, 3]));

    let outcome = coordinator.check_for_bundle().await.unwrap();

    assert_eq!(
        outcome,
        UpdateOutcome::Completed(UpdateReport {
            kind: BundleKind::Full,
            size_bytes: 3,
        })
    );
    assert_eq!(transport.full_calls.load(Ordering::SeqCst), 1);
    assert_eq!(transport.delta_calls.load(Ordering::SeqCst), 0);
    assert_eq!(*installer.applied.lock().unwrap(), vec![(BundleKind::Full, 3)]);
    assert_eq!(coordinator.state(), UpdateState::Idle);
}

#[tokio::test]
async fn test_check_for_updates_uses_manifest_timestamp() {
    let (coordinator, transport, installer) =
        coordinator(Some(1_422_353_600), Reply::Bundle(vec![9]));

    let outcome = coordinator.check_for_updates().await.unwrap();

    assert!(outcome.is_completed());
    assert_eq!(*transport.last_since.lock().unwrap(), Some(1_422_353_600));
    assert_eq!(transport.full_calls.load(Ordering::SeqCst), 0);
    assert_eq!(
        installer.applied.lock().unwrap()[0].0,
        BundleKind::Delta {
            since: 1_422_353_600
        }
    );
}

#[tokio::test]
async fn test_check_for_updates_without_timestamp_makes_no_calls() {
    let (coordinator, transport, installer) = coordinator(None, Reply::Bundle(vec![1]));

    let result = coordinator.check_for_updates().await;

    assert!(matches!(result, Err(UpdateError::InvalidState(_))));
    assert_eq!(transport.total_calls(), 0);
    assert_eq!(installer.count(), 0);
    assert_eq!(coordinator.state(), UpdateState::Idle);
}

#[tokio::test]
async fn test_explicit_timestamp_ignores_manifest() {
    let (coordinator, transport, _installer) = coordinator(None, Reply::NothingNew);

    let outcome = coordinator.check_for_updates_since(42).await.unwrap();

    assert_eq!(outcome, UpdateOutcome::UpToDate);
    assert_eq!(*transport.last_since.lock().unwrap(), Some(42));
}

#[tokio::test]
async fn test_nothing_new_skips_installer() {
    let (coordinator, _transport, installer) = coordinator(Some(1), Reply::NothingNew);

    assert_eq!(
        coordinator.check_for_updates().await.unwrap(),
        UpdateOutcome::UpToDate
    );
    assert_eq!(installer.count(), 0);
}

#[tokio::test]
async fn test_transport_failure_is_surfaced_not_retried() {
    let (coordinator, transport, installer) = coordinator(Some(1), Reply::Fail(503));

    let result = coordinator.check_for_bundle().await;

    assert!(matches!(
        result,
        Err(UpdateError::Transport(FetchError::HttpError(503)))
    ));
    assert_eq!(transport.total_calls(), 1);
    assert_eq!(installer.count(), 0);
    assert_eq!(coordinator.state(), UpdateState::Idle);
}

#[tokio::test]
async fn test_install_failure_is_surfaced() {
    let transport = Arc::new(MockTransport::new(Reply::Bundle(vec![1])));
    let coordinator = UpdateCoordinator::new(
        Arc::new(FixedTimestamp(Some(1))),
        transport,
        Arc::new(RecordingInstaller::failing()),
    );

    let result = coordinator.check_for_bundle().await;

    assert!(matches!(
        result,
        Err(UpdateError::Install(InstallError::Io(_)))
    ));
}

#[tokio::test]
async fn test_cancel_before_completion_suppresses_install() {
    let (coordinator, transport, installer) = coordinator(Some(1), Reply::Gated(vec![1, 2]));

    let task = {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move { coordinator.check_for_updates().await })
    };

    transport.started.notified().await;
    assert_eq!(coordinator.state(), UpdateState::Requesting);
    assert!(coordinator.cancel_pending_requests());

    // A late response must not be delivered
    transport.release.notify_one();

    let outcome = task.await.unwrap().unwrap();
    assert_eq!(outcome, UpdateOutcome::Cancelled);
    assert_eq!(installer.count(), 0);
    assert_eq!(coordinator.state(), UpdateState::Idle);
}

#[tokio::test]
async fn test_cancel_with_nothing_pending() {
    let (coordinator, _transport, _installer) = coordinator(Some(1), Reply::NothingNew);
    assert!(!coordinator.cancel_pending_requests());
}

#[tokio::test]
async fn test_concurrent_check_is_refused() {
    let (coordinator, transport, installer) = coordinator(Some(1), Reply::Gated(vec![7]));

    let first = {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move { coordinator.check_for_bundle().await })
    };
    transport.started.notified().await;

    let second = coordinator.check_for_updates().await;
    assert!(matches!(second, Err(UpdateError::AlreadyInProgress)));

    transport.release.notify_one();
    let outcome = tokio::time::timeout(Duration::from_secs(5), first)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert!(outcome.is_completed());
    assert_eq!(installer.count(), 1);
    assert_eq!(transport.total_calls(), 1);
}

#[tokio::test]
async fn test_new_request_allowed_after_cancellation() {
    let (coordinator, transport, _installer) = coordinator(Some(1), Reply::Gated(vec![1]));

    let task = {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move { coordinator.check_for_bundle().await })
    };
    transport.started.notified().await;
    coordinator.cancel_pending_requests();
    assert_eq!(task.await.unwrap().unwrap(), UpdateOutcome::Cancelled);

    let retry = {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move { coordinator.check_for_bundle().await })
    };
    transport.started.notified().await;
    transport.release.notify_one();
    assert!(retry.await.unwrap().unwrap().is_completed());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancel_during_install_is_refused() {
    let installer = Arc::new(GatedInstaller::new());
    let coordinator = Arc::new(UpdateCoordinator::new(
        Arc::new(FixedTimestamp(None)),
        Arc::new(MockTransport::new(Reply::Bundle(vec![5]))),
        installer.clone(),
    ));

    let task = {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move { coordinator.check_for_bundle().await })
    };
    installer.entered.notified().await;

    assert_eq!(coordinator.state(), UpdateState::Installing);
    assert!(!coordinator.cancel_pending_requests());

    installer.release();
    let outcome = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(
        outcome,
        UpdateOutcome::Completed(UpdateReport {
            kind: BundleKind::Full,
            size_bytes: 1,
        })
    );
    assert_eq!(installer.applied.load(Ordering::SeqCst), 1);
    assert_eq!(coordinator.state(), UpdateState::Idle);
}
