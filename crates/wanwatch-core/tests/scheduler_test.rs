#![allow(clippy::unwrap_used)]
// Poll scheduler behaviour under a paused tokio clock.

mod common;

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio::sync::broadcast::error::TryRecvError;
use tokio::time::Instant;

use common::{FakeSource, profile, udm_pair};
use wanwatch_core::{
    ApiFamily, CoreError, ErrorKind, ManualPoll, PollPolicy, PollScheduler, PollState, ProfileId,
    ResolutionMethod, SnapshotRegistry, SpeedTestOutcome, SpeedTestSchedule,
};

const MINUTE: Duration = Duration::from_secs(60);

fn setup() -> (Arc<SnapshotRegistry>, PollScheduler) {
    let registry = Arc::new(SnapshotRegistry::new());
    let scheduler = PollScheduler::new(Arc::clone(&registry));
    (registry, scheduler)
}

// ── Cadence ─────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_first_poll_is_immediate_then_follows_interval() {
    let (registry, scheduler) = setup();
    let mut updates = registry.subscribe();
    let source = FakeSource::new(ApiFamily::Udm, udm_pair());
    let start = Instant::now();

    let state = scheduler
        .add_profile(&profile("home", ApiFamily::Udm), source.clone())
        .await;

    let first = updates.recv().await.unwrap();
    assert_eq!(start.elapsed(), Duration::ZERO);
    assert_eq!(first.resolution.method, ResolutionMethod::Speedtest);
    assert_eq!(*state.borrow(), PollState::Succeeded);

    let _second = updates.recv().await.unwrap();
    assert_eq!(start.elapsed(), 30 * MINUTE);
    assert_eq!(source.wan_calls(), 2);

    scheduler.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_configured_interval_is_clamped_to_floor() {
    let (registry, scheduler) = setup();
    let mut updates = registry.subscribe();
    let mut prof = profile("home", ApiFamily::Udm);
    prof.poll = PollPolicy::with_interval(Duration::from_secs(5));
    let start = Instant::now();

    scheduler
        .add_profile(&prof, FakeSource::new(ApiFamily::Udm, udm_pair()))
        .await;

    updates.recv().await.unwrap();
    updates.recv().await.unwrap();
    assert_eq!(start.elapsed(), 10 * MINUTE);

    scheduler.shutdown().await;
}

// ── Failure handling ────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_transport_failures_back_off_exponentially() {
    let (registry, scheduler) = setup();
    let mut updates = registry.subscribe();
    let source = FakeSource::new(ApiFamily::Udm, udm_pair());
    source.fail_wan_list(&[ErrorKind::Transport, ErrorKind::Transport]);
    let start = Instant::now();

    let mut state = scheduler
        .add_profile(&profile("home", ApiFamily::Udm), source.clone())
        .await;

    let failed = state
        .wait_for(|s| matches!(s, PollState::Failed { .. }))
        .await
        .unwrap()
        .clone();
    assert_eq!(
        failed,
        PollState::Failed {
            attempt: 1,
            retry_in: MINUTE
        }
    );

    updates.recv().await.unwrap();
    // 60 s after the first failure, 120 s after the second
    assert_eq!(start.elapsed(), 3 * MINUTE);
    assert_eq!(source.wan_calls(), 3);

    scheduler.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_failed_cycle_keeps_previous_snapshot() {
    let (registry, scheduler) = setup();
    let mut updates = registry.subscribe();
    let source = FakeSource::new(ApiFamily::Udm, udm_pair());
    let id = ProfileId::from("home");

    let mut state = scheduler
        .add_profile(&profile("home", ApiFamily::Udm), source.clone())
        .await;
    let first = updates.recv().await.unwrap();

    source.fail_wan_list(&[ErrorKind::Decode]);
    state
        .wait_for(|s| matches!(s, PollState::Failed { .. }))
        .await
        .unwrap();

    let current = registry.current(&id).unwrap();
    assert!(Arc::ptr_eq(&current, &first));

    scheduler.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_repeated_auth_failures_suspend_until_manual_poll() {
    let (registry, scheduler) = setup();
    let mut updates = registry.subscribe();
    let source = FakeSource::new(ApiFamily::Udm, udm_pair());
    source.fail_wan_list(&[ErrorKind::Auth, ErrorKind::Auth, ErrorKind::Auth]);
    let id = ProfileId::from("home");
    let start = Instant::now();

    let mut state = scheduler
        .add_profile(&profile("home", ApiFamily::Udm), source.clone())
        .await;

    let suspended = state.wait_for(PollState::is_suspended).await.unwrap().clone();
    assert!(matches!(suspended, PollState::Suspended { .. }));
    assert_eq!(start.elapsed(), 3 * MINUTE);
    assert_eq!(source.wan_calls(), 3);

    // Timer is stopped while suspended.
    tokio::time::sleep(6 * 60 * MINUTE).await;
    assert_eq!(source.wan_calls(), 3);
    assert!(registry.current(&id).is_none());

    let answer = scheduler.request_immediate_poll(&id).await.unwrap();
    assert_eq!(answer, ManualPoll::Started);
    updates.recv().await.unwrap();
    assert_eq!(*state.borrow(), PollState::Succeeded);

    // Regular cadence resumes.
    let resumed_at = Instant::now();
    updates.recv().await.unwrap();
    assert_eq!(resumed_at.elapsed(), 30 * MINUTE);

    scheduler.shutdown().await;
}

// ── Manual polls ────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_manual_poll_inside_spacing_window_is_deferred_once() {
    let (registry, scheduler) = setup();
    let mut updates = registry.subscribe();
    let source = FakeSource::new(ApiFamily::Udm, udm_pair());
    let id = ProfileId::from("home");
    let start = Instant::now();

    scheduler
        .add_profile(&profile("home", ApiFamily::Udm), source.clone())
        .await;
    updates.recv().await.unwrap();

    let first = scheduler.request_immediate_poll(&id).await.unwrap();
    let second = scheduler.request_immediate_poll(&id).await.unwrap();
    assert_eq!(first, ManualPoll::Deferred { after: MINUTE });
    assert_eq!(second, ManualPoll::Deferred { after: MINUTE });

    updates.recv().await.unwrap();
    assert_eq!(start.elapsed(), MINUTE);
    assert_eq!(source.wan_calls(), 2);

    scheduler.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_manual_poll_while_fetching_is_skipped() {
    let (registry, scheduler) = setup();
    let mut updates = registry.subscribe();
    let source = FakeSource::build(
        ApiFamily::Udm,
        udm_pair(),
        Vec::new(),
        Vec::new(),
        Duration::from_secs(30),
    );
    let id = ProfileId::from("home");
    let start = Instant::now();

    let mut state = scheduler
        .add_profile(&profile("home", ApiFamily::Udm), source.clone())
        .await;
    state.wait_for(|s| *s == PollState::Fetching).await.unwrap();

    let answer = scheduler.request_immediate_poll(&id).await.unwrap();
    assert_eq!(answer, ManualPoll::Skipped);

    updates.recv().await.unwrap();
    assert_eq!(start.elapsed(), Duration::from_secs(30));
    assert_eq!(source.wan_calls(), 1);

    scheduler.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_manual_poll_after_window_starts_immediately() {
    let (registry, scheduler) = setup();
    let mut updates = registry.subscribe();
    let source = FakeSource::new(ApiFamily::Udm, udm_pair());
    let id = ProfileId::from("home");

    scheduler
        .add_profile(&profile("home", ApiFamily::Udm), source.clone())
        .await;
    updates.recv().await.unwrap();

    tokio::time::sleep(5 * MINUTE).await;
    let answer = scheduler.request_immediate_poll(&id).await.unwrap();
    assert_eq!(answer, ManualPoll::Started);
    updates.recv().await.unwrap();
    assert_eq!(source.wan_calls(), 2);

    scheduler.shutdown().await;
}

#[tokio::test]
async fn test_unknown_profile_is_reported() {
    let (_registry, scheduler) = setup();
    let err = scheduler
        .request_immediate_poll(&ProfileId::from("nope"))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::ProfileNotFound { .. }));
    assert!(scheduler.remove_profile(&ProfileId::from("nope")).await.is_err());
}

// ── Lifecycle ───────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_remove_cancels_in_flight_cycle() {
    let (registry, scheduler) = setup();
    let mut updates = registry.subscribe();
    let source = FakeSource::build(
        ApiFamily::Udm,
        udm_pair(),
        Vec::new(),
        Vec::new(),
        10 * MINUTE,
    );
    let id = ProfileId::from("home");

    let mut state = scheduler
        .add_profile(&profile("home", ApiFamily::Udm), source.clone())
        .await;
    state.wait_for(|s| *s == PollState::Fetching).await.unwrap();

    scheduler.remove_profile(&id).await.unwrap();
    assert_eq!(source.closed(), 1);
    assert!(scheduler.profiles().await.is_empty());

    tokio::time::sleep(60 * MINUTE).await;
    assert!(registry.current(&id).is_none());
    assert!(matches!(updates.try_recv(), Err(TryRecvError::Empty)));
    assert_eq!(source.wan_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_replacing_profile_stops_previous_loop() {
    let (registry, scheduler) = setup();
    let mut updates = registry.subscribe();
    let old = FakeSource::new(ApiFamily::Udm, udm_pair());
    let new = FakeSource::new(ApiFamily::Udm, Vec::new());

    scheduler
        .add_profile(&profile("home", ApiFamily::Udm), old.clone())
        .await;
    updates.recv().await.unwrap();

    scheduler
        .add_profile(&profile("home", ApiFamily::Udm), new.clone())
        .await;
    assert_eq!(old.closed(), 1);

    let snap = updates.recv().await.unwrap();
    assert_eq!(snap.total_wan_interfaces, 0);
    assert_eq!(scheduler.profiles().await, vec![ProfileId::from("home")]);

    tokio::time::sleep(2 * 60 * MINUTE).await;
    assert_eq!(old.wan_calls(), 1);

    scheduler.shutdown().await;
}

// ── Speed tests ─────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_speed_test_passthrough() {
    let (_registry, scheduler) = setup();
    let legacy = FakeSource::new(ApiFamily::Legacy, Vec::new());
    let udm = FakeSource::new(ApiFamily::Udm, Vec::new());

    scheduler
        .add_profile(&profile("office", ApiFamily::Legacy), legacy.clone())
        .await;
    scheduler
        .add_profile(&profile("home", ApiFamily::Udm), udm)
        .await;

    let accepted = scheduler.start_speed_test(&"office".into()).await.unwrap();
    let unsupported = scheduler.start_speed_test(&"home".into()).await.unwrap();
    assert_eq!(accepted, SpeedTestOutcome::Accepted);
    assert_eq!(unsupported, SpeedTestOutcome::Unsupported);
    assert_eq!(legacy.speed_tests(), 1);

    scheduler.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_scheduled_speed_tests_only_for_legacy() {
    let (_registry, scheduler) = setup();
    let legacy = FakeSource::new(ApiFamily::Legacy, Vec::new());
    let udm = FakeSource::new(ApiFamily::Udm, Vec::new());

    let mut office = profile("office", ApiFamily::Legacy);
    office.speed_test = SpeedTestSchedule::new(true, 15 * MINUTE);
    office.poll = PollPolicy::with_interval(10 * MINUTE);
    let mut home = profile("home", ApiFamily::Udm);
    home.speed_test = SpeedTestSchedule::new(true, 15 * MINUTE);

    scheduler.add_profile(&office, legacy.clone()).await;
    scheduler.add_profile(&home, udm.clone()).await;

    tokio::time::sleep(16 * MINUTE).await;
    assert_eq!(legacy.speed_tests(), 1);
    assert_eq!(udm.speed_tests(), 0);

    tokio::time::sleep(15 * MINUTE).await;
    assert_eq!(legacy.speed_tests(), 2);

    scheduler.shutdown().await;
}
