//! Integration tests for reconnection
//!
//! These tests drive the connection manager against a scripted transport on
//! a paused clock, so reconnect delays can be measured exactly.

mod common;

use common::*;
use dashsocket::*;
use std::sync::Arc;
use std::time::Duration;

/// Macro for verbose test output
macro_rules! verbose_println {
    ($($arg:tt)*) => {
        if std::env::var("TEST_VERBOSE").is_ok() {
            println!($($arg)*);
        }
    };
}

/// Timer tolerance on the paused clock (millisecond tick rounding)
const SLACK: Duration = Duration::from_millis(5);

fn assert_gap(gap: Duration, expected: Duration) {
    assert!(
        gap >= expected && gap <= expected + SLACK,
        "expected a gap of {:?}, got {:?}",
        expected,
        gap
    );
}

fn quiet_notifier() -> Arc<dyn DesktopNotifier> {
    Arc::new(NoopNotifier)
}

#[tokio::test(start_paused = true)]
async fn test_linear_schedule_until_exhausted() {
    verbose_println!("Testing 1s..5s schedule against a server that never answers...");

    let connector = MockConnector::always_refuse();
    let (manager, _registry) = manager_with(connector.clone(), quiet_notifier());

    manager.connect();
    tokio::time::sleep(Duration::from_secs(30)).await;

    // Initial attempt plus five reconnects
    assert_eq!(connector.attempt_count(), 6);
    let gaps = connector.gaps();
    verbose_println!("  Gaps: {:?}", gaps);
    for (gap, secs) in gaps.iter().zip(1..=5u64) {
        assert_gap(*gap, Duration::from_secs(secs));
    }

    assert_eq!(manager.connection_state(), ConnectionState::Exhausted);
    assert!(!manager.has_pending_reconnect());
    assert_eq!(manager.reconnect_attempts(), 5);

    // The sixth close must not schedule anything
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(connector.attempt_count(), 6);
}

#[tokio::test(start_paused = true)]
async fn test_lifecycle_feed_reports_schedule() {
    let connector = MockConnector::always_refuse();
    let (manager, _registry) = manager_with(connector, quiet_notifier());

    manager.connect();
    tokio::time::sleep(Duration::from_secs(30)).await;

    let events = drain_events(&manager);
    let scheduled: Vec<(usize, Duration)> = events
        .iter()
        .filter_map(|event| match event {
            ClientEvent::Reconnecting { attempt, delay } => Some((*attempt, *delay)),
            _ => None,
        })
        .collect();

    assert_eq!(
        scheduled,
        (1..=5)
            .map(|n| (n, Duration::from_secs(n as u64)))
            .collect::<Vec<_>>()
    );
    assert_eq!(events.last(), Some(&ClientEvent::Exhausted { attempts: 5 }));
    assert_eq!(
        events.iter().filter(|e| matches!(e, ClientEvent::Error(_))).count(),
        6
    );
}

#[tokio::test(start_paused = true)]
async fn test_successful_open_resets_schedule() {
    verbose_println!("Testing manual connect after exhaustion...");

    let (connector, mut sessions) = MockConnector::new(vec![Plan::Refuse; 6], Plan::Refuse);
    let (manager, _registry) = manager_with(connector.clone(), quiet_notifier());

    manager.connect();
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(manager.connection_state(), ConnectionState::Exhausted);

    // Manual connect that succeeds
    connector.push_plan(Plan::Accept);
    manager.connect();
    settle().await;
    assert!(manager.is_connected());
    assert_eq!(manager.reconnect_attempts(), 0);

    let session = sessions.recv().await.expect("accepted session");
    let _ = drain_events(&manager);

    // Server drops the connection: the schedule restarts at 1s
    let closed_at = tokio::time::Instant::now();
    session.close();
    settle().await;
    assert_eq!(manager.connection_state(), ConnectionState::Closed);
    assert!(manager.has_pending_reconnect());

    let events = drain_events(&manager);
    assert!(events.contains(&ClientEvent::Reconnecting {
        attempt: 1,
        delay: Duration::from_secs(1),
    }));

    let before = connector.attempt_count();
    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert_eq!(connector.attempt_count(), before + 1);

    let times = connector.attempt_times();
    assert_gap(times[before] - closed_at, Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_reaches_open_again() {
    let (connector, mut sessions) =
        MockConnector::new(vec![Plan::Accept, Plan::Refuse, Plan::Accept], Plan::Refuse);
    let (manager, registry) = manager_with(connector.clone(), quiet_notifier());
    let (connected, _sub) = capture(&registry, CONNECTED_KEY);

    manager.connect();
    settle().await;
    sessions.recv().await.expect("first session").close();

    // 1s to the refused attempt, 2s more to the accepted one
    tokio::time::sleep(Duration::from_secs(4)).await;
    assert!(manager.is_connected());
    assert_eq!(connector.attempt_count(), 3);
    assert_eq!(manager.reconnect_attempts(), 0);
    assert_eq!(manager.metrics().reconnect_count, 2);

    let flags: Vec<bool> = connected
        .lock()
        .iter()
        .filter_map(|v| v.as_bool())
        .collect();
    assert_eq!(flags, vec![true, false, false, true]);
}

#[tokio::test(start_paused = true)]
async fn test_custom_strategy_is_used() {
    let connector = MockConnector::always_refuse();
    let registry = SubscriptionRegistry::new();
    let manager = dashsocket::builder()
        .url(TEST_URL)
        .router(MessageRouter::new(registry, quiet_notifier()))
        .connector(connector.clone())
        .reconnect_strategy(FixedDelay::new(Duration::from_millis(250), Some(3)))
        .build()
        .unwrap();

    manager.connect();
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(connector.attempt_count(), 4);
    for gap in connector.gaps() {
        assert_gap(gap, Duration::from_millis(250));
    }
    assert_eq!(manager.connection_state(), ConnectionState::Exhausted);
}

#[test]
fn test_exponential_backoff_full_sequence() {
    verbose_println!("Testing exponential backoff full sequence...");

    let strategy = ExponentialBackoff::new(
        Duration::from_millis(100),
        Duration::from_secs(10),
        Some(5),
    );

    let expected_delays = [100, 200, 400, 800, 1600];

    for (attempt, &expected_ms) in expected_delays.iter().enumerate() {
        let delay = strategy.next_delay(attempt).unwrap();
        verbose_println!("  Attempt {}: {:?}", attempt, delay);
        assert_eq!(
            delay.as_millis(),
            expected_ms,
            "Unexpected delay at attempt {}",
            attempt
        );
    }

    assert!(
        strategy.next_delay(5).is_none(),
        "Should return None after max attempts"
    );
}

#[test]
fn test_linear_backoff_custom_base() {
    let strategy = LinearBackoff::new(Duration::from_millis(250), 3);

    let delays: Vec<u128> = (0..3)
        .map(|i| strategy.next_delay(i).unwrap().as_millis())
        .collect();

    assert_eq!(delays, vec![250, 500, 750]);
    assert!(!strategy.should_reconnect(3));
    assert_eq!(strategy.max_attempts(), Some(3));
}
