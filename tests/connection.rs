//! Background connection and application lifecycle against an in-memory engine.

#[path = "fixtures/fake_engine.rs"]
mod fake_engine;

use fake_engine::{FakeEngine, FakeFile};
use std::sync::Arc;
use std::time::{Duration, Instant};
use vortex_core::backend::{ConnectionEstablisher, ConnectionHandle, ConnectionState, RetryPolicy};
use vortex_core::context::AppContext;
use vortex_core::utils::AppConfig;

fn quick_policy(attempts: u32) -> RetryPolicy {
    RetryPolicy {
        warmup: Duration::from_millis(5),
        attempts,
        interval: Duration::from_millis(5),
    }
}

#[test]
fn test_connects_after_retries() {
    let engine = Arc::new(FakeEngine::new(vec![]).connects_after(3));
    let handle = ConnectionHandle::new();
    let establisher =
        ConnectionEstablisher::new(engine.clone(), "vortex_backend", quick_policy(5), handle.clone());

    let thread = establisher.spawn().unwrap();
    assert_eq!(handle.wait(Duration::from_secs(5)), ConnectionState::Connected);
    assert_eq!(thread.join().unwrap(), ConnectionState::Connected);

    assert_eq!(engine.calls().connect, 4);
    assert!(handle.client().is_some());
}

#[test]
fn test_gives_up_after_bounded_attempts() {
    let engine = Arc::new(FakeEngine::new(vec![]).never_connects());
    let handle = ConnectionHandle::new();
    let establisher =
        ConnectionEstablisher::new(engine.clone(), "vortex_backend", quick_policy(4), handle.clone());

    assert_eq!(establisher.run(), ConnectionState::GaveUp);
    assert_eq!(engine.calls().connect, 4);
    assert!(handle.client().is_none());

    // Terminal: running again does not retry
    assert_eq!(establisher.run(), ConnectionState::GaveUp);
    assert_eq!(engine.calls().connect, 4);
}

#[test]
fn test_cancel_interrupts_retry_sleep() {
    let engine = Arc::new(FakeEngine::new(vec![]).never_connects());
    let handle = ConnectionHandle::new();
    let policy = RetryPolicy {
        warmup: Duration::ZERO,
        attempts: 1_000,
        interval: Duration::from_secs(60),
    };
    let establisher = ConnectionEstablisher::new(engine.clone(), "vortex_backend", policy, handle.clone());

    let started = Instant::now();
    let thread = establisher.spawn().unwrap();
    while engine.calls().connect == 0 {
        std::thread::sleep(Duration::from_millis(1));
    }
    handle.cancel();

    assert_eq!(thread.join().unwrap(), ConnectionState::Cancelled);
    assert!(started.elapsed() < Duration::from_secs(30));
    assert_eq!(engine.calls().connect, 1);
}

#[test]
fn test_callers_do_not_block_while_connecting() {
    let engine = Arc::new(FakeEngine::new(vec![FakeFile::file(r"C:\a.txt", 1)]));
    let handle = ConnectionHandle::new();
    let policy = RetryPolicy {
        warmup: Duration::from_secs(60),
        attempts: 1,
        interval: Duration::ZERO,
    };
    let establisher = ConnectionEstablisher::new(engine.clone(), "vortex_backend", policy, handle.clone());
    let thread = establisher.spawn().unwrap();

    while handle.state() == ConnectionState::Disconnected {
        std::thread::sleep(Duration::from_millis(1));
    }

    let started = Instant::now();
    assert!(handle.client().is_none());
    assert_eq!(handle.state(), ConnectionState::Connecting);
    assert_eq!(handle.wait(Duration::from_millis(20)), ConnectionState::Connecting);
    assert!(started.elapsed() < Duration::from_secs(1));

    handle.cancel();
    thread.join().unwrap();
}

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.engine.warmup_ms = 0;
    config.engine.connect_attempts = 3;
    config.engine.retry_interval_ms = 5;
    config
}

#[test]
fn test_context_query_and_shutdown() {
    let engine = Arc::new(FakeEngine::new(vec![
        FakeFile::file(r"C:\Docs\report.docx", 10),
        FakeFile::folder(r"C:\Docs"),
    ]));
    let mut ctx = AppContext::new(test_config(), engine.clone());
    ctx.connect_in_background().unwrap();

    assert_eq!(
        ctx.connection().wait(Duration::from_secs(5)),
        ConnectionState::Connected
    );

    let results = ctx.query_builder().search_for("report").query();
    assert_eq!(results.len(), 1);

    ctx.shutdown();
    assert_eq!(engine.calls().destroy_client, 1);
    assert_eq!(engine.live_handles(), (0, 0, 0));

    // Idempotent, including the implicit shutdown on drop
    ctx.shutdown();
    drop(ctx);
    assert_eq!(engine.calls().destroy_client, 1);
    assert!(!engine.saw_bad_destroy());
}

#[test]
fn test_context_without_connection_returns_empty() {
    let engine = Arc::new(FakeEngine::new(vec![FakeFile::file(r"C:\a.txt", 1)]).never_connects());
    let mut ctx = AppContext::new(test_config(), engine.clone());
    ctx.connect_in_background().unwrap();

    assert_eq!(
        ctx.connection().wait(Duration::from_secs(5)),
        ConnectionState::GaveUp
    );
    assert!(ctx.query_builder().search_for("a").query().is_empty());
    assert_eq!(engine.calls().search, 0);
}

#[test]
fn test_context_shutdown_while_connecting() {
    let engine = Arc::new(FakeEngine::new(vec![]));
    let mut config = test_config();
    config.engine.warmup_ms = 60_000;
    let mut ctx = AppContext::new(config, engine.clone());
    ctx.connect_in_background().unwrap();

    let started = Instant::now();
    ctx.shutdown();
    assert!(started.elapsed() < Duration::from_secs(30));
    assert_eq!(ctx.connection().state(), ConnectionState::Cancelled);
    assert_eq!(engine.calls().connect, 0);
}
