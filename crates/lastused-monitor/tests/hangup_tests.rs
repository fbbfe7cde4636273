//! SIGHUP handling of the tokio scheduler
//!
//! Kept in its own test binary: the signal reaches every listener in the
//! process, so it would wake waits in unrelated tests.

#![cfg(unix)]

use lastused_monitor::{Scheduler, TokioScheduler};
use nix::sys::signal::{raise, Signal};
use std::time::{Duration, Instant};

#[tokio::test]
async fn test_hangup_cuts_wait_short() {
    // handler registered before the signal is raised
    let mut scheduler = TokioScheduler::wake_on_hangup().unwrap();

    let sender = tokio::spawn(async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        raise(Signal::SIGHUP).unwrap();
    });

    let start = Instant::now();
    let woken = tokio::time::timeout(
        Duration::from_secs(30),
        scheduler.wait(Duration::from_secs(3600)),
    )
    .await;
    sender.await.unwrap();

    assert!(woken.is_ok(), "wait did not return after SIGHUP");
    assert!(start.elapsed() < Duration::from_secs(30));
}

#[tokio::test]
async fn test_scheduler_without_hangup_handler_sleeps_full_interval() {
    let mut scheduler = TokioScheduler::new();

    let woken = tokio::time::timeout(
        Duration::from_millis(100),
        scheduler.wait(Duration::from_secs(3600)),
    )
    .await;

    assert!(woken.is_err());
}
