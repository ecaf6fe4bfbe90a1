//! Smoke test ensuring the fixtures record, queue, and drain cleanly.

use std::sync::Arc;
use std::time::Duration;

use mock::{wait_until, ChannelDispatcher, Journal, TraceEvent};
use step_engine::Dispatcher;

/// Confirms the journal and channel dispatcher behave as plain queues.
#[test]
fn fixtures_record_and_drain() {
    let journal = Journal::default();
    journal.record(TraceEvent::Init("probe"));
    journal.record(TraceEvent::Executed("probe"));
    assert_eq!(
        journal.events(),
        vec![TraceEvent::Init("probe"), TraceEvent::Executed("probe")]
    );
    assert!(journal.timestamp_of(&TraceEvent::Executed("probe")).is_some());

    let (dispatcher, queue) = ChannelDispatcher::new();
    let ran = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let flag = Arc::clone(&ran);
    dispatcher.dispatch(Box::new(move || {
        flag.store(true, std::sync::atomic::Ordering::Release);
    }));
    assert_eq!(queue.pending(), 1);
    assert!(queue.run_next(Duration::from_millis(100)));
    assert!(ran.load(std::sync::atomic::Ordering::Acquire));
    assert!(!queue.run_next(Duration::from_millis(10)));

    assert!(wait_until(Duration::from_millis(50), || true));
}
