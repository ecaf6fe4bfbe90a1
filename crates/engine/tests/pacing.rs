//! Pacing and dispatch-handoff integration tests.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use mock::{wait_until, ChannelDispatcher, Journal, ProbeStep, StopSlot, TraceEvent};
use step_engine::{CycleIterator, StepEngine};

fn journal() -> Arc<Journal> {
    Arc::new(Journal::default())
}

fn gap(journal: &Journal, first: &TraceEvent, second: &TraceEvent) -> Duration {
    let t1 = journal.timestamp_of(first).expect("first event recorded");
    let t2 = journal.timestamp_of(second).expect("second event recorded");
    t2.duration_since(t1)
}

/// A quick step with a preferred duration delays the next step by at
/// least that budget.
#[test]
fn pacing_enforces_minimum_duration() {
    let journal = journal();
    let slot = StopSlot::default();
    let steps = vec![
        ProbeStep::new("paced", &journal)
            .paced(Duration::from_millis(80))
            .shared(),
        ProbeStep::new("after", &journal).stops(&slot).shared(),
    ];
    let mut engine = StepEngine::new(CycleIterator::new(steps).unwrap()).unwrap();
    slot.fill(engine.stop_handle());

    engine.go().unwrap();

    // The first timestamp lands a hair after the iteration's start, so
    // allow a little slop below the 80ms budget.
    let gap = gap(
        &journal,
        &TraceEvent::Executed("paced"),
        &TraceEvent::Executed("after"),
    );
    assert!(gap >= Duration::from_millis(70), "gap was {gap:?}");
}

/// A step that overruns its budget gets no compensating sleep; the
/// loop moves straight on to the wait.
#[test]
fn no_sleep_when_budget_already_spent() {
    let journal = journal();
    let slot = StopSlot::default();
    let steps = vec![
        ProbeStep::new("slow", &journal)
            .busy(Duration::from_millis(100))
            .paced(Duration::from_millis(50))
            .shared(),
        ProbeStep::new("after", &journal).stops(&slot).shared(),
    ];
    let mut engine = StepEngine::new(CycleIterator::new(steps).unwrap()).unwrap();
    slot.fill(engine.stop_handle());

    engine.go().unwrap();

    let gap = gap(
        &journal,
        &TraceEvent::Executed("slow"),
        &TraceEvent::Executed("after"),
    );
    assert!(gap >= Duration::from_millis(100), "gap was {gap:?}");
    assert!(
        gap < Duration::from_millis(140),
        "overrun must not add the preferred duration on top, gap was {gap:?}"
    );
}

/// Dispatched steps never block the loop; the engine reaches its wait
/// with the task still queued, and only proceed() moves it on.
#[test]
fn dispatch_is_fire_and_forget() {
    let journal = journal();
    let slot = StopSlot::default();
    let (dispatcher, queue) = ChannelDispatcher::new();
    let steps = vec![
        ProbeStep::new("ui", &journal).dispatched().shared(),
        ProbeStep::new("stopper", &journal).stops(&slot).shared(),
    ];
    let mut engine = StepEngine::builder(CycleIterator::new(steps).unwrap())
        .dispatcher(dispatcher)
        .build()
        .unwrap();
    slot.fill(engine.stop_handle());

    let (tx, rx) = crossbeam_channel::bounded(1);
    thread::spawn(move || {
        let _ = tx.send(engine.go());
    });

    // The task is queued, not run; the loop is already past execution.
    assert!(wait_until(Duration::from_secs(2), || queue.pending() == 1));
    assert!(!journal.contains(&TraceEvent::Executed("ui")));

    // And it stays parked until the dispatched work proceeds.
    thread::sleep(Duration::from_millis(30));
    assert!(!journal.contains(&TraceEvent::Executed("stopper")));

    assert!(queue.run_next(Duration::from_secs(1)));

    let result = rx
        .recv_timeout(Duration::from_secs(2))
        .expect("engine terminates once the dispatched step proceeds");
    assert!(result.is_ok());
    assert_eq!(
        journal.events(),
        vec![
            TraceEvent::Init("ui"),
            TraceEvent::Init("stopper"),
            TraceEvent::Executed("ui"),
            TraceEvent::Executed("stopper"),
        ]
    );
}
