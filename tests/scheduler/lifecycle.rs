//! Run lifecycle and repeating tasks.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};

use retrace_foundation::{Duration, Error, Result, Time};
use retrace_scheduler::{
    Clock, EventScheduler, RepeatingTask, RunListener, RunPhase, Scheduler, TaskOutcome,
};

struct TickRecorder {
    times: Mutex<Vec<Time>>,
    clock: Weak<EventScheduler>,
    stop_after: usize,
}

impl RepeatingTask for TickRecorder {
    fn fire(&self) -> TaskOutcome {
        let Some(clock) = self.clock.upgrade() else {
            return TaskOutcome::Stop;
        };
        let mut times = self.times.lock().unwrap();
        times.push(clock.now());
        if times.len() >= self.stop_after {
            TaskOutcome::Stop
        } else {
            TaskOutcome::Continue
        }
    }
}

#[test]
fn repeating_task_fires_on_the_interval() {
    let scheduler = Arc::new(EventScheduler::new());
    let task = Arc::new(TickRecorder {
        times: Mutex::new(Vec::new()),
        clock: Arc::downgrade(&scheduler),
        stop_after: usize::MAX,
    });

    scheduler
        .schedule_repeating(
            Duration::new(3.0),
            Duration::new(3.0),
            Arc::clone(&task) as Arc<dyn RepeatingTask>,
        )
        .unwrap();

    scheduler.run_until(Time::new(10.0));

    assert_eq!(
        *task.times.lock().unwrap(),
        vec![Time::new(3.0), Time::new(6.0), Time::new(9.0)]
    );
}

#[test]
fn stopped_task_leaves_the_queue() {
    let scheduler = Arc::new(EventScheduler::new());
    let task = Arc::new(TickRecorder {
        times: Mutex::new(Vec::new()),
        clock: Arc::downgrade(&scheduler),
        stop_after: 2,
    });

    scheduler
        .schedule_repeating(
            Duration::new(1.0),
            Duration::new(1.0),
            Arc::clone(&task) as Arc<dyn RepeatingTask>,
        )
        .unwrap();

    scheduler.run_until(Time::new(50.0));

    assert_eq!(task.times.lock().unwrap().len(), 2);
    assert_eq!(scheduler.pending_actions(), 0);
}

struct PhaseWatcher {
    started: AtomicUsize,
    ended: AtomicUsize,
}

impl RunListener for PhaseWatcher {
    fn run_started(&self) -> Result<()> {
        self.started.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn run_ended(&self) {
        self.ended.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn lifecycle_signals_reach_subscribers_once() {
    let scheduler = EventScheduler::new();
    let watcher = Arc::new(PhaseWatcher {
        started: AtomicUsize::new(0),
        ended: AtomicUsize::new(0),
    });
    scheduler.subscribe(Arc::downgrade(&watcher) as Weak<dyn RunListener>);

    assert_eq!(scheduler.phase(), RunPhase::Pending);

    scheduler.start_run().unwrap();
    assert!(scheduler.phase().is_running());

    scheduler.run_until(Time::new(5.0));
    scheduler.end_run();
    scheduler.end_run(); // idempotent

    assert!(scheduler.phase().has_ended());
    assert_eq!(watcher.started.load(Ordering::SeqCst), 1);
    assert_eq!(watcher.ended.load(Ordering::SeqCst), 1);
}

#[test]
fn scheduling_is_rejected_after_the_run_ends() {
    let scheduler = EventScheduler::new();
    scheduler.start_run().unwrap();
    scheduler.run_until(Time::new(5.0));
    scheduler.end_run();

    let result = scheduler.schedule(Duration::new(1.0), || {});
    assert!(matches!(
        result,
        Err(Error::RunEnded { ended_at }) if ended_at == Time::new(5.0)
    ));
}

struct RefusingListener;

impl RunListener for RefusingListener {
    fn run_started(&self) -> Result<()> {
        Err(Error::internal("pruning task could not be scheduled"))
    }
}

#[test]
fn a_failing_listener_aborts_run_start() {
    let scheduler = EventScheduler::new();
    let listener = Arc::new(RefusingListener);
    scheduler.subscribe(Arc::downgrade(&listener) as Weak<dyn RunListener>);

    assert!(scheduler.start_run().is_err());
}
