//! Timer abstraction for sessions.
//!
//! Sessions never call `tokio::time` directly; they go through a
//! [`Scheduler`], so tests can drive debounce and periodic timers with a
//! virtual clock ([`ManualScheduler`]).

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::oneshot;

/// A unit of work run when a timer fires.
pub type Task = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Handle to a scheduled task.
///
/// Dropping the handle cancels the timer if it has not fired yet. A task
/// that is already running is never interrupted.
#[derive(Debug)]
pub struct TimerHandle {
    cancelled: Arc<AtomicBool>,
    wake: Option<oneshot::Sender<()>>,
}

impl TimerHandle {
    fn new(wake: Option<oneshot::Sender<()>>) -> (Self, Arc<AtomicBool>) {
        let cancelled = Arc::new(AtomicBool::new(false));
        (
            Self {
                cancelled: Arc::clone(&cancelled),
                wake,
            },
            cancelled,
        )
    }

    /// Cancel the timer.
    pub fn cancel(self) {}
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
        if let Some(wake) = self.wake.take() {
            let _ = wake.send(());
        }
    }
}

/// Runs tasks after a delay and tells the time.
pub trait Scheduler: Send + Sync {
    /// Run `task` after `delay`.
    fn schedule(&self, delay: Duration, task: Task) -> TimerHandle;

    /// Current time in milliseconds.
    fn now_ms(&self) -> u64;
}

/// Scheduler backed by the Tokio runtime and the system clock.
///
/// `schedule` must be called from within a Tokio runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioScheduler;

impl TokioScheduler {
    /// Create a new scheduler.
    pub fn new() -> Self {
        Self
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: Task) -> TimerHandle {
        let (wake_tx, wake_rx) = oneshot::channel();
        let (handle, cancelled) = TimerHandle::new(Some(wake_tx));
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = wake_rx => return,
            }
            if !cancelled.load(Ordering::SeqCst) {
                task.await;
            }
        });
        handle
    }

    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

struct ManualEntry {
    due_ms: u64,
    seq: u64,
    cancelled: Arc<AtomicBool>,
    task: Task,
}

#[derive(Default)]
struct ManualInner {
    now_ms: u64,
    seq: u64,
    entries: Vec<ManualEntry>,
}

/// Virtual-clock scheduler for tests.
///
/// Nothing fires until [`ManualScheduler::advance`] moves the clock. Due
/// tasks run in deadline order, each to completion, before `advance`
/// returns; tasks scheduled while advancing run too if they fall due within
/// the window.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    inner: Arc<Mutex<ManualInner>>,
}

impl std::fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock().unwrap();
        f.debug_struct("ManualScheduler")
            .field("now_ms", &inner.now_ms)
            .field("pending", &inner.entries.len())
            .finish()
    }
}

impl ManualScheduler {
    /// Create a scheduler at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of timers armed and not cancelled.
    pub fn pending(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner
            .entries
            .iter()
            .filter(|e| !e.cancelled.load(Ordering::SeqCst))
            .count()
    }

    /// Move the clock forward by `by`, running every task that falls due.
    pub async fn advance(&self, by: Duration) {
        let target = {
            let inner = self.inner.lock().unwrap();
            inner.now_ms + by.as_millis() as u64
        };
        while let Some(entry) = self.next_due(target) {
            if !entry.cancelled.load(Ordering::SeqCst) {
                entry.task.await;
            }
        }
        let mut inner = self.inner.lock().unwrap();
        inner.now_ms = inner.now_ms.max(target);
    }

    fn next_due(&self, target: u64) -> Option<ManualEntry> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .entries
            .retain(|e| !e.cancelled.load(Ordering::SeqCst));
        let index = inner
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due_ms <= target)
            .min_by_key(|(_, e)| (e.due_ms, e.seq))
            .map(|(i, _)| i)?;
        let entry = inner.entries.swap_remove(index);
        inner.now_ms = inner.now_ms.max(entry.due_ms);
        Some(entry)
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: Task) -> TimerHandle {
        let (handle, cancelled) = TimerHandle::new(None);
        let mut inner = self.inner.lock().unwrap();
        inner.seq += 1;
        let entry = ManualEntry {
            due_ms: inner.now_ms + delay.as_millis() as u64,
            seq: inner.seq,
            cancelled,
            task,
        };
        inner.entries.push(entry);
        handle
    }

    fn now_ms(&self) -> u64 {
        self.inner.lock().unwrap().now_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter_task(counter: &Arc<AtomicUsize>) -> Task {
        let counter = Arc::clone(counter);
        Box::pin(async move {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    // ===========================================
    // ManualScheduler
    // ===========================================

    #[tokio::test]
    async fn manual_fires_only_when_due() {
        let scheduler = ManualScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let _handle = scheduler.schedule(Duration::from_secs(2), counter_task(&fired));

        scheduler.advance(Duration::from_millis(1999)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        scheduler.advance(Duration::from_millis(1)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.now_ms(), 2000);
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test]
    async fn dropping_handle_cancels() {
        let scheduler = ManualScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let handle = scheduler.schedule(Duration::from_secs(1), counter_task(&fired));
        assert_eq!(scheduler.pending(), 1);
        drop(handle);
        assert_eq!(scheduler.pending(), 0);

        scheduler.advance(Duration::from_secs(5)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn manual_runs_in_deadline_order() {
        let scheduler = ManualScheduler::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut handles = Vec::new();
        for (name, delay) in [("late", 30), ("early", 10), ("mid", 20)] {
            let order = Arc::clone(&order);
            handles.push(scheduler.schedule(
                Duration::from_millis(delay),
                Box::pin(async move {
                    order.lock().unwrap().push(name);
                }),
            ));
        }
        scheduler.advance(Duration::from_millis(100)).await;
        assert_eq!(*order.lock().unwrap(), vec!["early", "mid", "late"]);
    }

    // ===========================================
    // TokioScheduler
    // ===========================================

    #[tokio::test(start_paused = true)]
    async fn tokio_fires_after_delay() {
        let scheduler = TokioScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let _handle = scheduler.schedule(Duration::from_secs(2), counter_task(&fired));

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_cancel_prevents_firing() {
        let scheduler = TokioScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let handle = scheduler.schedule(Duration::from_secs(2), counter_task(&fired));
        handle.cancel();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
