//! [`DeadlineScheduler`]: one-shot jobs at absolute points in time.
//!
//! A single background task owns a min-heap of pending deadlines for the whole
//! process, instead of one timer per job. Jobs are in-memory only and do not
//! survive a restart.

use std::{
  cmp::Reverse,
  collections::{BinaryHeap, HashMap},
  future::Future,
  pin::Pin,
  sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
  },
  time::Duration,
};

use chrono::{DateTime, Utc};
use tokio::{
  sync::{mpsc, oneshot},
  time::{Instant, sleep_until},
};
use tracing::{debug, warn};
use verdict_core::clock::Clock;

type Action = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Identifies a scheduled job for [`DeadlineScheduler::cancel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScheduleHandle(u64);

enum Command {
  Schedule { id: u64, at: Instant, action: Action },
  Cancel(u64),
  Pending(oneshot::Sender<usize>),
}

/// Handle to the scheduling task. Cheap to clone; the task stops once every
/// clone is dropped, discarding jobs that have not fired.
#[derive(Clone)]
pub struct DeadlineScheduler {
  tx:      mpsc::UnboundedSender<Command>,
  next_id: Arc<AtomicU64>,
  clock:   Arc<dyn Clock>,
}

impl DeadlineScheduler {
  /// Start the scheduling task on the current tokio runtime.
  pub fn spawn(clock: Arc<dyn Clock>) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(run(rx));
    Self { tx, next_id: Arc::new(AtomicU64::new(0)), clock }
  }

  /// Run `action` once, at or after `at`. A deadline already in the past
  /// fires as soon as possible.
  pub fn schedule_at<F>(&self, at: DateTime<Utc>, action: F) -> ScheduleHandle
  where
    F: Future<Output = ()> + Send + 'static,
  {
    let id    = self.next_id.fetch_add(1, Ordering::Relaxed);
    let delay = (at - self.clock.now()).to_std().unwrap_or(Duration::ZERO);

    let command = Command::Schedule {
      id,
      at: Instant::now() + delay,
      action: Box::pin(action),
    };
    if self.tx.send(command).is_err() {
      warn!("scheduler task has stopped; job {id} will never fire");
    }
    ScheduleHandle(id)
  }

  /// Best-effort: a job that already fired, or was already cancelled, is
  /// left alone.
  pub fn cancel(&self, handle: &ScheduleHandle) {
    let _ = self.tx.send(Command::Cancel(handle.0));
  }

  /// Number of jobs that have neither fired nor been cancelled.
  pub async fn pending(&self) -> usize {
    let (reply, rx) = oneshot::channel();
    if self.tx.send(Command::Pending(reply)).is_err() {
      return 0;
    }
    rx.await.unwrap_or(0)
  }
}

async fn run(mut rx: mpsc::UnboundedReceiver<Command>) {
  let mut queue: BinaryHeap<Reverse<(Instant, u64)>> = BinaryHeap::new();
  let mut jobs: HashMap<u64, Action> = HashMap::new();

  loop {
    // Cancelled jobs leave their heap entry behind; skip past them.
    while let Some(Reverse((_, id))) = queue.peek() {
      if jobs.contains_key(id) {
        break;
      }
      queue.pop();
    }
    let next = queue.peek().map(|Reverse((at, _))| *at);

    tokio::select! {
      command = rx.recv() => match command {
        Some(Command::Schedule { id, at, action }) => {
          debug!("scheduling job {id}");
          jobs.insert(id, action);
          queue.push(Reverse((at, id)));
        }
        Some(Command::Cancel(id)) => {
          if jobs.remove(&id).is_some() {
            debug!("cancelled job {id}");
          }
        }
        Some(Command::Pending(reply)) => {
          let _ = reply.send(jobs.len());
        }
        None => break,
      },
      _ = sleep_until(next.unwrap_or_else(Instant::now)), if next.is_some() => {
        let now = Instant::now();
        while let Some(&Reverse((at, id))) = queue.peek() {
          if at > now {
            break;
          }
          queue.pop();
          if let Some(action) = jobs.remove(&id) {
            debug!("firing job {id}");
            tokio::spawn(action);
          }
        }
      }
    }
  }

  debug!("scheduler stopped with {} unfired jobs", jobs.len());
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use chrono::Duration as ChronoDuration;
  use tokio::time::sleep;
  use verdict_core::clock::ManualClock;

  use super::*;

  fn scheduler() -> (DeadlineScheduler, DateTime<Utc>) {
    let start = Utc::now();
    (DeadlineScheduler::spawn(Arc::new(ManualClock::new(start))), start)
  }

  fn recorder() -> (Arc<Mutex<Vec<&'static str>>>, impl Fn(&'static str) -> Action) {
    let fired = Arc::new(Mutex::new(Vec::new()));
    let sink = fired.clone();
    let make = move |label: &'static str| -> Action {
      let sink = sink.clone();
      Box::pin(async move { sink.lock().unwrap().push(label) })
    };
    (fired, make)
  }

  #[tokio::test(start_paused = true)]
  async fn fires_once_at_deadline() {
    let (scheduler, start) = scheduler();
    let (fired, job) = recorder();

    scheduler.schedule_at(start + ChronoDuration::seconds(10), job("a"));

    sleep(Duration::from_secs(9)).await;
    assert!(fired.lock().unwrap().is_empty());

    sleep(Duration::from_secs(2)).await;
    assert_eq!(*fired.lock().unwrap(), vec!["a"]);

    sleep(Duration::from_secs(60)).await;
    assert_eq!(fired.lock().unwrap().len(), 1);
    assert_eq!(scheduler.pending().await, 0);
  }

  #[tokio::test(start_paused = true)]
  async fn past_deadline_fires_immediately() {
    let (scheduler, start) = scheduler();
    let (fired, job) = recorder();

    scheduler.schedule_at(start - ChronoDuration::seconds(5), job("late"));

    sleep(Duration::from_millis(1)).await;
    assert_eq!(*fired.lock().unwrap(), vec!["late"]);
  }

  #[tokio::test(start_paused = true)]
  async fn cancelled_job_never_fires() {
    let (scheduler, start) = scheduler();
    let (fired, job) = recorder();

    let handle = scheduler.schedule_at(start + ChronoDuration::seconds(10), job("a"));
    scheduler.schedule_at(start + ChronoDuration::seconds(20), job("b"));
    scheduler.cancel(&handle);
    assert_eq!(scheduler.pending().await, 1);

    sleep(Duration::from_secs(30)).await;
    assert_eq!(*fired.lock().unwrap(), vec!["b"]);

    // Cancelling after the fact is harmless.
    scheduler.cancel(&handle);
    assert_eq!(scheduler.pending().await, 0);
  }

  #[tokio::test(start_paused = true)]
  async fn jobs_fire_in_deadline_order() {
    let (scheduler, start) = scheduler();
    let (fired, job) = recorder();

    scheduler.schedule_at(start + ChronoDuration::seconds(30), job("third"));
    scheduler.schedule_at(start + ChronoDuration::seconds(10), job("first"));
    scheduler.schedule_at(start + ChronoDuration::seconds(20), job("second"));
    assert_eq!(scheduler.pending().await, 3);

    sleep(Duration::from_secs(40)).await;
    assert_eq!(*fired.lock().unwrap(), vec!["first", "second", "third"]);
  }
}
