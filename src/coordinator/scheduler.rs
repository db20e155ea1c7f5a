//! Periodic-timer capability the coordinator composes against, plus a tokio rendition.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::update::UpdateCoordinator;

/// What the coordinator needs from a polling framework.
pub trait PollScheduler: Send + Sync {
    /// Arm (or re-arm) the periodic timer.
    fn schedule(&self, interval: Duration);
    /// Disarm the timer; a cycle already running is not interrupted.
    fn cancel_schedule(&self);
    /// Tell consumers to re-read the coordinator snapshot.
    fn notify_listeners(&self);
}

/// Timer and listener fan-out backed by `tokio::sync::watch` channels.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use livly::coordinator::{PollScheduler, TokioScheduler};
///
/// let scheduler = TokioScheduler::new();
/// scheduler.schedule(Duration::from_secs(1800));
/// assert_eq!(scheduler.armed_interval(), Some(Duration::from_secs(1800)));
/// scheduler.cancel_schedule();
/// assert_eq!(scheduler.armed_interval(), None);
/// ```
#[derive(Debug)]
pub struct TokioScheduler {
    interval: watch::Sender<Option<Duration>>,
    revision: watch::Sender<u64>,
}

impl Default for TokioScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl TokioScheduler {
    pub fn new() -> Self {
        let (interval, _) = watch::channel(None);
        let (revision, _) = watch::channel(0);
        Self { interval, revision }
    }

    pub fn armed_interval(&self) -> Option<Duration> {
        *self.interval.borrow()
    }

    /// Timer handle for a driver loop.
    pub fn ticks(&self) -> ScheduleTicks {
        ScheduleTicks {
            interval: self.interval.subscribe(),
        }
    }

    /// Receiver whose value changes every time listeners are notified.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }
}

impl PollScheduler for TokioScheduler {
    fn schedule(&self, interval: Duration) {
        self.interval.send_replace(Some(interval));
    }

    fn cancel_schedule(&self) {
        self.interval.send_replace(None);
    }

    fn notify_listeners(&self) {
        self.revision.send_modify(|revision| *revision = revision.wrapping_add(1));
    }
}

/// Yields once per elapsed interval of a [`TokioScheduler`].
#[derive(Debug)]
pub struct ScheduleTicks {
    interval: watch::Receiver<Option<Duration>>,
}

impl ScheduleTicks {
    /// Completes when the armed interval elapses.
    ///
    /// Re-arming restarts the countdown; while disarmed this waits until the
    /// timer is armed again.
    pub async fn tick(&mut self) {
        loop {
            let armed = *self.interval.borrow_and_update();
            match armed {
                Some(period) => {
                    tokio::select! {
                        _ = tokio::time::sleep(period) => return,
                        changed = self.interval.changed() => {
                            if changed.is_err() {
                                std::future::pending::<()>().await;
                            }
                        }
                    }
                }
                None => {
                    if self.interval.changed().await.is_err() {
                        std::future::pending::<()>().await;
                    }
                }
            }
        }
    }
}

/// Run a coordinator refresh on every tick until `shutdown` fires.
pub async fn drive(
    coordinator: Arc<UpdateCoordinator>,
    mut ticks: ScheduleTicks,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticks.tick() => {
                debug!("Scheduled refresh");
                coordinator.request_refresh().await;
            }
        }
    }
    debug!("Poll driver stopped");
}
