#![forbid(unsafe_code)]

//! Host-advanced timers.
//!
//! [`Timers`] keeps its own notion of "now", which only moves when the host
//! calls [`Timers::advance_to`]. [`Sleep`] futures complete once that time
//! reaches their deadline.
//!
//! # Invariants
//!
//! - `now()` is monotonic; advancing to an earlier time is a no-op.
//! - Every sleeper whose deadline is `<= now()` is woken by the advance that
//!   crossed it.
//! - A `Sleep` that is dropped before firing leaves no waker behind.

use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};
use std::time::Duration;

#[derive(Debug, Default)]
struct TimerState {
    now: Duration,
    next_id: u64,
    sleepers: Vec<(u64, Duration, Waker)>,
}

/// Shared timer wheel. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct Timers {
    state: Rc<RefCell<TimerState>>,
}

impl Timers {
    /// Create a timer set starting at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current timer time.
    pub fn now(&self) -> Duration {
        self.state.borrow().now
    }

    /// Number of sleepers still waiting.
    pub fn pending(&self) -> usize {
        self.state.borrow().sleepers.len()
    }

    /// Earliest deadline among waiting sleepers.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.state.borrow().sleepers.iter().map(|s| s.1).min()
    }

    /// Move time forward, waking every sleeper that became due.
    ///
    /// Returns the number of sleepers woken.
    pub fn advance_to(&self, now: Duration) -> usize {
        let due: Vec<Waker> = {
            let mut state = self.state.borrow_mut();
            if now > state.now {
                state.now = now;
            }
            let current = state.now;
            let mut due = Vec::new();
            state.sleepers.retain(|(_, deadline, waker)| {
                if *deadline <= current {
                    due.push(waker.clone());
                    false
                } else {
                    true
                }
            });
            due
        };
        let woken = due.len();
        if woken > 0 {
            tracing::trace!(target: "sheets.host", now = ?now, woken, "timers fired");
        }
        for waker in due {
            waker.wake();
        }
        woken
    }

    /// Sleep until the timer time reaches `deadline`.
    pub fn sleep_until(&self, deadline: Duration) -> Sleep {
        let id = {
            let mut state = self.state.borrow_mut();
            state.next_id += 1;
            state.next_id
        };
        Sleep {
            timers: self.clone(),
            id,
            deadline,
        }
    }

    /// Sleep for `duration` from the current timer time.
    pub fn sleep(&self, duration: Duration) -> Sleep {
        self.sleep_until(self.now().saturating_add(duration))
    }
}

/// Future completing at a timer deadline.
#[derive(Debug)]
#[must_use = "futures do nothing unless polled"]
pub struct Sleep {
    timers: Timers,
    id: u64,
    deadline: Duration,
}

impl Sleep {
    /// The deadline this sleep waits for.
    pub fn deadline(&self) -> Duration {
        self.deadline
    }
}

impl Future for Sleep {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let mut state = self.timers.state.borrow_mut();
        if state.now >= self.deadline {
            return Poll::Ready(());
        }
        match state.sleepers.iter_mut().find(|s| s.0 == self.id) {
            Some(entry) => entry.2.clone_from(cx.waker()),
            None => state
                .sleepers
                .push((self.id, self.deadline, cx.waker().clone())),
        }
        Poll::Pending
    }
}

impl Drop for Sleep {
    fn drop(&mut self) {
        if let Ok(mut state) = self.timers.state.try_borrow_mut() {
            state.sleepers.retain(|s| s.0 != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    #[test]
    fn sleep_completes_after_advance() {
        let timers = Timers::new();
        let mut sleep = timers.sleep(Duration::from_millis(10));
        assert!((&mut sleep).now_or_never().is_none());
        assert_eq!(timers.pending(), 1);

        timers.advance_to(Duration::from_millis(5));
        assert!((&mut sleep).now_or_never().is_none());

        assert_eq!(timers.advance_to(Duration::from_millis(10)), 1);
        assert!(sleep.now_or_never().is_some());
        assert_eq!(timers.pending(), 0);
    }

    #[test]
    fn zero_sleep_is_immediately_ready() {
        let timers = Timers::new();
        assert!(timers.sleep(Duration::ZERO).now_or_never().is_some());
    }

    #[test]
    fn time_is_monotonic() {
        let timers = Timers::new();
        timers.advance_to(Duration::from_millis(30));
        timers.advance_to(Duration::from_millis(10));
        assert_eq!(timers.now(), Duration::from_millis(30));
    }

    #[test]
    fn dropped_sleep_deregisters() {
        let timers = Timers::new();
        let mut sleep = timers.sleep(Duration::from_millis(10));
        assert!((&mut sleep).now_or_never().is_none());
        assert_eq!(timers.next_deadline(), Some(Duration::from_millis(10)));
        drop(sleep);
        assert_eq!(timers.pending(), 0);
        assert_eq!(timers.next_deadline(), None);
    }
}
