use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// One-shot latch released after `count` signals.
///
/// Waiters can bound their wait; the simulation driver uses that as a
/// deadlock probe over its workers.
pub struct CountdownEvent {
    count: Mutex<usize>,
    condvar: Condvar,
    notified: AtomicBool,
}

impl CountdownEvent {
    // Create a new CountdownEvent with initial count.
    //
    pub fn new(count: usize) -> Self {
        CountdownEvent {
            count: Mutex::new(count),
            condvar: Condvar::new(),
            notified: AtomicBool::new(count == 0),
        }
    }

    // The count is a plain integer that is never left half-updated, so a
    // panic elsewhere while holding the lock doesn't invalidate it.
    //
    fn lock(&self) -> MutexGuard<'_, usize> {
        self.count.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Signal the event, decrementing count by one.
    ///
    /// Returns `true` for the signal that released the event.
    pub fn signal(&self) -> bool {
        let mut count = self.lock();
        if *count == 0 {
            return false;
        }
        *count -= 1;
        if *count == 0 {
            self.notified.store(true, Ordering::Release);
            self.condvar.notify_all();
            true
        } else {
            false
        }
    }

    /// Whether the count has reached zero.
    pub fn is_set(&self) -> bool {
        self.notified.load(Ordering::Acquire)
    }

    // Wait until count reaches zero.
    //
    pub fn wait(&self) {
        let mut count = self.lock();
        while *count > 0 {
            count = self
                .condvar
                .wait(count)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Wait until count reaches zero or `timeout` elapses.
    ///
    /// Returns `true` if the event was released in time.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut count = self.lock();

        while *count > 0 {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }

            count = self
                .condvar
                .wait_timeout(count, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }

        true
    }
}

/// Signals its event when dropped, including during unwinding.
pub struct SignalOnDrop<'a>(pub &'a CountdownEvent);

impl Drop for SignalOnDrop<'_> {
    fn drop(&mut self) {
        self.0.signal();
    }
}
