//! # Scheduling utilities
//!
//! Provides a cancellable timed wait and a periodic worker thread. Every loop
//! in the motion software that used to sleep between cycles waits on a
//! [`CancelToken`] instead, so shutdown takes effect immediately rather than
//! at the end of the current sleep.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, warn};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A clonable cancellation flag which can be waited on.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

/// A worker thread which runs a closure once per period until stopped.
#[derive(Debug)]
pub struct Periodic {
    name: String,
    token: CancelToken,
    handle: Option<JoinHandle<()>>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the token, waking every thread waiting on it.
    pub fn cancel(&self) {
        let (lock, cvar) = &*self.inner;
        *lock_mutex(lock) = true;
        cvar.notify_all();
    }

    /// Clear a previous cancellation so the token can be reused.
    pub fn reset(&self) {
        *lock_mutex(&self.inner.0) = false;
    }

    pub fn is_cancelled(&self) -> bool {
        *lock_mutex(&self.inner.0)
    }

    /// Wait for up to `timeout`, returning early if the token is cancelled.
    ///
    /// Returns `true` if the token was cancelled.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let deadline = Instant::now() + timeout;
        let mut cancelled = lock_mutex(lock);

        // Loop to absorb spurious wakeups
        while !*cancelled {
            let now = Instant::now();
            if now >= deadline {
                break;
            }

            cancelled = match cvar.wait_timeout(cancelled, deadline - now) {
                Ok((g, _)) => g,
                Err(e) => e.into_inner().0,
            };
        }

        *cancelled
    }
}

impl Periodic {
    /// Spawn a named thread running `body` once every `period`.
    ///
    /// If `body` takes longer than `period` the next cycle starts immediately
    /// and an overrun warning is logged.
    pub fn spawn<F>(name: &str, period: Duration, mut body: F) -> std::io::Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let token = CancelToken::new();
        let thread_token = token.clone();
        let thread_name = name.to_string();

        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                debug!("Periodic thread {} started, period {:?}", thread_name, period);

                while !thread_token.is_cancelled() {
                    let cycle_start = Instant::now();

                    body();

                    let cycle_dur = cycle_start.elapsed();

                    let sleep = match period.checked_sub(cycle_dur) {
                        Some(d) => d,
                        None => {
                            warn!(
                                "{} cycle overran by {:.06} s",
                                thread_name,
                                (cycle_dur - period).as_secs_f64()
                            );
                            Duration::from_secs(0)
                        }
                    };

                    if thread_token.wait_timeout(sleep) {
                        break;
                    }
                }

                debug!("Periodic thread {} exited", thread_name);
            })?;

        Ok(Self {
            name: name.to_string(),
            token,
            handle: Some(handle),
        })
    }

    /// Stop the worker and wait for its current cycle to finish.
    pub fn stop(mut self) {
        self.halt();
    }

    fn halt(&mut self) {
        self.token.cancel();

        if let Some(handle) = self.handle.take() {
            // Joining from inside the worker itself would deadlock
            if handle.thread().id() == thread::current().id() {
                return;
            }

            if handle.join().is_err() {
                warn!("Periodic thread {} panicked", self.name);
            }
        }
    }
}

impl Drop for Periodic {
    fn drop(&mut self) {
        self.halt();
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Lock a mutex, carrying on with the data if a previous holder panicked.
pub fn lock_mutex<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
