//! Background thread that periodically demotes idle durable-tier values.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::debug;

/// Handle to a running housekeeping thread. Stopped on [`Housekeeper::stop`] or drop.
pub struct Housekeeper {
    signal: Arc<(Mutex<bool>, Condvar)>,
    handle: Option<JoinHandle<()>>,
}

impl Housekeeper {
    /// Spawns a thread running `task` every `interval` until stopped.
    ///
    /// `task` runs without the stop flag held, so a concurrent [`Housekeeper::stop`] waits
    /// at most for one pass.
    pub fn spawn<F>(name: &str, interval: Duration, mut task: F) -> io::Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let signal = Arc::new((Mutex::new(false), Condvar::new()));
        let thread_signal = Arc::clone(&signal);

        let handle = thread::Builder::new()
            .name(format!("strata-hk-{}", name))
            .spawn(move || {
                let (stopped, wakeup) = &*thread_signal;
                let mut guard = stopped.lock();
                while !*guard {
                    let timed_out = wakeup.wait_for(&mut guard, interval).timed_out();
                    if *guard {
                        break;
                    }
                    if timed_out {
                        MutexGuard::unlocked(&mut guard, &mut task);
                    }
                }
                debug!("housekeeping thread exiting");
            })?;

        Ok(Self {
            signal,
            handle: Some(handle),
        })
    }

    /// Signals the thread to exit and joins it (idempotent).
    pub fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        {
            let (stopped, wakeup) = &*self.signal;
            *stopped.lock() = true;
            wakeup.notify_all();
        }

        if handle.join().is_err() {
            debug!("housekeeping thread panicked");
        }
    }

    /// Returns `true` until [`Housekeeper::stop`] has run.
    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for Housekeeper {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Housekeeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Housekeeper")
            .field("active", &self.is_active())
            .finish()
    }
}
