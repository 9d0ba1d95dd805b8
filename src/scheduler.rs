//! Periodic tick scheduler
//!
//! A background thread runs the tick callback, then waits one interval before
//! the next run. `disarm` stops the thread and joins it, so once it returns
//! the callback will never run again and anything it touches can be freed.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// A running tick thread
struct Worker {
    stop: Sender<()>,
    handle: JoinHandle<()>,
}

/// Armed/Disarmed timer driving the game tick
pub struct TickScheduler {
    interval: Duration,
    /// Bumped on every arm and disarm; a tick only runs if it still matches
    generation: Arc<AtomicU64>,
    worker: Option<Worker>,
}

impl TickScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            generation: Arc::new(AtomicU64::new(0)),
            worker: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_armed(&self) -> bool {
        self.worker.is_some()
    }

    /// Start calling `on_tick` every interval, replacing any previous callback
    pub fn arm<F>(&mut self, mut on_tick: F) -> io::Result<()>
    where
        F: FnMut() + Send + 'static,
    {
        self.disarm();

        let armed_at = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let generation = Arc::clone(&self.generation);
        let interval = self.interval;
        let (stop, stopped) = mpsc::channel::<()>();

        let handle = thread::Builder::new()
            .name("meteor-tick".into())
            .spawn(move || {
                loop {
                    match stopped.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            if generation.load(Ordering::Acquire) != armed_at {
                                break;
                            }
                            on_tick();
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                log::debug!("Tick thread (generation {armed_at}) exiting");
            })?;

        log::debug!("Tick scheduler armed every {:?}", self.interval);
        self.worker = Some(Worker { stop, handle });
        Ok(())
    }

    /// Stop ticking and wait for an in-flight tick to finish
    ///
    /// Idempotent. Must not be called from inside the tick callback.
    pub fn disarm(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        self.generation.fetch_add(1, Ordering::AcqRel);
        // The thread may already be gone; either way join below
        let _ = worker.stop.send(());
        if worker.handle.join().is_err() {
            log::error!("Tick thread panicked");
        }
        log::debug!("Tick scheduler disarmed");
    }
}

impl Drop for TickScheduler {
    fn drop(&mut self) {
        self.disarm();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting(scheduler: &mut TickScheduler) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        scheduler
            .arm(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        count
    }

    #[test]
    fn test_ticks_while_armed() {
        let mut scheduler = TickScheduler::new(Duration::from_millis(5));
        let count = counting(&mut scheduler);
        assert!(scheduler.is_armed());

        thread::sleep(Duration::from_millis(100));
        scheduler.disarm();
        assert!(count.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn test_no_tick_after_disarm() {
        let mut scheduler = TickScheduler::new(Duration::from_millis(2));
        let count = counting(&mut scheduler);
        thread::sleep(Duration::from_millis(20));
        scheduler.disarm();

        let frozen = count.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(count.load(Ordering::SeqCst), frozen);
        assert!(!scheduler.is_armed());
    }

    #[test]
    fn test_disarm_is_idempotent() {
        let mut scheduler = TickScheduler::new(Duration::from_millis(10));
        scheduler.disarm();
        counting(&mut scheduler);
        scheduler.disarm();
        scheduler.disarm();
        assert!(!scheduler.is_armed());
    }

    #[test]
    fn test_rearm_replaces_callback() {
        let mut scheduler = TickScheduler::new(Duration::from_millis(2));
        let first = counting(&mut scheduler);
        let second = counting(&mut scheduler);
        let frozen = first.load(Ordering::SeqCst);

        thread::sleep(Duration::from_millis(40));
        scheduler.disarm();
        assert_eq!(first.load(Ordering::SeqCst), frozen);
        assert!(second.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn test_drop_disarms() {
        let count;
        {
            let mut scheduler = TickScheduler::new(Duration::from_millis(2));
            count = counting(&mut scheduler);
        }
        let frozen = count.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(count.load(Ordering::SeqCst), frozen);
    }
}
