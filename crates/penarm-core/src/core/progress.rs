//! Shared drawing progress
//!
//! The executing session is the only writer. Observers take snapshots
//! without any handshake and may see a slightly stale value.

use crate::types::{thread_safe, ThreadSafe};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A point-in-time view of drawing progress
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Progress {
    /// Commands executed so far
    pub current: usize,
    /// Commands in the running session
    pub total: usize,
    /// True while a session is running
    pub active: bool,
    /// Status message for observers
    pub message: String,
    /// When the running session started
    pub started_at: Option<DateTime<Utc>>,
}

impl Progress {
    /// Completed fraction in `0.0..=1.0`
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            (self.current as f32 / self.total as f32).min(1.0)
        }
    }
}

/// Mutex-guarded progress shared between one writer and many readers
#[derive(Debug, Clone, Default)]
pub struct ProgressCounter {
    inner: ThreadSafe<Progress>,
}

impl ProgressCounter {
    /// Create an idle counter
    pub fn new() -> Self {
        Self {
            inner: thread_safe(Progress::default()),
        }
    }

    /// Mark a session of `total` commands as started
    pub fn start(&self, total: usize, message: impl Into<String>) {
        let mut progress = self.inner.lock();
        *progress = Progress {
            current: 0,
            total,
            active: true,
            message: message.into(),
            started_at: Some(Utc::now()),
        };
    }

    /// Record the number of executed commands
    pub fn set_current(&self, current: usize) {
        self.inner.lock().current = current;
    }

    /// Replace the status message
    pub fn set_message(&self, message: impl Into<String>) {
        self.inner.lock().message = message.into();
    }

    /// Return to the idle state
    pub fn reset(&self) {
        *self.inner.lock() = Progress::default();
    }

    /// Copy of the current progress
    pub fn snapshot(&self) -> Progress {
        self.inner.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_lifecycle() {
        let counter = ProgressCounter::new();
        assert!(!counter.snapshot().active);

        counter.start(10, "Drawing");
        counter.set_current(4);
        let snap = counter.snapshot();
        assert!(snap.active);
        assert_eq!(snap.current, 4);
        assert_eq!(snap.total, 10);
        assert!(snap.started_at.is_some());
        assert!((snap.fraction() - 0.4).abs() < f32::EPSILON);

        counter.set_message("Your drawing is ready!");
        assert_eq!(counter.snapshot().message, "Your drawing is ready!");

        counter.reset();
        assert_eq!(counter.snapshot(), Progress::default());
    }

    #[test]
    fn test_clones_share_state() {
        let writer = ProgressCounter::new();
        let observer = writer.clone();
        writer.start(3, "");
        writer.set_current(2);
        assert_eq!(observer.snapshot().current, 2);
    }

    #[test]
    fn test_concurrent_observers() {
        let counter = ProgressCounter::new();
        counter.start(1000, "");
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let observer = counter.clone();
                std::thread::spawn(move || {
                    let mut last = 0;
                    for _ in 0..200 {
                        let snap = observer.snapshot();
                        assert!(snap.current >= last);
                        assert!(snap.current <= snap.total);
                        last = snap.current;
                    }
                })
            })
            .collect();
        for i in 1..=1000 {
            counter.set_current(i);
        }
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(counter.snapshot().current, 1000);
    }

    #[test]
    fn test_fraction_of_empty_session() {
        assert_eq!(Progress::default().fraction(), 0.0);
    }
}
