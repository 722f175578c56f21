use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::StampError;

type ProgressFn = dyn Fn(f32) + Send + Sync;

/// Percentage reporter that never goes backwards
///
/// Reports are clamped to 0..=100 and dropped unless higher than the last
/// one. The comparison and the callback run under one lock, so the callback
/// sees a strictly increasing sequence even when reports come from several
/// threads.
pub struct Progress {
    callback: Option<Box<ProgressFn>>,
    last: Mutex<f32>,
}

impl Progress {
    pub fn new(callback: impl Fn(f32) + Send + Sync + 'static) -> Self {
        Self {
            callback: Some(Box::new(callback)),
            last: Mutex::new(0.0),
        }
    }

    /// Reporter that discards everything
    pub fn none() -> Self {
        Self {
            callback: None,
            last: Mutex::new(0.0),
        }
    }

    pub fn report(&self, percent: f32) {
        if !percent.is_finite() {
            return;
        }
        let percent = percent.clamp(0.0, 100.0);
        let mut last = self.lock();
        if percent <= *last {
            return;
        }
        *last = percent;
        if let Some(callback) = &self.callback {
            callback(percent);
        }
    }

    /// Last reported value
    pub fn current(&self) -> f32 {
        *self.lock()
    }

    // A panicking callback leaves the value intact; keep using it.
    fn lock(&self) -> MutexGuard<'_, f32> {
        self.last.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::none()
    }
}

impl std::fmt::Debug for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress").field("current", &self.current()).finish()
    }
}

/// Cooperative cancellation flag shared between the caller and a running job
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// `Err(StampError::Cancelled)` once cancelled
    pub fn check(&self) -> Result<(), StampError> {
        if self.is_cancelled() {
            Err(StampError::Cancelled)
        } else {
            Ok(())
        }
    }
}
