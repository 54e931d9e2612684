use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Read side of a [`ViewScope`]: answers whether the view is still around.
#[derive(Debug, Clone)]
pub struct Liveness {
    ended: Arc<AtomicBool>,
}

impl Liveness {
    pub fn is_alive(&self) -> bool {
        !self.ended.load(Ordering::Acquire)
    }
}

/// The lifetime of one view (a page, a command invocation).
///
/// Resources created for a scope stop applying results once the scope has
/// ended, whether through [`ViewScope::end`] or by being dropped.
#[derive(Debug)]
pub struct ViewScope {
    ended: Arc<AtomicBool>,
}

impl Default for ViewScope {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewScope {
    pub fn new() -> Self {
        Self {
            ended: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn liveness(&self) -> Liveness {
        Liveness {
            ended: Arc::clone(&self.ended),
        }
    }

    pub fn is_alive(&self) -> bool {
        !self.ended.load(Ordering::Acquire)
    }

    pub fn end(self) {
        drop(self);
    }
}

impl Drop for ViewScope {
    fn drop(&mut self) {
        self.ended.store(true, Ordering::Release);
    }
}
