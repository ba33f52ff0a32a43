//! Interrupt handling.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared flag that tells the pipeline to stop issuing new operations.
///
/// Cloning shares the underlying flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Route Ctrl-C to this token, then call `on_interrupt`.
    ///
    /// Can only be called once per process.
    pub fn install_ctrlc_handler<F>(&self, on_interrupt: F) -> Result<(), ctrlc::Error>
    where
        F: Fn(&CancelToken) + Send + 'static,
    {
        let token = self.clone();
        ctrlc::set_handler(move || {
            token.cancel();
            on_interrupt(&token);
        })
    }
}
