//! What every long running call of an experiment is handed: the run options, and a token
//! telling it whether the run has been cancelled.

use crate::options::Options;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone)]
pub struct Context {
    options: Option<Arc<Options>>,
    cancelled: watch::Receiver<bool>,
}

/// Requests cancellation of every [Context] created alongside it
#[derive(Debug)]
pub struct CancelHandle(watch::Sender<bool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.send_replace(true);
    }
}

impl Context {
    pub fn with_cancel(options: Option<Options>) -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        (
            Self {
                options: options.map(Arc::new),
                cancelled: rx,
            },
            CancelHandle(tx),
        )
    }

    /// A context that can never be cancelled
    pub fn background(options: Options) -> Self {
        Self::with_cancel(Some(options)).0
    }

    pub fn options(&self) -> Option<&Options> {
        self.options.as_deref()
    }

    /// Cancellation is advisory: callers check it between generations
    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.borrow()
    }
}
