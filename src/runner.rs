//! Where the process waits on an experiment: whichever of the experiment finishing or a
//! termination signal arriving comes first decides how the run ends.

use crate::context::CancelHandle;
use core::future::Future;
use std::io;
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{info, warn};

/// How the wait on an experiment ended. Both carry whatever the experiment reported
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Completed(T),
    /// A termination signal arrived first. The experiment was cancelled, then waited on to
    /// collect its partial result
    Interrupted(T),
}

impl<T> Outcome<T> {
    pub fn into_inner(self) -> T {
        match self {
            Self::Completed(t) | Self::Interrupted(t) => t,
        }
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted(_))
    }
}

#[derive(Debug, Error)]
pub enum WaitError {
    #[error("experiment task ended without reporting a result")]
    Lost,
    /// A second termination signal arrived while the cancelled experiment was winding down
    #[error("experiment abandoned before it finished winding down")]
    Abandoned,
}

impl From<oneshot::error::RecvError> for WaitError {
    fn from(_: oneshot::error::RecvError) -> Self {
        WaitError::Lost
    }
}

/// Wait for `completion`, or for `shutdown` to resolve first. A completion already sent takes
/// precedence over a shutdown that is ready at the same time.
///
/// After `shutdown` the experiment is cancelled and waited on, unless `force` resolves before
/// it reports. `force` is first polled once `shutdown` has resolved.
pub async fn wait_for<T>(
    mut completion: oneshot::Receiver<T>,
    shutdown: impl Future<Output = ()>,
    force: impl Future<Output = ()>,
    cancel: CancelHandle,
) -> Result<Outcome<T>, WaitError> {
    tokio::pin!(shutdown);

    tokio::select! {
        biased;
        result = &mut completion => Ok(Outcome::Completed(result?)),
        _ = &mut shutdown => {
            info!("termination signal received, cancelling experiment");
            cancel.cancel();
            tokio::select! {
                biased;
                result = completion => Ok(Outcome::Interrupted(result?)),
                _ = force => {
                    warn!("second termination signal received, not waiting for the experiment");
                    Err(WaitError::Abandoned)
                }
            }
        }
    }
}

/// Resolves on the first SIGINT, SIGTERM, SIGHUP or SIGQUIT
#[cfg(unix)]
pub async fn termination() -> io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut hangup = signal(SignalKind::hangup())?;
    let mut quit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = interrupt.recv() => info!("SIGINT"),
        _ = terminate.recv() => info!("SIGTERM"),
        _ = hangup.recv() => info!("SIGHUP"),
        _ = quit.recv() => info!("SIGQUIT"),
    }
    Ok(())
}

#[cfg(not(unix))]
pub async fn termination() -> io::Result<()> {
    tokio::signal::ctrl_c().await
}
