//! Waiting for the map surface to come up, and stopping the wait.
//!
//! The surface initialises on its own schedule. [`poll_until`] checks it at
//! a fixed interval, yielding to the runtime between checks, and gives up
//! after a bounded number of attempts or as soon as disposal is requested.

use std::sync::Arc;

use tokio::sync::watch;

use crate::config::ReadinessConfig;
use crate::error::{Error, Result};

/// Requests disposal of a controller from outside (e.g. a page teardown).
#[derive(Debug, Clone)]
pub struct DisposeHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl DisposeHandle {
    pub fn dispose(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_disposed(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Receiving side, held by the controller.
#[derive(Debug)]
pub struct DisposeSignal {
    rx: watch::Receiver<bool>,
    // Keeps the channel open so `changed()` never resolves with an error.
    _tx: Arc<watch::Sender<bool>>,
}

impl DisposeSignal {
    pub fn is_disposed(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once disposal has been requested.
    pub async fn disposed(&mut self) {
        while !*self.rx.borrow_and_update() {
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

pub fn dispose_channel() -> (DisposeHandle, DisposeSignal) {
    let (tx, rx) = watch::channel(false);
    let tx = Arc::new(tx);
    (
        DisposeHandle { tx: Arc::clone(&tx) },
        DisposeSignal { rx, _tx: tx },
    )
}

/// Call `probe` until it returns true, sleeping `poll_interval` between
/// calls. Returns the number of probes made.
///
/// Fails with [`Error::ResourceUnavailable`] after `max_attempts` probes and
/// with [`Error::Disposed`] as soon as `signal` fires.
pub async fn poll_until<F>(mut probe: F, config: &ReadinessConfig, signal: &mut DisposeSignal) -> Result<u32>
where
    F: FnMut() -> bool,
{
    let interval = config.poll_interval().max(std::time::Duration::from_millis(1));
    let max_attempts = config.max_attempts.max(1);

    for attempt in 1..=max_attempts {
        if signal.is_disposed() {
            return Err(Error::Disposed);
        }
        if probe() {
            return Ok(attempt);
        }
        if attempt == max_attempts {
            break;
        }
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = signal.disposed() => return Err(Error::Disposed),
        }
    }

    Err(Error::ResourceUnavailable {
        attempts: max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config(interval_ms: u64, max_attempts: u32) -> ReadinessConfig {
        ReadinessConfig {
            poll_interval_ms: interval_ms,
            max_attempts,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_on_third_probe() {
        let (_handle, mut signal) = dispose_channel();
        let mut calls = 0;
        let start = tokio::time::Instant::now();
        let n = poll_until(
            || {
                calls += 1;
                calls == 3
            },
            &config(100, 10),
            &mut signal,
        )
        .await
        .unwrap();
        assert_eq!(n, 3);
        let waited = start.elapsed();
        assert!(waited >= Duration::from_millis(200) && waited < Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let (_handle, mut signal) = dispose_channel();
        let mut calls = 0;
        let err = poll_until(
            || {
                calls += 1;
                false
            },
            &config(50, 4),
            &mut signal,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::ResourceUnavailable { attempts: 4 }));
        assert_eq!(calls, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispose_before_wait() {
        let (handle, mut signal) = dispose_channel();
        handle.dispose();
        let err = poll_until(|| true, &config(50, 4), &mut signal).await.unwrap_err();
        assert!(matches!(err, Error::Disposed));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispose_during_wait() {
        let (handle, mut signal) = dispose_channel();
        let disposer = async {
            tokio::time::sleep(Duration::from_millis(250)).await;
            handle.dispose();
        };
        let cfg = config(100, 1000);
        let waiter = poll_until(|| false, &cfg, &mut signal);
        let (result, ()) = tokio::join!(waiter, disposer);
        assert!(matches!(result, Err(Error::Disposed)));
        assert!(handle.is_disposed());
    }
}
