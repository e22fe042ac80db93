//! Owned repeating timers.
//!
//! A [`Ticker`] is a tokio interval task that sends a tag into a channel on
//! every period. The handle owns the task: dropping it aborts the task, so a
//! screen that holds its tickers releases them on every exit path.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Which repeating timer fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickSource {
    Countdown,
    Rest,
}

#[derive(Debug)]
pub struct Ticker {
    handle: JoinHandle<()>,
}

impl Ticker {
    /// Spawn on the current tokio runtime. The first tick fires immediately.
    pub fn start<T>(period: Duration, tag: T, tx: UnboundedSender<T>) -> Self
    where
        T: Clone + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(tag.clone()).is_err() {
                    break;
                }
            }
        });
        Self { handle }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
