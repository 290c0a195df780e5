//! Streamed placeholder values.
//!
//! The web client renders a turn before it is finished: a pending spinner,
//! then partial text as deltas arrive, then the final view. `Progress`
//! models that lifecycle as a monotonic three-state value pushed through a
//! `tokio::sync::watch` pair — single producer, any number of subscribers,
//! no cancellation. Once `Done`, further updates are ignored.

use serde::Serialize;
use tokio::sync::watch;

/// The lifecycle of a streamed value: pending → partial* → done.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Progress<T> {
    Pending,
    Partial { value: T },
    Done { value: T },
}

impl<T> Progress<T> {
    pub fn is_done(&self) -> bool {
        matches!(self, Progress::Done { .. })
    }

    /// The current value, if any has been produced yet.
    pub fn value(&self) -> Option<&T> {
        match self {
            Progress::Pending => None,
            Progress::Partial { value } | Progress::Done { value } => Some(value),
        }
    }
}

/// Create a connected writer/handle pair, starting at `Pending`.
pub fn channel<T: Clone>() -> (StreamWriter<T>, StreamHandle<T>) {
    let (tx, rx) = watch::channel(Progress::Pending);
    (StreamWriter { tx }, StreamHandle { rx })
}

/// The producing side of a streamed value.
pub struct StreamWriter<T> {
    tx: watch::Sender<Progress<T>>,
}

impl<T: Clone> StreamWriter<T> {
    /// Publish a partial value. Ignored once the stream is done.
    pub fn update(&self, value: T) {
        self.tx.send_if_modified(|current| {
            if current.is_done() {
                return false;
            }
            *current = Progress::Partial { value: value.clone() };
            true
        });
    }

    /// Publish the final value. The first `done` wins; later calls are ignored.
    pub fn done(&self, value: T) {
        self.tx.send_if_modified(|current| {
            if current.is_done() {
                return false;
            }
            *current = Progress::Done { value: value.clone() };
            true
        });
    }

    pub fn is_done(&self) -> bool {
        self.tx.borrow().is_done()
    }
}

/// The subscribing side of a streamed value.
#[derive(Clone)]
pub struct StreamHandle<T> {
    rx: watch::Receiver<Progress<T>>,
}

impl<T: Clone> StreamHandle<T> {
    /// The latest observed state.
    pub fn current(&self) -> Progress<T> {
        self.rx.borrow().clone()
    }

    /// Wait for the next state transition. Returns `false` when the writer
    /// is gone and no further transitions can happen.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Wait until the stream is done and return the final value. Returns
    /// `None` if the writer was dropped before finishing.
    pub async fn wait_done(&mut self) -> Option<T> {
        loop {
            if let Progress::Done { value } = &*self.rx.borrow() {
                return Some(value.clone());
            }
            if self.rx.changed().await.is_err() {
                return match &*self.rx.borrow() {
                    Progress::Done { value } => Some(value.clone()),
                    _ => None,
                };
            }
        }
    }
}
