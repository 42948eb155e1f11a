//! Ring channel: a one-slot, latest-value-wins buffer.
//!
//! Bridges a producer that must never wait (a filesystem callback, an HTTP
//! handler) to a consumer that drains at its own pace. Writes never block. If
//! a value is still unread when the next one arrives, the older one is
//! dropped: readers always get the newest state, never a backlog.
//!
//! Writers replace the single slot in place, so the channel never holds more
//! than one value however far the reader falls behind. One forwarding task
//! hands the slot's content to the reader and notices when the last writer
//! is gone.
//!
//! Closing the input (dropping every [`RingSender`]) still delivers the
//! buffered value, if any, before [`RingReceiver::read`] starts returning
//! `None`.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};

use crate::observability::metrics;

/// Create a ring channel and spawn its forwarding task.
///
/// Must be called from within a tokio runtime.
pub fn ring_channel<T: Send + Sync + 'static>() -> (RingSender<T>, RingReceiver<T>) {
    let (slot_tx, slot_rx) = watch::channel(None);
    let slot = Arc::new(slot_tx);
    let (alive_tx, alive_rx) = mpsc::channel(1);
    let (request_tx, request_rx) = mpsc::unbounded_channel();

    tokio::spawn(run_ring(Arc::clone(&slot), slot_rx, alive_rx, request_rx));

    (
        RingSender {
            slot,
            _alive: alive_tx,
        },
        RingReceiver {
            requests: request_tx,
            pending: None,
        },
    )
}

/// Writing end of a ring channel. Cheap to clone.
#[derive(Debug)]
pub struct RingSender<T> {
    slot: Arc<watch::Sender<Option<T>>>,
    // Never sent on; the forwarding task sees the input close once every
    // clone of this is dropped.
    _alive: mpsc::Sender<()>,
}

impl<T> Clone for RingSender<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
            _alive: self._alive.clone(),
        }
    }
}

impl<T> RingSender<T> {
    /// Write a value, replacing any unread one. Never waits.
    ///
    /// Returns `false` when nobody can ever read it (receiver dropped).
    pub fn write(&self, value: T) -> bool {
        if self.slot.send_replace(Some(value)).is_some() {
            metrics::record_ring_overwrite();
        }
        !self.slot.is_closed()
    }

    /// Close this writer. The input closes once every clone is closed or dropped.
    pub fn close(self) {}
}

/// Reading end of a ring channel.
#[derive(Debug)]
pub struct RingReceiver<T> {
    requests: mpsc::UnboundedSender<oneshot::Sender<T>>,
    pending: Option<oneshot::Receiver<T>>,
}

impl<T> RingReceiver<T> {
    /// Wait for the next value.
    ///
    /// Returns `None` once the input is closed and the last value was read.
    /// Cancel-safe: a read dropped mid-wait keeps its place, and the next call
    /// picks up the value that was meant for it.
    pub async fn read(&mut self) -> Option<T> {
        if self.pending.is_none() {
            let (tx, rx) = oneshot::channel();
            self.requests.send(tx).ok()?;
            self.pending = Some(rx);
        }

        let rx = self.pending.as_mut()?;
        let value = rx.await.ok();
        self.pending = None;
        value
    }

    /// Drain every value into `out` until the ring closes or `out` does.
    pub async fn forward(mut self, out: mpsc::Sender<T>) {
        while let Some(value) = self.read().await {
            if out.send(value).await.is_err() {
                break;
            }
        }
    }
}

/// Take the slot's value without waking anyone.
fn take<T>(slot: &watch::Sender<Option<T>>) -> Option<T> {
    let mut taken = None;
    slot.send_if_modified(|value| {
        taken = value.take();
        false
    });
    taken
}

/// Put back a value the reader never got, unless a newer one arrived.
fn restore<T>(slot: &watch::Sender<Option<T>>, value: T) {
    slot.send_if_modified(|current| {
        if current.is_none() {
            *current = Some(value);
        } else {
            metrics::record_ring_overwrite();
        }
        false
    });
}

async fn run_ring<T>(
    slot: Arc<watch::Sender<Option<T>>>,
    mut changes: watch::Receiver<Option<T>>,
    mut alive: mpsc::Receiver<()>,
    mut requests: mpsc::UnboundedReceiver<oneshot::Sender<T>>,
) {
    let mut waiter: Option<oneshot::Sender<T>> = None;
    let mut input_open = true;

    loop {
        // A ready reader plus a written value always goes first. This only
        // avoids needless overwrites; correctness does not depend on it.
        if let Some(tx) = waiter.take() {
            match take(&slot) {
                Some(value) => {
                    if let Err(value) = tx.send(value) {
                        restore(&slot, value);
                    }
                    continue;
                }
                None => waiter = Some(tx),
            }
        }

        if !input_open && slot.borrow().is_none() {
            break;
        }

        tokio::select! {
            biased;

            request = requests.recv(), if waiter.is_none() => match request {
                Some(tx) => waiter = Some(tx),
                None => break,
            },
            _ = changes.changed(), if waiter.is_some() => {}
            _ = alive.recv(), if input_open => input_open = false,
        }
    }

    tracing::trace!("Ring channel closed");
}
