//! Multi-subscriber notification fan-out.
//!
//! Both gateways push their streams (session changes, collection snapshots)
//! to every live subscriber. Sends are best-effort: a closed receiver is
//! pruned, a full one is skipped. The consumer only ever needs the latest
//! value, and the next push catches it up.

use std::sync::{Mutex, MutexGuard};

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use adega_shared::constants::CHANNEL_CAPACITY;

pub(crate) struct Fanout<T> {
    senders: Mutex<Vec<mpsc::Sender<T>>>,
}

impl<T> Default for Fanout<T> {
    fn default() -> Self {
        Self {
            senders: Mutex::new(Vec::new()),
        }
    }
}

impl<T: Clone> Fanout<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn senders(&self) -> MutexGuard<'_, Vec<mpsc::Sender<T>>> {
        // A poisoned lock only means a panic elsewhere; the sender list
        // itself is still usable.
        match self.senders.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Register a new subscriber, optionally seeding it with an initial value.
    pub fn subscribe(&self, initial: Option<T>) -> mpsc::Receiver<T> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        if let Some(value) = initial {
            let _ = tx.try_send(value);
        }
        self.senders().push(tx);
        rx
    }

    /// Push a value to every live subscriber, dropping closed ones.
    pub fn send(&self, value: T) {
        self.senders().retain(|tx| match tx.try_send(value.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!("Subscriber channel full, skipping push");
                true
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Dropping closed subscriber");
                false
            }
        });
    }

    pub fn subscriber_count(&self) -> usize {
        self.senders().len()
    }
}
