//! Sync bridge: the single task that feeds gateway notifications into the
//! view state.
//!
//! Runs until both gateway streams close. Session notifications and
//! collection snapshots are applied as typed actions, then announced on the
//! event stream so the shell re-renders. Snapshots are full replacements,
//! so an out-of-order delivery can only show stale data, never corrupt the
//! list.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{debug, info};

use adega_gateway::{SessionStream, SnapshotStream};

use crate::events::{emit, Event};
use crate::state::{Action, AppState};

pub(crate) async fn run_bridge(
    state: Arc<Mutex<AppState>>,
    mut sessions: SessionStream,
    mut snapshots: SnapshotStream,
    event_tx: mpsc::Sender<Event>,
) {
    info!("Sync bridge started");

    let mut sessions_open = true;
    let mut snapshots_open = true;

    while sessions_open || snapshots_open {
        tokio::select! {
            notification = sessions.recv(), if sessions_open => match notification {
                Some(session) => {
                    debug!(present = session.is_some(), "Session notification");
                    apply(&state, Action::SessionChanged(session));
                    emit(&event_tx, Event::SessionChanged);
                }
                None => {
                    debug!("Session stream closed");
                    sessions_open = false;
                }
            },

            snapshot = snapshots.recv(), if snapshots_open => match snapshot {
                Some(wines) => {
                    debug!(count = wines.len(), "Collection snapshot received");
                    apply(&state, Action::SnapshotReceived(wines));
                    emit(&event_tx, Event::CollectionChanged);
                }
                None => {
                    debug!("Snapshot stream closed");
                    snapshots_open = false;
                }
            },
        }
    }

    info!("Sync bridge terminated");
}

fn apply(state: &Arc<Mutex<AppState>>, action: Action) {
    match state.lock() {
        Ok(mut guard) => guard.apply(action),
        Err(poisoned) => poisoned.into_inner().apply(action),
    }
}
