//! Controller wiring: subscribe once to both gateways, spawn the sync
//! bridge, and hand the embedding shell a handle with the intent entry
//! points and the projected view.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use adega_gateway::{CollectionGateway, IdentityGateway};
use adega_shared::constants::CHANNEL_CAPACITY;
use adega_shared::model::WineRecord;
use adega_shared::types::Session;

use crate::bridge::run_bridge;
use crate::events::Event;
use crate::projection::project;
use crate::state::{Action, AppState, SessionState, SortMode, TypeFilter};

/// Blocking yes/no confirmation for destructive actions, answered by the
/// embedding shell (dialog box, terminal prompt, …).
pub trait ConfirmPrompt: Send + Sync {
    fn confirm(&self, message: &str) -> bool;
}

/// Everything the view is rendered from, with the projection applied.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewModel {
    pub session: SessionState,
    /// Filtered and sorted projection of the materialized list.
    pub wines: Vec<WineRecord>,
    /// Projection size ("N vinhos na adega").
    pub total: usize,
    pub search: String,
    pub filter: TypeFilter,
    pub sort: SortMode,
    pub add_form_open: bool,
}

/// Handle to the running view-state controller. Cheap to clone; every
/// clone shares the same state and subscriptions.
#[derive(Clone)]
pub struct Controller {
    state: Arc<Mutex<AppState>>,
    pub(crate) identity: Arc<dyn IdentityGateway>,
    pub(crate) collection: Arc<dyn CollectionGateway>,
    pub(crate) confirm: Arc<dyn ConfirmPrompt>,
    pub(crate) event_tx: mpsc::Sender<Event>,
}

impl Controller {
    /// Subscribe to both gateway streams and start the sync bridge.
    ///
    /// Returns the handle, the event stream for the shell, and the bridge
    /// task handle. The bridge ends (and the subscriptions with it) when
    /// both gateway streams close; aborting the task tears the controller
    /// down early.
    pub async fn spawn(
        identity: Arc<dyn IdentityGateway>,
        collection: Arc<dyn CollectionGateway>,
        confirm: Arc<dyn ConfirmPrompt>,
    ) -> (Self, mpsc::Receiver<Event>, JoinHandle<()>) {
        let state = Arc::new(Mutex::new(AppState::new()));
        let (event_tx, event_rx) = mpsc::channel(CHANNEL_CAPACITY);

        let sessions = identity.subscribe().await;
        let snapshots = collection.subscribe().await;
        let bridge = tokio::spawn(run_bridge(
            state.clone(),
            sessions,
            snapshots,
            event_tx.clone(),
        ));

        let controller = Self {
            state,
            identity,
            collection,
            confirm,
            event_tx,
        };
        (controller, event_rx, bridge)
    }

    /// Project the current state for rendering.
    pub fn view(&self) -> Result<ViewModel, String> {
        let guard = self.lock_state()?;
        let wines = project(&guard.wines, &guard.search, &guard.filter, guard.sort);
        Ok(ViewModel {
            session: guard.session.clone(),
            total: wines.len(),
            wines,
            search: guard.search.clone(),
            filter: guard.filter,
            sort: guard.sort,
            add_form_open: guard.add_form_open,
        })
    }

    /// The authenticated session, if any.
    pub fn current_session(&self) -> Result<Option<Session>, String> {
        Ok(self.lock_state()?.session.session().cloned())
    }

    pub(crate) fn apply(&self, action: Action) -> Result<(), String> {
        self.lock_state()?.apply(action);
        Ok(())
    }

    pub(crate) fn lock_state(&self) -> Result<MutexGuard<'_, AppState>, String> {
        self.state.lock().map_err(|e| format!("Lock poisoned: {e}"))
    }
}
