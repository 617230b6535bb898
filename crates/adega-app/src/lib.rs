//! View-state engine for the shared wine cellar ("Diário de Vinhos").
//!
//! The controller keeps three things consistent: the session reported by
//! the identity gateway, the materialized copy of the remote wine
//! collection, and the derived view (search, filter, sort, modal state).
//! An embedding shell drives it through intent methods and re-renders on
//! the typed event stream.

mod bridge;
pub mod commands;
pub mod controller;
pub mod events;
pub mod projection;
pub mod state;

pub use controller::{ConfirmPrompt, Controller, ViewModel};
pub use events::Event;
pub use projection::project;
pub use state::{Action, AppState, SessionState, SortMode, TypeFilter};

use tracing_subscriber::{fmt, EnvFilter};

/// Initialise logging for the embedding shell. Call once at startup.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("adega_app=debug,adega_gateway=debug,warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
