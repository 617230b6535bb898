//! Central view state owned by the controller.
//!
//! The [`AppState`] struct is wrapped in `Arc<Mutex<>>` and shared between
//! the sync bridge, the intent handlers, and the embedding shell. All
//! mutation flows through [`AppState::apply`] with a typed [`Action`]; no
//! ambient globals, no side-channel writes.

use serde::Serialize;

use adega_shared::model::WineRecord;
use adega_shared::types::{Session, WineType};

/// The three observable session states.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub enum SessionState {
    /// Before the identity gateway's first notification (loading view).
    #[default]
    Unknown,
    /// No user signed in (authentication view).
    Absent,
    /// Authenticated (main application view).
    Present(Session),
}

impl SessionState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Present(session) => Some(session),
            _ => None,
        }
    }
}

/// Type filter chips: everything, or a single category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum TypeFilter {
    #[default]
    All,
    Only(WineType),
}

impl TypeFilter {
    pub fn matches(&self, wine_type: WineType) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Only(t) => *t == wine_type,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TypeFilter::All => "Todos",
            TypeFilter::Only(t) => t.label(),
        }
    }
}

impl std::fmt::Display for TypeFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for TypeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "Todos" {
            return Ok(TypeFilter::All);
        }
        s.parse::<WineType>().map(TypeFilter::Only)
    }
}

/// Sort modes, matching the UI select's values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// Gateway order: creation time descending.
    #[default]
    Recent,
    /// Derived average descending, unrated last.
    Rating,
    /// Name A-Z.
    Name,
}

/// Typed state mutations. The bridge applies the first two from gateway
/// notifications; the rest come from user intents.
#[derive(Debug, Clone)]
pub enum Action {
    SessionChanged(Option<Session>),
    SnapshotReceived(Vec<WineRecord>),
    SearchChanged(String),
    FilterChanged(TypeFilter),
    SortChanged(SortMode),
    AddFormOpened,
    AddFormClosed,
}

/// Everything the view is rendered from.
pub struct AppState {
    /// Current session, as last reported by the identity gateway.
    pub session: SessionState,

    /// Materialized copy of the remote collection. Replaced wholesale on
    /// every snapshot; never mutated locally.
    pub wines: Vec<WineRecord>,

    /// Search box contents.
    pub search: String,

    /// Active type filter chip.
    pub filter: TypeFilter,

    /// Active sort mode.
    pub sort: SortMode,

    /// Whether the add-wine modal is open.
    pub add_form_open: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            session: SessionState::Unknown,
            wines: Vec::new(),
            search: String::new(),
            filter: TypeFilter::All,
            sort: SortMode::Recent,
            add_form_open: false,
        }
    }

    pub fn apply(&mut self, action: Action) {
        match action {
            Action::SessionChanged(Some(session)) => {
                self.session = SessionState::Present(session);
            }
            Action::SessionChanged(None) => {
                self.session = SessionState::Absent;
            }
            Action::SnapshotReceived(wines) => {
                self.wines = wines;
            }
            Action::SearchChanged(text) => {
                self.search = text;
            }
            Action::FilterChanged(filter) => {
                self.filter = filter;
            }
            Action::SortChanged(sort) => {
                self.sort = sort;
            }
            Action::AddFormOpened => {
                self.add_form_open = true;
            }
            Action::AddFormClosed => {
                self.add_form_open = false;
            }
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
