//! UI-state intents: search text, filter chip, sort mode, add-form
//! visibility. These never touch the gateways.

use crate::controller::Controller;
use crate::state::{Action, SortMode, TypeFilter};

impl Controller {
    pub fn set_search(&self, text: impl Into<String>) -> Result<(), String> {
        self.apply(Action::SearchChanged(text.into()))
    }

    pub fn set_filter(&self, filter: TypeFilter) -> Result<(), String> {
        self.apply(Action::FilterChanged(filter))
    }

    pub fn set_sort(&self, sort: SortMode) -> Result<(), String> {
        self.apply(Action::SortChanged(sort))
    }

    pub fn open_add_form(&self) -> Result<(), String> {
        self.apply(Action::AddFormOpened)
    }

    pub fn close_add_form(&self) -> Result<(), String> {
        self.apply(Action::AddFormClosed)
    }
}
