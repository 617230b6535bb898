// Intent handlers, grouped by concern. Each module extends `Controller`.

pub mod auth;
pub mod view;
pub mod wines;
