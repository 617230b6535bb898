// Domain model shared by the gateway and controller layers.

pub mod constants;
pub mod model;
pub mod types;

pub use model::{format_average, upsert_rating, Photo, PhotoError, Rating, WineDraft, WineRecord};
pub use types::{Session, UserId, WineId, WineType};
