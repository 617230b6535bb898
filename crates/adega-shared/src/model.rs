//! Domain model for the shared wine cellar.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be handed
//! directly to a UI shell or across the document-store gateway. Decoding is
//! defensive: optional fields default instead of failing, since the remote
//! collection may hold documents written by older clients.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::MAX_PHOTO_BYTES;
use crate::types::{UserId, WineId, WineType};

// ---------------------------------------------------------------------------
// Rating
// ---------------------------------------------------------------------------

/// One user's score and tasting notes for one wine.
///
/// A wine holds at most one rating per user; the invariant is enforced by
/// [`upsert_rating`], not by the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub user_id: UserId,
    pub user_name: String,
    /// Score on the 1–10 scale.
    pub score: u8,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Replace-on-write: drop any prior rating by the same user, append the new
/// one. Returns a fresh vector; the input is untouched.
pub fn upsert_rating(ratings: &[Rating], rating: Rating) -> Vec<Rating> {
    let mut next: Vec<Rating> = ratings
        .iter()
        .filter(|r| r.user_id != rating.user_id)
        .cloned()
        .collect();
    next.push(rating);
    next
}

// ---------------------------------------------------------------------------
// Photo
// ---------------------------------------------------------------------------

/// An inline label photo, stored as a `data:` URL inside the document
/// (the store has no separate blob storage).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Photo(String);

#[derive(Error, Debug)]
pub enum PhotoError {
    #[error("Photo too large: {size} bytes (max {max})")]
    TooLarge { size: usize, max: usize },

    #[error("Not an image mime type: {0}")]
    UnsupportedMime(String),
}

impl Photo {
    /// Encode raw image bytes as an inline data URL.
    pub fn from_bytes(mime: &str, bytes: &[u8]) -> Result<Self, PhotoError> {
        if !mime.starts_with("image/") {
            return Err(PhotoError::UnsupportedMime(mime.to_string()));
        }
        if bytes.len() > MAX_PHOTO_BYTES {
            return Err(PhotoError::TooLarge {
                size: bytes.len(),
                max: MAX_PHOTO_BYTES,
            });
        }
        Ok(Self(format!("data:{mime};base64,{}", BASE64.encode(bytes))))
    }

    pub fn as_data_url(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// WineRecord
// ---------------------------------------------------------------------------

/// A cataloged wine with its descriptive metadata and accumulated ratings.
///
/// Owned by the document store; the controller holds a read-mostly cached
/// copy that is only ever replaced wholesale by a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WineRecord {
    /// Document id assigned by the store. Empty until the record is created.
    #[serde(default)]
    pub id: WineId,
    pub name: String,
    #[serde(rename = "type", default)]
    pub wine_type: WineType,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    /// Vintage year.
    #[serde(default)]
    pub vintage: Option<i32>,
    /// Price in BRL.
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub photo: Option<Photo>,
    #[serde(default)]
    pub added_by: UserId,
    #[serde(default)]
    pub added_by_name: String,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub ratings: Vec<Rating>,
}

impl WineRecord {
    /// Arithmetic mean of all rating scores, `None` when unrated.
    pub fn average(&self) -> Option<f64> {
        if self.ratings.is_empty() {
            return None;
        }
        let sum: u32 = self.ratings.iter().map(|r| u32::from(r.score)).sum();
        Some(f64::from(sum) / self.ratings.len() as f64)
    }

    /// The given user's existing rating, if any.
    pub fn rating_by(&self, user_id: &UserId) -> Option<&Rating> {
        self.ratings.iter().find(|r| &r.user_id == user_id)
    }
}

/// Render an average to one decimal place, with the unrated placeholder.
pub fn format_average(avg: Option<f64>) -> String {
    match avg {
        Some(v) => format!("{v:.1}"),
        None => "—".to_string(),
    }
}

// ---------------------------------------------------------------------------
// WineDraft
// ---------------------------------------------------------------------------

/// The add-wine form payload. Only the name is required; the add intent is
/// a no-op while [`WineDraft::trimmed_name`] is `None`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct WineDraft {
    pub name: String,
    #[serde(rename = "type")]
    pub wine_type: WineType,
    pub country: Option<String>,
    pub region: Option<String>,
    pub vintage: Option<i32>,
    pub price: Option<f64>,
    pub photo: Option<Photo>,
}

impl WineDraft {
    pub fn trimmed_name(&self) -> Option<&str> {
        let name = self.name.trim();
        (!name.is_empty()).then_some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WineId;

    fn rating(user: &str, score: u8) -> Rating {
        Rating {
            user_id: UserId(user.to_string()),
            user_name: user.to_string(),
            score,
            notes: None,
        }
    }

    fn wine(name: &str, ratings: Vec<Rating>) -> WineRecord {
        WineRecord {
            id: WineId("w1".to_string()),
            name: name.to_string(),
            wine_type: WineType::Tinto,
            country: None,
            region: None,
            vintage: None,
            price: None,
            photo: None,
            added_by: UserId("u1".to_string()),
            added_by_name: "Ana".to_string(),
            created_at: Utc::now(),
            ratings,
        }
    }

    #[test]
    fn test_average_unrated_is_none() {
        let w = wine("Reserva", vec![]);
        assert_eq!(w.average(), None);
        assert_eq!(format_average(w.average()), "—");
    }

    #[test]
    fn test_average_one_decimal() {
        let w = wine("Reserva", vec![rating("u1", 8), rating("u2", 5)]);
        assert_eq!(w.average(), Some(6.5));
        assert_eq!(format_average(w.average()), "6.5");
    }

    #[test]
    fn test_upsert_replaces_same_user() {
        // rate 8, rescind, rate 5: exactly one entry survives
        let first = upsert_rating(&[], rating("u2", 8));
        let second = upsert_rating(&first, rating("u2", 5));
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].score, 5);
    }

    #[test]
    fn test_upsert_keeps_other_users() {
        let ratings = upsert_rating(&[rating("u1", 7)], rating("u2", 9));
        assert_eq!(ratings.len(), 2);

        let again = upsert_rating(&ratings, rating("u2", 3));
        assert_eq!(again.len(), 2);
        assert_eq!(again.iter().find(|r| r.user_id.0 == "u2").unwrap().score, 3);
        assert_eq!(again.iter().find(|r| r.user_id.0 == "u1").unwrap().score, 7);
    }

    #[test]
    fn test_rating_by() {
        let w = wine("Reserva", vec![rating("u1", 7)]);
        assert_eq!(w.rating_by(&UserId("u1".to_string())).unwrap().score, 7);
        assert!(w.rating_by(&UserId("u9".to_string())).is_none());
    }

    #[test]
    fn test_photo_data_url() {
        let photo = Photo::from_bytes("image/png", &[1, 2, 3]).unwrap();
        assert!(photo.as_data_url().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_photo_rejects_oversize() {
        let bytes = vec![0u8; MAX_PHOTO_BYTES + 1];
        assert!(matches!(
            Photo::from_bytes("image/jpeg", &bytes),
            Err(PhotoError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_photo_rejects_non_image() {
        assert!(matches!(
            Photo::from_bytes("application/pdf", &[0u8]),
            Err(PhotoError::UnsupportedMime(_))
        ));
    }

    #[test]
    fn test_draft_name_gate() {
        let mut draft = WineDraft {
            name: "   ".to_string(),
            ..WineDraft::default()
        };
        assert_eq!(draft.trimmed_name(), None);

        draft.name = "  Reserva 2020 ".to_string();
        assert_eq!(draft.trimmed_name(), Some("Reserva 2020"));
    }

    #[test]
    fn test_record_decodes_with_missing_optionals() {
        // Documents written by older clients may omit almost everything.
        let value = serde_json::json!({ "name": "Colheita" });
        let record: WineRecord = serde_json::from_value(value).unwrap();
        assert_eq!(record.name, "Colheita");
        assert_eq!(record.wine_type, WineType::Tinto);
        assert!(record.ratings.is_empty());
        assert!(record.country.is_none());
        assert!(record.id.is_empty());
    }
}
