//! Document-store seam: the wine collection's snapshot stream and its three
//! write operations.
//!
//! The store pushes a full-replace snapshot (ordered newest-first) to every
//! subscriber whenever the collection changes. The REST implementation
//! realizes that contract with a background refresh task fanning out over
//! mpsc channels; writes trigger an eager refresh so the confirming snapshot
//! arrives promptly.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use adega_shared::constants::{MAX_SCORE, MIN_SCORE, WINES_COLLECTION};
use adega_shared::model::{Photo, Rating, WineRecord};
use adega_shared::types::{UserId, WineId, WineType};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::fanout::Fanout;

/// A full-collection snapshot, ordered by creation time descending.
pub type Snapshot = Vec<WineRecord>;

/// Snapshot notifications. Dropping the receiver unsubscribes.
pub type SnapshotStream = mpsc::Receiver<Snapshot>;

/// Contract of the managed document store, scoped to the wine collection.
#[async_trait]
pub trait CollectionGateway: Send + Sync {
    /// Subscribe to collection snapshots. A current snapshot is delivered
    /// shortly after subscribing, then one per change.
    async fn subscribe(&self) -> SnapshotStream;

    /// Create a document; the store assigns and returns its id.
    async fn create(&self, record: &WineRecord) -> Result<WineId, GatewayError>;

    /// Patch only the ratings field of one document.
    async fn update_ratings(&self, id: &WineId, ratings: &[Rating]) -> Result<(), GatewayError>;

    async fn delete(&self, id: &WineId) -> Result<(), GatewayError>;
}

/// Order a snapshot by creation time, newest first.
pub(crate) fn sort_newest_first(wines: &mut [WineRecord]) {
    wines.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

/// A wine document as stored remotely: everything but the id, which is the
/// document's key. Decoding is defensive: optional fields default, and
/// ratings with out-of-range scores are discarded.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WineDoc {
    name: String,
    #[serde(rename = "type", default)]
    wine_type: WineType,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    vintage: Option<i32>,
    #[serde(default)]
    price: Option<f64>,
    #[serde(default)]
    photo: Option<Photo>,
    #[serde(default)]
    added_by: UserId,
    #[serde(default)]
    added_by_name: String,
    #[serde(default)]
    created_at: DateTime<Utc>,
    #[serde(default)]
    ratings: Vec<Rating>,
}

impl WineDoc {
    fn from_record(record: &WineRecord) -> Self {
        Self {
            name: record.name.clone(),
            wine_type: record.wine_type,
            country: record.country.clone(),
            region: record.region.clone(),
            vintage: record.vintage,
            price: record.price,
            photo: record.photo.clone(),
            added_by: record.added_by.clone(),
            added_by_name: record.added_by_name.clone(),
            created_at: record.created_at,
            ratings: record.ratings.clone(),
        }
    }

    fn into_record(self, id: WineId) -> WineRecord {
        let before = self.ratings.len();
        let ratings: Vec<Rating> = self
            .ratings
            .into_iter()
            .filter(|r| (MIN_SCORE..=MAX_SCORE).contains(&r.score))
            .collect();
        if ratings.len() != before {
            warn!(
                wine = %id,
                dropped = before - ratings.len(),
                "Discarded ratings with out-of-range scores"
            );
        }
        WineRecord {
            id,
            name: self.name,
            wine_type: self.wine_type,
            country: self.country,
            region: self.region,
            vintage: self.vintage,
            price: self.price,
            photo: self.photo,
            added_by: self.added_by,
            added_by_name: self.added_by_name,
            created_at: self.created_at,
            ratings,
        }
    }
}

// ---------------------------------------------------------------------------
// REST implementation
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CreateResponse {
    name: String,
}

/// Collection gateway over the store's JSON REST surface.
pub struct RestCollectionGateway {
    http: reqwest::Client,
    config: GatewayConfig,
    fanout: Arc<Fanout<Snapshot>>,
    refresh: Arc<Notify>,
    last: Arc<Mutex<Option<Snapshot>>>,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl RestCollectionGateway {
    pub fn new(config: GatewayConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().user_agent("adega/0.1").build()?;
        Ok(Self {
            http,
            config,
            fanout: Arc::new(Fanout::new()),
            refresh: Arc::new(Notify::new()),
            last: Arc::new(Mutex::new(None)),
            poller: Mutex::new(None),
        })
    }

    fn collection_url(&self) -> String {
        format!(
            "{}/{}.json?key={}",
            self.config.store_url.trim_end_matches('/'),
            WINES_COLLECTION,
            self.config.api_key
        )
    }

    fn doc_url(&self, id: &WineId) -> String {
        format!(
            "{}/{}/{}.json?key={}",
            self.config.store_url.trim_end_matches('/'),
            WINES_COLLECTION,
            id,
            self.config.api_key
        )
    }

    /// Spawn the refresh task if it is not already running.
    fn ensure_poller(&self) {
        let mut slot = match self.poller.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if slot.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        let http = self.http.clone();
        let url = self.collection_url();
        let fanout = self.fanout.clone();
        let refresh = self.refresh.clone();
        let last = self.last.clone();
        let interval = self.config.poll_interval;

        *slot = Some(tokio::spawn(async move {
            debug!("Snapshot refresh task started");
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = refresh.notified() => {}
                }

                if fanout.subscriber_count() == 0 {
                    info!("Last snapshot subscriber gone, stopping refresh task");
                    break;
                }

                match fetch_snapshot(&http, &url).await {
                    Ok(snapshot) => {
                        let changed = {
                            let mut guard = lock_last(&last);
                            if guard.as_ref() != Some(&snapshot) {
                                *guard = Some(snapshot.clone());
                                true
                            } else {
                                false
                            }
                        };
                        if changed {
                            debug!(count = snapshot.len(), "Collection changed, pushing snapshot");
                            fanout.send(snapshot);
                        }
                    }
                    Err(e) => warn!(error = %e, "Snapshot refresh failed"),
                }
            }
        }));
    }
}

fn lock_last(last: &Mutex<Option<Snapshot>>) -> MutexGuard<'_, Option<Snapshot>> {
    match last.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

async fn fetch_snapshot(http: &reqwest::Client, url: &str) -> Result<Snapshot, GatewayError> {
    let resp = http.get(url).send().await?;
    if !resp.status().is_success() {
        return Err(GatewayError::Rejected(format!("status {}", resp.status())));
    }

    // The collection is a map of id -> document; null when empty.
    let docs: Option<BTreeMap<String, WineDoc>> = resp
        .json()
        .await
        .map_err(|e| GatewayError::Decode(e.to_string()))?;

    let mut wines: Vec<WineRecord> = docs
        .unwrap_or_default()
        .into_iter()
        .map(|(id, doc)| doc.into_record(WineId(id)))
        .collect();
    sort_newest_first(&mut wines);
    Ok(wines)
}

#[async_trait]
impl CollectionGateway for RestCollectionGateway {
    async fn subscribe(&self) -> SnapshotStream {
        let initial = match fetch_snapshot(&self.http, &self.collection_url()).await {
            Ok(snapshot) => {
                *lock_last(&self.last) = Some(snapshot.clone());
                Some(snapshot)
            }
            Err(e) => {
                warn!(error = %e, "Initial snapshot fetch failed; next refresh will retry");
                None
            }
        };
        let rx = self.fanout.subscribe(initial);
        self.ensure_poller();
        rx
    }

    async fn create(&self, record: &WineRecord) -> Result<WineId, GatewayError> {
        let resp = self
            .http
            .post(self.collection_url())
            .json(&WineDoc::from_record(record))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(GatewayError::Rejected(format!("status {}", resp.status())));
        }

        let created: CreateResponse = resp
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;
        self.refresh.notify_one();
        Ok(WineId(created.name))
    }

    async fn update_ratings(&self, id: &WineId, ratings: &[Rating]) -> Result<(), GatewayError> {
        let resp = self
            .http
            .patch(self.doc_url(id))
            .json(&serde_json::json!({ "ratings": ratings }))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(GatewayError::Rejected(format!("status {}", resp.status())));
        }
        self.refresh.notify_one();
        Ok(())
    }

    async fn delete(&self, id: &WineId) -> Result<(), GatewayError> {
        let resp = self.http.delete(self.doc_url(id)).send().await?;
        if !resp.status().is_success() {
            return Err(GatewayError::Rejected(format!("status {}", resp.status())));
        }
        self.refresh.notify_one();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_decode_drops_out_of_range_scores() {
        let value = serde_json::json!({
            "name": "Reserva",
            "ratings": [
                { "userId": "u1", "userName": "Ana", "score": 8 },
                { "userId": "u2", "userName": "Bia", "score": 0 },
                { "userId": "u3", "userName": "Caio", "score": 15 },
            ],
        });
        let doc: WineDoc = serde_json::from_value(value).unwrap();
        let record = doc.into_record(WineId("w1".to_string()));
        assert_eq!(record.ratings.len(), 1);
        assert_eq!(record.ratings[0].score, 8);
    }

    #[test]
    fn test_sort_newest_first() {
        let mk = |name: &str, secs: i64| {
            let value = serde_json::json!({ "name": name });
            let doc: WineDoc = serde_json::from_value(value).unwrap();
            let mut record = doc.into_record(WineId(name.to_string()));
            record.created_at = DateTime::from_timestamp(secs, 0).unwrap();
            record
        };

        let mut wines = vec![mk("old", 100), mk("new", 300), mk("mid", 200)];
        sort_newest_first(&mut wines);
        let names: Vec<&str> = wines.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, ["new", "mid", "old"]);
    }

    #[test]
    fn test_doc_round_trip_preserves_fields() {
        let value = serde_json::json!({
            "name": "Colheita",
            "type": "Rosé",
            "country": "Brasil",
            "region": "Serra Gaúcha",
            "vintage": 2021,
            "addedBy": "u1",
            "addedByName": "Ana",
        });
        let doc: WineDoc = serde_json::from_value(value).unwrap();
        let record = doc.into_record(WineId("w1".to_string()));
        assert_eq!(record.wine_type, WineType::Rose);
        assert_eq!(record.region.as_deref(), Some("Serra Gaúcha"));

        let encoded = serde_json::to_value(WineDoc::from_record(&record)).unwrap();
        assert_eq!(encoded["type"], "Rosé");
        assert_eq!(encoded["addedByName"], "Ana");
    }
}
