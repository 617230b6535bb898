//! In-memory gateway implementations.
//!
//! Back the controller with process-local state instead of the managed
//! backend: the test double for everything above the gateway seam, and a
//! way to run the app offline. Snapshots fan out synchronously on every
//! write, so behavior matches the remote contract minus network latency.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::{debug, info};
use uuid::Uuid;

use adega_shared::model::{Rating, WineRecord};
use adega_shared::types::{Session, UserId, WineId};

use crate::collection::{sort_newest_first, CollectionGateway, Snapshot, SnapshotStream};
use crate::error::{AuthError, GatewayError};
use crate::fanout::Fanout;
use crate::identity::{IdentityGateway, SessionStream};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn provider_err(code: &str) -> AuthError {
    AuthError::Provider {
        code: code.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

struct StoredUser {
    uid: UserId,
    password: String,
    display_name: String,
}

/// Process-local identity provider keyed by email.
#[derive(Default)]
pub struct InMemoryIdentityGateway {
    users: Mutex<HashMap<String, StoredUser>>,
    current: Mutex<Option<Session>>,
    sessions: Fanout<Option<Session>>,
}

impl InMemoryIdentityGateway {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityGateway for InMemoryIdentityGateway {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        if !email.contains('@') {
            return Err(provider_err("auth/invalid-email"));
        }
        if password.len() < 6 {
            return Err(provider_err("auth/weak-password"));
        }

        let session = {
            let mut users = lock(&self.users);
            if users.contains_key(email) {
                return Err(provider_err("auth/email-already-in-use"));
            }
            let uid = UserId(Uuid::new_v4().to_string());
            users.insert(
                email.to_string(),
                StoredUser {
                    uid: uid.clone(),
                    password: password.to_string(),
                    display_name: String::new(),
                },
            );
            Session {
                user_id: uid,
                display_name: String::new(),
            }
        };

        info!(user = %session.user_id, "Account created (in-memory)");
        *lock(&self.current) = Some(session.clone());
        self.sessions.send(Some(session.clone()));
        Ok(session)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let session = {
            let users = lock(&self.users);
            let user = users.get(email).ok_or_else(|| provider_err("auth/user-not-found"))?;
            if user.password != password {
                return Err(provider_err("auth/wrong-password"));
            }
            Session {
                user_id: user.uid.clone(),
                display_name: user.display_name.clone(),
            }
        };

        info!(user = %session.user_id, "Signed in (in-memory)");
        *lock(&self.current) = Some(session.clone());
        self.sessions.send(Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) {
        lock(&self.current).take();
        debug!("Signed out (in-memory)");
        self.sessions.send(None);
    }

    async fn set_display_name(&self, name: &str) -> Result<Session, AuthError> {
        let mut current = lock(&self.current);
        let session = current.as_mut().ok_or(AuthError::NoSession)?;
        session.display_name = name.to_string();
        let updated = session.clone();
        drop(current);

        let mut users = lock(&self.users);
        if let Some(user) = users.values_mut().find(|u| u.uid == updated.user_id) {
            user.display_name = name.to_string();
        }
        drop(users);

        self.sessions.send(Some(updated.clone()));
        Ok(updated)
    }

    async fn subscribe(&self) -> SessionStream {
        let initial = lock(&self.current).clone();
        self.sessions.subscribe(Some(initial))
    }
}

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

/// Process-local wine collection with synchronous snapshot fan-out.
#[derive(Default)]
pub struct InMemoryCollectionGateway {
    docs: Mutex<Vec<WineRecord>>,
    fanout: Fanout<Snapshot>,
}

impl InMemoryCollectionGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn snapshot(&self) -> Snapshot {
        let mut wines = lock(&self.docs).clone();
        sort_newest_first(&mut wines);
        wines
    }
}

#[async_trait]
impl CollectionGateway for InMemoryCollectionGateway {
    async fn subscribe(&self) -> SnapshotStream {
        self.fanout.subscribe(Some(self.snapshot()))
    }

    async fn create(&self, record: &WineRecord) -> Result<WineId, GatewayError> {
        let id = WineId(Uuid::new_v4().to_string());
        let mut stored = record.clone();
        stored.id = id.clone();
        lock(&self.docs).push(stored);

        debug!(wine = %id, "Document created (in-memory)");
        self.fanout.send(self.snapshot());
        Ok(id)
    }

    async fn update_ratings(&self, id: &WineId, ratings: &[Rating]) -> Result<(), GatewayError> {
        {
            let mut docs = lock(&self.docs);
            let wine = docs
                .iter_mut()
                .find(|w| &w.id == id)
                .ok_or_else(|| GatewayError::Rejected(format!("no such document: {id}")))?;
            wine.ratings = ratings.to_vec();
        }
        self.fanout.send(self.snapshot());
        Ok(())
    }

    async fn delete(&self, id: &WineId) -> Result<(), GatewayError> {
        lock(&self.docs).retain(|w| &w.id != id);
        self.fanout.send(self.snapshot());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn record(name: &str, secs: i64) -> WineRecord {
        WineRecord {
            id: WineId::default(),
            name: name.to_string(),
            wine_type: Default::default(),
            country: None,
            region: None,
            vintage: None,
            price: None,
            photo: None,
            added_by: UserId("u1".to_string()),
            added_by_name: "Ana".to_string(),
            created_at: DateTime::from_timestamp(secs, 0).unwrap(),
            ratings: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_identity_notifies_subscribers() {
        let identity = InMemoryIdentityGateway::new();
        let mut sessions = identity.subscribe().await;

        // Initial notification: nobody signed in.
        assert_eq!(sessions.recv().await, Some(None));

        identity.sign_up("ana@example.com", "segredo1").await.unwrap();
        let session = sessions.recv().await.unwrap().unwrap();
        assert!(!session.user_id.0.is_empty());

        identity.sign_out().await;
        assert_eq!(sessions.recv().await, Some(None));
    }

    #[tokio::test]
    async fn test_identity_error_codes() {
        let identity = InMemoryIdentityGateway::new();

        let err = identity.sign_up("not-an-email", "segredo1").await.unwrap_err();
        assert_eq!(err.code(), Some("auth/invalid-email"));

        let err = identity.sign_up("ana@example.com", "curta").await.unwrap_err();
        assert_eq!(err.code(), Some("auth/weak-password"));

        identity.sign_up("ana@example.com", "segredo1").await.unwrap();
        let err = identity.sign_up("ana@example.com", "segredo1").await.unwrap_err();
        assert_eq!(err.code(), Some("auth/email-already-in-use"));

        let err = identity.sign_in("bia@example.com", "segredo1").await.unwrap_err();
        assert_eq!(err.code(), Some("auth/user-not-found"));

        let err = identity.sign_in("ana@example.com", "errada1").await.unwrap_err();
        assert_eq!(err.code(), Some("auth/wrong-password"));
    }

    #[tokio::test]
    async fn test_display_name_round_trip() {
        let identity = InMemoryIdentityGateway::new();
        identity.sign_up("ana@example.com", "segredo1").await.unwrap();
        identity.set_display_name("Ana").await.unwrap();

        identity.sign_out().await;
        let session = identity.sign_in("ana@example.com", "segredo1").await.unwrap();
        assert_eq!(session.display_name, "Ana");
    }

    #[tokio::test]
    async fn test_collection_snapshots_newest_first() {
        let collection = InMemoryCollectionGateway::new();
        let mut snapshots = collection.subscribe().await;

        assert_eq!(snapshots.recv().await, Some(vec![]));

        collection.create(&record("antigo", 100)).await.unwrap();
        snapshots.recv().await.unwrap();

        collection.create(&record("novo", 200)).await.unwrap();
        let snap = snapshots.recv().await.unwrap();
        let names: Vec<&str> = snap.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, ["novo", "antigo"]);
    }

    #[tokio::test]
    async fn test_update_ratings_unknown_document() {
        let collection = InMemoryCollectionGateway::new();
        let err = collection
            .update_ratings(&WineId("missing".to_string()), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Rejected(_)));
    }

    #[tokio::test]
    async fn test_delete_removes_document() {
        let collection = InMemoryCollectionGateway::new();
        let id = collection.create(&record("efêmero", 100)).await.unwrap();
        collection.delete(&id).await.unwrap();
        assert!(collection.snapshot().is_empty());
    }
}
