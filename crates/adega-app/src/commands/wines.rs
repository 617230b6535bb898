//! Write intents against the wine collection.
//!
//! Each intent is a single round trip: nothing in the materialized list is
//! touched optimistically, the confirming snapshot performs the update.

use chrono::Utc;
use tracing::{debug, error, info, warn};

use adega_shared::constants::{MAX_SCORE, MIN_SCORE};
use adega_shared::model::{upsert_rating, Rating, WineDraft, WineRecord};
use adega_shared::types::WineId;

use crate::controller::Controller;
use crate::events::{emit, Event};
use crate::state::Action;

/// Confirmation shown before deleting a wine.
pub const CONFIRM_DELETE: &str = "Remover este vinho?";

/// Drop empty-after-trim form strings.
fn clean(field: Option<String>) -> Option<String> {
    field
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl Controller {
    /// Catalog a new wine. A draft without a name, or without a session, is
    /// a silent no-op. On success the add form closes; on a store rejection
    /// it stays open and the failure is surfaced.
    pub async fn add_wine(&self, draft: WineDraft) -> Result<(), String> {
        let Some(name) = draft.trimmed_name().map(str::to_string) else {
            debug!("Add wine ignored: empty name");
            return Ok(());
        };
        let Some(session) = self.current_session()? else {
            debug!("Add wine ignored: no session");
            return Ok(());
        };

        let record = WineRecord {
            id: WineId::default(),
            name,
            wine_type: draft.wine_type,
            country: clean(draft.country),
            region: clean(draft.region),
            vintage: draft.vintage,
            price: draft.price,
            photo: draft.photo,
            added_by: session.user_id,
            added_by_name: session.display_name,
            created_at: Utc::now(),
            ratings: Vec::new(),
        };

        match self.collection.create(&record).await {
            Ok(id) => {
                info!(wine = %id, name = %record.name, "Wine created");
                self.apply(Action::AddFormClosed)?;
                emit(&self.event_tx, Event::AddFormClosed);
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Failed to create wine");
                emit(
                    &self.event_tx,
                    Event::WriteFailed {
                        intent: "add_wine",
                        message: e.to_string(),
                    },
                );
                Err(format!("Falha ao cadastrar o vinho: {e}"))
            }
        }
    }

    /// Submit (or replace) the session user's rating for a wine. Scores
    /// outside 1–10 are ignored; the UI never enables the action for them.
    pub async fn submit_rating(
        &self,
        wine_id: &WineId,
        score: u8,
        notes: Option<String>,
    ) -> Result<(), String> {
        if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
            debug!(score, "Rating ignored: score out of range");
            return Ok(());
        }
        let Some(session) = self.current_session()? else {
            debug!("Rating ignored: no session");
            return Ok(());
        };

        let ratings = {
            let guard = self.lock_state()?;
            let Some(wine) = guard.wines.iter().find(|w| &w.id == wine_id) else {
                warn!(wine = %wine_id, "Rating ignored: wine not in materialized list");
                return Ok(());
            };
            upsert_rating(
                &wine.ratings,
                Rating {
                    user_id: session.user_id,
                    user_name: session.display_name,
                    score,
                    notes: clean(notes),
                },
            )
        };

        match self.collection.update_ratings(wine_id, &ratings).await {
            Ok(()) => {
                info!(wine = %wine_id, score, "Rating submitted");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Failed to submit rating");
                emit(
                    &self.event_tx,
                    Event::WriteFailed {
                        intent: "submit_rating",
                        message: e.to_string(),
                    },
                );
                Err(format!("Falha ao salvar a avaliação: {e}"))
            }
        }
    }

    /// Delete a wine the session user cataloged, after explicit
    /// confirmation. The view only offers delete to the record's creator;
    /// the handler re-checks and no-ops for anyone else.
    pub async fn delete_wine(&self, wine_id: &WineId) -> Result<(), String> {
        let Some(session) = self.current_session()? else {
            debug!("Delete ignored: no session");
            return Ok(());
        };

        let owns = {
            let guard = self.lock_state()?;
            guard
                .wines
                .iter()
                .find(|w| &w.id == wine_id)
                .map(|w| w.added_by == session.user_id)
        };
        match owns {
            None => {
                warn!(wine = %wine_id, "Delete ignored: wine not in materialized list");
                return Ok(());
            }
            Some(false) => {
                warn!(wine = %wine_id, "Delete refused: not added by this user");
                return Ok(());
            }
            Some(true) => {}
        }

        if !self.confirm.confirm(CONFIRM_DELETE) {
            debug!(wine = %wine_id, "Delete cancelled");
            return Ok(());
        }

        match self.collection.delete(wine_id).await {
            Ok(()) => {
                info!(wine = %wine_id, "Wine deleted");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Failed to delete wine");
                emit(
                    &self.event_tx,
                    Event::WriteFailed {
                        intent: "delete_wine",
                        message: e.to_string(),
                    },
                );
                Err(format!("Falha ao remover o vinho: {e}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    use tokio::sync::mpsc;

    use adega_gateway::{
        CollectionGateway, GatewayError, IdentityGateway, InMemoryIdentityGateway, Snapshot,
        SnapshotStream,
    };
    use adega_shared::model::format_average;
    use adega_shared::types::UserId;

    use super::*;
    use crate::controller::testutil::{harness, wait_for_event, wait_until, Harness, StubPrompt};
    use crate::state::SessionState;

    async fn sign_up_and_wait(h: &Harness, name: &str, email: &str) {
        h.controller.sign_up(name, email, "segredo1").await.unwrap();
        wait_until(|| {
            matches!(
                &h.controller.view().unwrap().session,
                SessionState::Present(s) if s.display_name == name
            )
        })
        .await;
    }

    async fn add_and_wait(h: &Harness, name: &str) -> WineId {
        let before = h.controller.view().unwrap().total;
        h.controller
            .add_wine(WineDraft {
                name: name.to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        wait_until(|| h.controller.view().unwrap().total == before + 1).await;
        h.controller
            .view()
            .unwrap()
            .wines
            .iter()
            .find(|w| w.name == name)
            .map(|w| w.id.clone())
            .expect("created wine in view")
    }

    #[tokio::test]
    async fn test_add_with_empty_name_is_a_no_op() {
        let h = harness(true).await;
        sign_up_and_wait(&h, "Ana", "ana@example.com").await;

        h.controller
            .add_wine(WineDraft {
                name: "   ".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        // Nothing was created, nothing to wait for.
        assert_eq!(h.controller.view().unwrap().total, 0);
    }

    #[tokio::test]
    async fn test_add_closes_form_and_materializes() {
        let mut h = harness(true).await;
        sign_up_and_wait(&h, "Ana", "ana@example.com").await;

        h.controller.open_add_form().unwrap();
        let id = add_and_wait(&h, "Reserva 2020").await;
        wait_for_event(&mut h.events, |e| *e == Event::AddFormClosed).await;

        let view = h.controller.view().unwrap();
        assert!(!view.add_form_open);

        let wine = view.wines.iter().find(|w| w.id == id).unwrap();
        assert_eq!(wine.added_by_name, "Ana");
        // Round trip: unrated until someone rates it.
        assert_eq!(wine.average(), None);
        assert_eq!(format_average(wine.average()), "—");
    }

    #[tokio::test]
    async fn test_rating_twice_keeps_one_entry() {
        let h = harness(true).await;
        sign_up_and_wait(&h, "Ana", "ana@example.com").await;
        let id = add_and_wait(&h, "Reserva").await;

        h.controller.submit_rating(&id, 8, None).await.unwrap();
        wait_until(|| {
            h.controller.view().unwrap().wines[0]
                .rating_by(&current_uid(&h))
                .is_some_and(|r| r.score == 8)
        })
        .await;

        h.controller
            .submit_rating(&id, 5, Some("melhor do que lembrava".to_string()))
            .await
            .unwrap();
        wait_until(|| {
            h.controller.view().unwrap().wines[0]
                .rating_by(&current_uid(&h))
                .is_some_and(|r| r.score == 5)
        })
        .await;

        let view = h.controller.view().unwrap();
        assert_eq!(view.wines[0].ratings.len(), 1);
        assert_eq!(
            view.wines[0].ratings[0].notes.as_deref(),
            Some("melhor do que lembrava")
        );
    }

    #[tokio::test]
    async fn test_out_of_range_scores_are_ignored() {
        let h = harness(true).await;
        sign_up_and_wait(&h, "Ana", "ana@example.com").await;
        let id = add_and_wait(&h, "Reserva").await;

        h.controller.submit_rating(&id, 0, None).await.unwrap();
        h.controller.submit_rating(&id, 11, None).await.unwrap();

        assert!(h.controller.view().unwrap().wines[0].ratings.is_empty());
    }

    #[tokio::test]
    async fn test_delete_needs_confirmation() {
        let h = harness(false).await;
        sign_up_and_wait(&h, "Ana", "ana@example.com").await;
        let id = add_and_wait(&h, "Efêmero").await;

        h.controller.delete_wine(&id).await.unwrap();

        assert_eq!(h.prompt.calls.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(h.controller.view().unwrap().total, 1);
    }

    #[tokio::test]
    async fn test_delete_by_owner_removes_wine() {
        let h = harness(true).await;
        sign_up_and_wait(&h, "Ana", "ana@example.com").await;
        let id = add_and_wait(&h, "Efêmero").await;

        h.controller.delete_wine(&id).await.unwrap();
        wait_until(|| h.controller.view().unwrap().total == 0).await;
    }

    #[tokio::test]
    async fn test_delete_by_non_owner_is_refused_without_prompting() {
        let h = harness(true).await;
        sign_up_and_wait(&h, "Ana", "ana@example.com").await;
        let id = add_and_wait(&h, "Da Ana").await;

        h.controller.sign_out().await;
        sign_up_and_wait(&h, "Bia", "bia@example.com").await;

        h.controller.delete_wine(&id).await.unwrap();

        // Never even asked for confirmation, and the wine survived.
        assert_eq!(h.prompt.calls.load(std::sync::atomic::Ordering::SeqCst), 0);
        assert_eq!(h.controller.view().unwrap().total, 1);
    }

    // -- store-rejection path ------------------------------------------------

    struct FailingCollection;

    #[async_trait::async_trait]
    impl CollectionGateway for FailingCollection {
        async fn subscribe(&self) -> SnapshotStream {
            let (tx, rx) = mpsc::channel::<Snapshot>(1);
            let _ = tx.try_send(Vec::new());
            rx
        }

        async fn create(&self, _record: &WineRecord) -> Result<WineId, GatewayError> {
            Err(GatewayError::Rejected("quota exceeded".to_string()))
        }

        async fn update_ratings(
            &self,
            _id: &WineId,
            _ratings: &[Rating],
        ) -> Result<(), GatewayError> {
            Err(GatewayError::Rejected("quota exceeded".to_string()))
        }

        async fn delete(&self, _id: &WineId) -> Result<(), GatewayError> {
            Err(GatewayError::Rejected("quota exceeded".to_string()))
        }
    }

    #[tokio::test]
    async fn test_store_rejection_keeps_form_open_and_surfaces() {
        let identity = Arc::new(InMemoryIdentityGateway::new());
        let prompt = Arc::new(StubPrompt {
            accept: true,
            calls: AtomicUsize::new(0),
        });
        let (controller, mut events, _bridge) =
            crate::Controller::spawn(identity.clone(), Arc::new(FailingCollection), prompt).await;

        identity.sign_up("ana@example.com", "segredo1").await.unwrap();
        wait_until(|| controller.current_session().unwrap().is_some()).await;

        controller.open_add_form().unwrap();
        let err = controller
            .add_wine(WineDraft {
                name: "Reserva".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(err.contains("Falha ao cadastrar"));

        // The form stays open for a retry, and the failure is announced.
        assert!(controller.view().unwrap().add_form_open);
        wait_for_event(&mut events, |e| {
            matches!(e, Event::WriteFailed { intent: "add_wine", .. })
        })
        .await;
    }

    fn current_uid(h: &Harness) -> UserId {
        h.controller
            .current_session()
            .unwrap()
            .expect("session present")
            .user_id
    }
}
