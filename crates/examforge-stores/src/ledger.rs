//! In-memory purchase ledger.
//!
//! Holds subject histories keyed by (user, subject) and repetition
//! records keyed by (user, exam). The pool manager serializes mutating
//! calls per key, so a plain async RwLock around the maps is enough.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use examforge_core::error::RepositoryError;
use examforge_core::model::Question;
use examforge_core::traits::{
    LedgerCounts, LedgerEntry, PurchaseLedger, RepetitionRecord, SubjectHistory,
};

#[derive(Default)]
struct LedgerState {
    histories: HashMap<(String, String), SubjectHistory>,
    repetitions: HashMap<(String, String), RepetitionRecord>,
}

#[derive(Default)]
pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PurchaseLedger for InMemoryLedger {
    async fn history(
        &self,
        user_id: &str,
        subject_id: &str,
    ) -> Result<SubjectHistory, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .histories
            .get(&(user_id.to_string(), subject_id.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn record_purchase(
        &self,
        user_id: &str,
        exam_id: &str,
        subject_id: &str,
        delivered: &[Question],
    ) -> Result<(), RepositoryError> {
        let now = Utc::now();
        let mut state = self.state.write().await;

        let history = state
            .histories
            .entry((user_id.to_string(), subject_id.to_string()))
            .or_default();
        history.exam_ids.push(exam_id.to_string());
        history.total_purchases += 1;
        history
            .delivered
            .extend(delivered.iter().map(|q| q.id.clone()));
        history.last_activity = Some(now);

        state.repetitions.insert(
            (user_id.to_string(), exam_id.to_string()),
            RepetitionRecord {
                questions: delivered.to_vec(),
                repetition_count: 1,
                last_repetition_at: None,
                last_activity: now,
            },
        );
        Ok(())
    }

    async fn repetition(
        &self,
        user_id: &str,
        exam_id: &str,
    ) -> Result<Option<RepetitionRecord>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .repetitions
            .get(&(user_id.to_string(), exam_id.to_string()))
            .cloned())
    }

    async fn increment_repetition(
        &self,
        user_id: &str,
        exam_id: &str,
        now: DateTime<Utc>,
    ) -> Result<RepetitionRecord, RepositoryError> {
        let mut state = self.state.write().await;
        let record = state
            .repetitions
            .get_mut(&(user_id.to_string(), exam_id.to_string()))
            .ok_or_else(|| {
                RepositoryError::NotFound(format!("repetition record {user_id}/{exam_id}"))
            })?;
        record.repetition_count += 1;
        record.last_repetition_at = Some(now);
        record.last_activity = now;
        Ok(record.clone())
    }

    async fn idle_entries(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<LedgerEntry>, RepositoryError> {
        let state = self.state.read().await;
        let mut entries = Vec::new();
        for ((user_id, subject_id), history) in &state.histories {
            if history.last_activity.map(|t| t < cutoff).unwrap_or(true) {
                entries.push(LedgerEntry::History {
                    user_id: user_id.clone(),
                    subject_id: subject_id.clone(),
                });
            }
        }
        for ((user_id, exam_id), record) in &state.repetitions {
            if record.last_activity < cutoff {
                entries.push(LedgerEntry::Repetition {
                    user_id: user_id.clone(),
                    exam_id: exam_id.clone(),
                });
            }
        }
        Ok(entries)
    }

    async fn remove_if_idle(
        &self,
        entry: &LedgerEntry,
        cutoff: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let mut state = self.state.write().await;
        match entry {
            LedgerEntry::History {
                user_id,
                subject_id,
            } => {
                let key = (user_id.clone(), subject_id.clone());
                let idle = state
                    .histories
                    .get(&key)
                    .map(|h| h.last_activity.map(|t| t < cutoff).unwrap_or(true))
                    .unwrap_or(false);
                if idle {
                    state.histories.remove(&key);
                }
                Ok(idle)
            }
            LedgerEntry::Repetition { user_id, exam_id } => {
                let key = (user_id.clone(), exam_id.clone());
                let idle = state
                    .repetitions
                    .get(&key)
                    .map(|r| r.last_activity < cutoff)
                    .unwrap_or(false);
                if idle {
                    state.repetitions.remove(&key);
                }
                Ok(idle)
            }
        }
    }

    async fn counts(&self) -> Result<LedgerCounts, RepositoryError> {
        let state = self.state.read().await;
        Ok(LedgerCounts {
            histories: state.histories.len(),
            repetitions: state.repetitions.len(),
        })
    }
}
