//! Store contracts consumed by the engines.
//!
//! These async traits are implemented by `examforge-stores` for the
//! in-memory case; a durable backend implements the same contracts
//! without touching selection or scoring logic.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RepositoryError;
use crate::model::{Difficulty, ExamConfig, Question};

/// Filter for a question repository query. Only published questions are
/// ever returned.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestionFilter {
    pub subject_id: String,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    /// Empty means any category.
    #[serde(default)]
    pub categories: Vec<String>,
    /// Empty means any tag; otherwise at least one must match.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Queryable store of question records. The only collaborator the
/// assembly path performs I/O against on a cache miss.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Fetch up to `limit` published questions matching `filter`, skipping
    /// every identifier in `exclude`.
    async fn find(
        &self,
        filter: &QuestionFilter,
        exclude: &HashSet<String>,
        limit: usize,
    ) -> Result<Vec<Question>, RepositoryError>;
}

/// Read access to per-exam configuration.
#[async_trait]
pub trait ExamConfigStore: Send + Sync {
    async fn get(&self, exam_id: &str) -> Result<ExamConfig, RepositoryError>;
}

/// One finished attempt's contribution to exam-level aggregates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StatsUpdate {
    pub percentage: f64,
    pub passed: bool,
}

/// Accumulating sink for exam-level statistics. Updates must fold into
/// the running aggregate, never overwrite it.
#[async_trait]
pub trait ExamStatsStore: Send + Sync {
    async fn record(&self, exam_id: &str, update: &StatsUpdate) -> Result<(), RepositoryError>;
}

/// What a user has already received for one subject. The delivered set
/// only ever grows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubjectHistory {
    /// Exams purchased, in order.
    pub exam_ids: Vec<String>,
    pub total_purchases: u32,
    /// Every question identifier ever delivered for this subject.
    pub delivered: HashSet<String>,
    pub last_activity: Option<DateTime<Utc>>,
}

/// Frozen original question set plus the repetition counter for one
/// (user, exam) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepetitionRecord {
    /// The exact question list delivered at first purchase.
    pub questions: Vec<Question>,
    /// Delivery counter; 1 after the first purchase, incremented per
    /// repetition.
    pub repetition_count: u32,
    pub last_repetition_at: Option<DateTime<Utc>>,
    pub last_activity: DateTime<Utc>,
}

/// Address of one ledger entry. The idle sweep enumerates these so the
/// pool manager can take each entry's key lock before deleting it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LedgerEntry {
    History { user_id: String, subject_id: String },
    Repetition { user_id: String, exam_id: String },
}

/// Population counts for operational dashboards.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LedgerCounts {
    pub histories: usize,
    pub repetitions: usize,
}

/// Tracks per-user delivery history and repetition records. The pool
/// manager serializes mutating calls per (user, subject) and per
/// (user, exam); implementations do not need their own cross-call
/// locking beyond ordinary interior mutability.
#[async_trait]
pub trait PurchaseLedger: Send + Sync {
    /// History for (user, subject); a default (empty) history if none.
    async fn history(
        &self,
        user_id: &str,
        subject_id: &str,
    ) -> Result<SubjectHistory, RepositoryError>;

    /// Record a confirmed purchase: append to the subject history and
    /// seed a repetition record with the delivered list and counter 1.
    async fn record_purchase(
        &self,
        user_id: &str,
        exam_id: &str,
        subject_id: &str,
        delivered: &[Question],
    ) -> Result<(), RepositoryError>;

    /// The repetition record for (user, exam), if any.
    async fn repetition(
        &self,
        user_id: &str,
        exam_id: &str,
    ) -> Result<Option<RepetitionRecord>, RepositoryError>;

    /// Increment the repetition counter and stamp the repetition time.
    /// Fails with `NotFound` when no record exists.
    async fn increment_repetition(
        &self,
        user_id: &str,
        exam_id: &str,
        now: DateTime<Utc>,
    ) -> Result<RepetitionRecord, RepositoryError>;

    /// Entries idle since before `cutoff`, as candidates for deletion.
    /// Advisory: the caller re-checks each one via `remove_if_idle`.
    async fn idle_entries(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<LedgerEntry>, RepositoryError>;

    /// Delete `entry` if it is still idle relative to `cutoff`. Returns
    /// whether it was removed; an entry touched since enumeration (or
    /// already gone) stays and yields `false`.
    async fn remove_if_idle(
        &self,
        entry: &LedgerEntry,
        cutoff: DateTime<Utc>,
    ) -> Result<bool, RepositoryError>;

    async fn counts(&self) -> Result<LedgerCounts, RepositoryError>;
}
