//! The exam session engine: one state machine per timed attempt.
//!
//! Sessions are created IN_PROGRESS, advanced by answer submissions, and
//! only ever transition to a terminal status (COMPLETED, EXPIRED,
//! CANCELLED) — never deleted. Finishing a session computes the score,
//! derives the analytics block, and folds the outcome into the exam's
//! aggregate statistics.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::analytics;
use crate::error::SessionError;
use crate::model::{AnswerValue, Question, ScoringPolicy};
use crate::results::{ExamResult, QuestionOutcome, ResultStatus};
use crate::traits::{ExamConfigStore, ExamStatsStore, StatsUpdate};

/// Lifecycle of an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    NotStarted,
    InProgress,
    Completed,
    Expired,
    Cancelled,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionStatus::Completed | SessionStatus::Expired | SessionStatus::Cancelled
        )
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::NotStarted => write!(f, "NOT_STARTED"),
            SessionStatus::InProgress => write!(f, "IN_PROGRESS"),
            SessionStatus::Completed => write!(f, "COMPLETED"),
            SessionStatus::Expired => write!(f, "EXPIRED"),
            SessionStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// A captured answer. Correctness and points are computed on submission,
/// never taken from the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: String,
    pub value: AnswerValue,
    /// Accumulated across re-answers of the same question.
    pub time_spent_secs: f64,
    pub correct: bool,
    pub points: u32,
    pub marked_for_review: bool,
}

/// Advisory counters attached to a session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub time_spent_secs: f64,
    pub visit_count: u32,
    pub answer_count: u32,
    pub pause_count: u32,
    pub device: Option<String>,
    pub network: Option<String>,
}

/// One exam attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamSession {
    pub id: Uuid,
    pub exam_id: String,
    pub participant_id: String,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Index of the most recently answered question.
    pub current_index: usize,
    pub questions: Vec<Question>,
    pub answers: HashMap<String, Answer>,
    pub last_interaction_at: DateTime<Utc>,
    pub metadata: SessionMetadata,
}

/// Device/network metadata captured at start.
#[derive(Debug, Clone, Default)]
pub struct StartOptions {
    pub device: Option<String>,
    pub network: Option<String>,
}

/// A single answer submission.
#[derive(Debug, Clone)]
pub struct AnswerSubmission {
    pub question_id: String,
    pub value: AnswerValue,
    pub marked_for_review: bool,
}

#[derive(Default)]
struct SessionTable {
    sessions: HashMap<Uuid, ExamSession>,
    /// (exam_id, participant_id) → the IN_PROGRESS session, for
    /// idempotent starts.
    active: HashMap<(String, String), Uuid>,
    results: HashMap<Uuid, ExamResult>,
}

/// The session engine. Process-wide shared state behind one async lock;
/// score computation itself is lock-free and pure.
pub struct SessionEngine {
    config_store: Arc<dyn ExamConfigStore>,
    stats_store: Arc<dyn ExamStatsStore>,
    scoring: ScoringPolicy,
    table: RwLock<SessionTable>,
}

impl SessionEngine {
    pub fn new(
        config_store: Arc<dyn ExamConfigStore>,
        stats_store: Arc<dyn ExamStatsStore>,
        scoring: ScoringPolicy,
    ) -> Self {
        Self {
            config_store,
            stats_store,
            scoring,
            table: RwLock::new(SessionTable::default()),
        }
    }

    /// Start an attempt with the assembled question set.
    ///
    /// Idempotent per (exam, participant): while a session is
    /// IN_PROGRESS for the pair, the same session is returned instead of
    /// creating a duplicate.
    pub async fn start_session(
        &self,
        exam_id: &str,
        participant_id: &str,
        questions: Vec<Question>,
        options: StartOptions,
    ) -> Result<ExamSession, SessionError> {
        let mut table = self.table.write().await;

        let key = (exam_id.to_string(), participant_id.to_string());
        if let Some(existing_id) = table.active.get(&key) {
            if let Some(existing) = table.sessions.get(existing_id) {
                if existing.status == SessionStatus::InProgress {
                    tracing::debug!(session_id = %existing.id, "returning existing in-progress session");
                    return Ok(existing.clone());
                }
            }
        }

        let now = Utc::now();
        let session = ExamSession {
            id: Uuid::new_v4(),
            exam_id: exam_id.to_string(),
            participant_id: participant_id.to_string(),
            status: SessionStatus::InProgress,
            started_at: now,
            ended_at: None,
            current_index: 0,
            questions,
            answers: HashMap::new(),
            last_interaction_at: now,
            metadata: SessionMetadata {
                device: options.device,
                network: options.network,
                ..Default::default()
            },
        };
        table.active.insert(key, session.id);
        table.sessions.insert(session.id, session.clone());
        tracing::debug!(session_id = %session.id, exam_id, participant_id, "session started");
        Ok(session)
    }

    /// Record (or replace) an answer. Time spent is the delta since the
    /// previous interaction with the session.
    pub async fn submit_answer(
        &self,
        session_id: Uuid,
        caller: &str,
        submission: AnswerSubmission,
    ) -> Result<Answer, SessionError> {
        let now = Utc::now();
        let mut table = self.table.write().await;
        let session = table
            .sessions
            .get_mut(&session_id)
            .ok_or(SessionError::SessionNotFound(session_id))?;

        if session.participant_id != caller {
            tracing::warn!(%session_id, caller, "unauthorized answer submission");
            return Err(SessionError::Unauthorized {
                user_id: caller.to_string(),
                session_id,
            });
        }
        if session.status != SessionStatus::InProgress {
            return Err(SessionError::SessionNotActive {
                session_id,
                status: session.status,
            });
        }

        let position = session
            .questions
            .iter()
            .position(|q| q.id == submission.question_id)
            .ok_or_else(|| SessionError::QuestionNotInSession {
                session_id,
                question_id: submission.question_id.clone(),
            })?;
        let question = &session.questions[position];

        let correct = grade(question, &submission.value);
        let points = if correct {
            self.scoring.points_for(question.difficulty)
        } else {
            0
        };
        let delta_secs =
            (now - session.last_interaction_at).num_milliseconds().max(0) as f64 / 1000.0;

        let answer = match session.answers.get(&submission.question_id) {
            Some(previous) => Answer {
                question_id: submission.question_id.clone(),
                value: submission.value,
                time_spent_secs: previous.time_spent_secs + delta_secs,
                correct,
                points,
                marked_for_review: submission.marked_for_review,
            },
            None => Answer {
                question_id: submission.question_id.clone(),
                value: submission.value,
                time_spent_secs: delta_secs,
                correct,
                points,
                marked_for_review: submission.marked_for_review,
            },
        };
        session
            .answers
            .insert(submission.question_id.clone(), answer.clone());

        session.current_index = position;
        session.last_interaction_at = now;
        session.metadata.time_spent_secs += delta_secs;
        session.metadata.visit_count += 1;
        session.metadata.answer_count += 1;

        Ok(answer)
    }

    /// Note a pause (the UI leaving the exam view). Advisory only.
    pub async fn record_pause(&self, session_id: Uuid, caller: &str) -> Result<u32, SessionError> {
        let mut table = self.table.write().await;
        let session = table
            .sessions
            .get_mut(&session_id)
            .ok_or(SessionError::SessionNotFound(session_id))?;
        if session.participant_id != caller {
            return Err(SessionError::Unauthorized {
                user_id: caller.to_string(),
                session_id,
            });
        }
        session.metadata.pause_count += 1;
        Ok(session.metadata.pause_count)
    }

    /// Finish an attempt at the participant's request.
    pub async fn finish_session(
        &self,
        session_id: Uuid,
        caller: &str,
    ) -> Result<ExamResult, SessionError> {
        self.finalize(session_id, Some(caller), false).await
    }

    /// Auto-submit on time expiry; driven by an external scheduler, so no
    /// caller check. Unanswered questions score zero.
    pub async fn expire_session(&self, session_id: Uuid) -> Result<ExamResult, SessionError> {
        self.finalize(session_id, None, true).await
    }

    /// Abandon an attempt. Terminal; no result is produced.
    pub async fn cancel_session(
        &self,
        session_id: Uuid,
        caller: &str,
    ) -> Result<ExamSession, SessionError> {
        let mut table = self.table.write().await;
        let session = table
            .sessions
            .get_mut(&session_id)
            .ok_or(SessionError::SessionNotFound(session_id))?;
        if session.participant_id != caller {
            return Err(SessionError::Unauthorized {
                user_id: caller.to_string(),
                session_id,
            });
        }
        if session.status != SessionStatus::InProgress {
            return Err(SessionError::SessionNotActive {
                session_id,
                status: session.status,
            });
        }
        session.status = SessionStatus::Cancelled;
        session.ended_at = Some(Utc::now());
        let snapshot = session.clone();
        let key = (snapshot.exam_id.clone(), snapshot.participant_id.clone());
        table.active.remove(&key);
        Ok(snapshot)
    }

    pub async fn get_session(&self, session_id: Uuid) -> Option<ExamSession> {
        self.table.read().await.sessions.get(&session_id).cloned()
    }

    /// The persisted result for a finished session.
    pub async fn get_result(&self, session_id: Uuid) -> Result<ExamResult, SessionError> {
        let table = self.table.read().await;
        if let Some(result) = table.results.get(&session_id) {
            return Ok(result.clone());
        }
        if table.sessions.contains_key(&session_id) {
            Err(SessionError::ResultNotReady(session_id))
        } else {
            Err(SessionError::SessionNotFound(session_id))
        }
    }

    async fn finalize(
        &self,
        session_id: Uuid,
        caller: Option<&str>,
        expired: bool,
    ) -> Result<ExamResult, SessionError> {
        // Fetch the config before taking the write lock; the terminal
        // transition is re-checked under the lock, so two concurrent
        // finishes cannot both produce a result.
        let exam_id = {
            let table = self.table.read().await;
            let session = table
                .sessions
                .get(&session_id)
                .ok_or(SessionError::SessionNotFound(session_id))?;
            if let Some(caller) = caller {
                if session.participant_id != caller {
                    tracing::warn!(%session_id, caller, "unauthorized finish attempt");
                    return Err(SessionError::Unauthorized {
                        user_id: caller.to_string(),
                        session_id,
                    });
                }
            }
            if session.status != SessionStatus::InProgress {
                return Err(SessionError::SessionNotActive {
                    session_id,
                    status: session.status,
                });
            }
            session.exam_id.clone()
        };
        let config = self.config_store.get(&exam_id).await?;

        let now = Utc::now();
        let result = {
            let mut table = self.table.write().await;
            let session = table
                .sessions
                .get_mut(&session_id)
                .ok_or(SessionError::SessionNotFound(session_id))?;
            if session.status != SessionStatus::InProgress {
                return Err(SessionError::SessionNotActive {
                    session_id,
                    status: session.status,
                });
            }

            let outcomes: Vec<QuestionOutcome> = session
                .questions
                .iter()
                .map(|question| {
                    let answer = session.answers.get(&question.id);
                    QuestionOutcome {
                        question_id: question.id.clone(),
                        category: question.category.clone(),
                        difficulty: question.difficulty,
                        question_type: question.question_type,
                        answered: answer.is_some(),
                        correct: answer.map(|a| a.correct).unwrap_or(false),
                        points_awarded: answer.map(|a| a.points).unwrap_or(0),
                        points_possible: self.scoring.points_for(question.difficulty),
                        time_spent_secs: answer.map(|a| a.time_spent_secs).unwrap_or(0.0),
                        marked_for_review: answer.map(|a| a.marked_for_review).unwrap_or(false),
                    }
                })
                .collect();

            let score: u32 = outcomes.iter().map(|o| o.points_awarded).sum();
            let max_score: u32 = outcomes.iter().map(|o| o.points_possible).sum();
            let percentage = if max_score == 0 {
                0.0
            } else {
                score as f64 / max_score as f64 * 100.0
            };
            let status = if percentage >= config.passing_score {
                ResultStatus::Passed
            } else {
                ResultStatus::Failed
            };

            let result = ExamResult {
                session_id,
                exam_id: exam_id.clone(),
                participant_id: session.participant_id.clone(),
                score,
                max_score,
                percentage,
                status,
                passing_score: config.passing_score,
                analytics: analytics::compute(&outcomes, percentage, &self.scoring),
                outcomes,
                time_expired: expired,
                auto_submitted: expired,
                created_at: now,
            };

            session.status = if expired {
                SessionStatus::Expired
            } else {
                SessionStatus::Completed
            };
            session.ended_at = Some(now);
            let key = (session.exam_id.clone(), session.participant_id.clone());
            table.active.remove(&key);
            table.results.insert(session_id, result.clone());
            result
        };

        // Accumulating update, fire-and-forget: a stats failure must not
        // fail the finish.
        let update = StatsUpdate {
            percentage: result.percentage,
            passed: result.status == ResultStatus::Passed,
        };
        if let Err(e) = self.stats_store.record(&exam_id, &update).await {
            tracing::warn!(%exam_id, error = %e, "exam stats update failed");
        }

        tracing::debug!(
            %session_id,
            score = result.score,
            percentage = result.percentage,
            status = %result.status,
            "session finished"
        );
        Ok(result)
    }
}

/// Compare a submitted answer against the canonical one.
/// Selections are order-insensitive; free text is never auto-marked.
fn grade(question: &Question, value: &AnswerValue) -> bool {
    match value {
        AnswerValue::Selected(selected) => {
            if question.correct.is_empty() {
                return false;
            }
            normalized(selected) == normalized(&question.correct)
        }
        AnswerValue::Text(_) => false,
    }
}

fn normalized(options: &[String]) -> Vec<&str> {
    let mut v: Vec<&str> = options.iter().map(String::as_str).collect();
    v.sort_unstable();
    v.dedup();
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RepositoryError;
    use crate::model::{Difficulty, ExamConfig, QuestionType};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct StaticConfigStore {
        config: ExamConfig,
    }

    #[async_trait]
    impl ExamConfigStore for StaticConfigStore {
        async fn get(&self, exam_id: &str) -> Result<ExamConfig, RepositoryError> {
            if exam_id == self.config.exam_id {
                Ok(self.config.clone())
            } else {
                Err(RepositoryError::NotFound(exam_id.to_string()))
            }
        }
    }

    #[derive(Default)]
    struct RecordingStatsStore {
        updates: Mutex<Vec<(String, StatsUpdate)>>,
    }

    #[async_trait]
    impl ExamStatsStore for RecordingStatsStore {
        async fn record(
            &self,
            exam_id: &str,
            update: &StatsUpdate,
        ) -> Result<(), RepositoryError> {
            self.updates
                .lock()
                .unwrap()
                .push((exam_id.to_string(), *update));
            Ok(())
        }
    }

    struct FailingStatsStore;

    #[async_trait]
    impl ExamStatsStore for FailingStatsStore {
        async fn record(&self, _: &str, _: &StatsUpdate) -> Result<(), RepositoryError> {
            Err(RepositoryError::Unavailable("stats db down".into()))
        }
    }

    fn make_questions(n: usize) -> Vec<Question> {
        (0..n)
            .map(|i| Question {
                id: format!("q{i}"),
                subject_id: "s1".into(),
                question_type: QuestionType::SingleChoice,
                difficulty: Difficulty::Medium,
                category: "general".into(),
                tags: vec![],
                prompt: format!("question {i}"),
                options: vec!["right".into(), "wrong".into()],
                correct: vec!["right".into()],
                published: true,
            })
            .collect()
    }

    fn make_engine(passing_score: f64) -> (SessionEngine, Arc<RecordingStatsStore>) {
        let config = ExamConfig {
            exam_id: "exam-1".into(),
            subject_id: "s1".into(),
            total_questions: 3,
            difficulty: Some(Difficulty::Medium),
            difficulty_distribution: None,
            passing_score,
            categories: vec![],
            tags: vec![],
            personalization: true,
            time_limit_secs: Some(600),
        };
        let stats = Arc::new(RecordingStatsStore::default());
        let engine = SessionEngine::new(
            Arc::new(StaticConfigStore { config }),
            Arc::clone(&stats) as Arc<dyn ExamStatsStore>,
            ScoringPolicy::default(),
        );
        (engine, stats)
    }

    fn answer(question_id: &str, choice: &str) -> AnswerSubmission {
        AnswerSubmission {
            question_id: question_id.into(),
            value: AnswerValue::Selected(vec![choice.into()]),
            marked_for_review: false,
        }
    }

    #[tokio::test]
    async fn start_is_idempotent_while_in_progress() {
        let (engine, _) = make_engine(60.0);
        let a = engine
            .start_session("exam-1", "u1", make_questions(3), StartOptions::default())
            .await
            .unwrap();
        let b = engine
            .start_session("exam-1", "u1", make_questions(3), StartOptions::default())
            .await
            .unwrap();
        assert_eq!(a.id, b.id);

        // A different participant gets a fresh session.
        let c = engine
            .start_session("exam-1", "u2", make_questions(3), StartOptions::default())
            .await
            .unwrap();
        assert_ne!(a.id, c.id);
    }

    #[tokio::test]
    async fn all_correct_scores_100_and_passes() {
        let (engine, stats) = make_engine(60.0);
        let session = engine
            .start_session("exam-1", "u1", make_questions(3), StartOptions::default())
            .await
            .unwrap();

        for i in 0..3 {
            engine
                .submit_answer(session.id, "u1", answer(&format!("q{i}"), "right"))
                .await
                .unwrap();
        }
        let result = engine.finish_session(session.id, "u1").await.unwrap();
        assert_eq!(result.score, 6);
        assert_eq!(result.max_score, 6);
        assert!((result.percentage - 100.0).abs() < 1e-9);
        assert_eq!(result.status, ResultStatus::Passed);
        assert!(!result.time_expired);
        assert!(!result.auto_submitted);

        let updates = stats.updates.lock().unwrap();
        assert_eq!(updates.len(), 1);
        assert!(updates[0].1.passed);
    }

    #[tokio::test]
    async fn all_wrong_scores_0_and_fails() {
        let (engine, _) = make_engine(60.0);
        let session = engine
            .start_session("exam-1", "u1", make_questions(3), StartOptions::default())
            .await
            .unwrap();
        for i in 0..3 {
            engine
                .submit_answer(session.id, "u1", answer(&format!("q{i}"), "wrong"))
                .await
                .unwrap();
        }
        let result = engine.finish_session(session.id, "u1").await.unwrap();
        assert_eq!(result.score, 0);
        assert!((result.percentage - 0.0).abs() < 1e-9);
        assert_eq!(result.status, ResultStatus::Failed);
    }

    #[tokio::test]
    async fn submit_rejects_wrong_caller_and_finished_session() {
        let (engine, _) = make_engine(60.0);
        let session = engine
            .start_session("exam-1", "u1", make_questions(3), StartOptions::default())
            .await
            .unwrap();

        let err = engine
            .submit_answer(session.id, "intruder", answer("q0", "right"))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Unauthorized { .. }));

        engine.finish_session(session.id, "u1").await.unwrap();
        let err = engine
            .submit_answer(session.id, "u1", answer("q0", "right"))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::SessionNotActive { .. }));
    }

    #[tokio::test]
    async fn unknown_question_is_rejected() {
        let (engine, _) = make_engine(60.0);
        let session = engine
            .start_session("exam-1", "u1", make_questions(2), StartOptions::default())
            .await
            .unwrap();
        let err = engine
            .submit_answer(session.id, "u1", answer("q99", "right"))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::QuestionNotInSession { .. }));
    }

    #[tokio::test]
    async fn expiry_auto_submits_with_unanswered_scored_zero() {
        let (engine, _) = make_engine(60.0);
        let session = engine
            .start_session("exam-1", "u1", make_questions(4), StartOptions::default())
            .await
            .unwrap();
        engine
            .submit_answer(session.id, "u1", answer("q0", "right"))
            .await
            .unwrap();

        let result = engine.expire_session(session.id).await.unwrap();
        assert!(result.time_expired);
        assert!(result.auto_submitted);
        assert_eq!(result.score, 2, "one medium question answered correctly");
        assert_eq!(result.outcomes.iter().filter(|o| !o.answered).count(), 3);

        let session = engine.get_session(session.id).await.unwrap();
        assert_eq!(session.status, SessionStatus::Expired);
    }

    #[tokio::test]
    async fn reanswering_replaces_and_double_finish_fails() {
        let (engine, _) = make_engine(60.0);
        let session = engine
            .start_session("exam-1", "u1", make_questions(1), StartOptions::default())
            .await
            .unwrap();
        engine
            .submit_answer(session.id, "u1", answer("q0", "wrong"))
            .await
            .unwrap();
        let updated = engine
            .submit_answer(session.id, "u1", answer("q0", "right"))
            .await
            .unwrap();
        assert!(updated.correct);

        let result = engine.finish_session(session.id, "u1").await.unwrap();
        assert_eq!(result.score, 2);

        let err = engine.finish_session(session.id, "u1").await.unwrap_err();
        assert!(matches!(err, SessionError::SessionNotActive { .. }));
    }

    #[tokio::test]
    async fn cancel_is_terminal_and_yields_no_result() {
        let (engine, _) = make_engine(60.0);
        let session = engine
            .start_session("exam-1", "u1", make_questions(2), StartOptions::default())
            .await
            .unwrap();
        let cancelled = engine.cancel_session(session.id, "u1").await.unwrap();
        assert_eq!(cancelled.status, SessionStatus::Cancelled);

        let err = engine.get_result(session.id).await.unwrap_err();
        assert!(matches!(err, SessionError::ResultNotReady(_)));

        // A new start after cancellation creates a fresh session.
        let fresh = engine
            .start_session("exam-1", "u1", make_questions(2), StartOptions::default())
            .await
            .unwrap();
        assert_ne!(fresh.id, session.id);
    }

    #[tokio::test]
    async fn result_is_persisted_and_retrievable() {
        let (engine, _) = make_engine(60.0);
        let session = engine
            .start_session("exam-1", "u1", make_questions(1), StartOptions::default())
            .await
            .unwrap();

        let err = engine.get_result(session.id).await.unwrap_err();
        assert!(matches!(err, SessionError::ResultNotReady(_)));

        let finished = engine.finish_session(session.id, "u1").await.unwrap();
        let fetched = engine.get_result(session.id).await.unwrap();
        assert_eq!(fetched.session_id, finished.session_id);
        assert_eq!(fetched.score, finished.score);

        let err = engine.get_result(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, SessionError::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn stats_failure_does_not_fail_the_finish() {
        let config = ExamConfig {
            exam_id: "exam-1".into(),
            subject_id: "s1".into(),
            total_questions: 1,
            difficulty: None,
            difficulty_distribution: None,
            passing_score: 50.0,
            categories: vec![],
            tags: vec![],
            personalization: true,
            time_limit_secs: None,
        };
        let engine = SessionEngine::new(
            Arc::new(StaticConfigStore { config }),
            Arc::new(FailingStatsStore),
            ScoringPolicy::default(),
        );
        let session = engine
            .start_session("exam-1", "u1", make_questions(1), StartOptions::default())
            .await
            .unwrap();
        let result = engine.finish_session(session.id, "u1").await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn pause_counter_accumulates() {
        let (engine, _) = make_engine(60.0);
        let session = engine
            .start_session("exam-1", "u1", make_questions(1), StartOptions::default())
            .await
            .unwrap();
        assert_eq!(engine.record_pause(session.id, "u1").await.unwrap(), 1);
        assert_eq!(engine.record_pause(session.id, "u1").await.unwrap(), 2);
    }

    #[test]
    fn grading_is_order_insensitive_for_multi_select() {
        let mut question = make_questions(1).remove(0);
        question.question_type = QuestionType::MultipleChoice;
        question.correct = vec!["a".into(), "b".into()];

        assert!(grade(
            &question,
            &AnswerValue::Selected(vec!["b".into(), "a".into()])
        ));
        assert!(!grade(&question, &AnswerValue::Selected(vec!["a".into()])));
        assert!(!grade(&question, &AnswerValue::Text("a and b".into())));
    }
}
