//! Error taxonomy for assembly, sessions, and the external stores.
//!
//! Defined here so callers can classify errors for retry decisions
//! without string matching: only `RepositoryError::is_retryable` failures
//! are ever retried, and then with a bounded backoff.

use thiserror::Error;
use uuid::Uuid;

use crate::session::SessionStatus;

/// Errors surfaced by an external store (question repository, config
/// store, stats store, purchase ledger).
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store call timed out.
    #[error("store request timed out after {0}s")]
    Timeout(u64),

    /// The requested record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The store rejected or failed the operation.
    #[error("storage error: {0}")]
    Storage(String),
}

impl RepositoryError {
    /// Transient failures are eligible for one bounded retry; everything
    /// else surfaces to the caller immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RepositoryError::Unavailable(_) | RepositoryError::Timeout(_)
        )
    }
}

/// Errors from the question assembly path.
#[derive(Debug, Error)]
pub enum AssemblyError {
    /// Repetition requested with no prior purchase record.
    #[error("exam {exam_id} was never purchased by user {user_id}")]
    ExamNotPurchased { user_id: String, exam_id: String },

    /// The repetition counter is at its ceiling. Terminal for this
    /// (user, exam) pair.
    #[error("repetition limit of {limit} reached for exam {exam_id}")]
    RepetitionLimitExceeded { exam_id: String, limit: u32 },

    /// The pool query returned fewer candidates than requested and the
    /// short-supply policy is `Fail`.
    #[error("only {available} of {requested} requested questions available")]
    InsufficientSupply { requested: usize, available: usize },

    /// The question repository (or ledger) failed after retries.
    #[error("question repository unavailable: {0}")]
    RepositoryUnavailable(#[from] RepositoryError),
}

/// Errors from the session engine.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session {0} not found")]
    SessionNotFound(Uuid),

    /// Answer or finish requested on a session that is not IN_PROGRESS.
    #[error("session {session_id} is not active (status {status})")]
    SessionNotActive {
        session_id: Uuid,
        status: SessionStatus,
    },

    /// Caller is not the session's participant. Logged for audit.
    #[error("user {user_id} is not the owner of session {session_id}")]
    Unauthorized { user_id: String, session_id: Uuid },

    /// The submitted question is not part of this session's set.
    #[error("question {question_id} is not part of session {session_id}")]
    QuestionNotInSession {
        session_id: Uuid,
        question_id: String,
    },

    /// The session has not finished; no result exists yet.
    #[error("no result available for session {0}")]
    ResultNotReady(Uuid),

    /// The exam config store failed while finishing the session.
    #[error("exam config unavailable: {0}")]
    Config(#[from] RepositoryError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(RepositoryError::Unavailable("down".into()).is_retryable());
        assert!(RepositoryError::Timeout(5).is_retryable());
        assert!(!RepositoryError::NotFound("exam-1".into()).is_retryable());
        assert!(!RepositoryError::Storage("corrupt".into()).is_retryable());
    }

    #[test]
    fn assembly_error_messages_name_the_subject() {
        let err = AssemblyError::RepetitionLimitExceeded {
            exam_id: "exam-7".into(),
            limit: 2,
        };
        assert!(err.to_string().contains("exam-7"));
        assert!(err.to_string().contains('2'));
    }
}
