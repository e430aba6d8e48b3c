//! Result payload types: the immutable record of one finished attempt.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Difficulty, QuestionType};

/// Pass/fail verdict against the exam's configured passing score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultStatus {
    Passed,
    Failed,
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultStatus::Passed => write!(f, "PASSED"),
            ResultStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// Per-question detail in a result. Unanswered questions appear with
/// `answered = false` and zero points (auto-submit scores them as zero).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionOutcome {
    pub question_id: String,
    pub category: String,
    pub difficulty: Difficulty,
    pub question_type: QuestionType,
    pub answered: bool,
    pub correct: bool,
    pub points_awarded: u32,
    pub points_possible: u32,
    pub time_spent_secs: f64,
    pub marked_for_review: bool,
}

/// Correct/total ratio for one group (difficulty tier, category, type).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GroupBreakdown {
    pub total: u32,
    pub correct: u32,
    pub percentage: f64,
}

/// Per-question time statistics. Fastest/slowest are 0 when nothing was
/// answered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeAnalysis {
    pub total_secs: f64,
    pub average_secs: f64,
    pub fastest_secs: f64,
    pub slowest_secs: f64,
    /// Raw per-answer times, retained for downstream consumers.
    pub distribution: Vec<f64>,
}

/// Derived performance metrics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// The result percentage.
    pub accuracy: f64,
    /// Questions per minute, rounded to two decimals.
    pub speed: f64,
    /// 0–100; 100 only when every per-question time is equal.
    pub consistency: u32,
}

/// Weak/strength classification plus recommended follow-ups. Advisory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningPath {
    pub weak_areas: Vec<String>,
    pub strength_areas: Vec<String>,
    pub next_steps: Vec<String>,
    pub milestones: Vec<String>,
}

/// The analytics block attached to every result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsBlock {
    pub by_difficulty: HashMap<String, GroupBreakdown>,
    pub by_category: HashMap<String, GroupBreakdown>,
    pub by_type: HashMap<String, GroupBreakdown>,
    pub time: TimeAnalysis,
    pub performance: PerformanceMetrics,
    pub learning_path: LearningPath,
}

/// Immutable once computed; one per completed or expired session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamResult {
    pub session_id: Uuid,
    pub exam_id: String,
    pub participant_id: String,
    pub score: u32,
    pub max_score: u32,
    pub percentage: f64,
    pub status: ResultStatus,
    pub passing_score: f64,
    pub outcomes: Vec<QuestionOutcome>,
    pub analytics: AnalyticsBlock,
    pub time_expired: bool,
    pub auto_submitted: bool,
    pub created_at: DateTime<Utc>,
}
