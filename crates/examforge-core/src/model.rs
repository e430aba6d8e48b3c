//! Core data model types for examforge.
//!
//! These are the fundamental types the entire system uses to represent
//! questions, exam configurations, and the policy knobs that govern
//! assembly and scoring.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Question difficulty tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// Supported question formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    SingleChoice,
    MultipleChoice,
    TrueFalse,
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionType::SingleChoice => write!(f, "single_choice"),
            QuestionType::MultipleChoice => write!(f, "multiple_choice"),
            QuestionType::TrueFalse => write!(f, "true_false"),
        }
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "single_choice" | "single" => Ok(QuestionType::SingleChoice),
            "multiple_choice" | "multiple" => Ok(QuestionType::MultipleChoice),
            "true_false" => Ok(QuestionType::TrueFalse),
            other => Err(format!("unknown question type: {other}")),
        }
    }
}

/// A single question, read-only to the engines. Owned by the question
/// repository; the canonical answer never leaves the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// Unique identifier within the bank.
    pub id: String,
    /// Subject this question belongs to.
    pub subject_id: String,
    /// Question format.
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    /// Difficulty tier, drives the point value.
    pub difficulty: Difficulty,
    /// Category within the subject (e.g. "linear-equations").
    pub category: String,
    /// Free-form tags for filtering.
    #[serde(default)]
    pub tags: Vec<String>,
    /// The question text shown to the learner.
    pub prompt: String,
    /// Choice options (empty for free-text questions).
    #[serde(default)]
    pub options: Vec<String>,
    /// Canonical correct option(s).
    #[serde(default)]
    pub correct: Vec<String>,
    /// Unpublished questions are never served.
    #[serde(default = "default_true")]
    pub published: bool,
}

fn default_true() -> bool {
    true
}

/// A learner's answer to a single question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    /// Selected option(s), order-insensitive.
    Selected(Vec<String>),
    /// Free text. Never auto-marked correct; essay grading is external.
    Text(String),
}

/// Relative weights for how many questions of each tier an exam draws.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DifficultyDistribution {
    pub easy: u32,
    pub medium: u32,
    pub hard: u32,
}

impl DifficultyDistribution {
    /// Split `count` into per-tier quotas proportional to the weights.
    /// Rounding remainder goes to the medium tier.
    pub fn quotas(&self, count: usize) -> (usize, usize, usize) {
        let total = self.easy + self.medium + self.hard;
        if total == 0 {
            return (0, count, 0);
        }
        let easy = count * self.easy as usize / total as usize;
        let hard = count * self.hard as usize / total as usize;
        let medium = count.saturating_sub(easy + hard);
        (easy, medium, hard)
    }
}

/// Per-exam configuration, owned by the external config store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamConfig {
    pub exam_id: String,
    pub subject_id: String,
    /// Number of questions a buyer receives.
    pub total_questions: usize,
    /// Restrict the pool to a single tier; `None` draws across tiers.
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    /// How a cross-tier draw is split. Ignored when `difficulty` is set.
    #[serde(default)]
    pub difficulty_distribution: Option<DifficultyDistribution>,
    /// Percentage required for a PASSED result.
    pub passing_score: f64,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Whether repeat buyers get a pool excluding their history.
    #[serde(default = "default_true")]
    pub personalization: bool,
    /// Wall-clock budget for an attempt, if timed.
    #[serde(default)]
    pub time_limit_secs: Option<u64>,
}

/// Difficulty-to-points mapping and the weak-area threshold.
///
/// Both were literals in earlier revisions; they are policy, so they
/// live in configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoringPolicy {
    pub easy_points: u32,
    pub medium_points: u32,
    pub hard_points: u32,
    /// Categories scoring below this percentage are weak areas.
    pub weak_area_threshold: f64,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            easy_points: 1,
            medium_points: 2,
            hard_points: 3,
            weak_area_threshold: 70.0,
        }
    }
}

impl ScoringPolicy {
    pub fn points_for(&self, difficulty: Difficulty) -> u32 {
        match difficulty {
            Difficulty::Easy => self.easy_points,
            Difficulty::Medium => self.medium_points,
            Difficulty::Hard => self.hard_points,
        }
    }
}

/// What to do when a pool query returns fewer candidates than requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortSupplyPolicy {
    /// Serve the smaller set and surface a shortfall warning.
    Degrade,
    /// Reject the request with `InsufficientSupply`.
    Fail,
}

/// Tuning knobs for the pool cache manager.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Hard cap on live shared cache entries; LRU eviction beyond it.
    pub max_shared_caches: usize,
    /// Shared cache entry lifetime.
    pub cache_ttl: chrono::Duration,
    /// Candidate pool size = requested count × this multiplier...
    pub pool_multiplier: usize,
    /// ...capped at this many questions.
    pub pool_cap: usize,
    /// Review repetitions allowed after the first delivery.
    pub max_repetitions: u32,
    /// Bounded retries when the question repository is unavailable.
    pub repo_retries: u32,
    /// Initial delay between retries; doubles per attempt.
    pub retry_delay: Duration,
    pub short_supply: ShortSupplyPolicy,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_shared_caches: 50,
            cache_ttl: chrono::Duration::hours(6),
            pool_multiplier: 3,
            pool_cap: 1000,
            max_repetitions: 2,
            repo_retries: 1,
            retry_delay: Duration::from_millis(500),
            short_supply: ShortSupplyPolicy::Degrade,
        }
    }
}
