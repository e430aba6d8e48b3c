//! Multi-axis analytics over a finished attempt.
//!
//! Pure and deterministic given the question outcomes. Malformed or
//! missing data degrades to zero/empty values; nothing in here errors.

use std::collections::HashMap;

use crate::model::ScoringPolicy;
use crate::results::{
    AnalyticsBlock, GroupBreakdown, LearningPath, PerformanceMetrics, QuestionOutcome,
    TimeAnalysis,
};

/// Compute the full analytics block for a finished attempt.
///
/// `percentage` is the overall result percentage and doubles as the
/// accuracy metric.
pub fn compute(
    outcomes: &[QuestionOutcome],
    percentage: f64,
    policy: &ScoringPolicy,
) -> AnalyticsBlock {
    let by_category = breakdown_by(outcomes, |o| o.category.clone());
    let time = time_analysis(outcomes);
    let performance = performance_metrics(outcomes, percentage, &time);
    let learning_path = learning_path(&by_category, policy.weak_area_threshold);

    AnalyticsBlock {
        by_difficulty: breakdown_by(outcomes, |o| o.difficulty.to_string()),
        by_type: breakdown_by(outcomes, |o| o.question_type.to_string()),
        by_category,
        time,
        performance,
        learning_path,
    }
}

/// Group outcomes by one dimension and compute correct/total per group.
/// Unanswered questions count toward the group's total.
fn breakdown_by<F>(outcomes: &[QuestionOutcome], key: F) -> HashMap<String, GroupBreakdown>
where
    F: Fn(&QuestionOutcome) -> String,
{
    let mut groups: HashMap<String, (u32, u32)> = HashMap::new();
    for outcome in outcomes {
        let entry = groups.entry(key(outcome)).or_insert((0, 0));
        entry.0 += 1;
        if outcome.correct {
            entry.1 += 1;
        }
    }
    groups
        .into_iter()
        .map(|(group, (total, correct))| {
            let percentage = if total == 0 {
                0.0
            } else {
                correct as f64 / total as f64 * 100.0
            };
            (
                group,
                GroupBreakdown {
                    total,
                    correct,
                    percentage,
                },
            )
        })
        .collect()
}

fn time_analysis(outcomes: &[QuestionOutcome]) -> TimeAnalysis {
    let distribution: Vec<f64> = outcomes
        .iter()
        .filter(|o| o.answered)
        .map(|o| o.time_spent_secs)
        .collect();

    let total_secs: f64 = distribution.iter().sum();
    let average_secs = if outcomes.is_empty() {
        0.0
    } else {
        total_secs / outcomes.len() as f64
    };
    let fastest_secs = distribution.iter().copied().fold(f64::INFINITY, f64::min);
    let slowest_secs = distribution.iter().copied().fold(0.0, f64::max);

    TimeAnalysis {
        total_secs,
        average_secs,
        fastest_secs: if distribution.is_empty() {
            0.0
        } else {
            fastest_secs
        },
        slowest_secs,
        distribution,
    }
}

fn performance_metrics(
    outcomes: &[QuestionOutcome],
    percentage: f64,
    time: &TimeAnalysis,
) -> PerformanceMetrics {
    let speed = if time.total_secs > 0.0 {
        let per_minute = outcomes.len() as f64 / (time.total_secs / 60.0);
        (per_minute * 100.0).round() / 100.0
    } else {
        0.0
    };

    PerformanceMetrics {
        accuracy: percentage,
        speed,
        consistency: consistency_score(&time.distribution),
    }
}

/// `max(0, 100 − cv×100)` where cv is the coefficient of variation of
/// the per-question times. Lower variance scores higher; an empty or
/// zero-mean distribution scores 0.
pub fn consistency_score(distribution: &[f64]) -> u32 {
    if distribution.is_empty() {
        return 0;
    }
    let mean = distribution.iter().sum::<f64>() / distribution.len() as f64;
    if mean <= f64::EPSILON {
        return 0;
    }
    let variance = distribution
        .iter()
        .map(|t| (t - mean).powi(2))
        .sum::<f64>()
        / distribution.len() as f64;
    let std_dev = variance.sqrt();

    // Truncate rather than round: any variance at all must land below
    // 100, so 100 means every per-question time was equal.
    (100.0 - (std_dev / mean) * 100.0).max(0.0).floor() as u32
}

fn learning_path(
    by_category: &HashMap<String, GroupBreakdown>,
    weak_threshold: f64,
) -> LearningPath {
    let mut weak_areas: Vec<String> = by_category
        .iter()
        .filter(|(_, b)| b.percentage < weak_threshold)
        .map(|(category, _)| category.clone())
        .collect();
    let mut strength_areas: Vec<String> = by_category
        .iter()
        .filter(|(_, b)| b.percentage >= weak_threshold)
        .map(|(category, _)| category.clone())
        .collect();
    weak_areas.sort();
    strength_areas.sort();

    let next_steps = weak_areas
        .iter()
        .map(|category| format!("Review {category} and retake a practice set"))
        .collect();
    let milestones = weak_areas
        .iter()
        .map(|category| format!("Score at least {weak_threshold:.0}% in {category}"))
        .collect();

    LearningPath {
        weak_areas,
        strength_areas,
        next_steps,
        milestones,
    }
}
