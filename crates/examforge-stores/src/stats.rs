//! In-memory exam-level aggregate statistics.
//!
//! Updates fold into the running aggregate; nothing here ever
//! overwrites a previous total.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use examforge_core::error::RepositoryError;
use examforge_core::traits::{ExamStatsStore, StatsUpdate};

/// Running aggregate for one exam.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ExamAggregate {
    pub participants: u64,
    /// Running mean of result percentages.
    pub average_percentage: f64,
    pub pass_count: u64,
}

impl ExamAggregate {
    /// Fold one finished attempt into the aggregate.
    pub fn apply(&mut self, update: &StatsUpdate) {
        self.participants += 1;
        self.average_percentage +=
            (update.percentage - self.average_percentage) / self.participants as f64;
        if update.passed {
            self.pass_count += 1;
        }
    }

    pub fn pass_rate(&self) -> f64 {
        if self.participants == 0 {
            0.0
        } else {
            self.pass_count as f64 / self.participants as f64
        }
    }
}

#[derive(Default)]
pub struct InMemoryStatsStore {
    aggregates: RwLock<HashMap<String, ExamAggregate>>,
}

impl InMemoryStatsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn aggregate(&self, exam_id: &str) -> Option<ExamAggregate> {
        self.aggregates.read().await.get(exam_id).copied()
    }
}

#[async_trait]
impl ExamStatsStore for InMemoryStatsStore {
    async fn record(&self, exam_id: &str, update: &StatsUpdate) -> Result<(), RepositoryError> {
        let mut aggregates = self.aggregates.write().await;
        aggregates
            .entry(exam_id.to_string())
            .or_default()
            .apply(update);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn updates_accumulate_instead_of_overwriting() {
        let store = InMemoryStatsStore::new();
        store
            .record(
                "e1",
                &StatsUpdate {
                    percentage: 80.0,
                    passed: true,
                },
            )
            .await
            .unwrap();
        store
            .record(
                "e1",
                &StatsUpdate {
                    percentage: 40.0,
                    passed: false,
                },
            )
            .await
            .unwrap();

        let agg = store.aggregate("e1").await.unwrap();
        assert_eq!(agg.participants, 2);
        assert!((agg.average_percentage - 60.0).abs() < 1e-9);
        assert_eq!(agg.pass_count, 1);
        assert!((agg.pass_rate() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn running_mean_matches_batch_mean() {
        let mut agg = ExamAggregate::default();
        let percentages = [10.0, 90.0, 55.0, 70.0, 25.0];
        for p in percentages {
            agg.apply(&StatsUpdate {
                percentage: p,
                passed: p >= 60.0,
            });
        }
        let batch_mean = percentages.iter().sum::<f64>() / percentages.len() as f64;
        assert!((agg.average_percentage - batch_mean).abs() < 1e-9);
        assert_eq!(agg.pass_count, 2);
    }
}
