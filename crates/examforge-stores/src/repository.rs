//! In-memory question repository.
//!
//! Instrumented for tests: it counts calls and can be scripted to fail
//! the next N queries, which is how the assembly retry path is
//! exercised without a real backend.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use examforge_core::error::RepositoryError;
use examforge_core::model::Question;
use examforge_core::traits::{QuestionFilter, QuestionRepository};

pub struct InMemoryQuestionRepository {
    questions: RwLock<Vec<Question>>,
    call_count: AtomicU32,
    fail_next: AtomicU32,
}

impl InMemoryQuestionRepository {
    pub fn new(questions: Vec<Question>) -> Self {
        Self {
            questions: RwLock::new(questions),
            call_count: AtomicU32::new(0),
            fail_next: AtomicU32::new(0),
        }
    }

    pub async fn push(&self, question: Question) {
        self.questions.write().await.push(question);
    }

    /// Number of `find` calls made against this repository.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Make the next `n` queries fail with `Unavailable`.
    pub fn fail_next(&self, n: u32) {
        self.fail_next.store(n, Ordering::SeqCst);
    }
}

fn matches(question: &Question, filter: &QuestionFilter) -> bool {
    if !question.published {
        return false;
    }
    if question.subject_id != filter.subject_id {
        return false;
    }
    if let Some(difficulty) = filter.difficulty {
        if question.difficulty != difficulty {
            return false;
        }
    }
    if !filter.categories.is_empty() && !filter.categories.contains(&question.category) {
        return false;
    }
    if !filter.tags.is_empty() && !question.tags.iter().any(|t| filter.tags.contains(t)) {
        return false;
    }
    true
}

#[async_trait]
impl QuestionRepository for InMemoryQuestionRepository {
    async fn find(
        &self,
        filter: &QuestionFilter,
        exclude: &HashSet<String>,
        limit: usize,
    ) -> Result<Vec<Question>, RepositoryError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);

        let remaining = self.fail_next.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_next.store(remaining - 1, Ordering::SeqCst);
            return Err(RepositoryError::Unavailable(
                "scripted repository failure".into(),
            ));
        }

        let questions = self.questions.read().await;
        Ok(questions
            .iter()
            .filter(|q| matches(q, filter) && !exclude.contains(&q.id))
            .take(limit)
            .cloned()
            .collect())
    }
}
