//! In-memory exam configuration store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use examforge_core::error::RepositoryError;
use examforge_core::model::ExamConfig;
use examforge_core::traits::ExamConfigStore;

#[derive(Default)]
pub struct InMemoryConfigStore {
    configs: RwLock<HashMap<String, ExamConfig>>,
}

impl InMemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, config: ExamConfig) {
        self.configs
            .write()
            .await
            .insert(config.exam_id.clone(), config);
    }
}

#[async_trait]
impl ExamConfigStore for InMemoryConfigStore {
    async fn get(&self, exam_id: &str) -> Result<ExamConfig, RepositoryError> {
        self.configs
            .read()
            .await
            .get(exam_id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("exam config {exam_id}")))
    }
}
