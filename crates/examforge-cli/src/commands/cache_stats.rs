//! The `examforge cache-stats` command: assembly-only workload, then the
//! pool manager's operational snapshot.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use examforge_core::model::{PoolConfig, Question};
use examforge_core::pool::{AssemblyRequest, PoolManager};
use examforge_stores::{InMemoryLedger, InMemoryQuestionRepository};

pub async fn execute(bank_path: PathBuf, buyers: usize, questions: usize) -> Result<()> {
    anyhow::ensure!(buyers >= 1, "buyers must be at least 1");

    let banks = examforge_stores::load_banks(&bank_path)?;
    let pool: Vec<Question> = banks.into_iter().flat_map(|b| b.questions).collect();
    let subjects: BTreeSet<String> = pool.iter().map(|q| q.subject_id.clone()).collect();
    anyhow::ensure!(!subjects.is_empty(), "no questions in {}", bank_path.display());

    let repository = Arc::new(InMemoryQuestionRepository::new(pool));
    let ledger = Arc::new(InMemoryLedger::new());
    let manager = Arc::new(PoolManager::new(repository, ledger, PoolConfig::default()));

    for subject in &subjects {
        for i in 1..=buyers {
            let request = AssemblyRequest {
                user_id: format!("buyer-{subject}-{i}"),
                exam_id: format!("exam-{subject}"),
                subject_id: subject.clone(),
                difficulty: None,
                difficulty_distribution: None,
                categories: vec![],
                tags: vec![],
                total_questions: questions,
                is_repetition: false,
            };
            manager.assemble(&request).await?;
        }
    }

    let stats = manager.cache_stats().await?;

    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Metric", "Value"]);
    table.add_row(vec![
        Cell::new("Subjects exercised"),
        Cell::new(subjects.len()),
    ]);
    table.add_row(vec![
        Cell::new("Shared pool caches"),
        Cell::new(stats.shared_cache_count),
    ]);
    table.add_row(vec![
        Cell::new("Hit rate"),
        Cell::new(format!("{:.1}%", stats.hit_rate * 100.0)),
    ]);
    table.add_row(vec![
        Cell::new("Memory estimate"),
        Cell::new(format!("{} bytes", stats.memory_estimate_bytes)),
    ]);
    table.add_row(vec![
        Cell::new("Tracked histories"),
        Cell::new(stats.tracked_histories),
    ]);
    table.add_row(vec![
        Cell::new("Tracked repetitions"),
        Cell::new(stats.tracked_repetitions),
    ]);
    println!("{table}");

    Ok(())
}
