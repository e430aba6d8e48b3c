//! The `examforge simulate` command: drive the full purchase → session →
//! result flow against in-memory stores and print what came out.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use examforge_core::model::{AnswerValue, ExamConfig, PoolConfig, Question, ScoringPolicy};
use examforge_core::pool::{AssemblyRequest, PoolManager};
use examforge_core::session::{AnswerSubmission, SessionEngine, StartOptions};
use examforge_stores::{
    InMemoryConfigStore, InMemoryLedger, InMemoryQuestionRepository, InMemoryStatsStore,
};

#[allow(clippy::too_many_arguments)]
pub async fn execute(
    bank_path: PathBuf,
    subject: String,
    learners: usize,
    questions: usize,
    passing_score: f64,
    accuracy: f64,
    seed: Option<u64>,
    json: bool,
) -> Result<()> {
    anyhow::ensure!(learners >= 1, "learners must be at least 1");
    anyhow::ensure!(questions >= 1, "questions must be at least 1");
    anyhow::ensure!(
        (0.0..=1.0).contains(&accuracy),
        "accuracy must be between 0.0 and 1.0"
    );
    anyhow::ensure!(
        (0.0..=100.0).contains(&passing_score),
        "passing-score must be between 0.0 and 100.0"
    );

    let banks = examforge_stores::load_banks(&bank_path)?;
    let pool: Vec<Question> = banks
        .into_iter()
        .flat_map(|b| b.questions)
        .collect();
    anyhow::ensure!(
        pool.iter().any(|q| q.subject_id == subject),
        "no questions for subject '{subject}' in {}",
        bank_path.display()
    );

    let repository = Arc::new(InMemoryQuestionRepository::new(pool));
    let ledger = Arc::new(InMemoryLedger::new());
    let manager = Arc::new(PoolManager::new(repository, ledger, PoolConfig::default()));
    let configs = Arc::new(InMemoryConfigStore::new());
    let stats = Arc::new(InMemoryStatsStore::new());
    let engine = SessionEngine::new(configs.clone(), stats.clone(), ScoringPolicy::default());

    let config = ExamConfig {
        exam_id: "sim-exam".to_string(),
        subject_id: subject.clone(),
        total_questions: questions,
        difficulty: None,
        difficulty_distribution: None,
        passing_score,
        categories: vec![],
        tags: vec![],
        personalization: true,
        time_limit_secs: None,
    };
    configs.insert(config.clone()).await;

    let mut rng: StdRng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };

    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec![
        "Learner", "Strategy", "Cache", "Questions", "Score", "Percent", "Status",
    ]);
    let mut results = Vec::with_capacity(learners);

    for i in 1..=learners {
        let learner = format!("learner-{i}");
        let request = AssemblyRequest::from_config(&config, &learner, false);
        let assembled = manager.assemble(&request).await?;
        manager
            .record_purchase(&learner, &config.exam_id, &subject, &assembled.questions)
            .await?;

        let session = engine
            .start_session(
                &config.exam_id,
                &learner,
                assembled.questions.clone(),
                StartOptions::default(),
            )
            .await?;

        for question in &assembled.questions {
            let value = simulated_answer(question, accuracy, &mut rng);
            engine
                .submit_answer(
                    session.id,
                    &learner,
                    AnswerSubmission {
                        question_id: question.id.clone(),
                        value,
                        marked_for_review: false,
                    },
                )
                .await?;
        }

        let result = engine.finish_session(session.id, &learner).await?;
        table.add_row(vec![
            Cell::new(&learner),
            Cell::new(assembled.strategy.to_string()),
            Cell::new(if assembled.cache_hit { "hit" } else { "miss" }),
            Cell::new(result.outcomes.len()),
            Cell::new(format!("{}/{}", result.score, result.max_score)),
            Cell::new(format!("{:.1}%", result.percentage)),
            Cell::new(result.status.to_string()),
        ]);
        results.push(result);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    println!("{table}");

    if let Some(aggregate) = stats.aggregate(&config.exam_id).await {
        println!(
            "\nAggregate: {} participant(s), avg {:.1}%, pass rate {:.0}%",
            aggregate.participants,
            aggregate.average_percentage,
            aggregate.pass_rate() * 100.0,
        );
    }

    let cache = manager.cache_stats().await?;
    println!(
        "Pool cache: {} shared pool(s), hit rate {:.0}%",
        cache.shared_cache_count,
        cache.hit_rate * 100.0,
    );

    Ok(())
}

/// Answer correctly with probability `accuracy`; otherwise pick the
/// first wrong option (or an off-list value when there is none).
fn simulated_answer(question: &Question, accuracy: f64, rng: &mut StdRng) -> AnswerValue {
    if rng.gen_bool(accuracy) {
        return AnswerValue::Selected(question.correct.clone());
    }
    let wrong = question
        .options
        .iter()
        .find(|o| !question.correct.contains(o))
        .cloned()
        .unwrap_or_else(|| "unanswerable".to_string());
    AnswerValue::Selected(vec![wrong])
}
