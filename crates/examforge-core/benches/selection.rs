use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use examforge_core::model::{Difficulty, DifficultyDistribution, Question, QuestionType};
use examforge_core::selector::{select, select_distributed};

fn make_pool(n: usize) -> Vec<Question> {
    (0..n)
        .map(|i| Question {
            id: format!("q{i}"),
            subject_id: "bench".into(),
            question_type: QuestionType::SingleChoice,
            difficulty: match i % 3 {
                0 => Difficulty::Easy,
                1 => Difficulty::Medium,
                _ => Difficulty::Hard,
            },
            category: format!("cat{}", i % 8),
            tags: vec![],
            prompt: format!("question {i}"),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct: vec!["a".into()],
            published: true,
        })
        .collect()
}

fn bench_select(c: &mut Criterion) {
    let mut group = c.benchmark_group("select");
    let pool = make_pool(1000);

    group.bench_function("1000-pool take 10", |b| {
        let mut rng = StdRng::seed_from_u64(1);
        b.iter(|| select(black_box(&pool), black_box(10), &mut rng))
    });

    group.bench_function("1000-pool take 100", |b| {
        let mut rng = StdRng::seed_from_u64(1);
        b.iter(|| select(black_box(&pool), black_box(100), &mut rng))
    });

    group.finish();
}

fn bench_select_distributed(c: &mut Criterion) {
    let mut group = c.benchmark_group("select_distributed");
    let pool = make_pool(1000);
    let dist = DifficultyDistribution {
        easy: 3,
        medium: 5,
        hard: 2,
    };

    group.bench_function("1000-pool take 50", |b| {
        let mut rng = StdRng::seed_from_u64(1);
        b.iter(|| select_distributed(black_box(&pool), black_box(50), &dist, &mut rng))
    });

    group.finish();
}

criterion_group!(benches, bench_select, bench_select_distributed);
criterion_main!(benches);
