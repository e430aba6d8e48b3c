//! The pool cache manager: decides which questions a purchase receives.
//!
//! Three supply strategies, in order of precedence:
//!
//! 1. **Repetition** — replay the frozen original set, bounded by the
//!    repetition ceiling.
//! 2. **Shared** — first purchase for a subject draws from a cached
//!    candidate pool reused across first-time buyers with the same
//!    normalized filters.
//! 3. **Unique** — later purchases query the repository excluding every
//!    question the user has already received. Never cached.
//!
//! Mutating paths are serialized through per-logical-key async mutexes;
//! read paths run concurrently and only touch relaxed counters.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};

use crate::cache::{cache_key, SharedPoolCache};
use crate::error::{AssemblyError, RepositoryError};
use crate::model::{
    Difficulty, DifficultyDistribution, ExamConfig, PoolConfig, Question, ShortSupplyPolicy,
};
use crate::selector;
use crate::traits::{LedgerEntry, PurchaseLedger, QuestionFilter, QuestionRepository};

/// Cache-expiry sweep cadence.
pub const CACHE_SWEEP_INTERVAL: Duration = Duration::from_secs(30 * 60);
/// Ledger idle-entry sweep cadence.
pub const LEDGER_SWEEP_INTERVAL: Duration = Duration::from_secs(2 * 60 * 60);
/// Ledger entries idle longer than this are dropped by the sweep.
pub const LEDGER_IDLE_DAYS: i64 = 30;

/// A purchase or review request.
#[derive(Debug, Clone)]
pub struct AssemblyRequest {
    pub user_id: String,
    pub exam_id: String,
    pub subject_id: String,
    pub difficulty: Option<Difficulty>,
    pub difficulty_distribution: Option<DifficultyDistribution>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub total_questions: usize,
    pub is_repetition: bool,
}

impl AssemblyRequest {
    /// Build a request from an exam's stored configuration.
    pub fn from_config(config: &ExamConfig, user_id: &str, is_repetition: bool) -> Self {
        Self {
            user_id: user_id.to_string(),
            exam_id: config.exam_id.clone(),
            subject_id: config.subject_id.clone(),
            difficulty: config.difficulty,
            difficulty_distribution: config.difficulty_distribution,
            categories: config.categories.clone(),
            tags: config.tags.clone(),
            total_questions: config.total_questions,
            is_repetition,
        }
    }

    fn filter(&self) -> QuestionFilter {
        QuestionFilter {
            subject_id: self.subject_id.clone(),
            difficulty: self.difficulty,
            categories: self.categories.clone(),
            tags: self.tags.clone(),
        }
    }
}

/// Which path served a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SupplyStrategy {
    Shared,
    Unique,
    Repetition,
}

impl std::fmt::Display for SupplyStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SupplyStrategy::Shared => write!(f, "shared"),
            SupplyStrategy::Unique => write!(f, "unique"),
            SupplyStrategy::Repetition => write!(f, "repetition"),
        }
    }
}

/// The pool returned fewer candidates than the buyer paid for. A
/// warning, not a failure, under the `Degrade` policy.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SupplyShortfall {
    pub requested: usize,
    pub available: usize,
}

/// The outcome of `assemble`.
#[derive(Debug, Clone, Serialize)]
pub struct AssembledExam {
    pub questions: Vec<Question>,
    pub strategy: SupplyStrategy,
    /// Purchase number for shared/unique; delivery number for
    /// repetition.
    pub sequence: u32,
    pub cache_hit: bool,
    /// Usage count of the shared pool that served this request.
    pub pool_uses: Option<u64>,
    pub shortfall: Option<SupplyShortfall>,
}

/// Per-logical-key serialization for mutating paths. One async mutex
/// per cache key / (user, subject) / (user, exam), never a single
/// global lock.
struct KeyLocks {
    inner: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyLocks {
    fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    async fn lock_for(&self, key: &str) -> Arc<Mutex<()>> {
        let mut map = self.inner.lock().await;
        map.entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

/// Operational snapshot for dashboards. Advisory.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub shared_cache_count: usize,
    pub hit_rate: f64,
    pub memory_estimate_bytes: usize,
    pub tracked_histories: usize,
    pub tracked_repetitions: usize,
}

/// The pool cache manager.
pub struct PoolManager {
    repository: Arc<dyn QuestionRepository>,
    ledger: Arc<dyn PurchaseLedger>,
    config: PoolConfig,
    cache: RwLock<SharedPoolCache>,
    key_locks: KeyLocks,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl PoolManager {
    pub fn new(
        repository: Arc<dyn QuestionRepository>,
        ledger: Arc<dyn PurchaseLedger>,
        config: PoolConfig,
    ) -> Self {
        let cache = SharedPoolCache::new(config.max_shared_caches, config.cache_ttl);
        Self {
            repository,
            ledger,
            config,
            cache: RwLock::new(cache),
            key_locks: KeyLocks::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Resolve a question set for a purchase or review request.
    ///
    /// The checkout flow calls this before charging the buyer and
    /// `record_purchase` once payment confirms.
    pub async fn assemble(&self, request: &AssemblyRequest) -> Result<AssembledExam, AssemblyError> {
        if request.is_repetition {
            return self.assemble_repetition(request).await;
        }

        let history = self
            .ledger
            .history(&request.user_id, &request.subject_id)
            .await?;
        let sequence = history.total_purchases + 1;

        if history.total_purchases == 0 {
            self.assemble_shared(request, sequence).await
        } else {
            self.assemble_unique(request, sequence, &history.delivered)
                .await
        }
    }

    /// Repetition path: replay the frozen original set, bounded by the
    /// ceiling. The counter check and increment run under the per
    /// (user, exam) lock so two concurrent repetitions cannot both pass
    /// a stale check.
    async fn assemble_repetition(
        &self,
        request: &AssemblyRequest,
    ) -> Result<AssembledExam, AssemblyError> {
        let lock = self
            .key_locks
            .lock_for(&format!("rep:{}:{}", request.user_id, request.exam_id))
            .await;
        let _guard = lock.lock().await;

        let record = self
            .ledger
            .repetition(&request.user_id, &request.exam_id)
            .await?
            .ok_or_else(|| AssemblyError::ExamNotPurchased {
                user_id: request.user_id.clone(),
                exam_id: request.exam_id.clone(),
            })?;

        // repetition_count is the delivery number: 1 after the first
        // purchase. The ceiling bounds repetitions, not deliveries.
        if record.repetition_count > self.config.max_repetitions {
            return Err(AssemblyError::RepetitionLimitExceeded {
                exam_id: request.exam_id.clone(),
                limit: self.config.max_repetitions,
            });
        }

        let updated = self
            .ledger
            .increment_repetition(&request.user_id, &request.exam_id, Utc::now())
            .await?;
        self.hits.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            user_id = %request.user_id,
            exam_id = %request.exam_id,
            repetition = updated.repetition_count,
            "serving repetition from frozen set"
        );

        Ok(AssembledExam {
            questions: updated.questions,
            strategy: SupplyStrategy::Repetition,
            sequence: updated.repetition_count,
            cache_hit: true,
            pool_uses: None,
            shortfall: None,
        })
    }

    /// Shared path: first purchase for this subject. Equivalent requests
    /// collide on the normalized cache key and reuse one candidate pool.
    async fn assemble_shared(
        &self,
        request: &AssemblyRequest,
        sequence: u32,
    ) -> Result<AssembledExam, AssemblyError> {
        let filter = request.filter();
        let key = cache_key(&filter, request.total_questions, sequence);
        let now = Utc::now();

        if let Some(entry) = self.cache.read().await.get(&key, now) {
            let uses = entry.touch(now);
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(%key, uses, "shared pool cache hit");
            return self.finish_shared(request, sequence, &entry.questions, true, uses);
        }

        // Miss: serialize pool creation per cache key so concurrent
        // first-time buyers fetch the repository once.
        let lock = self.key_locks.lock_for(&format!("shared:{key}")).await;
        let _guard = lock.lock().await;

        let now = Utc::now();
        if let Some(entry) = self.cache.read().await.get(&key, now) {
            let uses = entry.touch(now);
            self.hits.fetch_add(1, Ordering::Relaxed);
            return self.finish_shared(request, sequence, &entry.questions, true, uses);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let limit = self.pool_limit(request.total_questions);
        let candidates = self
            .fetch_candidates(&filter, &HashSet::new(), limit)
            .await?;
        tracing::debug!(%key, candidates = candidates.len(), "materialized shared pool");

        let entry = self.cache.write().await.insert(key, candidates, now);
        let uses = entry.touch(now);
        self.finish_shared(request, sequence, &entry.questions, false, uses)
    }

    fn finish_shared(
        &self,
        request: &AssemblyRequest,
        sequence: u32,
        pool: &[Question],
        cache_hit: bool,
        uses: u64,
    ) -> Result<AssembledExam, AssemblyError> {
        let shortfall = self.check_supply(request, pool.len())?;
        Ok(AssembledExam {
            questions: self.draw(request, pool),
            strategy: SupplyStrategy::Shared,
            sequence,
            cache_hit,
            pool_uses: Some(uses),
            shortfall,
        })
    }

    /// Unique path: any purchase beyond the first. The pool excludes the
    /// user's full delivery history and is never cached.
    async fn assemble_unique(
        &self,
        request: &AssemblyRequest,
        sequence: u32,
        delivered: &HashSet<String>,
    ) -> Result<AssembledExam, AssemblyError> {
        self.misses.fetch_add(1, Ordering::Relaxed);
        let filter = request.filter();
        let limit = self.pool_limit(request.total_questions);
        let candidates = self.fetch_candidates(&filter, delivered, limit).await?;
        tracing::debug!(
            user_id = %request.user_id,
            excluded = delivered.len(),
            candidates = candidates.len(),
            "materialized unique pool"
        );

        let shortfall = self.check_supply(request, candidates.len())?;
        Ok(AssembledExam {
            questions: self.draw(request, &candidates),
            strategy: SupplyStrategy::Unique,
            sequence,
            cache_hit: false,
            pool_uses: None,
            shortfall,
        })
    }

    /// Record a confirmed purchase: grow the subject history and seed
    /// the repetition record with the delivered list.
    pub async fn record_purchase(
        &self,
        user_id: &str,
        exam_id: &str,
        subject_id: &str,
        delivered: &[Question],
    ) -> Result<(), AssemblyError> {
        let lock = self
            .key_locks
            .lock_for(&format!("hist:{user_id}:{subject_id}"))
            .await;
        let _guard = lock.lock().await;
        self.ledger
            .record_purchase(user_id, exam_id, subject_id, delivered)
            .await?;
        tracing::debug!(user_id, exam_id, delivered = delivered.len(), "purchase recorded");
        Ok(())
    }

    /// Operational snapshot for dashboards.
    pub async fn cache_stats(&self) -> Result<CacheStats, AssemblyError> {
        let cache = self.cache.read().await;
        let counts = self.ledger.counts().await?;
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let lookups = hits + misses;
        Ok(CacheStats {
            shared_cache_count: cache.len(),
            hit_rate: if lookups == 0 {
                0.0
            } else {
                hits as f64 / lookups as f64
            },
            memory_estimate_bytes: cache.memory_estimate(),
            tracked_histories: counts.histories,
            tracked_repetitions: counts.repetitions,
        })
    }

    /// Drop expired shared pools. Returns how many were removed.
    pub async fn sweep_expired_caches(&self) -> usize {
        self.sweep_expired_caches_at(Utc::now()).await
    }

    pub async fn sweep_expired_caches_at(&self, now: DateTime<Utc>) -> usize {
        let removed = self.cache.write().await.sweep_expired(now);
        if removed > 0 {
            tracing::debug!(removed, "swept expired shared pools");
        }
        removed
    }

    /// Drop ledger entries idle past the horizon.
    pub async fn sweep_idle_ledger(&self) -> Result<usize, AssemblyError> {
        self.sweep_idle_ledger_at(Utc::now()).await
    }

    /// Each candidate is deleted under the same per-key lock the
    /// foreground paths hold, so a repetition that has validated its
    /// record cannot lose it before the counter increment lands.
    pub async fn sweep_idle_ledger_at(
        &self,
        now: DateTime<Utc>,
    ) -> Result<usize, AssemblyError> {
        let cutoff = now - chrono::Duration::days(LEDGER_IDLE_DAYS);
        let candidates = self.ledger.idle_entries(cutoff).await?;
        let mut removed = 0;
        for entry in candidates {
            let key = match &entry {
                LedgerEntry::History {
                    user_id,
                    subject_id,
                } => format!("hist:{user_id}:{subject_id}"),
                LedgerEntry::Repetition { user_id, exam_id } => {
                    format!("rep:{user_id}:{exam_id}")
                }
            };
            let lock = self.key_locks.lock_for(&key).await;
            let _guard = lock.lock().await;
            // Re-check under the lock: activity since enumeration keeps
            // the entry.
            if self.ledger.remove_if_idle(&entry, cutoff).await? {
                removed += 1;
            }
        }
        if removed > 0 {
            tracing::debug!(removed, "swept idle ledger entries");
        }
        Ok(removed)
    }

    /// Start the periodic housekeeping tasks: a cache-expiry sweep every
    /// 30 minutes and a ledger idle sweep every 2 hours.
    pub fn spawn_maintenance(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            let mut cache_tick = tokio::time::interval(CACHE_SWEEP_INTERVAL);
            let mut ledger_tick = tokio::time::interval(LEDGER_SWEEP_INTERVAL);
            cache_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            ledger_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = cache_tick.tick() => {
                        manager.sweep_expired_caches().await;
                    }
                    _ = ledger_tick.tick() => {
                        if let Err(e) = manager.sweep_idle_ledger().await {
                            tracing::warn!(error = %e, "ledger sweep failed");
                        }
                    }
                }
            }
        })
    }

    fn pool_limit(&self, total_questions: usize) -> usize {
        (total_questions * self.config.pool_multiplier).min(self.config.pool_cap)
    }

    /// Repository query with one bounded retry cycle for transient
    /// failures; permanent failures surface immediately.
    async fn fetch_candidates(
        &self,
        filter: &QuestionFilter,
        exclude: &HashSet<String>,
        limit: usize,
    ) -> Result<Vec<Question>, AssemblyError> {
        let mut delay = self.config.retry_delay;
        let mut last_error = None;
        for attempt in 0..=self.config.repo_retries {
            if attempt > 0 {
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(Duration::from_secs(60));
            }
            match self.repository.find(filter, exclude, limit).await {
                Ok(questions) => return Ok(questions),
                Err(e) if e.is_retryable() => {
                    tracing::warn!(attempt, error = %e, "question repository query failed");
                    last_error = Some(e);
                }
                Err(e) => return Err(AssemblyError::RepositoryUnavailable(e)),
            }
        }
        Err(AssemblyError::RepositoryUnavailable(
            last_error
                .unwrap_or_else(|| RepositoryError::Unavailable("retries exhausted".into())),
        ))
    }

    fn check_supply(
        &self,
        request: &AssemblyRequest,
        available: usize,
    ) -> Result<Option<SupplyShortfall>, AssemblyError> {
        if available >= request.total_questions {
            return Ok(None);
        }
        tracing::warn!(
            user_id = %request.user_id,
            subject_id = %request.subject_id,
            requested = request.total_questions,
            available,
            "candidate pool smaller than requested"
        );
        match self.config.short_supply {
            ShortSupplyPolicy::Fail => Err(AssemblyError::InsufficientSupply {
                requested: request.total_questions,
                available,
            }),
            ShortSupplyPolicy::Degrade => Ok(Some(SupplyShortfall {
                requested: request.total_questions,
                available,
            })),
        }
    }

    fn draw(&self, request: &AssemblyRequest, pool: &[Question]) -> Vec<Question> {
        let mut rng = rand::thread_rng();
        match &request.difficulty_distribution {
            Some(distribution) if request.difficulty.is_none() => {
                selector::select_distributed(pool, request.total_questions, distribution, &mut rng)
            }
            _ => selector::select(pool, request.total_questions, &mut rng),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionType;
    use crate::traits::{LedgerCounts, RepetitionRecord, SubjectHistory};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicU32;

    fn make_questions(n: usize) -> Vec<Question> {
        (0..n)
            .map(|i| Question {
                id: format!("q{i}"),
                subject_id: "s1".into(),
                question_type: QuestionType::SingleChoice,
                difficulty: Difficulty::Medium,
                category: "general".into(),
                tags: vec![],
                prompt: format!("question {i}"),
                options: vec!["a".into(), "b".into()],
                correct: vec!["a".into()],
                published: true,
            })
            .collect()
    }

    /// Repository that fails the first `fail_first` calls, then serves a
    /// fixed pool.
    struct FlakyRepository {
        pool: Vec<Question>,
        fail_first: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl QuestionRepository for FlakyRepository {
        async fn find(
            &self,
            _filter: &QuestionFilter,
            exclude: &HashSet<String>,
            limit: usize,
        ) -> Result<Vec<Question>, RepositoryError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_first {
                return Err(RepositoryError::Unavailable("flaky".into()));
            }
            Ok(self
                .pool
                .iter()
                .filter(|q| !exclude.contains(&q.id))
                .take(limit)
                .cloned()
                .collect())
        }
    }

    /// Ledger with no recorded purchases.
    struct EmptyLedger;

    #[async_trait]
    impl PurchaseLedger for EmptyLedger {
        async fn history(&self, _: &str, _: &str) -> Result<SubjectHistory, RepositoryError> {
            Ok(SubjectHistory::default())
        }
        async fn record_purchase(
            &self,
            _: &str,
            _: &str,
            _: &str,
            _: &[Question],
        ) -> Result<(), RepositoryError> {
            Ok(())
        }
        async fn repetition(
            &self,
            _: &str,
            _: &str,
        ) -> Result<Option<RepetitionRecord>, RepositoryError> {
            Ok(None)
        }
        async fn increment_repetition(
            &self,
            user_id: &str,
            exam_id: &str,
            _: DateTime<Utc>,
        ) -> Result<RepetitionRecord, RepositoryError> {
            Err(RepositoryError::NotFound(format!("{user_id}/{exam_id}")))
        }
        async fn idle_entries(
            &self,
            _: DateTime<Utc>,
        ) -> Result<Vec<LedgerEntry>, RepositoryError> {
            Ok(vec![])
        }
        async fn remove_if_idle(
            &self,
            _: &LedgerEntry,
            _: DateTime<Utc>,
        ) -> Result<bool, RepositoryError> {
            Ok(false)
        }
        async fn counts(&self) -> Result<LedgerCounts, RepositoryError> {
            Ok(LedgerCounts {
                histories: 0,
                repetitions: 0,
            })
        }
    }

    fn request(total: usize) -> AssemblyRequest {
        AssemblyRequest {
            user_id: "u1".into(),
            exam_id: "exam-1".into(),
            subject_id: "s1".into(),
            difficulty: Some(Difficulty::Medium),
            difficulty_distribution: None,
            categories: vec![],
            tags: vec![],
            total_questions: total,
            is_repetition: false,
        }
    }

    fn fast_config() -> PoolConfig {
        PoolConfig {
            retry_delay: Duration::from_millis(1),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn transient_repository_failure_is_retried_once() {
        let repo = Arc::new(FlakyRepository {
            pool: make_questions(30),
            fail_first: 1,
            calls: AtomicU32::new(0),
        });
        let manager = PoolManager::new(repo.clone(), Arc::new(EmptyLedger), fast_config());

        let assembled = manager.assemble(&request(10)).await.unwrap();
        assert_eq!(assembled.questions.len(), 10);
        assert_eq!(assembled.strategy, SupplyStrategy::Shared);
        assert_eq!(repo.calls.load(Ordering::SeqCst), 2, "one retry");
    }

    #[tokio::test]
    async fn persistent_repository_failure_surfaces_after_retries() {
        let repo = Arc::new(FlakyRepository {
            pool: make_questions(30),
            fail_first: 10,
            calls: AtomicU32::new(0),
        });
        let manager = PoolManager::new(repo.clone(), Arc::new(EmptyLedger), fast_config());

        let err = manager.assemble(&request(10)).await.unwrap_err();
        assert!(matches!(err, AssemblyError::RepositoryUnavailable(_)));
        assert_eq!(repo.calls.load(Ordering::SeqCst), 2, "retries are bounded");
    }

    #[tokio::test]
    async fn repetition_without_purchase_is_rejected() {
        let repo = Arc::new(FlakyRepository {
            pool: make_questions(5),
            fail_first: 0,
            calls: AtomicU32::new(0),
        });
        let manager = PoolManager::new(repo, Arc::new(EmptyLedger), fast_config());

        let mut req = request(5);
        req.is_repetition = true;
        let err = manager.assemble(&req).await.unwrap_err();
        assert!(matches!(err, AssemblyError::ExamNotPurchased { .. }));
    }

    #[tokio::test]
    async fn short_supply_fails_when_policy_says_so() {
        let repo = Arc::new(FlakyRepository {
            pool: make_questions(3),
            fail_first: 0,
            calls: AtomicU32::new(0),
        });
        let config = PoolConfig {
            short_supply: ShortSupplyPolicy::Fail,
            retry_delay: Duration::from_millis(1),
            ..Default::default()
        };
        let manager = PoolManager::new(repo, Arc::new(EmptyLedger), config);

        let err = manager.assemble(&request(10)).await.unwrap_err();
        assert!(matches!(
            err,
            AssemblyError::InsufficientSupply {
                requested: 10,
                available: 3
            }
        ));
    }

    #[tokio::test]
    async fn short_supply_degrades_by_default() {
        let repo = Arc::new(FlakyRepository {
            pool: make_questions(3),
            fail_first: 0,
            calls: AtomicU32::new(0),
        });
        let manager = PoolManager::new(repo, Arc::new(EmptyLedger), fast_config());

        let assembled = manager.assemble(&request(10)).await.unwrap();
        assert_eq!(assembled.questions.len(), 3);
        let shortfall = assembled.shortfall.expect("shortfall must be visible");
        assert_eq!(shortfall.requested, 10);
        assert_eq!(shortfall.available, 3);
    }

    #[test]
    fn pool_limit_is_multiplied_and_capped() {
        let repo = Arc::new(FlakyRepository {
            pool: vec![],
            fail_first: 0,
            calls: AtomicU32::new(0),
        });
        let manager = PoolManager::new(repo, Arc::new(EmptyLedger), PoolConfig::default());
        assert_eq!(manager.pool_limit(10), 30);
        assert_eq!(manager.pool_limit(400), 1000);
    }
}
