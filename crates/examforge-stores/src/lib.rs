//! examforge-stores — In-memory implementations of the store contracts.
//!
//! Implements `QuestionRepository`, `ExamConfigStore`, `ExamStatsStore`,
//! and `PurchaseLedger` over process memory, plus TOML question-bank
//! loading. A durable backend swaps in behind the same traits without
//! touching the engines.

pub mod bank;
pub mod config_store;
pub mod ledger;
pub mod repository;
pub mod stats;

pub use bank::{load_bank, load_banks, QuestionBank};
pub use config_store::InMemoryConfigStore;
pub use ledger::InMemoryLedger;
pub use repository::InMemoryQuestionRepository;
pub use stats::{ExamAggregate, InMemoryStatsStore};
