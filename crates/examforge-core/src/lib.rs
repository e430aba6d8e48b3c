//! examforge-core — Exam assembly, session, and analytics engine.
//!
//! This crate defines the data model, the store contracts, and the three
//! engines of the examforge system: the pool cache manager that decides
//! which questions a buyer receives, the session engine that drives a
//! timed attempt to a scored result, and the analytics functions that
//! derive performance metrics from a finished attempt.

pub mod analytics;
pub mod cache;
pub mod error;
pub mod model;
pub mod pool;
pub mod results;
pub mod selector;
pub mod session;
pub mod traits;
