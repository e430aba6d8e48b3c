pub mod cache_stats;
pub mod simulate;
pub mod validate;
