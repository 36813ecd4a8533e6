//! Association-rule mining over one-hot accident records.
//!
//! The engine loads a delimited dataset into an immutable transaction matrix,
//! enumerates frequent itemsets and association rules under caller-supplied
//! thresholds, and applies a two-stage (pre-filter / post-filter) query model
//! with deterministic sort and cap semantics.

pub mod config;
pub mod engine;
pub mod error;
pub mod loader;
pub mod mining;

// Re-export the most common types for easier use
// Core types
pub use config::EngineConfig;
pub use engine::{RulesEngine, shared_engine};
pub use error::{Result, RulesEngineError};

// Query contract
pub use engine::params::{
    BootstrapResponse, PostFilters, PreFilters, RuleRow, RunRequest, RunResult, RunStats, SortSpec,
};

// Dataset loading
pub use loader::load_dataset;
pub use loader::matrix::TransactionMatrix;

// Mining primitives
pub use mining::{AssociationRule, FrequentItemset, frequent_itemsets, generate_rules};
