//! Configuration for the rules engine.

/// Configuration for dataset loading and query behavior
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Name of the multi-valued basket column, when the dataset has one
    pub basket_column: String,
    /// Delimiter between tokens inside the basket column
    pub basket_delimiter: char,
    /// Rows per record batch while reading the dataset
    pub batch_size: usize,
    /// Token prefixes that are definitionally entangled with the outcome
    /// axis; rules predicting an exact consequent must not carry them in
    /// the antecedent
    pub leakage_prefixes: Vec<String>,
    /// Suggested minimum support reported by `bootstrap`
    pub default_min_support: f64,
    /// Suggested minimum confidence reported by `bootstrap`
    pub default_min_confidence: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            basket_column: "basket".to_string(),
            basket_delimiter: ';',
            batch_size: 8192,
            leakage_prefixes: vec!["Severity_".to_string()],
            default_min_support: 0.05,
            default_min_confidence: 0.3,
        }
    }
}
