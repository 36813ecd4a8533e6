//! Request and response contract types for rule queries.

use serde::{Deserialize, Serialize};

/// Pre-filter parameters: restrict the working matrix and bound the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreFilters {
    /// Tokens every considered transaction must contain
    pub target_consequents: Vec<String>,
    /// Minimum fraction of pre-filtered transactions for a frequent itemset
    pub min_support: f64,
    /// Minimum confidence for a rule to be retained
    pub min_confidence: f64,
    /// Upper bound on antecedent size
    pub max_len_antecedent: usize,
    /// Maximum number of rules returned after sorting
    pub max_rules: usize,
}

impl Default for PreFilters {
    fn default() -> Self {
        Self {
            target_consequents: Vec::new(),
            min_support: 0.02,
            min_confidence: 0.3,
            max_len_antecedent: 4,
            max_rules: 1000,
        }
    }
}

/// Post-filter parameters applied to already-mined rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PostFilters {
    /// Tokens the antecedent set must contain
    pub antecedents_contains: Vec<String>,
    /// Tokens the consequent set must contain
    pub consequents_contains: Vec<String>,
    /// Keep only rules whose consequent equals exactly `{rhs_target}`
    pub rhs_exact: bool,
    /// The single target token for exact-consequent mode
    pub rhs_target: Option<String>,
}

/// Sort key and direction for the final rule list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SortSpec {
    /// `lift`, `support` or `confidence`; anything else falls back to lift
    pub by: String,
    /// `asc` for ascending; anything else sorts descending
    pub order: String,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            by: "lift".to_string(),
            order: "desc".to_string(),
        }
    }
}

/// A full rule query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunRequest {
    pub pre: PreFilters,
    pub post: PostFilters,
    pub sort: SortSpec,
}

/// One mined rule in response shape, token lists sorted alphabetically.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleRow {
    pub antecedents: Vec<String>,
    pub consequents: Vec<String>,
    pub support: f64,
    pub confidence: f64,
    pub lift: f64,
}

/// Statistics about one query run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunStats {
    /// Transactions surviving the pre-filter
    pub pre_filtered_records: usize,
    pub min_support: f64,
    pub min_confidence: f64,
    /// Wall-clock duration of the run
    pub runtime_ms: u64,
}

/// The full result of one query run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunResult {
    pub stats: RunStats,
    pub rules: Vec<RuleRow>,
}

/// Vocabulary and suggested thresholds for client-side UI population.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BootstrapResponse {
    pub tokens: Vec<String>,
    pub defaults: BootstrapDefaults,
}

/// Suggested starting thresholds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BootstrapDefaults {
    pub min_support: f64,
    pub min_confidence: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_request_uses_field_defaults() {
        let request: RunRequest = serde_json::from_str("{}").unwrap();
        assert!(request.pre.target_consequents.is_empty());
        assert!((request.pre.min_support - 0.02).abs() < 1e-12);
        assert!((request.pre.min_confidence - 0.3).abs() < 1e-12);
        assert_eq!(request.pre.max_len_antecedent, 4);
        assert_eq!(request.pre.max_rules, 1000);
        assert!(!request.post.rhs_exact);
        assert_eq!(request.sort.by, "lift");
        assert_eq!(request.sort.order, "desc");
    }

    #[test]
    fn partial_sections_fill_remaining_fields() {
        let request: RunRequest = serde_json::from_str(
            r#"{
                "pre": {"target_consequents": ["A"], "min_support": 0.1},
                "post": {"rhs_exact": true, "rhs_target": "Severity_S"},
                "sort": {"order": "asc"}
            }"#,
        )
        .unwrap();
        assert_eq!(request.pre.target_consequents, ["A"]);
        assert!((request.pre.min_support - 0.1).abs() < 1e-12);
        assert_eq!(request.pre.max_rules, 1000);
        assert!(request.post.rhs_exact);
        assert_eq!(request.post.rhs_target.as_deref(), Some("Severity_S"));
        assert_eq!(request.sort.by, "lift");
        assert_eq!(request.sort.order, "asc");
    }
}
