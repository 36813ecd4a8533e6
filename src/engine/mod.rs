//! Query engine orchestrating the loader and the mining passes.
//!
//! `RulesEngine` owns an immutable transaction matrix; every query is a pure
//! function of that matrix and the call parameters, so unsynchronized
//! concurrent reads are safe once construction has happened-before them.

pub mod params;

use std::path::Path;
use std::sync::{Mutex, OnceLock, PoisonError};
use std::time::Instant;

use log::{debug, info};

use crate::config::EngineConfig;
use crate::error::{Result, RulesEngineError};
use crate::loader::matrix::{Bitset, TransactionMatrix};
use crate::loader::load_dataset;
use crate::mining::{AssociationRule, frequent_itemsets, generate_rules};
use params::{
    BootstrapDefaults, BootstrapResponse, RuleRow, RunRequest, RunResult, RunStats,
};

/// Sort keys accepted for the final rule list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SortKey {
    Lift,
    Support,
    Confidence,
}

impl SortKey {
    /// Unrecognized keys silently fall back to lift.
    fn resolve(raw: &str) -> Self {
        match raw {
            "support" => Self::Support,
            "confidence" => Self::Confidence,
            _ => Self::Lift,
        }
    }
}

/// Association-rule query engine over an immutable transaction matrix.
#[derive(Debug)]
pub struct RulesEngine {
    matrix: TransactionMatrix,
    config: EngineConfig,
}

impl RulesEngine {
    /// Build the engine by loading the dataset at `path`.
    ///
    /// # Errors
    /// Construction fails when the dataset is missing, unreadable, or
    /// yields an empty vocabulary; these are fatal, not per-query, errors.
    pub fn from_path(path: &Path, config: EngineConfig) -> Result<Self> {
        let matrix = load_dataset(path, &config)?;
        Ok(Self { matrix, config })
    }

    /// Build the engine from an already-constructed matrix.
    #[must_use]
    pub const fn new(matrix: TransactionMatrix, config: EngineConfig) -> Self {
        Self { matrix, config }
    }

    /// Sorted vocabulary of item tokens.
    #[must_use]
    pub fn tokens(&self) -> &[String] {
        self.matrix.tokens()
    }

    /// Vocabulary minus the non-informative "unknown" buckets, plus the
    /// suggested starting thresholds, for populating a client UI.
    #[must_use]
    pub fn bootstrap(&self) -> BootstrapResponse {
        let tokens = self
            .matrix
            .tokens()
            .iter()
            .filter(|token| !contains_unknown(token))
            .cloned()
            .collect();
        BootstrapResponse {
            tokens,
            defaults: BootstrapDefaults {
                min_support: self.config.default_min_support,
                min_confidence: self.config.default_min_confidence,
            },
        }
    }

    /// Run one rule query: pre-filter, mine, post-filter, sort, cap.
    ///
    /// An empty result (no surviving transactions, itemsets or rules) is a
    /// valid outcome, never folded into the error path.
    ///
    /// # Errors
    /// `InvalidParameter` for an unknown pre-filter token, out-of-range
    /// thresholds, or `rhs_exact` without a target.
    pub fn run(&self, request: &RunRequest) -> Result<RunResult> {
        let started = Instant::now();
        validate_request(request)?;

        let matrix = self.pre_filter(&request.pre.target_consequents)?;
        let records = matrix.num_rows();
        if records == 0 {
            return Ok(empty_result(request, 0, started));
        }

        let itemsets = frequent_itemsets(&matrix, request.pre.min_support, None);
        if itemsets.is_empty() {
            return Ok(empty_result(request, records, started));
        }
        let mined = generate_rules(&itemsets, request.pre.min_confidence);
        debug!(
            "mined {} itemsets and {} raw rules over {} records",
            itemsets.len(),
            mined.len(),
            records
        );

        let mut rows = materialize(&matrix, mined);

        // "unknown" buckets carry no signal and must never surface as insight
        rows.retain(|row| {
            !row.antecedents
                .iter()
                .chain(&row.consequents)
                .any(|token| contains_unknown(token))
        });

        if !request.post.antecedents_contains.is_empty() {
            rows.retain(|row| contains_all(&row.antecedents, &request.post.antecedents_contains));
        }
        if !request.post.consequents_contains.is_empty() {
            rows.retain(|row| contains_all(&row.consequents, &request.post.consequents_contains));
        }

        if request.post.rhs_exact {
            // presence of rhs_target is validated up front
            if let Some(target) = request.post.rhs_target.as_deref() {
                rows.retain(|row| row.consequents.len() == 1 && row.consequents[0] == target);
                // leakage guard: the outcome axis must not "predict" itself
                rows.retain(|row| {
                    !row.antecedents
                        .iter()
                        .any(|token| self.is_leakage_token(token))
                });
            }
        }

        // The antecedent cap is enforced after mining rather than inside the
        // itemset pass, so consequents of any size stay derivable.
        rows.retain(|row| row.antecedents.len() <= request.pre.max_len_antecedent);

        sort_rows(
            &mut rows,
            SortKey::resolve(&request.sort.by),
            request.sort.order == "asc",
        );
        rows.truncate(request.pre.max_rules);

        Ok(RunResult {
            stats: RunStats {
                pre_filtered_records: records,
                min_support: request.pre.min_support,
                min_confidence: request.pre.min_confidence,
                runtime_ms: runtime_ms(started),
            },
            rules: rows,
        })
    }

    /// Narrow the matrix to rows containing every target token.
    fn pre_filter(&self, target_consequents: &[String]) -> Result<TransactionMatrix> {
        if target_consequents.is_empty() {
            return Ok(self.matrix.clone());
        }
        let mut mask = Bitset::all_ones(self.matrix.num_rows());
        for token in target_consequents {
            let Some(idx) = self.matrix.token_index(token) else {
                return Err(RulesEngineError::InvalidParameter(format!(
                    "unknown token in target_consequents: {token}"
                )));
            };
            mask.intersect_with(self.matrix.column(idx));
        }
        Ok(self.matrix.filter_rows(&mask))
    }

    fn is_leakage_token(&self, token: &str) -> bool {
        self.config
            .leakage_prefixes
            .iter()
            .any(|prefix| token.starts_with(prefix.as_str()))
    }
}

static SHARED: OnceLock<RulesEngine> = OnceLock::new();
static SHARED_INIT: Mutex<()> = Mutex::new(());

/// Process-wide engine, built lazily on first call and reused afterwards.
///
/// Concurrent first-callers serialize on the init lock, so the dataset is
/// loaded at most once and nobody observes a partially built engine.
///
/// # Errors
/// Propagates the construction error; subsequent calls retry construction
/// until one succeeds.
pub fn shared_engine(path: &Path, config: EngineConfig) -> Result<&'static RulesEngine> {
    if let Some(engine) = SHARED.get() {
        return Ok(engine);
    }
    let _guard = SHARED_INIT.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(engine) = SHARED.get() {
        return Ok(engine);
    }
    let engine = RulesEngine::from_path(path, config)?;
    info!(
        "rules engine initialized with {} tokens over {} transactions",
        engine.tokens().len(),
        engine.matrix.num_rows()
    );
    Ok(SHARED.get_or_init(|| engine))
}

fn validate_request(request: &RunRequest) -> Result<()> {
    let pre = &request.pre;
    if !(pre.min_support > 0.0 && pre.min_support <= 1.0) {
        return Err(RulesEngineError::InvalidParameter(format!(
            "min_support must be in (0, 1], got {}",
            pre.min_support
        )));
    }
    if !(pre.min_confidence > 0.0 && pre.min_confidence <= 1.0) {
        return Err(RulesEngineError::InvalidParameter(format!(
            "min_confidence must be in (0, 1], got {}",
            pre.min_confidence
        )));
    }
    if request.post.rhs_exact
        && request
            .post
            .rhs_target
            .as_deref()
            .is_none_or(|target| target.is_empty())
    {
        return Err(RulesEngineError::InvalidParameter(
            "rhs_exact is true but rhs_target is missing".to_string(),
        ));
    }
    Ok(())
}

/// Turn mined rules into response rows with alphabetically sorted token
/// lists, required for deterministic output and reliable set comparisons.
fn materialize(matrix: &TransactionMatrix, mined: Vec<AssociationRule>) -> Vec<RuleRow> {
    let tokens = matrix.tokens();
    mined
        .into_iter()
        .map(|rule| {
            let mut antecedents: Vec<String> = rule
                .antecedent
                .iter()
                .map(|&i| tokens[i as usize].clone())
                .collect();
            let mut consequents: Vec<String> = rule
                .consequent
                .iter()
                .map(|&i| tokens[i as usize].clone())
                .collect();
            antecedents.sort();
            consequents.sort();
            RuleRow {
                antecedents,
                consequents,
                support: rule.support,
                confidence: rule.confidence,
                lift: rule.lift,
            }
        })
        .collect()
}

fn empty_result(request: &RunRequest, records: usize, started: Instant) -> RunResult {
    RunResult {
        stats: RunStats {
            pre_filtered_records: records,
            min_support: request.pre.min_support,
            min_confidence: request.pre.min_confidence,
            runtime_ms: runtime_ms(started),
        },
        rules: Vec::new(),
    }
}

fn runtime_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Sort by the requested metric; ties break on the token lists so output
/// order never depends on generation order.
fn sort_rows(rows: &mut [RuleRow], key: SortKey, ascending: bool) {
    rows.sort_by(|a, b| {
        let (metric_a, metric_b) = (metric(a, key), metric(b, key));
        let primary = if ascending {
            metric_a.total_cmp(&metric_b)
        } else {
            metric_b.total_cmp(&metric_a)
        };
        primary
            .then_with(|| a.antecedents.cmp(&b.antecedents))
            .then_with(|| a.consequents.cmp(&b.consequents))
    });
}

const fn metric(row: &RuleRow, key: SortKey) -> f64 {
    match key {
        SortKey::Lift => row.lift,
        SortKey::Support => row.support,
        SortKey::Confidence => row.confidence,
    }
}

fn contains_all(haystack: &[String], required: &[String]) -> bool {
    required
        .iter()
        .all(|needle| haystack.iter().any(|token| token == needle))
}

fn contains_unknown(token: &str) -> bool {
    token.to_ascii_lowercase().contains("unknown")
}
