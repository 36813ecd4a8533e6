//! Association-rule derivation from frequent itemsets.

use itertools::Itertools;
use rustc_hash::FxHashMap;

use super::itemsets::{FrequentItemset, ItemVec};

/// A directional rule `antecedent => consequent` with its metrics.
#[derive(Debug, Clone)]
pub struct AssociationRule {
    /// Ascending token indices on the left-hand side
    pub antecedent: ItemVec,
    /// Ascending token indices on the right-hand side, disjoint from the
    /// antecedent
    pub consequent: ItemVec,
    /// Fraction of transactions containing the union of both sides
    pub support: f64,
    /// P(consequent | antecedent)
    pub confidence: f64,
    /// Confidence normalized by the consequent's marginal support
    pub lift: f64,
}

/// Derive every rule with confidence >= `min_confidence`.
///
/// For each frequent itemset of size >= 2, every non-empty proper subset is
/// a candidate antecedent and its complement the consequent. Subset supports
/// come from the itemset table itself: by the Apriori property every subset
/// of a frequent itemset is frequent.
#[must_use]
pub fn generate_rules(itemsets: &[FrequentItemset], min_confidence: f64) -> Vec<AssociationRule> {
    let support: FxHashMap<&[u32], f64> = itemsets
        .iter()
        .map(|fi| (fi.items.as_slice(), fi.support))
        .collect();

    let mut rules = Vec::new();
    for itemset in itemsets.iter().filter(|fi| fi.items.len() >= 2) {
        for antecedent_len in 1..itemset.items.len() {
            for antecedent in itemset.items.iter().copied().combinations(antecedent_len) {
                let antecedent: ItemVec = ItemVec::from_vec(antecedent);
                let consequent: ItemVec = itemset
                    .items
                    .iter()
                    .copied()
                    .filter(|item| !antecedent.contains(item))
                    .collect();

                let Some(&antecedent_support) = support.get(antecedent.as_slice()) else {
                    continue;
                };
                let Some(&consequent_support) = support.get(consequent.as_slice()) else {
                    continue;
                };

                let confidence = itemset.support / antecedent_support;
                if confidence >= min_confidence {
                    rules.push(AssociationRule {
                        antecedent,
                        consequent,
                        support: itemset.support,
                        confidence,
                        lift: confidence / consequent_support,
                    });
                }
            }
        }
    }
    rules
}
