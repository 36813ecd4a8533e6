//! Level-wise frequent-itemset enumeration (Apriori).
//!
//! Itemsets are vectors of ascending token indices into the matrix
//! vocabulary. Each level keeps the bitset of supporting rows alongside the
//! itemset, so the next level's support counting is a single intersection.

use rayon::prelude::*;
use rustc_hash::FxHashSet;
use smallvec::{SmallVec, smallvec};

use crate::loader::matrix::{Bitset, TransactionMatrix};

/// Sorted token indices of one itemset.
pub type ItemVec = SmallVec<[u32; 8]>;

/// An itemset meeting the minimum-support threshold.
#[derive(Debug, Clone)]
pub struct FrequentItemset {
    /// Ascending token indices into the matrix vocabulary
    pub items: ItemVec,
    /// Fraction of transactions containing every item
    pub support: f64,
}

/// Enumerate all itemsets with support >= `min_support` over `matrix`.
///
/// `max_len` bounds itemset size when given. Output order is deterministic:
/// by itemset size, then lexicographically by token indices.
#[must_use]
pub fn frequent_itemsets(
    matrix: &TransactionMatrix,
    min_support: f64,
    max_len: Option<usize>,
) -> Vec<FrequentItemset> {
    let n = matrix.num_rows();
    if n == 0 {
        return Vec::new();
    }
    let n_f = n as f64;

    let mut out = Vec::new();
    let mut level: Vec<(ItemVec, Bitset)> = Vec::new();
    for item in 0..matrix.num_tokens() {
        let column = matrix.column(item);
        let support = column.count_ones() as f64 / n_f;
        if support >= min_support {
            let items: ItemVec = smallvec![item as u32];
            out.push(FrequentItemset {
                items: items.clone(),
                support,
            });
            level.push((items, column.clone()));
        }
    }

    let mut size = 1;
    loop {
        if level.len() < 2 || max_len.is_some_and(|cap| size + 1 > cap) {
            break;
        }
        let frequent: FxHashSet<ItemVec> = level.iter().map(|(items, _)| items.clone()).collect();
        let candidates = join_level(&level, &frequent);
        if candidates.is_empty() {
            break;
        }

        let surviving: Vec<(ItemVec, Bitset, f64)> = candidates
            .into_par_iter()
            .filter_map(|(items, a, b)| {
                let rows = level[a].1.intersection(&level[b].1);
                let support = rows.count_ones() as f64 / n_f;
                (support >= min_support).then_some((items, rows, support))
            })
            .collect();

        let mut next = Vec::with_capacity(surviving.len());
        for (items, rows, support) in surviving {
            out.push(FrequentItemset {
                items: items.clone(),
                support,
            });
            next.push((items, rows));
        }
        level = next;
        size += 1;
    }

    out
}

/// Prefix-join candidate generation with subset pruning.
///
/// `level` is lexicographically sorted, so entries sharing a (k-1)-prefix
/// are adjacent; each candidate records the two generating level indices
/// whose row bitsets intersect to its supporting rows.
fn join_level(
    level: &[(ItemVec, Bitset)],
    frequent: &FxHashSet<ItemVec>,
) -> Vec<(ItemVec, usize, usize)> {
    let mut candidates = Vec::new();
    for a in 0..level.len() {
        let prefix_len = level[a].0.len() - 1;
        for b in (a + 1)..level.len() {
            if level[a].0[..prefix_len] != level[b].0[..prefix_len] {
                break;
            }
            let mut items = level[a].0.clone();
            items.push(level[b].0[prefix_len]);
            if has_frequent_subsets(&items, frequent) {
                candidates.push((items, a, b));
            }
        }
    }
    candidates
}

/// Apriori pruning: every (k-1)-subset of a candidate must itself be
/// frequent. The two generating subsets are frequent by construction, so
/// only subsets dropping an earlier position need checking.
fn has_frequent_subsets(items: &ItemVec, frequent: &FxHashSet<ItemVec>) -> bool {
    (0..items.len().saturating_sub(2)).all(|skip| {
        let subset: ItemVec = items
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != skip)
            .map(|(_, &item)| item)
            .collect();
        frequent.contains(&subset)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::matrix::TransactionMatrix;

    fn toy_matrix() -> TransactionMatrix {
        // rows: {a,b}, {a}, {b,c}, {a,b,c}
        TransactionMatrix::from_columns(vec![
            ("a".to_string(), vec![true, true, false, true]),
            ("b".to_string(), vec![true, false, true, true]),
            ("c".to_string(), vec![false, false, true, true]),
        ])
        .unwrap()
    }

    fn support_of(itemsets: &[FrequentItemset], items: &[u32]) -> Option<f64> {
        itemsets
            .iter()
            .find(|fi| fi.items.as_slice() == items)
            .map(|fi| fi.support)
    }

    #[test]
    fn singletons_and_pairs_meet_threshold() {
        let itemsets = frequent_itemsets(&toy_matrix(), 0.5, None);
        assert_eq!(support_of(&itemsets, &[0]), Some(0.75));
        assert_eq!(support_of(&itemsets, &[1]), Some(0.75));
        assert_eq!(support_of(&itemsets, &[2]), Some(0.5));
        assert_eq!(support_of(&itemsets, &[0, 1]), Some(0.5));
        assert_eq!(support_of(&itemsets, &[1, 2]), Some(0.5));
        // {a,c} appears once out of four
        assert_eq!(support_of(&itemsets, &[0, 2]), None);
        // {a,b,c} is pruned because {a,c} is infrequent
        assert_eq!(support_of(&itemsets, &[0, 1, 2]), None);
    }

    #[test]
    fn threshold_is_inclusive() {
        let itemsets = frequent_itemsets(&toy_matrix(), 0.25, None);
        assert_eq!(support_of(&itemsets, &[0, 2]), Some(0.25));
        assert_eq!(support_of(&itemsets, &[0, 1, 2]), Some(0.25));
    }

    #[test]
    fn max_len_caps_itemset_size() {
        let itemsets = frequent_itemsets(&toy_matrix(), 0.25, Some(2));
        assert!(itemsets.iter().all(|fi| fi.items.len() <= 2));
        assert!(support_of(&itemsets, &[0, 1]).is_some());
    }

    #[test]
    fn output_order_is_deterministic() {
        let a = frequent_itemsets(&toy_matrix(), 0.25, None);
        let b = frequent_itemsets(&toy_matrix(), 0.25, None);
        let items_a: Vec<_> = a.iter().map(|fi| fi.items.clone()).collect();
        let items_b: Vec<_> = b.iter().map(|fi| fi.items.clone()).collect();
        assert_eq!(items_a, items_b);
    }
}
