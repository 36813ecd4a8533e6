//! Frequent-itemset enumeration and association-rule derivation.

pub mod itemsets;
pub mod rules;

pub use itemsets::{FrequentItemset, ItemVec, frequent_itemsets};
pub use rules::{AssociationRule, generate_rules};
