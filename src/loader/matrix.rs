//! Column-major boolean transaction matrix.
//!
//! One row per transaction, one bitset column per item token. Built once at
//! engine construction and treated as an immutable snapshot afterwards.

use crate::error::{Result, RulesEngineError};

/// Fixed-length bitset over transaction rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitset {
    words: Vec<u64>,
    len: usize,
}

impl Bitset {
    /// All-zero bitset of the given length.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(64)],
            len,
        }
    }

    /// All-one bitset of the given length.
    #[must_use]
    pub fn all_ones(len: usize) -> Self {
        let mut bits = Self::new(len);
        for i in 0..len {
            bits.set(i);
        }
        bits
    }

    /// Set the bit at `idx`.
    pub fn set(&mut self, idx: usize) {
        self.words[idx / 64] |= 1u64 << (idx % 64);
    }

    /// Read the bit at `idx`.
    #[must_use]
    pub fn get(&self, idx: usize) -> bool {
        self.words[idx / 64] >> (idx % 64) & 1 == 1
    }

    /// Number of rows covered by this bitset.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of set bits.
    #[must_use]
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// In-place intersection with a bitset of the same length.
    pub fn intersect_with(&mut self, other: &Self) {
        for (word, other_word) in self.words.iter_mut().zip(&other.words) {
            *word &= other_word;
        }
    }

    /// New bitset holding the intersection of `self` and `other`.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        let mut out = self.clone();
        out.intersect_with(other);
        out
    }

    /// Positions of set bits in ascending order.
    pub fn ones(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len).filter(move |&i| self.get(i))
    }
}

/// The boolean occurrence matrix the whole engine operates on.
///
/// Invariants: tokens are unique, sorted alphabetically, and every column
/// carries at least one occurrence at construction time.
#[derive(Debug, Clone)]
pub struct TransactionMatrix {
    tokens: Vec<String>,
    columns: Vec<Bitset>,
    num_rows: usize,
}

impl TransactionMatrix {
    /// Build the matrix from `(token, occurrence column)` pairs.
    ///
    /// Tokens are sorted alphabetically and columns with zero occurrences
    /// are dropped, since they can never satisfy any positive-support rule.
    ///
    /// # Errors
    /// Fails when column lengths disagree, a token occurs twice, or no
    /// column with any occurrence remains.
    pub fn from_columns(columns: Vec<(String, Vec<bool>)>) -> Result<Self> {
        let num_rows = columns.first().map_or(0, |(_, values)| values.len());
        if let Some((token, _)) = columns.iter().find(|(_, v)| v.len() != num_rows) {
            return Err(RulesEngineError::Dataset(format!(
                "item column '{token}' length does not match the transaction count"
            )));
        }

        let mut kept: Vec<(String, Vec<bool>)> = columns
            .into_iter()
            .filter(|(_, values)| values.iter().any(|&v| v))
            .collect();
        kept.sort_by(|a, b| a.0.cmp(&b.0));
        if let Some(pair) = kept.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(RulesEngineError::Dataset(format!(
                "duplicate item token '{}'",
                pair[0].0
            )));
        }
        if kept.is_empty() {
            return Err(RulesEngineError::Dataset(
                "empty vocabulary: no item column has any occurrence".to_string(),
            ));
        }

        let mut tokens = Vec::with_capacity(kept.len());
        let mut bit_columns = Vec::with_capacity(kept.len());
        for (token, values) in kept {
            let mut bits = Bitset::new(num_rows);
            for (row, &present) in values.iter().enumerate() {
                if present {
                    bits.set(row);
                }
            }
            tokens.push(token);
            bit_columns.push(bits);
        }

        Ok(Self {
            tokens,
            columns: bit_columns,
            num_rows,
        })
    }

    /// Sorted vocabulary of item tokens.
    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Number of transactions.
    #[must_use]
    pub const fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Number of item tokens.
    #[must_use]
    pub fn num_tokens(&self) -> usize {
        self.tokens.len()
    }

    /// Index of `token` in the sorted vocabulary, if known.
    #[must_use]
    pub fn token_index(&self, token: &str) -> Option<usize> {
        self.tokens.binary_search_by(|t| t.as_str().cmp(token)).ok()
    }

    /// Occurrence column for the token at `idx`.
    #[must_use]
    pub fn column(&self, idx: usize) -> &Bitset {
        &self.columns[idx]
    }

    /// New matrix keeping only the rows where `mask` is set.
    ///
    /// Every column is kept, including ones that become all-zero in the
    /// narrowed matrix; they simply never reach the support threshold.
    #[must_use]
    pub fn filter_rows(&self, mask: &Bitset) -> Self {
        let keep: Vec<usize> = mask.ones().collect();
        let columns = self
            .columns
            .iter()
            .map(|column| {
                let mut bits = Bitset::new(keep.len());
                for (new_row, &old_row) in keep.iter().enumerate() {
                    if column.get(old_row) {
                        bits.set(new_row);
                    }
                }
                bits
            })
            .collect();

        Self {
            tokens: self.tokens.clone(),
            columns,
            num_rows: keep.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(token: &str, values: &[bool]) -> (String, Vec<bool>) {
        (token.to_string(), values.to_vec())
    }

    #[test]
    fn bitset_intersection_and_count() {
        let mut a = Bitset::new(70);
        let mut b = Bitset::new(70);
        for i in [0, 3, 64, 69] {
            a.set(i);
        }
        for i in [3, 64, 68] {
            b.set(i);
        }
        let both = a.intersection(&b);
        assert_eq!(both.count_ones(), 2);
        assert_eq!(both.ones().collect::<Vec<_>>(), vec![3, 64]);
    }

    #[test]
    fn tokens_are_sorted_and_all_zero_columns_dropped() {
        let matrix = TransactionMatrix::from_columns(vec![
            column("b", &[true, false]),
            column("never", &[false, false]),
            column("a", &[false, true]),
        ])
        .unwrap();
        assert_eq!(matrix.tokens(), ["a", "b"]);
        assert_eq!(matrix.num_rows(), 2);
        assert_eq!(matrix.token_index("never"), None);
    }

    #[test]
    fn empty_vocabulary_is_fatal() {
        let err = TransactionMatrix::from_columns(vec![column("x", &[false, false])]).unwrap_err();
        assert!(err.to_string().contains("empty vocabulary"));
    }

    #[test]
    fn duplicate_tokens_are_rejected() {
        let err = TransactionMatrix::from_columns(vec![
            column("x", &[true]),
            column("x", &[true]),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("duplicate item token"));
    }

    #[test]
    fn filter_rows_compacts_all_columns() {
        let matrix = TransactionMatrix::from_columns(vec![
            column("a", &[true, true, false, true]),
            column("b", &[true, false, true, true]),
        ])
        .unwrap();
        let mask = matrix.column(matrix.token_index("a").unwrap()).clone();
        let narrowed = matrix.filter_rows(&mask);
        assert_eq!(narrowed.num_rows(), 3);
        // "b" is present in rows 0 and 3 of the original "a" rows
        assert_eq!(
            narrowed.column(narrowed.token_index("b").unwrap()).count_ones(),
            2
        );
        // vocabulary is unchanged by row narrowing
        assert_eq!(narrowed.tokens(), matrix.tokens());
    }
}
