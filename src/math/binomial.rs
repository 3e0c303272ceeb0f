//! Append-only table of binomial coefficients.
//!
//! Rows of Pascal's triangle are built on demand with the recurrence
//! `C(n, k) = C(n-1, k-1) + C(n-1, k)` and never recomputed or dropped once
//! cached. The table is seeded with rows `0..=6`, which covers the cubic and
//! sextic curves most callers use.
//!
//! Entries are stored as `f64`: exact up to row 56, correctly rounded sums
//! beyond that, with no upper limit on the row.

#[derive(Debug, Clone)]
pub struct BinomialTable {
    rows: Vec<Vec<f64>>,
}

impl Default for BinomialTable {
    fn default() -> Self {
        Self::new()
    }
}

impl BinomialTable {
    pub fn new() -> Self {
        Self {
            rows: vec![
                vec![1.0],
                vec![1.0, 1.0],
                vec![1.0, 2.0, 1.0],
                vec![1.0, 3.0, 3.0, 1.0],
                vec![1.0, 4.0, 6.0, 4.0, 1.0],
                vec![1.0, 5.0, 10.0, 10.0, 5.0, 1.0],
                vec![1.0, 6.0, 15.0, 20.0, 15.0, 6.0, 1.0],
            ],
        }
    }

    /// Number of cached rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cached row `n`, if present.
    pub fn row(&self, n: usize) -> Option<&[f64]> {
        self.rows.get(n).map(Vec::as_slice)
    }

    /// `C(n, k)` if row `n` is cached and `k <= n`.
    pub fn get(&self, n: usize, k: usize) -> Option<f64> {
        self.rows.get(n)?.get(k).copied()
    }

    /// Append rows until row `n` exists. Existing rows are left untouched.
    pub fn extend_to(&mut self, n: usize) {
        while self.rows.len() <= n {
            let prev = &self.rows[self.rows.len() - 1];
            let mut next = Vec::with_capacity(prev.len() + 1);
            next.push(1.0);
            next.extend(prev.windows(2).map(|w| w[0] + w[1]));
            next.push(1.0);
            self.rows.push(next);
        }
    }
}
