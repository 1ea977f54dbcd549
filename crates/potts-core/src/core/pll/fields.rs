use crate::core::layout::Layout;

/// Per-row conditional fields of a Potts model.
///
/// All tables are symbol-major: the entry for symbol `a` at column `s` lives at
/// `a * ncol + s`, matching the layout of one pairwise slab so that a slab can
/// be added to the scores in a single pass.
///
/// The tables are scratch space. A worker allocates one `RowFields` and
/// recomputes it for every row it processes.
#[derive(Debug, Clone)]
pub struct RowFields {
    ncol: usize,
    alphabet_size: usize,
    scores: Vec<f64>,
    log_partition: Vec<f64>,
    probabilities: Vec<f64>,
}

impl RowFields {
    pub fn new(layout: &Layout) -> Self {
        let len = layout.slab_len();
        Self {
            ncol: layout.ncol(),
            alphabet_size: layout.alphabet_size(),
            scores: vec![0.0; len],
            log_partition: vec![0.0; layout.ncol()],
            probabilities: vec![0.0; len],
        }
    }

    /// Computes the field scores, log-partition values and conditional
    /// probabilities of `row` under the parameters `x_single` / `x_pair`
    /// (the two blocks of a padded parameter vector).
    ///
    /// The score of symbol `a` at column `s` is its bias plus the couplings
    /// `W(x_k, k, a, s)` summed over every column `k` of the row. The reference
    /// symbol has no bias but still collects its couplings.
    pub fn compute(&mut self, layout: &Layout, x_single: &[f64], x_pair: &[f64], row: &[u8]) {
        let ncol = self.ncol;
        let nsingle = layout.nsingle();
        let slab_len = layout.slab_len();

        self.scores[..nsingle].copy_from_slice(&x_single[..nsingle]);
        self.scores[nsingle..].fill(0.0);

        for (k, &xik) in row.iter().enumerate() {
            let offset = layout.slab_offset(xik as usize, k);
            let slab = &x_pair[offset..offset + slab_len];
            for (score, &w) in self.scores.iter_mut().zip(slab) {
                *score += w;
            }
        }

        // log-sum-exp per column, shifted by the column maximum.
        for s in 0..ncol {
            let max = (0..self.alphabet_size)
                .map(|a| self.scores[a * ncol + s])
                .fold(f64::NEG_INFINITY, f64::max);
            let sum: f64 = (0..self.alphabet_size)
                .map(|a| (self.scores[a * ncol + s] - max).exp())
                .sum();
            self.log_partition[s] = max + sum.ln();
        }

        for (i, (p, &score)) in self.probabilities.iter_mut().zip(&self.scores).enumerate() {
            *p = (score - self.log_partition[i % ncol]).exp();
        }
    }

    #[inline]
    pub fn score(&self, a: usize, s: usize) -> f64 {
        self.scores[a * self.ncol + s]
    }

    #[inline]
    pub fn log_partition(&self, s: usize) -> f64 {
        self.log_partition[s]
    }

    #[inline]
    pub fn probability(&self, a: usize, s: usize) -> f64 {
        self.probabilities[a * self.ncol + s]
    }

    /// Conditional probabilities of every `(a, j)`, in slab order.
    #[inline]
    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    /// Negative log conditional probability of the observed symbols, summed over columns.
    pub fn negative_log_likelihood(&self, row: &[u8]) -> f64 {
        row.iter()
            .enumerate()
            .map(|(k, &xik)| self.log_partition[k] - self.score(xik as usize, k))
            .sum()
    }
}
