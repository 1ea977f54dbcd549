use crate::core::layout::Layout;
use itertools::iproduct;

/// Folds the raw pairwise gradient into the output pairwise block.
///
/// Every logical cell `(b, k, a, j)` of `output` receives `raw(b, k, a, j) + raw(a, j, b, k)`,
/// then every self-edge `(b, k, a, k)` is cleared. Padding cells of `output` are
/// left untouched.
pub fn symmetrize_into(layout: &Layout, raw: &[f64], output: &mut [f64]) {
    let alphabet = layout.alphabet_size();
    let ncol = layout.ncol();

    for (b, k, a, j) in iproduct!(0..alphabet, 0..ncol, 0..alphabet, 0..ncol) {
        output[layout.pair_index(b, k, a, j)] =
            raw[layout.pair_index(b, k, a, j)] + raw[layout.pair_index(a, j, b, k)];
    }

    for (b, k, a) in iproduct!(0..alphabet, 0..ncol, 0..alphabet) {
        output[layout.pair_index(b, k, a, k)] = 0.0;
    }
}
