use crate::core::layout::Layout;
use crate::core::models::alignment::Alignment;
use crate::core::pll::fields::RowFields;
use crate::engine::buffer::{RowSink, Workspace};
use tracing::{instrument, trace};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Adds the weighted contribution of one row to the loss and the raw gradients.
///
/// `g_single` is the single-site gradient block and `g_pair` the unsymmetrized
/// pairwise accumulator. Returns the weighted negative log pseudo-likelihood of the row.
fn accumulate_row(
    layout: &Layout,
    fields: &mut RowFields,
    x: &[f64],
    row: &[u8],
    weight: f64,
    g_single: &mut [f64],
    g_pair: &mut [f64],
) -> f64 {
    let (x_single, x_pair) = layout.split(x);
    fields.compute(layout, x_single, x_pair, row);

    let reference = layout.alphabet_size() - 1;
    let slab_len = layout.slab_len();

    for (k, &xik) in row.iter().enumerate() {
        let xik = xik as usize;
        if xik < reference {
            g_single[layout.single_index(k, xik)] -= weight;
        }
        for a in 0..reference {
            g_single[layout.single_index(k, a)] += weight * fields.probability(a, k);
        }
    }

    for (k, &xik) in row.iter().enumerate() {
        let xik = xik as usize;
        for (j, &xij) in row.iter().enumerate() {
            g_pair[layout.pair_index(xik, k, xij as usize, j)] -= weight;
        }

        let offset = layout.slab_offset(xik, k);
        for (g, &p) in g_pair[offset..offset + slab_len]
            .iter_mut()
            .zip(fields.probabilities())
        {
            *g += weight * p;
        }
    }

    weight * fields.negative_log_likelihood(row)
}

/// Walks every row of the alignment in order, writing straight into the
/// caller's buffers. Returns the weighted loss without regularization.
pub fn run_sequential(
    layout: &Layout,
    alignment: &Alignment,
    weights: &[f64],
    x: &[f64],
    g_single: &mut [f64],
    g_pair: &mut [f64],
) -> f64 {
    let mut fields = RowFields::new(layout);
    let mut loss = 0.0;
    for (row, &weight) in alignment.rows().zip(weights) {
        loss += accumulate_row(layout, &mut fields, x, row, weight, g_single, g_pair);
    }
    loss
}

/// Number of workers an evaluator should allocate scratch buffers for.
pub fn worker_count(nrow: usize) -> usize {
    #[cfg(feature = "parallel")]
    let threads = rayon::current_num_threads();
    #[cfg(not(feature = "parallel"))]
    let threads: usize = 1;

    threads.min(nrow).max(1)
}

fn add_into(target: &mut [f64], source: &[f64]) {
    for (t, &s) in target.iter_mut().zip(source) {
        *t += s;
    }
}

/// Block size used when merging worker partials into the accumulator.
#[cfg(feature = "parallel")]
const MERGE_CHUNK: usize = 4096;

/// Accumulates the loss and raw gradients over all rows.
///
/// Rows are split into one contiguous range per workspace worker. The first
/// worker writes into `g_single` and the workspace accumulator directly; the
/// others fill their own preallocated partials, which are summed into the first
/// once the row loop is over. Nothing is allocated here.
#[instrument(level = "trace", skip_all, name = "accumulate_task")]
pub fn run(
    layout: &Layout,
    alignment: &Alignment,
    weights: &[f64],
    x: &[f64],
    g_single: &mut [f64],
    workspace: &mut Workspace,
) -> f64 {
    workspace.reset();

    let nrow = alignment.nrow();
    let nsingle = layout.nsingle();
    let mut sinks = workspace.sinks(g_single);
    let chunk = nrow.div_ceil(sinks.len()).max(1);

    let fill = |(w, sink): (usize, &mut RowSink<'_>)| {
        let start = (w * chunk).min(nrow);
        let end = (start + chunk).min(nrow);
        for i in start..end {
            sink.loss += accumulate_row(
                layout,
                &mut *sink.fields,
                x,
                alignment.row(i),
                weights[i],
                &mut *sink.g_single,
                &mut *sink.g_pair,
            );
        }
    };

    #[cfg(not(feature = "parallel"))]
    sinks.iter_mut().enumerate().for_each(fill);
    #[cfg(feature = "parallel")]
    sinks.par_iter_mut().enumerate().for_each(fill);

    let Some((head, tail)) = sinks.split_first_mut() else {
        return 0.0;
    };
    let tail = &*tail;

    let mut loss = head.loss;
    for sink in tail {
        loss += sink.loss;
        add_into(&mut head.g_single[..nsingle], &sink.g_single[..]);
    }

    #[cfg(not(feature = "parallel"))]
    for sink in tail {
        add_into(&mut *head.g_pair, &sink.g_pair[..]);
    }
    #[cfg(feature = "parallel")]
    if !tail.is_empty() {
        head.g_pair
            .par_chunks_mut(MERGE_CHUNK)
            .enumerate()
            .for_each(|(c, block)| {
                let start = c * MERGE_CHUNK;
                for sink in tail {
                    add_into(block, &sink.g_pair[start..start + block.len()]);
                }
            });
    }

    trace!(loss, rows = nrow, workers = tail.len() + 1, "Row accumulation finished.");
    loss
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const TOLERANCE: f64 = 1e-9;

    fn random_problem(seed: u64) -> (Layout, Alignment, Vec<f64>, Vec<f64>) {
        let mut rng = StdRng::seed_from_u64(seed);
        let (nrow, ncol, alphabet) = (23, 4, 5);
        let symbols = (0..nrow * ncol)
            .map(|_| rng.gen_range(0..alphabet) as u8)
            .collect();
        let alignment = Alignment::new(alphabet, ncol, symbols).unwrap();
        let layout = Layout::new(ncol, alphabet);
        let weights = (0..nrow).map(|_| rng.gen_range(0.1..1.0)).collect();
        let mut x = layout.zeros();
        for (i, v) in x.iter_mut().enumerate() {
            if !layout.is_padding(i) {
                *v = rng.gen_range(-0.5..0.5);
            }
        }
        (layout, alignment, weights, x)
    }

    #[test]
    fn single_site_gradient_is_expectation_minus_indicator() {
        let layout = Layout::new(2, 3);
        let alignment = Alignment::from_rows(3, &[[0u8, 2], [1, 1]]).unwrap();
        let x = layout.zeros();
        let mut g_single = vec![0.0; layout.nsingle_padded()];
        let mut g_pair = vec![0.0; layout.pair_block_len()];
        run_sequential(&layout, &alignment, &[1.0, 1.0], &x, &mut g_single, &mut g_pair);

        // Uniform conditionals: P = 1/3 everywhere.
        let col0 = g_single[layout.single_index(0, 0)] + g_single[layout.single_index(0, 1)];
        // Column 0 observed symbols 0 and 1: -2 + 4 * (1/3).
        assert!((col0 - (-2.0 + 4.0 / 3.0)).abs() < TOLERANCE);
    }

    #[test]
    fn zero_parameters_give_uniform_loss() {
        let layout = Layout::new(3, 4);
        let alignment = Alignment::from_rows(4, &[[0u8, 1, 3], [2, 2, 2]]).unwrap();
        let x = layout.zeros();
        let mut g_single = vec![0.0; layout.nsingle_padded()];
        let mut workspace = Workspace::allocate(&layout, 1).unwrap();
        let loss = run(&layout, &alignment, &[1.0, 0.5], &x, &mut g_single, &mut workspace);
        assert!((loss - 1.5 * 3.0 * 4.0f64.ln()).abs() < TOLERANCE);
    }

    #[test]
    fn pairwise_accumulator_holds_indicator_and_partner_expectation() {
        let layout = Layout::new(2, 3);
        let alignment = Alignment::from_rows(3, &[[0u8, 1]]).unwrap();
        let x = layout.zeros();
        let mut g_single = vec![0.0; layout.nsingle_padded()];
        let mut g_pair = vec![0.0; layout.pair_block_len()];
        run_sequential(&layout, &alignment, &[1.0], &x, &mut g_single, &mut g_pair);

        let third = 1.0 / 3.0;
        // Observed pair (0 at column 0, 1 at column 1).
        assert!((g_pair[layout.pair_index(0, 0, 1, 1)] - (third - 1.0)).abs() < TOLERANCE);
        // Unobserved partner symbol only gets the expectation.
        assert!((g_pair[layout.pair_index(0, 0, 2, 1)] - third).abs() < TOLERANCE);
        // Row symbol never observed at column 0 stays untouched.
        assert_eq!(g_pair[layout.pair_index(1, 0, 1, 1)], 0.0);
    }

    fn assert_matches_sequential(workers: usize, seed: u64) {
        let (layout, alignment, weights, x) = random_problem(seed);

        let mut g_single_ref = vec![0.0; layout.nsingle_padded()];
        let mut g_pair_ref = vec![0.0; layout.pair_block_len()];
        let loss_ref = run_sequential(
            &layout,
            &alignment,
            &weights,
            &x,
            &mut g_single_ref,
            &mut g_pair_ref,
        );

        let mut workspace = Workspace::allocate(&layout, workers).unwrap();
        // Two passes: the second must not see leftovers of the first.
        for _ in 0..2 {
            let mut g_single = vec![0.0; layout.nsingle_padded()];
            let loss = run(&layout, &alignment, &weights, &x, &mut g_single, &mut workspace);

            assert!((loss - loss_ref).abs() < TOLERANCE);
            for (a, b) in g_single.iter().zip(&g_single_ref) {
                assert!((a - b).abs() < TOLERANCE);
            }
            for (a, b) in workspace.accumulator().iter().zip(&g_pair_ref) {
                assert!((a - b).abs() < TOLERANCE);
            }
        }
    }

    #[test]
    fn run_matches_sequential_reference() {
        assert_matches_sequential(1, 7);
    }

    #[test]
    fn run_with_several_workers_matches_sequential_reference() {
        assert_matches_sequential(4, 11);
        // More workers than rows leaves the trailing ranges empty.
        assert_matches_sequential(30, 13);
    }

    #[test]
    fn worker_count_never_exceeds_rows() {
        assert_eq!(worker_count(0), 1);
        assert_eq!(worker_count(1), 1);
        assert!(worker_count(1000) >= 1);
    }

    #[test]
    fn run_on_empty_alignment_leaves_buffers_untouched() {
        let layout = Layout::new(2, 3);
        let alignment = Alignment::new(3, 2, Vec::new()).unwrap();
        let x = layout.zeros();
        let mut g_single = vec![0.0; layout.nsingle_padded()];
        let mut workspace = Workspace::allocate(&layout, 3).unwrap();
        let loss = run(&layout, &alignment, &[], &x, &mut g_single, &mut workspace);
        assert_eq!(loss, 0.0);
        assert!(g_single.iter().all(|&v| v == 0.0));
        assert!(workspace.buffers().all(|b| b.iter().all(|&v| v == 0.0)));
    }
}
