use super::buffer::Workspace;
use super::config::EvaluatorConfig;
use super::error::EngineError;
use super::tasks::accumulate;
use crate::core::layout::Layout;
use crate::core::models::alignment::Alignment;
use crate::core::pll::regularization::L2Penalty;
use crate::core::pll::symmetrize::symmetrize_into;
use crate::core::weights::{IdentityReweighting, WeightProvider, effective_count};
use tracing::{debug, error, info, instrument, warn};

/// A differentiable scalar objective over a flat parameter vector, as consumed
/// by gradient-based minimizers.
pub trait Objective {
    /// Length of the parameter and gradient vectors.
    fn dimension(&self) -> usize;

    /// Returns the objective at `x` and overwrites `g` with its gradient.
    fn evaluate(&mut self, x: &[f64], g: &mut [f64]) -> Result<f64, EngineError>;
}

/// Regularized negative log pseudo-likelihood of a Potts model on an alignment.
///
/// The evaluator owns the sequence weights and every scratch buffer of the
/// gradient computation for the duration of one optimization run. Evaluation
/// reuses those buffers and allocates nothing. It is created by [`init`](Self::init),
/// evaluated any number of times, and released by [`destroy`](Self::destroy).
#[derive(Debug)]
pub struct PseudoLikelihood<'a> {
    alignment: &'a Alignment,
    layout: Layout,
    penalty: L2Penalty,
    weights: Vec<f64>,
    workspace: Workspace,
    evaluations: usize,
}

impl<'a> PseudoLikelihood<'a> {
    /// Sets up an evaluator using the built-in identity reweighting.
    pub fn init(alignment: &'a Alignment, config: &EvaluatorConfig) -> Result<Self, EngineError> {
        Self::init_with(alignment, config, &IdentityReweighting)
    }

    /// Sets up an evaluator, drawing sequence weights from `provider`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Allocation`] when the pairwise accumulator or a
    /// worker partial cannot be allocated; there is no reduced-memory fallback. Configuration and weight
    /// validation failures are reported through their own variants.
    #[instrument(skip_all, name = "pseudo_likelihood_init")]
    pub fn init_with<P: WeightProvider + ?Sized>(
        alignment: &'a Alignment,
        config: &EvaluatorConfig,
        provider: &P,
    ) -> Result<Self, EngineError> {
        config.validate()?;

        let layout = Layout::new(alignment.ncol(), alignment.alphabet_size());
        let workers = accumulate::worker_count(alignment.nrow());
        let workspace = Workspace::allocate(&layout, workers).inspect_err(|e| {
            error!("Not enough memory for the pairwise gradient buffers: {}", e);
        })?;

        let weights = provider.weights_for(alignment, config.reweighting)?;

        if alignment.nrow() == 0 {
            warn!("Alignment has no rows; the objective reduces to the regularization term.");
        }

        info!(
            nrow = alignment.nrow(),
            ncol = alignment.ncol(),
            alphabet = alignment.alphabet_size(),
            nvar_padded = layout.nvar_padded(),
            neff = effective_count(&weights),
            workers,
            reweighting = ?config.reweighting,
            "Pseudo-likelihood evaluator initialized."
        );

        Ok(Self {
            alignment,
            layout,
            penalty: config.penalty(),
            weights,
            workspace,
            evaluations: 0,
        })
    }

    /// Computes the objective at `x` and writes its full gradient into `g`.
    ///
    /// Both slices must have the padded length of [`Layout::nvar_padded`]. The
    /// gradient is overwritten, never accumulated across calls.
    #[instrument(level = "debug", skip_all, name = "pseudo_likelihood_evaluate")]
    pub fn evaluate(&mut self, x: &[f64], g: &mut [f64]) -> Result<f64, EngineError> {
        let expected = self.layout.nvar_padded();
        for found in [x.len(), g.len()] {
            if found != expected {
                return Err(EngineError::DimensionMismatch { expected, found });
            }
        }

        g.fill(0.0);

        let (g_single, g_pair) = self.layout.split_mut(g);
        let loss = accumulate::run(
            &self.layout,
            self.alignment,
            &self.weights,
            x,
            g_single,
            &mut self.workspace,
        );

        symmetrize_into(&self.layout, self.workspace.accumulator(), g_pair);

        let reg = self.penalty.apply(&self.layout, x, g);
        self.evaluations += 1;

        debug!(
            evaluation = self.evaluations,
            loss,
            reg,
            "Pseudo-likelihood evaluated."
        );
        Ok(loss + reg)
    }

    /// Releases the scratch buffers and ends the optimization run.
    #[instrument(skip_all, name = "pseudo_likelihood_destroy")]
    pub fn destroy(self) {
        info!(
            evaluations = self.evaluations,
            "Releasing pseudo-likelihood evaluator."
        );
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Effective number of sequences after reweighting.
    pub fn effective_count(&self) -> f64 {
        effective_count(&self.weights)
    }

    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    /// Number of row workers the scratch buffers were allocated for.
    pub fn workers(&self) -> usize {
        self.workspace.workers()
    }
}

impl Objective for PseudoLikelihood<'_> {
    fn dimension(&self) -> usize {
        self.layout.nvar_padded()
    }

    fn evaluate(&mut self, x: &[f64], g: &mut [f64]) -> Result<f64, EngineError> {
        PseudoLikelihood::evaluate(self, x, g)
    }
}
