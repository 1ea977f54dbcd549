use crate::core::layout::Layout;

/// L2 penalty coefficients.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct L2Penalty {
    pub lambda_single: f64,
    pub lambda_pair: f64,
}

impl L2Penalty {
    pub fn new(lambda_single: f64, lambda_pair: f64) -> Self {
        Self {
            lambda_single,
            lambda_pair,
        }
    }

    /// Adds the penalty gradient to `g` and returns the penalty value.
    ///
    /// Single-site cells contribute `lambda_single * x^2`, pairwise cells
    /// `0.5 * lambda_pair * x^2`. Each coupling is stored in both directions and
    /// its gradient is symmetrized, so both gradients use the factor `2 * lambda`.
    /// Single-site padding is skipped.
    pub fn apply(&self, layout: &Layout, x: &[f64], g: &mut [f64]) -> f64 {
        let (x_single, x_pair) = layout.split(x);
        let (g_single, g_pair) = layout.split_mut(g);

        let mut reg = 0.0;
        for (gv, &xv) in g_single[..layout.nsingle()]
            .iter_mut()
            .zip(&x_single[..layout.nsingle()])
        {
            reg += self.lambda_single * xv * xv;
            *gv += 2.0 * self.lambda_single * xv;
        }

        for (gv, &xv) in g_pair.iter_mut().zip(x_pair) {
            reg += 0.5 * self.lambda_pair * xv * xv;
            *gv += 2.0 * self.lambda_pair * xv;
        }

        reg
    }
}
