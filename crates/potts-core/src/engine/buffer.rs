use crate::core::layout::Layout;
use crate::core::pll::fields::RowFields;
use crate::engine::error::EngineError;

/// Allocates a zeroed vector, reporting allocation failure instead of aborting.
fn try_zeroed(len: usize) -> Result<Vec<f64>, EngineError> {
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| EngineError::Allocation {
            bytes: len.saturating_mul(std::mem::size_of::<f64>()),
        })?;
    data.resize(len, 0.0);
    Ok(data)
}

/// Scratch tensor holding the unsymmetrized pairwise gradient of one evaluation.
///
/// It is sized to the pairwise block once at initialization, never reallocated,
/// and cleared at the start of every evaluation.
#[derive(Debug)]
pub struct PairwiseAccumulator {
    data: Vec<f64>,
}

impl PairwiseAccumulator {
    pub fn allocate(layout: &Layout) -> Result<Self, EngineError> {
        Ok(Self {
            data: try_zeroed(layout.pair_block_len())?,
        })
    }

    #[inline]
    pub fn reset(&mut self) {
        self.data.fill(0.0);
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Private gradient buffers of one additional worker.
#[derive(Debug)]
struct WorkerPartial {
    g_single: Vec<f64>,
    g_pair: Vec<f64>,
}

/// Where one worker writes its share of an evaluation.
///
/// The first worker writes straight into the caller's single-site gradient and
/// the instance accumulator; every other worker writes into its own partial.
#[derive(Debug)]
pub struct RowSink<'s> {
    pub loss: f64,
    pub fields: &'s mut RowFields,
    pub g_single: &'s mut [f64],
    pub g_pair: &'s mut [f64],
}

/// All scratch storage of an evaluator, allocated once for a fixed number of workers.
#[derive(Debug)]
pub struct Workspace {
    accumulator: PairwiseAccumulator,
    fields: Vec<RowFields>,
    partials: Vec<WorkerPartial>,
}

impl Workspace {
    /// Allocates the accumulator plus one partial per worker beyond the first.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Allocation`] if any of the buffers cannot be reserved.
    pub fn allocate(layout: &Layout, workers: usize) -> Result<Self, EngineError> {
        let workers = workers.max(1);
        let accumulator = PairwiseAccumulator::allocate(layout)?;
        let partials = (1..workers)
            .map(|_| {
                Ok(WorkerPartial {
                    g_single: try_zeroed(layout.nsingle())?,
                    g_pair: try_zeroed(layout.pair_block_len())?,
                })
            })
            .collect::<Result<Vec<_>, EngineError>>()?;
        let fields = (0..workers).map(|_| RowFields::new(layout)).collect();
        Ok(Self {
            accumulator,
            fields,
            partials,
        })
    }

    #[inline]
    pub fn workers(&self) -> usize {
        self.fields.len()
    }

    pub fn reset(&mut self) {
        self.accumulator.reset();
        for partial in &mut self.partials {
            partial.g_single.fill(0.0);
            partial.g_pair.fill(0.0);
        }
    }

    /// The raw pairwise gradient once all worker shares have been merged.
    #[inline]
    pub fn accumulator(&self) -> &[f64] {
        self.accumulator.as_slice()
    }

    /// One sink per worker; the first one targets `g_single` and the accumulator.
    pub fn sinks<'s>(&'s mut self, g_single: &'s mut [f64]) -> Vec<RowSink<'s>> {
        let mut sinks = Vec::with_capacity(self.fields.len());
        let mut fields = self.fields.iter_mut();
        if let Some(first) = fields.next() {
            sinks.push(RowSink {
                loss: 0.0,
                fields: first,
                g_single,
                g_pair: self.accumulator.as_mut_slice(),
            });
        }
        for (fields, partial) in fields.zip(self.partials.iter_mut()) {
            sinks.push(RowSink {
                loss: 0.0,
                fields,
                g_single: &mut partial.g_single,
                g_pair: &mut partial.g_pair,
            });
        }
        sinks
    }

    /// Every gradient buffer owned by the workspace, accumulator first.
    pub fn buffers(&self) -> impl Iterator<Item = &[f64]> + '_ {
        std::iter::once(self.accumulator.as_slice()).chain(
            self.partials
                .iter()
                .flat_map(|p| [p.g_single.as_slice(), p.g_pair.as_slice()]),
        )
    }
}
