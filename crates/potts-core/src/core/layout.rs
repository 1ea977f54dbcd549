//! Addressing of the flat parameter and gradient vectors.
//!
//! A parameter vector is split into two blocks:
//!
//! - the **single-site block**, one bias per column and non-reference symbol,
//!   stored symbol-major (`a * ncol + s`) and padded to the vector width;
//! - the **pairwise block**, one coupling per ordered `(b, k, a, j)`, stored as
//!   `((b * ncol + k) * alphabet_pad + a) * ncol + j`. The `a` dimension is
//!   padded to `alphabet_pad`, so every `(b, k)` slab of `alphabet_size * ncol`
//!   couplings is contiguous and starts on a vector-aligned offset.
//!
//! Padding cells never carry a logical value and are expected to stay zero.

/// Number of `f64` lanes the padded dimensions are rounded to.
pub const PADDING_WIDTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    ncol: usize,
    alphabet_size: usize,
    alphabet_pad: usize,
    nsingle: usize,
    nsingle_padded: usize,
}

impl Layout {
    pub fn new(ncol: usize, alphabet_size: usize) -> Self {
        let nsingle = ncol * (alphabet_size - 1);
        let nsingle_padded = nsingle + PADDING_WIDTH - (nsingle % PADDING_WIDTH);
        let alphabet_pad = alphabet_size.div_ceil(PADDING_WIDTH) * PADDING_WIDTH;
        Self {
            ncol,
            alphabet_size,
            alphabet_pad,
            nsingle,
            nsingle_padded,
        }
    }

    #[inline]
    pub fn ncol(&self) -> usize {
        self.ncol
    }

    #[inline]
    pub fn alphabet_size(&self) -> usize {
        self.alphabet_size
    }

    #[inline]
    pub fn alphabet_pad(&self) -> usize {
        self.alphabet_pad
    }

    /// Logical number of single-site parameters, `ncol * (alphabet_size - 1)`.
    #[inline]
    pub fn nsingle(&self) -> usize {
        self.nsingle
    }

    /// Offset of the pairwise block inside the full vector.
    #[inline]
    pub fn nsingle_padded(&self) -> usize {
        self.nsingle_padded
    }

    #[inline]
    pub fn pair_block_len(&self) -> usize {
        self.alphabet_size * self.ncol * self.alphabet_pad * self.ncol
    }

    #[inline]
    pub fn nvar_padded(&self) -> usize {
        self.nsingle_padded + self.pair_block_len()
    }

    /// Length of one `(b, k)` slab: every `(a, j)` for a fixed row symbol and column.
    #[inline]
    pub fn slab_len(&self) -> usize {
        self.alphabet_size * self.ncol
    }

    /// Index of the bias of non-reference symbol `a` at column `s`.
    #[inline]
    pub fn single_index(&self, s: usize, a: usize) -> usize {
        debug_assert!(s < self.ncol && a + 1 < self.alphabet_size);
        a * self.ncol + s
    }

    /// Index of coupling `(b, k, a, j)` relative to the start of the pairwise block.
    #[inline]
    pub fn pair_index(&self, b: usize, k: usize, a: usize, j: usize) -> usize {
        debug_assert!(b < self.alphabet_size && a < self.alphabet_pad);
        debug_assert!(k < self.ncol && j < self.ncol);
        ((b * self.ncol + k) * self.alphabet_pad + a) * self.ncol + j
    }

    /// Offset of the `(b, k)` slab relative to the start of the pairwise block.
    #[inline]
    pub fn slab_offset(&self, b: usize, k: usize) -> usize {
        self.pair_index(b, k, 0, 0)
    }

    /// Decomposes a pairwise-block index into `(b, k, a, j)`.
    pub fn pair_coords(&self, index: usize) -> (usize, usize, usize, usize) {
        let j = index % self.ncol;
        let rest = index / self.ncol;
        let a = rest % self.alphabet_pad;
        let rest = rest / self.alphabet_pad;
        let k = rest % self.ncol;
        let b = rest / self.ncol;
        (b, k, a, j)
    }

    /// Maps a full-vector index of a logical coupling to the index of its
    /// transposed partner `(a, j, b, k)`. Returns `None` for single-site cells
    /// and padding.
    pub fn transpose_index(&self, index: usize) -> Option<usize> {
        if index < self.nsingle_padded || self.is_padding(index) {
            return None;
        }
        let (b, k, a, j) = self.pair_coords(index - self.nsingle_padded);
        Some(self.nsingle_padded + self.pair_index(a, j, b, k))
    }

    /// Whether a full-vector index falls into a padding cell.
    pub fn is_padding(&self, index: usize) -> bool {
        if index < self.nsingle_padded {
            return index >= self.nsingle;
        }
        if index >= self.nvar_padded() {
            return true;
        }
        let (_, _, a, _) = self.pair_coords(index - self.nsingle_padded);
        a >= self.alphabet_size
    }

    /// A zeroed parameter (or gradient) vector of the padded length.
    pub fn zeros(&self) -> Vec<f64> {
        vec![0.0; self.nvar_padded()]
    }

    /// Splits a full vector into its single-site and pairwise blocks.
    #[inline]
    pub fn split<'a>(&self, x: &'a [f64]) -> (&'a [f64], &'a [f64]) {
        x.split_at(self.nsingle_padded)
    }

    #[inline]
    pub fn split_mut<'a>(&self, x: &'a mut [f64]) -> (&'a mut [f64], &'a mut [f64]) {
        x.split_at_mut(self.nsingle_padded)
    }
}
