use thiserror::Error;

/// Alphabet size used for protein alignments: 20 amino acids plus the gap symbol.
pub const PROTEIN_ALPHABET_SIZE: usize = 21;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum AlignmentError {
    #[error("Alphabet must contain at least 2 symbols, got {0}")]
    AlphabetTooSmall(usize),
    #[error("Alphabet of {0} symbols cannot be encoded in a single byte")]
    AlphabetTooLarge(usize),
    #[error("Symbol table of length {len} is not a multiple of the column count {ncol}")]
    Ragged { len: usize, ncol: usize },
    #[error("Symbol {symbol} at row {row}, column {col} is outside the alphabet [0, {alphabet_size})")]
    SymbolOutOfRange {
        row: usize,
        col: usize,
        symbol: u8,
        alphabet_size: usize,
    },
}

/// An immutable, rectangular table of encoded sequences.
///
/// Each cell holds a symbol in `[0, alphabet_size)`. The last symbol of the
/// alphabet is the reference symbol whose single-site potential is fixed at zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alignment {
    alphabet_size: usize,
    nrow: usize,
    ncol: usize,
    /// Row-major symbol table of `nrow * ncol` entries.
    symbols: Vec<u8>,
}

impl Alignment {
    /// Builds an alignment from a row-major symbol table, validating its shape
    /// and that every symbol belongs to the alphabet.
    ///
    /// # Errors
    ///
    /// Returns an [`AlignmentError`] if the alphabet is unusable, if the table
    /// length is not a multiple of `ncol`, or if a symbol is out of range.
    pub fn new(alphabet_size: usize, ncol: usize, symbols: Vec<u8>) -> Result<Self, AlignmentError> {
        if alphabet_size < 2 {
            return Err(AlignmentError::AlphabetTooSmall(alphabet_size));
        }
        if alphabet_size > u8::MAX as usize + 1 {
            return Err(AlignmentError::AlphabetTooLarge(alphabet_size));
        }

        let nrow = match ncol {
            0 if symbols.is_empty() => 0,
            0 => {
                return Err(AlignmentError::Ragged {
                    len: symbols.len(),
                    ncol,
                });
            }
            _ if symbols.len() % ncol != 0 => {
                return Err(AlignmentError::Ragged {
                    len: symbols.len(),
                    ncol,
                });
            }
            _ => symbols.len() / ncol,
        };

        if let Some(pos) = symbols.iter().position(|&s| s as usize >= alphabet_size) {
            return Err(AlignmentError::SymbolOutOfRange {
                row: pos / ncol,
                col: pos % ncol,
                symbol: symbols[pos],
                alphabet_size,
            });
        }

        Ok(Self {
            alphabet_size,
            nrow,
            ncol,
            symbols,
        })
    }

    /// Builds an alignment from a list of equally long rows.
    pub fn from_rows<R: AsRef<[u8]>>(alphabet_size: usize, rows: &[R]) -> Result<Self, AlignmentError> {
        let ncol = rows.first().map_or(0, |r| r.as_ref().len());
        let mut symbols = Vec::with_capacity(rows.len() * ncol);
        for row in rows {
            let row = row.as_ref();
            if row.len() != ncol {
                return Err(AlignmentError::Ragged {
                    len: symbols.len() + row.len(),
                    ncol,
                });
            }
            symbols.extend_from_slice(row);
        }
        Self::new(alphabet_size, ncol, symbols)
    }

    #[inline]
    pub fn nrow(&self) -> usize {
        self.nrow
    }

    #[inline]
    pub fn ncol(&self) -> usize {
        self.ncol
    }

    #[inline]
    pub fn alphabet_size(&self) -> usize {
        self.alphabet_size
    }

    /// The gauge-fixed symbol, always the last one of the alphabet.
    #[inline]
    pub fn reference_symbol(&self) -> u8 {
        (self.alphabet_size - 1) as u8
    }

    #[inline]
    pub fn row(&self, i: usize) -> &[u8] {
        &self.symbols[i * self.ncol..(i + 1) * self.ncol]
    }

    #[inline]
    pub fn symbol(&self, i: usize, k: usize) -> u8 {
        self.symbols[i * self.ncol + k]
    }

    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[u8]> + '_ {
        (0..self.nrow).map(move |i| self.row(i))
    }

    pub fn symbols(&self) -> &[u8] {
        &self.symbols
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_computes_row_count_from_symbol_table() {
        let msa = Alignment::new(3, 2, vec![0, 1, 2, 0, 1, 1]).unwrap();
        assert_eq!(msa.nrow(), 3);
        assert_eq!(msa.ncol(), 2);
        assert_eq!(msa.row(1), &[2, 0]);
        assert_eq!(msa.symbol(2, 1), 1);
        assert_eq!(msa.reference_symbol(), 2);
    }

    #[test]
    fn new_rejects_ragged_symbol_table() {
        let result = Alignment::new(3, 2, vec![0, 1, 2]);
        assert_eq!(result, Err(AlignmentError::Ragged { len: 3, ncol: 2 }));
    }

    #[test]
    fn new_rejects_symbol_outside_alphabet() {
        let result = Alignment::new(3, 2, vec![0, 1, 2, 3]);
        assert_eq!(
            result,
            Err(AlignmentError::SymbolOutOfRange {
                row: 1,
                col: 1,
                symbol: 3,
                alphabet_size: 3,
            })
        );
    }

    #[test]
    fn new_rejects_single_symbol_alphabet() {
        assert_eq!(
            Alignment::new(1, 1, vec![0]),
            Err(AlignmentError::AlphabetTooSmall(1))
        );
    }

    #[test]
    fn from_rows_accepts_empty_row_list() {
        let msa = Alignment::from_rows::<[u8; 0]>(PROTEIN_ALPHABET_SIZE, &[]).unwrap();
        assert_eq!(msa.nrow(), 0);
        assert_eq!(msa.ncol(), 0);
    }

    #[test]
    fn from_rows_rejects_rows_of_different_length() {
        let rows: Vec<Vec<u8>> = vec![vec![0, 1], vec![0]];
        assert!(matches!(
            Alignment::from_rows(3, &rows),
            Err(AlignmentError::Ragged { .. })
        ));
    }

    #[test]
    fn rows_iterates_in_order() {
        let msa = Alignment::from_rows(4, &[[0u8, 1], [2, 3]]).unwrap();
        let rows: Vec<&[u8]> = msa.rows().collect();
        assert_eq!(rows, vec![&[0u8, 1][..], &[2u8, 3][..]]);
    }
}
