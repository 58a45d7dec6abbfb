//! Dense matrices and the feedback mixing matrix.
//!
//! The FDN feeds every delay output back into every delay input through an
//! orthogonal matrix, so energy is redistributed between the lines but never
//! gained. A Hadamard matrix scaled by `1/√N` is orthogonal and mixes every
//! line into every other with equal weight.
//!
//! # Supported sizes
//!
//! - powers of two: Sylvester construction, `H[i][j] = (-1)^popcount(i & j)`
//! - 24: Paley construction I with the quadratic residues of q = 23

use std::fmt;
use std::ops::{Index, IndexMut};

use crate::error::{Result, ReverbError};

/// Row-major `f32` matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl Matrix {
    /// Zero-filled `rows × cols` matrix.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    pub fn square(n: usize) -> Self {
        Self::new(n, n)
    }

    pub fn identity(n: usize) -> Self {
        let mut m = Self::square(n);
        for i in 0..n {
            m[(i, i)] = 1.0;
        }
        m
    }

    /// Orthonormal Hadamard matrix of order `n`.
    pub fn hadamard(n: usize) -> Result<Self> {
        let mut m = if n.is_power_of_two() {
            sylvester(n)
        } else if n == 24 {
            paley(23)
        } else {
            return Err(ReverbError::InvalidPathCount(n));
        };
        m.scale(1.0 / (n as f32).sqrt());
        Ok(m)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn row(&self, row: usize) -> &[f32] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// Change the shape, keeping the overlapping cells and zeroing new ones.
    pub fn resize(&mut self, rows: usize, cols: usize) {
        let mut data = vec![0.0; rows * cols];
        for r in 0..rows.min(self.rows) {
            for c in 0..cols.min(self.cols) {
                data[r * cols + c] = self.data[r * self.cols + c];
            }
        }
        self.rows = rows;
        self.cols = cols;
        self.data = data;
    }

    pub fn scale(&mut self, factor: f32) {
        self.data.iter_mut().for_each(|v| *v *= factor);
    }

    pub fn transpose(&self) -> Self {
        let mut t = Self::new(self.cols, self.rows);
        for r in 0..self.rows {
            for c in 0..self.cols {
                t[(c, r)] = self[(r, c)];
            }
        }
        t
    }

    /// `out = self × input`, checked.
    pub fn mul_vec(&self, input: &[f32], out: &mut [f32]) -> Result<()> {
        if input.len() != self.cols {
            return Err(ReverbError::DimensionMismatch {
                expected: self.cols,
                actual: input.len(),
            });
        }
        if out.len() != self.rows {
            return Err(ReverbError::DimensionMismatch {
                expected: self.rows,
                actual: out.len(),
            });
        }
        self.apply(input, out);
        Ok(())
    }

    /// `out = self × input` for callers that sized the buffers up front.
    #[inline]
    pub fn apply(&self, input: &[f32], out: &mut [f32]) {
        debug_assert_eq!(input.len(), self.cols);
        debug_assert_eq!(out.len(), self.rows);
        for (row, o) in self.data.chunks_exact(self.cols).zip(out.iter_mut()) {
            *o = row.iter().zip(input).map(|(m, x)| m * x).sum();
        }
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f32;

    fn index(&self, (row, col): (usize, usize)) -> &f32 {
        &self.data[row * self.cols + col]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut f32 {
        &mut self.data[row * self.cols + col]
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[")?;
        for r in 0..self.rows {
            write!(f, "  [")?;
            for (c, v) in self.row(r).iter().enumerate() {
                if c > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{v:.4}")?;
            }
            writeln!(f, "];")?;
        }
        write!(f, "]")
    }
}

fn sylvester(n: usize) -> Matrix {
    let mut m = Matrix::square(n);
    for r in 0..n {
        for c in 0..n {
            m[(r, c)] = if (r & c).count_ones() % 2 == 0 { 1.0 } else { -1.0 };
        }
    }
    m
}

/// Paley I for a prime `q ≡ 3 (mod 4)`: `H = I + S`, with `S` the skew
/// matrix bordering the Jacobsthal matrix of `q`.
fn paley(q: usize) -> Matrix {
    let is_residue = |a: usize| (1..q).any(|x| (x * x) % q == a);
    let chi = |a: usize| {
        if a == 0 {
            0.0
        } else if is_residue(a) {
            1.0
        } else {
            -1.0
        }
    };

    let n = q + 1;
    let mut m = Matrix::identity(n);
    for i in 1..n {
        m[(0, i)] += 1.0;
        m[(i, 0)] -= 1.0;
        for j in 1..n {
            m[(i, j)] += chi((j + q - i) % q);
        }
    }
    m
}
