//! Banded square matrix with LU factorization and partial pivoting.
//!
//! Storage follows the LAPACK band layout: column-major with leading dimension
//! `ldab = 2*kl + ku + 1`; element `(i, j)` of the band lives at
//! `j*ldab + kl + ku + i - j`. The first `kl` rows of every column are left free for the
//! fill-in produced by row interchanges. The matrix values and their LU factors are kept
//! in separate buffers, so the matrix can be inspected and its diagonal rewritten after a
//! factorization.
use crate::OneD::errors::BandMatrixError;
use nalgebra::DMatrix;

#[derive(Debug, Clone, Default)]
pub struct BandMatrix {
    n: usize,
    kl: usize,
    ku: usize,
    ldab: usize,
    data: Vec<f64>,
    ludata: Vec<f64>,
    ipiv: Vec<usize>,
    factored: bool,
}

impl BandMatrix {
    /// `n` x `n` zero matrix with `kl` sub-diagonals and `ku` super-diagonals
    pub fn new(n: usize, kl: usize, ku: usize) -> Self {
        let mut m = Self::default();
        m.resize(n, kl, ku);
        m
    }

    /// changes the shape; all values are reset to zero
    pub fn resize(&mut self, n: usize, kl: usize, ku: usize) {
        self.n = n;
        self.kl = kl;
        self.ku = ku;
        self.ldab = 2 * kl + ku + 1;
        self.data = vec![0.0; n * self.ldab];
        self.ludata = vec![0.0; n * self.ldab];
        self.ipiv = vec![0; n];
        self.factored = false;
    }

    pub fn n_rows(&self) -> usize {
        self.n
    }
    pub fn n_columns(&self) -> usize {
        self.n
    }
    pub fn n_sub_diagonals(&self) -> usize {
        self.kl
    }
    pub fn n_super_diagonals(&self) -> usize {
        self.ku
    }
    pub fn is_factored(&self) -> bool {
        self.factored
    }

    pub fn in_band(&self, i: usize, j: usize) -> bool {
        i < self.n && j < self.n && i <= j + self.kl && j <= i + self.ku
    }

    /// offset of (i, j) in the band buffers; valid for `i - j <= kl` and `j - i <= kl + ku`
    #[inline]
    fn index(&self, i: usize, j: usize) -> usize {
        j * self.ldab + self.kl + self.ku + i - j
    }

    /// value of element (i, j); zero outside the band
    pub fn get(&self, i: usize, j: usize) -> f64 {
        if self.in_band(i, j) {
            self.data[self.index(i, j)]
        } else {
            0.0
        }
    }

    pub fn value_mut(&mut self, i: usize, j: usize) -> Result<&mut f64, BandMatrixError> {
        if !self.in_band(i, j) {
            return Err(BandMatrixError::OutOfBand {
                row: i,
                col: j,
                kl: self.kl,
                ku: self.ku,
            });
        }
        self.factored = false;
        let k = self.index(i, j);
        Ok(&mut self.data[k])
    }

    pub fn set(&mut self, i: usize, j: usize, value: f64) -> Result<(), BandMatrixError> {
        *self.value_mut(i, j)? = value;
        Ok(())
    }

    pub fn set_zero(&mut self) {
        self.data.iter_mut().for_each(|v| *v = 0.0);
        self.factored = false;
    }

    /// y = A x
    pub fn mult(&self, x: &[f64], y: &mut [f64]) {
        for i in 0..self.n {
            let jmin = i.saturating_sub(self.kl);
            let jmax = (i + self.ku).min(self.n - 1);
            y[i] = (jmin..=jmax)
                .map(|j| self.data[self.index(i, j)] * x[j])
                .sum();
        }
    }

    /// LU factorization with partial pivoting into the factor buffer
    pub fn factor(&mut self) -> Result<(), BandMatrixError> {
        self.ludata.copy_from_slice(&self.data);
        self.factored = false;
        let (n, kl, ku) = (self.n, self.kl, self.ku);
        for k in 0..n {
            let last = (k + kl).min(n - 1);
            let mut p = k;
            let mut pmax = self.ludata[self.index(k, k)].abs();
            for i in k + 1..=last {
                let v = self.ludata[self.index(i, k)].abs();
                if v > pmax {
                    p = i;
                    pmax = v;
                }
            }
            self.ipiv[k] = p;
            if pmax == 0.0 || !pmax.is_finite() {
                return Err(BandMatrixError::Singular { row: k });
            }
            let jmax = (k + kl + ku).min(n - 1);
            if p != k {
                for j in k..=jmax {
                    let (a, b) = (self.index(k, j), self.index(p, j));
                    self.ludata.swap(a, b);
                }
            }
            let pivot = self.ludata[self.index(k, k)];
            for i in k + 1..=last {
                let ik = self.index(i, k);
                let l = self.ludata[ik] / pivot;
                self.ludata[ik] = l;
                if l != 0.0 {
                    for j in k + 1..=jmax {
                        let kj = self.ludata[self.index(k, j)];
                        let ij = self.index(i, j);
                        self.ludata[ij] -= l * kj;
                    }
                }
            }
        }
        self.factored = true;
        Ok(())
    }

    /// Solves A x = b in place, factoring first if the values changed since the last
    /// factorization.
    pub fn solve(&mut self, b: &mut [f64]) -> Result<(), BandMatrixError> {
        if b.len() != self.n {
            return Err(BandMatrixError::DimensionMismatch {
                expected: self.n,
                found: b.len(),
            });
        }
        if !self.factored {
            self.factor()?;
        }
        let (n, kl, ku) = (self.n, self.kl, self.ku);
        // forward: apply interchanges and unit lower factors column by column
        for k in 0..n {
            let p = self.ipiv[k];
            if p != k {
                b.swap(k, p);
            }
            let last = (k + kl).min(n - 1);
            for i in k + 1..=last {
                b[i] -= self.ludata[self.index(i, k)] * b[k];
            }
        }
        for k in (0..n).rev() {
            let jmax = (k + kl + ku).min(n - 1);
            let mut sum = b[k];
            for j in k + 1..=jmax {
                sum -= self.ludata[self.index(k, j)] * b[j];
            }
            b[k] = sum / self.ludata[self.index(k, k)];
        }
        Ok(())
    }

    pub fn to_dmatrix(&self) -> DMatrix<f64> {
        DMatrix::from_fn(self.n, self.n, |i, j| self.get(i, j))
    }
}
