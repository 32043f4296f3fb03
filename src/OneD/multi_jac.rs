//! Banded finite-difference Jacobian of the chain residual.
//!
//! Column `k` is obtained by perturbing unknown `k` by `dx = atol + |x_k| * rtol` and
//! evaluating the residual over the neighbourhood of the point that owns `k`. The matrix is
//! always built at `rdt = 0`; the steady diagonal is cached so that switching to a time
//! step only rewrites the diagonal.
use crate::OneD::band_matrix::BandMatrix;
use crate::OneD::errors::{BandMatrixError, DomainError};
use crate::OneD::one_dim::OneDim;
use crate::OneD::solver_config::JacobianConfig;
use log::info;
use std::time::{Duration, Instant};

pub struct MultiJac {
    matrix: BandMatrix,
    ssdiag: Vec<f64>,
    r1: Vec<f64>,
    work: Vec<f64>,
    rtol: f64,
    atol: f64,
    age: usize,
    stale: bool,
    n_evals: usize,
    elapsed: Duration,
}

impl MultiJac {
    pub fn new(chain: &OneDim, config: &JacobianConfig) -> Self {
        let mut jac = Self {
            matrix: BandMatrix::default(),
            ssdiag: Vec::new(),
            r1: Vec::new(),
            work: Vec::new(),
            rtol: config.rtol,
            atol: config.atol,
            age: 0,
            stale: true,
            n_evals: 0,
            elapsed: Duration::ZERO,
        };
        jac.resize(chain);
        jac
    }

    /// matches the chain's size and bandwidth; the Jacobian must be rebuilt afterwards
    pub fn resize(&mut self, chain: &OneDim) {
        let (n, bw) = (chain.size(), chain.bandwidth());
        self.matrix.resize(n, bw, bw);
        self.ssdiag = vec![0.0; n];
        self.r1 = vec![0.0; n];
        self.work = vec![0.0; n];
        self.age = 0;
        self.stale = true;
        self.n_evals = 0;
        self.elapsed = Duration::ZERO;
    }

    /// Builds the steady Jacobian at `x0`, where `resid0` is the residual at `x0`
    /// evaluated with the same `rdt`. Entries outside the band are not stored.
    pub fn eval(
        &mut self,
        x0: &[f64],
        resid0: &[f64],
        rdt: f64,
        chain: &mut OneDim,
    ) -> Result<(), DomainError> {
        let n = self.work.len();
        if x0.len() != n || resid0.len() != n || chain.size() != n {
            return Err(DomainError::InvalidState {
                domain: "jacobian".to_owned(),
                message: format!(
                    "sized for {} unknowns, got x0 {}, residual {}, chain {}",
                    n,
                    x0.len(),
                    resid0.len(),
                    chain.size()
                ),
            });
        }
        let t0 = Instant::now();
        self.work.copy_from_slice(x0);
        self.matrix.set_zero();
        // a failed build leaves a matrix that must not be reused
        self.stale = true;
        let points = chain.points();
        for j in 0..points {
            let (nv, loc) = (chain.n_vars(j), chain.loc(j));
            for n in 0..nv {
                let ipt = loc + n;
                let xsave = self.work[ipt];
                self.work[ipt] = xsave + self.atol + xsave.abs() * self.rtol;
                // the step actually represented in floating point
                let rdx = 1.0 / (self.work[ipt] - xsave);
                let result = chain.eval(Some(j), &self.work, &mut self.r1, Some(rdt), false);
                self.work[ipt] = xsave;
                result?;
                for i in j.saturating_sub(1)..=(j + 1).min(points - 1) {
                    let (mv, iloc) = (chain.n_vars(i), chain.loc(i));
                    for m in 0..mv {
                        let row = iloc + m;
                        if let Ok(v) = self.matrix.value_mut(row, ipt) {
                            *v = (self.r1[row] - resid0[row]) * rdx;
                        }
                    }
                }
            }
        }
        for (n, d) in self.ssdiag.iter_mut().enumerate() {
            *d = self.matrix.get(n, n);
        }
        self.age = 0;
        self.stale = false;
        self.n_evals += 1;
        self.elapsed += t0.elapsed();
        info!("new Jacobian evaluated ({} so far)", self.n_evals);
        Ok(())
    }

    /// rewrites the diagonal for reciprocal time step `rdt`: `diag = ssdiag - mask * rdt`
    pub fn update_transient(&mut self, rdt: f64, mask: &[bool]) {
        for (n, (&d, &transient)) in self.ssdiag.iter().zip(mask).enumerate() {
            let value = if transient { d - rdt } else { d };
            if let Ok(v) = self.matrix.value_mut(n, n) {
                *v = value;
            }
        }
    }

    /// solves `J x = b` in place
    pub fn solve(&mut self, b: &mut [f64]) -> Result<(), BandMatrixError> {
        self.matrix.solve(b)
    }

    pub fn age(&self) -> usize {
        self.age
    }
    pub fn increment_age(&mut self) {
        self.age += 1;
    }
    pub fn set_age(&mut self, age: usize) {
        self.age = age;
    }
    /// true until the first evaluation after creation, a resize, or `invalidate`
    pub fn is_stale(&self) -> bool {
        self.stale
    }
    pub fn invalidate(&mut self) {
        self.stale = true;
    }
    pub fn n_evals(&self) -> usize {
        self.n_evals
    }
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
    pub fn reset_stats(&mut self) {
        self.n_evals = 0;
        self.elapsed = Duration::ZERO;
    }
    pub fn value(&self, i: usize, j: usize) -> f64 {
        self.matrix.get(i, j)
    }
    pub fn matrix(&self) -> &BandMatrix {
        &self.matrix
    }
    pub fn set_perturbation(&mut self, rtol: f64, atol: f64) {
        self.rtol = rtol;
        self.atol = atol;
    }
}
