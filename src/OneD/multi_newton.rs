//! # Damped Newton iterator
//!
//! One call to [`MultiNewton::solve`] runs damped Newton iterations on the chain residual
//! at the chain's current `rdt`, starting from `x0`.
//!
//! Each iteration:
//! 1. rebuilds the Jacobian if it is stale or older than the age limit;
//! 2. computes the undamped step `J dx = -r(x)`;
//! 3. shrinks the step by `fbound` so every component stays within its domain bounds;
//! 4. searches a damping coefficient: the trial `x1 = x + fbound * damp * dx` is accepted
//!    when the weighted norm `s1` of the next undamped step from `x1` (computed with the
//!    same Jacobian) is below the norm `s0` of the current step, or already within
//!    `convergence_tolerance`.
//!
//! `s1 <= convergence_tolerance` at an accepted trial means convergence. When no damping
//! coefficient works and the Jacobian is older than one iteration, it is rebuilt and the
//! iteration retried; with a fresh Jacobian the attempt has diverged. The step norm is
//! weighted per domain component by `ewt = rtol * mean(|x|) + atol`.
use crate::OneD::errors::{BandMatrixError, DomainError, SolverError};
use crate::OneD::multi_jac::MultiJac;
use crate::OneD::one_dim::OneDim;
use crate::OneD::solver_config::{NewtonConfig, StepNorm};
use log::{debug, info, warn};
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewtonOutcome {
    Converged {
        iterations: usize,
        /// whether a Jacobian was evaluated during this solve
        new_jacobian: bool,
    },
    Diverged,
    StepLimitExceeded,
}

impl NewtonOutcome {
    pub fn is_converged(&self) -> bool {
        matches!(self, NewtonOutcome::Converged { .. })
    }
}

/// result of one damping search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DampStatus {
    /// step accepted, not converged yet
    Accepted,
    Converged,
    /// the undamped step leaves the bounds immediately
    AtLimits,
    /// no damping coefficient reduced the step norm
    DampingFailed,
}

/// one damping search, kept for diagnostics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DampRecord {
    pub s0: f64,
    pub s1: f64,
    pub fbound: f64,
    pub damping: f64,
    pub jac_age: usize,
    pub status: DampStatus,
}

/// failure to compute an undamped step
#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Residual(#[from] DomainError),
    #[error(transparent)]
    Linear(#[from] BandMatrixError),
}

pub struct MultiNewton {
    x: Vec<f64>,
    stp: Vec<f64>,
    stp1: Vec<f64>,
    config: NewtonConfig,
    max_age: usize,
    history: Vec<DampRecord>,
    elapsed: Duration,
}

impl MultiNewton {
    pub fn new(size: usize, config: NewtonConfig, max_age: usize) -> Self {
        Self {
            x: vec![0.0; size],
            stp: vec![0.0; size],
            stp1: vec![0.0; size],
            config,
            max_age,
            history: Vec::new(),
            elapsed: Duration::ZERO,
        }
    }

    pub fn resize(&mut self, size: usize) {
        self.x = vec![0.0; size];
        self.stp = vec![0.0; size];
        self.stp1 = vec![0.0; size];
    }

    pub fn set_max_age(&mut self, age: usize) {
        self.max_age = age;
    }
    pub fn max_age(&self) -> usize {
        self.max_age
    }
    pub fn config(&self) -> &NewtonConfig {
        &self.config
    }
    pub fn set_config(&mut self, config: NewtonConfig) {
        self.config = config;
    }
    /// damping searches of the last solve
    pub fn history(&self) -> &[DampRecord] {
        &self.history
    }
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
    pub fn reset_stats(&mut self) {
        self.elapsed = Duration::ZERO;
    }

    /// weighted norm of `step` taken from `x`
    pub fn weighted_norm(&self, x: &[f64], step: &[f64], chain: &OneDim) -> f64 {
        weighted_norm(self.config.norm, x, step, chain)
    }

    /// Runs damped Newton iterations from `x0`. On convergence `x1` holds the solution;
    /// otherwise it holds the last accepted iterate. Fails only if `x0`, `x1` and the
    /// solver's work arrays do not match the chain size.
    pub fn solve(
        &mut self,
        x0: &[f64],
        x1: &mut [f64],
        chain: &mut OneDim,
        jac: &mut MultiJac,
    ) -> Result<NewtonOutcome, SolverError> {
        let size = chain.size();
        for found in [x0.len(), x1.len(), self.x.len()] {
            if found != size {
                return Err(SolverError::SizeMismatch { expected: size, found });
            }
        }
        let t0 = Instant::now();
        self.history.clear();
        self.x.copy_from_slice(x0);
        let jac_evals_at_start = jac.n_evals();
        let mut force_new_jac = jac.is_stale();
        let mut n_jac_reeval = 0;
        let mut iterations = 0;

        let outcome = loop {
            if jac.age() > self.max_age {
                info!("maximum Jacobian age reached ({})", self.max_age);
                force_new_jac = true;
            }
            if force_new_jac {
                if let Err(e) = self.rebuild_jacobian(chain, jac) {
                    warn!("Jacobian evaluation failed: {}", e);
                    break NewtonOutcome::Diverged;
                }
                force_new_jac = false;
            }
            if iterations >= self.config.max_iterations {
                warn!("Newton iteration limit ({}) exceeded", self.config.max_iterations);
                break NewtonOutcome::StepLimitExceeded;
            }
            iterations += 1;

            let status = match newton_step(&self.x, &mut self.stp, chain, jac) {
                Ok(()) => {
                    jac.increment_age();
                    self.damp_step(x1, chain, jac)
                }
                Err(e) => {
                    debug!("undamped step failed: {}", e);
                    DampStatus::DampingFailed
                }
            };

            match status {
                DampStatus::Accepted => self.x.copy_from_slice(x1),
                DampStatus::Converged => {
                    if chain.steady() {
                        jac.set_age(0);
                    }
                    break NewtonOutcome::Converged {
                        iterations,
                        new_jacobian: jac.n_evals() != jac_evals_at_start,
                    };
                }
                DampStatus::AtLimits | DampStatus::DampingFailed => {
                    if jac.age() > 1 {
                        if n_jac_reeval >= self.config.max_jacobian_reevaluations {
                            break NewtonOutcome::Diverged;
                        }
                        n_jac_reeval += 1;
                        info!(
                            "re-evaluating Jacobian, since no damping coefficient could be found with this Jacobian"
                        );
                        force_new_jac = true;
                    } else {
                        break NewtonOutcome::Diverged;
                    }
                }
            }
        };

        if !outcome.is_converged() {
            x1.copy_from_slice(&self.x);
        }
        self.elapsed += t0.elapsed();
        debug!("Newton solve finished after {} iterations: {:?}", iterations, outcome);
        Ok(outcome)
    }

    /// steady Jacobian at the current iterate, then shifted to the chain's `rdt`
    fn rebuild_jacobian(&mut self, chain: &mut OneDim, jac: &mut MultiJac) -> Result<(), DomainError> {
        chain.eval(None, &self.x, &mut self.stp, Some(0.0), true)?;
        jac.eval(&self.x, &self.stp, 0.0, chain)?;
        jac.update_transient(chain.rdt(), chain.transient_mask());
        Ok(())
    }

    /// damping search along `self.stp` from `self.x`; the accepted point goes to `x1`
    fn damp_step(&mut self, x1: &mut [f64], chain: &mut OneDim, jac: &mut MultiJac) -> DampStatus {
        let s0 = self.weighted_norm(&self.x, &self.stp, chain);
        let fbound = bound_step(&self.x, &self.stp, chain);
        let mut record = DampRecord {
            s0,
            s1: f64::INFINITY,
            fbound,
            damping: 0.0,
            jac_age: jac.age(),
            status: DampStatus::AtLimits,
        };
        if fbound < 1e-10 {
            debug!("at limits: no damped step can be taken without violating bounds");
            self.history.push(record);
            return DampStatus::AtLimits;
        }

        let mut damp = 1.0;
        let mut status = DampStatus::DampingFailed;
        for _ in 0..self.config.max_damp_iterations {
            let ff = fbound * damp;
            for ((x1, &x), &dx) in x1.iter_mut().zip(&self.x).zip(&self.stp) {
                *x1 = x + ff * dx;
            }
            let s1 = match newton_step(x1, &mut self.stp1, chain, jac) {
                Ok(()) => weighted_norm(self.config.norm, x1, &self.stp1, chain),
                Err(e) => {
                    debug!("residual failed at damping coefficient {:.3e}: {}", ff, e);
                    f64::INFINITY
                }
            };
            debug!(
                "log10(s0) = {:.3}, log10(s1) = {:.3}, damping {:.3e}",
                s0.log10(),
                s1.log10(),
                ff
            );
            record.s1 = s1;
            record.damping = ff;
            if s1 <= self.config.convergence_tolerance {
                status = DampStatus::Converged;
                break;
            }
            if s1 < s0 {
                status = DampStatus::Accepted;
                break;
            }
            damp /= self.config.damp_factor;
        }
        record.status = status;
        self.history.push(record);
        status
    }
}

/// undamped Newton step at `x`: `J step = -r(x)` with the chain's current `rdt`
pub fn newton_step(
    x: &[f64],
    step: &mut [f64],
    chain: &mut OneDim,
    jac: &mut MultiJac,
) -> Result<(), StepError> {
    chain.eval(None, x, step, None, true)?;
    for v in step.iter_mut() {
        if !v.is_finite() {
            return Err(StepError::Residual(DomainError::InvalidState {
                domain: "chain".to_owned(),
                message: "non-finite residual".to_owned(),
            }));
        }
        *v = -*v;
    }
    jac.solve(step)?;
    Ok(())
}

/// largest `fbound <= 1` keeping `x + fbound * step` within every domain's bounds
pub fn bound_step(x: &[f64], step: &[f64], chain: &OneDim) -> f64 {
    let mut fbound: f64 = 1.0;
    for (i, domain) in chain.domains().enumerate() {
        let start = chain.start(i);
        let (np, nv) = (domain.n_points(), domain.n_components());
        for n in 0..nv {
            let (below, above) = (domain.lower_bound(n), domain.upper_bound(n));
            for j in 0..np {
                let k = start + nv * j + n;
                let (val, newval) = (x[k], x[k] + step[k]);
                if newval > above {
                    fbound = fbound.min((above - val) / (newval - val));
                } else if newval < below {
                    fbound = fbound.min((val - below) / (val - newval));
                }
            }
        }
    }
    fbound.max(0.0)
}

/// weighted max or RMS norm of `step`, weights per domain component
pub fn weighted_norm(kind: StepNorm, x: &[f64], step: &[f64], chain: &OneDim) -> f64 {
    let mut sum = 0.0;
    let mut fmax: f64 = 0.0;
    for (i, domain) in chain.domains().enumerate() {
        let start = chain.start(i);
        let (np, nv) = (domain.n_points(), domain.n_components());
        for n in 0..nv {
            let esum: f64 = (0..np).map(|j| x[start + nv * j + n].abs()).sum();
            let ewt = domain.rtol(n) * esum / np as f64 + domain.atol(n);
            for j in 0..np {
                let f = step[start + nv * j + n] / ewt;
                sum += f * f;
                fmax = fmax.max(f.abs());
            }
        }
    }
    match kind {
        StepNorm::WeightedMax => fmax,
        StepNorm::WeightedRms => {
            let size = chain.size().max(1);
            (sum / size as f64).sqrt()
        }
    }
}
