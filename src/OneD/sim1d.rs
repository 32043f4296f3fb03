//! # Steady solver with pseudo-transient continuation and grid refinement
//!
//! [`Sim1D`] owns the domain chain, the Jacobian, the Newton iterator and the solution
//! vector, and drives them:
//!
//! 1. a steady Newton solve is attempted from the current solution;
//! 2. if it fails, a batch of backward-Euler time steps is taken (batch sizes from
//!    `time_steps`, the last one repeating) and the steady solve is attempted again;
//! 3. a failed time step halves `dt`; once `dt` drops below `dt_min` the solve stops with
//!    [`SolveOutcome::FailedTimeStepUnderflow`];
//! 4. after a converged steady solve the grid may be refined, and the whole procedure
//!    repeats on the new grid until no domain asks for more points.
//!
//! The solution is replaced only after a converged Newton solve, a successful time step, or
//! a refinement; a failed attempt never leaves a partial update behind.
//!
//! # Example
//! ```
//! use MultiDomain1D::OneD::boundaries::{Boundary, Inlet, Surface};
//! use MultiDomain1D::OneD::domain::Domain;
//! use MultiDomain1D::OneD::one_dim::OneDim;
//! use MultiDomain1D::OneD::reacting_column::ReactingColumn;
//! use MultiDomain1D::OneD::sim1d::{Sim1D, SolveOutcome};
//! let inlet = Boundary::from(Inlet::new("inlet", vec![1.0, 1.0]));
//! let mut column = ReactingColumn::new("column", 11, 1.0).unwrap();
//! column.properties.velocity = 1.0;
//! let surface = Boundary::from(Surface::new("surface", vec![2.0, 0.0]));
//! let domains: Vec<Box<dyn Domain>> = vec![Box::new(inlet), Box::new(column), Box::new(surface)];
//! let chain = OneDim::from_domains(domains).unwrap();
//! let mut sim = Sim1D::new(chain).unwrap();
//! let outcome = sim.solve(false).unwrap();
//! assert_eq!(outcome, SolveOutcome::Converged);
//! ```
use crate::OneD::domain::Domain;
use crate::OneD::errors::{SolverError, TopologyError};
use crate::OneD::multi_jac::MultiJac;
use crate::OneD::multi_newton::{MultiNewton, NewtonOutcome};
use crate::OneD::one_dim::OneDim;
use crate::OneD::solver_config::SolverConfig;
use crate::OneD::stats::{GridStats, SolverStats};
use log::{error, info, warn};
use nalgebra::{DMatrix, DVector};
use prettytable::{Cell, Row, Table};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveOutcome {
    Converged,
    ConvergedAfterRefinement,
    FailedTimeStepUnderflow,
    FailedStepLimit,
}

impl SolveOutcome {
    pub fn is_converged(&self) -> bool {
        matches!(
            self,
            SolveOutcome::Converged | SolveOutcome::ConvergedAfterRefinement
        )
    }
}

impl fmt::Display for SolveOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SolveOutcome::Converged => "converged",
            SolveOutcome::ConvergedAfterRefinement => "converged after grid refinement",
            SolveOutcome::FailedTimeStepUnderflow => "failed: time step underflow",
            SolveOutcome::FailedStepLimit => "failed: steady attempt limit reached",
        };
        write!(f, "{}", s)
    }
}

/// what one call to [`Sim1D::refine`] changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefineSummary {
    pub inserted: usize,
    pub removed: usize,
    pub max_points_reached: bool,
}

impl RefineSummary {
    pub fn changed(&self) -> bool {
        self.inserted > 0 || self.removed > 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedDomain {
    pub name: String,
    pub components: Vec<String>,
    pub grid: Vec<f64>,
    /// `values[n][j]`: component `n` at point `j`
    pub values: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedSolution {
    pub description: String,
    pub domains: Vec<SavedDomain>,
}

/// solutions stored in one file, keyed by id
pub type SolutionArchive = BTreeMap<String, SavedSolution>;

#[derive(Debug, Clone, Copy, Default)]
struct GridCounters {
    time_steps: usize,
    steady_attempts: usize,
}

pub struct Sim1D {
    chain: OneDim,
    jac: MultiJac,
    newton: MultiNewton,
    x: DVector<f64>,
    xnew: DVector<f64>,
    config: SolverConfig,
    dt: f64,
    steps: Vec<usize>,
    stats: SolverStats,
    counters: GridCounters,
}

impl Sim1D {
    pub fn new(chain: OneDim) -> Result<Self, SolverError> {
        Self::with_config(chain, SolverConfig::default())
    }

    /// Sizes the chain if needed and fills the solution with every domain's initial values.
    pub fn with_config(mut chain: OneDim, config: SolverConfig) -> Result<Self, SolverError> {
        config.validate()?;
        if !chain.is_ready() {
            chain.resize()?;
        }
        if let Some(criteria) = &config.refine.criteria {
            for i in 0..chain.n_domains() {
                if let Some(refiner) = chain.domain_mut(i).refiner_mut() {
                    refiner.criteria = criteria.clone();
                }
            }
        }
        let size = chain.size();
        let jac = MultiJac::new(&chain, &config.jacobian);
        let newton = MultiNewton::new(size, config.newton.clone(), config.jacobian.ss_age);
        let mut sim = Self {
            chain,
            jac,
            newton,
            x: DVector::zeros(size),
            xnew: DVector::zeros(size),
            dt: config.time_stepping.initial_dt,
            steps: config.time_stepping.time_steps.clone(),
            config,
            stats: SolverStats::new(),
            counters: GridCounters::default(),
        };
        sim.set_initial_guess();
        Ok(sim)
    }

    fn set_initial_guess(&mut self) {
        for (i, domain) in self.chain.domains().enumerate() {
            let start = self.chain.start(i);
            let nv = domain.n_components();
            for j in 0..domain.n_points() {
                for n in 0..nv {
                    self.x[start + nv * j + n] = domain.initial_value(n, j);
                }
            }
        }
    }

    /// Rebuilds the location map after domains were changed through [`Sim1D::domain_mut`].
    /// The solution is reset to the domains' initial values if the problem size changed.
    pub fn resize(&mut self) -> Result<(), SolverError> {
        self.chain.resize()?;
        let size = self.chain.size();
        self.jac.resize(&self.chain);
        self.newton.resize(size);
        if size != self.x.len() {
            self.x = DVector::zeros(size);
            self.xnew = DVector::zeros(size);
            self.set_initial_guess();
        }
        Ok(())
    }

    pub fn chain(&self) -> &OneDim {
        &self.chain
    }
    /// Mutable access to a domain. The chain is marked stale until [`Sim1D::resize`].
    pub fn domain_mut(&mut self, dom: usize) -> Result<&mut dyn Domain, SolverError> {
        self.check_domain(dom)?;
        self.jac.invalidate();
        self.chain.invalidate();
        Ok(self.chain.domain_mut(dom))
    }
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }
    pub fn set_config(&mut self, config: SolverConfig) -> Result<(), SolverError> {
        config.validate()?;
        self.newton.set_config(config.newton.clone());
        self.newton.set_max_age(config.jacobian.ss_age);
        self.jac.set_perturbation(config.jacobian.rtol, config.jacobian.atol);
        self.jac.invalidate();
        self.dt = config.time_stepping.initial_dt;
        self.steps = config.time_stepping.time_steps.clone();
        self.config = config;
        Ok(())
    }
    pub fn stats(&self) -> &SolverStats {
        &self.stats
    }
    pub fn newton(&self) -> &MultiNewton {
        &self.newton
    }

    fn check_domain(&self, dom: usize) -> Result<(), SolverError> {
        if dom >= self.chain.n_domains() {
            return Err(TopologyError::IndexOutOfRange {
                index: dom,
                len: self.chain.n_domains(),
            }
            .into());
        }
        Ok(())
    }

    fn index(&self, dom: usize, comp: usize, point: usize) -> Result<usize, SolverError> {
        self.check_domain(dom)?;
        let d = self.chain.domain(dom);
        if comp >= d.n_components() {
            return Err(SolverError::ComponentOutOfRange {
                domain: d.name().to_owned(),
                component: comp,
                n_components: d.n_components(),
            });
        }
        if point >= d.n_points() {
            return Err(SolverError::PointOutOfRange {
                domain: d.name().to_owned(),
                point,
                n_points: d.n_points(),
            });
        }
        Ok(self.chain.start(dom) + d.n_components() * point + comp)
    }

    pub fn set_value(&mut self, dom: usize, comp: usize, point: usize, value: f64) -> Result<(), SolverError> {
        let k = self.index(dom, comp, point)?;
        self.x[k] = value;
        Ok(())
    }

    pub fn value(&self, dom: usize, comp: usize, point: usize) -> Result<f64, SolverError> {
        Ok(self.x[self.index(dom, comp, point)?])
    }

    /// value in the work array: the last residual or trial solution
    pub fn work_value(&self, dom: usize, comp: usize, point: usize) -> Result<f64, SolverError> {
        Ok(self.xnew[self.index(dom, comp, point)?])
    }

    /// Sets component `comp` of domain `dom` by linear interpolation of `values` given at
    /// relative positions `pos` (0 = first grid point, 1 = last).
    pub fn set_profile(&mut self, dom: usize, comp: usize, pos: &[f64], values: &[f64]) -> Result<(), SolverError> {
        if pos.is_empty() || pos.len() != values.len() {
            return Err(SolverError::InvalidProfile(format!(
                "{} positions for {} values",
                pos.len(),
                values.len()
            )));
        }
        if pos.windows(2).any(|w| w[1] < w[0]) {
            return Err(SolverError::InvalidProfile("positions must be non-decreasing".to_owned()));
        }
        self.index(dom, comp, 0)?;
        let grid = self.chain.domain(dom).grid().to_vec();
        if grid.len() != self.chain.domain(dom).n_points() {
            return Err(SolverError::InvalidProfile(format!(
                "domain '{}' does not expose a grid",
                self.chain.domain(dom).name()
            )));
        }
        let (z0, z1) = (grid[0], grid[grid.len() - 1]);
        for (j, &z) in grid.iter().enumerate() {
            let frac = if z1 > z0 { (z - z0) / (z1 - z0) } else { 0.0 };
            let k = self.index(dom, comp, j)?;
            self.x[k] = linear_interp(frac, pos, values);
        }
        Ok(())
    }

    pub fn set_flat_profile(&mut self, dom: usize, comp: usize, value: f64) -> Result<(), SolverError> {
        self.check_domain(dom)?;
        for j in 0..self.chain.domain(dom).n_points() {
            self.set_value(dom, comp, j, value)?;
        }
        Ok(())
    }

    pub fn solution(&self) -> &DVector<f64> {
        &self.x
    }

    pub fn set_solution(&mut self, x: &[f64]) -> Result<(), SolverError> {
        if x.len() != self.x.len() {
            return Err(SolverError::SizeMismatch {
                expected: self.x.len(),
                found: x.len(),
            });
        }
        self.x.copy_from_slice(x);
        Ok(())
    }

    /// solution of one domain as an `n_components x n_points` matrix
    pub fn domain_solution(&self, dom: usize) -> Result<DMatrix<f64>, SolverError> {
        self.check_domain(dom)?;
        let d = self.chain.domain(dom);
        let (start, nv) = (self.chain.start(dom), d.n_components());
        Ok(DMatrix::from_fn(nv, d.n_points(), |n, j| self.x[start + nv * j + n]))
    }

    pub fn show_solution(&self) {
        for (i, d) in self.chain.domains().enumerate() {
            let (start, nv) = (self.chain.start(i), d.n_components());
            let mut table = Table::new();
            let mut header = vec![Cell::new("z")];
            header.extend((0..nv).map(|n| Cell::new(&d.component_name(n))));
            table.add_row(Row::new(header));
            for (j, z) in d.grid().iter().enumerate().take(d.n_points()) {
                let mut cells = vec![Cell::new(&format!("{:.6e}", z))];
                cells.extend(
                    (0..nv).map(|n| Cell::new(&format!("{:.6e}", self.x[start + nv * j + n]))),
                );
                table.add_row(Row::new(cells));
            }
            println!("\n>>> domain '{}'", d.name());
            table.printstd();
        }
    }

    /// Evaluates the residual of the current solution into the work array.
    pub fn eval(&mut self, rdt: Option<f64>) -> Result<(), SolverError> {
        self.chain
            .eval(None, self.x.as_slice(), self.xnew.as_mut_slice(), rdt, true)?;
        Ok(())
    }

    /// max-norm of the steady residual of the current solution
    pub fn ssnorm(&mut self) -> Result<f64, SolverError> {
        Ok(self.chain.ssnorm(self.x.as_slice(), self.xnew.as_mut_slice())?)
    }

    /// Builds the steady-state Jacobian at the current solution.
    pub fn eval_ss_jacobian(&mut self) -> Result<(), SolverError> {
        self.chain
            .eval(None, self.x.as_slice(), self.xnew.as_mut_slice(), Some(0.0), true)?;
        self.jac
            .eval(self.x.as_slice(), self.xnew.as_slice(), 0.0, &mut self.chain)?;
        self.jac
            .update_transient(self.chain.rdt(), self.chain.transient_mask());
        Ok(())
    }

    /// Jacobian element (i, j); zero outside the band
    pub fn jacobian(&self, i: usize, j: usize) -> f64 {
        self.jac.value(i, j)
    }

    pub fn set_time_step(&mut self, dt: f64, steps: &[usize]) -> Result<(), SolverError> {
        if !(dt > 0.0) {
            return Err(SolverError::Config(format!("time step must be positive, got {}", dt)));
        }
        if steps.is_empty() || steps.contains(&0) {
            return Err(SolverError::Config(
                "time step counts must be a non-empty list of positive numbers".to_owned(),
            ));
        }
        self.dt = dt;
        self.steps = steps.to_vec();
        Ok(())
    }

    /// Sets refinement criteria of domain `dom`, or of every refinable domain if `None`.
    pub fn set_refine_criteria(
        &mut self,
        dom: Option<usize>,
        ratio: f64,
        slope: f64,
        curve: f64,
        prune: f64,
    ) -> Result<(), SolverError> {
        for i in self.domain_range(dom)? {
            if let Some(refiner) = self.chain.domain_mut(i).refiner_mut() {
                refiner
                    .set_criteria(ratio, slope, curve, prune)
                    .map_err(SolverError::Config)?;
            }
        }
        Ok(())
    }

    pub fn set_max_grid_points(&mut self, dom: Option<usize>, n: usize) -> Result<(), SolverError> {
        for i in self.domain_range(dom)? {
            if let Some(refiner) = self.chain.domain_mut(i).refiner_mut() {
                refiner.set_max_points(n);
            }
        }
        Ok(())
    }

    fn domain_range(&self, dom: Option<usize>) -> Result<std::ops::Range<usize>, SolverError> {
        match dom {
            Some(i) => {
                self.check_domain(i)?;
                Ok(i..i + 1)
            }
            None => Ok(0..self.chain.n_domains()),
        }
    }

    /// One Newton solve at the chain's current `rdt`; the solution is replaced on success.
    pub fn newton_solve(&mut self) -> Result<NewtonOutcome, SolverError> {
        if self.x.len() != self.chain.size() {
            return Err(SolverError::SizeMismatch {
                expected: self.chain.size(),
                found: self.x.len(),
            });
        }
        let outcome = self.newton.solve(
            self.x.as_slice(),
            self.xnew.as_mut_slice(),
            &mut self.chain,
            &mut self.jac,
        )?;
        if outcome.is_converged() {
            self.x.copy_from(&self.xnew);
        }
        Ok(outcome)
    }

    /// Takes `nsteps` backward-Euler steps starting with step `dt` and returns the step
    /// size to use next. The chain is back in steady mode afterwards.
    pub fn time_step(&mut self, nsteps: usize, dt: f64) -> Result<f64, SolverError> {
        let ts = self.config.time_stepping.clone();
        self.newton.set_max_age(self.config.jacobian.ts_age());
        let mut dt = dt;
        let mut n = 0;
        let result = loop {
            if n >= nsteps {
                break Ok(dt);
            }
            if self.chain.init_time_integ(dt, self.x.as_slice()) {
                self.jac
                    .update_transient(self.chain.rdt(), self.chain.transient_mask());
            }
            let outcome = match self.newton.solve(
                self.x.as_slice(),
                self.xnew.as_mut_slice(),
                &mut self.chain,
                &mut self.jac,
            ) {
                Ok(outcome) => outcome,
                Err(e) => break Err(e),
            };
            if outcome.is_converged() {
                self.x.copy_from(&self.xnew);
                n += 1;
                self.counters.time_steps += 1;
                info!("time step {} of {} done, dt = {:.3e}", n, nsteps, dt);
                dt = (dt * ts.dt_growth).min(ts.dt_max);
            } else {
                dt *= ts.dt_shrink;
                info!("time step failed ({:?}), dt reduced to {:.3e}", outcome, dt);
                if dt < ts.dt_min {
                    break Err(SolverError::TimeStepUnderflow {
                        dt,
                        dt_min: ts.dt_min,
                    });
                }
            }
        };
        if self.chain.set_steady_mode() {
            self.jac.update_transient(0.0, self.chain.transient_mask());
        }
        self.newton.set_max_age(self.config.jacobian.ss_age);
        result
    }

    /// Steady solve with time-stepping fallback, refining the grid after each converged
    /// solve when `refine_grid` is set and refinement is enabled in the config.
    pub fn solve(&mut self, refine_grid: bool) -> Result<SolveOutcome, SolverError> {
        let refine_grid = refine_grid && self.config.refine.enabled;
        let dt_max = self.config.time_stepping.dt_max;
        let max_attempts = self.config.time_stepping.max_steady_attempts;
        let mut dt = self.dt;
        let mut refined = false;
        loop {
            let mut istep = 0;
            let mut nsteps = self.steps[0];
            let mut failed_attempts = 0;
            loop {
                self.counters.steady_attempts += 1;
                info!(
                    "attempt Newton solution of the steady-state problem on {} points",
                    self.chain.points()
                );
                let outcome = self.newton_solve()?;
                if outcome.is_converged() {
                    info!("steady solve succeeded: {:?}", outcome);
                    break;
                }
                failed_attempts += 1;
                if failed_attempts > max_attempts {
                    warn!("giving up after {} failed steady attempts", failed_attempts);
                    self.save_stats();
                    return Ok(SolveOutcome::FailedStepLimit);
                }
                info!(
                    "steady solve failed ({:?}); taking {} time steps with dt = {:.3e}",
                    outcome, nsteps, dt
                );
                match self.time_step(nsteps, dt) {
                    Ok(next_dt) => dt = next_dt,
                    Err(SolverError::TimeStepUnderflow { dt, dt_min }) => {
                        error!("time step {:e} fell below the minimum {:e}", dt, dt_min);
                        self.save_stats();
                        return Ok(SolveOutcome::FailedTimeStepUnderflow);
                    }
                    Err(e) => return Err(e),
                }
                if let Ok(norm) = self.ssnorm() {
                    info!("steady residual norm after time stepping: {:.3e}", norm);
                }
                istep += 1;
                nsteps = self.steps[istep.min(self.steps.len() - 1)];
                dt = dt.min(dt_max);
            }
            self.save_stats();
            if !refine_grid {
                break;
            }
            let summary = self.refine()?;
            if summary.changed() {
                refined = true;
                continue;
            }
            if summary.max_points_reached {
                warn!("maximum number of grid points reached");
            }
            break;
        }
        Ok(if refined {
            SolveOutcome::ConvergedAfterRefinement
        } else {
            SolveOutcome::Converged
        })
    }

    /// Lets every domain refine its grid around the current solution. New points are
    /// interval midpoints with linearly interpolated values; untouched points keep their
    /// values.
    pub fn refine(&mut self) -> Result<RefineSummary, SolverError> {
        let mut summary = RefineSummary::default();
        let mut grids: Vec<Option<Vec<f64>>> = Vec::with_capacity(self.chain.n_domains());
        let mut xnew: Vec<f64> = Vec::with_capacity(self.x.len());
        for (i, domain) in self.chain.domains().enumerate() {
            let (np, nv) = (domain.n_points(), domain.n_components());
            let start = self.chain.start(i);
            let block = &self.x.as_slice()[start..start + np * nv];
            let decision = domain.refinement_decision(block);
            summary.max_points_reached |= decision.max_points_reached;
            if decision.is_empty() {
                xnew.extend_from_slice(block);
                grids.push(None);
                continue;
            }
            if let Some(refiner) = domain.refiner() {
                refiner.show(domain.name(), &decision);
            }
            summary.inserted += decision.insert.len();
            summary.removed += decision.remove.len();
            let z = domain.grid();
            let mut znew = Vec::with_capacity(np + decision.insert.len());
            for m in 0..np {
                if !decision.remove.contains(&m) {
                    znew.push(z[m]);
                    xnew.extend_from_slice(&block[nv * m..nv * (m + 1)]);
                }
                if decision.insert.contains(&m) && m + 1 < np {
                    znew.push(0.5 * (z[m] + z[m + 1]));
                    xnew.extend((0..nv).map(|n| 0.5 * (block[nv * m + n] + block[nv * (m + 1) + n])));
                }
            }
            grids.push(Some(znew));
        }
        if !summary.changed() {
            return Ok(summary);
        }
        self.replace_grids(&grids)?;
        self.chain.resize()?;
        let size = self.chain.size();
        self.x = DVector::from_vec(xnew);
        self.xnew = DVector::zeros(size);
        self.jac.resize(&self.chain);
        self.newton.resize(size);
        info!(
            "grid refined: {} points inserted, {} removed, {} points in total",
            summary.inserted,
            summary.removed,
            self.chain.points()
        );
        Ok(summary)
    }

    /// Installs new grids (`None` keeps a domain's grid). Every grid is checked before any
    /// domain changes; if a domain still rejects its grid the chain is left stale.
    fn replace_grids(&mut self, grids: &[Option<Vec<f64>>]) -> Result<(), SolverError> {
        for (i, grid) in grids.iter().enumerate() {
            if let Some(z) = grid {
                self.chain.domain(i).check_grid(z)?;
            }
        }
        for (i, grid) in grids.iter().enumerate() {
            if let Some(z) = grid {
                if let Err(e) = self.chain.domain_mut(i).setup_grid(z) {
                    self.chain.invalidate();
                    self.jac.invalidate();
                    return Err(e.into());
                }
            }
        }
        Ok(())
    }

    fn save_stats(&mut self) {
        self.stats.push(GridStats {
            points: self.chain.points(),
            jac_evals: self.jac.n_evals(),
            jac_time: self.jac.elapsed(),
            func_evals: self.chain.n_evals(),
            func_time: self.chain.eval_time(),
            newton_time: self.newton.elapsed(),
            time_steps: self.counters.time_steps,
            steady_attempts: self.counters.steady_attempts,
        });
        self.chain.reset_stats();
        self.jac.reset_stats();
        self.newton.reset_stats();
        self.counters = GridCounters::default();
    }

    pub fn write_stats(&self) {
        println!("\n>>> solver statistics per grid");
        self.stats.pretty_print().printstd();
    }

    /// Current solution as an archive entry.
    pub fn to_saved(&self, description: &str) -> SavedSolution {
        let domains = self
            .chain
            .domains()
            .enumerate()
            .map(|(i, d)| {
                let (start, nv, np) = (self.chain.start(i), d.n_components(), d.n_points());
                SavedDomain {
                    name: d.name().to_owned(),
                    components: (0..nv).map(|n| d.component_name(n)).collect(),
                    grid: d.grid().to_vec(),
                    values: (0..nv)
                        .map(|n| (0..np).map(|j| self.x[start + nv * j + n]).collect())
                        .collect(),
                }
            })
            .collect();
        SavedSolution {
            description: description.to_owned(),
            domains,
        }
    }

    /// Stores the solution under `id` in a JSON archive, keeping other entries of an
    /// existing file.
    pub fn save<P: AsRef<Path>>(&self, path: P, id: &str, description: &str) -> Result<(), SolverError> {
        let path = path.as_ref();
        let mut archive: SolutionArchive = if path.exists() {
            serde_json::from_str(&fs::read_to_string(path)?)?
        } else {
            SolutionArchive::new()
        };
        archive.insert(id.to_owned(), self.to_saved(description));
        fs::write(path, serde_json::to_string_pretty(&archive)?)?;
        info!("solution '{}' saved to {}", id, path.display());
        Ok(())
    }

    /// Restores the solution `id` from a JSON archive, including the grids. Returns the
    /// stored description.
    pub fn restore<P: AsRef<Path>>(&mut self, path: P, id: &str) -> Result<String, SolverError> {
        let text = fs::read_to_string(path.as_ref())?;
        let mut archive: SolutionArchive = serde_json::from_str(&text)?;
        let saved = archive
            .remove(id)
            .ok_or_else(|| SolverError::RestoreMismatch(format!("no solution with id '{}'", id)))?;
        if saved.domains.len() != self.chain.n_domains() {
            return Err(SolverError::RestoreMismatch(format!(
                "{} domains saved, chain has {}",
                saved.domains.len(),
                self.chain.n_domains()
            )));
        }
        for (i, sd) in saved.domains.iter().enumerate() {
            let d = self.chain.domain(i);
            if sd.name != d.name() || sd.values.len() != d.n_components() {
                return Err(SolverError::RestoreMismatch(format!(
                    "saved domain '{}' with {} components does not match '{}' with {}",
                    sd.name,
                    sd.values.len(),
                    d.name(),
                    d.n_components()
                )));
            }
            if sd.values.iter().any(|v| v.len() != sd.grid.len()) {
                return Err(SolverError::RestoreMismatch(format!(
                    "values of domain '{}' do not match its grid",
                    sd.name
                )));
            }
        }
        let grids: Vec<Option<Vec<f64>>> = saved
            .domains
            .iter()
            .enumerate()
            .map(|(i, sd)| (self.chain.domain(i).grid() != sd.grid.as_slice()).then(|| sd.grid.clone()))
            .collect();
        self.replace_grids(&grids)?;
        self.resize()?;
        for (i, sd) in saved.domains.iter().enumerate() {
            let (start, nv) = (self.chain.start(i), sd.values.len());
            for (n, values) in sd.values.iter().enumerate() {
                for (j, v) in values.iter().enumerate() {
                    self.x[start + nv * j + n] = *v;
                }
            }
        }
        info!("solution '{}' restored", id);
        Ok(saved.description)
    }
}

/// piecewise linear interpolation, constant beyond the end points
fn linear_interp(x: f64, xs: &[f64], ys: &[f64]) -> f64 {
    let last = xs.len() - 1;
    if x <= xs[0] {
        return ys[0];
    }
    if x >= xs[last] {
        return ys[last];
    }
    let k = xs.iter().position(|&xi| xi > x).unwrap_or(last);
    let (x0, x1) = (xs[k - 1], xs[k]);
    if x1 == x0 {
        return ys[k];
    }
    ys[k - 1] + (ys[k] - ys[k - 1]) * (x - x0) / (x1 - x0)
}
