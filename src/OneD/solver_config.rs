//! Solver settings, grouped by the layer that reads them, with serde (de)serialization.
//!
//! Every field has a default, so a partial JSON document is a valid configuration:
//! ```
//! use MultiDomain1D::OneD::solver_config::SolverConfig;
//! let config = SolverConfig::from_json_str(r#"{"time_stepping": {"initial_dt": 1e-4}}"#).unwrap();
//! assert_eq!(config.time_stepping.initial_dt, 1e-4);
//! assert_eq!(config.newton.max_damp_iterations, 7);
//! ```
use crate::OneD::errors::SolverError;
use crate::OneD::refine::RefineCriteria;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// weighted norm used for the Newton convergence test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum StepNorm {
    #[default]
    WeightedMax,
    WeightedRms,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewtonConfig {
    pub max_iterations: usize,
    pub max_damp_iterations: usize,
    /// divisor of the damping coefficient between trials
    pub damp_factor: f64,
    /// steps with a weighted norm at or below this are converged
    pub convergence_tolerance: f64,
    /// Jacobian rebuilds allowed after damping failures within one solve
    pub max_jacobian_reevaluations: usize,
    pub norm: StepNorm,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            max_damp_iterations: 7,
            damp_factor: 2.0_f64.sqrt(),
            convergence_tolerance: 1.0,
            max_jacobian_reevaluations: 4,
            norm: StepNorm::WeightedMax,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JacobianConfig {
    /// relative perturbation
    pub rtol: f64,
    /// absolute perturbation
    pub atol: f64,
    /// maximum Jacobian age in steady mode
    pub ss_age: usize,
    /// maximum Jacobian age while time stepping; defaults to `ss_age`
    pub ts_age: Option<usize>,
}

impl Default for JacobianConfig {
    fn default() -> Self {
        Self {
            rtol: f64::EPSILON.sqrt(),
            atol: f64::EPSILON.sqrt(),
            ss_age: 20,
            ts_age: None,
        }
    }
}

impl JacobianConfig {
    pub fn ts_age(&self) -> usize {
        self.ts_age.unwrap_or(self.ss_age)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeSteppingConfig {
    pub initial_dt: f64,
    pub dt_min: f64,
    pub dt_max: f64,
    /// factor applied to dt after a failed step
    pub dt_shrink: f64,
    /// factor applied to dt after a successful step
    pub dt_growth: f64,
    /// number of steps in successive batches; the last entry repeats
    pub time_steps: Vec<usize>,
    /// failed steady attempts tolerated on one grid
    pub max_steady_attempts: usize,
}

impl Default for TimeSteppingConfig {
    fn default() -> Self {
        Self {
            initial_dt: 1.0e-5,
            dt_min: 1.0e-16,
            dt_max: 1.0e8,
            dt_shrink: 0.5,
            dt_growth: 1.5,
            time_steps: vec![1, 2, 5, 10],
            max_steady_attempts: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefineConfig {
    /// `false` turns off refinement in `Sim1D::solve` even when the caller asks for it
    pub enabled: bool,
    /// applied to every domain that carries a refiner when the solver is created
    pub criteria: Option<RefineCriteria>,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            criteria: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SolverConfig {
    pub newton: NewtonConfig,
    pub jacobian: JacobianConfig,
    pub time_stepping: TimeSteppingConfig,
    pub refine: RefineConfig,
}

impl SolverConfig {
    pub fn from_json_str(s: &str) -> Result<Self, SolverError> {
        let config: SolverConfig = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SolverError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), SolverError> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), SolverError> {
        let err = |msg: String| Err(SolverError::Config(msg));
        let n = &self.newton;
        if n.max_iterations == 0 {
            return err("newton.max_iterations must be positive".to_owned());
        }
        if n.max_damp_iterations == 0 {
            return err("newton.max_damp_iterations must be positive".to_owned());
        }
        if n.damp_factor <= 1.0 {
            return err(format!("newton.damp_factor must exceed 1, got {}", n.damp_factor));
        }
        if n.convergence_tolerance <= 0.0 {
            return err("newton.convergence_tolerance must be positive".to_owned());
        }
        let j = &self.jacobian;
        if j.rtol <= 0.0 || j.atol <= 0.0 {
            return err("jacobian perturbation tolerances must be positive".to_owned());
        }
        if j.ss_age == 0 || j.ts_age() == 0 {
            return err("jacobian ages must be positive".to_owned());
        }
        let t = &self.time_stepping;
        if !(t.dt_min > 0.0 && t.dt_min <= t.initial_dt && t.initial_dt <= t.dt_max) {
            return err(format!(
                "time steps must satisfy 0 < dt_min <= initial_dt <= dt_max, got {} / {} / {}",
                t.dt_min, t.initial_dt, t.dt_max
            ));
        }
        if !(t.dt_shrink > 0.0 && t.dt_shrink < 1.0) {
            return err(format!("time_stepping.dt_shrink must lie in (0, 1), got {}", t.dt_shrink));
        }
        if t.dt_growth < 1.0 {
            return err(format!("time_stepping.dt_growth must be at least 1, got {}", t.dt_growth));
        }
        if t.time_steps.is_empty() || t.time_steps.contains(&0) {
            return err("time_stepping.time_steps must be a non-empty list of positive counts".to_owned());
        }
        if let Some(criteria) = &self.refine.criteria {
            criteria.validate().map_err(SolverError::Config)?;
        }
        Ok(())
    }
}
