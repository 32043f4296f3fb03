//! # Domain contract
//!
//! A domain is one physical sub-region of the 1-D problem: an inlet, a reacting column, a
//! surface, an outlet. It owns `n_components()` unknowns at each of its `n_points()` grid
//! points and evaluates the residual rows of those unknowns. The chain ([`OneDim`]) lays
//! domains out left to right and gives every domain a read-only view of its own block,
//! the previous time level, and the adjacent point of each neighbour.
//!
//! ## Coupling
//! [`Domain::coupling`] declares how many components the domain reads from the neighbour
//! point on each side (`None` = this side is the end of the chain). The chain checks these
//! declarations against the actual neighbours before building the location map.
//!
//! ## Residual rows
//! `eval` must write rows only for the local points `jmin..=jmax` and only of its own
//! block. The chain adds the pseudo-time term `-rdt * (x - x_prev)` for the rows that
//! `is_transient` marks; a domain never adds it itself.
//!
//! [`OneDim`]: crate::OneD::one_dim::OneDim
// the enum_dispatch impl for `Boundary` is generated here
use crate::OneD::boundaries::{Boundary, Inlet, Outlet, Surface};
use crate::OneD::errors::DomainError;
use crate::OneD::refine::{RefineDecision, Refiner};
use enum_dispatch::enum_dispatch;

/// number of components a domain reads from each neighbour; `None` marks a chain end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Coupling {
    pub left: Option<usize>,
    pub right: Option<usize>,
}

impl Coupling {
    pub fn new(left: Option<usize>, right: Option<usize>) -> Self {
        Self { left, right }
    }
    /// domain that forms a whole chain by itself
    pub fn isolated() -> Self {
        Self::default()
    }
}

/// what a domain sees during one residual evaluation
#[derive(Debug, Clone, Copy)]
pub struct ResidualArgs<'a> {
    /// own block, point-major: `x[nv*j + n]`
    pub x: &'a [f64],
    /// own block at the previous time level
    pub x_prev: &'a [f64],
    /// last point of the left neighbour
    pub left: Option<&'a [f64]>,
    /// first point of the right neighbour
    pub right: Option<&'a [f64]>,
    /// reciprocal time step, 0 in steady mode
    pub rdt: f64,
    /// first local point whose rows must be written
    pub jmin: usize,
    /// last local point whose rows must be written
    pub jmax: usize,
}

impl<'a> ResidualArgs<'a> {
    pub fn points(&self) -> std::ops::RangeInclusive<usize> {
        self.jmin..=self.jmax
    }
}

#[enum_dispatch]
pub trait Domain {
    fn name(&self) -> &str;
    /// unknowns per grid point
    fn n_components(&self) -> usize;
    fn n_points(&self) -> usize;
    fn coupling(&self) -> Coupling;
    fn grid(&self) -> &[f64];
    /// replaces the grid; arrays sized by the point count are resized accordingly
    fn setup_grid(&mut self, z: &[f64]) -> Result<(), DomainError>;
    fn eval(&self, args: &ResidualArgs<'_>, rsd: &mut [f64]) -> Result<(), DomainError>;

    /// Err if `setup_grid(z)` would reject `z`; leaves the domain untouched
    fn check_grid(&self, _z: &[f64]) -> Result<(), DomainError> {
        Ok(())
    }
    fn component_name(&self, n: usize) -> String {
        format!("component {}", n)
    }
    /// half-bandwidth of the domain's own Jacobian block; `None` means `2*nv - 1`
    fn bandwidth(&self) -> Option<usize> {
        None
    }
    /// whether row (n, j) carries a time derivative
    fn is_transient(&self, _n: usize, _j: usize) -> bool {
        true
    }
    fn initial_value(&self, _n: usize, _j: usize) -> f64 {
        0.0
    }
    fn lower_bound(&self, _n: usize) -> f64 {
        -1.0e20
    }
    fn upper_bound(&self, _n: usize) -> f64 {
        1.0e20
    }
    fn rtol(&self, _n: usize) -> f64 {
        1.0e-4
    }
    fn atol(&self, _n: usize) -> f64 {
        1.0e-9
    }
    fn refiner(&self) -> Option<&Refiner> {
        None
    }
    fn refiner_mut(&mut self) -> Option<&mut Refiner> {
        None
    }
    /// points to insert and remove given the local solution block
    fn refinement_decision(&self, x: &[f64]) -> RefineDecision {
        match self.refiner() {
            Some(refiner) => {
                let names: Vec<String> = (0..self.n_components())
                    .map(|n| self.component_name(n))
                    .collect();
                refiner.analyze(self.grid(), x, &names)
            }
            None => RefineDecision::default(),
        }
    }
}
