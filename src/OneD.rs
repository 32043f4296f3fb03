//! # One-dimensional multi-domain solver
//!
//! Steady and pseudo-transient solution of equation sets discretized on a chain of
//! coupled 1-D domains (inlet, reacting column, surface, outlet, ...).
//!
//! Layers, from the outside in:
//! - [`sim1d::Sim1D`]: steady Newton solves with time-stepping fallback and grid refinement;
//! - [`multi_newton::MultiNewton`]: damped Newton iterations with bounded steps;
//! - [`multi_jac::MultiJac`]: banded finite-difference Jacobian;
//! - [`one_dim::OneDim`]: the domain chain, its location map and residual evaluation;
//! - [`domain::Domain`]: what a domain has to provide.
//!
//! # Example
//! ```
//! use MultiDomain1D::OneD::boundaries::{Boundary, Inlet, Outlet};
//! use MultiDomain1D::OneD::domain::Domain;
//! use MultiDomain1D::OneD::one_dim::OneDim;
//! use MultiDomain1D::OneD::reacting_column::{ColumnEnd, ReactingColumn};
//! use MultiDomain1D::OneD::sim1d::Sim1D;
//! let inlet = Boundary::from(Inlet::new("inlet", vec![1.0, 1.0]));
//! let column = ReactingColumn::new("column", 21, 1.0)
//!     .unwrap()
//!     .with_ends(ColumnEnd::Neighbour, ColumnEnd::ZeroGradient, (true, true));
//! let outlet = Boundary::from(Outlet::new("outlet", 2));
//! let domains: Vec<Box<dyn Domain>> = vec![Box::new(inlet), Box::new(column), Box::new(outlet)];
//! let chain = OneDim::from_domains(domains).unwrap();
//! assert_eq!(chain.size(), 2 + 21 * 2 + 2);
//! let mut sim = Sim1D::new(chain).unwrap();
//! assert!(sim.solve(false).unwrap().is_converged());
//! ```
pub mod band_matrix;
pub mod boundaries;
pub mod domain;
pub mod errors;
pub mod multi_jac;
pub mod multi_newton;
pub mod one_dim;
pub mod reacting_column;
pub mod refine;
pub mod sim1d;
pub mod solver_config;
pub mod stats;

mod multi_newton_tests;
mod one_dim_tests;
#[cfg(test)]
mod test_domains;
