//! Error types of the one-dimensional solver stack.
//!
//! Errors are split by layer. `DomainError` comes out of a residual evaluation and is
//! always recoverable: the Newton iterator treats it like an unacceptable residual.
//! `TopologyError` is raised before a location map is built and is fatal for the
//! chain it describes. `SolverError` is what escapes `Sim1D` to the caller.
use crate::Thermodynamics::eos::EosError;
use crate::Thermodynamics::species_thermo::ThermoError;
use thiserror::Error;

/// failure of a domain residual evaluation at a given state
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("domain '{domain}': {source}")]
    EquationOfState {
        domain: String,
        #[source]
        source: EosError,
    },
    #[error("domain '{domain}': {source}")]
    Thermo {
        domain: String,
        #[source]
        source: ThermoError,
    },
    #[error("domain '{domain}': non-finite residual in component {component} at point {point}")]
    NonFinite {
        domain: String,
        component: usize,
        point: usize,
    },
    #[error("domain '{domain}': {message}")]
    InvalidState { domain: String, message: String },
}

/// inconsistent arrangement of domains in a chain
#[derive(Debug, Error, PartialEq)]
pub enum TopologyError {
    #[error("the domain chain is empty")]
    EmptyChain,
    #[error("domain '{0}' has no grid points")]
    EmptyDomain(String),
    #[error("domain '{0}' has no components")]
    NoComponents(String),
    #[error("domain '{domain}' expects a neighbour on its {side} side, but none is present")]
    DanglingCoupling { domain: String, side: Side },
    #[error("domain '{domain}' does not couple on its {side} side, but '{neighbour}' is attached there")]
    UnexpectedNeighbour {
        domain: String,
        neighbour: String,
        side: Side,
    },
    #[error(
        "domain '{domain}' reads {expected} components from '{neighbour}' on its {side} side, but the adjacent point has {found}"
    )]
    CouplingMismatch {
        domain: String,
        neighbour: String,
        side: Side,
        expected: usize,
        found: usize,
    },
    #[error("no domain named '{0}'")]
    UnknownDomain(String),
    #[error("domain index {index} out of range for a chain of {len} domains")]
    IndexOutOfRange { index: usize, len: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

/// errors of the banded matrix storage and its LU factorization
#[derive(Debug, Error, PartialEq)]
pub enum BandMatrixError {
    #[error("Jacobian is singular: zero pivot in row {row}")]
    Singular { row: usize },
    #[error("element ({row}, {col}) lies outside the band (kl = {kl}, ku = {ku})")]
    OutOfBand {
        row: usize,
        col: usize,
        kl: usize,
        ku: usize,
    },
    #[error("right-hand side has length {found}, matrix has {expected} rows")]
    DimensionMismatch { expected: usize, found: usize },
}

/// errors escaping the continuation driver
#[derive(Debug, Error)]
pub enum SolverError {
    #[error(transparent)]
    Topology(#[from] TopologyError),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    BandMatrix(#[from] BandMatrixError),
    #[error("invalid solver configuration: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("component {component} out of range for domain '{domain}' ({n_components} components)")]
    ComponentOutOfRange {
        domain: String,
        component: usize,
        n_components: usize,
    },
    #[error("point {point} out of range for domain '{domain}' ({n_points} points)")]
    PointOutOfRange {
        domain: String,
        point: usize,
        n_points: usize,
    },
    #[error("solution vector has length {found}, the chain has {expected} unknowns")]
    SizeMismatch { expected: usize, found: usize },
    #[error("invalid profile: {0}")]
    InvalidProfile(String),
    #[error("time step {dt:e} fell below the minimum {dt_min:e}")]
    TimeStepUnderflow { dt: f64, dt_min: f64 },
    #[error("saved solution does not match the chain: {0}")]
    RestoreMismatch(String),
}
