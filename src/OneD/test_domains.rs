//! Small domains shared by the solver tests.
use crate::OneD::domain::{Coupling, Domain, ResidualArgs};
use crate::OneD::errors::DomainError;
use nalgebra::{DMatrix, DVector};

/// generic block with a weakly nonlinear residual coupled to both neighbours
pub struct Block {
    pub name: String,
    pub np: usize,
    pub nv: usize,
    pub coupling: Coupling,
    pub z: Vec<f64>,
}

impl Block {
    pub fn new(name: &str, np: usize, nv: usize, coupling: Coupling) -> Self {
        Self {
            name: name.to_owned(),
            np,
            nv,
            coupling,
            z: (0..np).map(|j| j as f64).collect(),
        }
    }
}

impl Domain for Block {
    fn name(&self) -> &str {
        &self.name
    }
    fn n_components(&self) -> usize {
        self.nv
    }
    fn n_points(&self) -> usize {
        self.np
    }
    fn coupling(&self) -> Coupling {
        self.coupling
    }
    fn grid(&self) -> &[f64] {
        &self.z
    }
    fn setup_grid(&mut self, z: &[f64]) -> Result<(), DomainError> {
        self.z = z.to_vec();
        self.np = z.len();
        Ok(())
    }
    fn eval(&self, args: &ResidualArgs<'_>, rsd: &mut [f64]) -> Result<(), DomainError> {
        let nv = self.nv;
        let x = args.x;
        for j in args.points() {
            for n in 0..nv {
                let k = nv * j + n;
                let mut r = 2.0 * x[k] + 0.1 * x[k] * x[k] - (n + 1) as f64;
                if j > 0 {
                    r -= 0.5 * x[k - nv];
                } else if let Some(left) = args.left {
                    r -= 0.5 * left[left.len() - 1];
                }
                if j + 1 < self.np {
                    r -= 0.25 * x[k + nv];
                } else if let Some(right) = args.right {
                    r -= 0.25 * right[0];
                }
                if n > 0 {
                    r += 0.3 * x[k - 1];
                }
                rsd[k] = r;
            }
        }
        Ok(())
    }
    fn initial_value(&self, n: usize, j: usize) -> f64 {
        0.1 * (n + j) as f64
    }
}

/// one-point domain with residual `A x - b`
pub struct LinearSystem {
    pub a: DMatrix<f64>,
    pub b: DVector<f64>,
    z: Vec<f64>,
}

impl LinearSystem {
    pub fn new(a: DMatrix<f64>, b: DVector<f64>) -> Self {
        Self { a, b, z: vec![0.0] }
    }
}

impl Domain for LinearSystem {
    fn name(&self) -> &str {
        "linear"
    }
    fn n_components(&self) -> usize {
        self.b.len()
    }
    fn n_points(&self) -> usize {
        1
    }
    fn coupling(&self) -> Coupling {
        Coupling::isolated()
    }
    fn grid(&self) -> &[f64] {
        &self.z
    }
    fn setup_grid(&mut self, _z: &[f64]) -> Result<(), DomainError> {
        Ok(())
    }
    fn eval(&self, args: &ResidualArgs<'_>, rsd: &mut [f64]) -> Result<(), DomainError> {
        let x = DVector::from_column_slice(args.x);
        let r = &self.a * x - &self.b;
        rsd.copy_from_slice(r.as_slice());
        Ok(())
    }
}

/// one unknown with residual `f(x)`, optionally bounded from below
pub struct Scalar {
    pub f: fn(f64) -> Result<f64, DomainError>,
    pub lower: f64,
    pub initial: f64,
    z: Vec<f64>,
}

impl Scalar {
    pub fn new(f: fn(f64) -> Result<f64, DomainError>, lower: f64, initial: f64) -> Self {
        Self {
            f,
            lower,
            initial,
            z: vec![0.0],
        }
    }
}

impl Domain for Scalar {
    fn name(&self) -> &str {
        "scalar"
    }
    fn n_components(&self) -> usize {
        1
    }
    fn n_points(&self) -> usize {
        1
    }
    fn coupling(&self) -> Coupling {
        Coupling::isolated()
    }
    fn grid(&self) -> &[f64] {
        &self.z
    }
    fn setup_grid(&mut self, _z: &[f64]) -> Result<(), DomainError> {
        Ok(())
    }
    fn eval(&self, args: &ResidualArgs<'_>, rsd: &mut [f64]) -> Result<(), DomainError> {
        rsd[0] = (self.f)(args.x[0])?;
        Ok(())
    }
    fn initial_value(&self, _n: usize, _j: usize) -> f64 {
        self.initial
    }
    fn lower_bound(&self, _n: usize) -> f64 {
        self.lower
    }
}
