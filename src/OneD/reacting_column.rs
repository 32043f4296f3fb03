//! # Reacting column
//!
//! A convection-diffusion-reaction domain with two components per point, temperature `T`
//! and reactant mass fraction `Y`:
//!
//! ```text
//! u dT/dz = alpha d2T/dz2 + q w (cp_ref / cp(T)) (rho_ref / rho(T))
//! u dY/dz = D d2Y/dz2 - w,        w = a Y exp(-Ta / T)
//! ```
//!
//! Convection is upwinded, diffusion uses the three-point stencil of a nonuniform grid. The
//! heat-release scaling by `cp(T)` uses an optional species thermo model and the density
//! scaling an optional equation of state; without them the factors are 1. At the left end
//! the column takes the values of the last point of its left neighbour; the right end
//! either takes the values of the right neighbour or has zero gradient.
use crate::OneD::domain::{Coupling, Domain, ResidualArgs};
use crate::OneD::errors::DomainError;
use crate::OneD::refine::Refiner;
use crate::Thermodynamics::eos::EquationOfState;
use crate::Thermodynamics::species_thermo::{SpeciesThermo, ThermoModel};
use serde::{Deserialize, Serialize};

pub const T: usize = 0;
pub const Y: usize = 1;
const NV: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnProperties {
    pub velocity: f64,
    /// thermal diffusivity
    pub conductivity: f64,
    pub diffusivity: f64,
    pub heat_release: f64,
    pub pre_exponential: f64,
    pub activation_temperature: f64,
    /// heat capacity at which `heat_release` is given, J/(mol K)
    pub reference_cp: f64,
    /// density at which `heat_release` is given, kg/m3
    pub reference_density: f64,
    /// pressure for the density closure, Pa
    pub pressure: f64,
}

impl Default for ColumnProperties {
    fn default() -> Self {
        Self {
            velocity: 1.0,
            conductivity: 1.0,
            diffusivity: 1.0,
            heat_release: 0.0,
            pre_exponential: 0.0,
            activation_temperature: 0.0,
            reference_cp: 29.1,
            reference_density: 1.0,
            pressure: 101325.0,
        }
    }
}

/// condition applied at an end of the column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnEnd {
    /// values of the adjacent neighbour point
    Neighbour,
    ZeroGradient,
}

pub struct ReactingColumn {
    name: String,
    z: Vec<f64>,
    pub properties: ColumnProperties,
    pub left_end: ColumnEnd,
    pub right_end: ColumnEnd,
    /// whether a neighbour is attached on each side
    coupled: (bool, bool),
    thermo: Option<ThermoModel>,
    eos: Option<Box<dyn EquationOfState>>,
    refiner: Refiner,
    t_bounds: (f64, f64),
    y_bounds: (f64, f64),
    initial: [f64; NV],
}

impl ReactingColumn {
    /// column of `n_points` uniformly spaced points on `[0, length]`
    pub fn new(name: &str, n_points: usize, length: f64) -> Result<Self, DomainError> {
        let z: Vec<f64> = (0..n_points)
            .map(|j| length * j as f64 / (n_points.max(2) - 1) as f64)
            .collect();
        let mut column = Self {
            name: name.to_owned(),
            z: Vec::new(),
            properties: ColumnProperties::default(),
            left_end: ColumnEnd::Neighbour,
            right_end: ColumnEnd::Neighbour,
            coupled: (true, true),
            thermo: None,
            eos: None,
            refiner: Refiner::new(NV),
            t_bounds: (1.0e-3, 1.0e5),
            y_bounds: (-1.0e-7, 1.0e5),
            initial: [1.0, 0.0],
        };
        column.setup_grid(&z)?;
        Ok(column)
    }

    pub fn with_properties(mut self, properties: ColumnProperties) -> Self {
        self.properties = properties;
        self
    }

    /// Sets the conditions at both ends. A `Neighbour` end requires a neighbour on that
    /// side; a `ZeroGradient` end at the end of the chain has none.
    pub fn with_ends(mut self, left: ColumnEnd, right: ColumnEnd, coupled: (bool, bool)) -> Self {
        self.left_end = left;
        self.right_end = right;
        self.coupled = coupled;
        self
    }

    pub fn with_thermo(mut self, thermo: ThermoModel) -> Self {
        self.thermo = Some(thermo);
        self
    }

    pub fn with_eos(mut self, eos: Box<dyn EquationOfState>) -> Self {
        self.eos = Some(eos);
        self
    }

    pub fn with_initial_values(mut self, t: f64, y: f64) -> Self {
        self.initial = [t, y];
        self
    }

    pub fn set_temperature_bounds(&mut self, lower: f64, upper: f64) {
        self.t_bounds = (lower, upper);
    }

    /// reaction rate at temperature `t` and mass fraction `y`
    fn rate(&self, t: f64, y: f64, j: usize) -> Result<f64, DomainError> {
        if !(t > 0.0) {
            return Err(DomainError::InvalidState {
                domain: self.name.clone(),
                message: format!("non-positive temperature {} at point {}", t, j),
            });
        }
        let p = &self.properties;
        Ok(p.pre_exponential * y * (-p.activation_temperature / t).exp())
    }

    /// heat-release scaling by heat capacity and density at temperature `t`
    fn heat_factor(&self, t: f64) -> Result<f64, DomainError> {
        let p = &self.properties;
        let mut factor = 1.0;
        if let Some(thermo) = &self.thermo {
            let cp = thermo.cp(t).map_err(|source| DomainError::Thermo {
                domain: self.name.clone(),
                source,
            })?;
            factor *= p.reference_cp / cp;
        }
        if let Some(eos) = &self.eos {
            let rho = eos
                .density(t, p.pressure, p.reference_density)
                .map_err(|source| DomainError::EquationOfState {
                    domain: self.name.clone(),
                    source,
                })?;
            factor *= p.reference_density / rho;
        }
        Ok(factor)
    }

    fn end_residual(
        &self,
        end: ColumnEnd,
        neighbour: Option<&[f64]>,
        x: &[f64],
        j: usize,
        inner: usize,
        rsd: &mut [f64],
    ) -> Result<(), DomainError> {
        match end {
            ColumnEnd::Neighbour => {
                let nb = neighbour.ok_or_else(|| DomainError::InvalidState {
                    domain: self.name.clone(),
                    message: "end condition refers to a missing neighbour".to_owned(),
                })?;
                for n in 0..NV {
                    rsd[NV * j + n] = x[NV * j + n] - nb[n];
                }
            }
            ColumnEnd::ZeroGradient => {
                for n in 0..NV {
                    rsd[NV * j + n] = x[NV * j + n] - x[NV * inner + n];
                }
            }
        }
        Ok(())
    }
}

impl Domain for ReactingColumn {
    fn name(&self) -> &str {
        &self.name
    }
    fn n_components(&self) -> usize {
        NV
    }
    fn n_points(&self) -> usize {
        self.z.len()
    }
    fn coupling(&self) -> Coupling {
        Coupling::new(self.coupled.0.then_some(NV), self.coupled.1.then_some(NV))
    }
    fn grid(&self) -> &[f64] {
        &self.z
    }
    fn setup_grid(&mut self, z: &[f64]) -> Result<(), DomainError> {
        self.check_grid(z)?;
        self.z = z.to_vec();
        Ok(())
    }
    fn check_grid(&self, z: &[f64]) -> Result<(), DomainError> {
        if z.len() < 3 {
            return Err(DomainError::InvalidState {
                domain: self.name.clone(),
                message: format!("a column needs at least 3 points, got {}", z.len()),
            });
        }
        if z.windows(2).any(|w| w[1] <= w[0]) {
            return Err(DomainError::InvalidState {
                domain: self.name.clone(),
                message: "grid must be strictly increasing".to_owned(),
            });
        }
        Ok(())
    }

    fn eval(&self, args: &ResidualArgs<'_>, rsd: &mut [f64]) -> Result<(), DomainError> {
        let x = args.x;
        let z = &self.z;
        let last = z.len() - 1;
        let p = &self.properties;
        for j in args.points() {
            if j == 0 {
                self.end_residual(self.left_end, args.left, x, 0, 1, rsd)?;
                continue;
            }
            if j == last {
                self.end_residual(self.right_end, args.right, x, last, last - 1, rsd)?;
                continue;
            }
            let (dzm, dzp) = (z[j] - z[j - 1], z[j + 1] - z[j]);
            let c = 2.0 / (dzm + dzp);
            let value = |n: usize, k: usize| x[NV * k + n];
            let convection = |n: usize| {
                if p.velocity >= 0.0 {
                    p.velocity * (value(n, j) - value(n, j - 1)) / dzm
                } else {
                    p.velocity * (value(n, j + 1) - value(n, j)) / dzp
                }
            };
            let diffusion = |n: usize| {
                c * ((value(n, j + 1) - value(n, j)) / dzp - (value(n, j) - value(n, j - 1)) / dzm)
            };
            let (t, y) = (value(T, j), value(Y, j));
            let w = self.rate(t, y, j)?;
            let heat = if p.heat_release != 0.0 && w != 0.0 {
                p.heat_release * w * self.heat_factor(t)?
            } else {
                0.0
            };
            rsd[NV * j + T] = -convection(T) + p.conductivity * diffusion(T) + heat;
            rsd[NV * j + Y] = -convection(Y) + p.diffusivity * diffusion(Y) - w;
            for n in 0..NV {
                if !rsd[NV * j + n].is_finite() {
                    return Err(DomainError::NonFinite {
                        domain: self.name.clone(),
                        component: n,
                        point: j,
                    });
                }
            }
        }
        Ok(())
    }

    fn component_name(&self, n: usize) -> String {
        match n {
            T => "T".to_owned(),
            Y => "Y".to_owned(),
            _ => format!("component {}", n),
        }
    }
    fn is_transient(&self, _n: usize, j: usize) -> bool {
        j > 0 && j + 1 < self.z.len()
    }
    fn initial_value(&self, n: usize, _j: usize) -> f64 {
        self.initial[n]
    }
    fn lower_bound(&self, n: usize) -> f64 {
        if n == T { self.t_bounds.0 } else { self.y_bounds.0 }
    }
    fn upper_bound(&self, n: usize) -> f64 {
        if n == T { self.t_bounds.1 } else { self.y_bounds.1 }
    }
    fn refiner(&self) -> Option<&Refiner> {
        Some(&self.refiner)
    }
    fn refiner_mut(&mut self) -> Option<&mut Refiner> {
        Some(&mut self.refiner)
    }
}
