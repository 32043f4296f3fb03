//! Single-point boundary domains.
//!
//! - [`Inlet`] starts a chain and prescribes the values its right neighbour takes over;
//! - [`Outlet`] ends a chain and copies the last point of its left neighbour;
//! - [`Surface`] ends a chain with prescribed values.
//!
//! All rows of a boundary are algebraic, so none of them carries a time derivative.
use crate::OneD::domain::{Coupling, Domain, ResidualArgs};
use crate::OneD::errors::DomainError;
use enum_dispatch::enum_dispatch;

fn single_point_grid(name: &str, z: &[f64]) -> Result<f64, DomainError> {
    match z {
        [z0] => Ok(*z0),
        _ => Err(DomainError::InvalidState {
            domain: name.to_owned(),
            message: format!("a boundary holds exactly one point, got {}", z.len()),
        }),
    }
}

fn default_names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("component {}", i)).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Inlet {
    name: String,
    /// prescribed values, one per component
    pub values: Vec<f64>,
    component_names: Vec<String>,
    z: [f64; 1],
}

impl Inlet {
    pub fn new(name: &str, values: Vec<f64>) -> Self {
        Self {
            name: name.to_owned(),
            component_names: default_names(values.len()),
            values,
            z: [0.0],
        }
    }
    pub fn with_component_names(mut self, names: &[&str]) -> Self {
        self.component_names = names.iter().map(|s| s.to_string()).collect();
        self
    }
    pub fn with_position(mut self, z: f64) -> Self {
        self.z = [z];
        self
    }
}

impl Domain for Inlet {
    fn name(&self) -> &str {
        &self.name
    }
    fn n_components(&self) -> usize {
        self.values.len()
    }
    fn n_points(&self) -> usize {
        1
    }
    fn coupling(&self) -> Coupling {
        Coupling::new(None, Some(self.values.len()))
    }
    fn grid(&self) -> &[f64] {
        &self.z
    }
    fn setup_grid(&mut self, z: &[f64]) -> Result<(), DomainError> {
        self.z = [single_point_grid(&self.name, z)?];
        Ok(())
    }
    fn check_grid(&self, z: &[f64]) -> Result<(), DomainError> {
        single_point_grid(&self.name, z).map(|_| ())
    }
    fn eval(&self, args: &ResidualArgs<'_>, rsd: &mut [f64]) -> Result<(), DomainError> {
        for (n, value) in self.values.iter().enumerate() {
            rsd[n] = args.x[n] - value;
        }
        Ok(())
    }
    fn component_name(&self, n: usize) -> String {
        self.component_names
            .get(n)
            .cloned()
            .unwrap_or_else(|| format!("component {}", n))
    }
    fn is_transient(&self, _n: usize, _j: usize) -> bool {
        false
    }
    fn initial_value(&self, n: usize, _j: usize) -> f64 {
        self.values[n]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outlet {
    name: String,
    nv: usize,
    component_names: Vec<String>,
    z: [f64; 1],
}

impl Outlet {
    /// outlet for a left neighbour with `n_components` components per point
    pub fn new(name: &str, n_components: usize) -> Self {
        Self {
            name: name.to_owned(),
            nv: n_components,
            component_names: default_names(n_components),
            z: [1.0],
        }
    }
    pub fn with_component_names(mut self, names: &[&str]) -> Self {
        self.component_names = names.iter().map(|s| s.to_string()).collect();
        self
    }
    pub fn with_position(mut self, z: f64) -> Self {
        self.z = [z];
        self
    }
}

impl Domain for Outlet {
    fn name(&self) -> &str {
        &self.name
    }
    fn n_components(&self) -> usize {
        self.nv
    }
    fn n_points(&self) -> usize {
        1
    }
    fn coupling(&self) -> Coupling {
        Coupling::new(Some(self.nv), None)
    }
    fn grid(&self) -> &[f64] {
        &self.z
    }
    fn setup_grid(&mut self, z: &[f64]) -> Result<(), DomainError> {
        self.z = [single_point_grid(&self.name, z)?];
        Ok(())
    }
    fn check_grid(&self, z: &[f64]) -> Result<(), DomainError> {
        single_point_grid(&self.name, z).map(|_| ())
    }
    fn eval(&self, args: &ResidualArgs<'_>, rsd: &mut [f64]) -> Result<(), DomainError> {
        let left = args.left.ok_or_else(|| DomainError::InvalidState {
            domain: self.name.clone(),
            message: "outlet without an upstream neighbour".to_owned(),
        })?;
        for n in 0..self.nv {
            rsd[n] = args.x[n] - left[n];
        }
        Ok(())
    }
    fn component_name(&self, n: usize) -> String {
        self.component_names
            .get(n)
            .cloned()
            .unwrap_or_else(|| format!("component {}", n))
    }
    fn is_transient(&self, _n: usize, _j: usize) -> bool {
        false
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    name: String,
    pub values: Vec<f64>,
    component_names: Vec<String>,
    z: [f64; 1],
}

impl Surface {
    pub fn new(name: &str, values: Vec<f64>) -> Self {
        Self {
            name: name.to_owned(),
            component_names: default_names(values.len()),
            values,
            z: [1.0],
        }
    }
    pub fn with_component_names(mut self, names: &[&str]) -> Self {
        self.component_names = names.iter().map(|s| s.to_string()).collect();
        self
    }
    pub fn with_position(mut self, z: f64) -> Self {
        self.z = [z];
        self
    }
}

impl Domain for Surface {
    fn name(&self) -> &str {
        &self.name
    }
    fn n_components(&self) -> usize {
        self.values.len()
    }
    fn n_points(&self) -> usize {
        1
    }
    fn coupling(&self) -> Coupling {
        Coupling::new(Some(self.values.len()), None)
    }
    fn grid(&self) -> &[f64] {
        &self.z
    }
    fn setup_grid(&mut self, z: &[f64]) -> Result<(), DomainError> {
        self.z = [single_point_grid(&self.name, z)?];
        Ok(())
    }
    fn check_grid(&self, z: &[f64]) -> Result<(), DomainError> {
        single_point_grid(&self.name, z).map(|_| ())
    }
    fn eval(&self, args: &ResidualArgs<'_>, rsd: &mut [f64]) -> Result<(), DomainError> {
        for (n, value) in self.values.iter().enumerate() {
            rsd[n] = args.x[n] - value;
        }
        Ok(())
    }
    fn component_name(&self, n: usize) -> String {
        self.component_names
            .get(n)
            .cloned()
            .unwrap_or_else(|| format!("component {}", n))
    }
    fn is_transient(&self, _n: usize, _j: usize) -> bool {
        false
    }
    fn initial_value(&self, n: usize, _j: usize) -> f64 {
        self.values[n]
    }
}

/// the boundary domains shipped with the crate
#[derive(Debug, Clone, PartialEq)]
#[enum_dispatch(Domain)]
pub enum Boundary {
    Inlet(Inlet),
    Outlet(Outlet),
    Surface(Surface),
}

/// boundary by kind name, as used in problem descriptions
pub fn create_boundary(kind: &str, name: &str, values: Vec<f64>) -> Option<Boundary> {
    match kind {
        "inlet" | "Inlet" => Some(Inlet::new(name, values).into()),
        "outlet" | "Outlet" => Some(Outlet::new(name, values.len()).into()),
        "surface" | "Surface" => Some(Surface::new(name, values).into()),
        _ => None,
    }
}
