//! # Equation of state evaluators
//!
//! Pure functions of temperature and density (pressure, internal energy, entropy) and of
//! temperature alone (saturation pressure, liquid density), together with critical
//! constants and the valid temperature range. Domains that need a density closure hold an
//! `EquationOfState` trait object; a temperature outside the range is reported as
//! [`EosError::TemperatureOutOfRange`] and becomes a recoverable residual failure.
//!
//! All quantities are mass specific: density in kg/m3, energy in J/kg, entropy in J/(kg K).
use thiserror::Error;

use crate::Thermodynamics::species_thermo::GAS_CONSTANT;

#[derive(Debug, Error, PartialEq)]
pub enum EosError {
    #[error("temperature {temperature} K outside the valid range [{tmin}, {tmax}] K")]
    TemperatureOutOfRange {
        temperature: f64,
        tmin: f64,
        tmax: f64,
    },
    #[error("density must be positive, got {0}")]
    NonPositiveDensity(f64),
    #[error("{property} is not available for '{substance}'")]
    Unsupported {
        substance: String,
        property: &'static str,
    },
    #[error("density iteration did not converge at T = {temperature} K, P = {pressure} Pa")]
    DensityNotConverged { temperature: f64, pressure: f64 },
}

pub trait EquationOfState {
    fn name(&self) -> &str;
    fn t_min(&self) -> f64;
    fn t_max(&self) -> f64;

    /// pressure, Pa
    fn pressure(&self, t: f64, rho: f64) -> Result<f64, EosError>;
    /// internal energy, J/kg
    fn internal_energy(&self, t: f64, rho: f64) -> Result<f64, EosError>;
    /// entropy, J/(kg K)
    fn entropy(&self, t: f64, rho: f64) -> Result<f64, EosError>;

    fn saturation_pressure(&self, _t: f64) -> Result<f64, EosError> {
        Err(EosError::Unsupported {
            substance: self.name().to_owned(),
            property: "saturation pressure",
        })
    }
    fn liquid_density(&self, _t: f64) -> Result<f64, EosError> {
        Err(EosError::Unsupported {
            substance: self.name().to_owned(),
            property: "liquid density",
        })
    }
    fn critical_temperature(&self) -> Option<f64> {
        None
    }
    fn critical_pressure(&self) -> Option<f64> {
        None
    }
    fn critical_density(&self) -> Option<f64> {
        None
    }

    fn check_temperature(&self, t: f64) -> Result<(), EosError> {
        if t.is_finite() && t >= self.t_min() && t <= self.t_max() {
            Ok(())
        } else {
            Err(EosError::TemperatureOutOfRange {
                temperature: t,
                tmin: self.t_min(),
                tmax: self.t_max(),
            })
        }
    }

    /// Density at temperature `t` and pressure `p`, found by Newton iteration on
    /// `pressure(t, rho) = p` starting from `rho_guess`.
    fn density(&self, t: f64, p: f64, rho_guess: f64) -> Result<f64, EosError> {
        self.check_temperature(t)?;
        let not_converged = EosError::DensityNotConverged {
            temperature: t,
            pressure: p,
        };
        let mut rho = rho_guess.max(1e-12);
        for _ in 0..50 {
            let f = self.pressure(t, rho)? - p;
            if f.abs() <= 1e-10 * p.abs().max(1.0) {
                return Ok(rho);
            }
            let h = 1e-6 * rho;
            let dpdrho = (self.pressure(t, rho + h)? - p - f) / h;
            // mechanically unstable branch
            if dpdrho <= 0.0 {
                return Err(not_converged);
            }
            let next = rho - f / dpdrho;
            rho = if next > 0.0 { next } else { 0.5 * rho };
        }
        Err(not_converged)
    }
}

/// calorically perfect ideal gas
#[derive(Debug, Clone, PartialEq)]
pub struct IdealGas {
    pub name: String,
    /// kg/mol
    pub molar_mass: f64,
    /// J/(kg K)
    pub cv: f64,
    pub t_ref: f64,
    pub rho_ref: f64,
    pub u_ref: f64,
    pub s_ref: f64,
    pub t_min: f64,
    pub t_max: f64,
}

impl IdealGas {
    pub fn new(name: &str, molar_mass: f64, cv: f64) -> Self {
        Self {
            name: name.to_owned(),
            molar_mass,
            cv,
            t_ref: 298.15,
            rho_ref: 1.0,
            u_ref: 0.0,
            s_ref: 0.0,
            t_min: 200.0,
            t_max: 6000.0,
        }
    }
    pub fn with_range(mut self, t_min: f64, t_max: f64) -> Self {
        self.t_min = t_min;
        self.t_max = t_max;
        self
    }
    /// specific gas constant, J/(kg K)
    pub fn specific_gas_constant(&self) -> f64 {
        GAS_CONSTANT / self.molar_mass
    }
    fn check_density(rho: f64) -> Result<(), EosError> {
        if rho > 0.0 {
            Ok(())
        } else {
            Err(EosError::NonPositiveDensity(rho))
        }
    }
}

impl EquationOfState for IdealGas {
    fn name(&self) -> &str {
        &self.name
    }
    fn t_min(&self) -> f64 {
        self.t_min
    }
    fn t_max(&self) -> f64 {
        self.t_max
    }
    fn pressure(&self, t: f64, rho: f64) -> Result<f64, EosError> {
        self.check_temperature(t)?;
        Self::check_density(rho)?;
        Ok(rho * self.specific_gas_constant() * t)
    }
    fn internal_energy(&self, t: f64, rho: f64) -> Result<f64, EosError> {
        self.check_temperature(t)?;
        Self::check_density(rho)?;
        Ok(self.u_ref + self.cv * (t - self.t_ref))
    }
    fn entropy(&self, t: f64, rho: f64) -> Result<f64, EosError> {
        self.check_temperature(t)?;
        Self::check_density(rho)?;
        Ok(self.s_ref + self.cv * (t / self.t_ref).ln()
            - self.specific_gas_constant() * (rho / self.rho_ref).ln())
    }
    fn density(&self, t: f64, p: f64, _rho_guess: f64) -> Result<f64, EosError> {
        self.check_temperature(t)?;
        Ok(p / (self.specific_gas_constant() * t))
    }
}
