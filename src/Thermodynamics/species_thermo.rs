//! # Species thermodynamic property evaluators
//!
//! Heat capacity, enthalpy and entropy of individual species as functions of temperature.
//! Three parameterizations are supported:
//!
//! | model       | config name(s)                  | coefficients                                   |
//! |-------------|---------------------------------|------------------------------------------------|
//! | NASA 7      | `"NASA7"`, `"NASA"`             | `[T1, T2, a1..a7]`, `[T1, T2, T3, 2 x 7]`, `[T1..T4, 3 x 7]` |
//! | Shomate     | `"Shomate"`, `"NIST"`           | `[T1, T2, A..G]`, `[T1, T2, T3, 2 x 7]`        |
//! | constant cp | `"const_cp"`, `"constant_cp"`   | `t0`, `h0`, `s0`, `cp0`, `tmin`, `tmax`         |
//!
//! The family is chosen once, from configuration data, by [`ThermoModel::from_config`];
//! there is no global registry. All functions are pure: the same temperature always gives
//! the same result, and a temperature outside the fitted range is an error the caller may
//! recover from.
//!
//! Values are returned both dimensionless (`cp/R`, `h/RT`, `s/R`) and in J, mol, K.
use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// universal gas constant, J/(mol K)
pub const GAS_CONSTANT: f64 = 8.314462618;

#[derive(Debug, Error, PartialEq)]
pub enum ThermoError {
    #[error("temperature {temperature} K outside the valid range [{tmin}, {tmax}] K")]
    TemperatureOutOfRange {
        temperature: f64,
        tmin: f64,
        tmax: f64,
    },
    #[error("invalid number of coefficients for {model}: {found}")]
    InvalidCoefficients { model: String, found: usize },
    #[error("temperature intervals of {model} are not increasing")]
    InvalidTemperatureRange { model: String },
    #[error("unknown thermo model '{0}'")]
    UnknownModel(String),
    #[error("failed to deserialize thermo data: {0}")]
    Deserialization(String),
}

#[enum_dispatch]
pub trait SpeciesThermo {
    /// lowest temperature of the fit, K
    fn min_temp(&self) -> f64;
    /// highest temperature of the fit, K
    fn max_temp(&self) -> f64;
    /// dimensionless heat capacity cp/R
    fn cp_r(&self, t: f64) -> Result<f64, ThermoError>;
    /// dimensionless enthalpy h/(RT)
    fn h_rt(&self, t: f64) -> Result<f64, ThermoError>;
    /// dimensionless entropy s/R
    fn s_r(&self, t: f64) -> Result<f64, ThermoError>;

    fn check_temperature(&self, t: f64) -> Result<(), ThermoError> {
        let (tmin, tmax) = (self.min_temp(), self.max_temp());
        if t.is_finite() && t >= tmin && t <= tmax {
            Ok(())
        } else {
            Err(ThermoError::TemperatureOutOfRange {
                temperature: t,
                tmin,
                tmax,
            })
        }
    }
    /// heat capacity, J/(mol K)
    fn cp(&self, t: f64) -> Result<f64, ThermoError> {
        Ok(GAS_CONSTANT * self.cp_r(t)?)
    }
    /// enthalpy, J/mol
    fn enthalpy(&self, t: f64) -> Result<f64, ThermoError> {
        Ok(GAS_CONSTANT * t * self.h_rt(t)?)
    }
    /// entropy, J/(mol K)
    fn entropy(&self, t: f64) -> Result<f64, ThermoError> {
        Ok(GAS_CONSTANT * self.s_r(t)?)
    }
}

/// splits `[T1, .., Tk, c(1,1) .. c(k-1, 7)]` into temperature breakpoints and 7-coefficient sets
fn split_ranges(model: &str, data: &[f64]) -> Result<(Vec<f64>, Vec<[f64; 7]>), ThermoError> {
    let n_ranges = match data.len() {
        9 => 1,
        17 => 2,
        25 => 3,
        found => {
            return Err(ThermoError::InvalidCoefficients {
                model: model.to_owned(),
                found,
            });
        }
    };
    let temps = data[..=n_ranges].to_vec();
    if temps.windows(2).any(|w| w[1] <= w[0]) {
        return Err(ThermoError::InvalidTemperatureRange {
            model: model.to_owned(),
        });
    }
    let coeffs = data[n_ranges + 1..]
        .chunks_exact(7)
        .map(|c| [c[0], c[1], c[2], c[3], c[4], c[5], c[6]])
        .collect();
    Ok((temps, coeffs))
}

/// index of the interval that holds `t`; left-closed on the first interval like the fits in the libraries
fn select_range(temps: &[f64], t: f64) -> Result<usize, ThermoError> {
    let last = temps.len() - 1;
    if !(t.is_finite() && t >= temps[0] && t <= temps[last]) {
        return Err(ThermoError::TemperatureOutOfRange {
            temperature: t,
            tmin: temps[0],
            tmax: temps[last],
        });
    }
    Ok((1..last).find(|&i| t <= temps[i]).map_or(last - 1, |i| i - 1))
}

/// NASA 7-coefficient polynomials, one set per temperature interval
#[derive(Debug, Clone, PartialEq)]
pub struct Nasa7 {
    temps: Vec<f64>,
    coeffs: Vec<[f64; 7]>,
}

impl Nasa7 {
    pub fn new(data: &[f64]) -> Result<Self, ThermoError> {
        let (temps, coeffs) = split_ranges("NASA7", data)?;
        Ok(Self { temps, coeffs })
    }
    fn coeffs_at(&self, t: f64) -> Result<&[f64; 7], ThermoError> {
        Ok(&self.coeffs[select_range(&self.temps, t)?])
    }
}

impl SpeciesThermo for Nasa7 {
    fn min_temp(&self) -> f64 {
        self.temps[0]
    }
    fn max_temp(&self) -> f64 {
        self.temps[self.temps.len() - 1]
    }
    fn cp_r(&self, t: f64) -> Result<f64, ThermoError> {
        let [a, b, c, d, e, _, _] = *self.coeffs_at(t)?;
        Ok(a + b * t + c * t.powi(2) + d * t.powi(3) + e * t.powi(4))
    }
    fn h_rt(&self, t: f64) -> Result<f64, ThermoError> {
        let [a, b, c, d, e, f, _] = *self.coeffs_at(t)?;
        Ok(a + b * t / 2.0
            + c * t.powi(2) / 3.0
            + d * t.powi(3) / 4.0
            + e * t.powi(4) / 5.0
            + f / t)
    }
    fn s_r(&self, t: f64) -> Result<f64, ThermoError> {
        let [a, b, c, d, e, _, g] = *self.coeffs_at(t)?;
        Ok(a * t.ln() + b * t + c * t.powi(2) / 2.0 + d * t.powi(3) / 3.0 + e * t.powi(4) / 4.0 + g)
    }
}

/// Shomate equation as published by NIST: t = T/1000, cp in J/(mol K), h in kJ/mol
#[derive(Debug, Clone, PartialEq)]
pub struct Shomate {
    temps: Vec<f64>,
    coeffs: Vec<[f64; 7]>,
}

impl Shomate {
    pub fn new(data: &[f64]) -> Result<Self, ThermoError> {
        let (temps, coeffs) = split_ranges("Shomate", data)?;
        Ok(Self { temps, coeffs })
    }
    fn coeffs_at(&self, t: f64) -> Result<&[f64; 7], ThermoError> {
        Ok(&self.coeffs[select_range(&self.temps, t)?])
    }
}

impl SpeciesThermo for Shomate {
    fn min_temp(&self) -> f64 {
        self.temps[0]
    }
    fn max_temp(&self) -> f64 {
        self.temps[self.temps.len() - 1]
    }
    fn cp_r(&self, t: f64) -> Result<f64, ThermoError> {
        let [a, b, c, d, e, _, _] = *self.coeffs_at(t)?;
        let tt = t / 1000.0;
        Ok((a + b * tt + c * tt.powi(2) + d * tt.powi(3) + e / tt.powi(2)) / GAS_CONSTANT)
    }
    fn h_rt(&self, t: f64) -> Result<f64, ThermoError> {
        let [a, b, c, d, e, f, _] = *self.coeffs_at(t)?;
        let tt = t / 1000.0;
        let h = a * tt + b * tt.powi(2) / 2.0 + c * tt.powi(3) / 3.0 + d * tt.powi(4) / 4.0 - e / tt
            + f;
        Ok(1000.0 * h / (GAS_CONSTANT * t))
    }
    fn s_r(&self, t: f64) -> Result<f64, ThermoError> {
        let [a, b, c, d, e, _, g] = *self.coeffs_at(t)?;
        let tt = t / 1000.0;
        let s = a * tt.ln() + b * tt + c * tt.powi(2) / 2.0 + d * tt.powi(3) / 3.0
            - e / (2.0 * tt.powi(2))
            + g;
        Ok(s / GAS_CONSTANT)
    }
}

/// constant heat capacity about a reference state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstCp {
    /// reference temperature, K
    pub t0: f64,
    /// enthalpy at t0, J/mol
    pub h0: f64,
    /// entropy at t0, J/(mol K)
    pub s0: f64,
    /// heat capacity, J/(mol K)
    pub cp0: f64,
    #[serde(default = "ConstCp::default_tmin")]
    pub tmin: f64,
    #[serde(default = "ConstCp::default_tmax")]
    pub tmax: f64,
}

impl ConstCp {
    fn default_tmin() -> f64 {
        1.0
    }
    fn default_tmax() -> f64 {
        5000.0
    }
    pub fn new(t0: f64, h0: f64, s0: f64, cp0: f64) -> Self {
        Self {
            t0,
            h0,
            s0,
            cp0,
            tmin: Self::default_tmin(),
            tmax: Self::default_tmax(),
        }
    }
}

impl SpeciesThermo for ConstCp {
    fn min_temp(&self) -> f64 {
        self.tmin
    }
    fn max_temp(&self) -> f64 {
        self.tmax
    }
    fn cp_r(&self, t: f64) -> Result<f64, ThermoError> {
        self.check_temperature(t)?;
        Ok(self.cp0 / GAS_CONSTANT)
    }
    fn h_rt(&self, t: f64) -> Result<f64, ThermoError> {
        self.check_temperature(t)?;
        Ok((self.h0 + self.cp0 * (t - self.t0)) / (GAS_CONSTANT * t))
    }
    fn s_r(&self, t: f64) -> Result<f64, ThermoError> {
        self.check_temperature(t)?;
        Ok((self.s0 + self.cp0 * (t / self.t0).ln()) / GAS_CONSTANT)
    }
}

#[derive(Clone, Debug, PartialEq)]
#[enum_dispatch(SpeciesThermo)]
pub enum ThermoModel {
    Nasa7(Nasa7),
    Shomate(Shomate),
    ConstCp(ConstCp),
}

#[derive(Debug, Deserialize)]
struct PolynomialInput {
    coeffs: Vec<f64>,
}

impl ThermoModel {
    /// Builds the evaluator named by the `"model"` field of `config`.
    ///
    /// ```
    /// use MultiDomain1D::Thermodynamics::species_thermo::{SpeciesThermo, ThermoModel};
    /// let config = serde_json::json!({"model": "const_cp", "t0": 298.15, "h0": 0.0, "s0": 0.0, "cp0": 29.1});
    /// let thermo = ThermoModel::from_config(&config).unwrap();
    /// assert!((thermo.cp(500.0).unwrap() - 29.1).abs() < 1e-12);
    /// ```
    pub fn from_config(config: &Value) -> Result<Self, ThermoError> {
        let model = config
            .get("model")
            .and_then(Value::as_str)
            .ok_or_else(|| ThermoError::Deserialization("missing 'model' field".to_owned()))?;
        let deser = |e: serde_json::Error| ThermoError::Deserialization(e.to_string());
        match model {
            "NASA7" | "NASA" | "nasa7" | "nasa" => {
                let input: PolynomialInput = serde_json::from_value(config.clone()).map_err(deser)?;
                Ok(ThermoModel::Nasa7(Nasa7::new(&input.coeffs)?))
            }
            "Shomate" | "shomate" | "NIST" => {
                let input: PolynomialInput = serde_json::from_value(config.clone()).map_err(deser)?;
                Ok(ThermoModel::Shomate(Shomate::new(&input.coeffs)?))
            }
            "const_cp" | "constant_cp" | "ConstCp" => {
                let input: ConstCp = serde_json::from_value(config.clone()).map_err(deser)?;
                Ok(ThermoModel::ConstCp(input))
            }
            other => Err(ThermoError::UnknownModel(other.to_owned())),
        }
    }
}

/// property evaluators for a list of species, updated together at one temperature
#[derive(Clone, Debug, Default)]
pub struct SpeciesThermoSet {
    names: Vec<String>,
    models: Vec<ThermoModel>,
}

impl SpeciesThermoSet {
    pub fn new() -> Self {
        Self::default()
    }
    /// reads `[{"name": "N2", "model": "NASA7", "coeffs": [...]}, ...]`
    pub fn from_config(config: &Value) -> Result<Self, ThermoError> {
        let entries = config
            .as_array()
            .ok_or_else(|| ThermoError::Deserialization("expected an array of species".to_owned()))?;
        let mut set = Self::new();
        for entry in entries {
            let name = entry
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| ThermoError::Deserialization("species without 'name'".to_owned()))?;
            set.install(name, ThermoModel::from_config(entry)?);
        }
        Ok(set)
    }
    pub fn install(&mut self, name: &str, model: ThermoModel) {
        self.names.push(name.to_owned());
        self.models.push(model);
    }
    pub fn n_species(&self) -> usize {
        self.models.len()
    }
    pub fn names(&self) -> &[String] {
        &self.names
    }
    pub fn species_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
    pub fn model(&self, k: usize) -> &ThermoModel {
        &self.models[k]
    }
    /// highest lower limit over all species
    pub fn min_temp(&self) -> f64 {
        self.models
            .iter()
            .map(|m| m.min_temp())
            .fold(f64::NEG_INFINITY, f64::max)
    }
    /// lowest upper limit over all species
    pub fn max_temp(&self) -> f64 {
        self.models
            .iter()
            .map(|m| m.max_temp())
            .fold(f64::INFINITY, f64::min)
    }
    /// fills cp/R, h/RT and s/R of every species at temperature `t`
    pub fn update(
        &self,
        t: f64,
        cp_r: &mut [f64],
        h_rt: &mut [f64],
        s_r: &mut [f64],
    ) -> Result<(), ThermoError> {
        for (k, model) in self.models.iter().enumerate() {
            cp_r[k] = model.cp_r(t)?;
            h_rt[k] = model.h_rt(t)?;
            s_r[k] = model.s_r(t)?;
        }
        Ok(())
    }
}
