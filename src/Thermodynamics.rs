//! Property closures used by the domains.
//!
//! - [`species_thermo`]: NASA-7, Shomate and constant-cp heat capacity, enthalpy and entropy
//!   of single species, built from JSON records;
//! - [`eos`]: equations of state behind the [`eos::EquationOfState`] trait.
pub mod eos;
pub mod species_thermo;
