#[allow(non_snake_case)]
pub mod Examples;
#[allow(non_snake_case)]
pub mod OneD;
#[allow(non_snake_case)]
pub mod Thermodynamics;
#[allow(non_snake_case)]
pub mod Utils;
