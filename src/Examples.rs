/// numbered demos of the 1-D solver, run from `main`
pub mod oned_examples;
