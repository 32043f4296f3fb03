#[allow(non_snake_case)]
pub mod Examples;
#[allow(non_snake_case)]
pub mod OneD;
#[allow(non_snake_case)]
pub mod Thermodynamics;
#[allow(non_snake_case)]
pub mod Utils;

use Examples::oned_examples::oned_examples;
use Utils::logging::init_logger;
use log::{LevelFilter, error};
use std::path::Path;

pub fn main() {
    //
    let task: usize = 0;
    if let Err(e) = init_logger(LevelFilter::Info, None::<&Path>) {
        eprintln!("logging disabled: {}", e);
    }
    if let Err(e) = oned_examples(task) {
        error!("demo {} failed: {}", task, e);
    }
}
