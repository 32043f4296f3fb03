/// terminal and file logging setup
pub mod logging;
