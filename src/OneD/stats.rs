//! Per-grid solver statistics.
use prettytable::{Table, row};
use std::time::Duration;

/// counters gathered while solving on one grid
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridStats {
    pub points: usize,
    pub jac_evals: usize,
    pub jac_time: Duration,
    pub func_evals: usize,
    pub func_time: Duration,
    pub newton_time: Duration,
    pub time_steps: usize,
    pub steady_attempts: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SolverStats {
    grids: Vec<GridStats>,
}

impl SolverStats {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn push(&mut self, grid: GridStats) {
        self.grids.push(grid);
    }
    pub fn clear(&mut self) {
        self.grids.clear();
    }
    pub fn grids(&self) -> &[GridStats] {
        &self.grids
    }
    pub fn total_jac_evals(&self) -> usize {
        self.grids.iter().map(|g| g.jac_evals).sum()
    }
    pub fn total_func_evals(&self) -> usize {
        self.grids.iter().map(|g| g.func_evals).sum()
    }
    pub fn total_time_steps(&self) -> usize {
        self.grids.iter().map(|g| g.time_steps).sum()
    }

    pub fn pretty_print(&self) -> Table {
        let mut table = Table::new();
        table.add_row(row![
            "grid",
            "points",
            "Jac evals",
            "Jac time, s",
            "func evals",
            "func time, s",
            "Newton time, s",
            "time steps",
            "steady attempts"
        ]);
        for (i, g) in self.grids.iter().enumerate() {
            table.add_row(row![
                i,
                g.points,
                g.jac_evals,
                format!("{:.4}", g.jac_time.as_secs_f64()),
                g.func_evals,
                format!("{:.4}", g.func_time.as_secs_f64()),
                format!("{:.4}", g.newton_time.as_secs_f64()),
                g.time_steps,
                g.steady_attempts
            ]);
        }
        table
    }
}
