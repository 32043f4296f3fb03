//! # Adaptive grid refinement
//!
//! A [`Refiner`] belongs to one domain and decides, from the current solution on that
//! domain's grid, where to insert points (interval midpoints) and which points may be
//! dropped. The decision is made from four criteria:
//!
//! - **slope**: the change of a component across an interval must not exceed
//!   `slope * (max - min)` of that component;
//! - **curve**: the change of the first derivative across an interval must not exceed
//!   `curve * (max slope - min slope)`;
//! - **ratio**: adjacent intervals may not differ in length by more than `ratio`;
//! - **prune**: a point whose slope and curvature measures fall below `prune` may be
//!   removed. A negative `prune` disables removal.
//!
//! Components whose range is below `min_range` of their magnitude are ignored, and no
//! interval shorter than `2 * grid_min` is split. When the domain already has
//! `max_points` points nothing is changed.
use log::info;
use prettytable::{Table, row};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefineCriteria {
    pub ratio: f64,
    pub slope: f64,
    pub curve: f64,
    pub prune: f64,
    pub grid_min: f64,
    pub max_points: usize,
    pub min_range: f64,
    pub threshold: f64,
}

impl Default for RefineCriteria {
    fn default() -> Self {
        Self {
            ratio: 10.0,
            slope: 0.8,
            curve: 0.8,
            prune: -0.1,
            grid_min: 1e-10,
            max_points: 1000,
            min_range: 0.01,
            threshold: f64::EPSILON.sqrt(),
        }
    }
}

impl RefineCriteria {
    pub fn validate(&self) -> Result<(), String> {
        if self.ratio < 2.0 {
            return Err(format!("'ratio' must be greater than 2.0 ({} was specified)", self.ratio));
        }
        if !(0.0..=1.0).contains(&self.slope) {
            return Err(format!("'slope' must be between 0.0 and 1.0 ({} was specified)", self.slope));
        }
        if !(0.0..=1.0).contains(&self.curve) {
            return Err(format!("'curve' must be between 0.0 and 1.0 ({} was specified)", self.curve));
        }
        if self.prune > self.curve || self.prune > self.slope {
            return Err(format!(
                "'prune' must be less than 'curve' and 'slope' ({} was specified)",
                self.prune
            ));
        }
        if self.max_points < 2 {
            return Err("'max_points' must be at least 2".to_owned());
        }
        Ok(())
    }
}

/// result of one refinement analysis of a domain
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefineDecision {
    /// intervals `(j, j+1)` that get a midpoint
    pub insert: BTreeSet<usize>,
    /// points to drop
    pub remove: BTreeSet<usize>,
    /// components and criteria that triggered insertions
    pub reasons: BTreeMap<String, Vec<usize>>,
    pub max_points_reached: bool,
}

impl RefineDecision {
    pub fn is_empty(&self) -> bool {
        self.insert.is_empty() && self.remove.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Refiner {
    pub criteria: RefineCriteria,
    /// per component; components switched off are ignored by the slope and curve criteria
    active: Vec<bool>,
}

impl Refiner {
    pub fn new(n_components: usize) -> Self {
        Self {
            criteria: RefineCriteria::default(),
            active: vec![true; n_components],
        }
    }

    pub fn set_criteria(
        &mut self,
        ratio: f64,
        slope: f64,
        curve: f64,
        prune: f64,
    ) -> Result<(), String> {
        let criteria = RefineCriteria {
            ratio,
            slope,
            curve,
            prune,
            ..self.criteria.clone()
        };
        criteria.validate()?;
        self.criteria = criteria;
        Ok(())
    }

    pub fn set_max_points(&mut self, max_points: usize) {
        self.criteria.max_points = max_points;
    }

    pub fn set_active(&mut self, component: usize, active: bool) {
        if component < self.active.len() {
            self.active[component] = active;
        }
    }

    pub fn is_active(&self, component: usize) -> bool {
        self.active.get(component).copied().unwrap_or(true)
    }

    /// Analyzes the point-major solution block `x` on grid `z`.
    pub fn analyze(&self, z: &[f64], x: &[f64], names: &[String]) -> RefineDecision {
        let mut decision = RefineDecision::default();
        let n = z.len();
        if n < 2 {
            return decision;
        }
        if n >= self.criteria.max_points {
            decision.max_points_reached = true;
            return decision;
        }
        let nv = x.len() / n;
        let c = &self.criteria;
        // 1 = keep, -1 = may be removed, 0 = undecided
        let mut keep = vec![0i8; n];
        keep[0] = 1;
        keep[n - 1] = 1;
        let mut loc: BTreeSet<usize> = BTreeSet::new();
        let mut mark = |loc: &mut BTreeSet<usize>, j: usize, reason: String| {
            loc.insert(j);
            decision.reasons.entry(reason).or_default().push(j);
        };

        let dz: Vec<f64> = z.windows(2).map(|w| w[1] - w[0]).collect();
        for i in 0..nv {
            if !self.is_active(i) {
                continue;
            }
            let name = names.get(i).cloned().unwrap_or_else(|| format!("component {}", i));
            let v: Vec<f64> = (0..n).map(|j| x[nv * j + i]).collect();
            let s: Vec<f64> = (0..n - 1).map(|j| (v[j + 1] - v[j]) / dz[j]).collect();

            let (vmin, vmax) = min_max(&v);
            let (smin, smax) = min_max(&s);
            let aa = vmax.abs().max(vmin.abs());
            let ss = smax.abs().max(smin.abs());

            // slope: change of the value across each interval
            if vmax - vmin > c.min_range * aa {
                let dmax = c.slope * (vmax - vmin) + c.threshold;
                for j in 0..n - 1 {
                    let r = (v[j + 1] - v[j]).abs() / dmax;
                    if r > 1.0 && dz[j] >= 2.0 * c.grid_min {
                        mark(&mut loc, j, format!("{} (slope)", name));
                    }
                    if r >= c.prune {
                        keep[j] = 1;
                        keep[j + 1] = 1;
                    } else if keep[j] == 0 {
                        keep[j] = -1;
                    }
                }
            }

            // curve: change of the first derivative across each pair of intervals
            if n > 2 && smax - smin > c.min_range * ss {
                let dmax = c.curve * (smax - smin);
                for j in 0..n - 2 {
                    let r = (s[j + 1] - s[j]).abs() / (dmax + c.threshold / dz[j]);
                    if r > 1.0 && dz[j] >= 2.0 * c.grid_min && dz[j + 1] >= 2.0 * c.grid_min {
                        mark(&mut loc, j, format!("{} (curve)", name));
                        mark(&mut loc, j + 1, format!("{} (curve)", name));
                    }
                    if r >= c.prune {
                        keep[j + 1] = 1;
                    } else if keep[j + 1] == 0 {
                        keep[j + 1] = -1;
                    }
                }
            }
        }

        // ratio of adjacent intervals
        for j in 1..n - 1 {
            if dz[j] > c.ratio * dz[j - 1] {
                mark(&mut loc, j, "point spacing (ratio)".to_owned());
            }
            if dz[j] < dz[j - 1] / c.ratio {
                mark(&mut loc, j - 1, "point spacing (ratio)".to_owned());
            }
        }

        let room = c.max_points - n;
        decision.insert = loc.into_iter().take(room).collect();

        if c.prune > 0.0 {
            let mut last_removed = false;
            for j in 1..n - 1 {
                let next_to_insertion =
                    decision.insert.contains(&j) || decision.insert.contains(&(j - 1));
                if keep[j] == -1 && !last_removed && !next_to_insertion {
                    decision.remove.insert(j);
                    last_removed = true;
                } else {
                    last_removed = false;
                }
            }
        }
        decision
    }

    /// logs a table of the points a decision inserts, grouped by the triggering criterion
    pub fn show(&self, domain: &str, decision: &RefineDecision) {
        if decision.is_empty() {
            return;
        }
        let mut table = Table::new();
        table.add_row(row!["criterion", "intervals"]);
        for (reason, intervals) in &decision.reasons {
            let list: Vec<String> = intervals.iter().map(|j| j.to_string()).collect();
            table.add_row(row![reason, list.join(" ")]);
        }
        info!(
            "refining domain '{}': {} new points, {} removed\n{}",
            domain,
            decision.insert.len(),
            decision.remove.len(),
            table
        );
    }
}

fn min_max(v: &[f64]) -> (f64, f64) {
    v.iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &a| (lo.min(a), hi.max(a)))
}
