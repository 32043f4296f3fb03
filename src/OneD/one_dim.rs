//! # Domain chain
//!
//! [`OneDim`] holds the domains left to right and maps the global unknown vector onto
//! them. Global points are numbered consecutively across domains; the unknowns of point
//! `jg` start at `loc(jg)` and there are `n_vars(jg)` of them. Inside a domain the block
//! is point-major, so component `n` of local point `j` of domain `i` is at
//! `start(i) + n_components * j + n`.
//!
//! The chain evaluates the global residual either over all points or over the
//! three-point neighbourhood `{jg-1, jg, jg+1}` of one global point. The restricted form
//! is what the finite-difference Jacobian uses: perturbing an unknown of point `jg` can
//! only change residual rows of these three points.
//!
//! Adding or removing a domain leaves the location map stale until [`OneDim::resize`]
//! validates the topology and rebuilds it.
use crate::OneD::domain::{Domain, ResidualArgs};
use crate::OneD::errors::{DomainError, Side, TopologyError};
use log::{debug, info};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Default)]
struct DomainSlot {
    first_point: usize,
    loc: usize,
    n_points: usize,
    n_components: usize,
}

impl DomainSlot {
    fn size(&self) -> usize {
        self.n_points * self.n_components
    }
    fn last_point(&self) -> usize {
        self.first_point + self.n_points - 1
    }
    /// local points of this domain inside the neighbourhood of global point `point`
    fn scope(&self, point: Option<usize>) -> Option<(usize, usize)> {
        let last = self.last_point();
        match point {
            None => Some((0, self.n_points - 1)),
            Some(jg) => {
                if jg + 1 < self.first_point || jg > last + 1 {
                    return None;
                }
                let lo = jg.saturating_sub(1).max(self.first_point);
                let hi = (jg + 1).min(last);
                Some((lo - self.first_point, hi - self.first_point))
            }
        }
    }
}

#[derive(Default)]
pub struct OneDim {
    domains: Vec<Box<dyn Domain>>,
    slots: Vec<DomainSlot>,
    /// per global point
    nvars: Vec<usize>,
    locs: Vec<usize>,
    point_domain: Vec<usize>,
    /// per unknown
    mask: Vec<bool>,
    size: usize,
    points: usize,
    bandwidth: usize,
    rdt: f64,
    x_prev: Vec<f64>,
    ready: bool,
    n_evals: usize,
    eval_time: Duration,
}

impl OneDim {
    pub fn new() -> Self {
        Self::default()
    }

    /// chain of `domains`, validated and sized
    pub fn from_domains(domains: Vec<Box<dyn Domain>>) -> Result<Self, TopologyError> {
        let mut chain = Self::new();
        for d in domains {
            chain.add_domain(d);
        }
        chain.resize()?;
        Ok(chain)
    }

    pub fn add_domain(&mut self, domain: Box<dyn Domain>) {
        debug!("adding domain '{}' to the chain", domain.name());
        self.domains.push(domain);
        self.ready = false;
    }

    pub fn remove_domain(&mut self, index: usize) -> Result<Box<dyn Domain>, TopologyError> {
        if index >= self.domains.len() {
            return Err(TopologyError::IndexOutOfRange {
                index,
                len: self.domains.len(),
            });
        }
        self.ready = false;
        Ok(self.domains.remove(index))
    }

    /// Checks that the chain is non-empty, that no domain is empty, and that every
    /// declared coupling matches the neighbour actually attached on that side.
    pub fn validate(&self) -> Result<(), TopologyError> {
        let (Some(first), Some(last)) = (self.domains.first(), self.domains.last()) else {
            return Err(TopologyError::EmptyChain);
        };
        for d in &self.domains {
            if d.n_points() == 0 {
                return Err(TopologyError::EmptyDomain(d.name().to_owned()));
            }
            if d.n_components() == 0 {
                return Err(TopologyError::NoComponents(d.name().to_owned()));
            }
        }
        if first.coupling().left.is_some() {
            return Err(TopologyError::DanglingCoupling {
                domain: first.name().to_owned(),
                side: Side::Left,
            });
        }
        if last.coupling().right.is_some() {
            return Err(TopologyError::DanglingCoupling {
                domain: last.name().to_owned(),
                side: Side::Right,
            });
        }
        for pair in self.domains.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            check_side(a.as_ref(), b.as_ref(), Side::Right)?;
            check_side(b.as_ref(), a.as_ref(), Side::Left)?;
        }
        Ok(())
    }

    /// Validates the topology and rebuilds the location map, bandwidth and transient mask.
    pub fn resize(&mut self) -> Result<(), TopologyError> {
        self.ready = false;
        self.validate()?;
        self.slots.clear();
        self.nvars.clear();
        self.locs.clear();
        self.point_domain.clear();
        self.mask.clear();

        let mut loc = 0;
        let mut first_point = 0;
        let mut bw = 0;
        for (i, d) in self.domains.iter().enumerate() {
            let (np, nv) = (d.n_points(), d.n_components());
            self.slots.push(DomainSlot {
                first_point,
                loc,
                n_points: np,
                n_components: nv,
            });
            for j in 0..np {
                self.nvars.push(nv);
                self.locs.push(loc + nv * j);
                self.point_domain.push(i);
                for n in 0..nv {
                    self.mask.push(d.is_transient(n, j));
                }
            }
            bw = bw.max(d.bandwidth().unwrap_or(2 * nv - 1));
            if i > 0 {
                let prev = &self.domains[i - 1];
                let prev_bw = prev.bandwidth().unwrap_or(prev.n_components());
                bw = bw.max(prev_bw + nv - 1);
            }
            loc += np * nv;
            first_point += np;
        }
        self.size = loc;
        self.points = first_point;
        self.bandwidth = bw;
        if self.x_prev.len() != self.size {
            self.x_prev = vec![0.0; self.size];
        }
        self.ready = true;
        info!(
            "chain of {} domains: {} points, {} unknowns, bandwidth {}",
            self.domains.len(),
            self.points,
            self.size,
            self.bandwidth
        );
        Ok(())
    }

    /// whether the location map matches the current domain list
    pub fn is_ready(&self) -> bool {
        self.ready
    }
    /// Marks the location map stale, e.g. after a domain was changed in place.
    /// `eval` fails until the next `resize`.
    pub fn invalidate(&mut self) {
        self.ready = false;
    }

    /// Evaluates the residual into `r`.
    ///
    /// `point = None` evaluates every point; `Some(jg)` evaluates only the points
    /// `jg-1..=jg+1` and leaves the other rows of `r` untouched. `rdt = None` uses the
    /// chain's current reciprocal time step. Calls with `count = false` are not
    /// recorded in the statistics.
    pub fn eval(
        &mut self,
        point: Option<usize>,
        x: &[f64],
        r: &mut [f64],
        rdt: Option<f64>,
        count: bool,
    ) -> Result<(), DomainError> {
        if !self.ready {
            return Err(DomainError::InvalidState {
                domain: "chain".to_owned(),
                message: "location map is stale, resize() the chain first".to_owned(),
            });
        }
        for (what, len) in [("x", x.len()), ("r", r.len()), ("previous solution", self.x_prev.len())] {
            if len != self.size {
                return Err(DomainError::InvalidState {
                    domain: "chain".to_owned(),
                    message: format!("{} has length {}, the chain has {} unknowns", what, len, self.size),
                });
            }
        }
        let start_time = Instant::now();
        let rdt = rdt.unwrap_or(self.rdt);
        let n_domains = self.domains.len();
        for (i, domain) in self.domains.iter().enumerate() {
            let slot = self.slots[i];
            let Some((jmin, jmax)) = slot.scope(point) else {
                continue;
            };
            let (start, end) = (slot.loc, slot.loc + slot.size());
            let left = (i > 0).then(|| {
                let p = slot.first_point - 1;
                &x[self.locs[p]..self.locs[p] + self.nvars[p]]
            });
            let right = (i + 1 < n_domains).then(|| {
                let p = slot.first_point + slot.n_points;
                &x[self.locs[p]..self.locs[p] + self.nvars[p]]
            });
            let args = ResidualArgs {
                x: &x[start..end],
                x_prev: &self.x_prev[start..end],
                left,
                right,
                rdt,
                jmin,
                jmax,
            };
            let rsd = &mut r[start..end];
            domain.eval(&args, rsd)?;
            if rdt != 0.0 {
                let nv = slot.n_components;
                for k in nv * jmin..nv * (jmax + 1) {
                    if self.mask[start + k] {
                        rsd[k] -= rdt * (args.x[k] - args.x_prev[k]);
                    }
                }
            }
        }
        if count {
            self.n_evals += 1;
            self.eval_time += start_time.elapsed();
        }
        Ok(())
    }

    /// max-norm of the steady residual at `x`; `r` is used as work space
    pub fn ssnorm(&mut self, x: &[f64], r: &mut [f64]) -> Result<f64, DomainError> {
        self.eval(None, x, r, Some(0.0), false)?;
        Ok(r.iter().fold(0.0, |acc: f64, v| acc.max(v.abs())))
    }

    /// Switches to time-stepping mode with step `dt`, storing `x` as the previous time
    /// level. Returns true if the reciprocal step changed.
    pub fn init_time_integ(&mut self, dt: f64, x: &[f64]) -> bool {
        let rdt = 1.0 / dt;
        self.x_prev.clear();
        self.x_prev.extend_from_slice(x);
        let changed = rdt != self.rdt;
        self.rdt = rdt;
        changed
    }

    /// Returns true if the chain was in time-stepping mode.
    pub fn set_steady_mode(&mut self) -> bool {
        let changed = self.rdt != 0.0;
        self.rdt = 0.0;
        changed
    }

    pub fn rdt(&self) -> f64 {
        self.rdt
    }
    pub fn transient(&self) -> bool {
        self.rdt != 0.0
    }
    pub fn steady(&self) -> bool {
        self.rdt == 0.0
    }

    pub fn n_domains(&self) -> usize {
        self.domains.len()
    }
    pub fn domain(&self, i: usize) -> &dyn Domain {
        self.domains[i].as_ref()
    }
    /// Mutable access to a domain. Changing its grid or component count requires a
    /// `resize()` before the next evaluation.
    pub fn domain_mut(&mut self, i: usize) -> &mut dyn Domain {
        self.domains[i].as_mut()
    }
    pub fn domains(&self) -> impl Iterator<Item = &dyn Domain> {
        self.domains.iter().map(|d| d.as_ref())
    }
    pub fn domain_index(&self, name: &str) -> Result<usize, TopologyError> {
        self.domains
            .iter()
            .position(|d| d.name() == name)
            .ok_or_else(|| TopologyError::UnknownDomain(name.to_owned()))
    }
    /// offset of the first unknown of domain `i`
    pub fn start(&self, i: usize) -> usize {
        self.slots[i].loc
    }
    pub fn first_point(&self, i: usize) -> usize {
        self.slots[i].first_point
    }
    /// total number of unknowns
    pub fn size(&self) -> usize {
        self.size
    }
    /// total number of grid points
    pub fn points(&self) -> usize {
        self.points
    }
    pub fn n_vars(&self, jg: usize) -> usize {
        self.nvars[jg]
    }
    pub fn loc(&self, jg: usize) -> usize {
        self.locs[jg]
    }
    pub fn point_domain(&self, jg: usize) -> usize {
        self.point_domain[jg]
    }
    /// half-bandwidth of the global Jacobian
    pub fn bandwidth(&self) -> usize {
        self.bandwidth
    }
    pub fn transient_mask(&self) -> &[bool] {
        &self.mask
    }
    pub fn previous_solution(&self) -> &[f64] {
        &self.x_prev
    }

    pub fn n_evals(&self) -> usize {
        self.n_evals
    }
    pub fn eval_time(&self) -> Duration {
        self.eval_time
    }
    pub fn reset_stats(&mut self) {
        self.n_evals = 0;
        self.eval_time = Duration::ZERO;
    }
}

/// checks what `domain` declares for its neighbour on `side`
fn check_side(domain: &dyn Domain, neighbour: &dyn Domain, side: Side) -> Result<(), TopologyError> {
    let declared = match side {
        Side::Left => domain.coupling().left,
        Side::Right => domain.coupling().right,
    };
    match declared {
        None => Err(TopologyError::UnexpectedNeighbour {
            domain: domain.name().to_owned(),
            neighbour: neighbour.name().to_owned(),
            side,
        }),
        Some(expected) if expected != neighbour.n_components() => {
            Err(TopologyError::CouplingMismatch {
                domain: domain.name().to_owned(),
                neighbour: neighbour.name().to_owned(),
                side,
                expected,
                found: neighbour.n_components(),
            })
        }
        Some(_) => Ok(()),
    }
}
