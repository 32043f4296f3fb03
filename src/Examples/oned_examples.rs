use crate::OneD::boundaries::{Boundary, Inlet, Outlet, Surface};
use crate::OneD::domain::Domain;
use crate::OneD::errors::SolverError;
use crate::OneD::one_dim::OneDim;
use crate::OneD::reacting_column::{ColumnEnd, ColumnProperties, ReactingColumn, T, Y};
use crate::OneD::sim1d::Sim1D;
use crate::OneD::solver_config::SolverConfig;
use crate::Thermodynamics::species_thermo::{SpeciesThermo, SpeciesThermoSet};
use log::info;
use serde_json::json;

pub fn oned_examples(task: usize) -> Result<(), SolverError> {
    match task {
        0 => {
            // flame-like problem: cold premixed inflow, reaction zone, free outflow
            let species = SpeciesThermoSet::from_config(&json!([{
                "name": "N2",
                "model": "NASA7",
                "coeffs": [
                    300.0, 1000.0, 5000.0,
                    3.298677, 1.4082404e-3, -3.963222e-6, 5.641515e-9, -2.444854e-12, -1020.8999, 3.950372,
                    2.92664, 1.4879768e-3, -5.68476e-7, 1.0097038e-10, -6.753351e-15, -922.7977, 5.980528
                ]
            }]))
            .map_err(|e| SolverError::Config(e.to_string()))?;
            let n2 = species.model(0).clone();
            let cp_cold = n2.cp(300.0).map_err(|e| SolverError::Config(e.to_string()))?;
            info!("cp of N2 at 300 K: {:.3} J/(mol K)", cp_cold);

            let inlet = Boundary::from(
                Inlet::new("inlet", vec![300.0, 1.0]).with_component_names(&["T", "Y"]),
            );
            let mut column = ReactingColumn::new("flame", 31, 1.0)?
                .with_properties(ColumnProperties {
                    velocity: 1.0,
                    conductivity: 0.2,
                    diffusivity: 0.2,
                    heat_release: 1500.0,
                    pre_exponential: 2.0e3,
                    activation_temperature: 8000.0,
                    reference_cp: cp_cold,
                    ..ColumnProperties::default()
                })
                .with_ends(ColumnEnd::Neighbour, ColumnEnd::ZeroGradient, (true, true))
                .with_thermo(n2);
            column.set_temperature_bounds(200.0, 5000.0);
            let outlet = Boundary::from(Outlet::new("outlet", 2).with_component_names(&["T", "Y"]));
            let domains: Vec<Box<dyn Domain>> = vec![Box::new(inlet), Box::new(column), Box::new(outlet)];
            let chain = OneDim::from_domains(domains)?;

            let mut sim = Sim1D::new(chain)?;
            // burnt gas downstream of z = 0.3
            sim.set_profile(1, T, &[0.0, 0.3, 1.0], &[300.0, 1800.0, 1800.0])?;
            sim.set_profile(1, Y, &[0.0, 0.3, 1.0], &[1.0, 0.0, 0.0])?;
            sim.set_max_grid_points(Some(1), 200)?;
            let outcome = sim.solve(true)?;
            println!("flame: {}", outcome);
            sim.show_solution();
            sim.write_stats();
            sim.save("flame_solution.json", "flame", "premixed flame on a refined grid")?;
        }
        1 => {
            // thin thermal layer in front of a hot wall, resolved by refinement
            let inlet = Boundary::from(
                Inlet::new("inlet", vec![1.0, 1.0]).with_component_names(&["T", "Y"]),
            );
            let column = ReactingColumn::new("layer", 11, 1.0)?.with_properties(ColumnProperties {
                velocity: 40.0,
                ..ColumnProperties::default()
            });
            let wall = Boundary::from(
                Surface::new("wall", vec![2.0, 0.0]).with_component_names(&["T", "Y"]),
            );
            let domains: Vec<Box<dyn Domain>> = vec![Box::new(inlet), Box::new(column), Box::new(wall)];
            let mut sim = Sim1D::new(OneDim::from_domains(domains)?)?;
            sim.set_refine_criteria(Some(1), 5.0, 0.2, 0.3, 0.05)?;
            let outcome = sim.solve(true)?;
            println!("boundary layer: {}", outcome);
            let grid = sim.chain().domain(1).grid();
            println!("{} points, smallest spacing {:.3e}", grid.len(), min_spacing(grid));
            sim.show_solution();
            sim.write_stats();
        }
        2 => {
            // linear chain, configured from JSON; large time steps approach the steady state
            let config = SolverConfig::from_json_str(
                r#"{
                    "newton": { "norm": "WeightedRms" },
                    "time_stepping": { "initial_dt": 1e-3, "time_steps": [2, 4] }
                }"#,
            )?;
            let inlet = Boundary::from(Inlet::new("inlet", vec![0.0, 1.0]));
            let column = ReactingColumn::new("column", 9, 2.0)?;
            let wall = Boundary::from(Surface::new("wall", vec![1.0, 0.0]).with_position(2.0));
            let domains: Vec<Box<dyn Domain>> = vec![Box::new(inlet), Box::new(column), Box::new(wall)];
            let mut sim = Sim1D::with_config(OneDim::from_domains(domains)?, config)?;

            sim.eval_ss_jacobian()?;
            println!("Jacobian around the first column point:");
            for i in 2..6 {
                let row: Vec<String> = (0..8).map(|j| format!("{:9.3}", sim.jacobian(i, j))).collect();
                println!("{}", row.join(" "));
            }
            let dt = sim.time_step(10, 1.0e-2)?;
            println!("after 10 time steps: residual {:.3e}, next dt {:.3e}", sim.ssnorm()?, dt);
            let outcome = sim.newton_solve()?;
            println!("steady Newton solve: {:?}, residual {:.3e}", outcome, sim.ssnorm()?);
            println!("{}", sim.domain_solution(1)?);
        }
        _ => println!("no demo with number {}", task),
    }
    Ok(())
}

fn min_spacing(z: &[f64]) -> f64 {
    z.windows(2).map(|w| w[1] - w[0]).fold(f64::INFINITY, f64::min)
}
