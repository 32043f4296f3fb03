#[cfg(test)]
mod tests {
    use crate::OneD::boundaries::{Boundary, Inlet, Outlet, Surface, create_boundary};
    use crate::OneD::domain::{Coupling, Domain};
    use crate::OneD::errors::{DomainError, Side, TopologyError};
    use crate::OneD::multi_jac::MultiJac;
    use crate::OneD::one_dim::OneDim;
    use crate::OneD::reacting_column::{ColumnEnd, ColumnProperties, ReactingColumn};
    use crate::OneD::solver_config::JacobianConfig;
    use crate::OneD::test_domains::Block;
    use approx::assert_relative_eq;

    /// A: 3 points x 2 components, B: 2 points x 1 component
    fn two_block_chain() -> OneDim {
        let a = Block::new("A", 3, 2, Coupling::new(None, Some(1)));
        let b = Block::new("B", 2, 1, Coupling::new(Some(2), None));
        let domains: Vec<Box<dyn Domain>> = vec![Box::new(a), Box::new(b)];
        OneDim::from_domains(domains).unwrap()
    }

    fn flame_chain(n: usize) -> OneDim {
        let inlet = Boundary::from(Inlet::new("inlet", vec![1.0, 1.0]));
        let column = ReactingColumn::new("column", n, 1.0)
            .unwrap()
            .with_properties(ColumnProperties {
                velocity: 2.0,
                heat_release: 3.0,
                pre_exponential: 50.0,
                activation_temperature: 4.0,
                ..ColumnProperties::default()
            })
            .with_ends(ColumnEnd::Neighbour, ColumnEnd::ZeroGradient, (true, true));
        let outlet = Boundary::from(Outlet::new("outlet", 2));
        let domains: Vec<Box<dyn Domain>> = vec![Box::new(inlet), Box::new(column), Box::new(outlet)];
        OneDim::from_domains(domains).unwrap()
    }

    /// smooth positive state for the flame chain
    fn flame_state(chain: &OneDim) -> Vec<f64> {
        (0..chain.size())
            .map(|k| {
                let s = k as f64 / chain.size() as f64;
                if k % 2 == 0 { 1.0 + 2.0 * s } else { 1.0 - 0.8 * s }
            })
            .collect()
    }

    #[test]
    fn two_domain_layout() {
        let chain = two_block_chain();
        assert_eq!(chain.size(), 3 * 2 + 2 * 1);
        assert_eq!(chain.points(), 5);
        assert_eq!(chain.start(1), 6);
        assert_eq!(chain.first_point(1), 3);
        assert_eq!(chain.point_domain(4), 1);
        // max(2*2 - 1, 2 + 1 - 1)
        assert_eq!(chain.bandwidth(), 3);
        assert_eq!(chain.domain_index("B"), Ok(1));
        assert_eq!(
            chain.domain_index("C"),
            Err(TopologyError::UnknownDomain("C".to_owned()))
        );
    }

    #[test]
    fn location_map_is_monotone() {
        let chain = flame_chain(9);
        let mut expected = 0;
        for jg in 0..chain.points() {
            assert_eq!(chain.loc(jg), expected);
            assert!(chain.n_vars(jg) > 0);
            expected += chain.n_vars(jg);
        }
        assert_eq!(expected, chain.size());
        assert_eq!(chain.size(), 2 + 9 * 2 + 2);
    }

    #[test]
    fn removing_a_domain_breaks_validation() {
        let mut chain = two_block_chain();
        let removed = chain.remove_domain(1).unwrap();
        assert_eq!(removed.name(), "B");
        assert!(!chain.is_ready());
        assert_eq!(
            chain.resize(),
            Err(TopologyError::DanglingCoupling {
                domain: "A".to_owned(),
                side: Side::Right
            })
        );

        let mut chain = two_block_chain();
        chain.remove_domain(0).unwrap();
        assert_eq!(
            chain.validate(),
            Err(TopologyError::DanglingCoupling {
                domain: "B".to_owned(),
                side: Side::Left
            })
        );
        assert_eq!(
            chain.remove_domain(3).err(),
            Some(TopologyError::IndexOutOfRange { index: 3, len: 1 })
        );
    }

    #[test]
    fn topology_errors() {
        assert_eq!(OneDim::new().validate(), Err(TopologyError::EmptyChain));

        let empty: Box<dyn Domain> = Box::new(Block::new("E", 0, 1, Coupling::isolated()));
        assert_eq!(
            OneDim::from_domains(vec![empty]).err(),
            Some(TopologyError::EmptyDomain("E".to_owned()))
        );

        let a = Block::new("A", 3, 2, Coupling::new(None, Some(2)));
        let b = Block::new("B", 2, 1, Coupling::new(Some(2), None));
        let domains: Vec<Box<dyn Domain>> = vec![Box::new(a), Box::new(b)];
        assert_eq!(
            OneDim::from_domains(domains).err(),
            Some(TopologyError::CouplingMismatch {
                domain: "A".to_owned(),
                neighbour: "B".to_owned(),
                side: Side::Right,
                expected: 2,
                found: 1
            })
        );

        let a = Block::new("A", 3, 2, Coupling::new(None, Some(1)));
        let b = Block::new("B", 2, 1, Coupling::isolated());
        let domains: Vec<Box<dyn Domain>> = vec![Box::new(a), Box::new(b)];
        assert!(matches!(
            OneDim::from_domains(domains),
            Err(TopologyError::UnexpectedNeighbour { side: Side::Left, .. })
        ));

        let mut chain = OneDim::new();
        chain.add_domain(Box::new(Boundary::from(Inlet::new("in", vec![1.0]))));
        chain.add_domain(Box::new(Boundary::from(Surface::new("wall", vec![2.0]))));
        assert!(chain.resize().is_ok());
        assert_eq!(chain.size(), 2);
    }

    #[test]
    fn eval_requires_resized_chain() {
        let mut chain = two_block_chain();
        chain.add_domain(Box::new(Block::new("C", 1, 1, Coupling::isolated())));
        let x = vec![0.0; 8];
        let mut r = vec![0.0; 8];
        assert!(chain.eval(None, &x, &mut r, None, true).is_err());
    }

    #[test]
    fn invalidated_chain_refuses_eval_until_resized() {
        let mut chain = two_block_chain();
        let x = vec![0.0; 8];
        let mut r = vec![0.0; 8];
        chain.invalidate();
        assert!(!chain.is_ready());
        assert!(matches!(
            chain.eval(None, &x, &mut r, None, true),
            Err(DomainError::InvalidState { .. })
        ));
        chain.resize().unwrap();
        assert!(chain.is_ready());
        chain.eval(None, &x, &mut r, None, true).unwrap();
        assert_eq!(chain.n_evals(), 1);
    }

    #[test]
    fn wrong_vector_lengths_return_errors() {
        let mut chain = two_block_chain();
        let mut jac = MultiJac::new(&chain, &JacobianConfig::default());
        let x = vec![0.5; 8];
        let mut r = vec![0.0; 8];
        let mut long = vec![0.0; 9];
        assert!(matches!(
            chain.eval(None, &x[..7], &mut r, None, false),
            Err(DomainError::InvalidState { .. })
        ));
        assert!(chain.eval(None, &x, &mut long, None, false).is_err());
        assert!(chain.ssnorm(&x[..7], &mut r).is_err());
        // a previous time level of another size
        chain.init_time_integ(1.0, &x[..3]);
        assert!(chain.eval(None, &x, &mut r, None, false).is_err());
        chain.init_time_integ(1.0, &x);
        chain.set_steady_mode();
        chain.eval(None, &x, &mut r, Some(0.0), false).unwrap();

        assert!(matches!(
            jac.eval(&x[..7], &r, 0.0, &mut chain),
            Err(DomainError::InvalidState { .. })
        ));
        assert!(jac.eval(&x, &long, 0.0, &mut chain).is_err());
        assert!(jac.is_stale());
        jac.eval(&x, &r, 0.0, &mut chain).unwrap();
        assert!(!jac.is_stale());
    }

    #[test]
    fn grid_checks_leave_domains_unchanged() {
        let mut wall = Surface::new("wall", vec![1.0]);
        assert!(wall.check_grid(&[0.0, 1.0]).is_err());
        assert!(wall.setup_grid(&[0.0, 1.0]).is_err());
        assert_eq!(wall.grid().len(), 1);
        wall.check_grid(&[2.0]).unwrap();

        let mut column = ReactingColumn::new("column", 5, 1.0).unwrap();
        let z = column.grid().to_vec();
        assert!(column.check_grid(&[0.0, 0.5]).is_err());
        assert!(column.check_grid(&[0.0, 0.5, 0.5, 1.0]).is_err());
        assert!(column.setup_grid(&[0.0, 0.7, 0.5, 1.0]).is_err());
        assert_eq!(column.grid(), z.as_slice());
        column.check_grid(&[0.0, 0.1, 1.0]).unwrap();
        column.setup_grid(&[0.0, 0.1, 1.0]).unwrap();
        assert_eq!(column.n_points(), 3);
    }

    #[test]
    fn restricted_eval_matches_full_eval() {
        for mut chain in [two_block_chain(), flame_chain(7)] {
            let n = chain.size();
            let x: Vec<f64> = if n == 8 {
                (0..n).map(|k| 0.3 + 0.1 * k as f64).collect()
            } else {
                flame_state(&chain)
            };
            let mut full = vec![0.0; n];
            chain.eval(None, &x, &mut full, Some(0.0), false).unwrap();
            for jg in 0..chain.points() {
                let mut r = vec![f64::NAN; n];
                chain.eval(Some(jg), &x, &mut r, Some(0.0), false).unwrap();
                for p in 0..chain.points() {
                    let rows = chain.loc(p)..chain.loc(p) + chain.n_vars(p);
                    let in_scope = p + 1 >= jg && p <= jg + 1;
                    for k in rows {
                        if in_scope {
                            assert_eq!(r[k], full[k], "row {} for point {}", k, jg);
                        } else {
                            assert!(r[k].is_nan(), "row {} written for point {}", k, jg);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn pseudo_time_term_only_on_masked_rows() {
        let mut chain = flame_chain(6);
        let x = flame_state(&chain);
        let x_prev: Vec<f64> = x.iter().map(|v| 0.9 * v).collect();
        let n = chain.size();
        let mut steady = vec![0.0; n];
        chain.eval(None, &x, &mut steady, Some(0.0), false).unwrap();
        assert!(chain.steady());
        assert!(chain.init_time_integ(0.5, &x_prev));
        assert!(chain.transient());
        assert_eq!(chain.previous_solution(), &x_prev[..]);
        assert_eq!(chain.rdt(), 2.0);
        let mut transient = vec![0.0; n];
        chain.eval(None, &x, &mut transient, None, true).unwrap();
        let mask = chain.transient_mask().to_vec();
        // boundaries and column ends are algebraic
        assert!(!mask[0] && !mask[1] && !mask[2] && !mask[n - 1]);
        assert!(mask[4]);
        for k in 0..n {
            let expected = if mask[k] { steady[k] - 2.0 * (x[k] - x_prev[k]) } else { steady[k] };
            assert_relative_eq!(transient[k], expected, epsilon = 1e-12);
        }
        assert_eq!(chain.n_evals(), 1);
        assert!(chain.set_steady_mode());
        assert!(!chain.set_steady_mode());
        let norm = chain.ssnorm(&x, &mut transient).unwrap();
        let expected = steady.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        assert_eq!(norm, expected);
    }

    #[test]
    fn perturbation_changes_only_neighbouring_rows() {
        for mut chain in [two_block_chain(), flame_chain(6)] {
            let n = chain.size();
            let x: Vec<f64> = if n == 8 {
                (0..n).map(|k| 0.2 + 0.05 * k as f64).collect()
            } else {
                flame_state(&chain)
            };
            let mut base = vec![0.0; n];
            chain.eval(None, &x, &mut base, Some(0.0), false).unwrap();
            for jg in 0..chain.points() {
                for m in 0..chain.n_vars(jg) {
                    let k = chain.loc(jg) + m;
                    let mut xp = x.clone();
                    xp[k] += 1e-3;
                    let mut r = vec![0.0; n];
                    chain.eval(None, &xp, &mut r, Some(0.0), false).unwrap();
                    for p in 0..chain.points() {
                        if p + 1 < jg || p > jg + 1 {
                            for row in chain.loc(p)..chain.loc(p) + chain.n_vars(p) {
                                assert_eq!(r[row], base[row]);
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn jacobian_columns_match_full_differences() {
        let mut chain = flame_chain(6);
        let config = JacobianConfig::default();
        let mut jac = MultiJac::new(&chain, &config);
        assert!(jac.is_stale());
        let x = flame_state(&chain);
        let n = chain.size();
        let mut r0 = vec![0.0; n];
        chain.eval(None, &x, &mut r0, Some(0.0), false).unwrap();
        jac.eval(&x, &r0, 0.0, &mut chain).unwrap();
        assert!(!jac.is_stale());
        assert_eq!(jac.n_evals(), 1);
        assert_eq!(jac.age(), 0);
        for k in 0..n {
            let mut xp = x.clone();
            xp[k] = x[k] + config.atol + x[k].abs() * config.rtol;
            let dx = xp[k] - x[k];
            let mut r = vec![0.0; n];
            chain.eval(None, &xp, &mut r, Some(0.0), false).unwrap();
            for i in 0..n {
                let fd = (r[i] - r0[i]) / dx;
                assert_relative_eq!(jac.value(i, k), fd, epsilon = 1e-9, max_relative = 1e-9);
            }
        }
        // Jacobian perturbations are not counted as residual evaluations
        assert_eq!(chain.n_evals(), 0);

        let rdt = 4.0;
        jac.update_transient(rdt, chain.transient_mask());
        for k in 0..n {
            let shift = if chain.transient_mask()[k] { rdt } else { 0.0 };
            let mut xp = x.clone();
            xp[k] += config.atol + x[k].abs() * config.rtol;
            let dx = xp[k] - x[k];
            let mut r = vec![0.0; n];
            chain.eval(None, &xp, &mut r, Some(0.0), false).unwrap();
            assert_relative_eq!(jac.value(k, k), (r[k] - r0[k]) / dx - shift, epsilon = 1e-9, max_relative = 1e-9);
        }
    }

    #[test]
    fn boundaries_from_names() {
        assert!(create_boundary("wall", "w", vec![1.0]).is_none());
        let inlet = create_boundary("inlet", "in", vec![3.0, 4.0]).unwrap();
        let outlet = create_boundary("outlet", "out", vec![0.0, 0.0]).unwrap();
        assert_eq!(inlet.n_components(), 2);
        assert!(!inlet.is_transient(0, 0));
        let column = ReactingColumn::new("column", 4, 1.0)
            .unwrap()
            .with_ends(ColumnEnd::Neighbour, ColumnEnd::ZeroGradient, (true, true));
        let domains: Vec<Box<dyn Domain>> = vec![Box::new(inlet), Box::new(column), Box::new(outlet)];
        let mut chain = OneDim::from_domains(domains).unwrap();
        let n = chain.size();
        let x: Vec<f64> = (0..n).map(|k| k as f64).collect();
        let mut r = vec![0.0; n];
        chain.eval(None, &x, &mut r, Some(0.0), false).unwrap();
        // inlet: x - value
        assert_eq!(r[0], -3.0);
        assert_eq!(r[1], -3.0);
        // outlet copies the last column point
        assert_eq!(r[n - 2], x[n - 2] - x[n - 4]);
        assert_eq!(r[n - 1], x[n - 1] - x[n - 3]);
    }
}
