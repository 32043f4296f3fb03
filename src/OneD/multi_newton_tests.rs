#[cfg(test)]
mod tests {
    use crate::OneD::domain::{Coupling, Domain};
    use crate::OneD::errors::{DomainError, SolverError};
    use crate::OneD::multi_jac::MultiJac;
    use crate::OneD::multi_newton::{
        DampStatus, MultiNewton, NewtonOutcome, bound_step, weighted_norm,
    };
    use crate::OneD::one_dim::OneDim;
    use crate::OneD::solver_config::{JacobianConfig, NewtonConfig, StepNorm};
    use crate::OneD::test_domains::{Block, LinearSystem, Scalar};
    use approx::assert_relative_eq;
    use nalgebra::{DMatrix, DVector};

    fn solver_for(domains: Vec<Box<dyn Domain>>) -> (OneDim, MultiJac, MultiNewton) {
        let chain = OneDim::from_domains(domains).unwrap();
        let jac = MultiJac::new(&chain, &JacobianConfig::default());
        let newton = MultiNewton::new(chain.size(), NewtonConfig::default(), 20);
        (chain, jac, newton)
    }

    #[test]
    fn linear_system_converges_in_two_iterations() {
        let a = DMatrix::from_row_slice(3, 3, &[4.0, -1.0, 0.5, 1.0, 3.0, -1.0, 0.2, 0.5, 2.0]);
        let b = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        let exact = a.clone().lu().solve(&b).unwrap();
        let (mut chain, mut jac, mut newton) =
            solver_for(vec![Box::new(LinearSystem::new(a, b)) as Box<dyn Domain>]);
        assert_eq!(chain.bandwidth(), 5);
        let x0 = vec![0.0; 3];
        let mut x1 = vec![0.0; 3];
        let outcome = newton.solve(&x0, &mut x1, &mut chain, &mut jac).unwrap();
        match outcome {
            NewtonOutcome::Converged {
                iterations,
                new_jacobian,
            } => {
                assert!(iterations <= 2);
                assert!(new_jacobian);
            }
            other => panic!("linear system did not converge: {:?}", other),
        }
        for i in 0..3 {
            assert_relative_eq!(x1[i], exact[i], epsilon = 1e-6);
        }
        // steady convergence resets the Jacobian age
        assert_eq!(jac.age(), 0);

        // a second solve from the solution reuses the Jacobian
        let x0 = x1.clone();
        let outcome = newton.solve(&x0, &mut x1, &mut chain, &mut jac).unwrap();
        assert_eq!(
            outcome,
            NewtonOutcome::Converged {
                iterations: 1,
                new_jacobian: false
            }
        );
    }

    #[test]
    fn accepted_steps_never_increase_the_step_norm() {
        let domains: Vec<Box<dyn Domain>> = vec![
            Box::new(Block::new("A", 4, 2, Coupling::new(None, Some(1)))),
            Box::new(Block::new("B", 3, 1, Coupling::new(Some(2), None))),
        ];
        let (mut chain, mut jac, mut newton) = solver_for(domains);
        let x0 = vec![5.0; chain.size()];
        let mut x1 = vec![0.0; chain.size()];
        let outcome = newton.solve(&x0, &mut x1, &mut chain, &mut jac).unwrap();
        assert!(outcome.is_converged());
        assert!(!newton.history().is_empty());
        for record in newton.history() {
            match record.status {
                DampStatus::Accepted => assert!(record.s1 < record.s0),
                DampStatus::Converged => assert!(record.s1 <= 1.0),
                _ => {}
            }
        }
        // the converged point is a root of the residual
        let mut r = vec![0.0; chain.size()];
        let norm = chain.ssnorm(&x1, &mut r).unwrap();
        assert!(norm < 1e-3, "residual norm {}", norm);
    }

    #[test]
    fn tight_tolerance_accepts_only_decreasing_steps() {
        let domains: Vec<Box<dyn Domain>> = vec![
            Box::new(Block::new("A", 4, 2, Coupling::new(None, Some(1)))),
            Box::new(Block::new("B", 3, 1, Coupling::new(Some(2), None))),
        ];
        let (mut chain, mut jac, _) = solver_for(domains);
        let config = NewtonConfig {
            convergence_tolerance: 0.1,
            ..NewtonConfig::default()
        };
        let mut newton = MultiNewton::new(chain.size(), config, 20);
        let x0 = vec![5.0; chain.size()];
        let mut x1 = vec![0.0; chain.size()];
        let outcome = newton.solve(&x0, &mut x1, &mut chain, &mut jac).unwrap();
        assert!(outcome.is_converged(), "{:?}", outcome);
        for record in newton.history() {
            match record.status {
                DampStatus::Accepted => {
                    assert!(record.s1 < record.s0, "accepted {} after {}", record.s1, record.s0)
                }
                DampStatus::Converged => assert!(record.s1 <= 0.1),
                _ => {}
            }
        }
    }

    #[test]
    fn wrong_vector_lengths_are_rejected() {
        let (mut chain, mut jac, mut newton) =
            solver_for(vec![Box::new(Scalar::new(quadratic, -1.0e20, 1.0)) as Box<dyn Domain>]);
        let mut x1 = vec![0.0];
        assert!(matches!(
            newton.solve(&[1.0, 2.0], &mut x1, &mut chain, &mut jac),
            Err(SolverError::SizeMismatch { expected: 1, found: 2 })
        ));
        let mut short: Vec<f64> = Vec::new();
        assert!(matches!(
            newton.solve(&[1.0], &mut short, &mut chain, &mut jac),
            Err(SolverError::SizeMismatch { expected: 1, found: 0 })
        ));
        // work arrays sized for another chain
        let mut stale = MultiNewton::new(3, NewtonConfig::default(), 20);
        assert!(matches!(
            stale.solve(&[1.0], &mut x1, &mut chain, &mut jac),
            Err(SolverError::SizeMismatch { expected: 1, found: 3 })
        ));
        assert!(newton.solve(&[1.0], &mut x1, &mut chain, &mut jac).unwrap().is_converged());
    }

    fn log_residual(x: f64) -> Result<f64, DomainError> {
        if x <= 0.0 {
            return Err(DomainError::InvalidState {
                domain: "scalar".to_owned(),
                message: format!("logarithm of {}", x),
            });
        }
        Ok(2.0_f64.ln() - x.ln())
    }

    #[test]
    fn residual_failure_at_trial_point_is_damped() {
        // the undamped step from 10 lands at a negative x
        let (mut chain, mut jac, mut newton) =
            solver_for(vec![Box::new(Scalar::new(log_residual, -1.0e20, 10.0)) as Box<dyn Domain>]);
        let mut x1 = vec![0.0];
        let outcome = newton.solve(&[10.0], &mut x1, &mut chain, &mut jac).unwrap();
        assert!(outcome.is_converged(), "{:?}", outcome);
        assert_relative_eq!(x1[0], 2.0, epsilon = 1e-3);
        let first = newton.history()[0];
        assert!(first.damping < 1.0);
    }

    #[test]
    fn failure_at_the_start_point_diverges() {
        let (mut chain, mut jac, mut newton) =
            solver_for(vec![Box::new(Scalar::new(log_residual, -1.0e20, -1.0)) as Box<dyn Domain>]);
        let mut x1 = vec![0.0];
        let outcome = newton.solve(&[-1.0], &mut x1, &mut chain, &mut jac).unwrap();
        assert_eq!(outcome, NewtonOutcome::Diverged);
        // the caller's start point comes back unchanged
        assert_eq!(x1[0], -1.0);
    }

    fn no_root(_x: f64) -> Result<f64, DomainError> {
        Ok(1.0)
    }

    fn quadratic(x: f64) -> Result<f64, DomainError> {
        Ok(x * x - 4.0)
    }

    #[test]
    fn singular_jacobian_diverges() {
        let (mut chain, mut jac, mut newton) =
            solver_for(vec![Box::new(Scalar::new(no_root, -1.0e20, 0.0)) as Box<dyn Domain>]);
        let mut x1 = vec![0.0];
        assert_eq!(
            newton.solve(&[0.0], &mut x1, &mut chain, &mut jac).unwrap(),
            NewtonOutcome::Diverged
        );
    }

    #[test]
    fn iteration_limit() {
        let (mut chain, mut jac, _) =
            solver_for(vec![Box::new(Scalar::new(quadratic, -1.0e20, 100.0)) as Box<dyn Domain>]);
        let config = NewtonConfig {
            max_iterations: 2,
            ..NewtonConfig::default()
        };
        let mut newton = MultiNewton::new(1, config, 20);
        let mut x1 = vec![0.0];
        assert_eq!(
            newton.solve(&[100.0], &mut x1, &mut chain, &mut jac).unwrap(),
            NewtonOutcome::StepLimitExceeded
        );
        // with the default limit the same start converges
        let mut newton = MultiNewton::new(1, NewtonConfig::default(), 20);
        assert!(newton.solve(&[100.0], &mut x1, &mut chain, &mut jac).unwrap().is_converged());
        assert_relative_eq!(x1[0], 2.0, epsilon = 1e-3);
    }

    #[test]
    fn bound_factor_and_weights() {
        let chain = OneDim::from_domains(vec![Box::new(Scalar::new(quadratic, 0.0, 1.0)) as Box<dyn Domain>])
            .unwrap();
        assert_eq!(bound_step(&[1.0], &[-4.0], &chain), 0.25);
        assert_eq!(bound_step(&[1.0], &[0.5], &chain), 1.0);
        assert_eq!(bound_step(&[0.0], &[-1.0], &chain), 0.0);
        // ewt = 1e-4 * 1 + 1e-9
        let ewt = 1.0e-4 + 1.0e-9;
        assert_relative_eq!(
            weighted_norm(StepNorm::WeightedMax, &[1.0], &[1.0e-3], &chain),
            1.0e-3 / ewt,
            epsilon = 1e-9
        );
        assert_relative_eq!(
            weighted_norm(StepNorm::WeightedRms, &[-1.0], &[-1.0e-3], &chain),
            1.0e-3 / ewt,
            epsilon = 1e-9
        );
    }
}
