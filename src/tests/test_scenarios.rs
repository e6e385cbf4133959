#[cfg(test)]
mod tests {
    use nalgebra::{Isometry3, Matrix4, Vector3};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use crate::chain::ArmSide;
    use crate::differencing::Differencing;
    use crate::kinematic_traits::ArmFrame;
    use crate::kinematics_error::KinematicsError;
    use crate::optimizer::ApplicationReturnStatus;
    use crate::parameters::{ArmParameters, SolverParameters};
    use crate::solver::{ArmSolver, SolverState};
    use crate::tests::test_utils::{SEED, check_within_bounds, perturb, random_configuration};
    use crate::tripod::Tripod;
    use crate::utils::{assert_transform_eq, translation};

    const DISTANCE_TOLERANCE: f64 = 1e-3;
    const ANGULAR_TOLERANCE: f64 = 1e-2;

    /// Targets the forward kinematics of the initial guess; the guess must come back.
    fn identity_scenario(arm: ArmParameters, q0: Option<Vec<f64>>) {
        let mut solver = ArmSolver::new(arm, SolverParameters::default(), 0);
        if let Some(q0) = q0 {
            solver.set_initial_guess(&q0).expect("full size guess");
        }
        let q0 = solver.initial_guess().to_vec();
        let target = solver.fkin(&q0, ArmFrame::EndEffector).expect("valid configuration");

        let solution = solver.ikin(&target).expect("valid target");
        assert!(solution.success, "status {}", solution.status);
        assert_eq!(solution.status, ApplicationReturnStatus::SolveSucceeded);
        for (q, expected) in solution.q.iter().zip(&q0) {
            assert!((q - expected).abs() < 1e-6, "{:?} vs {:?}", solution.q, q0);
        }
    }

    #[test]
    fn test_identity_scenario() {
        identity_scenario(ArmParameters::default(), None);
    }

    #[test]
    fn test_identity_scenario_without_offsets() {
        let arm = ArmParameters { t0: Matrix4::identity(), tn: Matrix4::identity(), ..ArmParameters::default() };
        identity_scenario(arm.clone(), None);

        let mut rng = StdRng::from_seed(SEED);
        let q0 = random_configuration(&mut rng, &arm);
        identity_scenario(arm, Some(q0));
    }

    fn round_trip(arm: ArmParameters, slv: SolverParameters, samples: usize) {
        let mut rng = StdRng::from_seed(SEED);
        let mut solver = ArmSolver::new(arm.clone(), slv, 0);

        for _ in 0..samples {
            let q = random_configuration(&mut rng, &arm);
            let target = solver.fkin(&q, ArmFrame::EndEffector).expect("valid configuration");
            solver.set_initial_guess(&perturb(&mut rng, &arm, &q)).expect("full size guess");

            let solution = solver.ikin(&target).expect("valid target");
            assert!(solution.success, "status {} for {:?}", solution.status, q);
            assert_eq!(solver.state(), SolverState::Succeeded);
            check_within_bounds(&arm, &solution.q).expect("solution within bounds");

            let reached = solver.fkin(&solution.q, ArmFrame::EndEffector).expect("valid configuration");
            assert_transform_eq(&reached, &target, DISTANCE_TOLERANCE, ANGULAR_TOLERANCE);
        }
    }

    #[test]
    fn test_round_trip_full_pose() {
        round_trip(ArmParameters::default(), SolverParameters::default(), 5);
    }

    #[test]
    fn test_round_trip_left_arm_central_difference() {
        let slv = SolverParameters { differencing: Differencing::Central, ..SolverParameters::default() };
        round_trip(ArmParameters::reference(ArmSide::Left), slv, 3);
    }

    #[test]
    fn test_round_trip_position_only() {
        let arm = ArmParameters::default();
        let slv = SolverParameters { full_pose: false, ..SolverParameters::default() };
        let mut solver = ArmSolver::new(arm.clone(), slv, 0);
        let mut rng = StdRng::from_seed(SEED);

        for _ in 0..5 {
            let q = random_configuration(&mut rng, &arm);
            let reached_pose = solver.fkin(&q, ArmFrame::EndEffector).expect("valid configuration");
            // Orientation the arm does not have to match
            let target = Isometry3::new(translation(&reached_pose), Vector3::new(0.3, -1.0, 2.0)).to_homogeneous();
            solver.set_initial_guess(&perturb(&mut rng, &arm, &q)).expect("full size guess");

            let solution = solver.ikin(&target).expect("valid target");
            assert!(solution.success, "status {}", solution.status);
            let reached = solver.fkin(&solution.q, ArmFrame::EndEffector).expect("valid configuration");
            let error = (translation(&reached) - translation(&target)).norm();
            assert!(error < DISTANCE_TOLERANCE, "position error {}", error);
        }
    }

    #[test]
    fn test_heave() {
        let arm = ArmParameters::default();
        let (torso_heave, lower_arm_heave) = (0.06, 0.015);
        let slv = SolverParameters {
            can_heave: true,
            torso_heave,
            lower_arm_heave,
            ..SolverParameters::default()
        };
        let mut solver = ArmSolver::new(arm.clone(), slv.clone(), 0);
        let mut rng = StdRng::from_seed(SEED);

        for _ in 0..3 {
            // Flat platforms at the requested heights make the target reachable under heave
            let mut q = random_configuration(&mut rng, &arm);
            q[0..3].fill(torso_heave);
            q[9..12].fill(lower_arm_heave);
            let target = solver.fkin(&q, ArmFrame::EndEffector).expect("valid configuration");
            solver.set_initial_guess(&perturb(&mut rng, &arm, &q)).expect("full size guess");

            let solution = solver.ikin(&target).expect("valid target");
            assert!(solution.success, "status {}", solution.status);

            // Heights are measured in each tripod's own base frame
            for (which, height) in [(Tripod::Proximal, torso_heave), (Tripod::Distal, lower_arm_heave)] {
                let start = which.offset(arm.chain_dof());
                let lengths = [solution.q[start], solution.q[start + 1], solution.q[start + 2]];
                let error = (height - arm.tripod(which).fkin(&lengths).p.z).abs();
                assert!(error <= slv.constr_tol, "{:?} height error {:e}", which, error);
            }

            for which in Tripod::BOTH {
                let range = match which {
                    Tripod::Proximal => 0..3,
                    Tripod::Distal => 9..12,
                };
                let lengths = [solution.q[range.start], solution.q[range.start + 1], solution.q[range.start + 2]];
                let tripod = arm.tripod(which);
                assert!(tripod.tilt_cosine(&lengths) >= tripod.cos_alpha_max - slv.constr_tol);
            }
        }
    }

    #[test]
    fn test_solutions_stay_within_bounds() {
        let arm = ArmParameters::default();
        let slv = SolverParameters { max_iter: 300, ..SolverParameters::default() };
        let mut solver = ArmSolver::new(arm.clone(), slv, 0);
        let mut rng = StdRng::from_seed(SEED);

        // Reachable and far out of reach targets alike
        for scale in [1.0, 1.0, 3.0] {
            let q = random_configuration(&mut rng, &arm);
            let mut target = solver.fkin(&q, ArmFrame::EndEffector).expect("valid configuration");
            for row in 0..3 {
                target[(row, 3)] *= scale;
            }
            let solution = solver.ikin(&target).expect("valid target");
            check_within_bounds(&arm, &solution.q).expect("solution within bounds");
        }
    }

    #[test]
    fn test_size_mismatch() {
        let mut solver = ArmSolver::new(ArmParameters::default(), SolverParameters::default(), 0);
        let before = solver.initial_guess().to_vec();

        let short = vec![0.0; 11];
        assert_eq!(
            solver.set_initial_guess(&short),
            Err(KinematicsError::SizeMismatch { expected: 12, found: 11 })
        );
        assert_eq!(solver.initial_guess(), &before[..]);
        assert!(solver.fkin(&short, ArmFrame::EndEffector).is_err());
        assert!(solver.fkin(&before, ArmFrame::EndEffector).is_ok());
    }

    #[test]
    fn test_flat_platform_continuity() {
        let solver = ArmSolver::new(ArmParameters::default(), SolverParameters::default(), 0);
        let mut q = solver.initial_guess().to_vec();
        q[0..3].fill(0.1);
        let flat = solver.fkin(&q, ArmFrame::EndEffector).expect("valid configuration");
        for delta in [1e-4, 1e-6, 1e-8] {
            q[1] = 0.1 + delta;
            let tilted = solver.fkin(&q, ArmFrame::EndEffector).expect("valid configuration");
            // The arm tip lever makes the displacement larger than the leg change
            assert_transform_eq(&tilted, &flat, 100.0 * delta, 100.0 * delta);
        }
    }

    #[test]
    fn test_intermediate_frames() {
        let arm = ArmParameters::default();
        let solver = ArmSolver::new(arm.clone(), SolverParameters::default(), 0);
        let q = solver.initial_guess().to_vec();
        let dof = arm.chain_dof() as i32;

        let tip = solver.fkin(&q, ArmFrame::EndEffector).expect("valid configuration");
        for index in [-1, dof + 2, 100] {
            let frame = ArmFrame::from_index(index, arm.chain_dof());
            assert_eq!(solver.fkin(&q, frame).expect("valid configuration"), tip);
        }

        // Flat lower arm platform at height l, tip offset along the platform normal
        let distal = solver.fkin(&q, ArmFrame::from_index(dof + 1, arm.chain_dof())).expect("valid configuration");
        assert!((distal * arm.tn - tip).amax() < 1e-12);

        let torso = solver.fkin(&q, ArmFrame::from_index(0, arm.chain_dof())).expect("valid configuration");
        assert!((torso - arm.t0 * arm.torso.fkin(&[q[0], q[1], q[2]]).t).amax() < 1e-12);
    }
}
