#[cfg(test)]
mod tests {
    use nalgebra::{Matrix4, Vector3};

    use crate::differencing::Differencing;
    use crate::kinematic_traits::{ArmFrame, SerialChain};
    use crate::parameters::{ArmParameters, SolverParameters};
    use crate::solver::ArmSolver;

    const READ_ERROR: &'static str = "Failed to load parameters from file";

    #[test]
    fn test_solver_parameters_from_yaml() {
        let loaded = SolverParameters::from_yaml_file("src/tests/data/solver.yaml").expect(READ_ERROR);
        let expected = SolverParameters {
            full_pose: false,
            can_heave: true,
            differencing: Differencing::Central,
            tol: 1e-6,
            constr_tol: 1e-5,
            max_iter: 500,
            torso_heave: 0.1,
            lower_arm_heave: 0.01,
            weight_postural_torso: 0.5,
            weight_postural_upper_arm: 0.25,
        };
        assert_eq!(loaded, expected);
    }

    #[test]
    fn test_arm_parameters_from_yaml() {
        let loaded = ArmParameters::from_yaml_file("src/tests/data/arm.yaml").expect(READ_ERROR);

        assert_eq!(loaded.torso.radius, 0.09);
        assert_eq!(loaded.torso.alpha_max, 25.0);
        assert!((loaded.torso.cos_alpha_max - 25.0_f64.to_radians().cos()).abs() < 1e-15);
        assert_eq!(loaded.lower_arm.l_max, 0.03);
        assert_eq!(loaded.t0, Matrix4::new_translation(&Vector3::new(0.1, 0.0, 0.5)));
        assert_eq!(loaded.tn, Matrix4::new_translation(&Vector3::new(0.0, 0.0, 0.06)));

        // The explicit chain wins over the side preset
        assert_eq!(loaded.chain_dof(), 3);
        assert_eq!(loaded.dof(), 9);
        assert!((loaded.upper_arm.joint_max(1) - 110.0_f64.to_radians()).abs() < 1e-15);
        assert_eq!(loaded.upper_arm.joint_min(2), 0.0);
    }

    #[test]
    fn test_solve_with_loaded_parameters() {
        let arm = ArmParameters::from_yaml_file("src/tests/data/arm.yaml").expect(READ_ERROR);
        let slv = SolverParameters {
            can_heave: false,
            ..SolverParameters::from_yaml_file("src/tests/data/solver.yaml").expect(READ_ERROR)
        };
        let mut solver = ArmSolver::new(arm, slv, 0);

        let q0 = solver.initial_guess().to_vec();
        assert_eq!(q0.len(), 9);
        let target = solver.fkin(&q0, ArmFrame::EndEffector).expect("valid configuration");
        let solution = solver.ikin(&target).expect("valid target");
        assert!(solution.success, "status {}", solution.status);
    }
}
