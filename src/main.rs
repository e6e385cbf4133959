use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use nalgebra::{Isometry3, Vector3};

use tripod_arm_kinematics::kinematic_traits::ArmFrame;
use tripod_arm_kinematics::parameters::{ArmParameters, SolverParameters};
use tripod_arm_kinematics::solver::ArmSolver;
use tripod_arm_kinematics::utils::{dump_transform, format_configuration};

/// Forward and inverse kinematics of a tripod, serial chain, tripod arm.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// YAML file with the `arm` section. The right reference arm is used if not given.
    #[arg(long)]
    arm: Option<String>,

    /// YAML file with the `solver` section. Defaults are used if not given.
    #[arg(long)]
    solver: Option<String>,

    /// Verbosity; repeat for more. Above 5 the optimizer logs its own progress.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Pose of a frame for the configuration (tripod lengths in m, chain joints in deg).
    Fkin {
        /// Frame: 0 torso platform, 1..=N chain links, N+1 lower arm platform, -1 end effector.
        #[arg(short, long, default_value_t = -1, allow_hyphen_values = true)]
        frame: i32,

        #[arg(required = true, allow_hyphen_values = true)]
        q: Vec<f64>,
    },

    /// Configuration reaching the pose: position (m) and rotation vector (rad).
    Ikin {
        #[arg(num_args = 6, required = true, allow_hyphen_values = true)]
        pose: Vec<f64>,

        /// Initial guess, comma separated.
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        q0: Option<Vec<f64>>,
    },

    /// Print the solver parameters in use.
    Parameters,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let arm = match &cli.arm {
        Some(path) => ArmParameters::from_yaml_file(path).with_context(|| format!("reading {}", path))?,
        None => ArmParameters::default(),
    };
    let slv = match &cli.solver {
        Some(path) => SolverParameters::from_yaml_file(path).with_context(|| format!("reading {}", path))?,
        None => SolverParameters::default(),
    };
    let mut solver = ArmSolver::new(arm, slv, cli.verbose as u32);

    match cli.command {
        Some(Commands::Fkin { frame, q }) => {
            let frame = ArmFrame::from_index(frame, solver.arm_parameters().chain_dof());
            let h = solver.fkin(&q, frame)?;
            dump_transform(&h);
        }
        Some(Commands::Ikin { pose, q0 }) => {
            if let Some(q0) = q0 {
                solver.set_initial_guess(&q0)?;
            }
            let target = Isometry3::new(
                Vector3::new(pose[0], pose[1], pose[2]),
                Vector3::new(pose[3], pose[4], pose[5]),
            ).to_homogeneous();
            let solution = solver.ikin(&target)?;
            println!("[{}]", format_configuration(&solution.q));
            if !solution.success {
                bail!("no solution found: {}", solution.status);
            }
            dump_transform(&solver.fkin(&solution.q, ArmFrame::EndEffector)?);
        }
        Some(Commands::Parameters) => {
            print!("{}", solver.solver_parameters().to_yaml());
        }
        None => demo(&mut solver)?,
    }
    Ok(())
}

/// Moves the arm away from its rest pose and solves back for the reached pose.
fn demo(solver: &mut ArmSolver) -> Result<()> {
    let mut q = solver.initial_guess().to_vec();
    println!("Rest configuration: [{}]", format_configuration(&q));
    dump_transform(&solver.fkin(&q, ArmFrame::EndEffector)?);

    // Tilt the torso, bend the elbow, tilt the wrist
    q[0] = 0.04;
    q[1] = 0.02;
    q[6] += 20.0;
    q[9] = 0.01;
    let target = solver.fkin(&q, ArmFrame::EndEffector)?;
    println!("Target configuration: [{}]", format_configuration(&q));
    dump_transform(&target);

    let solution = solver.ikin(&target)?;
    println!("Solution ({}): [{}]", solution.status, format_configuration(&solution.q));
    dump_transform(&solver.fkin(&solution.q, ArmFrame::EndEffector)?);
    Ok(())
}
