use anyhow::{bail, Context, Result};
use clap::Parser;
use grasp_closure::analysis::GraspAnalysis;
use grasp_closure::parameters_grasps::grasps;
use grasp_closure::quality::Strategy;
use grasp_closure::utils::{dump_force_closure, dump_matrix, dump_quality};

/// Analyzes a grasp for force closure and quality. The grasp is read from a YAML scenario
/// file or taken from one of the built in presets.
#[derive(Parser, Debug)]
#[clap(author, version, name = "grasp-closure")]
struct CommandLineArguments {
    /// YAML scenario file
    pub scenario: Option<String>,

    /// Built in grasp to use instead of a file
    #[clap(long)]
    pub preset: Option<String>,

    /// Friction coefficient for presets
    #[clap(long, default_value_t = grasps::DEFAULT_FRICTION)]
    pub friction: f64,

    /// Use the Minkowski sum instead of the strategy of the scenario
    #[clap(long)]
    pub minkowski: bool,

    /// Print the scenario as YAML before analyzing it
    #[clap(long)]
    pub echo: bool,
}

fn load(args: &CommandLineArguments) -> Result<GraspAnalysis> {
    match (&args.scenario, &args.preset) {
        (Some(path), None) => GraspAnalysis::from_yaml_file(path)
            .with_context(|| format!("Failed to load grasp scenario {}", path)),
        (None, Some(name)) => match grasps::by_name(name, args.friction) {
            Some(analysis) => Ok(analysis),
            None => bail!("Unknown preset '{}', known presets: {}", name, grasps::PRESETS.join(", ")),
        },
        (None, None) => bail!("Either a scenario file or --preset is required"),
        (Some(_), Some(_)) => bail!("Give either a scenario file or --preset, not both"),
    }
}

fn main() -> Result<()> {
    let args = CommandLineArguments::parse();
    let mut analysis = load(&args)?;
    if args.minkowski {
        analysis = analysis.with_strategy(Strategy::Minkowski);
    }
    if args.echo {
        println!("{}", analysis.to_yaml());
    }

    let report = analysis.run()?;
    println!("Grasp wrench matrix:");
    dump_matrix(report.grasp.matrix());
    dump_force_closure(&report.closure, &report.grasp);
    match &report.quality {
        Ok(metric) => dump_quality(metric),
        Err(err) => println!("Quality not available: {}", err),
    }
    Ok(())
}
