use clap::Parser;
use dgpe_common::{read_toml, TomlParameters};
use dgpe_simulator::{simulation_object::*, utils::io::parameters_from_toml};
use std::error::Error;
use std::time::Instant;

#[derive(Parser)]
pub struct CommandLineArguments {
    #[clap(long, short)]
    toml: String,
    #[clap(long, short)]
    verbose: bool,
    #[clap(long)]
    test: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::builder().format_timestamp_secs().init();

    // Start timer
    let now = Instant::now();

    // Parse path to toml
    let args = CommandLineArguments::parse();

    // If seeds are being used, generate individual parameters for every stream
    let toml: TomlParameters = read_toml(&args.toml)?;
    let streams: Vec<SimulationParameters> = parameters_from_toml(toml)?;
    let multi_stream: bool = streams.len() > 1;

    // Given a set of parameters, define simulation objects and run sims
    for stream in streams {
        // New sim obj from parameters
        let mut simulation_object = SimulationObject::new_from_params(stream)?;

        // Print simulation parameters
        if args.verbose {
            println!();
            println!(
                "Working on simulation {}",
                simulation_object.parameters.sim_name
            );
            println!("Simulation Parameters\n{}", simulation_object.parameters);
            println!("Initial free energy = {:.6e}", simulation_object.free_energy());
        }

        if !args.test {
            let start = Instant::now();
            let nodes = simulation_object.run()?;

            if let Some(nodes) = nodes {
                println!(
                    "{}: {} vortices",
                    simulation_object.parameters.sim_name,
                    nodes.len()
                );
                for node in nodes {
                    println!("  {node}");
                }
            }

            if args.verbose {
                println!("Final free energy = {:.6e}", simulation_object.free_energy());
                println!(
                    "Finished {} in {} seconds",
                    simulation_object.parameters.sim_name,
                    start.elapsed().as_secs()
                );
            }
        }
    }

    if multi_stream {
        println!(
            "Finished all streams in {} seconds",
            now.elapsed().as_secs()
        );
    }

    Ok(())
}
