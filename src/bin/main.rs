#![crate_type = "bin"]
#![recursion_limit = "1024"]

#[macro_use]
extern crate error_chain;

mod errors {
    // Create the Error, ErrorKind, ResultExt, and Result types
    error_chain! {}
}
mod problems;

use crate::errors::*;
use clap::load_yaml;
use clap::App;
use colored::*;
use log::{debug, error, info};
use mhdflow::boundary::set_boundaries;
use mhdflow::diagnostics;
use mhdflow::integrate::Integrator;
use mhdflow::output::OutputEntry;
use mhdflow::settings::{self, Settings};
use pbr::ProgressBar;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() {
    // initialize the env_logger implementation
    env_logger::init();

    // error handling of runner
    if let Err(ref e) = run() {
        error!("{}: {}", "error".red(), e);

        for e in e.iter().skip(1) {
            error!("caused by: {}", e);
        }

        // The backtrace is not always generated. Try to run this with
        // `RUST_BACKTRACE=1`.
        if let Some(backtrace) = e.backtrace() {
            error!("backtrace: {:?}", backtrace);
        }

        ::std::process::exit(1);
    }

    ::std::process::exit(0);
}

/// Main function
fn run() -> Result<()> {
    // Parse command line
    let yaml = load_yaml!("cli.yml");
    let cli_matches = App::from_yaml(yaml).version(VERSION).get_matches();

    let settings_file_name = cli_matches.value_of("parameter_file").unwrap();

    let mut settings = settings::read_parameter_file(settings_file_name)
        .chain_err(|| "Error reading parameter file.")?;
    settings.set_version(VERSION);
    // drop mutability for safety
    let settings = settings;

    let output_dir = Path::new(cli_matches.value_of("output_directory").unwrap());
    std::fs::create_dir_all(output_dir).chain_err(|| "Cannot create output directory")?;

    let param_name = output_dir.join(format!("{}.toml", settings.environment.prefix));
    settings
        .save_to_file(param_name.to_str().unwrap())
        .chain_err(|| "Unable to save parameter file next to the output.")?;

    let show_progress = cli_matches.is_present("progress_bar");

    let data_name = output_dir.join(format!("{}.bin", settings.environment.prefix));
    let out = File::create(&data_name).chain_err(|| "Unable to create output file.")?;
    let mut out = BufWriter::new(out);

    run_simulation(&settings, &mut out, show_progress)?;

    println!("DONE '{}'.", data_name.to_str().unwrap());

    Ok(())
}

/// Sets up the configured problem and advances it to the time limit.
fn run_simulation(
    settings: &Settings,
    out: &mut impl std::io::Write,
    show_progress: bool,
) -> Result<()> {
    let (mut grid, mode, bc) = problems::setup(settings);
    let sim = settings.simulation;

    let (nx1, nx2, nx3) = grid.interior();
    let mut integrator = Integrator::new(nx1, nx2, nx3, &mode);

    let mut pb = ProgressBar::new(sim.max_steps as u64);
    pb.format("┫██░┣");

    // only show bar, if flag was present
    pb.show_bar = show_progress;
    pb.show_counter = show_progress;
    pb.show_percent = show_progress;
    pb.show_speed = show_progress;
    pb.show_time_left = show_progress;
    pb.show_message = show_progress;

    let start_time = time::now();

    let mut timestep = 0;
    while grid.time < sim.tlim && timestep < sim.max_steps {
        set_boundaries(&mut grid, bc);

        let dt = grid.new_dt(mode.eos, sim.cfl).min(sim.tlim - grid.time);
        grid.dt = dt;

        integrator.step(&mut grid, &mode);

        grid.time += dt;
        timestep += 1;
        pb.inc();

        if sim.output_every > 0 && timestep % sim.output_every == 0 {
            info!("Timestep {}: save diagnostics...", timestep);
            let entry = OutputEntry {
                timestep,
                time: grid.time,
                dt,
                totals: Some(diagnostics::totals(&grid)),
                max_div_b: if mode.mhd {
                    Some(diagnostics::max_div_b(&grid))
                } else {
                    None
                },
            };
            debug!("appending entry to output stream");
            bincode::serialize_into(&mut *out, &entry)
                .chain_err(|| "Unable to append output entry.")?;
        }
    }

    // final record
    let entry = OutputEntry {
        timestep,
        time: grid.time,
        dt: grid.dt,
        totals: Some(diagnostics::totals(&grid)),
        max_div_b: if mode.mhd {
            Some(diagnostics::max_div_b(&grid))
        } else {
            None
        },
    };
    bincode::serialize_into(&mut *out, &entry).chain_err(|| "Unable to write final entry.")?;

    pb.finish_print(&format!("✓ {} ", "DONE".green().bold()));
    println!();

    let stop_time = time::now();
    let duration = stop_time - start_time;
    println!("Elapsed time: {}", duration);

    Ok(())
}
