//! Thin command-line wrapper around the loggen library.
//!
//! Without `-o` the header goes to stdout and the lock file is left alone,
//! so the command doubles as a dry-run preview. With `-o` the full locked
//! pipeline runs.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Arg, ArgAction, ArgMatches, Command};

use loggen::{GenerateError, LoggenConfig};

/// Builds the `clap` command used for parsing.
fn clap_command() -> Command {
    Command::new("loggen")
        .about("Generate a bit-packed C logging header from a TOML description")
        .arg(
            Arg::new("config")
                .value_name("CONFIG")
                .help("Path to the loggen.toml description.")
                .required(true),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .value_name("FILE")
                .help("Write the header to FILE instead of stdout."),
        )
        .arg(
            Arg::new("lock-file")
                .long("lock-file")
                .value_name("FILE")
                .help("Lock file path (default: CONFIG with a .lock.toml extension)."),
        )
        .arg(
            Arg::new("no-lock")
                .long("no-lock")
                .help("Skip lock file reading and writing entirely.")
                .action(ArgAction::SetTrue),
        )
}

fn run(matches: &ArgMatches) -> Result<(), GenerateError> {
    let config_path = matches
        .get_one::<String>("config")
        .map(PathBuf::from)
        .unwrap_or_default();

    match matches.get_one::<String>("output") {
        None => {
            // Preview mode: pure render, no lock involved.
            let config = LoggenConfig::from_file(&config_path)?;
            print!("{}", loggen::render_header(&config)?);
            Ok(())
        }
        Some(output) => {
            if matches.get_flag("no-lock") {
                let config = LoggenConfig::from_file(&config_path)?;
                let header = loggen::render_header(&config)?;
                std::fs::write(Path::new(output), header)?;
                Ok(())
            } else if let Some(lock) = matches.get_one::<String>("lock-file") {
                loggen::generate_with_lock(&config_path, Path::new(lock), Path::new(output))
            } else {
                loggen::generate(&config_path, Path::new(output))
            }
        }
    }
}

fn main() -> ExitCode {
    let matches = clap_command().get_matches();
    match run(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("loggen: {}", e);
            ExitCode::FAILURE
        }
    }
}
