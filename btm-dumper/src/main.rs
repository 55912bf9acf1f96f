#![forbid(unsafe_code)]
mod app;
mod exporters;

use std::{env::args_os, process::exit};

use clap::error::ErrorKind;
use tracing_subscriber::EnvFilter;

use crate::app::{
    options::{get_command, Options},
    runtime::Config,
};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let mut command = get_command();

    // No arguments at all prints usage rather than an error
    if args_os().len() <= 1 {
        if let Err(why) = command.print_help() {
            eprintln!("Unable to print usage: {why}");
            exit(1);
        }
        println!();
        return;
    }

    let args = match command.try_get_matches() {
        Ok(args) => args,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
            _ => {
                // Exits 1 either way; a failed write to stderr has nowhere to be reported
                let _ = err.print();
                exit(1);
            }
        },
    };

    match Options::from_args(&args)
        .and_then(Config::new)
        .and_then(|config| config.start())
    {
        Ok(()) => {}
        Err(why) => {
            eprintln!("{why}");
            exit(1);
        }
    }
}
