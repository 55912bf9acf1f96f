use std::path::PathBuf;

use clap::{crate_version, Arg, ArgAction, ArgMatches, Command};

use crate::app::error::RuntimeError;

/// Option names
pub const OPTION_FILE: &str = "file";
pub const OPTION_OUT: &str = "out";
pub const OPTION_VERSION: &str = "version";

/// Other CLI Text
pub const ABOUT: &str = concat!(
    "The btm-dumper binary decodes a macOS Background Task Management store\n",
    "(BackgroundItems-v*.btm) and writes its background items as JSON.\n",
    "Set RUST_LOG to change the log level; logs are written to stderr."
);

/// Options parsed from the command line
#[derive(Debug, PartialEq, Eq)]
pub struct Options {
    /// Path to the BTM file to decode
    pub file: PathBuf,
    /// Where to write the JSON; stdout when unset
    pub out: Option<PathBuf>,
}

impl Options {
    pub fn from_args(args: &ArgMatches) -> Result<Self, RuntimeError> {
        let file = args.get_one::<String>(OPTION_FILE).ok_or_else(|| {
            RuntimeError::InvalidOptions(format!("Option --{OPTION_FILE} is required"))
        })?;
        let out = args.get_one::<String>(OPTION_OUT);

        if out == Some(file) {
            return Err(RuntimeError::InvalidOptions(format!(
                "Option --{OPTION_OUT} must not overwrite the input file"
            )));
        }

        Ok(Options {
            file: PathBuf::from(file),
            out: out.map(PathBuf::from),
        })
    }
}

/// Build the argument parser
pub fn get_command() -> Command {
    Command::new("btm-dumper")
        .version(crate_version!())
        .about(ABOUT)
        .disable_version_flag(true)
        .arg(
            Arg::new(OPTION_FILE)
                .short('f')
                .long(OPTION_FILE)
                .help("Path to the BackgroundItems-v*.btm file to decode\n")
                .value_name("path")
                .display_order(0),
        )
        .arg(
            Arg::new(OPTION_OUT)
                .short('o')
                .long(OPTION_OUT)
                .help("Write the JSON to this file instead of stdout\n")
                .value_name("path")
                .display_order(1),
        )
        .arg(
            Arg::new(OPTION_VERSION)
                .short('v')
                .long(OPTION_VERSION)
                .help("Print version")
                .action(ArgAction::Version)
                .display_order(2),
        )
}
