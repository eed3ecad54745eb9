use std::path::PathBuf;

const HELP: &str = "\
MSX LinkCart - ROM uploader

Packs up to two ROMs into a 64KB cartridge image and sends it to the
MSX LinkCart over a serial port.

USAGE:
  msx-linkcart [OPTIONS] --port <name> [--rom1 <file>] [--rom2 <file>]

OPTIONS:
  -h, --help            Prints help information
  -l, --list-ports      List available serial ports and exit
  -p, --port <name>     Serial port the cartridge is connected to
  --rom1 <file>         ROM for slot 1 (max 32KB)
  --rom2 <file>         ROM for slot 2 (max 32KB)
  --name1 <text>        Menu name for slot 1 (default: file name)
  --name2 <text>        Menu name for slot 2 (default: file name)
  --timeout <secs>      Give up if the cartridge does not reply (default: 10)
  -v, --verbose         Show transfer steps
  -vv, --trace          Show every chunk
  -vvv, --trace-serial  Show individual serial bytes (very verbose)
  --log <file>          Write log output to file instead of stderr
";

/// Verbosity level for debug output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// Warnings and errors only
    Quiet = 0,
    /// Transfer milestones
    Verbose = 1,
    /// Every protocol step
    Trace = 2,
    /// Individual serial bytes
    TraceSerial = 3,
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::Quiet
    }
}

#[derive(Debug)]
pub struct AppArgs {
    pub list_ports: bool,
    pub port: Option<String>,
    pub rom1: Option<PathBuf>,
    pub rom2: Option<PathBuf>,
    pub name1: Option<String>,
    pub name2: Option<String>,
    pub timeout_secs: Option<f32>,
    pub verbosity: Verbosity,
    pub log_file: Option<String>,
}

pub fn parse_args() -> Result<AppArgs, pico_args::Error> {
    let mut pargs = pico_args::Arguments::from_env();

    if pargs.contains(["-h", "--help"]) {
        print!("{}", HELP);
        std::process::exit(0);
    }

    parse_from(pargs)
}

pub fn parse_from(mut pargs: pico_args::Arguments) -> Result<AppArgs, pico_args::Error> {
    // Count -v flags for verbosity level
    let verbosity = if pargs.contains("--trace-serial") || pargs.contains("-vvv") {
        Verbosity::TraceSerial
    } else if pargs.contains("--trace") || pargs.contains("-vv") {
        Verbosity::Trace
    } else if pargs.contains(["-v", "--verbose"]) {
        Verbosity::Verbose
    } else {
        Verbosity::Quiet
    };

    let args = AppArgs {
        list_ports: pargs.contains(["-l", "--list-ports"]),
        port: pargs.opt_value_from_str(["-p", "--port"])?,
        rom1: pargs.opt_value_from_str("--rom1")?,
        rom2: pargs.opt_value_from_str("--rom2")?,
        name1: pargs.opt_value_from_str("--name1")?,
        name2: pargs.opt_value_from_str("--name2")?,
        timeout_secs: pargs.opt_value_from_str("--timeout")?,
        verbosity,
        log_file: pargs.opt_value_from_str("--log")?,
    };

    let remaining = pargs.finish();
    if !remaining.is_empty() {
        eprintln!("Warning: unused arguments left: {:?}.", remaining);
    }

    Ok(args)
}
