//! Logger backend for the `log` facade, writing to stderr or a file.

use crate::parse_args::Verbosity;
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::sync::Mutex;

/// Output destination for logger
enum Output {
    Stderr,
    File(BufWriter<File>),
}

pub struct Logger {
    output: Mutex<Output>,
    verbosity: Verbosity,
}

impl Logger {
    /// Create a new logger writing to stderr
    pub fn stderr(verbosity: Verbosity) -> Self {
        Logger {
            output: Mutex::new(Output::Stderr),
            verbosity,
        }
    }

    /// Create a new logger writing to a file
    pub fn file(path: &str, verbosity: Verbosity) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Logger {
            output: Mutex::new(Output::File(BufWriter::new(file))),
            verbosity,
        })
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// Install as the global logger
    pub fn init(self) -> Result<(), SetLoggerError> {
        log::set_max_level(self.verbosity.level_filter());
        log::set_boxed_logger(Box::new(self))
    }

    fn write_line(&self, line: &str) {
        if let Ok(mut output) = self.output.lock() {
            match &mut *output {
                Output::Stderr => {
                    eprintln!("{}", line);
                }
                Output::File(f) => {
                    let _ = writeln!(f, "{}", line);
                    let _ = f.flush();
                }
            }
        }
    }
}

impl Verbosity {
    pub fn level_filter(self) -> LevelFilter {
        match self {
            Verbosity::Quiet => LevelFilter::Warn,
            Verbosity::Verbose => LevelFilter::Info,
            Verbosity::Trace => LevelFilter::Debug,
            Verbosity::TraceSerial => LevelFilter::Trace,
        }
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.verbosity.level_filter()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            self.write_line(&format!("{:<5} {}", record.level(), record.args()));
        }
    }

    fn flush(&self) {
        if let Ok(mut output) = self.output.lock() {
            if let Output::File(f) = &mut *output {
                let _ = f.flush();
            }
        }
    }
}
