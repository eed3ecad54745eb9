mod logger;
mod parse_args;
mod serial_link;

use linkcart_protocol::{
    Progress, RomError, RomName, RomSlot, State, Timing, TransferJob, TransferSession,
    MAX_RESPONSE_TIMEOUT,
};
use logger::Logger;
use parse_args::{parse_args, AppArgs, Verbosity};
use serial_link::{list_ports, SerialLink};

use std::path::Path;
use std::time::Duration;

fn main() {
    let args = match parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error parsing arguments: {}", e);
            std::process::exit(1);
        }
    };

    // Set up logger
    let logger = match &args.log_file {
        Some(path) => match Logger::file(path, args.verbosity) {
            Ok(l) => {
                eprintln!("Logging to: {}", path);
                l
            }
            Err(e) => {
                eprintln!("Failed to open log file '{}': {}", path, e);
                std::process::exit(1);
            }
        },
        None => Logger::stderr(args.verbosity),
    };
    let verbosity = logger.verbosity();
    if let Err(e) = logger.init() {
        eprintln!("Failed to install logger: {}", e);
    }

    if args.list_ports {
        print_ports();
        return;
    }

    let port = match &args.port {
        Some(p) => p.clone(),
        None => {
            eprintln!("No serial port given, use --port (see --list-ports)");
            std::process::exit(1);
        }
    };

    if args.rom1.is_none() && args.rom2.is_none() {
        eprintln!("No ROM given, use --rom1 and/or --rom2");
        std::process::exit(1);
    }

    let job = match load_job(&args) {
        Ok(job) => job,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let timing = match args.timeout_secs.map(response_timeout) {
        Some(Ok(timeout)) => Timing::default().with_response_timeout(timeout),
        Some(Err(e)) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
        None => Timing::default(),
    };

    let link = match SerialLink::open(&port) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    eprintln!("Sending [{}] [{}] to {}...", job.name1, job.name2, port);
    let result = TransferSession::new(link, timing).run(&job, |p| show_progress(p, verbosity));

    match result {
        Ok(report) => {
            eprintln!(
                "Burn complete ({} bytes in {:.1}s)",
                report.payload_bytes,
                report.elapsed.as_secs_f32()
            );
        }
        Err(e) => {
            eprintln!("Burn failed: {}", e);
            eprintln!("Re-plug the LinkCart or check the connection. If the problem persists, make sure the cartridge firmware is up to date.");
            std::process::exit(1);
        }
    }
}

/// Validate `--timeout`: finite, positive and no longer than `MAX_RESPONSE_TIMEOUT`
fn response_timeout(secs: f32) -> Result<Duration, String> {
    let invalid = || {
        format!(
            "Invalid timeout: {} (expected 0 < secs <= {})",
            secs,
            MAX_RESPONSE_TIMEOUT.as_secs()
        )
    };
    if secs.is_nan() || secs <= 0.0 {
        return Err(invalid());
    }
    match Duration::try_from_secs_f32(secs) {
        Ok(timeout) if timeout <= MAX_RESPONSE_TIMEOUT => Ok(timeout),
        _ => Err(invalid()),
    }
}

/// Load the ROMs named on the command line. Names default to the file stems.
fn load_job(args: &AppArgs) -> Result<TransferJob, RomError> {
    let (slot1, default1) = load_slot(args.rom1.as_deref())?;
    let (slot2, default2) = load_slot(args.rom2.as_deref())?;
    Ok(TransferJob {
        slot1,
        slot2,
        name1: args.name1.as_deref().map(RomName::new).unwrap_or(default1),
        name2: args.name2.as_deref().map(RomName::new).unwrap_or(default2),
    })
}

fn load_slot(path: Option<&Path>) -> Result<(Option<RomSlot>, RomName), RomError> {
    match path {
        Some(p) => {
            let slot = RomSlot::from_file(p)?;
            if slot.is_empty() {
                log::warn!("{} is empty, its slot stays blank", p.display());
            } else {
                log::info!("Loaded {} ({} bytes)", p.display(), slot.len());
            }
            Ok((Some(slot), RomName::from_path(p)))
        }
        None => Ok((None, RomName::default())),
    }
}

fn show_progress(progress: Progress, verbosity: Verbosity) {
    // Progress lines would interleave with the log at higher verbosity
    if verbosity > Verbosity::Quiet {
        return;
    }
    match progress.state {
        State::HandshakeSent => eprintln!("Waiting for LinkCart..."),
        State::Name2Acked => eprintln!("Names accepted, sending image..."),
        State::ChunkAcked(i) if (i + 1) % 256 == 0 => {
            eprintln!("  {:3}%", (progress.chunks_acked * 100) / progress.chunks_total);
        }
        _ => {}
    }
}

fn print_ports() {
    match list_ports() {
        Ok(ports) if ports.is_empty() => println!("No serial ports found"),
        Ok(ports) => {
            for p in ports {
                if p.description.is_empty() {
                    println!("{}", p.name);
                } else {
                    println!("{}\t{}", p.name, p.description);
                }
            }
        }
        Err(e) => {
            eprintln!("Could not list serial ports: {}", e);
            std::process::exit(1);
        }
    }
}
