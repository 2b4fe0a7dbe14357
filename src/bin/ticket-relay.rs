use std::io::IsTerminal;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

use ticket_relay::cli::Cli;
use ticket_relay::config::RelayConfig;
use ticket_relay::handshake;
use ticket_relay::relay::Session;
use ticket_relay::transport::{open_port, LineReader};
use ticket_relay::Error;

fn init_logging() {
    let format = time::macros::format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_timer(UtcTime::new(format))
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();
}

fn relay(config: RelayConfig) -> Result<(), Error> {
    info!("Opening OTIMCON port {}", config.station.path);
    let station = open_port(&config.station, config.timings.read_timeout)?;
    let printer = open_port(&config.printer, config.timings.read_timeout)?;
    info!("Printer port opened");
    info!(
        "Connected to port {} at {} baud",
        config.station.path, config.station.baud_rate
    );
    info!(
        "Printing to port {} at {} baud",
        config.printer.path, config.printer.baud_rate
    );

    let mut station = LineReader::new(station);
    handshake::enter_print_mode(&mut station, &config.timings)?;

    // Installed only now: until the station is in PRINT mode, CTRL-C should
    // simply kill us (that's what the notice during the handshake promises).
    let stop = Arc::new(AtomicBool::new(false));
    let request_stop = stop.clone();
    if let Err(e) = ctrlc::set_handler(move || request_stop.store(true, Ordering::SeqCst)) {
        // Without the handler CTRL-C still works, it just won't close the
        // current ticket file cleanly.
        error!("Failed to install CTRL-C handler: {e}");
    }

    info!("Ready, waiting for OTIMCON cards...");
    let mut session = Session::new(
        station,
        printer,
        std::io::stdout(),
        config.naming,
        config.timings,
    );
    session.run(&stop)?;
    info!("Stopped after {} ticket(s)", session.ticket_no() - 1);
    Ok(())
}

fn main() -> ExitCode {
    init_logging();
    eprintln!("OTIMCON ticket relay (v{})", env!("CARGO_PKG_VERSION"));

    let result = Cli::parse().into_config().and_then(relay);
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Printed directly so RUST_LOG can't hide why we gave up.
            eprintln!("Error: {e}");
            if e.is_usage_error() {
                eprintln!("Use ticket-relay --help for usage.");
            }
            if matches!(e, Error::Handshake(_)) {
                eprintln!("OTIMCON state is unknown, check the current OTIMCON mode manually.");
            }
            ExitCode::from(e.exit_code())
        }
    }
}
