use std::path::PathBuf;

use clap::Parser;

use crate::config::{
    PortConfig, RelayConfig, TicketNaming, Timings, DEFAULT_PRINTER_BAUD, DEFAULT_STATION_BAUD,
};
use crate::error::{Error, Result};

const AFTER_HELP: &str = "\
Examples:
  ticket-relay -p/dev/cu.wchusbserial640 -s9600 -o/dev/cu.wchusbserial641 -i
  ticket-relay --port=COM4 --speed=38400 --printport=COM5

Procedure:
  1. Connect the OTIMCON station and the thermal printer, look up their serial ports.
  2. Start ticket-relay. It automatically switches the OTIMCON station to PRINT mode!
  3. Read chips. Every ticket is printed and saved to temp_ticket[_N].txt.
  4. Exit with CTRL-C.

Set RUST_LOG (e.g. RUST_LOG=debug) to change log verbosity.";

/// Ticket printing for OTIMCON: relays tickets from an OTIMCON station to a
/// serial thermal printer.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None, after_help = AFTER_HELP)]
pub struct Cli {
    /// Serial port of the OTIMCON station
    #[arg(short = 'p', long = "port")]
    pub port: Option<String>,

    /// Baud rate of the OTIMCON station
    #[arg(short = 's', long = "speed", default_value_t = DEFAULT_STATION_BAUD)]
    pub speed: u32,

    /// Serial port of the thermal printer
    #[arg(short = 'o', long = "printport")]
    pub printport: Option<String>,

    /// Baud rate of the thermal printer
    #[arg(short = 'x', long = "printspeed", default_value_t = DEFAULT_PRINTER_BAUD)]
    pub printspeed: u32,

    /// Save every ticket, with an incrementing filename
    #[arg(short = 'i', long = "increment")]
    pub increment: bool,

    /// Directory that ticket files are written to
    #[arg(short = 'd', long = "output-dir", default_value = ".")]
    pub output_dir: PathBuf,
}

impl Cli {
    // Ports are validated here rather than by clap so that a missing port
    // gets the same message whether or not other arguments were valid.
    pub fn into_config(self) -> Result<RelayConfig> {
        let port = self.port.filter(|p| !p.is_empty()).ok_or(Error::MissingPort)?;
        let printport = self
            .printport
            .filter(|p| !p.is_empty())
            .ok_or(Error::MissingPrinterPort)?;
        Ok(RelayConfig {
            station: PortConfig {
                path: port,
                baud_rate: self.speed,
            },
            printer: PortConfig {
                path: printport,
                baud_rate: self.printspeed,
            },
            naming: TicketNaming::new(self.output_dir, self.increment),
            timings: Timings::default(),
        })
    }
}
