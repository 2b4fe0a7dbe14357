use std::path::PathBuf;

use thiserror::Error;

use crate::handshake::HandshakeError;

/// Every error is fatal: the tool assumes the operator will simply re-run it,
/// so there is no distinction between transient and permanent failures.
#[derive(Debug, Error)]
pub enum Error {
    #[error("port must be defined")]
    MissingPort,
    #[error("printer port must be defined")]
    MissingPrinterPort,
    #[error("cannot connect to serial port {port}: {source}")]
    Connection {
        port: String,
        #[source]
        source: serialport::Error,
    },
    #[error("cannot convert OTIMCON to PRINT mode: {0}")]
    Handshake(#[from] HandshakeError),
    #[error("cannot write ticket file {}: {source}", path.display())]
    TicketFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot write to printer: {0}")]
    Printer(#[source] std::io::Error),
    #[error("cannot echo ticket to stdout: {0}")]
    Echo(#[source] std::io::Error),
    /// Reading from the station failed.
    #[error("serial I/O with the OTIMCON station failed: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn exit_code(&self) -> u8 {
        2
    }

    /// True for errors caused by how the tool was invoked, as opposed to
    /// what happened once it started talking to hardware.
    pub fn is_usage_error(&self) -> bool {
        matches!(self, Error::MissingPort | Error::MissingPrinterPort)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
