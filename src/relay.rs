use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

use crate::config::{TicketNaming, Timings};
use crate::error::{Error, Result};
use crate::transport::SerialLink;

/// Holding the file inside Collecting guarantees there is never more than one
/// ticket file open.
pub enum TicketState {
    Idle,
    Collecting { file: File, path: PathBuf },
}

#[derive(Debug, PartialEq)]
pub enum PollOutcome {
    /// Nothing arrived and no ticket is in progress.
    Idle,
    Line {
        /// Whether this line opened a new ticket file.
        started: bool,
    },
    TicketClosed { path: PathBuf },
}

/// Everything the relay loop needs: the station it reads tickets from, the
/// printer they get forwarded to, and where the live echo goes (stdout,
/// except in tests).
pub struct Session<L: SerialLink, P: Write, E: Write> {
    station: L,
    printer: P,
    echo: E,
    naming: TicketNaming,
    timings: Timings,
    ticket_no: u32,
    state: TicketState,
}

impl<L: SerialLink, P: Write, E: Write> Session<L, P, E> {
    pub fn new(
        station: L,
        printer: P,
        echo: E,
        naming: TicketNaming,
        timings: Timings,
    ) -> Session<L, P, E> {
        Session {
            station,
            printer,
            echo,
            naming,
            timings,
            ticket_no: 1,
            state: TicketState::Idle,
        }
    }

    /// Number of the ticket currently being collected, or of the next one
    /// if we're idle.
    pub fn ticket_no(&self) -> u32 {
        self.ticket_no
    }

    pub fn is_collecting(&self) -> bool {
        matches!(self.state, TicketState::Collecting { .. })
    }

    pub fn printer(&self) -> &P {
        &self.printer
    }

    pub fn echo(&self) -> &E {
        &self.echo
    }

    /// Performs a single read from the station and acts on it. An empty read
    /// (i.e. the read timed out) is the only thing that ends a ticket.
    pub fn poll_once(&mut self) -> Result<PollOutcome> {
        let line = self.station.read_line()?;
        if line.is_empty() {
            return match std::mem::replace(&mut self.state, TicketState::Idle) {
                TicketState::Idle => Ok(PollOutcome::Idle),
                TicketState::Collecting { file, path } => {
                    close_ticket(file, &path)?;
                    self.printer.flush().map_err(Error::Printer)?;
                    info!("File closed, waiting for next chip");
                    std::thread::sleep(self.timings.boundary_settle);
                    self.ticket_no += 1;
                    Ok(PollOutcome::TicketClosed { path })
                }
            };
        }

        let (mut file, path, started) =
            match std::mem::replace(&mut self.state, TicketState::Idle) {
                TicketState::Collecting { file, path } => (file, path, false),
                TicketState::Idle => {
                    let (file, path) = self.open_ticket()?;
                    (file, path, true)
                }
            };
        let relayed = self.fan_out(&line, &mut file, &path);
        // The ticket stays open even if relaying failed, so interrupt() can
        // still close it.
        self.state = TicketState::Collecting { file, path };
        relayed?;
        Ok(PollOutcome::Line { started })
    }

    fn open_ticket(&self) -> Result<(File, PathBuf)> {
        if self.naming.increment {
            info!("Incrementing filename number..");
        }
        let path = self.naming.path_for(self.ticket_no);
        let file = File::create(&path).map_err(|source| Error::TicketFile {
            path: path.clone(),
            source,
        })?;
        info!(ticket = self.ticket_no, path = %path.display(), "Ticket started");
        Ok((file, path))
    }

    fn fan_out(&mut self, line: &[u8], file: &mut File, path: &Path) -> Result<()> {
        self.echo
            .write_all(line)
            .and_then(|()| self.echo.flush())
            .map_err(Error::Echo)?;
        file.write_all(line).map_err(|source| Error::TicketFile {
            path: path.to_path_buf(),
            source,
        })?;
        self.printer.write_all(line).map_err(Error::Printer)
    }

    /// Relays tickets until `stop` is raised. The sleep before every read
    /// keeps some data queued in the serial buffer, so a ticket is relayed in
    /// a few larger chunks instead of one syscall per byte.
    pub fn run(&mut self, stop: &AtomicBool) -> Result<()> {
        while !stop.load(Ordering::SeqCst) {
            std::thread::sleep(self.timings.poll_interval);
            self.poll_once()?;
        }
        self.interrupt()
    }

    /// Closes the ticket in progress, if any. Whatever the station sends
    /// after this point is dropped, so the file may be incomplete.
    pub fn interrupt(&mut self) -> Result<()> {
        if let TicketState::Collecting { file, path } =
            std::mem::replace(&mut self.state, TicketState::Idle)
        {
            warn!(
                ticket = self.ticket_no,
                path = %path.display(),
                "Interrupted while receiving a ticket, it may be incomplete"
            );
            close_ticket(file, &path)?;
            self.printer.flush().map_err(Error::Printer)?;
        }
        Ok(())
    }
}

fn close_ticket(file: File, path: &Path) -> Result<()> {
    file.sync_all().map_err(|source| Error::TicketFile {
        path: path.to_path_buf(),
        source,
    })
}
