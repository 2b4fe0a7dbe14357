use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_STATION_BAUD: u32 = 38400;
pub const DEFAULT_PRINTER_BAUD: u32 = 115200;

const TICKET_BASE_NAME: &str = "temp_ticket";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PortConfig {
    pub path: String,
    pub baud_rate: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelayConfig {
    pub station: PortConfig,
    pub printer: PortConfig,
    pub naming: TicketNaming,
    pub timings: Timings,
}

/// Decides where each ticket gets written. Without increment every ticket
/// lands in the same file (so only the latest ticket survives), which is
/// what most operators want: the file is only a scratch copy of what was
/// printed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TicketNaming {
    pub directory: PathBuf,
    pub increment: bool,
}

impl TicketNaming {
    pub fn new(directory: impl AsRef<Path>, increment: bool) -> TicketNaming {
        TicketNaming {
            directory: directory.as_ref().to_path_buf(),
            increment,
        }
    }

    pub fn path_for(&self, ticket_no: u32) -> PathBuf {
        let file_name = if self.increment {
            format!("{TICKET_BASE_NAME}_{ticket_no}.txt")
        } else {
            format!("{TICKET_BASE_NAME}.txt")
        };
        self.directory.join(file_name)
    }
}

/// All delays used while talking to the station. The poll interval and read
/// timeout trade latency for CPU usage: 20ms keeps the loop well ahead of
/// the serial buffer at 38400 baud without spinning, and the 1s timeout is
/// what separates one ticket from the next.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Timings {
    pub poll_interval: Duration,
    pub read_timeout: Duration,
    /// Pause after closing a ticket file, before looking for the next one.
    pub boundary_settle: Duration,
    /// Grace period for the operator to hit CTRL-C before the station gets
    /// switched into PRINT mode.
    pub notice_delay: Duration,
    pub mode_settle: Duration,
}

impl Default for Timings {
    fn default() -> Timings {
        Timings {
            poll_interval: Duration::from_millis(20),
            read_timeout: Duration::from_secs(1),
            boundary_settle: Duration::from_millis(100),
            notice_delay: Duration::from_secs(3),
            mode_settle: Duration::from_millis(500),
        }
    }
}

impl Timings {
    pub fn immediate() -> Timings {
        Timings {
            poll_interval: Duration::ZERO,
            read_timeout: Duration::ZERO,
            boundary_settle: Duration::ZERO,
            notice_delay: Duration::ZERO,
            mode_settle: Duration::ZERO,
        }
    }
}
