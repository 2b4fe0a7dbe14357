use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Timings;
use crate::transport::SerialLink;

pub const SET_MODE_PRINT: &[u8] = b"SET MODE PRINT\n";

/// Lines the OTIMCON station must produce while being switched to PRINT
/// mode. Only the prefix is checked, the station appends line endings (and
/// sometimes version info to the banner).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExpectedLine {
    /// Printed by the station after the serial connection resets it.
    Banner,
    Prompt,
    ModeConfirmation,
}

impl ExpectedLine {
    pub fn prefix(&self) -> &'static [u8] {
        match self {
            ExpectedLine::Banner => b"Starting...",
            ExpectedLine::Prompt => b">",
            ExpectedLine::ModeConfirmation => b"Mode:PRINT",
        }
    }

    pub fn matches(&self, line: &[u8]) -> bool {
        line.starts_with(self.prefix())
    }

    fn failure(&self, line: &[u8]) -> HandshakeError {
        let received = String::from_utf8_lossy(line).trim_end().to_string();
        match self {
            ExpectedLine::Banner => HandshakeError::NoConnection { received },
            ExpectedLine::Prompt => HandshakeError::UnexpectedPrompt { received },
            ExpectedLine::ModeConfirmation => HandshakeError::ModeRefused { received },
        }
    }
}

#[derive(Debug, Error)]
pub enum HandshakeError {
    #[error("cannot connect to OTIMCON, check port & speed (received {received:?})")]
    NoConnection { received: String },
    #[error("OTIMCON doesn't behave as expected (received {received:?})")]
    UnexpectedPrompt { received: String },
    #[error("OTIMCON refuses PRINT mode (received {received:?})")]
    ModeRefused { received: String },
    #[error("serial I/O failed during handshake: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    Expect(ExpectedLine),
    Send(&'static [u8]),
    /// Wait for the station to act on the command we just sent.
    Settle,
    Discard,
}

// The station echoes the command before answering, and finishes with a fresh
// prompt - both of which we don't care about.
const PRINT_MODE_SCRIPT: [Step; 7] = [
    Step::Expect(ExpectedLine::Banner),
    Step::Expect(ExpectedLine::Prompt),
    Step::Send(SET_MODE_PRINT),
    Step::Settle,
    Step::Discard,
    Step::Expect(ExpectedLine::ModeConfirmation),
    Step::Discard,
];

/// Switches the station into PRINT mode. Must run right after the port was
/// opened, since it relies on the startup banner the station prints when the
/// connection is established.
///
/// Any deviation from the expected conversation aborts the handshake: the
/// station's mode is unknown at that point, and relaying tickets from a
/// station in the wrong mode would silently print garbage.
pub fn enter_print_mode(
    link: &mut impl SerialLink,
    timings: &Timings,
) -> Result<(), HandshakeError> {
    warn!(
        "Converting the OTIMCON to PRINT mode, press CTRL-C within {}s to stop this",
        timings.notice_delay.as_secs()
    );
    std::thread::sleep(timings.notice_delay);

    for step in PRINT_MODE_SCRIPT {
        match step {
            Step::Expect(expected) => {
                let line = link.read_line()?;
                debug!(?expected, line = %String::from_utf8_lossy(&line).trim_end());
                if !expected.matches(&line) {
                    return Err(expected.failure(&line));
                }
                if expected == ExpectedLine::Banner {
                    info!("Connected to OTIMCON");
                }
            }
            Step::Send(command) => {
                info!("Setting mode PRINT...");
                link.send(command)?;
            }
            Step::Settle => std::thread::sleep(timings.mode_settle),
            Step::Discard => {
                let line = link.read_line()?;
                debug!(discarded = %String::from_utf8_lossy(&line).trim_end());
            }
        }
    }
    Ok(())
}
