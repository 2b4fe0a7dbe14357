use std::io::{BufRead, BufReader, Read, Write};

use crate::config::PortConfig;
use crate::error::{Error, Result};

/// A line-oriented serial connection, as seen by both the handshake and the
/// relay loop.
pub trait SerialLink {
    /// Reads up to and including the next '\n'. If the read timeout expires
    /// first, whatever arrived so far is returned, which means an empty
    /// vector signals that the line went quiet.
    fn read_line(&mut self) -> std::io::Result<Vec<u8>>;

    fn send(&mut self, bytes: &[u8]) -> std::io::Result<()>;
}

pub fn open_port(
    config: &PortConfig,
    read_timeout: std::time::Duration,
) -> Result<Box<dyn serialport::SerialPort>> {
    // Both the OTIMCON station and the cheap thermal printers we've seen are
    // plain 8N1 without any flow control, only the baud differs.
    serialport::new(&config.path, config.baud_rate)
        .data_bits(serialport::DataBits::Eight)
        .parity(serialport::Parity::None)
        .stop_bits(serialport::StopBits::One)
        .flow_control(serialport::FlowControl::None)
        .timeout(read_timeout)
        .open()
        .map_err(|source| Error::Connection {
            port: config.path.clone(),
            source,
        })
}

pub struct LineReader<P: Read + Write> {
    reader: BufReader<P>,
}

impl<P: Read + Write> LineReader<P> {
    pub fn new(port: P) -> LineReader<P> {
        LineReader {
            reader: BufReader::new(port),
        }
    }
}

impl<P: Read + Write> SerialLink for LineReader<P> {
    fn read_line(&mut self) -> std::io::Result<Vec<u8>> {
        let mut line = Vec::new();
        // read_until leaves everything it consumed before the timeout in
        // `line`, so a partial line isn't lost.
        match self.reader.read_until(b'\n', &mut line) {
            Ok(_) => Ok(line),
            Err(error) => match error.kind() {
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => Ok(line),
                _ => Err(error),
            },
        }
    }

    fn send(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        let port = self.reader.get_mut();
        port.write_all(bytes)?;
        port.flush()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Fake port that hands out one chunk per read() call and then times
    /// out, mimicking how serialport behaves once the station goes quiet.
    struct ChunkedPort {
        chunks: VecDeque<Vec<u8>>,
        written: Vec<u8>,
        flushed: bool,
    }

    impl ChunkedPort {
        fn new(chunks: &[&str]) -> ChunkedPort {
            ChunkedPort {
                chunks: chunks.iter().map(|c| c.as_bytes().to_vec()).collect(),
                written: Vec::new(),
                flushed: false,
            }
        }
    }

    impl Read for ChunkedPort {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let Some(chunk) = self.chunks.pop_front() else {
                return Err(std::io::ErrorKind::TimedOut.into());
            };
            // Chunks in these tests are always smaller than BufReader's buffer.
            buf[..chunk.len()].copy_from_slice(&chunk);
            Ok(chunk.len())
        }
    }

    impl Write for ChunkedPort {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.flushed = true;
            Ok(())
        }
    }

    #[test]
    fn test_read_line_splits_lines() {
        let mut link = LineReader::new(ChunkedPort::new(&["Starting...\r\n>", "\r\n"]));
        assert_eq!(link.read_line().unwrap(), b"Starting...\r\n");
        assert_eq!(link.read_line().unwrap(), b">\r\n");
        assert_eq!(link.read_line().unwrap(), b"");
    }

    #[test]
    fn test_read_line_returns_partial_line_on_timeout() {
        let mut link = LineReader::new(ChunkedPort::new(&["CARD", "123"]));
        assert_eq!(link.read_line().unwrap(), b"CARD123");
        assert_eq!(link.read_line().unwrap(), b"");
    }

    #[test]
    fn test_read_line_propagates_other_errors() {
        struct BrokenPort;
        impl Read for BrokenPort {
            fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::ErrorKind::BrokenPipe.into())
            }
        }
        impl Write for BrokenPort {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                Ok(buf.len())
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut link = LineReader::new(BrokenPort);
        assert_eq!(
            link.read_line().unwrap_err().kind(),
            std::io::ErrorKind::BrokenPipe
        );
    }

    #[test]
    fn test_send_writes_and_flushes() {
        let mut link = LineReader::new(ChunkedPort::new(&[]));
        link.send(b"SET MODE PRINT\n").unwrap();
        let port = link.reader.get_ref();
        assert_eq!(port.written, b"SET MODE PRINT\n");
        assert!(port.flushed);
    }

    #[test]
    fn test_open_port_names_missing_device() {
        let config = PortConfig {
            path: "/dev/this-port-does-not-exist".to_string(),
            baud_rate: 38400,
        };
        match open_port(&config, std::time::Duration::from_secs(1)) {
            Err(Error::Connection { port, .. }) => {
                assert_eq!(port, "/dev/this-port-does-not-exist")
            }
            Err(e) => panic!("unexpected error: {e}"),
            Ok(_) => panic!("opening a nonexistent port must fail"),
        }
    }
}
