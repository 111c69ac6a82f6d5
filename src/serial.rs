// src/serial.rs
use std::io::{BufRead, BufReader, ErrorKind, Read, Write};
use serialport::{ClearBuffer, SerialPort};
use crate::config::READ_TIMEOUT;
use crate::drivers::{ChartError, Connector, LineTransport};
use crate::simulator::{SimulatedTransport, SIMULATOR_PORT};
/// Newline framing over a byte stream that may time out mid-line.
struct LineReader<R> {
    reader: BufReader<R>,
    // Bytes of a line whose newline has not arrived yet.
    pending: Vec<u8>,
}
impl<R: Read> LineReader<R> {
    fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
            pending: Vec::new(),
        }
    }
    fn has_buffered(&self) -> bool {
        !self.reader.buffer().is_empty()
    }
    /// Next complete line, decoded lossily and trimmed. A timeout or EOF before the
    /// newline keeps the partial bytes for the next call.
    fn read_line(&mut self) -> std::io::Result<Option<String>> {
        match self.reader.read_until(b'\n', &mut self.pending) {
            Ok(_) if self.pending.last() == Some(&b'\n') => {
                let line = String::from_utf8_lossy(&self.pending).trim().to_owned();
                self.pending.clear();
                Ok(Some(line))
            }
            Ok(_) => Ok(None),
            Err(e) if e.kind() == ErrorKind::TimedOut => Ok(None),
            Err(e) => Err(e),
        }
    }
    /// Drops buffered bytes and any partial line.
    fn discard(&mut self) {
        let buffered = self.reader.buffer().len();
        self.reader.consume(buffered);
        self.pending.clear();
    }
    fn get_ref(&self) -> &R {
        self.reader.get_ref()
    }
    fn get_mut(&mut self) -> &mut R {
        self.reader.get_mut()
    }
}
/// Serial port read one newline-terminated line at a time.
pub struct SerialLink {
    port_name: String,
    lines: LineReader<Box<dyn SerialPort>>,
}
impl SerialLink {
    pub fn open(port_name: &str, baud_rate: u32) -> Result<Self, ChartError> {
        let port = serialport::new(port_name, baud_rate)
            .timeout(READ_TIMEOUT)
            .open()
            .map_err(|source| ChartError::Connection {
                port: port_name.to_owned(),
                source,
            })?;
        log::info!("opened {port_name} at {baud_rate} baud");
        Ok(Self {
            port_name: port_name.to_owned(),
            lines: LineReader::new(port),
        })
    }
    fn bytes_waiting(&self) -> Result<bool, ChartError> {
        if self.lines.has_buffered() {
            return Ok(true);
        }
        Ok(self.lines.get_ref().bytes_to_read()? > 0)
    }
}
impl LineTransport for SerialLink {
    fn read_line(&mut self) -> Result<Option<String>, ChartError> {
        if !self.bytes_waiting()? {
            return Ok(None);
        }
        self.lines.read_line().map_err(ChartError::Read)
    }
    fn write_line(&mut self, text: &str) -> Result<(), ChartError> {
        let port = self.lines.get_mut();
        port.write_all(format!("{text}\n").as_bytes())
            .and_then(|_| port.flush())
            .map_err(ChartError::Write)
    }
    fn reset_input(&mut self) -> Result<(), ChartError> {
        self.lines.discard();
        self.lines.get_ref().clear(ClearBuffer::Input)?;
        Ok(())
    }
}
impl Drop for SerialLink {
    fn drop(&mut self) {
        log::info!("closed {}", self.port_name);
    }
}
/// Opens real ports, or the simulator for [`SIMULATOR_PORT`].
#[derive(Default)]
pub struct SerialConnector;
impl Connector for SerialConnector {
    fn open(&mut self, port: &str, baud_rate: u32) -> Result<Box<dyn LineTransport>, ChartError> {
        if port == SIMULATOR_PORT {
            return Ok(Box::new(SimulatedTransport::new()));
        }
        Ok(Box::new(SerialLink::open(port, baud_rate)?))
    }
}
/// Port names for the connection bar, simulator last.
pub fn list_ports() -> Vec<String> {
    let mut names: Vec<String> = match serialport::available_ports() {
        Ok(ports) => ports.into_iter().map(|p| p.port_name).collect(),
        Err(e) => {
            log::warn!("port enumeration failed: {e}");
            Vec::new()
        }
    };
    names.push(SIMULATOR_PORT.to_owned());
    names
}
