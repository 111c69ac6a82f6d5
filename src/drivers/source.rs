use std::fmt;
use chrono::{DateTime, Local};
use crate::drivers::ChartError;
/// Position of a sample on the shared x-axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum XValue {
    Time(DateTime<Local>),
    Counter(u64),
}
impl XValue {
    /// Numeric position used by the chart: seconds since the epoch or the raw counter.
    pub fn as_f64(&self) -> f64 {
        match self {
            XValue::Time(t) => t.timestamp_millis() as f64 / 1000.0,
            XValue::Counter(n) => *n as f64,
        }
    }
}
impl fmt::Display for XValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XValue::Time(t) => write!(f, "{}", t.format("%Y-%m-%d %H:%M:%S%.3f")),
            XValue::Counter(n) => write!(f, "{n}"),
        }
    }
}
/// One parsed observation.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    pub x: XValue,
    pub values: Vec<i64>,
}
/// Line-oriented view of a serial link. Closing is dropping.
pub trait LineTransport: Send {
    /// Returns the next complete line if one is available, `Ok(None)` otherwise.
    fn read_line(&mut self) -> Result<Option<String>, ChartError>;
    fn write_line(&mut self, text: &str) -> Result<(), ChartError>;
    /// Discards everything received but not yet read.
    fn reset_input(&mut self) -> Result<(), ChartError>;
}
/// Opens transports by port name.
pub trait Connector {
    fn open(&mut self, port: &str, baud_rate: u32) -> Result<Box<dyn LineTransport>, ChartError>;
}
