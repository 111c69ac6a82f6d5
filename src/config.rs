// src/config.rs
use std::path::PathBuf;
use std::time::Duration;
/// Baud rates offered in the connection bar.
pub const BAUD_RATES: [u32; 10] = [
    4800, 9600, 19200, 38400, 57600, 115200, 230400, 460800, 921600, 2_000_000,
];
pub const DEFAULT_BAUD_RATE: u32 = 115200;
/// Polling period of the engine loop (20 Hz).
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);
/// Serial read timeout.
pub const READ_TIMEOUT: Duration = Duration::from_millis(100);
pub const AUTO_LOG_FILE: &str = "auto_log.csv";
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum XAxisMode {
    /// Wall-clock time of reception.
    #[default]
    WallClock,
    /// 1, 2, 3, ... per parsed sample.
    Counter,
}
/// Settings the sample sink reads on every line.
#[derive(Clone, Debug, PartialEq)]
pub struct SinkConfig {
    /// Tag searched as `#<tag>:`; empty disables parsing.
    pub parse_tag: String,
    pub timestamp_prefix: bool,
    pub auto_save: bool,
    pub x_axis: XAxisMode,
}
impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            parse_tag: String::new(),
            timestamp_prefix: true,
            auto_save: true,
            x_axis: XAxisMode::WallClock,
        }
    }
}
impl SinkConfig {
    pub fn tag(&self) -> &str {
        self.parse_tag.trim()
    }
}
/// Runtime configuration of the whole tool. Nothing here is persisted.
#[derive(Clone, Debug)]
pub struct ChartConfig {
    pub port: String,
    pub baud_rate: u32,
    pub auto_scroll: bool,
    /// Directory receiving `auto_log.csv` and manual exports.
    pub output_dir: PathBuf,
    pub sink: SinkConfig,
}
impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            auto_scroll: true,
            output_dir: PathBuf::from("."),
            sink: SinkConfig::default(),
        }
    }
}
impl ChartConfig {
    pub fn auto_log_path(&self) -> PathBuf {
        self.output_dir.join(AUTO_LOG_FILE)
    }
}
