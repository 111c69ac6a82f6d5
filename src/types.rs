// src/types.rs
use std::path::PathBuf;
use crate::config::SinkConfig;
use crate::drivers::HistoryFrame;
/// Connection state of the engine.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
pub enum LinkState {
    #[default]
    Disconnected,
    /// Port open, one line read per tick.
    Running,
    /// Port open, polling halted.
    Stopped,
}
impl LinkState {
    pub fn is_connected(self) -> bool {
        self != LinkState::Disconnected
    }
}
// GUI -> engine
#[derive(Clone, Debug)]
pub enum GuiCommand {
    Connect { port: String, baud_rate: u32 },
    Disconnect,
    Stop,
    Start,
    Clear,
    Send(String),
    Configure(SinkConfig),
    /// Directory for `auto_log.csv` from the next sample on.
    SetOutputDir(PathBuf),
    ToggleChannel(usize),
    Shutdown,
}
// engine -> GUI
#[derive(Clone, Debug)]
pub enum ChartMessage {
    Log(String),
    State(LinkState),
    Frame(HistoryFrame),
    /// History and console wiped.
    Cleared,
}
