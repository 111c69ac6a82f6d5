// src/engine.rs
use std::path::Path;
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use crate::config::{ChartConfig, AUTO_LOG_FILE, POLL_INTERVAL};
use crate::drivers::{ChannelStore, ChartError, Connector, LineTransport, Sample, SampleSink, SinkEvents};
use crate::recorder::AutoLogger;
use crate::serial::SerialConnector;
use crate::types::*;
/// Everything the sink reports goes straight back to the GUI.
struct Outbox {
    tx: Sender<ChartMessage>,
    auto_log: AutoLogger,
}
impl Outbox {
    fn send(&self, msg: ChartMessage) {
        // The GUI going away is handled by the command channel.
        self.tx.send(msg).ok();
    }
    fn log(&self, text: impl Into<String>) {
        self.send(ChartMessage::Log(text.into()));
    }
}
impl SinkEvents for Outbox {
    fn append_log(&mut self, text: &str) {
        self.log(text);
    }
    fn persist_sample(&mut self, sample: &Sample) -> Result<(), ChartError> {
        self.auto_log.append(sample)
    }
    fn redraw(&mut self, store: &ChannelStore) {
        self.send(ChartMessage::Frame(store.frame()));
    }
}
/// Connection state machine plus the per-tick read step.
pub struct Engine<C: Connector> {
    connector: C,
    link: Option<Box<dyn LineTransport>>,
    state: LinkState,
    sink: SampleSink,
    outbox: Outbox,
}
impl<C: Connector> Engine<C> {
    pub fn new(connector: C, config: &ChartConfig, tx: Sender<ChartMessage>) -> Self {
        Self {
            connector,
            link: None,
            state: LinkState::Disconnected,
            sink: SampleSink::new(config.sink.clone()),
            outbox: Outbox {
                tx,
                auto_log: AutoLogger::new(config.auto_log_path()),
            },
        }
    }
    #[cfg(test)]
    pub fn state(&self) -> LinkState {
        self.state
    }
    #[cfg(test)]
    pub fn sink(&self) -> &SampleSink {
        &self.sink
    }
    /// Applies one GUI command. Returns `false` once the engine should exit.
    pub fn handle(&mut self, cmd: GuiCommand) -> bool {
        match cmd {
            GuiCommand::Connect { port, baud_rate } => self.connect(&port, baud_rate),
            GuiCommand::Disconnect => self.disconnect(),
            GuiCommand::Stop => self.stop(),
            GuiCommand::Start => self.start(),
            GuiCommand::Clear => {
                self.sink.clear(&mut self.outbox);
                self.outbox.send(ChartMessage::Cleared);
            }
            GuiCommand::Send(text) => self.send_command(&text),
            GuiCommand::Configure(config) => {
                log::debug!("sink config: {config:?}");
                self.sink.set_config(config, &mut self.outbox);
            }
            GuiCommand::SetOutputDir(dir) => self.set_output_dir(&dir),
            GuiCommand::ToggleChannel(index) => {
                if let Some(visible) = self.sink.toggle_channel(index, &mut self.outbox) {
                    log::debug!("channel {} visible: {visible}", index + 1);
                }
            }
            GuiCommand::Shutdown => {
                self.disconnect();
                return false;
            }
        }
        true
    }
    /// One polling step: read at most one line while running.
    pub fn tick(&mut self) {
        if self.state != LinkState::Running {
            return;
        }
        let Some(link) = self.link.as_mut() else {
            return;
        };
        match link.read_line() {
            Ok(Some(line)) => {
                self.sink.on_line(&line, &mut self.outbox);
            }
            Ok(None) => {}
            Err(e) => {
                log::warn!("read failed: {e}");
                self.outbox.log(format!("Read Error: {e}"));
            }
        }
    }
    /// Drains commands and ticks every [`POLL_INTERVAL`] until shut down.
    pub fn run(&mut self, rx_cmd: Receiver<GuiCommand>) {
        loop {
            loop {
                match rx_cmd.try_recv() {
                    Ok(cmd) => {
                        if !self.handle(cmd) {
                            return;
                        }
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        self.disconnect();
                        return;
                    }
                }
            }
            self.tick();
            thread::sleep(POLL_INTERVAL);
        }
    }
    fn set_state(&mut self, state: LinkState) {
        self.state = state;
        self.outbox.send(ChartMessage::State(state));
    }
    fn connect(&mut self, port: &str, baud_rate: u32) {
        if self.state.is_connected() {
            log::warn!("connect ignored: already connected");
            return;
        }
        match self.connector.open(port, baud_rate) {
            Ok(link) => {
                self.link = Some(link);
                self.set_state(LinkState::Running);
                self.outbox.log(format!("Connected to {port}"));
            }
            Err(e) => {
                log::error!("{e}");
                self.outbox.log(format!("Error: {e}"));
            }
        }
    }
    fn disconnect(&mut self) {
        if self.link.take().is_none() {
            return;
        }
        self.set_state(LinkState::Disconnected);
        self.outbox.log("Disconnected.");
    }
    fn stop(&mut self) {
        if self.state != LinkState::Running {
            return;
        }
        self.set_state(LinkState::Stopped);
        self.outbox.log("Chart stopped.");
        self.reset_input();
    }
    fn start(&mut self) {
        if self.state != LinkState::Stopped {
            return;
        }
        self.reset_input();
        self.set_state(LinkState::Running);
        self.outbox.log("Chart started.");
    }
    fn reset_input(&mut self) {
        if let Some(link) = self.link.as_mut() {
            if let Err(e) = link.reset_input() {
                self.outbox.log(format!("Error: {e}"));
            }
        }
    }
    fn set_output_dir(&mut self, dir: &Path) {
        let path = dir.join(AUTO_LOG_FILE);
        log::info!("auto-log moved to {}", path.display());
        self.outbox.auto_log = AutoLogger::new(path);
    }
    fn send_command(&mut self, text: &str) {
        let Some(link) = self.link.as_mut() else {
            log::debug!("send ignored: not connected");
            return;
        };
        match link.write_line(text) {
            Ok(()) => self.outbox.log(format!("> {text}")),
            Err(e) => self.outbox.log(format!("Send Error: {e}")),
        }
    }
}
/// Starts the engine on its own thread, talking to the GUI over channels.
pub fn spawn_thread(
    config: ChartConfig,
    tx: Sender<ChartMessage>,
    rx_cmd: Receiver<GuiCommand>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        log::info!("engine ready");
        let mut engine = Engine::new(SerialConnector, &config, tx);
        engine.run(rx_cmd);
        log::info!("engine stopped");
    })
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SinkConfig, XAxisMode};
    use std::collections::VecDeque;
    use std::sync::mpsc::channel;
    use std::sync::{Arc, Mutex, MutexGuard};
    /// In-memory transport. Clones share one queue, so a test keeps a handle after
    /// the engine takes its own.
    #[derive(Clone, Default)]
    struct ManualTransport {
        state: Arc<Mutex<ManualState>>,
    }
    #[derive(Default)]
    struct ManualState {
        queue: VecDeque<Result<String, std::io::ErrorKind>>,
        written: Vec<String>,
        resets: usize,
    }
    impl ManualTransport {
        fn state(&self) -> MutexGuard<'_, ManualState> {
            self.state.lock().unwrap()
        }
        fn push_line(&self, line: &str) {
            self.state().queue.push_back(Ok(line.to_owned()));
        }
        fn push_error(&self, kind: std::io::ErrorKind) {
            self.state().queue.push_back(Err(kind));
        }
        fn pending(&self) -> usize {
            self.state().queue.len()
        }
        fn written(&self) -> Vec<String> {
            self.state().written.clone()
        }
        fn resets(&self) -> usize {
            self.state().resets
        }
    }
    impl LineTransport for ManualTransport {
        fn read_line(&mut self) -> Result<Option<String>, ChartError> {
            match self.state().queue.pop_front() {
                Some(Ok(line)) => Ok(Some(line)),
                Some(Err(kind)) => Err(ChartError::Read(kind.into())),
                None => Ok(None),
            }
        }
        fn write_line(&mut self, text: &str) -> Result<(), ChartError> {
            self.state().written.push(text.to_owned());
            Ok(())
        }
        fn reset_input(&mut self) -> Result<(), ChartError> {
            let mut state = self.state();
            state.resets += 1;
            state.queue.clear();
            Ok(())
        }
    }
    struct FakeConnector {
        transport: ManualTransport,
        fail: bool,
    }
    impl Connector for FakeConnector {
        fn open(&mut self, port: &str, _baud_rate: u32) -> Result<Box<dyn LineTransport>, ChartError> {
            if self.fail {
                return Err(ChartError::Connection {
                    port: port.to_owned(),
                    source: serialport::Error::new(serialport::ErrorKind::NoDevice, "no such port"),
                });
            }
            Ok(Box::new(self.transport.clone()))
        }
    }
    struct Harness {
        engine: Engine<FakeConnector>,
        transport: ManualTransport,
        rx: Receiver<ChartMessage>,
        _dir: tempfile::TempDir,
    }
    impl Harness {
        fn new(fail: bool) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let config = ChartConfig {
                output_dir: dir.path().to_owned(),
                sink: SinkConfig {
                    parse_tag: "T".into(),
                    timestamp_prefix: false,
                    auto_save: true,
                    x_axis: XAxisMode::Counter,
                },
                ..Default::default()
            };
            let transport = ManualTransport::default();
            let (tx, rx) = channel();
            let connector = FakeConnector {
                transport: transport.clone(),
                fail,
            };
            Self {
                engine: Engine::new(connector, &config, tx),
                transport,
                rx,
                _dir: dir,
            }
        }
        fn connect(&mut self) {
            assert!(self.engine.handle(GuiCommand::Connect {
                port: "COM7".into(),
                baud_rate: 115200,
            }));
        }
        fn drain(&self) -> Vec<ChartMessage> {
            self.rx.try_iter().collect()
        }
        fn logs(&self) -> Vec<String> {
            self.drain()
                .into_iter()
                .filter_map(|m| match m {
                    ChartMessage::Log(s) => Some(s),
                    _ => None,
                })
                .collect()
        }
        fn auto_log(&self) -> String {
            std::fs::read_to_string(self._dir.path().join("auto_log.csv")).unwrap_or_default()
        }
    }
    #[test]
    fn connect_then_read_one_line_per_tick() {
        let mut h = Harness::new(false);
        h.connect();
        assert_eq!(h.engine.state(), LinkState::Running);
        assert_eq!(h.logs(), vec!["Connected to COM7"]);
        h.transport.push_line("#T:1,2");
        h.transport.push_line("#T:3,4");
        h.engine.tick();
        assert_eq!(h.engine.sink().store().len(), 1);
        assert_eq!(h.transport.pending(), 1);
        h.engine.tick();
        let store = h.engine.sink().store();
        assert_eq!(store.len(), 2);
        assert_eq!(store.channel_count(), 2);
        let frames = h
            .drain()
            .into_iter()
            .filter(|m| matches!(m, ChartMessage::Frame(_)))
            .count();
        assert_eq!(frames, 2);
        assert_eq!(h.auto_log(), "Timestamp,CH1,CH2\n1,1,2\n2,3,4\n");
    }
    #[test]
    fn failed_connect_stays_disconnected() {
        let mut h = Harness::new(true);
        h.connect();
        assert_eq!(h.engine.state(), LinkState::Disconnected);
        let logs = h.logs();
        assert_eq!(logs.len(), 1);
        assert!(logs[0].starts_with("Error: cannot open COM7"), "{logs:?}");
        h.engine.tick();
    }
    #[test]
    fn read_error_is_reported_and_polling_continues() {
        let mut h = Harness::new(false);
        h.connect();
        h.drain();
        h.transport.push_error(std::io::ErrorKind::InvalidData);
        h.transport.push_line("#T:5");
        h.engine.tick();
        h.engine.tick();
        let logs = h.logs();
        assert!(logs[0].starts_with("Read Error: "), "{logs:?}");
        assert_eq!(logs[1], "#T:5");
        assert_eq!(h.engine.state(), LinkState::Running);
        assert_eq!(h.engine.sink().store().len(), 1);
    }
    #[test]
    fn stop_halts_polling_and_flushes_input() {
        let mut h = Harness::new(false);
        h.connect();
        h.transport.push_line("#T:1");
        h.engine.handle(GuiCommand::Stop);
        assert_eq!(h.engine.state(), LinkState::Stopped);
        assert_eq!(h.transport.resets(), 1);
        h.transport.push_line("#T:2");
        h.engine.tick();
        assert!(h.engine.sink().store().is_empty());
        h.engine.handle(GuiCommand::Start);
        assert_eq!(h.engine.state(), LinkState::Running);
        assert_eq!(h.transport.resets(), 2);
        h.engine.tick();
        assert!(h.engine.sink().store().is_empty());
        let logs = h.logs();
        assert!(logs.contains(&"Chart stopped.".to_owned()));
        assert!(logs.contains(&"Chart started.".to_owned()));
    }
    #[test]
    fn stop_and_start_need_a_connection() {
        let mut h = Harness::new(false);
        h.engine.handle(GuiCommand::Stop);
        h.engine.handle(GuiCommand::Start);
        assert_eq!(h.engine.state(), LinkState::Disconnected);
        assert!(h.drain().is_empty());
    }
    #[test]
    fn disconnect_drops_the_link() {
        let mut h = Harness::new(false);
        h.connect();
        h.engine.handle(GuiCommand::Disconnect);
        assert_eq!(h.engine.state(), LinkState::Disconnected);
        h.transport.push_line("#T:1");
        h.engine.tick();
        assert!(h.engine.sink().store().is_empty());
        assert!(h.logs().contains(&"Disconnected.".to_owned()));
        h.engine.handle(GuiCommand::Disconnect);
        assert!(h.drain().is_empty());
    }
    #[test]
    fn send_writes_and_echoes() {
        let mut h = Harness::new(false);
        h.engine.handle(GuiCommand::Send("ignored".into()));
        h.connect();
        h.engine.handle(GuiCommand::Send("reset".into()));
        assert_eq!(h.transport.written(), vec!["reset"]);
        assert!(h.logs().contains(&"> reset".to_owned()));
    }
    #[test]
    fn clear_wipes_history_and_notifies() {
        let mut h = Harness::new(false);
        h.connect();
        h.transport.push_line("#T:1,2,3");
        h.engine.tick();
        h.drain();
        h.engine.handle(GuiCommand::Clear);
        assert!(h.engine.sink().store().is_empty());
        let msgs = h.drain();
        assert!(matches!(&msgs[0], ChartMessage::Frame(f) if f.is_empty()));
        assert!(matches!(msgs[1], ChartMessage::Cleared));
    }
    #[test]
    fn configure_changes_the_tag() {
        let mut h = Harness::new(false);
        h.connect();
        h.engine.handle(GuiCommand::Configure(SinkConfig {
            parse_tag: "ADC".into(),
            timestamp_prefix: false,
            auto_save: false,
            x_axis: XAxisMode::Counter,
        }));
        h.transport.push_line("#T:1");
        h.transport.push_line("#ADC:9");
        h.engine.tick();
        h.engine.tick();
        let store = h.engine.sink().store();
        assert_eq!(store.len(), 1);
        assert_eq!(store.channel(0).unwrap().history()[0], Some(9));
        assert_eq!(h.auto_log(), "");
    }
    #[test]
    fn axis_switch_clears_the_window() {
        let mut h = Harness::new(false);
        h.connect();
        h.transport.push_line("#T:1,2");
        h.engine.tick();
        h.drain();
        h.engine.handle(GuiCommand::Configure(SinkConfig {
            parse_tag: "T".into(),
            timestamp_prefix: false,
            auto_save: false,
            x_axis: XAxisMode::WallClock,
        }));
        assert!(h.engine.sink().store().is_empty());
        let msgs = h.drain();
        assert!(matches!(&msgs[..], [ChartMessage::Frame(f)] if f.is_empty()));
    }
    #[test]
    fn output_dir_moves_the_auto_log() {
        let mut h = Harness::new(false);
        let other = tempfile::tempdir().unwrap();
        h.connect();
        h.transport.push_line("#T:1");
        h.engine.tick();
        h.engine.handle(GuiCommand::SetOutputDir(other.path().to_owned()));
        h.transport.push_line("#T:2,3");
        h.engine.tick();
        assert_eq!(h.auto_log(), "Timestamp,CH1\n1,1\n");
        let moved = std::fs::read_to_string(other.path().join("auto_log.csv")).unwrap();
        assert_eq!(moved, "Timestamp,CH1,CH2\n2,2,3\n");
    }
    #[test]
    fn toggle_channel_sends_a_frame() {
        let mut h = Harness::new(false);
        h.connect();
        h.transport.push_line("#T:1,2");
        h.engine.tick();
        h.drain();
        h.engine.handle(GuiCommand::ToggleChannel(1));
        let msgs = h.drain();
        match &msgs[..] {
            [ChartMessage::Frame(f)] => assert!(!f.channels[1].visible),
            other => panic!("unexpected messages: {other:?}"),
        }
    }
    #[test]
    fn run_exits_on_shutdown() {
        let mut h = Harness::new(false);
        let (tx_cmd, rx_cmd) = channel();
        tx_cmd
            .send(GuiCommand::Connect {
                port: "COM7".into(),
                baud_rate: 9600,
            })
            .unwrap();
        tx_cmd.send(GuiCommand::Shutdown).unwrap();
        h.engine.run(rx_cmd);
        assert_eq!(h.engine.state(), LinkState::Disconnected);
    }
    #[test]
    fn run_exits_when_gui_is_gone() {
        let mut h = Harness::new(false);
        let (tx_cmd, rx_cmd) = channel::<GuiCommand>();
        drop(tx_cmd);
        h.engine.run(rx_cmd);
    }
}
