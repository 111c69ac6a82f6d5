// src/gui.rs
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::JoinHandle;
use anyhow::{Context, Result};
use chrono::{DateTime, Local, TimeZone};
use eframe::egui;
use egui::{Color32, RichText};
use egui_plot::{Line, Plot, PlotPoint, PlotPoints};
use crate::config::{ChartConfig, SinkConfig, XAxisMode, BAUD_RATES, POLL_INTERVAL};
use crate::drivers::{render_chart_png, ChannelFrame, HistoryFrame, PlotStyle};
use crate::engine;
use crate::recorder;
use crate::serial;
use crate::types::*;
pub struct SerialChartApp {
    config: ChartConfig,
    // Last sink settings pushed to the engine.
    sent_sink: SinkConfig,
    ports: Vec<String>,
    link_state: LinkState,
    frame: HistoryFrame,
    console: Vec<String>,
    command_input: String,
    // Edited text of the output directory, applied when the field loses focus.
    dir_input: String,
    rx: Receiver<ChartMessage>,
    tx_cmd: Sender<GuiCommand>,
    engine: Option<JoinHandle<()>>,
}
impl SerialChartApp {
    pub fn new(config: ChartConfig) -> Self {
        let (tx, rx) = channel();
        let (tx_cmd, rx_cmd) = channel();
        let engine = engine::spawn_thread(config.clone(), tx, rx_cmd);
        let ports = serial::list_ports();
        let mut config = config;
        if config.port.is_empty() {
            config.port = ports.first().cloned().unwrap_or_default();
        }
        Self {
            sent_sink: config.sink.clone(),
            dir_input: config.output_dir.display().to_string(),
            config,
            ports,
            link_state: LinkState::Disconnected,
            frame: HistoryFrame::default(),
            console: Vec::new(),
            command_input: String::new(),
            rx,
            tx_cmd,
            engine: Some(engine),
        }
    }
    fn log(&mut self, msg: impl Into<String>) {
        self.console.push(msg.into());
    }
    fn send(&mut self, cmd: GuiCommand) {
        if self.tx_cmd.send(cmd).is_err() {
            self.log("Engine stopped unexpectedly.");
        }
    }
    fn drain_messages(&mut self) {
        while let Ok(msg) = self.rx.try_recv() {
            match msg {
                ChartMessage::Log(s) => self.log(s),
                ChartMessage::State(state) => self.link_state = state,
                ChartMessage::Frame(frame) => self.frame = frame,
                ChartMessage::Cleared => {
                    self.console.clear();
                    self.log("Chart and console cleared.");
                }
            }
        }
    }
    fn sync_sink_config(&mut self) {
        if self.config.sink != self.sent_sink {
            self.sent_sink = self.config.sink.clone();
            let cmd = GuiCommand::Configure(self.sent_sink.clone());
            self.send(cmd);
        }
    }
    fn toggle_connection(&mut self) {
        let cmd = if self.link_state.is_connected() {
            GuiCommand::Disconnect
        } else {
            GuiCommand::Connect {
                port: self.config.port.clone(),
                baud_rate: self.config.baud_rate,
            }
        };
        self.send(cmd);
    }
    fn send_command(&mut self) {
        if !self.link_state.is_connected() {
            return;
        }
        let text = std::mem::take(&mut self.command_input);
        self.send(GuiCommand::Send(text));
    }
    fn apply_output_dir(&mut self) {
        let dir = PathBuf::from(self.dir_input.trim());
        if dir.as_os_str().is_empty() || dir == self.config.output_dir {
            return;
        }
        self.log(format!("Output directory: {}", dir.display()));
        self.config.output_dir = dir.clone();
        self.send(GuiCommand::SetOutputDir(dir));
    }
    fn save_data(&mut self) {
        match self.write_exports() {
            Ok((chart, console)) => {
                self.log(format!("Chart data saved to {}", chart.display()));
                self.log(format!("Console data saved to {}", console.display()));
            }
            Err(e) => {
                log::error!("{e:#}");
                self.log(format!("Save Error: {e:#}"));
            }
        }
    }
    fn write_exports(&self) -> Result<(PathBuf, PathBuf)> {
        let stamp = recorder::file_stamp(Local::now());
        let dir = &self.config.output_dir;
        let chart = recorder::export_chart(dir, &stamp, &self.frame)
            .context("exporting chart data")?;
        let console = recorder::export_console(dir, &stamp, &self.console)
            .context("exporting console")?;
        Ok((chart, console))
    }
    fn save_snapshot(&mut self) {
        match self.write_snapshot() {
            Ok(path) => self.log(format!("Chart image saved to {}", path.display())),
            Err(e) => self.log(format!("Save Error: {e:#}")),
        }
    }
    fn write_snapshot(&self) -> Result<PathBuf> {
        let png = render_chart_png(&self.frame, PlotStyle::default()).context("rendering chart")?;
        let stamp = recorder::file_stamp(Local::now());
        let path = recorder::export_snapshot(&self.config.output_dir, &stamp, &png)?;
        Ok(path)
    }
    fn legend(&mut self, ui: &mut egui::Ui) {
        let mut toggled = None;
        ui.horizontal_wrapped(|ui| {
            for channel in &self.frame.channels {
                let color = channel_color(channel);
                let text = RichText::new(format!("━ {}", channel.label));
                let text = if channel.visible {
                    text.color(color)
                } else {
                    text.color(color.gamma_multiply(0.2))
                };
                if ui.selectable_label(channel.visible, text).clicked() {
                    toggled = Some(channel.index);
                }
            }
        });
        if let Some(index) = toggled {
            self.send(GuiCommand::ToggleChannel(index));
        }
    }
    fn chart(&self, ui: &mut egui::Ui) {
        let mode = self.config.sink.x_axis;
        Plot::new("live_chart")
            .height((ui.available_height() - 20.0).max(100.0))
            .auto_bounds_x()
            .auto_bounds_y()
            .x_axis_formatter(move |x, _digits, _range| axis_label(mode, x))
            .label_formatter(move |name, point| hover_label(mode, name, point))
            .show(ui, |plot_ui| {
                for channel in self.frame.channels.iter().filter(|c| c.visible) {
                    let color = channel_color(channel);
                    for segment in segments(channel) {
                        plot_ui.line(
                            Line::new(PlotPoints::new(segment))
                                .name(&channel.label)
                                .color(color),
                        );
                    }
                }
            });
        let x_label = match mode {
            XAxisMode::WallClock => "time",
            XAxisMode::Counter => "sample counter",
        };
        ui.label(RichText::new(x_label).small());
    }
    fn controls(&mut self, ui: &mut egui::Ui) {
        let connected = self.link_state.is_connected();
        ui.horizontal(|ui| {
            ui.label("Port:");
            ui.add_enabled_ui(!connected, |ui| {
                egui::ComboBox::from_id_source("port")
                    .selected_text(self.config.port.clone())
                    .show_ui(ui, |ui| {
                        for port in &self.ports {
                            ui.selectable_value(&mut self.config.port, port.clone(), port.as_str());
                        }
                    });
                if ui.button("Refresh").clicked() {
                    self.ports = serial::list_ports();
                }
            });
            ui.label("Text:");
            ui.add(egui::TextEdit::singleline(&mut self.config.sink.parse_tag).desired_width(100.0));
            ui.label("Baud:");
            ui.add_enabled_ui(!connected, |ui| {
                egui::ComboBox::from_id_source("baud")
                    .selected_text(self.config.baud_rate.to_string())
                    .show_ui(ui, |ui| {
                        for baud in BAUD_RATES {
                            ui.selectable_value(&mut self.config.baud_rate, baud, baud.to_string());
                        }
                    });
            });
            ui.checkbox(&mut self.config.sink.timestamp_prefix, "Rcv Time");
            ui.checkbox(&mut self.config.auto_scroll, "Auto Scroll");
            ui.checkbox(&mut self.config.sink.auto_save, "Auto Save");
            ui.selectable_value(&mut self.config.sink.x_axis, XAxisMode::WallClock, "Time");
            ui.selectable_value(&mut self.config.sink.x_axis, XAxisMode::Counter, "Count");
            let label = if connected { "Disconnect" } else { "Connect" };
            if ui.button(label).clicked() {
                self.toggle_connection();
            }
        });
        ui.horizontal(|ui| {
            let input = ui.add(
                egui::TextEdit::singleline(&mut self.command_input)
                    .desired_width((ui.available_width() - 420.0).max(120.0)),
            );
            let entered = input.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if ui.button("Send").clicked() || entered {
                self.send_command();
            }
            let stop_label = if self.link_state == LinkState::Stopped { "Start" } else { "Stop" };
            if ui.add_enabled(connected, egui::Button::new(stop_label)).clicked() {
                let cmd = if self.link_state == LinkState::Stopped {
                    GuiCommand::Start
                } else {
                    GuiCommand::Stop
                };
                self.send(cmd);
            }
            ui.label("Dir:");
            let dir = ui.add(egui::TextEdit::singleline(&mut self.dir_input).desired_width(120.0));
            if dir.lost_focus() {
                self.apply_output_dir();
            }
            if ui.button("Clear").clicked() {
                self.send(GuiCommand::Clear);
            }
            if ui.button("Save").clicked() {
                self.save_data();
            }
            if ui
                .add_enabled(!self.frame.is_empty(), egui::Button::new("PNG"))
                .on_hover_text("Save chart image")
                .clicked()
            {
                self.save_snapshot();
            }
        });
    }
}
fn channel_color(channel: &ChannelFrame) -> Color32 {
    let [r, g, b] = channel.color;
    Color32::from_rgb(r, g, b)
}
/// Splits a channel into drawable runs, breaking at gaps.
fn segments(channel: &ChannelFrame) -> Vec<Vec<[f64; 2]>> {
    let mut runs = vec![Vec::new()];
    for (x, value) in &channel.points {
        match value {
            Some(v) => {
                if let Some(run) = runs.last_mut() {
                    run.push([x.as_f64(), *v as f64]);
                }
            }
            None => runs.push(Vec::new()),
        }
    }
    runs.retain(|r: &Vec<[f64; 2]>| !r.is_empty());
    runs
}
/// Local time of a plotted x position (seconds since the epoch).
fn local_time(x: f64) -> Option<DateTime<Local>> {
    Local.timestamp_millis_opt((x * 1000.0).round() as i64).single()
}
fn axis_label(mode: XAxisMode, x: f64) -> String {
    match mode {
        XAxisMode::WallClock => local_time(x)
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default(),
        XAxisMode::Counter => format!("{}", x.round() as i64),
    }
}
fn hover_label(mode: XAxisMode, name: &str, point: &PlotPoint) -> String {
    let x = match mode {
        XAxisMode::WallClock => match local_time(point.x) {
            Some(t) => format!("Time: {}", t.format("%Y-%m-%d %H:%M:%S%.6f")),
            None => String::new(),
        },
        XAxisMode::Counter => format!("Count: {}", point.x.round() as i64),
    };
    let y = format!("Y: {}", point.y.round() as i64);
    if name.is_empty() {
        format!("{x}\n{y}")
    } else {
        format!("{name}\n{x}\n{y}")
    }
}
impl eframe::App for SerialChartApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_messages();
        self.sync_sink_config();
        if self.link_state.is_connected() {
            ctx.request_repaint_after(POLL_INTERVAL);
        }
        egui::TopBottomPanel::bottom("controls").show(ctx, |ui| {
            ui.add_space(4.0);
            self.controls(ui);
            ui.add_space(4.0);
        });
        egui::SidePanel::left("console")
            .resizable(true)
            .default_width(420.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .stick_to_bottom(self.config.auto_scroll)
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        for line in &self.console {
                            ui.monospace(line);
                        }
                    });
            });
        egui::CentralPanel::default().show(ctx, |ui| {
            self.legend(ui);
            self.chart(ui);
        });
    }
    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.tx_cmd.send(GuiCommand::Shutdown).ok();
        if let Some(handle) = self.engine.take() {
            if handle.join().is_err() {
                log::error!("engine thread panicked");
            }
        }
    }
}
