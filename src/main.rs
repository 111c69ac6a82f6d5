// src/main.rs
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]
mod config;
mod drivers;
mod engine;
mod gui;
mod recorder;
mod serial;
mod simulator;
mod types;
use eframe::egui;
use config::ChartConfig;
// 入口函数
fn main() -> eframe::Result<()> {
    env_logger::init();
    let config = ChartConfig::default();
    log::info!(
        "serial-chart starting, auto-log at {}",
        config.auto_log_path().display()
    );
    let viewport = egui::ViewportBuilder::default()
        .with_inner_size([1000.0, 600.0])
        .with_min_inner_size([800.0, 480.0])
        .with_title("Serial Chart");
    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };
    eframe::run_native(
        "serial-chart",
        options,
        Box::new(|_cc| Box::new(gui::SerialChartApp::new(config))),
    )
}
