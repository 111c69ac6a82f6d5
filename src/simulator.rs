// src/simulator.rs
use rand::Rng;
use crate::drivers::{ChartError, LineTransport};
/// Pseudo-port listed next to the real ones.
pub const SIMULATOR_PORT: &str = "SIMULATOR";
const CHANNELS: usize = 4;
/// Emits `#SIM:a,b,c,d/<ms>` lines so the tool can be tried without hardware.
/// Commands written to it are echoed back as `ack <command>`.
pub struct SimulatedTransport {
    phase: f64,
    echo: Option<String>,
}
impl SimulatedTransport {
    pub fn new() -> Self {
        log::info!("simulator connected");
        Self {
            phase: 0.0,
            echo: None,
        }
    }
    fn next_values(&mut self) -> Vec<i64> {
        let mut rng = rand::thread_rng();
        self.phase += 0.1;
        (0..CHANNELS)
            .map(|i| {
                let wave = (self.phase * (i as f64 * 0.5 + 1.0)).sin() * 100.0 * (i + 1) as f64;
                (wave + rng.gen_range(-5.0..5.0)).round() as i64
            })
            .collect()
    }
}
impl Default for SimulatedTransport {
    fn default() -> Self {
        Self::new()
    }
}
impl LineTransport for SimulatedTransport {
    fn read_line(&mut self) -> Result<Option<String>, ChartError> {
        if let Some(echo) = self.echo.take() {
            return Ok(Some(echo));
        }
        let values: Vec<String> = self.next_values().iter().map(i64::to_string).collect();
        Ok(Some(format!("#SIM:{}/50", values.join(","))))
    }
    fn write_line(&mut self, text: &str) -> Result<(), ChartError> {
        self.echo = Some(format!("ack {text}"));
        Ok(())
    }
    fn reset_input(&mut self) -> Result<(), ChartError> {
        self.echo = None;
        Ok(())
    }
}
