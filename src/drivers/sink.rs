use chrono::{DateTime, Local};
use crate::config::{SinkConfig, XAxisMode};
use crate::drivers::parser::parse_line;
use crate::drivers::store::ChannelStore;
use crate::drivers::{ChartError, Sample, XValue};
/// Collaborators notified while a line flows through the sink.
pub trait SinkEvents {
    /// Console output: raw lines and error reports.
    fn append_log(&mut self, text: &str);
    /// Auto-save of one parsed sample.
    fn persist_sample(&mut self, sample: &Sample) -> Result<(), ChartError>;
    /// The history window changed.
    fn redraw(&mut self, store: &ChannelStore);
}
/// Parser -> persistence -> store -> redraw, once per received line.
pub struct SampleSink {
    config: SinkConfig,
    store: ChannelStore,
    counter: u64,
}
impl SampleSink {
    pub fn new(config: SinkConfig) -> Self {
        Self {
            config,
            store: ChannelStore::default(),
            counter: 0,
        }
    }
    /// Applies new settings. Switching the x-axis mode starts a new window, since
    /// times and counters cannot share one axis.
    pub fn set_config(&mut self, config: SinkConfig, events: &mut dyn SinkEvents) {
        let axis_changed = config.x_axis != self.config.x_axis;
        self.config = config;
        if axis_changed {
            log::info!("x-axis switched to {:?}, history cleared", self.config.x_axis);
            self.clear(events);
        }
    }
    #[cfg(test)]
    pub fn store(&self) -> &ChannelStore {
        &self.store
    }
    pub fn on_line(&mut self, raw_line: &str, events: &mut dyn SinkEvents) -> Option<Sample> {
        self.on_line_at(raw_line, Local::now(), events)
    }
    /// Same as [`on_line`](Self::on_line) with an explicit reception time.
    pub fn on_line_at(
        &mut self,
        raw_line: &str,
        now: DateTime<Local>,
        events: &mut dyn SinkEvents,
    ) -> Option<Sample> {
        let line = if self.config.timestamp_prefix {
            format!("[{}] {}", now.format("%H:%M:%S%.3f"), raw_line)
        } else {
            raw_line.to_owned()
        };
        events.append_log(&line);
        let tag = self.config.tag();
        if tag.is_empty() {
            return None;
        }
        let values = match parse_line(&line, tag) {
            Ok(Some(values)) => values,
            Ok(None) => return None,
            Err(e) => {
                events.append_log(&format!("Parse Error: {e}"));
                return None;
            }
        };
        let sample = Sample {
            x: self.next_x(now),
            values,
        };
        if self.config.auto_save {
            if let Err(e) = events.persist_sample(&sample) {
                log::warn!("auto-save failed: {e}");
                events.append_log(&format!("Save Error: {e}"));
            }
        }
        self.store.observe(&sample.values, sample.x);
        events.redraw(&self.store);
        Some(sample)
    }
    pub fn toggle_channel(&mut self, index: usize, events: &mut dyn SinkEvents) -> Option<bool> {
        let visible = self.store.toggle_visibility(index)?;
        events.redraw(&self.store);
        Some(visible)
    }
    pub fn clear(&mut self, events: &mut dyn SinkEvents) {
        self.store.clear();
        self.counter = 0;
        events.redraw(&self.store);
    }
    fn next_x(&mut self, now: DateTime<Local>) -> XValue {
        match self.config.x_axis {
            XAxisMode::WallClock => XValue::Time(now),
            XAxisMode::Counter => {
                self.counter += 1;
                XValue::Counter(self.counter)
            }
        }
    }
}
