// src/drivers/mod.rs
pub mod error;
pub mod parser;
pub mod plot;
pub mod sink;
pub mod source;
pub mod store;
pub use error::ChartError;
pub use plot::{render_chart_png, PlotStyle};
pub use sink::{SampleSink, SinkEvents};
pub use source::{Connector, LineTransport, Sample, XValue};
pub use store::{ChannelFrame, ChannelStore, HistoryFrame};
