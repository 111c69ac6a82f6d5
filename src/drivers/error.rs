use std::path::PathBuf;
use thiserror::Error;
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("cannot open {port}: {source}")]
    Connection {
        port: String,
        #[source]
        source: serialport::Error,
    },
    #[error("{0}")]
    Read(#[source] std::io::Error),
    #[error("{message} (line: {line:?})")]
    Parse { line: String, message: String },
    #[error("write failed: {0}")]
    Write(#[source] std::io::Error),
    #[error("serial port error: {0}")]
    Port(#[from] serialport::Error),
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to render chart: {0}")]
    Plot(String),
}
impl ChartError {
    pub fn parse(line: &str, message: impl ToString) -> Self {
        ChartError::Parse {
            line: line.to_owned(),
            message: message.to_string(),
        }
    }
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ChartError::Io {
            path: path.into(),
            source,
        }
    }
}
impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for ChartError
{
    fn from(value: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        ChartError::Plot(format!("{value:?}"))
    }
}
impl From<image::ImageError> for ChartError {
    fn from(value: image::ImageError) -> Self {
        ChartError::Plot(value.to_string())
    }
}
