// src/recorder.rs
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use chrono::{DateTime, Local};
use crate::drivers::{ChartError, HistoryFrame, Sample};
/// Appends every parsed sample to a CSV file (`auto_log.csv`).
///
/// The column count is fixed by the header: the first sample written to a new file,
/// or the header already present in an existing one. Later rows are padded or cut
/// to that width.
pub struct AutoLogger {
    path: PathBuf,
    columns: Option<usize>,
}
impl AutoLogger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            columns: None,
        }
    }
    pub fn append(&mut self, sample: &Sample) -> Result<(), ChartError> {
        let io_err = |e| ChartError::io(&self.path, e);
        // A file removed or rotated since the last row gets a fresh header.
        let existing = match self.columns {
            Some(n) if self.path.is_file() => Some(n),
            _ => existing_columns(&self.path).map_err(io_err)?,
        };
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(io_err)?;
        let mut w = BufWriter::new(file);
        let columns = match existing {
            Some(n) => n,
            None => {
                let n = sample.values.len();
                let header: Vec<String> = (1..=n).map(|i| format!("CH{i}")).collect();
                writeln!(w, "Timestamp,{}", header.join(",")).map_err(io_err)?;
                log::info!("auto-log started: {} ({n} channels)", self.path.display());
                n
            }
        };
        self.columns = Some(columns);
        if sample.values.len() > columns {
            log::warn!(
                "sample has {} values but {} only has {columns} columns; extra values dropped",
                sample.values.len(),
                self.path.display()
            );
        }
        writeln!(w, "{}", csv_row(sample, columns)).map_err(io_err)?;
        w.flush().map_err(io_err)
    }
}
fn csv_row(sample: &Sample, columns: usize) -> String {
    let mut row = sample.x.to_string();
    for i in 0..columns {
        row.push(',');
        if let Some(v) = sample.values.get(i) {
            row.push_str(&v.to_string());
        }
    }
    row
}
/// Channel columns declared by an existing file's header, if the file has one.
fn existing_columns(path: &Path) -> std::io::Result<Option<usize>> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    let mut header = String::new();
    BufReader::new(file).read_line(&mut header)?;
    let header = header.trim_end();
    if header.is_empty() {
        return Ok(None);
    }
    Ok(Some(header.split(',').count().saturating_sub(1)))
}
/// `YYYYMMDD_HHMMSS` stamp used in export file names.
pub fn file_stamp(now: DateTime<Local>) -> String {
    now.format("%Y%m%d_%H%M%S").to_string()
}
/// Writes channel 1 of the window as `chart_data_<stamp>.csv` (`Index,Value`).
pub fn export_chart(dir: &Path, stamp: &str, frame: &HistoryFrame) -> Result<PathBuf, ChartError> {
    let path = dir.join(format!("chart_data_{stamp}.csv"));
    let mut out = String::from("Index,Value\n");
    if let Some(first) = frame.channels.first() {
        for (x, value) in &first.points {
            let value = value.map(|v| v.to_string()).unwrap_or_default();
            out.push_str(&format!("{x},{value}\n"));
        }
    }
    fs::write(&path, out).map_err(|e| ChartError::io(&path, e))?;
    Ok(path)
}
/// Writes the console text as `console_data_<stamp>.csv`.
pub fn export_console(dir: &Path, stamp: &str, lines: &[String]) -> Result<PathBuf, ChartError> {
    let path = dir.join(format!("console_data_{stamp}.csv"));
    fs::write(&path, lines.join("\n")).map_err(|e| ChartError::io(&path, e))?;
    Ok(path)
}
/// Writes a PNG snapshot of the chart as `chart_<stamp>.png`.
pub fn export_snapshot(dir: &Path, stamp: &str, png: &[u8]) -> Result<PathBuf, ChartError> {
    let path = dir.join(format!("chart_{stamp}.png"));
    fs::write(&path, png).map_err(|e| ChartError::io(&path, e))?;
    Ok(path)
}
