//! CSV price file adapter.
//!
//! Columns are located by header name, so exports from different terminals
//! (`Time,Open,High,Low,Close`, `date,open,high,low,close,volume`, ...) load
//! without remapping. A `.zip` archive is read through its first `.csv`
//! entry. Rows must already be in time order; nothing is re-sorted.

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::domain::bar::{Bar, PriceSeries};
use crate::domain::error::FractalShiftError;
use crate::ports::data_port::DataPort;

const TIME_HEADERS: &[&str] = &["time", "date", "timestamp", "datetime"];
const VOLUME_HEADERS: &[&str] = &["volume", "tick_volume", "vol"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y.%m.%d %H:%M:%S",
    "%Y.%m.%d %H:%M",
];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y.%m.%d"];

pub const DEFAULT_MAX_SIZE_MB: u64 = 500;
const BYTES_PER_MB: u64 = 1024 * 1024;

pub struct CsvAdapter {
    path: PathBuf,
    time_format: Option<String>,
    max_bytes: u64,
}

struct Columns {
    time: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: Option<usize>,
}

fn load_err(path: &Path, reason: String) -> FractalShiftError {
    FractalShiftError::DataLoad {
        path: path.display().to_string(),
        reason,
    }
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

impl CsvAdapter {
    /// `path` is a single CSV or ZIP file, or a directory of `<symbol>.csv`
    /// (or `<symbol>.zip`) files.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            time_format: None,
            max_bytes: DEFAULT_MAX_SIZE_MB * BYTES_PER_MB,
        }
    }

    pub fn with_time_format(mut self, format: impl Into<String>) -> Self {
        self.time_format = Some(format.into());
        self
    }

    /// Reject files (and uncompressed archive entries) larger than this.
    pub fn with_max_size_mb(mut self, megabytes: u64) -> Self {
        self.max_bytes = megabytes.saturating_mul(BYTES_PER_MB);
        self
    }

    pub fn with_max_bytes(mut self, bytes: u64) -> Self {
        self.max_bytes = bytes;
        self
    }

    fn source_path(&self, symbol: &str) -> PathBuf {
        if !self.path.is_dir() {
            return self.path.clone();
        }
        let csv = self.path.join(format!("{}.csv", symbol));
        let zip = self.path.join(format!("{}.zip", symbol));
        if !csv.exists() && zip.exists() { zip } else { csv }
    }

    fn check_size(&self, path: &Path, bytes: u64) -> Result<(), FractalShiftError> {
        if bytes > self.max_bytes {
            return Err(load_err(
                path,
                format!(
                    "file too large: {} bytes, limit is {} MB",
                    bytes,
                    self.max_bytes / BYTES_PER_MB
                ),
            ));
        }
        Ok(())
    }

    fn parse_timestamp(&self, value: &str) -> Option<NaiveDateTime> {
        let value = value.trim();
        if let Some(format) = &self.time_format {
            return NaiveDateTime::parse_from_str(value, format)
                .ok()
                .or_else(|| {
                    NaiveDate::parse_from_str(value, format)
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                });
        }

        DATETIME_FORMATS
            .iter()
            .find_map(|f| NaiveDateTime::parse_from_str(value, f).ok())
            .or_else(|| {
                DATE_FORMATS
                    .iter()
                    .find_map(|f| NaiveDate::parse_from_str(value, f).ok())
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
    }

    /// Contents of the first `.csv` entry in a ZIP archive.
    fn read_zip_entry(&self, path: &Path) -> Result<String, FractalShiftError> {
        let file = File::open(path).map_err(|e| load_err(path, format!("read failed: {}", e)))?;
        let mut archive = zip::ZipArchive::new(file)
            .map_err(|e| load_err(path, format!("invalid zip archive: {}", e)))?;

        for i in 0..archive.len() {
            let mut entry = archive
                .by_index(i)
                .map_err(|e| load_err(path, format!("zip entry {}: {}", i, e)))?;
            if !entry.is_file() || !has_extension(Path::new(entry.name()), "csv") {
                continue;
            }

            self.check_size(path, entry.size())?;
            debug!(archive = %path.display(), entry = entry.name(), "reading zipped price file");
            let mut content = String::new();
            entry
                .read_to_string(&mut content)
                .map_err(|e| load_err(path, format!("zip entry {}: {}", entry.name(), e)))?;
            return Ok(content);
        }

        Err(load_err(path, "no CSV found in archive".to_string()))
    }

    fn read_source(&self, path: &Path) -> Result<String, FractalShiftError> {
        let meta = fs::metadata(path).map_err(|e| load_err(path, format!("read failed: {}", e)))?;
        self.check_size(path, meta.len())?;

        if has_extension(path, "zip") {
            self.read_zip_entry(path)
        } else {
            fs::read_to_string(path).map_err(|e| load_err(path, format!("read failed: {}", e)))
        }
    }

    /// Read and parse bars in file order without building a series.
    pub fn read_bars(&self, path: &Path) -> Result<Vec<Bar>, FractalShiftError> {
        let content = self.read_source(path)?;
        let load_err = |reason: String| load_err(path, reason);

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let headers = rdr
            .headers()
            .map_err(|e| load_err(format!("CSV header error: {}", e)))?
            .clone();
        let columns = locate_columns(&headers).map_err(load_err)?;

        let mut bars = Vec::new();
        for (row, result) in rdr.records().enumerate() {
            // Header is line 1.
            let line = row + 2;
            let record = result.map_err(|e| load_err(format!("CSV parse error: {}", e)))?;

            let time_str = record
                .get(columns.time)
                .ok_or_else(|| load_err(format!("line {}: missing time column", line)))?;
            let timestamp = self.parse_timestamp(time_str).ok_or_else(|| {
                load_err(format!("line {}: invalid timestamp '{}'", line, time_str))
            })?;

            let field = |idx: usize, name: &str| -> Result<f64, FractalShiftError> {
                record
                    .get(idx)
                    .ok_or_else(|| load_err(format!("line {}: missing {} column", line, name)))?
                    .parse::<f64>()
                    .map_err(|e| load_err(format!("line {}: invalid {} value: {}", line, name, e)))
            };

            let volume = match columns.volume {
                Some(idx) => field(idx, "volume")?,
                None => 0.0,
            };

            bars.push(Bar {
                timestamp,
                open: field(columns.open, "open")?,
                high: field(columns.high, "high")?,
                low: field(columns.low, "low")?,
                close: field(columns.close, "close")?,
                volume,
            });
        }

        debug!(path = %path.display(), bars = bars.len(), "loaded price file");
        Ok(bars)
    }
}

fn locate_columns(headers: &csv::StringRecord) -> Result<Columns, String> {
    let lower: Vec<String> = headers.iter().map(|h| h.to_lowercase()).collect();
    let find = |names: &[&str]| lower.iter().position(|h| names.contains(&h.as_str()));
    let require = |name: &str| find(&[name]).ok_or_else(|| format!("missing {} column", name));

    Ok(Columns {
        time: find(TIME_HEADERS).ok_or_else(|| "missing time column".to_string())?,
        open: require("open")?,
        high: require("high")?,
        low: require("low")?,
        close: require("close")?,
        volume: find(VOLUME_HEADERS),
    })
}

impl DataPort for CsvAdapter {
    fn load_series(&self, symbol: &str) -> Result<PriceSeries, FractalShiftError> {
        let path = self.source_path(symbol);
        let bars = self.read_bars(&path)?;
        PriceSeries::new(symbol, bars)
    }
}
