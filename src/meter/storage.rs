use crate::error::AppError;
use crate::state::MeasurementRecord;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

pub const CSV_HEADER: &str = "Time,Temp,Hum,FillLevelCM";

/// Summary over one session's records. Fill statistics only consider levels
/// strictly greater than zero, which excludes the read-error sentinel and
/// below-reference readings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSummary {
    pub count: usize,
    pub max_fill_cm: Option<f64>,
    pub mean_fill_cm: Option<f64>,
}

pub fn summarize(records: &[MeasurementRecord]) -> SessionSummary {
    let fills: Vec<f64> = records
        .iter()
        .map(|r| r.fill_level_cm)
        .filter(|fill| *fill > 0.0)
        .collect();

    if fills.is_empty() {
        return SessionSummary {
            count: records.len(),
            max_fill_cm: None,
            mean_fill_cm: None,
        };
    }

    let max = fills.iter().copied().fold(f64::MIN, f64::max);
    let mean = fills.iter().sum::<f64>() / fills.len() as f64;
    SessionSummary {
        count: records.len(),
        max_fill_cm: Some(max),
        mean_fill_cm: Some(mean),
    }
}

/// Writes one session's records as a CSV table, truncating any previous
/// session's file.
pub struct SessionWriter {
    path: PathBuf,
}

impl SessionWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush a completed session. An empty record set is a no-op; the summary
    /// is logged regardless of whether the write below succeeds.
    pub fn flush(&self, records: &[MeasurementRecord]) -> Result<(), AppError> {
        if records.is_empty() {
            info!("No data collected for this session");
            return Ok(());
        }

        let summary = summarize(records);
        info!(total = summary.count, "Session complete");
        if let (Some(max), Some(mean)) = (summary.max_fill_cm, summary.mean_fill_cm) {
            info!(
                max_fill_cm = format_args!("{max:.1}"),
                mean_fill_cm = format_args!("{mean:.1}"),
                "Fill level summary"
            );
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = std::fs::File::create(&self.path)?;
        writeln!(file, "{CSV_HEADER}")?;
        for record in records {
            writeln!(
                file,
                "{:02}:{:02}:{:02},{:.1},{:.1},{:.1}",
                record.time.hour(),
                record.time.minute(),
                record.time.second(),
                record.temperature,
                record.humidity,
                record.fill_level_cm
            )?;
        }

        info!(path = %self.path.display(), "Session data saved");
        Ok(())
    }
}
