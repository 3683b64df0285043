#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use libct400_sys::core::{CtResult, Detector};
use libct400_sys::scan::{PointCounts, Sweep};

/// Where sweep results land and which of the two file families get written:
/// the driver's own text dumps, our combined tab-separated record, or both.
#[derive(Debug, Clone)]
pub struct OutputSetup {
    pub directory: PathBuf,
    pub driver_files: bool,
    pub record_file: bool,
}

impl Default for OutputSetup {
    fn default() -> Self {
        OutputSetup {
            directory: PathBuf::from("."),
            driver_files: true,
            record_file: true,
        }
    }
}

/// One completed sweep, copied out of the driver: the resampled wavelength
/// grid, one power trace per recorded detector, and whatever spectral lines
/// heterodyne detection turned up.
#[derive(Debug, Clone)]
pub struct SweepRecord {
    pub started: DateTime<Local>,
    pub duration_s: f64,
    pub counts: PointCounts,
    pub wavelength_nm: Vec<f64>,
    pub detectors: Vec<(Detector, Vec<f64>)>,
    pub lines_nm: Vec<f64>,
}

impl SweepRecord {
    pub fn collect(
        sweep: &Sweep,
        detectors: &[Detector],
        started: DateTime<Local>,
        duration_s: f64,
    ) -> CtResult<Self> {
        let wavelength_nm = sweep.wavelength_resampled()?;
        let mut traces = Vec::with_capacity(detectors.len());
        for &det in detectors {
            traces.push((det, sweep.detector_resampled(det)?));
        }
        let lines_nm = sweep.lines_detected()?;
        Ok(SweepRecord {
            started,
            duration_s,
            counts: sweep.counts(),
            wavelength_nm,
            detectors: traces,
            lines_nm,
        })
    }

    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "sweep of {} points ({} discarded, {} resampled) in {:.2} s",
            self.counts.data_points,
            self.counts.discard_points,
            self.counts.resampled_points,
            self.duration_s
        )
    }

    #[must_use]
    pub fn file_stem(&self) -> String {
        self.started.format("%Y%m%d-%H%M%S").to_string()
    }

    /// Tab-separated resampled traces, one row per wavelength, heterodyne
    /// lines as trailing comment rows.
    pub fn write_txt(&self, path: &Path) -> io::Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        write!(out, "wavelength_nm")?;
        for (det, _) in &self.detectors {
            write!(out, "\t{det:?}_dbm")?;
        }
        writeln!(out)?;
        for (i, lambda) in self.wavelength_nm.iter().enumerate() {
            write!(out, "{lambda:.5}")?;
            for (_, trace) in &self.detectors {
                match trace.get(i) {
                    Some(v) => write!(out, "\t{v:.3}")?,
                    None => write!(out, "\t")?,
                }
            }
            writeln!(out)?;
        }
        for (i, line) in self.lines_nm.iter().enumerate() {
            writeln!(out, "# heterodyne line {}: {line:.4} nm", i + 1)?;
        }
        out.flush()
    }
}

/// Asks the driver to dump its own trace files next to our record, using the
/// same file set as the vendor's sample program.
pub fn save_driver_files(
    sweep: &Sweep,
    detectors: &[Detector],
    directory: &Path,
    stem: &str,
) -> CtResult<()> {
    sweep.save_wavelength_sync(&directory.join(format!("{stem}_lambda_sync.txt")))?;
    sweep.save_wavelength_resampled(&directory.join(format!("{stem}_lambda_resampled.txt")))?;
    sweep.save_power_sync(&directory.join(format!("{stem}_power_sync.txt")))?;
    sweep.save_power_resampled(&directory.join(format!("{stem}_power_resampled.txt")))?;
    for &det in detectors {
        let n = det as i32;
        sweep.save_detector_sync(det, &directory.join(format!("{stem}_detector{n}_sync.txt")))?;
        sweep.save_detector_resampled(
            det,
            &directory.join(format!("{stem}_detector{n}_resampled.txt")),
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_file_has_one_row_per_wavelength() {
        let record = SweepRecord {
            started: Local::now(),
            duration_s: 1.25,
            counts: PointCounts {
                data_points: 43,
                discard_points: 12,
                resampled_points: 3,
            },
            wavelength_nm: vec![1550.0, 1550.5, 1551.0],
            detectors: vec![
                (Detector::D1, vec![-3.0, -3.1, -3.2]),
                (Detector::D2, vec![-4.5, -4.6, -4.7]),
            ],
            lines_nm: vec![1550.25],
        };
        let path = std::env::temp_dir().join(format!(
            "ct400ctl-record-{}.txt",
            std::process::id()
        ));
        record.write_txt(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("wavelength_nm\tD1_dbm\tD2_dbm"));
        assert_eq!(lines.clone().filter(|l| !l.starts_with('#')).count(), 3);
        assert_eq!(lines.filter(|l| l.starts_with('#')).count(), 1);
        assert!(record.summary().contains("43 points"));
    }
}
