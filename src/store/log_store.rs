// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-pcf8591 project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Rotating sample log
//!
//! One JSON object per line, newest first:
//!
//! ```text
//! {"Date":"2025-06-01","Time":"14:03:07","AD0":0.0,"AD1":0.8,"AD2":1.7,"AD3":3.3}
//! ```

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::write_replace;

/// Header row of the CSV export
pub const CSV_HEADER: &str = "Date, Time, AD0, AD1, AD2, AD3";

/// One sampling cycle as stored in the log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Time")]
    pub time: String,
    #[serde(rename = "AD0")]
    pub ad0: f64,
    #[serde(rename = "AD1")]
    pub ad1: f64,
    #[serde(rename = "AD2")]
    pub ad2: f64,
    #[serde(rename = "AD3")]
    pub ad3: f64,
}

impl SampleRecord {
    pub fn new(timestamp: NaiveDateTime, readings: [f64; 4]) -> Self {
        let [ad0, ad1, ad2, ad3] = readings;
        Self {
            date: timestamp.format("%Y-%m-%d").to_string(),
            time: timestamp.format("%H:%M:%S").to_string(),
            ad0,
            ad1,
            ad2,
            ad3,
        }
    }

    pub fn readings(&self) -> [f64; 4] {
        [self.ad0, self.ad1, self.ad2, self.ad3]
    }

    /// CSV row matching [`CSV_HEADER`]
    pub fn csv_row(&self) -> String {
        format!(
            "{}, {}, {:.1}, {:.1}, {:.1}, {:.1}",
            self.date, self.time, self.ad0, self.ad1, self.ad2, self.ad3
        )
    }
}

/// Render records as the delimited text export, header first
pub fn to_csv(records: &[SampleRecord]) -> String {
    let mut out = String::with_capacity((records.len() + 1) * 48);
    out.push_str(CSV_HEADER);
    out.push('\n');
    for record in records {
        // writing to a String cannot fail
        let _ = writeln!(out, "{}", record.csv_row());
    }
    out
}

/// Line-delimited sample log, newest record first
pub struct LogStore {
    path: PathBuf,
}

impl LogStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw lines of the log, newest first. A missing or unreadable log is
    /// empty; lines that are not valid UTF-8 are skipped.
    pub fn read_raw(&self) -> Vec<String> {
        match std::fs::read(&self.path) {
            Ok(contents) => contents
                .split(|&b| b == b'\n')
                .enumerate()
                .filter_map(|(n, line)| match std::str::from_utf8(line) {
                    Ok(line) => Some(line.trim_end_matches('\r')),
                    Err(e) => {
                        warn!("Skipping undecodable log line {}: {}", n + 1, e);
                        None
                    }
                })
                .filter(|line| !line.trim().is_empty())
                .map(str::to_string)
                .collect(),
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                warn!("Cannot read sample log {:?}: {}", self.path, e);
                Vec::new()
            }
        }
    }

    /// Parsed records, newest first; malformed lines are skipped
    pub fn read_all(&self) -> Vec<SampleRecord> {
        self.read_raw()
            .iter()
            .enumerate()
            .filter_map(|(n, line)| match serde_json::from_str(line) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("Skipping malformed log line {}: {}", n + 1, e);
                    None
                }
            })
            .collect()
    }

    /// Prepend a record and rewrite the log, keeping at most `max_records`
    /// lines when `max_records` is nonzero
    pub fn append(&self, record: &SampleRecord, max_records: usize) -> Result<()> {
        let line = serde_json::to_string(record).context("Failed to serialize sample record")?;
        let mut lines = self.read_raw();
        lines.insert(0, line);
        if max_records > 0 {
            lines.truncate(max_records);
        }

        let mut contents = lines.join("\n");
        contents.push('\n');
        write_replace(&self.path, contents.as_bytes())?;
        debug!(
            "Appended sample to {:?} ({} records)",
            self.path,
            lines.len()
        );
        Ok(())
    }

    /// Export the whole log as CSV text
    pub fn export_csv(&self) -> String {
        to_csv(&self.read_all())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_record_wire_format() {
        let record = SampleRecord::new(at(14, 3, 7), [0.0, 0.8, 1.7, 3.3]);
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"Date":"2025-06-01","Time":"14:03:07","AD0":0.0,"AD1":0.8,"AD2":1.7,"AD3":3.3}"#
        );
    }

    #[test]
    fn test_csv_export_has_fixed_header() {
        let records = vec![
            SampleRecord::new(at(10, 0, 1), [3.0, 0.0, 1.3, 2.5]),
            SampleRecord::new(at(10, 0, 0), [0.1, 0.2, 0.3, 0.4]),
        ];
        let csv = to_csv(&records);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Date, Time, AD0, AD1, AD2, AD3");
        assert_eq!(lines[1], "2025-06-01, 10:00:01, 3.0, 0.0, 1.3, 2.5");
        assert_eq!(lines[2], "2025-06-01, 10:00:00, 0.1, 0.2, 0.3, 0.4");
        assert_eq!(to_csv(&[]), "Date, Time, AD0, AD1, AD2, AD3\n");
    }
}
