use anyhow::Result;
use chrono::NaiveDate;
use rust_pcf8591::store::{LogStore, SampleRecord, CSV_HEADER};
use tempfile::tempdir;

fn record(second: u32, ad0: f64) -> SampleRecord {
    let timestamp = NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(12, 0, second)
        .unwrap();
    SampleRecord::new(timestamp, [ad0, 0.0, 0.0, 0.0])
}

#[test]
fn test_append_keeps_newest_within_cap() -> Result<()> {
    let temp_dir = tempdir()?;
    let log = LogStore::new(temp_dir.path().join("pcflog.json"));

    for i in 1..=5 {
        log.append(&record(i, f64::from(i)), 3)?;
    }

    let records = log.read_all();
    assert_eq!(records.len(), 3);
    let seconds: Vec<&str> = records.iter().map(|r| r.time.as_str()).collect();
    assert_eq!(seconds, ["12:00:05", "12:00:04", "12:00:03"]);
    assert_eq!(records[0].ad0, 5.0);

    Ok(())
}

#[test]
fn test_uncapped_log_grows() -> Result<()> {
    let temp_dir = tempdir()?;
    let log = LogStore::new(temp_dir.path().join("pcflog.json"));

    for i in 0..20 {
        log.append(&record(i, 1.0), 0)?;
    }
    assert_eq!(log.read_raw().len(), 20);

    Ok(())
}

#[test]
fn test_missing_log_is_empty() -> Result<()> {
    let temp_dir = tempdir()?;
    let log = LogStore::new(temp_dir.path().join("absent.json"));

    assert!(log.read_raw().is_empty());
    assert!(log.read_all().is_empty());
    assert_eq!(log.export_csv(), format!("{}\n", CSV_HEADER));

    Ok(())
}

#[test]
fn test_csv_export_skips_malformed_lines() -> Result<()> {
    let temp_dir = tempdir()?;
    let path = temp_dir.path().join("pcflog.json");
    let log = LogStore::new(&path);

    log.append(&record(1, 0.8), 0)?;
    let mut contents = std::fs::read_to_string(&path)?;
    contents.insert_str(0, "garbage line\n");
    std::fs::write(&path, contents)?;
    log.append(&record(2, 3.3), 0)?;

    let csv = log.export_csv();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "Date, Time, AD0, AD1, AD2, AD3");
    assert_eq!(lines[1], "2024-03-01, 12:00:02, 3.3, 0.0, 0.0, 0.0");
    assert_eq!(lines[2], "2024-03-01, 12:00:01, 0.8, 0.0, 0.0, 0.0");

    Ok(())
}

#[test]
fn test_undecodable_bytes_only_drop_their_line() -> Result<()> {
    use std::io::Write;

    let temp_dir = tempdir()?;
    let path = temp_dir.path().join("pcflog.json");
    let log = LogStore::new(&path);

    for i in 1..=10 {
        log.append(&record(i, 1.0), 0)?;
    }
    std::fs::OpenOptions::new()
        .append(true)
        .open(&path)?
        .write_all(b"\xff\n")?;

    assert_eq!(log.read_raw().len(), 10);

    log.append(&record(11, 2.0), 0)?;
    let records = log.read_all();
    assert_eq!(records.len(), 11);
    assert_eq!(records[0].time, "12:00:11");
    assert_eq!(records[10].time, "12:00:01");

    Ok(())
}
