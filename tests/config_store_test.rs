use anyhow::Result;
use rust_pcf8591::store::{ConfigStore, PcfSettings};
use std::collections::HashMap;
use tempfile::tempdir;

fn form(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_missing_or_corrupt_file_yields_defaults() -> Result<()> {
    let temp_dir = tempdir()?;
    let path = temp_dir.path().join("pcf_adj.json");
    let store = ConfigStore::new(&path)?;

    assert_eq!(store.load(), PcfSettings::default());

    std::fs::write(&path, "{ this is not json")?;
    assert_eq!(store.load(), PcfSettings::default());

    // Valid JSON but not a settings object
    std::fs::write(&path, r#"["use_pcf", "on"]"#)?;
    assert_eq!(store.load(), PcfSettings::default());

    Ok(())
}

#[test]
fn test_save_forces_absent_flags_off() -> Result<()> {
    let temp_dir = tempdir()?;
    let path = temp_dir.path().join("pcf_adj.json");
    let store = ConfigStore::new(&path)?;

    // Everything on first
    store.save(&form(&[
        ("use_pcf", "on"),
        ("use_log", "on"),
        ("ad0", "on"),
        ("ad1", "on"),
        ("ad2", "on"),
        ("ad3", "on"),
    ]))?;
    let all_on = store.load();
    assert!(all_on.enabled && all_on.log_enabled);
    assert!(all_on.channels.iter().all(|c| c.enabled));

    // Unchecked boxes are simply missing from the next submission
    store.save(&form(&[("use_pcf", "on"), ("time", "30"), ("ad2text", "LM35D")]))?;
    let settings = store.load();
    assert!(settings.enabled);
    assert!(!settings.log_enabled);
    assert!(settings.channels.iter().all(|c| !c.enabled));
    assert_eq!(settings.interval_s, 30);
    assert_eq!(settings.channels[2].label, "LM35D");

    let record: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
    for flag in ["use_log", "ad0", "ad1", "ad2", "ad3"] {
        assert_eq!(record[flag], "off", "{} should be persisted as off", flag);
    }

    Ok(())
}

#[test]
fn test_unknown_keys_are_ignored() -> Result<()> {
    let temp_dir = tempdir()?;
    let path = temp_dir.path().join("pcf_adj.json");
    std::fs::write(
        &path,
        r#"{"use_pcf": "on", "records": 50, "legacy_option": "42"}"#,
    )?;
    let store = ConfigStore::new(&path)?;

    let settings = store.load();
    assert!(settings.enabled);
    assert_eq!(settings.max_log_records, 50);
    assert_eq!(settings.channels[0].label, "probe_1");

    // Unknown submitted fields are not persisted either
    store.save(&form(&[("use_pcf", "on"), ("submit", "Save")]))?;
    let record: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
    assert!(record.get("submit").is_none());
    assert!(record.get("legacy_option").is_none());

    Ok(())
}

#[test]
fn test_one_bad_field_keeps_the_other_settings() -> Result<()> {
    let temp_dir = tempdir()?;
    let path = temp_dir.path().join("pcf_adj.json");
    let store = ConfigStore::new(&path)?;

    std::fs::write(
        &path,
        r#"{"use_pcf": "on", "use_log": "on", "time": "30", "ad2text": 5}"#,
    )?;
    let settings = store.load();
    assert!(settings.enabled);
    assert!(settings.log_enabled);
    assert_eq!(settings.interval_s, 30);
    assert_eq!(settings.channels[2].label, "5");

    std::fs::write(&path, r#"{"use_pcf": true, "time": "30"}"#)?;
    let settings = store.load();
    assert!(settings.enabled);
    assert_eq!(settings.interval_s, 30);

    // An unusable interval falls back alone
    std::fs::write(&path, r#"{"use_pcf": "on", "time": "", "records": "8"}"#)?;
    let settings = store.load();
    assert!(settings.enabled);
    assert_eq!(settings.interval_s, 0);
    assert_eq!(settings.max_log_records, 8);

    Ok(())
}

#[test]
fn test_save_replaces_file_without_leftovers() -> Result<()> {
    let temp_dir = tempdir()?;
    let path = temp_dir.path().join("nested").join("pcf_adj.json");
    let store = ConfigStore::new(&path)?;

    store.save(&form(&[("use_pcf", "on")]))?;
    store.save(&form(&[("time", "5")]))?;

    let entries: Vec<_> = std::fs::read_dir(path.parent().unwrap())?.collect();
    assert_eq!(entries.len(), 1);
    assert_eq!(store.load().interval_s, 5);
    assert!(!store.load().enabled);

    Ok(())
}
