use anyhow::Result;
use rust_pcf8591::config::{Config, I2CBusType};
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn test_config_load_and_save() -> Result<()> {
    // Create a temporary directory
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("config.yaml");

    // Create a custom config
    let mut config = Config::default();
    config.bus.bus_type = I2CBusType::Mock;
    config.bus.address = 0x4A;
    config.bus.mock_counts = [1, 2, 3, 4];
    config.storage.data_dir = PathBuf::from("/var/lib/pcf");
    config.sampler.error_backoff_s = 7;

    config.save_to_file(&config_path)?;
    let loaded_config = Config::from_file(&config_path)?;

    assert_eq!(loaded_config.bus.bus_type, I2CBusType::Mock);
    assert_eq!(loaded_config.bus.address, 0x4A);
    assert_eq!(loaded_config.bus.mock_counts, [1, 2, 3, 4]);
    assert_eq!(
        loaded_config.storage.settings_path(),
        PathBuf::from("/var/lib/pcf/pcf_adj.json")
    );
    assert_eq!(loaded_config.sampler.error_backoff_s, 7);

    // Test loading default config for non-existent file
    let non_existent_path = temp_dir.path().join("non_existent.yaml");
    let default_config = Config::from_file(&non_existent_path)?;

    // Verify default config was created
    assert!(non_existent_path.exists());
    assert_eq!(default_config.bus.bus_type, I2CBusType::Native);
    assert_eq!(default_config.bus.device, "/dev/i2c-1");
    assert_eq!(default_config.bus.address, 0x48);
    assert_eq!(default_config.sampler.startup_delay_range(), 3..=10);

    Ok(())
}

#[test]
fn test_partial_config_uses_section_defaults() -> Result<()> {
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("partial.yaml");
    std::fs::write(&config_path, "bus:\n  type: mock\n")?;

    let config = Config::from_file(&config_path)?;
    assert_eq!(config.bus.bus_type, I2CBusType::Mock);
    assert_eq!(config.storage.log_file, "pcflog.json");
    assert_eq!(config.sampler.error_backoff_s, 5);

    Ok(())
}

#[test]
fn test_config_validation() -> Result<()> {
    let temp_dir = tempdir()?;

    // Unknown section rejected by the schema
    let unknown_path = temp_dir.path().join("unknown.yaml");
    std::fs::write(&unknown_path, "visualization:\n  port: 8080\n")?;
    assert!(Config::from_file(&unknown_path).is_err());
    assert!(temp_dir.path().join("unknown.sample.yaml").exists());

    // Reserved I2C address rejected by the specific rules
    let reserved_path = temp_dir.path().join("reserved.yaml");
    std::fs::write(&reserved_path, "bus:\n  address: 120\n")?;
    assert!(Config::from_file(&reserved_path).is_err());

    // Inverted startup delay range
    let range_path = temp_dir.path().join("range.yaml");
    std::fs::write(
        &range_path,
        "sampler:\n  startup_delay_min_s: 10\n  startup_delay_max_s: 3\n",
    )?;
    assert!(Config::from_file(&range_path).is_err());

    Ok(())
}
