use anyhow::Result;
use rust_pcf8591::bus::mock::MockPcf8591Driver;
use rust_pcf8591::config::Config;
use rust_pcf8591::plugin::{PcfPlugin, CONTENT_TYPE_CSV, CONTENT_TYPE_JSON};
use std::time::Duration;
use tempfile::{tempdir, TempDir};
use tokio::time;

fn test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.storage.data_dir = dir.path().to_path_buf();
    config.sampler.startup_delay_min_s = 0;
    config.sampler.startup_delay_max_s = 0;
    config
}

#[tokio::test(start_paused = true)]
async fn test_settings_json_includes_values_and_status() -> Result<()> {
    let temp_dir = tempdir()?;
    let config = test_config(&temp_dir);
    let plugin = PcfPlugin::start_with_driver(
        Box::new(MockPcf8591Driver::new(0x48, [0, 64, 128, 255])),
        &config,
    )?;

    plugin
        .update_from_query("use_pcf=on&time=30&ad1=on&ad1text=LM35D+greenhouse")
        .await?;
    time::sleep(Duration::from_secs(1)).await;

    let response = plugin.settings_json().await?;
    assert_eq!(response.content_type, CONTENT_TYPE_JSON);
    assert!(response
        .headers
        .contains(&("Access-Control-Allow-Origin", "*")));

    let json: serde_json::Value = serde_json::from_str(&response.body)?;
    assert_eq!(json["use_pcf"], "on");
    assert_eq!(json["use_log"], "off");
    assert_eq!(json["time"], "30");
    assert_eq!(json["ad1"], "on");
    assert_eq!(json["ad1text"], "LM35D greenhouse");
    assert_eq!(json["ad1val"], 0.8);
    assert_eq!(json["ad3val"], 3.3);
    assert_eq!(json["status"], "");

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_update_with_logging_feeds_csv_export() -> Result<()> {
    let temp_dir = tempdir()?;
    let config = test_config(&temp_dir);
    let plugin = PcfPlugin::start_with_driver(
        Box::new(MockPcf8591Driver::new(0x48, [255, 0, 0, 0])),
        &config,
    )?;

    let empty = plugin.log_csv();
    assert_eq!(empty.content_type, CONTENT_TYPE_CSV);
    assert_eq!(empty.body, "Date, Time, AD0, AD1, AD2, AD3\n");

    let settings = plugin
        .update_from_query("use_pcf=on&use_log=on&time=60&records=2")
        .await?;
    assert!(settings.log_enabled);
    assert_eq!(settings.max_log_records, 2);

    // One cycle right after startup, two more forced by triggers
    time::sleep(Duration::from_secs(1)).await;
    for _ in 0..2 {
        plugin.trigger();
        time::sleep(Duration::from_millis(200)).await;
    }

    let csv = plugin.log_csv().body;
    let rows: Vec<&str> = csv.lines().skip(1).collect();
    assert_eq!(rows.len(), 2);
    assert!(rows[0].ends_with(", 3.3, 0.0, 0.0, 0.0"));

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_missing_device_reported_in_status() -> Result<()> {
    let temp_dir = tempdir()?;
    let config = test_config(&temp_dir);
    let driver = MockPcf8591Driver::new(0x48, [0; 4]);
    driver.handle().set_present(false);
    let plugin = PcfPlugin::start_with_driver(Box::new(driver), &config)?;

    plugin.update_from_query("use_pcf=on&time=10").await?;
    time::sleep(Duration::from_secs(1)).await;

    let view = plugin.settings_view().await;
    assert_eq!(view.values, [0.0; 4]);
    assert_eq!(view.status.lines().count(), 4);
    assert!(plugin
        .status()
        .await
        .lines()
        .all(|line| line.contains("No detected PCF8591 on I2C at 0x48")));

    Ok(())
}
