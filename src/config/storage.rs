// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-pcf8591 project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Storage locations of the persisted plugin files

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where the plugin settings record and the sample log are kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding both files. Created on first write.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// File name of the plugin settings record (JSON object)
    #[serde(default = "default_settings_file")]
    pub settings_file: String,

    /// File name of the sample log (one JSON object per line, newest first)
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

impl StorageConfig {
    /// Full path of the plugin settings record
    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join(&self.settings_file)
    }

    /// Full path of the sample log
    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(&self.log_file)
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_settings_file() -> String {
    "pcf_adj.json".to_string()
}

fn default_log_file() -> String {
    "pcflog.json".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            settings_file: default_settings_file(),
            log_file: default_log_file(),
        }
    }
}
