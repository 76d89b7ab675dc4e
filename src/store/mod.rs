// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-pcf8591 project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! File-backed persistence of the plugin
//!
//! - [`ConfigStore`]: the plugin settings record, merged over built-in defaults
//! - [`LogStore`]: the rotating, newest-first sample log
//!
//! Both stores are passive: they hold no state besides their path and are
//! re-read on every access, so edits made by other processes take effect on
//! the next sampling cycle.

pub mod config_store;
pub mod log_store;

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

pub use config_store::{ChannelSettings, ConfigStore, PcfSettings};
pub use log_store::{LogStore, SampleRecord, CSV_HEADER};

/// Replace `path` with `contents` through a temporary file in the same directory.
///
/// Readers observe either the old or the new file, never a truncated one.
pub(crate) fn write_replace(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create data directory {:?}", dir))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {:?}", dir))?;
    tmp.write_all(contents)
        .with_context(|| format!("Failed to write temporary file for {:?}", path))?;
    tmp.as_file()
        .sync_all()
        .with_context(|| format!("Failed to sync temporary file for {:?}", path))?;
    tmp.persist(path)
        .with_context(|| format!("Failed to replace {:?}", path))?;
    Ok(())
}
