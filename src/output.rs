//! Output formatting and persistence for prepared records.
//!
//! Supports pretty-printing and JSON logging of run statistics, and CSV
//! output of the final table, optionally gzip-compressed.

use anyhow::Result;
use csv::WriterBuilder;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::PrepareError;
use crate::prepare::types::FinalRecord;

/// Logs any statistics value using Rust's debug pretty-print format.
pub fn print_pretty<T: std::fmt::Debug>(stats: &T) {
    debug!("{:#?}", stats);
}

/// Logs a statistics value as pretty-printed JSON.
pub fn print_json<T: Serialize>(stats: &T) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(stats)?);
    Ok(())
}

/// Serializes records as CSV with a header row into any writer.
pub fn write_csv<W: Write>(writer: W, records: &[FinalRecord]) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(writer);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

fn is_gz(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("gz")
}

/// Final output location: `.gz` is appended when compressing.
pub fn output_path(path: &Path, gzip: bool) -> PathBuf {
    if gzip && !is_gz(path) {
        let mut name = path.as_os_str().to_owned();
        name.push(".gz");
        PathBuf::from(name)
    } else {
        path.to_path_buf()
    }
}

/// Writes the final table, replacing any previous file. Returns the path written.
///
/// A path already ending in `.gz` is always compressed.
pub fn write_records(path: &Path, records: &[FinalRecord], gzip: bool) -> Result<PathBuf> {
    let gzip = gzip || is_gz(path);
    let path = output_path(path, gzip);
    let path_str = path.display().to_string();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| PrepareError::io(&path_str, e))?;
    }
    let file = File::create(&path).map_err(|e| PrepareError::io(&path_str, e))?;

    if gzip {
        let mut encoder = GzEncoder::new(file, Compression::default());
        write_csv(&mut encoder, records)?;
        encoder.finish()?;
    } else {
        write_csv(file, records)?;
    }

    info!(path = %path_str, rows = records.len(), gzip, "Prepared data written");
    Ok(path)
}
