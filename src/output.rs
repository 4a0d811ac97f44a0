//! Workbook export for the summary tables.
//!
//! A workbook is a directory handle; each named table becomes one CSV
//! sheet inside it. Also supports JSON and pretty-print logging of results.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use crate::analyzers::types::NamedTable;

/// Directory-backed workbook: one CSV file per sheet.
#[derive(Debug)]
pub struct Workbook {
    dir: PathBuf,
}

impl Workbook {
    /// Opens a workbook at `dir`, creating the directory if needed.
    pub fn create(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Workbook { dir })
    }

    pub fn sheet_path(&self, sheet_name: &str) -> PathBuf {
        self.dir.join(format!("{sheet_name}.csv"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Writes one table as a sheet, replacing any previous sheet of that name.
pub fn export(table: &NamedTable, sheet_name: &str, workbook: &Workbook) -> Result<()> {
    let path = workbook.sheet_path(sheet_name);
    debug!(sheet = sheet_name, path = %path.display(), "Writing sheet");

    let mut writer = csv::Writer::from_path(&path)?;
    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;

    info!(sheet = sheet_name, rows = table.rows.len(), "Sheet exported");
    Ok(())
}

/// Logs a result value as pretty-printed JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Logs a named table using Rust's debug pretty-print format.
pub fn print_pretty(table: &NamedTable) {
    debug!("{:#?}", table);
}
