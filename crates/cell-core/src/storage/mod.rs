//! Workbook persistence, dispatched on file extension.

pub mod csv;
pub mod grd;

use std::path::Path;

use log::info;

use crate::error::{Result, WorkbookError};
use crate::workbook::Workbook;

pub use csv::{parse_csv, write_csv};
pub use grd::{parse_grd, write_grd};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    /// Multi-sheet text format.
    Grd,
    /// Active sheet only.
    Csv,
}

impl Format {
    pub fn from_path(path: &Path) -> Result<Format> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("grd") => Ok(Format::Grd),
            Some("csv") => Ok(Format::Csv),
            _ => Err(WorkbookError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// Load a workbook from `path`.
pub fn load(path: &Path) -> Result<Workbook> {
    let format = Format::from_path(path)?;
    if !path.exists() {
        return Err(WorkbookError::NotFound(path.to_path_buf()));
    }
    let workbook = match format {
        Format::Grd => parse_grd(path)?,
        Format::Csv => parse_csv(path)?,
    };
    info!(
        "loaded {} ({} sheet(s))",
        path.display(),
        workbook.sheets().len()
    );
    Ok(workbook)
}

/// Save a workbook to `path`.
pub fn save(path: &Path, workbook: &Workbook) -> Result<()> {
    match Format::from_path(path)? {
        Format::Grd => write_grd(path, workbook)?,
        Format::Csv => write_csv(path, workbook)?,
    }
    info!("saved {}", path.display());
    Ok(())
}
