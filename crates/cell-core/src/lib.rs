//! cell-core - in-memory workbook, storage formats and the script runner.

pub mod document;
pub mod error;
pub mod storage;
pub mod workbook;

pub use document::Document;
pub use error::{Result, WorkbookError};
pub use workbook::{Grid, Sheet, Workbook};

pub use cell_engine::{CellRef, Outcome, Settings, Value};
