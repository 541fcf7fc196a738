use std::path::PathBuf;

use clap::Parser;

use cell_core::Settings;

#[derive(Parser, Debug)]
#[command(
    name = "cell",
    about = "Run an AWK-like script against a spreadsheet workbook.",
    disable_version_flag = true
)]
pub struct Cli {
    /// Program text followed by input files. With `-f`, every argument is an input file.
    #[arg(value_name = "PROGRAM | FILES")]
    pub args: Vec<String>,

    /// Read the program from a file.
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    pub program_file: Option<PathBuf>,

    /// Initial field separator.
    #[arg(short = 'F', long = "field-separator", value_name = "FS")]
    pub field_separator: Option<String>,

    /// Run the program once per input record.
    #[arg(short = 'n')]
    pub record_loop: bool,

    /// Run the program once per row, from the start row to the last used row.
    #[arg(short = 'N')]
    pub row_loop: bool,

    /// First row for `-N`.
    #[arg(short = 's', long = "start-row", value_name = "N", default_value_t = 1)]
    pub start_row: i64,

    /// Sheet to activate before the program runs; created if absent.
    #[arg(short = 'S', long = "sheet", value_name = "NAME")]
    pub sheet: Option<String>,

    /// Workbook to load (.grd or .csv).
    #[arg(long, value_name = "PATH")]
    pub from: Option<PathBuf>,

    /// Workbook to write once the program finishes without aborting.
    #[arg(long, value_name = "PATH")]
    pub to: Option<PathBuf>,

    /// Raise the log level (repeatable).
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Print the version and exit.
    #[arg(short = 'V', long = "version")]
    pub version: bool,
}

impl Cli {
    pub fn settings(&self) -> Settings {
        Settings {
            field_separator: self.field_separator.clone(),
            start_row: self.start_row,
            initial_sheet: self.sheet.clone(),
            record_loop: self.record_loop,
            row_loop: self.row_loop,
        }
    }
}
