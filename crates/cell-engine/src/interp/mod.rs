//! Tree-walking evaluator.
//!
//! An [`Interpreter`] owns everything a run mutates: the spreadsheet, the
//! scope stack, the function registry, the input and output streams and the
//! pending exit state. Several interpreters can coexist; nothing is global.
//!
//! ```
//! use cell_engine::{Interpreter, Spreadsheet};
//! # fn demo<S: Spreadsheet>(sheet: S) -> cell_engine::Result<()> {
//! let mut interp = Interpreter::new(sheet);
//! let outcome = interp.run("x = 1 + 2; exit(x)")?;
//! assert_eq!(outcome.exit_code, 3);
//! # Ok(())
//! # }
//! ```

mod call;
mod expr;
mod stmt;

use std::collections::HashMap;
use std::io::{self, BufRead, Write};

use log::debug;
use rand::SeedableRng;
use rand::rngs::StdRng;
use regex::Regex;

use crate::cell_ref::column_number_to_name;
use crate::error::{CellError, Result};
use crate::parser::parse_program;
use crate::sheet::{Spreadsheet, is_valid_sheet_name};
use crate::scope::ScopeStack;
use crate::value::Value;
use crate::{Stmt, builtins};

pub use call::{Builtin, Function, FunctionRegistry};
pub use stmt::Flow;

/// Largest number of fields a single record may split into.
const MAX_FIELDS: usize = u16::MAX as usize;

/// Default limit on nested user-function calls.
pub const MAX_CALL_DEPTH: usize = 5_000;

/// What the default `FS` of a single space splits on.
const WHITESPACE_RUN: &str = "[ \t\n]+";

/// Host-provided knobs applied before a program runs.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    /// Initial `FS`; `None` keeps the default single space.
    pub field_separator: Option<String>,
    /// Initial `SER`.
    pub start_row: i64,
    /// Sheet to activate (or create) before running.
    pub initial_sheet: Option<String>,
    /// Wrap the program in `while(gets()){ ... ; }`.
    pub record_loop: bool,
    /// Wrap the program in `for(NER = SER; NER <= LR; NER++){ ... ; }`.
    pub row_loop: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            field_separator: None,
            start_row: 1,
            initial_sheet: None,
            record_loop: false,
            row_loop: false,
        }
    }
}

impl Settings {
    /// Apply the loop wrappers. The row loop goes on first, so the record
    /// loop ends up outermost when both are requested.
    pub fn wrap_program(&self, src: &str) -> String {
        let mut code = src.to_string();
        if self.row_loop {
            code = format!("for(NER = SER; NER <= LR; NER++){{ {}\n; }}", code);
        }
        if self.record_loop {
            code = format!("while(gets()){{ {}\n; }}", code);
        }
        code
    }
}

/// How a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Outcome {
    pub exit_code: i32,
    /// `abort()` was called; the host should skip writing the workbook back.
    pub aborted: bool,
}

pub struct Interpreter<S: Spreadsheet> {
    sheet: S,
    scopes: ScopeStack,
    functions: FunctionRegistry<S>,
    input: Box<dyn BufRead>,
    output: Box<dyn Write>,
    /// Number of `$1..$N` fields bound by the last split.
    nfields: usize,
    /// Number of `$_0..$_K` captures bound by the last match.
    ncaptures: usize,
    /// Exit code requested by `exit()`, pending until the run unwinds.
    halt: Option<i32>,
    pub(crate) rng: StdRng,
    pub(crate) seed: u64,
    patterns: HashMap<String, Regex>,
    max_call_depth: usize,
}

impl<S: Spreadsheet> Interpreter<S> {
    /// Create an interpreter reading stdin and writing stdout.
    pub fn new(sheet: S) -> Self {
        let functions = builtins::registry();

        let mut scopes = ScopeStack::new();
        scopes.set_root("FS", Value::from(" "));
        scopes.set_root("OFS", Value::from(" "));
        scopes.set_root("RS", Value::from("\n"));
        scopes.set_root("ORS", Value::from("\n"));
        scopes.set_root("NR", Value::Number(0.0));
        scopes.set_root("SER", Value::Number(1.0));

        Interpreter {
            sheet,
            scopes,
            functions,
            input: Box::new(io::BufReader::new(io::stdin())),
            output: Box::new(io::stdout()),
            nfields: 0,
            ncaptures: 0,
            halt: None,
            rng: StdRng::seed_from_u64(0),
            seed: 0,
            patterns: HashMap::new(),
            max_call_depth: MAX_CALL_DEPTH,
        }
    }

    /// Apply host settings: `FS`, `SER` and the initial active sheet.
    pub fn configure(&mut self, settings: &Settings) -> Result<()> {
        if let Some(fs) = &settings.field_separator {
            self.scopes.set_root("FS", Value::from(fs.as_str()));
        }
        self.scopes
            .set_root("SER", Value::Number(settings.start_row as f64));
        if let Some(name) = &settings.initial_sheet {
            self.set_var("@", Value::from(name.as_str()))?;
        }
        Ok(())
    }

    /// Cap nested user-function calls; going deeper is fatal. Evaluation
    /// recurses on the native stack, so the caller's stack must fit the cap.
    pub fn set_max_call_depth(&mut self, depth: usize) {
        self.max_call_depth = depth;
    }

    pub fn set_input(&mut self, input: impl BufRead + 'static) {
        self.input = Box::new(input);
    }

    pub fn set_output(&mut self, output: impl Write + 'static) {
        self.output = Box::new(output);
    }

    pub fn sheet(&self) -> &S {
        &self.sheet
    }

    pub fn sheet_mut(&mut self) -> &mut S {
        &mut self.sheet
    }

    pub fn into_sheet(self) -> S {
        self.sheet
    }

    /// Parse and run a program.
    pub fn run(&mut self, src: &str) -> Result<Outcome> {
        let program = parse_program(src)?;
        self.execute(&program)
    }

    /// Run an already parsed program.
    pub fn execute(&mut self, program: &Stmt) -> Result<Outcome> {
        let flow = self.exec(program);
        let flushed = self.output.flush();
        let flow = match flow {
            Err(CellError::Aborted(code)) => {
                flushed?;
                self.halt = None;
                return Ok(Outcome {
                    exit_code: code,
                    aborted: true,
                });
            }
            other => other?,
        };
        match flow {
            Flow::Break => return Err(CellError::OutsideLoop("break")),
            Flow::Continue => return Err(CellError::OutsideLoop("continue")),
            Flow::Normal | Flow::Return(_) | Flow::Exit => {}
        }
        flushed?;

        Ok(Outcome {
            exit_code: self.halt.take().unwrap_or(0),
            aborted: false,
        })
    }

    pub(crate) fn halted(&self) -> bool {
        self.halt.is_some()
    }

    pub(crate) fn request_halt(&mut self, code: i32) {
        debug!("halt requested (code {})", code);
        self.halt = Some(code);
    }

    pub(crate) fn write_output(&mut self, text: &str) -> Result<()> {
        self.output.write_all(text.as_bytes())?;
        Ok(())
    }

    /// Read a variable, special names included.
    pub fn get_var(&self, name: &str) -> Value {
        match name {
            "@" => Value::Str(self.sheet.active_sheet_name()),
            "LR" => Value::Number(self.sheet.rows_count() as f64),
            "LC" => Value::Number(self.sheet.cols_count() as f64),
            "LCC" => Value::Str(column_number_to_name(self.sheet.cols_count()).unwrap_or_default()),
            _ if is_root_var(name) => self.scopes.get_root(name),
            _ => self.scopes.get(name),
        }
    }

    /// Write a variable, special names included.
    pub fn set_var(&mut self, name: &str, value: Value) -> Result<()> {
        match name {
            "@" => self.switch_sheet(&value.as_string()),
            "LR" | "LC" | "LCC" => Err(CellError::ReadOnly(name.to_string())),
            _ if is_root_var(name) => {
                self.scopes.set_root(name, value);
                Ok(())
            }
            _ => {
                self.scopes.set(name, value);
                Ok(())
            }
        }
    }

    /// Activate `name`, creating the sheet when it does not exist yet.
    fn switch_sheet(&mut self, name: &str) -> Result<()> {
        if self.sheet.sheet_exists(name) {
            debug!("switching to sheet '{}'", name);
            self.sheet.set_active_sheet(name)?;
            return Ok(());
        }
        if !is_valid_sheet_name(name) {
            return Err(CellError::InvalidSheetName(name.to_string()));
        }
        debug!("creating sheet '{}'", name);
        self.sheet.add_sheet(name)?;
        Ok(())
    }

    /// Compile `pattern`, reusing an earlier compilation when possible.
    fn regex(&mut self, pattern: &str) -> std::result::Result<Regex, regex::Error> {
        if let Some(re) = self.patterns.get(pattern) {
            return Ok(re.clone());
        }
        let re = Regex::new(pattern)?;
        self.patterns.insert(pattern.to_string(), re.clone());
        Ok(re)
    }

    /// Read one record terminated by `RS`. Returns `false` at end of input.
    pub(crate) fn read_record(&mut self) -> Result<bool> {
        let rs = self.scopes.get_root("RS").as_string();
        let terminator = if rs.is_empty() { "\n".to_string() } else { rs };
        let term = terminator.as_bytes();
        let last = term[term.len() - 1];

        let mut buf = Vec::new();
        loop {
            let n = self.input.read_until(last, &mut buf)?;
            if n == 0 || buf.ends_with(term) {
                break;
            }
        }
        if buf.is_empty() {
            return Ok(false);
        }
        if buf.ends_with(term) {
            buf.truncate(buf.len() - term.len());
            if terminator == "\n" && buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }

        let line = String::from_utf8_lossy(&buf).into_owned();
        let nr = self.scopes.get_root("NR").as_number() + 1.0;
        self.scopes.set_root("NR", Value::Number(nr));
        debug!("record {}: {:?}", nr, line);
        self.split_record(&line)?;
        Ok(true)
    }

    /// Bind `$0`, `$1..$N` and `NF` from `line` using the current `FS`.
    /// Empty leading and trailing fields are kept, so an empty record has
    /// one empty field.
    pub(crate) fn split_record(&mut self, line: &str) -> Result<()> {
        let fs = self.scopes.get_root("FS").as_string();
        let fields: Vec<String> = if fs != " " && fs.chars().count() == 1 {
            line.split(fs.as_str()).map(str::to_string).collect()
        } else {
            let pattern = if fs == " " { WHITESPACE_RUN } else { fs.as_str() };
            let re = self
                .regex(pattern)
                .map_err(|_| CellError::FieldSeparator(fs.clone()))?;
            re.split(line).map(str::to_string).collect()
        };

        if fields.len() > MAX_FIELDS {
            return Err(CellError::TooManyFields(line.to_string()));
        }

        for stale in fields.len() + 1..=self.nfields {
            self.scopes.remove_root(&format!("${}", stale));
        }
        self.nfields = fields.len();
        self.scopes.set_root("$0", Value::from(line));
        self.scopes
            .set_root("NF", Value::Number(fields.len() as f64));
        for (i, field) in fields.into_iter().enumerate() {
            self.scopes.set_root(&format!("${}", i + 1), Value::Str(field));
        }
        Ok(())
    }

    /// Match `text` against `pattern`, binding `$_0..$_K` on success and
    /// clearing them on failure.
    pub(crate) fn match_pattern(&mut self, text: &str, pattern: &str) -> Result<bool> {
        let re = self.regex(pattern).map_err(|source| CellError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;

        let groups: Vec<String> = match re.captures(text) {
            Some(caps) => caps
                .iter()
                .map(|m| m.map_or_else(String::new, |m| m.as_str().to_string()))
                .collect(),
            None => Vec::new(),
        };

        for stale in groups.len()..self.ncaptures {
            self.scopes.remove_root(&format!("$_{}", stale));
        }
        self.ncaptures = groups.len();
        let matched = !groups.is_empty();
        for (i, group) in groups.into_iter().enumerate() {
            self.scopes.set_root(&format!("$_{}", i), Value::Str(group));
        }
        Ok(matched)
    }
}

/// Names that always live in the root frame, whatever frame is active.
fn is_root_var(name: &str) -> bool {
    matches!(name, "NF" | "FS" | "OFS" | "RS" | "ORS" | "NR") || name.starts_with('$')
}
