//! Host functions available to every program.
//!
//! Each builtin checks its own argument count; a mismatch is fatal.

use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{CellError, Result};
use crate::interp::{Builtin, FunctionRegistry, Interpreter};
use crate::sheet::{Spreadsheet, is_valid_sheet_name};
use crate::value::Value;

/// A registry holding every builtin and nothing else.
pub(crate) fn registry<S: Spreadsheet>() -> FunctionRegistry<S> {
    let builtins: [(&'static str, Builtin<S>); 16] = [
        ("exit", builtin_exit::<S>),
        ("abort", builtin_abort::<S>),
        ("gets", builtin_gets::<S>),
        ("puts", builtin_puts::<S>),
        ("head", builtin_head::<S>),
        ("tail", builtin_tail::<S>),
        ("exist", builtin_exist::<S>),
        ("rename", builtin_rename::<S>),
        ("count", builtin_count::<S>),
        ("delete", builtin_delete::<S>),
        ("copy", builtin_copy::<S>),
        ("srand", builtin_srand::<S>),
        ("rand", builtin_rand::<S>),
        ("floor", builtin_floor::<S>),
        ("ceil", builtin_ceil::<S>),
        ("round", builtin_round::<S>),
    ];
    FunctionRegistry::with_builtins(builtins)
}

fn check_arity(name: &str, args: &[Value], min: usize, max: usize) -> Result<()> {
    if (min..=max).contains(&args.len()) {
        return Ok(());
    }
    let expected = if min == max {
        min.to_string()
    } else {
        format!("{} to {}", min, max)
    };
    Err(CellError::Arity {
        name: name.to_string(),
        expected,
        found: args.len(),
    })
}

fn exit_code(args: &[Value]) -> i32 {
    args.first().map_or(0, |v| v.as_number() as i32)
}

/// exit([code]): stop the program once the current statement finishes.
fn builtin_exit<S: Spreadsheet>(interp: &mut Interpreter<S>, args: &[Value]) -> Result<Value> {
    check_arity("exit", args, 0, 1)?;
    interp.request_halt(exit_code(args));
    Ok(Value::empty())
}

/// abort([code]): stop at once, without finishing the current statement.
/// The host must not write the workbook back.
fn builtin_abort<S: Spreadsheet>(_interp: &mut Interpreter<S>, args: &[Value]) -> Result<Value> {
    check_arity("abort", args, 0, 1)?;
    Err(CellError::Aborted(exit_code(args)))
}

/// gets(): read the next record into `$0`, the fields and `NF`; 1 or 0 at end of input.
fn builtin_gets<S: Spreadsheet>(interp: &mut Interpreter<S>, args: &[Value]) -> Result<Value> {
    check_arity("gets", args, 0, 0)?;
    Ok(Value::from_bool(interp.read_record()?))
}

/// puts(args...): print the arguments joined by `OFS`, then `ORS`.
fn builtin_puts<S: Spreadsheet>(interp: &mut Interpreter<S>, args: &[Value]) -> Result<Value> {
    let ofs = interp.get_var("OFS").as_string();
    let ors = interp.get_var("ORS").as_string();
    let mut line = if args.is_empty() {
        interp.get_var("$0").as_string()
    } else {
        args.iter()
            .map(Value::as_string)
            .collect::<Vec<_>>()
            .join(&ofs)
    };
    line.push_str(&ors);
    interp.write_output(&line)?;
    Ok(Value::empty())
}

fn builtin_head<S: Spreadsheet>(interp: &mut Interpreter<S>, args: &[Value]) -> Result<Value> {
    check_arity("head", args, 0, 0)?;
    Ok(Value::Str(interp.sheet_mut().head_sheet()))
}

fn builtin_tail<S: Spreadsheet>(interp: &mut Interpreter<S>, args: &[Value]) -> Result<Value> {
    check_arity("tail", args, 0, 0)?;
    Ok(Value::Str(interp.sheet_mut().tail_sheet()))
}

fn builtin_exist<S: Spreadsheet>(interp: &mut Interpreter<S>, args: &[Value]) -> Result<Value> {
    check_arity("exist", args, 1, 1)?;
    Ok(Value::from_bool(interp.sheet().sheet_exists(&args[0].as_string())))
}

fn builtin_rename<S: Spreadsheet>(interp: &mut Interpreter<S>, args: &[Value]) -> Result<Value> {
    check_arity("rename", args, 2, 2)?;
    let (old, new) = (args[0].as_string(), args[1].as_string());
    if !is_valid_sheet_name(&new) {
        return Err(CellError::InvalidSheetName(new));
    }
    debug!("renaming sheet '{}' to '{}'", old, new);
    Ok(Value::Str(interp.sheet_mut().rename_sheet(&old, &new)?))
}

fn builtin_count<S: Spreadsheet>(interp: &mut Interpreter<S>, args: &[Value]) -> Result<Value> {
    check_arity("count", args, 0, 0)?;
    Ok(Value::Number(interp.sheet().sheet_count() as f64))
}

fn builtin_delete<S: Spreadsheet>(interp: &mut Interpreter<S>, args: &[Value]) -> Result<Value> {
    check_arity("delete", args, 1, 1)?;
    let name = args[0].as_string();
    debug!("deleting sheet '{}'", name);
    interp.sheet_mut().delete_sheet(&name)?;
    Ok(Value::empty())
}

/// copy(from, to): duplicate a sheet under a new name and return that name.
fn builtin_copy<S: Spreadsheet>(interp: &mut Interpreter<S>, args: &[Value]) -> Result<Value> {
    check_arity("copy", args, 2, 2)?;
    let (from, to) = (args[0].as_string(), args[1].as_string());
    if !is_valid_sheet_name(&to) {
        return Err(CellError::InvalidSheetName(to));
    }
    debug!("copying sheet '{}' to '{}'", from, to);
    interp.sheet_mut().copy_sheet(&from, &to)?;
    Ok(Value::Str(to))
}

/// srand([seed]): reseed the generator and return the previous seed.
/// Without an argument the seed comes from the clock.
fn builtin_srand<S: Spreadsheet>(interp: &mut Interpreter<S>, args: &[Value]) -> Result<Value> {
    check_arity("srand", args, 0, 1)?;
    let seed = match args.first() {
        Some(v) => {
            let n = v.as_number();
            if !n.is_finite() {
                warn!("srand: seed {} is not finite, using 0", n);
                0
            } else {
                n.trunc() as i64 as u64
            }
        }
        None => SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs()),
    };
    let previous = interp.seed;
    interp.seed = seed;
    interp.rng = StdRng::seed_from_u64(seed);
    Ok(Value::Number(previous as i64 as f64))
}

/// rand(): uniform in `[0, 1)`.
fn builtin_rand<S: Spreadsheet>(interp: &mut Interpreter<S>, args: &[Value]) -> Result<Value> {
    check_arity("rand", args, 0, 0)?;
    Ok(Value::Number(interp.rng.gen_range(0.0..1.0)))
}

fn unary_math(name: &str, args: &[Value], f: fn(f64) -> f64) -> Result<Value> {
    check_arity(name, args, 1, 1)?;
    Ok(Value::Number(f(args[0].as_number())))
}

fn builtin_floor<S: Spreadsheet>(_: &mut Interpreter<S>, args: &[Value]) -> Result<Value> {
    unary_math("floor", args, f64::floor)
}

fn builtin_ceil<S: Spreadsheet>(_: &mut Interpreter<S>, args: &[Value]) -> Result<Value> {
    unary_math("ceil", args, f64::ceil)
}

/// round(x): half away from zero.
fn builtin_round<S: Spreadsheet>(_: &mut Interpreter<S>, args: &[Value]) -> Result<Value> {
    unary_math("round", args, f64::round)
}
