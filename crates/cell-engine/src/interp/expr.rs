//! Expression evaluation.

use std::cmp::Ordering;

use log::debug;

use super::Interpreter;
use crate::ast::{AssignOp, BinaryOp, Expr, Step, Target, UnaryOp};
use crate::cell_ref::step_column_name;
use crate::error::{CellError, Result};
use crate::sheet::Spreadsheet;
use crate::value::Value;

/// Truncate both operands to integers and divide, rounding toward zero.
fn int_div(a: f64, b: f64) -> Result<f64> {
    let (a, b) = (a.trunc() as i64, b.trunc() as i64);
    if b == 0 {
        return Err(CellError::DivisionByZero);
    }
    Ok(a.wrapping_div(b) as f64)
}

/// Truncate both operands to integers; the result takes the dividend's sign.
fn int_rem(a: f64, b: f64) -> Result<f64> {
    let (a, b) = (a.trunc() as i64, b.trunc() as i64);
    if b == 0 {
        return Err(CellError::DivisionByZero);
    }
    Ok(a.wrapping_rem(b) as f64)
}

/// Combine the current value of an assignment target with its right-hand side.
fn compound(op: AssignOp, current: &Value, rhs: Value) -> Result<Value> {
    let (a, b) = (current.as_number(), rhs.as_number());
    let n = match op {
        AssignOp::Set => return Ok(rhs),
        AssignOp::Concat => {
            return Ok(Value::Str(current.as_string() + &rhs.as_string()));
        }
        AssignOp::Add => a + b,
        AssignOp::Sub => a - b,
        AssignOp::Mul => a * b,
        AssignOp::Div => int_div(a, b)?,
        AssignOp::Mod => int_rem(a, b)?,
        AssignOp::Pow => a.powf(b),
    };
    Ok(Value::Number(n))
}

/// Increment or decrement a value. Purely alphabetic strings step through
/// column names (`"z"` -> `"aa"`); everything else is treated as a number.
fn stepped(value: &Value, delta: i8) -> Value {
    if let Value::Str(s) = value {
        if !s.is_empty() && s.bytes().all(|c| c.is_ascii_alphabetic()) {
            if let Some(next) = step_column_name(s, delta as i64) {
                return Value::Str(next);
            }
        }
    }
    Value::Number(value.as_number() + delta as f64)
}

fn compare_strings(op: BinaryOp, a: &str, b: &str) -> bool {
    let ord = a.cmp(b);
    match op {
        BinaryOp::StrEq => ord == Ordering::Equal,
        BinaryOp::StrNe => ord != Ordering::Equal,
        BinaryOp::StrLt => ord == Ordering::Less,
        BinaryOp::StrLe => ord != Ordering::Greater,
        BinaryOp::StrGt => ord == Ordering::Greater,
        _ => ord != Ordering::Less,
    }
}

impl<S: Spreadsheet> Interpreter<S> {
    pub(crate) fn eval(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Var(name) => Ok(self.get_var(name)),
            Expr::Cell(axis) => {
                let axis = self.eval(axis)?.as_string();
                self.read_cell(&axis)
            }
            Expr::Assign { target, op, value } => {
                let rhs = self.eval(value)?;
                self.assign(target, *op, rhs)
            }
            Expr::Step { target, step } => self.step(target, *step),
            Expr::Binary { op, left, right } => self.binary(*op, left, right),
            Expr::Unary { op, operand } => {
                let value = self.eval(operand)?;
                Ok(match op {
                    UnaryOp::Not => Value::from_bool(!value.is_truthy()),
                    UnaryOp::Neg => Value::Number(-value.as_number()),
                    UnaryOp::Plus => Value::Number(value.as_number()),
                })
            }
            Expr::Call { name, args } => self.call(name, args),
        }
    }

    fn read_cell(&self, axis: &str) -> Result<Value> {
        let text = self.sheet.cell_value(axis)?;
        Ok(Value::from_cell_text(&text))
    }

    /// Store `value` in a cell, as a number when its text looks numeric.
    /// The assignment itself still yields `value` untouched.
    fn write_cell(&mut self, axis: &str, value: Value) -> Result<Value> {
        let typed = match &value {
            Value::Number(_) => value.clone(),
            Value::Str(s) => Value::from_cell_text(s),
        };
        self.sheet.set_cell_value(axis, typed)?;
        Ok(value)
    }

    fn assign(&mut self, target: &Target, op: AssignOp, rhs: Value) -> Result<Value> {
        match target {
            Target::Var(name) => {
                let result = match op {
                    AssignOp::Set => rhs,
                    _ => compound(op, &self.get_var(name), rhs)?,
                };
                self.set_var(name, result.clone())?;
                Ok(result)
            }
            Target::Cell(axis) => {
                let axis = self.eval(axis)?.as_string();
                match op {
                    AssignOp::Set => self.write_cell(&axis, rhs),
                    AssignOp::Concat => {
                        let current = self.read_cell(&axis)?;
                        let joined = compound(op, &current, rhs)?;
                        self.sheet.set_cell_value(&axis, joined.clone())?;
                        Ok(joined)
                    }
                    _ => {
                        let current = self.read_cell(&axis)?;
                        let result = compound(op, &current, rhs)?;
                        self.sheet.set_cell_value(&axis, result.clone())?;
                        Ok(result)
                    }
                }
            }
        }
    }

    fn step(&mut self, target: &Target, step: Step) -> Result<Value> {
        match target {
            Target::Var(name) if name == "@" => {
                let before = self.sheet.active_sheet_name();
                let after = if step.delta > 0 {
                    self.sheet.next_sheet()
                } else {
                    self.sheet.prev_sheet()
                };
                debug!("stepped sheet from '{}' to '{}'", before, after);
                Ok(Value::Str(if step.prefix { after } else { before }))
            }
            Target::Var(name) => {
                let before = self.get_var(name);
                let after = stepped(&before, step.delta);
                self.set_var(name, after.clone())?;
                Ok(if step.prefix { after } else { before })
            }
            Target::Cell(axis) => {
                let axis = self.eval(axis)?.as_string();
                let before = self.read_cell(&axis)?;
                let after = stepped(&before, step.delta);
                self.sheet.set_cell_value(&axis, after.clone())?;
                Ok(if step.prefix { after } else { before })
            }
        }
    }

    fn binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr) -> Result<Value> {
        match op {
            BinaryOp::And => {
                let result = self.eval(left)?.is_truthy() && self.eval(right)?.is_truthy();
                return Ok(Value::from_bool(result));
            }
            BinaryOp::Or => {
                let result = self.eval(left)?.is_truthy() || self.eval(right)?.is_truthy();
                return Ok(Value::from_bool(result));
            }
            _ => {}
        }

        let l = self.eval(left)?;
        let r = self.eval(right)?;
        let (a, b) = (l.as_number(), r.as_number());
        let value = match op {
            BinaryOp::Add => Value::Number(a + b),
            BinaryOp::Sub => Value::Number(a - b),
            BinaryOp::Mul => Value::Number(a * b),
            BinaryOp::Div => Value::Number(int_div(a, b)?),
            BinaryOp::Mod => Value::Number(int_rem(a, b)?),
            BinaryOp::Pow => Value::Number(a.powf(b)),
            BinaryOp::Concat => Value::Str(l.as_string() + &r.as_string()),
            BinaryOp::NumEq => Value::from_bool(a == b),
            BinaryOp::NumNe => Value::from_bool(a != b),
            BinaryOp::NumLt => Value::from_bool(a < b),
            BinaryOp::NumLe => Value::from_bool(a <= b),
            BinaryOp::NumGt => Value::from_bool(a > b),
            BinaryOp::NumGe => Value::from_bool(a >= b),
            BinaryOp::StrEq
            | BinaryOp::StrNe
            | BinaryOp::StrLt
            | BinaryOp::StrLe
            | BinaryOp::StrGt
            | BinaryOp::StrGe => {
                Value::from_bool(compare_strings(op, &l.as_string(), &r.as_string()))
            }
            BinaryOp::Match | BinaryOp::NotMatch => {
                let matched = self.match_pattern(&l.as_string(), &r.as_string())?;
                Value::from_bool(matched == (op == BinaryOp::Match))
            }
            BinaryOp::And | BinaryOp::Or => unreachable!("short-circuit operators handled above"),
        };
        Ok(value)
    }
}
