//! Statement evaluation and control-flow propagation.

use log::debug;

use super::Interpreter;
use crate::ast::{Expr, Stmt};
use crate::error::Result;
use crate::sheet::Spreadsheet;
use crate::value::Value;

/// What a statement asks its enclosing constructs to do next.
///
/// `Break`/`Continue` are consumed by the nearest loop, `Return` by the
/// nearest function call, and `Exit` travels all the way out.
#[derive(Clone, Debug, PartialEq)]
pub enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
    Exit,
}

impl<S: Spreadsheet> Interpreter<S> {
    /// Evaluate an expression for its side effects, reporting a pending exit.
    fn exec_expr(&mut self, expr: &Expr) -> Result<Flow> {
        self.eval(expr)?;
        Ok(self.after_eval())
    }

    fn after_eval(&self) -> Flow {
        if self.halted() { Flow::Exit } else { Flow::Normal }
    }

    /// Evaluate a loop or branch condition. `None` means the run is halting.
    fn test(&mut self, cond: &Expr) -> Result<Option<bool>> {
        let value = self.eval(cond)?;
        if self.halted() {
            return Ok(None);
        }
        Ok(Some(value.is_truthy()))
    }

    pub(crate) fn exec(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Blank => Ok(Flow::Normal),
            Stmt::Expr(expr) => self.exec_expr(expr),
            Stmt::Block(stmts) => {
                for stmt in stmts {
                    let flow = self.exec(stmt)?;
                    if flow != Flow::Normal {
                        return Ok(flow);
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => match self.test(cond)? {
                None => Ok(Flow::Exit),
                Some(true) => self.exec(then_branch),
                Some(false) => match else_branch {
                    Some(branch) => self.exec(branch),
                    None => Ok(Flow::Normal),
                },
            },
            Stmt::While { cond, body } => {
                loop {
                    match self.test(cond)? {
                        None => return Ok(Flow::Exit),
                        Some(false) => break,
                        Some(true) => {}
                    }
                    match self.exec(body)? {
                        Flow::Break => break,
                        Flow::Normal | Flow::Continue => {}
                        flow => return Ok(flow),
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::DoWhile { body, cond } => {
                loop {
                    match self.exec(body)? {
                        Flow::Break => break,
                        Flow::Normal | Flow::Continue => {}
                        flow => return Ok(flow),
                    }
                    match self.test(cond)? {
                        None => return Ok(Flow::Exit),
                        Some(false) => break,
                        Some(true) => {}
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::For {
                init,
                cond,
                step,
                body,
            } => {
                if let Some(init) = init {
                    if self.exec_expr(init)? == Flow::Exit {
                        return Ok(Flow::Exit);
                    }
                }
                loop {
                    if let Some(cond) = cond {
                        match self.test(cond)? {
                            None => return Ok(Flow::Exit),
                            Some(false) => break,
                            Some(true) => {}
                        }
                    }
                    match self.exec(body)? {
                        Flow::Break => break,
                        Flow::Normal | Flow::Continue => {}
                        flow => return Ok(flow),
                    }
                    if let Some(step) = step {
                        if self.exec_expr(step)? == Flow::Exit {
                            return Ok(Flow::Exit);
                        }
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::Break => Ok(Flow::Break),
            Stmt::Continue => Ok(Flow::Continue),
            Stmt::Function(def) => {
                debug!("defining function '{}' at line {}", def.name, def.line);
                self.functions.define_user(def.clone())?;
                Ok(Flow::Normal)
            }
            Stmt::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval(expr)?,
                    None => Value::empty(),
                };
                if self.halted() {
                    return Ok(Flow::Exit);
                }
                Ok(Flow::Return(value))
            }
        }
    }
}
