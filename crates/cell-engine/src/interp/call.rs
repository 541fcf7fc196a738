//! Function registry and the call protocol.

use std::collections::HashMap;
use std::rc::Rc;

use super::{Flow, Interpreter};
use crate::ast::{Expr, FunctionDef};
use crate::error::{CellError, Result};
use crate::sheet::Spreadsheet;
use crate::value::Value;

/// A host function. It receives evaluated arguments and checks its own arity.
pub type Builtin<S> = fn(&mut Interpreter<S>, &[Value]) -> Result<Value>;

pub enum Function<S: Spreadsheet> {
    Builtin(Builtin<S>),
    User(Rc<FunctionDef>),
}

impl<S: Spreadsheet> Clone for Function<S> {
    fn clone(&self) -> Self {
        match self {
            Function::Builtin(f) => Function::Builtin(*f),
            Function::User(def) => Function::User(Rc::clone(def)),
        }
    }
}

/// Every callable name, builtin or user-defined. Names are never rebound.
pub struct FunctionRegistry<S: Spreadsheet> {
    functions: HashMap<String, Function<S>>,
}

impl<S: Spreadsheet> FunctionRegistry<S> {
    pub fn new() -> Self {
        FunctionRegistry {
            functions: HashMap::new(),
        }
    }

    /// A registry holding exactly `builtins`; later entries win on a repeated name.
    pub fn with_builtins(builtins: impl IntoIterator<Item = (&'static str, Builtin<S>)>) -> Self {
        FunctionRegistry {
            functions: builtins
                .into_iter()
                .map(|(name, f)| (name.to_string(), Function::Builtin(f)))
                .collect(),
        }
    }

    pub fn define_builtin(&mut self, name: &str, f: Builtin<S>) -> Result<()> {
        self.insert(name, Function::Builtin(f))
    }

    pub fn define_user(&mut self, def: Rc<FunctionDef>) -> Result<()> {
        let name = def.name.clone();
        self.insert(&name, Function::User(def))
    }

    fn insert(&mut self, name: &str, function: Function<S>) -> Result<()> {
        if self.functions.contains_key(name) {
            return Err(CellError::Redefinition(name.to_string()));
        }
        self.functions.insert(name.to_string(), function);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Function<S>> {
        self.functions.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl<S: Spreadsheet> Default for FunctionRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Spreadsheet> Interpreter<S> {
    /// Register an extra host function before running a program.
    pub fn define_builtin(&mut self, name: &str, f: Builtin<S>) -> Result<()> {
        self.functions.define_builtin(name, f)
    }

    /// Evaluate `args` left to right, then dispatch on `name`.
    pub(crate) fn call(&mut self, name: &str, args: &[Expr]) -> Result<Value> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval(arg)?);
        }

        match self.functions.get(name) {
            Some(Function::Builtin(f)) => f(self, &values),
            Some(Function::User(def)) => self.call_user(&def, values),
            None => Err(CellError::UndefinedFunction(name.to_string())),
        }
    }

    fn call_user(&mut self, def: &FunctionDef, args: Vec<Value>) -> Result<Value> {
        if args.len() != def.params.len() {
            return Err(CellError::Arity {
                name: def.name.clone(),
                expected: def.params.len().to_string(),
                found: args.len(),
            });
        }

        // The root frame is not a call.
        if self.scopes.depth() > self.max_call_depth {
            return Err(CellError::CallDepth(self.max_call_depth));
        }

        self.scopes.push();
        for (param, value) in def.params.iter().zip(args) {
            self.scopes.declare(param, value);
        }
        let flow = self.exec(&def.body);
        self.scopes.pop();

        match flow? {
            Flow::Return(value) => Ok(value),
            Flow::Normal | Flow::Exit => Ok(Value::empty()),
            Flow::Break => Err(CellError::OutsideLoop("break")),
            Flow::Continue => Err(CellError::OutsideLoop("continue")),
        }
    }
}
