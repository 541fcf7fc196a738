//! Syntax tree produced by the parser.
//!
//! Every node owns its children; the tree is acyclic. User function bodies
//! are held behind an `Rc` so the function registry can keep them after the
//! defining statement has run.

use std::rc::Rc;

/// Binary operators that evaluate both operands (or short-circuit, for
/// `And`/`Or`) and produce a new value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Concat,
    NumEq,
    NumNe,
    NumLt,
    NumLe,
    NumGt,
    NumGe,
    StrEq,
    StrNe,
    StrLt,
    StrLe,
    StrGt,
    StrGe,
    Match,
    NotMatch,
    And,
    Or,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
}

/// The operator of an assignment: plain `=` or one of the compound forms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssignOp {
    Set,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Concat,
}

/// Increment or decrement, in prefix or postfix position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Step {
    pub delta: i8,
    pub prefix: bool,
}

/// Something that can be assigned to or stepped.
#[derive(Clone, Debug, PartialEq)]
pub enum Target {
    /// A named variable (including special variables like `@` or `$1`).
    Var(String),
    /// A cell of the active sheet, addressed by an expression (`[expr]`).
    Cell(Box<Expr>),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Number(f64),
    Str(String),
    Var(String),
    Cell(Box<Expr>),
    Assign {
        target: Target,
        op: AssignOp,
        value: Box<Expr>,
    },
    Step {
        target: Target,
        step: Step,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
}

#[derive(Debug, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<String>,
    pub body: Stmt,
    pub line: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    Blank,
    Expr(Expr),
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    Block(Vec<Stmt>),
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    DoWhile {
        body: Box<Stmt>,
        cond: Expr,
    },
    For {
        init: Option<Expr>,
        cond: Option<Expr>,
        step: Option<Expr>,
        body: Box<Stmt>,
    },
    Break,
    Continue,
    Function(Rc<FunctionDef>),
    Return(Option<Expr>),
}
