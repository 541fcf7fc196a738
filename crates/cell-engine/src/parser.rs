//! Recursive-descent parser for Cell programs.
//!
//! Precedence, lowest first:
//!
//! ```text
//! assignment (= += -= *= /= %= **= .=, right-assoc)
//! ||
//! &&
//! == != < <= > >= eq ne lt le gt ge ~ !~
//! .  (concatenation)
//! + -
//! * / %
//! ** ^ (right-assoc)
//! ! - + ++ -- (prefix)
//! ++ -- (postfix)
//! primary: number, string, (expr), [expr], identifier, call
//! ```
//!
//! Parsing stops at the first syntax error; there is no recovery.

use std::rc::Rc;

use crate::ast::{AssignOp, BinaryOp, Expr, FunctionDef, Step, Stmt, Target, UnaryOp};
use crate::error::{CellError, Result};
use crate::lexer::{Spanned, Token, tokenize};

/// Parse a whole program into a single top-level block.
pub fn parse_program(src: &str) -> Result<Stmt> {
    let tokens = tokenize(src)?;
    let mut parser = Parser::new(tokens);
    parser.program()
}

pub struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
}

impl Parser {
    /// `tokens` must end with [`Token::Eof`], as produced by [`tokenize`].
    pub fn new(tokens: Vec<Spanned>) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> &Token {
        self.tokens
            .get(self.pos + offset)
            .or_else(|| self.tokens.last())
            .map(|s| &s.token)
            .unwrap_or(&Token::Eof)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|s| s.line)
            .unwrap_or(1)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn error(&self, message: String) -> CellError {
        CellError::Parse {
            line: self.line(),
            message,
        }
    }

    fn unexpected(&self, expected: &str) -> CellError {
        self.error(format!("expected {}, found {}", expected, self.peek()))
    }

    fn expect(&mut self, token: Token) -> Result<()> {
        if *self.peek() == token {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&token.to_string()))
        }
    }

    /// Skip statement separators, but only when `wanted` follows them.
    ///
    /// Lets `}` and `else` (or `)` and `{`) sit on different lines without
    /// turning the separator into an empty statement elsewhere.
    fn skip_separators_before(&mut self, wanted: &Token) {
        let mut offset = 0;
        while *self.peek_at(offset) == Token::StmtEnd {
            offset += 1;
        }
        if offset > 0 && self.peek_at(offset) == wanted {
            self.pos += offset;
        }
    }

    fn program(&mut self) -> Result<Stmt> {
        let mut stmts = Vec::new();
        while *self.peek() != Token::Eof {
            stmts.push(self.statement()?);
        }
        Ok(Stmt::Block(stmts))
    }

    /// An expression statement ends at a separator, or right before `}` / end of input.
    fn end_statement(&mut self) -> Result<()> {
        match self.peek() {
            Token::StmtEnd => {
                self.advance();
                Ok(())
            }
            Token::RBrace | Token::Eof => Ok(()),
            _ => Err(self.unexpected("end of statement")),
        }
    }

    pub fn statement(&mut self) -> Result<Stmt> {
        match self.peek() {
            Token::StmtEnd => {
                self.advance();
                Ok(Stmt::Blank)
            }
            Token::LBrace => self.block(),
            Token::If => self.if_statement(),
            Token::While => self.while_statement(),
            Token::Do => self.do_while_statement(),
            Token::For => self.for_statement(),
            Token::Break => {
                self.advance();
                self.end_statement()?;
                Ok(Stmt::Break)
            }
            Token::Continue => {
                self.advance();
                self.end_statement()?;
                Ok(Stmt::Continue)
            }
            Token::Return => {
                self.advance();
                let value = match self.peek() {
                    Token::StmtEnd | Token::RBrace | Token::Eof => None,
                    _ => Some(self.expression()?),
                };
                self.end_statement()?;
                Ok(Stmt::Return(value))
            }
            Token::Function => self.function_definition(),
            _ => {
                let expr = self.expression()?;
                self.end_statement()?;
                Ok(Stmt::Expr(expr))
            }
        }
    }

    fn block(&mut self) -> Result<Stmt> {
        self.expect(Token::LBrace)?;
        let mut stmts = Vec::new();
        loop {
            match self.peek() {
                Token::RBrace => break,
                Token::Eof => return Err(self.unexpected("'}'")),
                _ => stmts.push(self.statement()?),
            }
        }
        self.expect(Token::RBrace)?;
        Ok(Stmt::Block(stmts))
    }

    /// Body of `if`/`while`/`for`/`do`: any statement, with a brace block
    /// allowed to start on the next line.
    fn body(&mut self) -> Result<Box<Stmt>> {
        self.skip_separators_before(&Token::LBrace);
        Ok(Box::new(self.statement()?))
    }

    fn condition(&mut self) -> Result<Expr> {
        self.expect(Token::LParen)?;
        let cond = self.expression()?;
        self.expect(Token::RParen)?;
        Ok(cond)
    }

    fn if_statement(&mut self) -> Result<Stmt> {
        self.expect(Token::If)?;
        let cond = self.condition()?;
        let then_branch = self.body()?;
        self.skip_separators_before(&Token::Else);
        let else_branch = if *self.peek() == Token::Else {
            self.advance();
            Some(self.body()?)
        } else {
            None
        };
        Ok(Stmt::If {
            cond,
            then_branch,
            else_branch,
        })
    }

    fn while_statement(&mut self) -> Result<Stmt> {
        self.expect(Token::While)?;
        let cond = self.condition()?;
        let body = self.body()?;
        Ok(Stmt::While { cond, body })
    }

    fn do_while_statement(&mut self) -> Result<Stmt> {
        self.expect(Token::Do)?;
        let body = self.body()?;
        self.skip_separators_before(&Token::While);
        self.expect(Token::While)?;
        let cond = self.condition()?;
        self.end_statement()?;
        Ok(Stmt::DoWhile { body, cond })
    }

    fn for_statement(&mut self) -> Result<Stmt> {
        self.expect(Token::For)?;
        self.expect(Token::LParen)?;
        let init = self.optional_expression(&Token::StmtEnd)?;
        self.expect(Token::StmtEnd)?;
        let cond = self.optional_expression(&Token::StmtEnd)?;
        self.expect(Token::StmtEnd)?;
        let step = self.optional_expression(&Token::RParen)?;
        self.expect(Token::RParen)?;
        let body = self.body()?;
        Ok(Stmt::For {
            init,
            cond,
            step,
            body,
        })
    }

    fn optional_expression(&mut self, terminator: &Token) -> Result<Option<Expr>> {
        if self.peek() == terminator {
            Ok(None)
        } else {
            Ok(Some(self.expression()?))
        }
    }

    fn function_definition(&mut self) -> Result<Stmt> {
        let line = self.line();
        self.expect(Token::Function)?;
        let name = match self.advance() {
            Token::Ident(name) => name,
            other => {
                return Err(self.error(format!("expected function name, found {}", other)));
            }
        };
        self.expect(Token::LParen)?;
        let mut params = Vec::new();
        if *self.peek() != Token::RParen {
            loop {
                match self.advance() {
                    Token::Ident(param) => params.push(param),
                    other => {
                        return Err(self.error(format!("expected parameter name, found {}", other)));
                    }
                }
                if *self.peek() == Token::Comma {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(Token::RParen)?;
        self.skip_separators_before(&Token::LBrace);
        let body = self.block()?;
        Ok(Stmt::Function(Rc::new(FunctionDef {
            name,
            params,
            body,
            line,
        })))
    }

    pub fn expression(&mut self) -> Result<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr> {
        let left = self.logical_or()?;
        let op = match self.peek() {
            Token::Assign => AssignOp::Set,
            Token::AddAssign => AssignOp::Add,
            Token::SubAssign => AssignOp::Sub,
            Token::MulAssign => AssignOp::Mul,
            Token::DivAssign => AssignOp::Div,
            Token::ModAssign => AssignOp::Mod,
            Token::PowAssign => AssignOp::Pow,
            Token::ConcatAssign => AssignOp::Concat,
            _ => return Ok(left),
        };
        let target = self.target(left)?;
        self.advance();
        let value = self.assignment()?;
        Ok(Expr::Assign {
            target,
            op,
            value: Box::new(value),
        })
    }

    fn target(&self, expr: Expr) -> Result<Target> {
        match expr {
            Expr::Var(name) => Ok(Target::Var(name)),
            Expr::Cell(axis) => Ok(Target::Cell(axis)),
            _ => Err(self.error(format!(
                "{} needs a variable or cell on its left",
                self.peek()
            ))),
        }
    }

    fn binary_level(
        &mut self,
        next: fn(&mut Self) -> Result<Expr>,
        op_for: fn(&Token) -> Option<BinaryOp>,
    ) -> Result<Expr> {
        let mut left = next(self)?;
        while let Some(op) = op_for(self.peek()) {
            self.advance();
            let right = next(self)?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn logical_or(&mut self) -> Result<Expr> {
        self.binary_level(Self::logical_and, |t| match t {
            Token::Or => Some(BinaryOp::Or),
            _ => None,
        })
    }

    fn logical_and(&mut self) -> Result<Expr> {
        self.binary_level(Self::comparison, |t| match t {
            Token::And => Some(BinaryOp::And),
            _ => None,
        })
    }

    fn comparison(&mut self) -> Result<Expr> {
        self.binary_level(Self::concat, |t| match t {
            Token::Eq => Some(BinaryOp::NumEq),
            Token::Ne => Some(BinaryOp::NumNe),
            Token::Lt => Some(BinaryOp::NumLt),
            Token::Le => Some(BinaryOp::NumLe),
            Token::Gt => Some(BinaryOp::NumGt),
            Token::Ge => Some(BinaryOp::NumGe),
            Token::StrEq => Some(BinaryOp::StrEq),
            Token::StrNe => Some(BinaryOp::StrNe),
            Token::StrLt => Some(BinaryOp::StrLt),
            Token::StrLe => Some(BinaryOp::StrLe),
            Token::StrGt => Some(BinaryOp::StrGt),
            Token::StrGe => Some(BinaryOp::StrGe),
            Token::Match => Some(BinaryOp::Match),
            Token::NotMatch => Some(BinaryOp::NotMatch),
            _ => None,
        })
    }

    fn concat(&mut self) -> Result<Expr> {
        self.binary_level(Self::additive, |t| match t {
            Token::Dot => Some(BinaryOp::Concat),
            _ => None,
        })
    }

    fn additive(&mut self) -> Result<Expr> {
        self.binary_level(Self::multiplicative, |t| match t {
            Token::Plus => Some(BinaryOp::Add),
            Token::Minus => Some(BinaryOp::Sub),
            _ => None,
        })
    }

    fn multiplicative(&mut self) -> Result<Expr> {
        self.binary_level(Self::power, |t| match t {
            Token::Star => Some(BinaryOp::Mul),
            Token::Slash => Some(BinaryOp::Div),
            Token::Percent => Some(BinaryOp::Mod),
            _ => None,
        })
    }

    fn power(&mut self) -> Result<Expr> {
        let base = self.unary()?;
        if *self.peek() != Token::Pow {
            return Ok(base);
        }
        self.advance();
        let exponent = self.power()?;
        Ok(Expr::Binary {
            op: BinaryOp::Pow,
            left: Box::new(base),
            right: Box::new(exponent),
        })
    }

    fn unary(&mut self) -> Result<Expr> {
        let op = match self.peek() {
            Token::Not => UnaryOp::Not,
            Token::Minus => UnaryOp::Neg,
            Token::Plus => UnaryOp::Plus,
            Token::Incr | Token::Decr => {
                let delta = if self.advance() == Token::Incr { 1 } else { -1 };
                let operand = self.postfix()?;
                let target = self.target(operand)?;
                return Ok(Expr::Step {
                    target,
                    step: Step {
                        delta,
                        prefix: true,
                    },
                });
            }
            _ => return self.postfix(),
        };
        self.advance();
        let operand = self.unary()?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn postfix(&mut self) -> Result<Expr> {
        let expr = self.primary()?;
        let delta = match self.peek() {
            Token::Incr => 1,
            Token::Decr => -1,
            _ => return Ok(expr),
        };
        let target = self.target(expr)?;
        self.advance();
        Ok(Expr::Step {
            target,
            step: Step {
                delta,
                prefix: false,
            },
        })
    }

    fn primary(&mut self) -> Result<Expr> {
        match self.advance() {
            Token::Number(n) => Ok(Expr::Number(n)),
            Token::Str(s) => Ok(Expr::Str(s)),
            Token::LParen => {
                let expr = self.expression()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }
            Token::LBracket => {
                let axis = self.expression()?;
                self.expect(Token::RBracket)?;
                Ok(Expr::Cell(Box::new(axis)))
            }
            Token::Ident(name) => {
                if *self.peek() == Token::LParen {
                    self.advance();
                    let args = self.arguments()?;
                    Ok(Expr::Call { name, args })
                } else {
                    Ok(Expr::Var(name))
                }
            }
            other => {
                // Report against the token we just consumed.
                self.pos -= 1;
                Err(self.error(format!("unexpected {}", other)))
            }
        }
    }

    fn arguments(&mut self) -> Result<Vec<Expr>> {
        let mut args = Vec::new();
        if *self.peek() == Token::RParen {
            self.advance();
            return Ok(args);
        }
        loop {
            args.push(self.expression()?);
            match self.advance() {
                Token::Comma => continue,
                Token::RParen => return Ok(args),
                other => {
                    return Err(self.error(format!("expected ',' or ')', found {}", other)));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(src: &str) -> Expr {
        match parse_program(src).unwrap() {
            Stmt::Block(mut stmts) => match stmts.remove(0) {
                Stmt::Expr(e) => e,
                other => panic!("expected expression statement, got {:?}", other),
            },
            other => panic!("expected block, got {:?}", other),
        }
    }

    fn bin(op: BinaryOp, left: Expr, right: Expr) -> Expr {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    fn num(n: f64) -> Expr {
        Expr::Number(n)
    }

    #[test]
    fn test_multiplication_binds_tighter_than_addition() {
        assert_eq!(
            expr("1 + 2 * 3"),
            bin(BinaryOp::Add, num(1.0), bin(BinaryOp::Mul, num(2.0), num(3.0)))
        );
    }

    #[test]
    fn test_power_is_right_associative() {
        assert_eq!(
            expr("2 ** 3 ^ 2"),
            bin(BinaryOp::Pow, num(2.0), bin(BinaryOp::Pow, num(3.0), num(2.0)))
        );
    }

    #[test]
    fn test_unary_minus_binds_tighter_than_power() {
        assert_eq!(
            expr("-2 ** 2"),
            bin(
                BinaryOp::Pow,
                Expr::Unary {
                    op: UnaryOp::Neg,
                    operand: Box::new(num(2.0))
                },
                num(2.0)
            )
        );
    }

    #[test]
    fn test_concat_sits_between_comparison_and_additive() {
        assert_eq!(
            expr("1 + 2 . 3 == 33"),
            bin(
                BinaryOp::NumEq,
                bin(BinaryOp::Concat, bin(BinaryOp::Add, num(1.0), num(2.0)), num(3.0)),
                num(33.0)
            )
        );
    }

    #[test]
    fn test_assignment_is_right_associative() {
        let parsed = expr("a = b += 1");
        let Expr::Assign { target, op, value } = parsed else {
            panic!("expected assignment");
        };
        assert_eq!(target, Target::Var("a".into()));
        assert_eq!(op, AssignOp::Set);
        assert!(matches!(*value, Expr::Assign { op: AssignOp::Add, .. }));
    }

    #[test]
    fn test_cell_targets_and_steps() {
        assert!(matches!(
            expr("[\"A\" . 1] .= 'x'"),
            Expr::Assign {
                target: Target::Cell(_),
                op: AssignOp::Concat,
                ..
            }
        ));
        assert_eq!(
            expr("@++"),
            Expr::Step {
                target: Target::Var("@".into()),
                step: Step {
                    delta: 1,
                    prefix: false
                }
            }
        );
        assert!(matches!(
            expr("--[\"B2\"]"),
            Expr::Step {
                target: Target::Cell(_),
                step: Step {
                    delta: -1,
                    prefix: true
                }
            }
        ));
    }

    #[test]
    fn test_call_arguments() {
        assert_eq!(
            expr("puts(1, \"a\")"),
            Expr::Call {
                name: "puts".into(),
                args: vec![num(1.0), Expr::Str("a".into())]
            }
        );
        assert_eq!(
            expr("gets()"),
            Expr::Call {
                name: "gets".into(),
                args: vec![]
            }
        );
    }

    #[test]
    fn test_invalid_assignment_target() {
        assert!(parse_program("1 = 2").is_err());
        assert!(parse_program("f() = 2").is_err());
        assert!(parse_program("(a + b)++").is_err());
    }

    #[test]
    fn test_statements() {
        let program = parse_program(
            "function f(a, b) {\n return a + b\n}\nfor (i = 0; i < 3; i++) { if (i == 1) continue; else break; }\ndo x++; while (x < 3);",
        )
        .unwrap();
        let Stmt::Block(stmts) = program else {
            panic!("expected block");
        };
        assert!(matches!(&stmts[0], Stmt::Function(def) if def.params == ["a", "b"]));
        assert!(matches!(&stmts[1], Stmt::Blank));
        assert!(matches!(&stmts[2], Stmt::For { init: Some(_), cond: Some(_), step: Some(_), .. }));
        assert!(matches!(&stmts[4], Stmt::DoWhile { .. }));
    }

    #[test]
    fn test_else_and_brace_on_next_line() {
        let program = parse_program("if (x)\n{\n a = 1\n}\nelse\n{\n a = 2\n}\n").unwrap();
        let Stmt::Block(stmts) = program else {
            panic!("expected block");
        };
        assert!(matches!(&stmts[0], Stmt::If { else_branch: Some(_), .. }));
    }

    #[test]
    fn test_empty_for_clauses() {
        let program = parse_program("for (;;) break").unwrap();
        let Stmt::Block(stmts) = program else {
            panic!("expected block");
        };
        assert!(matches!(&stmts[0], Stmt::For { init: None, cond: None, step: None, .. }));
    }

    #[test]
    fn test_syntax_error_reports_line() {
        let err = parse_program("a = 1\nb = (2 +\n").unwrap_err();
        match err {
            CellError::Parse { line, .. } => assert!(line >= 2),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_missing_statement_end() {
        assert!(parse_program("a = 1 b = 2").is_err());
    }
}
