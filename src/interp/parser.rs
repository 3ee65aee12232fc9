//! Recursive-descent parser producing the [`ast`](crate::interp::ast) tree.

use crate::interp::ast::{
    AssignOp, BinOp, BoolOp, Expr, ExprKind, Literal, Program, Stmt, StmtKind, UnaryOp,
};
use crate::interp::lexer::{tokenize, Tok, Token};
use crate::interp::Fault;

/// Parse a source string into a [`Program`].
pub fn parse(source: &str) -> Result<Program, Fault> {
    let tokens = tokenize(source)?;
    let mut parser = Parser { tokens, pos: 0 };
    parser.program()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Tok {
        &self.tokens[self.pos].tok
    }

    fn line(&self) -> u32 {
        self.tokens[self.pos].line
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Tok) -> bool {
        if self.peek() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Tok, what: &str) -> Result<Token, Fault> {
        if *self.peek() == expected {
            Ok(self.advance())
        } else {
            Err(Fault::syntax(
                self.line(),
                format!("expected {}, found {}", what, describe(self.peek())),
            ))
        }
    }

    fn program(&mut self) -> Result<Program, Fault> {
        let mut body = Vec::new();
        loop {
            while self.eat(&Tok::Newline) {}
            if *self.peek() == Tok::Eof {
                break;
            }
            body.push(self.statement()?);
        }
        Ok(Program { body })
    }

    fn statement(&mut self) -> Result<Stmt, Fault> {
        match self.peek() {
            Tok::Def => self.def_statement(),
            Tok::If => self.if_statement(),
            Tok::While => self.while_statement(),
            Tok::For => self.for_statement(),
            _ => {
                let stmt = self.simple_statement()?;
                self.end_of_statement()?;
                Ok(stmt)
            }
        }
    }

    fn end_of_statement(&mut self) -> Result<(), Fault> {
        if self.eat(&Tok::Newline) || *self.peek() == Tok::Eof || *self.peek() == Tok::Dedent {
            Ok(())
        } else {
            Err(Fault::syntax(
                self.line(),
                format!("unexpected {} after statement", describe(self.peek())),
            ))
        }
    }

    fn simple_statement(&mut self) -> Result<Stmt, Fault> {
        let line = self.line();
        match self.peek().clone() {
            Tok::Return => {
                self.advance();
                let value = if matches!(self.peek(), Tok::Newline | Tok::Eof | Tok::Dedent) {
                    None
                } else {
                    Some(self.expression()?)
                };
                Ok(Stmt {
                    line,
                    kind: StmtKind::Return(value),
                })
            }
            Tok::Import => {
                self.advance();
                let module = match self.advance().tok {
                    Tok::Name(name) => name,
                    other => {
                        return Err(Fault::syntax(
                            line,
                            format!("expected module name after 'import', found {}", describe(&other)),
                        ))
                    }
                };
                Ok(Stmt {
                    line,
                    kind: StmtKind::Import { module },
                })
            }
            Tok::Pass => {
                self.advance();
                Ok(Stmt {
                    line,
                    kind: StmtKind::Pass,
                })
            }
            Tok::Break => {
                self.advance();
                Ok(Stmt {
                    line,
                    kind: StmtKind::Break,
                })
            }
            Tok::Continue => {
                self.advance();
                Ok(Stmt {
                    line,
                    kind: StmtKind::Continue,
                })
            }
            _ => {
                let expr = self.expression()?;
                let op = match self.peek() {
                    Tok::Assign => Some(AssignOp::Set),
                    Tok::PlusAssign => Some(AssignOp::Add),
                    Tok::MinusAssign => Some(AssignOp::Sub),
                    _ => None,
                };
                if let Some(op) = op {
                    self.advance();
                    let name = match expr.kind {
                        ExprKind::Name(name) => name,
                        _ => {
                            return Err(Fault::syntax(line, "cannot assign to this expression"));
                        }
                    };
                    let value = self.expression()?;
                    Ok(Stmt {
                        line,
                        kind: StmtKind::Assign { name, op, value },
                    })
                } else {
                    Ok(Stmt {
                        line,
                        kind: StmtKind::Expr(expr),
                    })
                }
            }
        }
    }

    fn block(&mut self) -> Result<Vec<Stmt>, Fault> {
        self.expect(Tok::Colon, "':'")?;
        self.expect(Tok::Newline, "a newline after ':'")?;
        while self.eat(&Tok::Newline) {}
        self.expect(Tok::Indent, "an indented block")?;
        let mut body = Vec::new();
        loop {
            while self.eat(&Tok::Newline) {}
            if self.eat(&Tok::Dedent) {
                break;
            }
            if *self.peek() == Tok::Eof {
                break;
            }
            body.push(self.statement()?);
        }
        if body.is_empty() {
            return Err(Fault::syntax(self.line(), "expected at least one statement in block"));
        }
        Ok(body)
    }

    fn def_statement(&mut self) -> Result<Stmt, Fault> {
        let line = self.line();
        self.advance(); // def
        let name = match self.advance().tok {
            Tok::Name(name) => name,
            other => {
                return Err(Fault::syntax(
                    line,
                    format!("expected function name after 'def', found {}", describe(&other)),
                ))
            }
        };
        self.expect(Tok::LParen, "'('")?;
        let mut params = Vec::new();
        if !self.eat(&Tok::RParen) {
            loop {
                match self.advance().tok {
                    Tok::Name(param) => params.push(param),
                    other => {
                        return Err(Fault::syntax(
                            line,
                            format!("expected parameter name, found {}", describe(&other)),
                        ))
                    }
                }
                if self.eat(&Tok::Comma) {
                    if self.eat(&Tok::RParen) {
                        break;
                    }
                    continue;
                }
                self.expect(Tok::RParen, "')'")?;
                break;
            }
        }
        let body = self.block()?;
        Ok(Stmt {
            line,
            kind: StmtKind::Def { name, params, body },
        })
    }

    fn if_statement(&mut self) -> Result<Stmt, Fault> {
        let line = self.line();
        self.advance(); // if
        let mut branches = Vec::new();
        let cond = self.expression()?;
        let body = self.block()?;
        branches.push((cond, body));
        let mut orelse = Vec::new();
        loop {
            if *self.peek() == Tok::Elif {
                self.advance();
                let cond = self.expression()?;
                let body = self.block()?;
                branches.push((cond, body));
            } else if *self.peek() == Tok::Else {
                self.advance();
                orelse = self.block()?;
                break;
            } else {
                break;
            }
        }
        Ok(Stmt {
            line,
            kind: StmtKind::If { branches, orelse },
        })
    }

    fn while_statement(&mut self) -> Result<Stmt, Fault> {
        let line = self.line();
        self.advance(); // while
        let cond = self.expression()?;
        let body = self.block()?;
        Ok(Stmt {
            line,
            kind: StmtKind::While { cond, body },
        })
    }

    fn for_statement(&mut self) -> Result<Stmt, Fault> {
        let line = self.line();
        self.advance(); // for
        let var = match self.advance().tok {
            Tok::Name(name) => name,
            other => {
                return Err(Fault::syntax(
                    line,
                    format!("expected loop variable after 'for', found {}", describe(&other)),
                ))
            }
        };
        self.expect(Tok::In, "'in'")?;
        let iter = self.expression()?;
        let body = self.block()?;
        Ok(Stmt {
            line,
            kind: StmtKind::For { var, iter, body },
        })
    }

    // Expressions, loosest binding first.

    fn expression(&mut self) -> Result<Expr, Fault> {
        self.or_expr()
    }

    fn or_expr(&mut self) -> Result<Expr, Fault> {
        let mut lhs = self.and_expr()?;
        while *self.peek() == Tok::Or {
            let line = self.line();
            self.advance();
            let rhs = self.and_expr()?;
            lhs = Expr {
                line,
                kind: ExprKind::Bool {
                    op: BoolOp::Or,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
            };
        }
        Ok(lhs)
    }

    fn and_expr(&mut self) -> Result<Expr, Fault> {
        let mut lhs = self.not_expr()?;
        while *self.peek() == Tok::And {
            let line = self.line();
            self.advance();
            let rhs = self.not_expr()?;
            lhs = Expr {
                line,
                kind: ExprKind::Bool {
                    op: BoolOp::And,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
            };
        }
        Ok(lhs)
    }

    fn not_expr(&mut self) -> Result<Expr, Fault> {
        if *self.peek() == Tok::Not {
            let line = self.line();
            self.advance();
            let operand = self.not_expr()?;
            return Ok(Expr {
                line,
                kind: ExprKind::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                },
            });
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr, Fault> {
        let lhs = self.arith()?;
        let op = match self.peek() {
            Tok::Eq => Some(BinOp::Eq),
            Tok::Ne => Some(BinOp::Ne),
            Tok::Lt => Some(BinOp::Lt),
            Tok::Le => Some(BinOp::Le),
            Tok::Gt => Some(BinOp::Gt),
            Tok::Ge => Some(BinOp::Ge),
            Tok::In => Some(BinOp::In),
            _ => None,
        };
        let Some(op) = op else { return Ok(lhs) };
        let line = self.line();
        self.advance();
        let rhs = self.arith()?;
        Ok(Expr {
            line,
            kind: ExprKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
        })
    }

    fn arith(&mut self) -> Result<Expr, Fault> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                Tok::Plus => BinOp::Add,
                Tok::Minus => BinOp::Sub,
                _ => break,
            };
            let line = self.line();
            self.advance();
            let rhs = self.term()?;
            lhs = Expr {
                line,
                kind: ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
            };
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr, Fault> {
        let mut lhs = self.factor()?;
        loop {
            let op = match self.peek() {
                Tok::Star => BinOp::Mul,
                Tok::Slash => BinOp::Div,
                Tok::SlashSlash => BinOp::FloorDiv,
                Tok::Percent => BinOp::Mod,
                _ => break,
            };
            let line = self.line();
            self.advance();
            let rhs = self.factor()?;
            lhs = Expr {
                line,
                kind: ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
            };
        }
        Ok(lhs)
    }

    fn factor(&mut self) -> Result<Expr, Fault> {
        if *self.peek() == Tok::Minus {
            let line = self.line();
            self.advance();
            let operand = self.factor()?;
            return Ok(Expr {
                line,
                kind: ExprKind::Unary {
                    op: UnaryOp::Neg,
                    operand: Box::new(operand),
                },
            });
        }
        if *self.peek() == Tok::Plus {
            self.advance();
            return self.factor();
        }
        self.postfix()
    }

    fn postfix(&mut self) -> Result<Expr, Fault> {
        let mut expr = self.primary()?;
        loop {
            match self.peek() {
                Tok::LParen => {
                    let line = self.line();
                    self.advance();
                    let mut args = Vec::new();
                    if !self.eat(&Tok::RParen) {
                        loop {
                            args.push(self.expression()?);
                            if self.eat(&Tok::Comma) {
                                if self.eat(&Tok::RParen) {
                                    break;
                                }
                                continue;
                            }
                            self.expect(Tok::RParen, "')'")?;
                            break;
                        }
                    }
                    expr = Expr {
                        line,
                        kind: ExprKind::Call {
                            func: Box::new(expr),
                            args,
                        },
                    };
                }
                Tok::LBracket => {
                    let line = self.line();
                    self.advance();
                    let index = self.expression()?;
                    self.expect(Tok::RBracket, "']'")?;
                    expr = Expr {
                        line,
                        kind: ExprKind::Index {
                            obj: Box::new(expr),
                            index: Box::new(index),
                        },
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr, Fault> {
        let line = self.line();
        let token = self.advance();
        let kind = match token.tok {
            Tok::Int(n) => ExprKind::Literal(Literal::Int(n)),
            Tok::Float(x) => ExprKind::Literal(Literal::Float(x)),
            Tok::Str(s) => ExprKind::Literal(Literal::Str(s)),
            Tok::True => ExprKind::Literal(Literal::Bool(true)),
            Tok::False => ExprKind::Literal(Literal::Bool(false)),
            Tok::None => ExprKind::Literal(Literal::None),
            Tok::Name(name) => ExprKind::Name(name),
            Tok::LParen => {
                let inner = self.expression()?;
                self.expect(Tok::RParen, "')'")?;
                return Ok(inner);
            }
            Tok::LBracket => {
                let mut items = Vec::new();
                if !self.eat(&Tok::RBracket) {
                    loop {
                        items.push(self.expression()?);
                        if self.eat(&Tok::Comma) {
                            if self.eat(&Tok::RBracket) {
                                break;
                            }
                            continue;
                        }
                        self.expect(Tok::RBracket, "']'")?;
                        break;
                    }
                }
                ExprKind::List(items)
            }
            Tok::LBrace => {
                let mut pairs = Vec::new();
                if !self.eat(&Tok::RBrace) {
                    loop {
                        let key = self.expression()?;
                        self.expect(Tok::Colon, "':'")?;
                        let value = self.expression()?;
                        pairs.push((key, value));
                        if self.eat(&Tok::Comma) {
                            if self.eat(&Tok::RBrace) {
                                break;
                            }
                            continue;
                        }
                        self.expect(Tok::RBrace, "'}'")?;
                        break;
                    }
                }
                ExprKind::Dict(pairs)
            }
            other => {
                return Err(Fault::syntax(
                    line,
                    format!("unexpected {}", describe(&other)),
                ));
            }
        };
        Ok(Expr { line, kind })
    }
}

fn describe(tok: &Tok) -> String {
    match tok {
        Tok::Name(name) => format!("name '{}'", name),
        Tok::Int(n) => format!("number '{}'", n),
        Tok::Float(x) => format!("number '{}'", x),
        Tok::Str(_) => "string literal".to_string(),
        Tok::Newline => "end of line".to_string(),
        Tok::Indent => "indent".to_string(),
        Tok::Dedent => "end of block".to_string(),
        Tok::Eof => "end of input".to_string(),
        other => format!("'{}'", symbol(other)),
    }
}

fn symbol(tok: &Tok) -> &'static str {
    match tok {
        Tok::Def => "def",
        Tok::Return => "return",
        Tok::If => "if",
        Tok::Elif => "elif",
        Tok::Else => "else",
        Tok::While => "while",
        Tok::For => "for",
        Tok::In => "in",
        Tok::Import => "import",
        Tok::Pass => "pass",
        Tok::Break => "break",
        Tok::Continue => "continue",
        Tok::And => "and",
        Tok::Or => "or",
        Tok::Not => "not",
        Tok::True => "True",
        Tok::False => "False",
        Tok::None => "None",
        Tok::Assign => "=",
        Tok::PlusAssign => "+=",
        Tok::MinusAssign => "-=",
        Tok::Eq => "==",
        Tok::Ne => "!=",
        Tok::Lt => "<",
        Tok::Le => "<=",
        Tok::Gt => ">",
        Tok::Ge => ">=",
        Tok::Plus => "+",
        Tok::Minus => "-",
        Tok::Star => "*",
        Tok::Slash => "/",
        Tok::SlashSlash => "//",
        Tok::Percent => "%",
        Tok::LParen => "(",
        Tok::RParen => ")",
        Tok::LBracket => "[",
        Tok::RBracket => "]",
        Tok::LBrace => "{",
        Tok::RBrace => "}",
        Tok::Comma => ",",
        Tok::Colon => ":",
        _ => "?",
    }
}
