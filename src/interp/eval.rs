//! Tree-walking evaluator.
//!
//! The machine executes a parsed [`Program`] against caller-owned global
//! bindings and an injected builtin table. Faults carry the line of the
//! deepest node that raised them; outer frames never overwrite it.

use std::io::Write;
use std::rc::Rc;

use crate::interp::ast::{
    AssignOp, BinOp, BoolOp, Expr, ExprKind, Literal, Program, Stmt, StmtKind, UnaryOp,
};
use crate::interp::builtins::BuiltinTable;
use crate::interp::value::{range_len, Bindings, FunctionDef, Value};
use crate::interp::Fault;

/// Ranges larger than this cannot be materialized into a list.
const MAX_MATERIALIZED_RANGE: i64 = 1_000_000;

/// Budgets protecting the host from runaway scripts.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    /// Statement/call executions allowed per run.
    pub max_steps: u64,
    /// Maximum nesting of user-function calls.
    pub max_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_steps: 5_000_000,
            max_depth: 64,
        }
    }
}

/// Name-resolution frame: locals (inside a function call) over globals.
pub struct Frame<'g> {
    pub globals: &'g mut Bindings,
    pub locals: Option<Bindings>,
}

impl Frame<'_> {
    fn get(&self, name: &str) -> Option<&Value> {
        if let Some(locals) = &self.locals {
            if let Some(v) = locals.get(name) {
                return Some(v);
            }
        }
        self.globals.get(name)
    }

    fn set(&mut self, name: &str, value: Value) {
        match &mut self.locals {
            Some(locals) => {
                locals.insert(name.to_string(), value);
            }
            None => {
                self.globals.insert(name.to_string(), value);
            }
        }
    }
}

enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

/// One execution machine. Built fresh per run; holds no state across runs.
pub struct Machine<'a> {
    builtins: &'a BuiltinTable,
    out: &'a mut dyn Write,
    /// Consulted on every function entry with the callee's lexical name.
    call_hook: Option<&'a dyn Fn(&str)>,
    limits: Limits,
    steps: u64,
    depth: usize,
}

impl<'a> Machine<'a> {
    pub fn new(
        builtins: &'a BuiltinTable,
        out: &'a mut dyn Write,
        call_hook: Option<&'a dyn Fn(&str)>,
        limits: Limits,
    ) -> Self {
        Self {
            builtins,
            out,
            call_hook,
            limits,
            steps: 0,
            depth: 0,
        }
    }

    /// Execute a program against `globals`, mutating it in place.
    pub fn run(&mut self, program: &Program, globals: &mut Bindings) -> Result<(), Fault> {
        let mut frame = Frame {
            globals,
            locals: None,
        };
        for stmt in &program.body {
            match self.exec_stmt(stmt, &mut frame)? {
                Flow::Normal => {}
                Flow::Break | Flow::Continue => {
                    return Err(
                        Fault::runtime("'break' or 'continue' outside loop").with_line(stmt.line)
                    );
                }
                Flow::Return(_) => {
                    return Err(Fault::runtime("'return' outside function").with_line(stmt.line));
                }
            }
        }
        Ok(())
    }

    /// Emit a line of program output.
    pub fn print_line(&mut self, text: &str) {
        // Writes go to an in-memory capture buffer; failures are not
        // observable by the script.
        let _ = writeln!(self.out, "{}", text);
    }

    pub(crate) fn materialize_range(
        &self,
        start: i64,
        stop: i64,
        step: i64,
    ) -> Result<Vec<Value>, Fault> {
        let count = range_len(start, stop, step);
        if count > MAX_MATERIALIZED_RANGE {
            return Err(Fault::runtime(format!(
                "range of {} elements is too large to materialize",
                count
            )));
        }
        let mut items = Vec::with_capacity(count as usize);
        let mut cur = start;
        for _ in 0..count {
            items.push(Value::Int(cur));
            cur += step;
        }
        Ok(items)
    }

    fn tick(&mut self) -> Result<(), Fault> {
        self.steps += 1;
        if self.steps > self.limits.max_steps {
            return Err(Fault::runtime(format!(
                "execution exceeded the step budget of {}",
                self.limits.max_steps
            )));
        }
        Ok(())
    }

    fn exec_block(&mut self, stmts: &[Stmt], frame: &mut Frame<'_>) -> Result<Flow, Fault> {
        for stmt in stmts {
            match self.exec_stmt(stmt, frame)? {
                Flow::Normal => {}
                other => return Ok(other),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&mut self, stmt: &Stmt, frame: &mut Frame<'_>) -> Result<Flow, Fault> {
        self.tick().map_err(|f| f.with_line(stmt.line))?;
        match &stmt.kind {
            StmtKind::Assign { name, op, value } => {
                let rhs = self.eval_expr(value, frame)?;
                let result = match op {
                    AssignOp::Set => rhs,
                    AssignOp::Add | AssignOp::Sub => {
                        let current = frame.get(name).cloned().ok_or_else(|| {
                            Fault::runtime(format!("name '{}' is not defined", name))
                                .with_line(stmt.line)
                        })?;
                        let bin = if *op == AssignOp::Add {
                            BinOp::Add
                        } else {
                            BinOp::Sub
                        };
                        binary(bin, current, rhs).map_err(|f| f.with_line(stmt.line))?
                    }
                };
                frame.set(name, result);
                Ok(Flow::Normal)
            }
            StmtKind::Expr(expr) => {
                self.eval_expr(expr, frame)?;
                Ok(Flow::Normal)
            }
            StmtKind::Def { name, params, body } => {
                let def = FunctionDef {
                    name: name.clone(),
                    params: params.clone(),
                    body: body.clone(),
                };
                frame.set(name, Value::Function(Rc::new(def)));
                Ok(Flow::Normal)
            }
            StmtKind::Return(value) => {
                if frame.locals.is_none() {
                    return Err(Fault::runtime("'return' outside function").with_line(stmt.line));
                }
                let result = match value {
                    Some(expr) => self.eval_expr(expr, frame)?,
                    None => Value::None,
                };
                Ok(Flow::Return(result))
            }
            StmtKind::If { branches, orelse } => {
                for (cond, body) in branches {
                    if self.eval_expr(cond, frame)?.is_truthy() {
                        return self.exec_block(body, frame);
                    }
                }
                self.exec_block(orelse, frame)
            }
            StmtKind::While { cond, body } => {
                loop {
                    self.tick().map_err(|f| f.with_line(stmt.line))?;
                    if !self.eval_expr(cond, frame)?.is_truthy() {
                        break;
                    }
                    match self.exec_block(body, frame)? {
                        Flow::Normal | Flow::Continue => {}
                        Flow::Break => break,
                        ret @ Flow::Return(_) => return Ok(ret),
                    }
                }
                Ok(Flow::Normal)
            }
            StmtKind::For { var, iter, body } => {
                let iterable = self.eval_expr(iter, frame)?;
                match iterable {
                    Value::Range { start, stop, step } => {
                        let count = range_len(start, stop, step);
                        let mut cur = start;
                        for _ in 0..count {
                            self.tick().map_err(|f| f.with_line(stmt.line))?;
                            frame.set(var, Value::Int(cur));
                            cur += step;
                            match self.exec_block(body, frame)? {
                                Flow::Normal | Flow::Continue => {}
                                Flow::Break => break,
                                ret @ Flow::Return(_) => return Ok(ret),
                            }
                        }
                        Ok(Flow::Normal)
                    }
                    other => {
                        let items = iterate(&other).ok_or_else(|| {
                            Fault::runtime(format!(
                                "'{}' object is not iterable",
                                other.type_name()
                            ))
                            .with_line(stmt.line)
                        })?;
                        for item in items {
                            self.tick().map_err(|f| f.with_line(stmt.line))?;
                            frame.set(var, item);
                            match self.exec_block(body, frame)? {
                                Flow::Normal | Flow::Continue => {}
                                Flow::Break => break,
                                ret @ Flow::Return(_) => return Ok(ret),
                            }
                        }
                        Ok(Flow::Normal)
                    }
                }
            }
            StmtKind::Import { module } => Err(Fault::runtime(format!(
                "import of module '{}' is not permitted",
                module
            ))
            .with_line(stmt.line)),
            StmtKind::Pass => Ok(Flow::Normal),
            StmtKind::Break => Ok(Flow::Break),
            StmtKind::Continue => Ok(Flow::Continue),
        }
    }

    fn eval_expr(&mut self, expr: &Expr, frame: &mut Frame<'_>) -> Result<Value, Fault> {
        self.eval_expr_inner(expr, frame)
            .map_err(|f| f.with_line(expr.line))
    }

    fn eval_expr_inner(&mut self, expr: &Expr, frame: &mut Frame<'_>) -> Result<Value, Fault> {
        match &expr.kind {
            ExprKind::Literal(lit) => Ok(match lit {
                Literal::None => Value::None,
                Literal::Bool(b) => Value::Bool(*b),
                Literal::Int(n) => Value::Int(*n),
                Literal::Float(x) => Value::Float(*x),
                Literal::Str(s) => Value::Str(s.clone()),
            }),
            ExprKind::Name(name) => {
                if let Some(v) = frame.get(name) {
                    return Ok(v.clone());
                }
                if let Some((static_name, _)) = self.builtins.get(name) {
                    return Ok(Value::Builtin(static_name));
                }
                Err(Fault::runtime(format!("name '{}' is not defined", name)))
            }
            ExprKind::List(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval_expr(item, frame)?);
                }
                Ok(Value::List(values))
            }
            ExprKind::Dict(pairs) => {
                let mut values = Vec::with_capacity(pairs.len());
                for (k, v) in pairs {
                    let key = self.eval_expr(k, frame)?;
                    let value = self.eval_expr(v, frame)?;
                    values.push((key, value));
                }
                Ok(Value::Dict(values))
            }
            ExprKind::Unary { op, operand } => {
                let v = self.eval_expr(operand, frame)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!v.is_truthy())),
                    UnaryOp::Neg => match v {
                        Value::Int(n) => n
                            .checked_neg()
                            .map(Value::Int)
                            .ok_or_else(|| Fault::runtime("integer overflow")),
                        Value::Float(x) => Ok(Value::Float(-x)),
                        other => Err(Fault::runtime(format!(
                            "bad operand type for unary -: '{}'",
                            other.type_name()
                        ))),
                    },
                }
            }
            ExprKind::Bool { op, lhs, rhs } => {
                let left = self.eval_expr(lhs, frame)?;
                match op {
                    BoolOp::And => {
                        if left.is_truthy() {
                            self.eval_expr(rhs, frame)
                        } else {
                            Ok(left)
                        }
                    }
                    BoolOp::Or => {
                        if left.is_truthy() {
                            Ok(left)
                        } else {
                            self.eval_expr(rhs, frame)
                        }
                    }
                }
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let left = self.eval_expr(lhs, frame)?;
                let right = self.eval_expr(rhs, frame)?;
                binary(*op, left, right)
            }
            ExprKind::Index { obj, index } => {
                let target = self.eval_expr(obj, frame)?;
                let idx = self.eval_expr(index, frame)?;
                subscript(target, idx)
            }
            ExprKind::Call { func, args } => {
                let callee = self.eval_expr(func, frame)?;
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval_expr(arg, frame)?);
                }
                self.call_value(callee, values, frame)
            }
        }
    }

    fn call_value(
        &mut self,
        callee: Value,
        args: Vec<Value>,
        frame: &mut Frame<'_>,
    ) -> Result<Value, Fault> {
        self.tick()?;
        match callee {
            Value::Builtin(name) => {
                self.notify_call(name);
                let (_, func) = self
                    .builtins
                    .get(name)
                    .ok_or_else(|| Fault::runtime(format!("name '{}' is not defined", name)))?;
                func(self, &args)
            }
            Value::Function(def) => {
                self.notify_call(&def.name);
                if args.len() != def.params.len() {
                    return Err(Fault::runtime(format!(
                        "function '{}' expected {} argument(s), got {}",
                        def.name,
                        def.params.len(),
                        args.len()
                    )));
                }
                if self.depth + 1 > self.limits.max_depth {
                    return Err(Fault::runtime(format!(
                        "maximum call depth of {} exceeded",
                        self.limits.max_depth
                    )));
                }
                self.depth += 1;
                let mut locals = Bindings::new();
                for (param, value) in def.params.iter().zip(args) {
                    locals.insert(param.clone(), value);
                }
                let mut inner = Frame {
                    globals: &mut *frame.globals,
                    locals: Some(locals),
                };
                let result = self.exec_block(&def.body, &mut inner);
                self.depth -= 1;
                match result? {
                    Flow::Return(v) => Ok(v),
                    Flow::Normal => Ok(Value::None),
                    Flow::Break | Flow::Continue => {
                        Err(Fault::runtime("'break' or 'continue' outside loop"))
                    }
                }
            }
            other => Err(Fault::runtime(format!(
                "'{}' object is not callable",
                other.type_name()
            ))),
        }
    }

    fn notify_call(&mut self, name: &str) {
        if let Some(hook) = self.call_hook {
            hook(name);
        }
    }
}

fn iterate(value: &Value) -> Option<Vec<Value>> {
    match value {
        Value::List(items) => Some(items.clone()),
        Value::Str(s) => Some(s.chars().map(|c| Value::Str(c.to_string())).collect()),
        Value::Dict(pairs) => Some(pairs.iter().map(|(k, _)| k.clone()).collect()),
        _ => None,
    }
}

fn numeric_pair(lhs: &Value, rhs: &Value) -> Option<(f64, f64)> {
    let a = match lhs {
        Value::Int(n) => *n as f64,
        Value::Float(x) => *x,
        _ => return None,
    };
    let b = match rhs {
        Value::Int(n) => *n as f64,
        Value::Float(x) => *x,
        _ => return None,
    };
    Some((a, b))
}

fn floor_div_i64(a: i64, b: i64) -> i64 {
    let q = a / b;
    let r = a % b;
    if r != 0 && (r < 0) != (b < 0) {
        q - 1
    } else {
        q
    }
}

fn floor_mod_i64(a: i64, b: i64) -> i64 {
    let r = a % b;
    if r != 0 && (r < 0) != (b < 0) {
        r + b
    } else {
        r
    }
}

fn type_fault(op: &str, lhs: &Value, rhs: &Value) -> Fault {
    Fault::runtime(format!(
        "unsupported operand type(s) for {}: '{}' and '{}'",
        op,
        lhs.type_name(),
        rhs.type_name()
    ))
}

pub(crate) fn binary(op: BinOp, lhs: Value, rhs: Value) -> Result<Value, Fault> {
    match op {
        BinOp::Add => match (lhs, rhs) {
            (Value::Int(a), Value::Int(b)) => a
                .checked_add(b)
                .map(Value::Int)
                .ok_or_else(|| Fault::runtime("integer overflow")),
            (Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
            (Value::List(mut a), Value::List(b)) => {
                a.extend(b);
                Ok(Value::List(a))
            }
            (l, r) => numeric_pair(&l, &r)
                .map(|(a, b)| Value::Float(a + b))
                .ok_or_else(|| type_fault("+", &l, &r)),
        },
        BinOp::Sub => match (lhs, rhs) {
            (Value::Int(a), Value::Int(b)) => a
                .checked_sub(b)
                .map(Value::Int)
                .ok_or_else(|| Fault::runtime("integer overflow")),
            (l, r) => numeric_pair(&l, &r)
                .map(|(a, b)| Value::Float(a - b))
                .ok_or_else(|| type_fault("-", &l, &r)),
        },
        BinOp::Mul => match (lhs, rhs) {
            (Value::Int(a), Value::Int(b)) => a
                .checked_mul(b)
                .map(Value::Int)
                .ok_or_else(|| Fault::runtime("integer overflow")),
            (l, r) => numeric_pair(&l, &r)
                .map(|(a, b)| Value::Float(a * b))
                .ok_or_else(|| type_fault("*", &l, &r)),
        },
        BinOp::Div => match numeric_pair(&lhs, &rhs) {
            Some((_, b)) if b == 0.0 => Err(Fault::runtime("division by zero")),
            Some((a, b)) => Ok(Value::Float(a / b)),
            None => Err(type_fault("/", &lhs, &rhs)),
        },
        BinOp::FloorDiv => match (lhs, rhs) {
            (Value::Int(_), Value::Int(0)) => Err(Fault::runtime("division by zero")),
            (Value::Int(i64::MIN), Value::Int(-1)) => Err(Fault::runtime("integer overflow")),
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(floor_div_i64(a, b))),
            (l, r) => match numeric_pair(&l, &r) {
                Some((_, b)) if b == 0.0 => Err(Fault::runtime("division by zero")),
                Some((a, b)) => Ok(Value::Float((a / b).floor())),
                None => Err(type_fault("//", &l, &r)),
            },
        },
        BinOp::Mod => match (lhs, rhs) {
            (Value::Int(_), Value::Int(0)) => Err(Fault::runtime("division by zero")),
            (Value::Int(i64::MIN), Value::Int(-1)) => Err(Fault::runtime("integer overflow")),
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(floor_mod_i64(a, b))),
            (l, r) => match numeric_pair(&l, &r) {
                Some((_, b)) if b == 0.0 => Err(Fault::runtime("division by zero")),
                Some((a, b)) => Ok(Value::Float(a - (a / b).floor() * b)),
                None => Err(type_fault("%", &l, &r)),
            },
        },
        BinOp::Eq => Ok(Value::Bool(lhs == rhs)),
        BinOp::Ne => Ok(Value::Bool(lhs != rhs)),
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
            let ordering = match (&lhs, &rhs) {
                (Value::Str(a), Value::Str(b)) => a.partial_cmp(b),
                (l, r) => numeric_pair(l, r).and_then(|(a, b)| a.partial_cmp(&b)),
            };
            let Some(ordering) = ordering else {
                let sym = match op {
                    BinOp::Lt => "<",
                    BinOp::Le => "<=",
                    BinOp::Gt => ">",
                    _ => ">=",
                };
                return Err(type_fault(sym, &lhs, &rhs));
            };
            let result = match op {
                BinOp::Lt => ordering.is_lt(),
                BinOp::Le => ordering.is_le(),
                BinOp::Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            };
            Ok(Value::Bool(result))
        }
        BinOp::In => match (&lhs, &rhs) {
            (needle, Value::List(items)) => Ok(Value::Bool(items.contains(needle))),
            (Value::Str(needle), Value::Str(haystack)) => {
                Ok(Value::Bool(haystack.contains(needle.as_str())))
            }
            (needle, Value::Dict(pairs)) => {
                Ok(Value::Bool(pairs.iter().any(|(k, _)| k == needle)))
            }
            (l, r) => Err(type_fault("in", l, r)),
        },
    }
}

fn subscript(target: Value, index: Value) -> Result<Value, Fault> {
    match (target, index) {
        (Value::List(items), Value::Int(i)) => {
            let len = items.len() as i64;
            let idx = if i < 0 { i + len } else { i };
            if idx < 0 || idx >= len {
                return Err(Fault::runtime("list index out of range"));
            }
            Ok(items[idx as usize].clone())
        }
        (Value::Str(s), Value::Int(i)) => {
            let chars: Vec<char> = s.chars().collect();
            let len = chars.len() as i64;
            let idx = if i < 0 { i + len } else { i };
            if idx < 0 || idx >= len {
                return Err(Fault::runtime("string index out of range"));
            }
            Ok(Value::Str(chars[idx as usize].to_string()))
        }
        (Value::Dict(pairs), key) => pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.clone())
            .ok_or_else(|| Fault::runtime(format!("key error: {}", key.repr()))),
        (target, index) => Err(Fault::runtime(format!(
            "'{}' object cannot be indexed by '{}'",
            target.type_name(),
            index.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::builtins::BuiltinTable;
    use crate::interp::parser::parse;

    fn run_full(src: &str) -> Result<(Bindings, String), Fault> {
        let program = parse(src)?;
        let builtins = BuiltinTable::full();
        let mut out: Vec<u8> = Vec::new();
        let mut globals = Bindings::new();
        let mut machine = Machine::new(&builtins, &mut out, None, Limits::default());
        machine.run(&program, &mut globals)?;
        Ok((globals, String::from_utf8_lossy(&out).into_owned()))
    }

    #[test]
    fn arithmetic_binding() {
        let (globals, _) = run_full("result = (10+20)*2").unwrap();
        assert_eq!(globals["result"], Value::Int(60));
    }

    #[test]
    fn functions_and_calls() {
        let src = "def add(a, b):\n    return a + b\ntotal = add(40, 2)";
        let (globals, _) = run_full(src).unwrap();
        assert_eq!(globals["total"], Value::Int(42));
    }

    #[test]
    fn loops_and_accumulation() {
        let src = "total = 0\nfor i in range(5):\n    total += i";
        let (globals, _) = run_full(src).unwrap();
        assert_eq!(globals["total"], Value::Int(10));
    }

    #[test]
    fn while_with_break() {
        let src = "n = 0\nwhile True:\n    n += 1\n    if n == 3:\n        break";
        let (globals, _) = run_full(src).unwrap();
        assert_eq!(globals["n"], Value::Int(3));
    }

    #[test]
    fn print_is_captured() {
        let (_, out) = run_full("print('hello', 42)").unwrap();
        assert_eq!(out, "hello 42\n");
    }

    #[test]
    fn undefined_name_fault_carries_line() {
        let err = run_full("x = 1\ny = missing + 1").unwrap_err();
        assert_eq!(err.line, Some(2));
        assert!(err.message.contains("missing"));
    }

    #[test]
    fn fault_inside_function_reports_deepest_line() {
        let src = "def boom():\n    return 1 / 0\nx = boom()";
        let err = run_full(src).unwrap_err();
        assert_eq!(err.line, Some(2));
        assert!(err.message.contains("division by zero"));
    }

    #[test]
    fn import_is_rejected() {
        let err = run_full("import os").unwrap_err();
        assert_eq!(err.line, Some(1));
        assert!(err.message.contains("os"));
    }

    #[test]
    fn floor_division_follows_sign_rules() {
        let (globals, _) = run_full("a = -7 // 2\nb = 7 % 3\nc = -7 % 3").unwrap();
        assert_eq!(globals["a"], Value::Int(-4));
        assert_eq!(globals["b"], Value::Int(1));
        assert_eq!(globals["c"], Value::Int(2));
    }

    #[test]
    fn step_budget_stops_infinite_loop() {
        let program = parse("while True:\n    pass").unwrap();
        let builtins = BuiltinTable::full();
        let mut out: Vec<u8> = Vec::new();
        let mut globals = Bindings::new();
        let limits = Limits {
            max_steps: 1_000,
            max_depth: 64,
        };
        let mut machine = Machine::new(&builtins, &mut out, None, limits);
        let err = machine.run(&program, &mut globals).unwrap_err();
        assert!(err.message.contains("step budget"));
    }

    #[test]
    fn recursion_depth_capped() {
        let src = "def f():\n    return f()\nf()";
        let err = run_full(src).unwrap_err();
        assert!(err.message.contains("call depth"));
    }

    #[test]
    fn call_hook_sees_function_names() {
        use std::cell::RefCell;
        let program = parse("def get_data():\n    return 1\nx = get_data()\ny = len('ab')").unwrap();
        let builtins = BuiltinTable::full();
        let mut out: Vec<u8> = Vec::new();
        let mut globals = Bindings::new();
        let seen: RefCell<Vec<String>> = RefCell::new(Vec::new());
        let hook = |name: &str| seen.borrow_mut().push(name.to_string());
        let mut machine = Machine::new(&builtins, &mut out, Some(&hook), Limits::default());
        machine.run(&program, &mut globals).unwrap();
        let seen = seen.into_inner();
        assert_eq!(seen, vec!["get_data".to_string(), "len".to_string()]);
    }

    #[test]
    fn dict_and_index() {
        let src = "d = {'a': 1, 'b': 2}\nx = d['b']\nitems = [10, 20, 30]\ny = items[-1]";
        let (globals, _) = run_full(src).unwrap();
        assert_eq!(globals["x"], Value::Int(2));
        assert_eq!(globals["y"], Value::Int(30));
    }

    #[test]
    fn division_produces_float() {
        let (globals, _) = run_full("x = 7 / 2").unwrap();
        assert_eq!(globals["x"], Value::Float(3.5));
    }
}
