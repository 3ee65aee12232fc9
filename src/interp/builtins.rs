//! Builtin callables and the per-execution allowlist table.
//!
//! The restricted table is the deliberately small safe set; the full table is
//! everything the interpreter knows. Either way the table is injected per
//! execution and the script can only reach names present in it.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::interp::eval::Machine;
use crate::interp::value::{range_len, Value};
use crate::interp::Fault;

pub type BuiltinFn = fn(&mut Machine<'_>, &[Value]) -> Result<Value, Fault>;

/// The builtin names exposed to one execution.
#[derive(Clone)]
pub struct BuiltinTable {
    entries: BTreeMap<&'static str, BuiltinFn>,
}

/// The safe allowlist used by restricted execution.
pub const RESTRICTED_NAMES: &[&str] = &[
    "print", "sum", "len", "range", "int", "str", "dict", "list",
];

impl BuiltinTable {
    /// The restricted allowlist; `allow_io` additionally exposes `open`.
    pub fn restricted(allow_io: bool) -> Self {
        let mut entries: BTreeMap<&'static str, BuiltinFn> = BTreeMap::new();
        for &name in RESTRICTED_NAMES {
            entries.insert(name, full_entry(name));
        }
        if allow_io {
            entries.insert("open", builtin_open as BuiltinFn);
        }
        Self { entries }
    }

    /// Every builtin the interpreter implements, `open` included.
    pub fn full() -> Self {
        let mut entries: BTreeMap<&'static str, BuiltinFn> = BTreeMap::new();
        for &(name, func) in FULL_TABLE {
            entries.insert(name, func);
        }
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<(&'static str, BuiltinFn)> {
        self.entries.get_key_value(name).map(|(k, v)| (*k, *v))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Installed names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.keys().copied().collect()
    }
}

const FULL_TABLE: &[(&str, BuiltinFn)] = &[
    ("print", builtin_print),
    ("sum", builtin_sum),
    ("len", builtin_len),
    ("range", builtin_range),
    ("int", builtin_int),
    ("str", builtin_str),
    ("dict", builtin_dict),
    ("list", builtin_list),
    ("open", builtin_open),
    ("abs", builtin_abs),
    ("min", builtin_min),
    ("max", builtin_max),
    ("float", builtin_float),
    ("bool", builtin_bool),
    ("type", builtin_type),
];

fn full_entry(name: &str) -> BuiltinFn {
    FULL_TABLE
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, f)| *f)
        .expect("restricted names are a subset of the full table")
}

fn arity(name: &str, args: &[Value], expected: usize) -> Result<(), Fault> {
    if args.len() != expected {
        return Err(Fault::runtime(format!(
            "{}() takes {} argument(s), got {}",
            name,
            expected,
            args.len()
        )));
    }
    Ok(())
}

fn builtin_print(machine: &mut Machine<'_>, args: &[Value]) -> Result<Value, Fault> {
    let text = args
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    machine.print_line(&text);
    Ok(Value::None)
}

fn builtin_sum(machine: &mut Machine<'_>, args: &[Value]) -> Result<Value, Fault> {
    arity("sum", args, 1)?;
    let items = match &args[0] {
        Value::List(items) => items.clone(),
        Value::Range { start, stop, step } => machine.materialize_range(*start, *stop, *step)?,
        other => {
            return Err(Fault::runtime(format!(
                "sum() argument must be iterable, not '{}'",
                other.type_name()
            )))
        }
    };
    let mut int_total: i64 = 0;
    let mut float_total: f64 = 0.0;
    let mut saw_float = false;
    for item in &items {
        match item {
            Value::Int(n) => {
                int_total = int_total
                    .checked_add(*n)
                    .ok_or_else(|| Fault::runtime("integer overflow"))?;
            }
            Value::Float(x) => {
                saw_float = true;
                float_total += x;
            }
            other => {
                return Err(Fault::runtime(format!(
                    "sum() cannot add '{}'",
                    other.type_name()
                )))
            }
        }
    }
    if saw_float {
        Ok(Value::Float(float_total + int_total as f64))
    } else {
        Ok(Value::Int(int_total))
    }
}

fn builtin_len(_: &mut Machine<'_>, args: &[Value]) -> Result<Value, Fault> {
    arity("len", args, 1)?;
    let len = match &args[0] {
        Value::Str(s) => s.chars().count() as i64,
        Value::List(items) => items.len() as i64,
        Value::Dict(pairs) => pairs.len() as i64,
        Value::Range { start, stop, step } => range_len(*start, *stop, *step),
        other => {
            return Err(Fault::runtime(format!(
                "object of type '{}' has no len()",
                other.type_name()
            )))
        }
    };
    Ok(Value::Int(len))
}

fn builtin_range(_: &mut Machine<'_>, args: &[Value]) -> Result<Value, Fault> {
    let as_int = |v: &Value| -> Result<i64, Fault> {
        match v {
            Value::Int(n) => Ok(*n),
            other => Err(Fault::runtime(format!(
                "range() argument must be int, not '{}'",
                other.type_name()
            ))),
        }
    };
    let (start, stop, step) = match args {
        [stop] => (0, as_int(stop)?, 1),
        [start, stop] => (as_int(start)?, as_int(stop)?, 1),
        [start, stop, step] => (as_int(start)?, as_int(stop)?, as_int(step)?),
        _ => {
            return Err(Fault::runtime(format!(
                "range() takes 1 to 3 arguments, got {}",
                args.len()
            )))
        }
    };
    if step == 0 {
        return Err(Fault::runtime("range() step must not be zero"));
    }
    Ok(Value::Range { start, stop, step })
}

fn builtin_int(_: &mut Machine<'_>, args: &[Value]) -> Result<Value, Fault> {
    arity("int", args, 1)?;
    match &args[0] {
        Value::Int(n) => Ok(Value::Int(*n)),
        Value::Float(x) => Ok(Value::Int(x.trunc() as i64)),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Str(s) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| {
            Fault::runtime(format!("invalid literal for int(): '{}'", s))
        }),
        other => Err(Fault::runtime(format!(
            "int() argument must be a number or string, not '{}'",
            other.type_name()
        ))),
    }
}

fn builtin_str(_: &mut Machine<'_>, args: &[Value]) -> Result<Value, Fault> {
    arity("str", args, 1)?;
    Ok(Value::Str(args[0].to_string()))
}

fn builtin_dict(_: &mut Machine<'_>, args: &[Value]) -> Result<Value, Fault> {
    if !args.is_empty() {
        return Err(Fault::runtime("dict() takes no arguments"));
    }
    Ok(Value::Dict(Vec::new()))
}

fn builtin_list(machine: &mut Machine<'_>, args: &[Value]) -> Result<Value, Fault> {
    match args {
        [] => Ok(Value::List(Vec::new())),
        [Value::List(items)] => Ok(Value::List(items.clone())),
        [Value::Range { start, stop, step }] => Ok(Value::List(
            machine.materialize_range(*start, *stop, *step)?,
        )),
        [Value::Str(s)] => Ok(Value::List(
            s.chars().map(|c| Value::Str(c.to_string())).collect(),
        )),
        [Value::Dict(pairs)] => Ok(Value::List(pairs.iter().map(|(k, _)| k.clone()).collect())),
        [other] => Err(Fault::runtime(format!(
            "list() argument must be iterable, not '{}'",
            other.type_name()
        ))),
        _ => Err(Fault::runtime(format!(
            "list() takes at most 1 argument, got {}",
            args.len()
        ))),
    }
}

/// Reads the named file and returns its text. Only reachable when the
/// execution was configured with I/O allowed (or under the full table).
fn builtin_open(_: &mut Machine<'_>, args: &[Value]) -> Result<Value, Fault> {
    arity("open", args, 1)?;
    let path = match &args[0] {
        Value::Str(s) => s,
        other => {
            return Err(Fault::runtime(format!(
                "open() argument must be str, not '{}'",
                other.type_name()
            )))
        }
    };
    std::fs::read_to_string(path)
        .map(Value::Str)
        .map_err(|e| Fault::runtime(format!("could not open '{}': {}", path, e)))
}

fn builtin_abs(_: &mut Machine<'_>, args: &[Value]) -> Result<Value, Fault> {
    arity("abs", args, 1)?;
    match &args[0] {
        Value::Int(n) => n
            .checked_abs()
            .map(Value::Int)
            .ok_or_else(|| Fault::runtime("integer overflow")),
        Value::Float(x) => Ok(Value::Float(x.abs())),
        other => Err(Fault::runtime(format!(
            "bad operand type for abs(): '{}'",
            other.type_name()
        ))),
    }
}

fn compare(a: &Value, b: &Value) -> Result<Ordering, Fault> {
    let ordering = match (a, b) {
        (Value::Str(x), Value::Str(y)) => x.partial_cmp(y),
        (Value::Int(x), Value::Int(y)) => x.partial_cmp(y),
        (x, y) => {
            let to_f64 = |v: &Value| match v {
                Value::Int(n) => Some(*n as f64),
                Value::Float(f) => Some(*f),
                _ => None,
            };
            match (to_f64(x), to_f64(y)) {
                (Some(x), Some(y)) => x.partial_cmp(&y),
                _ => None,
            }
        }
    };
    ordering.ok_or_else(|| {
        Fault::runtime(format!(
            "'{}' and '{}' are not comparable",
            a.type_name(),
            b.type_name()
        ))
    })
}

fn extremum(name: &str, args: &[Value], want: Ordering) -> Result<Value, Fault> {
    let items: Vec<Value> = match args {
        [] => {
            return Err(Fault::runtime(format!(
                "{}() expected at least 1 argument",
                name
            )))
        }
        [Value::List(items)] => items.clone(),
        _ => args.to_vec(),
    };
    let mut iter = items.into_iter();
    let Some(mut best) = iter.next() else {
        return Err(Fault::runtime(format!("{}() of an empty sequence", name)));
    };
    for item in iter {
        if compare(&item, &best)? == want {
            best = item;
        }
    }
    Ok(best)
}

fn builtin_min(_: &mut Machine<'_>, args: &[Value]) -> Result<Value, Fault> {
    extremum("min", args, Ordering::Less)
}

fn builtin_max(_: &mut Machine<'_>, args: &[Value]) -> Result<Value, Fault> {
    extremum("max", args, Ordering::Greater)
}

fn builtin_float(_: &mut Machine<'_>, args: &[Value]) -> Result<Value, Fault> {
    arity("float", args, 1)?;
    match &args[0] {
        Value::Int(n) => Ok(Value::Float(*n as f64)),
        Value::Float(x) => Ok(Value::Float(*x)),
        Value::Bool(b) => Ok(Value::Float(if *b { 1.0 } else { 0.0 })),
        Value::Str(s) => s.trim().parse::<f64>().map(Value::Float).map_err(|_| {
            Fault::runtime(format!("invalid literal for float(): '{}'", s))
        }),
        other => Err(Fault::runtime(format!(
            "float() argument must be a number or string, not '{}'",
            other.type_name()
        ))),
    }
}

fn builtin_bool(_: &mut Machine<'_>, args: &[Value]) -> Result<Value, Fault> {
    arity("bool", args, 1)?;
    Ok(Value::Bool(args[0].is_truthy()))
}

fn builtin_type(_: &mut Machine<'_>, args: &[Value]) -> Result<Value, Fault> {
    arity("type", args, 1)?;
    Ok(Value::Str(args[0].type_name().to_string()))
}
