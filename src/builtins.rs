//! Builtin pure functions available to `.dsy` sources.

use crate::value::{Function, Value};

/// Names of every builtin, in lookup order.
pub const NAMES: &[&str] = &[
    "add", "sub", "mul", "div", "neg", "pow", "min", "max", "sum", "len", "concat", "range",
    "clamp", "identity",
];

/// Look up a builtin by name. Every call returns a fresh function value.
pub fn lookup(name: &str) -> Option<Function> {
    let f = match name {
        "add" => Function::new("add", |args, kw| {
            no_keywords(kw)?;
            if args.iter().all(|a| matches!(a, Value::Str(_))) && !args.is_empty() {
                let joined: String = args.iter().filter_map(as_str).collect();
                return Ok(Value::str(&joined));
            }
            fold_numbers(args, Num::Int(0), |a, b| a.add(b))
        }),
        "sub" => Function::new("sub", |args, kw| {
            no_keywords(kw)?;
            let [a, b] = exactly::<2>(args)?;
            num(a)?.sub(num(b)?).map(Num::into_value)
        }),
        "mul" => Function::new("mul", |args, kw| {
            no_keywords(kw)?;
            fold_numbers(args, Num::Int(1), |a, b| a.mul(b))
        }),
        "div" => Function::new("div", |args, kw| {
            no_keywords(kw)?;
            let [a, b] = exactly::<2>(args)?;
            let divisor = num(b)?.as_f64();
            if divisor == 0.0 {
                return Err("division by zero".to_string());
            }
            Ok(Value::Float(num(a)?.as_f64() / divisor))
        }),
        "neg" => Function::new("neg", |args, kw| {
            no_keywords(kw)?;
            let [a] = exactly::<1>(args)?;
            Num::Int(0).sub(num(a)?).map(Num::into_value)
        }),
        "pow" => Function::new("pow", |args, kw| {
            no_keywords(kw)?;
            let [base, exp] = exactly::<2>(args)?;
            match (num(base)?, num(exp)?) {
                (Num::Int(b), Num::Int(e)) if e >= 0 => {
                    let e = u32::try_from(e).map_err(|_| "exponent too large".to_string())?;
                    b.checked_pow(e)
                        .map(Value::Int)
                        .ok_or_else(|| "integer overflow".to_string())
                }
                (b, e) => Ok(Value::Float(b.as_f64().powf(e.as_f64()))),
            }
        }),
        "min" => Function::new("min", |args, kw| {
            no_keywords(kw)?;
            extremum(args, |a, b| b.as_f64() < a.as_f64())
        }),
        "max" => Function::new("max", |args, kw| {
            no_keywords(kw)?;
            extremum(args, |a, b| b.as_f64() > a.as_f64())
        }),
        "sum" => Function::new("sum", |args, kw| {
            no_keywords(kw)?;
            let [list] = exactly::<1>(args)?;
            match list {
                Value::List(items) => fold_numbers(items, Num::Int(0), |a, b| a.add(b)),
                other => Err(format!("expected list, found {}", other.type_name())),
            }
        }),
        "len" => Function::new("len", |args, kw| {
            no_keywords(kw)?;
            let [value] = exactly::<1>(args)?;
            let n = match value {
                Value::List(items) => items.len(),
                Value::Str(s) => s.chars().count(),
                other => return Err(format!("{} has no length", other.type_name())),
            };
            Ok(Value::Int(n as i64))
        }),
        "concat" => Function::new("concat", |args, kw| {
            let mut sep = String::new();
            for (name, value) in kw {
                match (name.as_str(), value) {
                    ("sep", Value::Str(s)) => sep = s.to_string(),
                    ("sep", other) => {
                        return Err(format!("sep must be str, found {}", other.type_name()))
                    }
                    (other, _) => return Err(format!("unexpected keyword '{}'", other)),
                }
            }
            let parts = args
                .iter()
                .map(|a| {
                    as_str(a).ok_or_else(|| format!("expected str, found {}", a.type_name()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::str(&parts.join(&sep)))
        }),
        "range" => Function::new("range", |args, kw| {
            let [stop] = exactly::<1>(args)?;
            let stop = int(stop)?;
            let (mut start, mut step) = (0i64, 1i64);
            for (name, value) in kw {
                match name.as_str() {
                    "start" => start = int(value)?,
                    "step" => step = int(value)?,
                    other => return Err(format!("unexpected keyword '{}'", other)),
                }
            }
            if step == 0 {
                return Err("step must not be zero".to_string());
            }
            let mut items = Vec::new();
            let mut i = start;
            while (step > 0 && i < stop) || (step < 0 && i > stop) {
                items.push(Value::Int(i));
                i = match i.checked_add(step) {
                    Some(next) => next,
                    None => break,
                };
            }
            Ok(Value::List(items))
        }),
        "clamp" => Function::new("clamp", |args, kw| {
            let [x] = exactly::<1>(args)?;
            let mut out = num(x)?;
            for (name, value) in kw {
                let bound = num(value)?;
                match name.as_str() {
                    "lo" if bound.as_f64() > out.as_f64() => out = bound,
                    "hi" if bound.as_f64() < out.as_f64() => out = bound,
                    "lo" | "hi" => {}
                    other => return Err(format!("unexpected keyword '{}'", other)),
                }
            }
            Ok(out.into_value())
        }),
        "identity" => Function::new("identity", |args, kw| {
            no_keywords(kw)?;
            let [x] = exactly::<1>(args)?;
            Ok(x.clone())
        }),
        _ => return None,
    };
    Some(f)
}

#[derive(Clone, Copy, Debug)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn as_f64(self) -> f64 {
        match self {
            Num::Int(n) => n as f64,
            Num::Float(x) => x,
        }
    }

    fn into_value(self) -> Value {
        match self {
            Num::Int(n) => Value::Int(n),
            Num::Float(x) => Value::Float(x),
        }
    }

    fn add(self, other: Num) -> Result<Num, String> {
        match (self, other) {
            (Num::Int(a), Num::Int(b)) => a.checked_add(b).map(Num::Int).ok_or_else(overflow),
            (a, b) => Ok(Num::Float(a.as_f64() + b.as_f64())),
        }
    }

    fn sub(self, other: Num) -> Result<Num, String> {
        match (self, other) {
            (Num::Int(a), Num::Int(b)) => a.checked_sub(b).map(Num::Int).ok_or_else(overflow),
            (a, b) => Ok(Num::Float(a.as_f64() - b.as_f64())),
        }
    }

    fn mul(self, other: Num) -> Result<Num, String> {
        match (self, other) {
            (Num::Int(a), Num::Int(b)) => a.checked_mul(b).map(Num::Int).ok_or_else(overflow),
            (a, b) => Ok(Num::Float(a.as_f64() * b.as_f64())),
        }
    }
}

fn overflow() -> String {
    "integer overflow".to_string()
}

fn num(value: &Value) -> Result<Num, String> {
    match value {
        Value::Int(n) => Ok(Num::Int(*n)),
        Value::Float(x) => Ok(Num::Float(*x)),
        other => Err(format!("expected number, found {}", other.type_name())),
    }
}

fn int(value: &Value) -> Result<i64, String> {
    value
        .as_int()
        .ok_or_else(|| format!("expected int, found {}", value.type_name()))
}

fn as_str(value: &Value) -> Option<&str> {
    match value {
        Value::Str(s) => Some(&**s),
        _ => None,
    }
}

fn no_keywords(kwargs: &[(String, Value)]) -> Result<(), String> {
    match kwargs.first() {
        Some((name, _)) => Err(format!("unexpected keyword '{}'", name)),
        None => Ok(()),
    }
}

fn exactly<const N: usize>(args: &[Value]) -> Result<&[Value; N], String> {
    args.try_into()
        .map_err(|_| format!("expected {} argument(s), found {}", N, args.len()))
}

fn fold_numbers(
    args: &[Value],
    init: Num,
    step: impl Fn(Num, Num) -> Result<Num, String>,
) -> Result<Value, String> {
    args.iter()
        .try_fold(init, |acc, a| step(acc, num(a)?))
        .map(Num::into_value)
}

fn extremum(args: &[Value], better: impl Fn(Num, Num) -> bool) -> Result<Value, String> {
    let (first, rest) = args
        .split_first()
        .ok_or_else(|| "expected at least one argument".to_string())?;
    let mut best = num(first)?;
    for a in rest {
        let candidate = num(a)?;
        if better(best, candidate) {
            best = candidate;
        }
    }
    Ok(best.into_value())
}
